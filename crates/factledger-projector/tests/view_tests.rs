//! Projection against real stores and the snapshot fallback

use chrono::{Duration, TimeZone, Utc};
use factledger_domain::traits::{EventQuery, FactEventStore, SnapshotStore};
use factledger_domain::{
    CurrentFact, DealId, EventId, EventType, FactEvent, FactKey, FactSource, FactValue,
};
use factledger_projector::{current_facts, current_facts_from_view, refresh_view};
use factledger_store::SqliteStore;

fn deal() -> DealId {
    DealId::from("deal-view")
}

fn event(key: &str, amount: f64, source: FactSource, minutes: i64) -> FactEvent {
    FactEvent::new(
        deal(),
        FactKey::parse(key).unwrap(),
        FactValue::Number(amount),
        format!("{}", amount),
        source,
        85,
        EventType::Created,
    )
    .at(Utc.with_ymd_and_hms(2026, 2, 1, 8, 0, 0).unwrap() + Duration::minutes(minutes))
}

fn seeded_store() -> SqliteStore {
    let mut store = SqliteStore::in_memory().unwrap();
    let arr = event("financial.arr", 1_000_000.0, FactSource::PitchDeck, 0);
    let mut arr_update = event("financial.arr", 1_150_000.0, FactSource::DataRoom, 10).superseding(arr.id);
    arr_update.event_type = EventType::Superseded;
    let mut disputed = event("financial.mrr", 50_000.0, FactSource::ContextEngine, 20);
    let mrr = event("financial.mrr", 90_000.0, FactSource::FinancialModel, 5);
    disputed.event_type = EventType::Disputed;
    disputed.supersedes_event_id = Some(mrr.id);

    store
        .append_batch(vec![arr, arr_update, mrr, disputed])
        .unwrap();
    store
}

#[test]
fn test_current_facts_from_store() {
    let store = seeded_store();
    let facts = current_facts(&store, &deal()).unwrap();
    assert_eq!(facts.len(), 2);

    let arr = facts.iter().find(|f| f.fact_key.as_str() == "financial.arr").unwrap();
    assert_eq!(arr.current_value, FactValue::Number(1_150_000.0));
    assert_eq!(arr.current_source, FactSource::DataRoom);
    assert_eq!(arr.event_history.len(), 2);

    let mrr = facts.iter().find(|f| f.fact_key.as_str() == "financial.mrr").unwrap();
    assert!(mrr.is_disputed);
    assert_eq!(mrr.current_value, FactValue::Number(90_000.0));
}

#[test]
fn test_unknown_deal_has_no_facts() {
    let store = seeded_store();
    assert!(current_facts(&store, &DealId::from("nobody")).unwrap().is_empty());
}

#[test]
fn test_view_falls_back_until_refreshed() {
    let mut store = seeded_store();

    let fallback = current_facts_from_view(&store, &deal()).unwrap();
    assert_eq!(fallback[0].event_history.len(), 2, "fallback is a full projection");

    assert_eq!(refresh_view(&mut store, &deal()).unwrap(), 2);
    let from_view = current_facts_from_view(&store, &deal()).unwrap();
    let full = current_facts(&store, &deal()).unwrap();

    assert_eq!(from_view.len(), full.len());
    for (snap, live) in from_view.iter().zip(&full) {
        assert_eq!(snap.fact_key, live.fact_key);
        assert_eq!(snap.current_value, live.current_value);
        assert_eq!(snap.current_display_value, live.current_display_value);
        assert_eq!(snap.current_source, live.current_source);
        assert_eq!(snap.current_confidence, live.current_confidence);
        assert!(snap.event_history.is_empty());
    }
}

#[test]
fn test_idempotent_over_store() {
    let store = seeded_store();
    assert_eq!(
        current_facts(&store, &deal()).unwrap(),
        current_facts(&store, &deal()).unwrap()
    );
}

/// Event log in a Vec with a snapshot that always fails to read
struct BrokenSnapshot {
    events: Vec<FactEvent>,
}

impl FactEventStore for BrokenSnapshot {
    type Error = String;

    fn append_event(&mut self, event: FactEvent) -> Result<EventId, String> {
        let id = event.id;
        self.events.push(event);
        Ok(id)
    }

    fn append_batch(&mut self, events: Vec<FactEvent>) -> Result<Vec<EventId>, String> {
        events.into_iter().map(|e| self.append_event(e)).collect()
    }

    fn get_event(&self, id: EventId) -> Result<Option<FactEvent>, String> {
        Ok(self.events.iter().find(|e| e.id == id).cloned())
    }

    fn events_for_deal(&self, deal_id: &DealId) -> Result<Vec<FactEvent>, String> {
        self.query_events(&EventQuery::for_deal(deal_id.clone()))
    }

    fn query_events(&self, query: &EventQuery) -> Result<Vec<FactEvent>, String> {
        let mut found: Vec<FactEvent> = self.events.iter().filter(|e| query.matches(e)).cloned().collect();
        found.sort_by(FactEvent::newest_first);
        Ok(found)
    }

    fn list_deals(&self) -> Result<Vec<DealId>, String> {
        Ok(vec![deal()])
    }
}

impl SnapshotStore for BrokenSnapshot {
    type Error = String;

    fn read_snapshot(&self, _deal_id: &DealId) -> Result<Option<Vec<CurrentFact>>, String> {
        Err("snapshot table is corrupt".to_string())
    }

    fn write_snapshot(&mut self, _deal_id: &DealId, _facts: &[CurrentFact]) -> Result<(), String> {
        Err("snapshot table is corrupt".to_string())
    }
}

#[test]
fn test_snapshot_failure_is_recovered_silently() {
    let store = BrokenSnapshot {
        events: vec![event("team.founder_count", 3.0, FactSource::PitchDeck, 0)],
    };
    let facts = current_facts_from_view(&store, &deal()).unwrap();
    assert_eq!(facts.len(), 1);
    assert_eq!(facts[0].current_value, FactValue::Number(3.0));
}

#[test]
fn test_refresh_reports_snapshot_failure() {
    let mut store = BrokenSnapshot { events: Vec::new() };
    assert!(refresh_view(&mut store, &deal()).is_err());
}
