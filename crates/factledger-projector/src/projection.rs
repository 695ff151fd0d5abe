//! Pure reduction of an event log to current facts

use std::collections::{BTreeMap, HashSet};

use factledger_domain::{
    CurrentFact, DealId, DisputeDetails, EventId, EventType, FactEvent, FactKey,
    ReliabilityClassification,
};

/// Reduce events to the current fact for every key
///
/// The events may arrive in any order and may span several deals. For each
/// `(deal, key)` the frontier is the newest event that is not superseded,
/// not `DELETED`, and not an annotation (`DISPUTED`, `PENDING_REVIEW`).
/// Keys without a frontier are omitted; their history stays in the log.
///
/// Annotation events may point at the event they concern through
/// `supersedes_event_id` without superseding it.
///
/// Output is ordered by deal, then fact key, so projecting an unchanged log
/// twice yields identical results.
pub fn project(events: &[FactEvent]) -> Vec<CurrentFact> {
    let superseded = superseded_ids(events);

    let mut groups: BTreeMap<(DealId, FactKey), Vec<&FactEvent>> = BTreeMap::new();
    for event in events {
        groups
            .entry((event.deal_id.clone(), event.fact_key))
            .or_default()
            .push(event);
    }

    groups
        .into_values()
        .filter_map(|mut history| {
            history.sort_by(|a, b| FactEvent::newest_first(a, b));
            project_key(&history, &superseded)
        })
        .collect()
}

/// `PENDING_REVIEW` events that no later value-carrying event has settled
///
/// A review is open while no non-annotation event for the same key is newer
/// than it. Accepting or rejecting a review, a later supersession, or a
/// deletion all close it. Returned newest first.
pub fn pending_reviews(events: &[FactEvent]) -> Vec<FactEvent> {
    let mut groups: BTreeMap<(DealId, FactKey), Vec<&FactEvent>> = BTreeMap::new();
    for event in events {
        groups
            .entry((event.deal_id.clone(), event.fact_key))
            .or_default()
            .push(event);
    }

    let mut pending: Vec<FactEvent> = groups
        .into_values()
        .flat_map(|mut history| {
            history.sort_by(|a, b| FactEvent::newest_first(a, b));
            history
                .into_iter()
                .take_while(|e| e.event_type.is_annotation())
                .filter(|e| e.event_type == EventType::PendingReview)
                .cloned()
                .collect::<Vec<_>>()
        })
        .collect();
    pending.sort_by(FactEvent::newest_first);
    pending
}

/// Ids named by a value-carrying event's `supersedes_event_id`
fn superseded_ids(events: &[FactEvent]) -> HashSet<EventId> {
    events
        .iter()
        .filter(|e| !e.event_type.is_annotation())
        .filter_map(|e| e.supersedes_event_id)
        .collect()
}

fn is_frontier_candidate(event: &FactEvent, superseded: &HashSet<EventId>) -> bool {
    event.event_type != EventType::Deleted
        && !event.event_type.is_annotation()
        && !superseded.contains(&event.id)
}

/// Project one key's history (sorted newest first)
fn project_key(history: &[&FactEvent], superseded: &HashSet<EventId>) -> Option<CurrentFact> {
    let frontier = history
        .iter()
        .copied()
        .find(|e| is_frontier_candidate(e, superseded))?;
    let newest = history.first()?;
    let oldest = history.last()?;

    let dispute_at = history
        .iter()
        .position(|e| e.event_type == EventType::Disputed);
    let dispute_details = dispute_at.map(|idx| {
        let dispute = history[idx];
        DisputeDetails {
            conflicting_value: dispute.value.clone(),
            conflicting_display_value: dispute.display_value.clone(),
            conflicting_source: dispute.source,
            reason: dispute.reason.clone(),
            disputed_at: dispute.created_at,
            resolved: history[..idx]
                .iter()
                .any(|e| e.event_type == EventType::Resolved),
        }
    });

    let reliability = frontier
        .reliability
        .map(|tag| ReliabilityClassification::new(tag, format!("tagged by {}", frontier.source)));

    Some(CurrentFact {
        deal_id: frontier.deal_id.clone(),
        fact_key: frontier.fact_key,
        category: frontier.category,
        current_event_id: frontier.id,
        current_value: frontier.value.clone(),
        current_display_value: frontier.display_value.clone(),
        unit: frontier.unit.clone(),
        current_source: frontier.source,
        current_confidence: frontier.source_confidence,
        is_disputed: dispute_details.is_some(),
        dispute_details,
        event_history: history.iter().map(|e| (*e).clone()).collect(),
        first_seen_at: oldest.created_at,
        last_updated_at: newest.created_at,
        reliability,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use factledger_domain::{FactSource, FactValue, Reliability};

    fn t(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn event(key: &str, amount: f64, source: FactSource, event_type: EventType, minutes: i64) -> FactEvent {
        FactEvent::new(
            DealId::from("deal-1"),
            FactKey::parse(key).unwrap(),
            FactValue::Number(amount),
            amount.to_string(),
            source,
            80,
            event_type,
        )
        .at(t(minutes))
    }

    fn arr(amount: f64, event_type: EventType, minutes: i64) -> FactEvent {
        event("financial.arr", amount, FactSource::PitchDeck, event_type, minutes)
    }

    #[test]
    fn test_empty_log() {
        assert!(project(&[]).is_empty());
    }

    #[test]
    fn test_single_created_event() {
        let created = arr(1_000_000.0, EventType::Created, 0);
        let facts = project(std::slice::from_ref(&created));
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].current_event_id, created.id);
        assert_eq!(facts[0].current_value, FactValue::Number(1_000_000.0));
        assert!(!facts[0].is_disputed);
        assert_eq!(facts[0].event_history, vec![created]);
    }

    #[test]
    fn test_supersession_chain() {
        let first = arr(1.0, EventType::Created, 0);
        let second = arr(2.0, EventType::Superseded, 1).superseding(first.id);
        let third = arr(3.0, EventType::Superseded, 2).superseding(second.id);

        let facts = project(&[first.clone(), third.clone(), second]);
        assert_eq!(facts[0].current_event_id, third.id);
        assert_eq!(facts[0].first_seen_at, first.created_at);
        assert_eq!(facts[0].last_updated_at, third.created_at);
        assert_eq!(facts[0].event_history.len(), 3);
        assert_eq!(facts[0].event_history[0].id, third.id);
    }

    #[test]
    fn test_concurrent_supersession_resolved_at_read() {
        let base = arr(1.0, EventType::Created, 0);
        let left = arr(2.0, EventType::Superseded, 1).superseding(base.id);
        let right = arr(3.0, EventType::Superseded, 2).superseding(base.id);

        let facts = project(&[base, left, right.clone()]);
        assert_eq!(facts[0].current_event_id, right.id);
    }

    #[test]
    fn test_same_timestamp_broken_by_id() {
        let a = arr(1.0, EventType::Created, 0);
        let b = arr(2.0, EventType::Created, 0);
        let expected = if a.id > b.id { a.id } else { b.id };
        assert_eq!(project(&[a, b])[0].current_event_id, expected);
    }

    #[test]
    fn test_deleted_key_is_omitted() {
        let created = arr(1.0, EventType::Created, 0);
        let deleted = arr(1.0, EventType::Deleted, 1).superseding(created.id);
        let mrr = event("financial.mrr", 5.0, FactSource::DataRoom, EventType::Created, 0);

        let facts = project(&[created, deleted, mrr.clone()]);
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].current_event_id, mrr.id);
    }

    #[test]
    fn test_pending_review_never_becomes_current() {
        let created = arr(1.0, EventType::Created, 0);
        let pending = arr(9.0, EventType::PendingReview, 1).superseding(created.id);

        let facts = project(&[created.clone(), pending.clone()]);
        assert_eq!(facts[0].current_event_id, created.id);
        assert_eq!(facts[0].last_updated_at, pending.created_at);
    }

    #[test]
    fn test_dispute_details_and_resolution() {
        let created = arr(1_000_000.0, EventType::Created, 0);
        let disputed = event("financial.arr", 700_000.0, FactSource::DataRoom, EventType::Disputed, 1)
            .superseding(created.id)
            .with_reason("bank statements disagree");

        let facts = project(&[created.clone(), disputed.clone()]);
        let fact = &facts[0];
        assert!(fact.is_disputed);
        assert_eq!(fact.current_event_id, created.id);
        let details = fact.dispute_details.as_ref().unwrap();
        assert_eq!(details.conflicting_value, FactValue::Number(700_000.0));
        assert_eq!(details.conflicting_source, FactSource::DataRoom);
        assert_eq!(details.reason.as_deref(), Some("bank statements disagree"));
        assert!(!details.resolved);

        let resolved = event("financial.arr", 700_000.0, FactSource::BaOverride, EventType::Resolved, 2)
            .superseding(created.id);
        let facts = project(&[created, disputed, resolved.clone()]);
        let fact = &facts[0];
        assert!(fact.is_disputed, "dispute stays in the history");
        assert!(fact.dispute_details.as_ref().unwrap().resolved);
        assert_eq!(fact.current_event_id, resolved.id);
    }

    #[test]
    fn test_reliability_carried_from_frontier() {
        let mut created = arr(1.0, EventType::Created, 0);
        created.reliability = Some(Reliability::Projected);
        let facts = project(&[created]);
        let classification = facts[0].reliability.as_ref().unwrap();
        assert_eq!(classification.reliability, Reliability::Projected);
        assert!(classification.is_projection);
    }

    #[test]
    fn test_deals_are_projected_separately() {
        let a = arr(1.0, EventType::Created, 0);
        let mut b = arr(2.0, EventType::Created, 1);
        b.deal_id = DealId::from("deal-2");
        let facts = project(&[b, a]);
        assert_eq!(facts.len(), 2);
        assert_eq!(facts[0].deal_id, DealId::from("deal-1"));
    }

    #[test]
    fn test_pending_reviews_open_until_settled() {
        let created = arr(1.0, EventType::Created, 0);
        let pending = arr(9.0, EventType::PendingReview, 1).superseding(created.id);
        assert_eq!(pending_reviews(&[created.clone(), pending.clone()]), vec![pending.clone()]);

        let accepted = arr(9.0, EventType::Resolved, 2).superseding(created.id);
        assert!(pending_reviews(&[created, pending, accepted]).is_empty());
    }
}
