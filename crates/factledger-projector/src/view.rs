//! Store-backed projection and the materialized snapshot

use std::fmt::Display;

use factledger_domain::traits::{FactEventStore, SnapshotStore};
use factledger_domain::{CurrentFact, DealId, FactEvent};

use crate::{project, ProjectorError};

/// Recompute current facts for a deal from its full event log
pub fn current_facts<S>(store: &S, deal_id: &DealId) -> Result<Vec<CurrentFact>, ProjectorError>
where
    S: FactEventStore,
    S::Error: Display,
{
    let events = load_events(store, deal_id)?;
    let facts = project(&events);
    tracing::debug!(deal = %deal_id, events = events.len(), facts = facts.len(), "projected current facts");
    Ok(facts)
}

/// Current facts from the snapshot, falling back to a full recompute
///
/// Snapshot facts carry no history and no dispute details. A missing
/// snapshot or a failed read is never surfaced: the log is projected
/// instead.
pub fn current_facts_from_view<S>(
    store: &S,
    deal_id: &DealId,
) -> Result<Vec<CurrentFact>, ProjectorError>
where
    S: FactEventStore + SnapshotStore,
    <S as FactEventStore>::Error: Display,
    <S as SnapshotStore>::Error: Display,
{
    match store.read_snapshot(deal_id) {
        Ok(Some(facts)) => Ok(facts),
        Ok(None) => {
            tracing::debug!(deal = %deal_id, "no snapshot, recomputing");
            current_facts(store, deal_id)
        }
        Err(e) => {
            tracing::warn!(deal = %deal_id, error = %e, "snapshot read failed, recomputing");
            current_facts(store, deal_id)
        }
    }
}

/// Recompute a deal's current facts and replace its snapshot
///
/// Returns the number of facts written.
pub fn refresh_view<S>(store: &mut S, deal_id: &DealId) -> Result<usize, ProjectorError>
where
    S: FactEventStore + SnapshotStore,
    <S as FactEventStore>::Error: Display,
    <S as SnapshotStore>::Error: Display,
{
    let facts = current_facts(&*store, deal_id)?;
    store
        .write_snapshot(deal_id, &facts)
        .map_err(|e| ProjectorError::Snapshot(e.to_string()))?;
    tracing::info!(deal = %deal_id, facts = facts.len(), "refreshed current-facts snapshot");
    Ok(facts.len())
}

fn load_events<S>(store: &S, deal_id: &DealId) -> Result<Vec<FactEvent>, ProjectorError>
where
    S: FactEventStore,
    S::Error: Display,
{
    store
        .events_for_deal(deal_id)
        .map_err(|e| ProjectorError::Store(e.to_string()))
}
