//! Trait definitions for the durable event log
//!
//! These traits define the boundary between ledger logic and storage.
//! Implementations live in other crates (factledger-store).

use chrono::{DateTime, Utc};

use crate::{CurrentFact, DealId, EventId, EventType, FactCategory, FactEvent, FactKey, FactSource};

/// Append-only store of fact events
///
/// Implemented by the infrastructure layer (factledger-store). There is no
/// update or delete operation: immutability is part of the contract.
pub trait FactEventStore {
    /// Error type for store operations
    type Error;

    /// Append a single event
    ///
    /// A `supersedes_event_id` must name an existing event of the same deal
    /// and fact key; otherwise the append is rejected and nothing is written.
    fn append_event(&mut self, event: FactEvent) -> Result<EventId, Self::Error>;

    /// Append a batch atomically: either every event is written or none is
    ///
    /// Supersession references may point at events earlier in the same batch.
    fn append_batch(&mut self, events: Vec<FactEvent>) -> Result<Vec<EventId>, Self::Error>;

    /// Get an event by id
    fn get_event(&self, id: EventId) -> Result<Option<FactEvent>, Self::Error>;

    /// All events for a deal, newest first
    fn events_for_deal(&self, deal_id: &DealId) -> Result<Vec<FactEvent>, Self::Error>;

    /// Events matching the query, newest first
    fn query_events(&self, query: &EventQuery) -> Result<Vec<FactEvent>, Self::Error>;

    /// Every deal with at least one event
    fn list_deals(&self) -> Result<Vec<DealId>, Self::Error>;
}

/// Optional precomputed projection of current facts per deal
///
/// Snapshots may be stale. Readers must be prepared to fall back to a full
/// recompute from the event log.
pub trait SnapshotStore {
    /// Error type for snapshot operations
    type Error;

    /// Read the snapshot for a deal; `None` when no snapshot has been written
    fn read_snapshot(&self, deal_id: &DealId) -> Result<Option<Vec<CurrentFact>>, Self::Error>;

    /// Replace the snapshot for a deal atomically
    fn write_snapshot(&mut self, deal_id: &DealId, facts: &[CurrentFact]) -> Result<(), Self::Error>;
}

/// Query criteria for retrieving events
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    /// Filter by deal
    pub deal_id: Option<DealId>,

    /// Filter by fact key
    pub fact_key: Option<FactKey>,

    /// Filter by category
    pub category: Option<FactCategory>,

    /// Filter by event type
    pub event_type: Option<EventType>,

    /// Filter by source
    pub source: Option<FactSource>,

    /// Only events created at or after this instant
    pub created_after: Option<DateTime<Utc>>,

    /// Only events created strictly before this instant
    pub created_before: Option<DateTime<Utc>>,

    /// Maximum results to return
    pub limit: Option<usize>,
}

impl EventQuery {
    /// Query everything for one deal
    pub fn for_deal(deal_id: DealId) -> Self {
        Self {
            deal_id: Some(deal_id),
            ..Default::default()
        }
    }

    /// Whether an event satisfies every filter (limit aside)
    pub fn matches(&self, event: &FactEvent) -> bool {
        self.deal_id.as_ref().is_none_or(|d| &event.deal_id == d)
            && self.fact_key.is_none_or(|k| event.fact_key == k)
            && self.category.is_none_or(|c| event.category == c)
            && self.event_type.is_none_or(|t| event.event_type == t)
            && self.source.is_none_or(|s| event.source == s)
            && self.created_after.is_none_or(|t| event.created_at >= t)
            && self.created_before.is_none_or(|t| event.created_at < t)
    }
}
