//! Current facts - the derived view over the event log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    DealId, EventId, FactCategory, FactEvent, FactKey, FactSource, FactValue,
    ReliabilityClassification,
};

/// The resolved state of one fact key for a deal
///
/// Not a system of record: always recomputable from the event log and
/// discarded after use. Instances have no identity across calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentFact {
    /// Deal the fact is about
    pub deal_id: DealId,
    /// Taxonomy key
    pub fact_key: FactKey,
    /// Category
    pub category: FactCategory,
    /// Frontier event the current value comes from
    pub current_event_id: EventId,
    /// Current value
    pub current_value: FactValue,
    /// Human-facing rendering of the current value
    pub current_display_value: String,
    /// Unit of the current value
    pub unit: Option<String>,
    /// Source of the current value
    pub current_source: FactSource,
    /// Confidence of the current value, 0-100
    pub current_confidence: u8,
    /// Whether any event in the key's history is a dispute
    pub is_disputed: bool,
    /// Details of the most recent dispute
    pub dispute_details: Option<DisputeDetails>,
    /// Full history for the key, newest first (empty when read from a snapshot)
    pub event_history: Vec<FactEvent>,
    /// Oldest event in the history
    pub first_seen_at: DateTime<Utc>,
    /// Newest event in the history
    pub last_updated_at: DateTime<Utc>,
    /// Reliability classification, if one has been attached
    pub reliability: Option<ReliabilityClassification>,
}

impl CurrentFact {
    /// Trust weight of the attached reliability (DECLARED when missing)
    pub fn reliability_weight(&self) -> f64 {
        self.reliability
            .as_ref()
            .map(|c| c.reliability)
            .unwrap_or_default()
            .weight()
    }
}

/// The conflicting observation behind a dispute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisputeDetails {
    /// Value reported by the disputing observation
    pub conflicting_value: FactValue,
    /// Rendering of the conflicting value
    pub conflicting_display_value: String,
    /// Source of the conflicting value
    pub conflicting_source: FactSource,
    /// Why the fact was disputed
    pub reason: Option<String>,
    /// When the dispute was recorded
    pub disputed_at: DateTime<Utc>,
    /// Whether a RESOLVED event was recorded after the dispute
    pub resolved: bool,
}
