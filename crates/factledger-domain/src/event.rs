//! Fact events - the immutable, append-only records of the ledger

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    DomainError, ExtractedFact, FactCategory, FactKey, FactSource, FactValue, Reliability,
};

/// Unique identifier for a fact event based on UUIDv7
///
/// UUIDv7 gives chronological sortability, which the projector uses to break
/// ties between events that share a `created_at` timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(u128);

impl EventId {
    /// Generate a new UUIDv7-based EventId
    ///
    /// # Examples
    ///
    /// ```
    /// use factledger_domain::EventId;
    ///
    /// let id = EventId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create an EventId from a raw u128 value
    ///
    /// This is primarily for storage layer deserialization.
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse an EventId from its hyphenated string form
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| DomainError::InvalidId(format!("{}: {}", s, e)))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }

    /// Big-endian bytes for storage
    pub fn to_bytes(&self) -> [u8; 16] {
        self.0.to_be_bytes()
    }

    /// Rebuild from big-endian bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DomainError> {
        let arr: [u8; 16] = bytes.try_into().map_err(|_| {
            DomainError::InvalidId(format!("expected 16 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(u128::from_be_bytes(arr)))
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

impl Serialize for EventId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EventId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        EventId::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Identifier of the deal (business entity) a fact is about
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DealId(String);

impl DealId {
    /// Create a deal id
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DealId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DealId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for DealId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Kind of event in a fact key's history
///
/// Per key: `CREATED -> [SUPERSEDED]* -> {DISPUTED -> RESOLVED}?`, with
/// `DELETED` a logical marker. There is no in-place update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// First observation of a key
    Created,
    /// Observation that replaces an earlier one
    Superseded,
    /// A conflicting observation flagged by verification
    Disputed,
    /// Human adjudication of a dispute or pending review
    Resolved,
    /// Logical removal of the key's current value
    Deleted,
    /// Candidate held back for human review
    PendingReview,
}

impl EventType {
    /// All event types
    pub const ALL: [EventType; 6] = [
        EventType::Created,
        EventType::Superseded,
        EventType::Disputed,
        EventType::Resolved,
        EventType::Deleted,
        EventType::PendingReview,
    ];

    /// Get the type name as stored
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Created => "CREATED",
            EventType::Superseded => "SUPERSEDED",
            EventType::Disputed => "DISPUTED",
            EventType::Resolved => "RESOLVED",
            EventType::Deleted => "DELETED",
            EventType::PendingReview => "PENDING_REVIEW",
        }
    }

    /// Parse a type from its stored name
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == s)
    }

    /// Annotation events record history but never carry the current value
    pub fn is_annotation(&self) -> bool {
        matches!(self, EventType::Disputed | EventType::PendingReview)
    }
}

impl std::str::FromStr for EventType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| DomainError::UnknownEventType(s.to_string()))
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who appended an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreatedBy {
    /// Automated pipeline
    System,
    /// Analyst action
    Human,
}

impl CreatedBy {
    /// Get the name as stored
    pub fn as_str(&self) -> &'static str {
        match self {
            CreatedBy::System => "system",
            CreatedBy::Human => "human",
        }
    }

    /// Parse from the stored name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "system" => Some(CreatedBy::System),
            "human" => Some(CreatedBy::Human),
            _ => None,
        }
    }
}

/// An immutable observation of a fact
///
/// Events are never mutated or removed. An update is a new event whose
/// `supersedes_event_id` points at the event it replaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactEvent {
    /// Unique identifier
    pub id: EventId,
    /// Deal the fact is about
    pub deal_id: DealId,
    /// Taxonomy key
    pub fact_key: FactKey,
    /// Category (always the key's taxonomy category)
    pub category: FactCategory,
    /// Typed value
    pub value: FactValue,
    /// Human-facing rendering of the value
    pub display_value: String,
    /// Optional unit (e.g. "USD", "months")
    pub unit: Option<String>,
    /// Where the observation came from
    pub source: FactSource,
    /// Document the value was extracted from
    pub source_document_id: Option<String>,
    /// Extractor confidence, 0-100
    pub source_confidence: u8,
    /// Verbatim text the value was extracted from
    pub extracted_text: Option<String>,
    /// Producer-supplied reliability tag
    pub reliability: Option<Reliability>,
    /// Kind of event
    pub event_type: EventType,
    /// Event this one replaces
    pub supersedes_event_id: Option<EventId>,
    /// When the event was appended
    pub created_at: DateTime<Utc>,
    /// Who appended it
    pub created_by: CreatedBy,
    /// Free-form audit note
    pub reason: Option<String>,
}

impl FactEvent {
    /// Create a system event with a fresh id and the current time
    pub fn new(
        deal_id: DealId,
        fact_key: FactKey,
        value: FactValue,
        display_value: impl Into<String>,
        source: FactSource,
        source_confidence: u8,
        event_type: EventType,
    ) -> Self {
        Self {
            id: EventId::new(),
            deal_id,
            fact_key,
            category: fact_key.category(),
            value,
            display_value: display_value.into(),
            unit: None,
            source,
            source_document_id: None,
            source_confidence: source_confidence.min(100),
            extracted_text: None,
            reliability: None,
            event_type,
            supersedes_event_id: None,
            created_at: Utc::now(),
            created_by: CreatedBy::System,
            reason: None,
        }
    }

    /// Build an event from a producer's extracted fact
    pub fn from_extracted(deal_id: DealId, fact: &ExtractedFact, event_type: EventType) -> Self {
        let mut event = Self::new(
            deal_id,
            fact.fact_key,
            fact.value.clone(),
            fact.display_value.clone(),
            fact.source,
            fact.source_confidence,
            event_type,
        );
        event.unit = fact.unit.clone();
        event.source_document_id = fact.source_document_id.clone();
        event.extracted_text = fact.extracted_text.clone();
        event.reliability = fact.reliability;
        event
    }

    /// Point this event at the event it replaces
    pub fn superseding(mut self, event_id: EventId) -> Self {
        self.supersedes_event_id = Some(event_id);
        self
    }

    /// Attach an audit reason
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Mark as human-originated
    pub fn by_human(mut self) -> Self {
        self.created_by = CreatedBy::Human;
        self
    }

    /// Override the creation timestamp (replay and tests)
    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Newest-first ordering: later `created_at` first, id breaks ties
    pub fn newest_first(a: &FactEvent, b: &FactEvent) -> std::cmp::Ordering {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn arr_event(amount: f64) -> FactEvent {
        FactEvent::new(
            DealId::from("deal-1"),
            FactKey::parse("financial.arr").unwrap(),
            FactValue::Number(amount),
            amount.to_string(),
            FactSource::PitchDeck,
            80,
            EventType::Created,
        )
    }

    #[test]
    fn test_event_id_ordering() {
        let id1 = EventId::from_value(1000);
        let id2 = EventId::from_value(2000);
        assert!(id1 < id2);
    }

    #[test]
    fn test_event_id_chronological() {
        let id1 = EventId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = EventId::new();
        assert!(id1 < id2, "Earlier UUIDv7 should be less than later UUIDv7");
    }

    #[test]
    fn test_event_id_bytes_and_string() {
        let id = EventId::new();
        assert_eq!(EventId::from_bytes(&id.to_bytes()).unwrap(), id);
        assert_eq!(EventId::parse(&id.to_string()).unwrap(), id);
        assert!(EventId::from_bytes(&[1, 2, 3]).is_err());
        assert!(EventId::parse("not-a-uuid").is_err());
    }

    #[test]
    fn test_new_event_takes_category_from_key() {
        let e = arr_event(1.0);
        assert_eq!(e.category, FactCategory::Financial);
        assert_eq!(e.created_by, CreatedBy::System);
        assert!(e.supersedes_event_id.is_none());
    }

    #[test]
    fn test_confidence_is_clamped() {
        let e = FactEvent::new(
            DealId::from("d"),
            FactKey::parse("team.founder_count").unwrap(),
            FactValue::Number(2.0),
            "2",
            FactSource::PitchDeck,
            250,
            EventType::Created,
        );
        assert_eq!(e.source_confidence, 100);
    }

    #[test]
    fn test_newest_first_breaks_ties_by_id() {
        let now = Utc::now();
        let a = arr_event(1.0).at(now);
        let b = arr_event(2.0).at(now);
        let c = arr_event(3.0).at(now - Duration::seconds(5));
        let mut events = vec![c.clone(), a.clone(), b.clone()];
        events.sort_by(FactEvent::newest_first);
        let expected_first = if a.id > b.id { &a } else { &b };
        assert_eq!(&events[0], expected_first);
        assert_eq!(events[2], c);
    }

    #[test]
    fn test_annotation_types() {
        assert!(EventType::Disputed.is_annotation());
        assert!(EventType::PendingReview.is_annotation());
        assert!(!EventType::Resolved.is_annotation());
        assert!(!EventType::Deleted.is_annotation());
    }

    #[test]
    fn test_event_json_round_trip() {
        let e = arr_event(1_000_000.0).with_reason("initial");
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("\"factKey\":\"financial.arr\""));
        let back: FactEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
    }
}
