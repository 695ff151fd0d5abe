//! Request and response types for ingestion

use chrono::{DateTime, Utc};
use factledger_domain::{
    ContradictionInfo, DealId, EventId, ExtractedFact, RawExtractedFact,
};
use factledger_matcher::MatchedFact;
use serde::{Deserialize, Serialize};

/// A candidate as submitted by a producer
#[derive(Debug, Clone)]
pub enum SubmittedFact {
    /// Already typed against the taxonomy
    Typed(ExtractedFact),
    /// Wire form, validated on ingestion
    Raw(RawExtractedFact),
}

impl SubmittedFact {
    /// Key as submitted, for reporting rejections
    pub fn fact_key(&self) -> String {
        match self {
            SubmittedFact::Typed(fact) => fact.fact_key.to_string(),
            SubmittedFact::Raw(raw) => raw.fact_key.clone(),
        }
    }
}

impl From<ExtractedFact> for SubmittedFact {
    fn from(fact: ExtractedFact) -> Self {
        SubmittedFact::Typed(fact)
    }
}

impl From<RawExtractedFact> for SubmittedFact {
    fn from(raw: RawExtractedFact) -> Self {
        SubmittedFact::Raw(raw)
    }
}

/// Request to ingest one extraction batch for a deal
#[derive(Debug, Clone)]
pub struct IngestRequest {
    /// Deal the facts are about
    pub deal_id: DealId,

    /// Candidates in submission order
    pub facts: Vec<SubmittedFact>,
}

impl IngestRequest {
    /// Build a request from typed or raw candidates
    pub fn new<I, F>(deal_id: impl Into<DealId>, facts: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<SubmittedFact>,
    {
        Self {
            deal_id: deal_id.into(),
            facts: facts.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a JSON array of wire-form candidates
    pub fn from_json(deal_id: impl Into<DealId>, json: &str) -> Result<Self, serde_json::Error> {
        let raw: Vec<RawExtractedFact> = serde_json::from_str(json)?;
        Ok(Self::new(deal_id, raw))
    }
}

/// A candidate that failed validation and was not matched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rejection {
    /// Key as submitted
    pub fact_key: String,

    /// Why it was rejected
    pub reason: String,
}

/// Result of an ingestion
#[derive(Debug, Clone)]
pub struct IngestResult {
    /// CREATED events for keys that had no current value
    pub created: Vec<EventId>,

    /// SUPERSEDED events that replaced a current value
    pub superseded: Vec<EventId>,

    /// PENDING_REVIEW events recorded for held-back candidates
    pub pending_review: Vec<EventId>,

    /// Candidates that lost to the current value (no event written)
    pub ignored: Vec<MatchedFact>,

    /// Candidates held for human review, recorded or not
    pub needs_review: Vec<MatchedFact>,

    /// Candidates that failed validation
    pub rejected: Vec<Rejection>,

    /// Every contradiction found, whatever the decision
    pub contradictions: Vec<ContradictionInfo>,

    /// Metadata about the ingestion
    pub metadata: IngestMetadata,
}

impl IngestResult {
    /// Number of events appended
    pub fn events_appended(&self) -> usize {
        self.created.len() + self.superseded.len() + self.pending_review.len()
    }

    /// One-line summary for logs
    pub fn summary(&self) -> String {
        format!(
            "deal {}: {} submitted, {} created, {} superseded, {} ignored, {} review, {} rejected, {} contradictions",
            self.metadata.deal_id,
            self.metadata.total_submitted,
            self.created.len(),
            self.superseded.len(),
            self.ignored.len(),
            self.needs_review.len(),
            self.rejected.len(),
            self.contradictions.len()
        )
    }
}

/// Metadata about an ingestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestMetadata {
    /// Deal ingested into
    pub deal_id: DealId,

    /// When the batch was received
    pub received_at: DateTime<Utc>,

    /// Candidates in the request
    pub total_submitted: usize,

    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// How an analyst settles a pending review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewDecision {
    /// The held-back candidate becomes the current value
    Accept,
    /// The current value stands
    Reject,
}

/// How an analyst settles a dispute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisputeResolution {
    /// The current value stands
    KeepCurrent,
    /// The disputing value becomes the current value
    AcceptConflicting,
}
