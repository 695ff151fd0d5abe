//! Error types for the write path

use factledger_domain::{DealId, DomainError, EventId, FactKey};
use factledger_matcher::MatcherError;
use factledger_projector::ProjectorError;
use thiserror::Error;

/// Errors that can occur while writing to the ledger
#[derive(Error, Debug)]
pub enum IngestError {
    /// Event store error
    #[error("Store error: {0}")]
    Store(String),

    /// Current facts could not be projected
    #[error(transparent)]
    Projector(#[from] ProjectorError),

    /// Matcher rejected its configuration
    #[error(transparent)]
    Matcher(#[from] MatcherError),

    /// Input failed taxonomy validation
    #[error("Validation error: {0}")]
    Validation(#[from] DomainError),

    /// Request holds more candidates than allowed
    #[error("Batch too large: {0} facts (max: {1})")]
    BatchTooLarge(usize, usize),

    /// The operation needs a current value and the key has none
    #[error("No current value for {fact_key} in deal {deal_id}")]
    NoCurrentFact {
        /// Deal searched
        deal_id: DealId,
        /// Key without a current value
        fact_key: FactKey,
    },

    /// The event is not an open PENDING_REVIEW event of this deal
    #[error("No open review {0}")]
    ReviewNotFound(EventId),

    /// The key carries no unresolved dispute
    #[error("No open dispute for {0}")]
    NotDisputed(FactKey),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
