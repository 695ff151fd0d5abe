//! Domain error types

use thiserror::Error;

use crate::ValueKind;

/// Errors raised while validating domain input
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Fact key is not part of the taxonomy
    #[error("Unknown fact key: {0}")]
    UnknownFactKey(String),

    /// Unrecognised fact category name
    #[error("Unknown fact category: {0}")]
    UnknownCategory(String),

    /// Unrecognised source name
    #[error("Unknown fact source: {0}")]
    UnknownSource(String),

    /// Unrecognised event type name
    #[error("Unknown event type: {0}")]
    UnknownEventType(String),

    /// Unrecognised reliability name
    #[error("Unknown reliability: {0}")]
    UnknownReliability(String),

    /// Value payload does not fit the taxonomy type of its key
    #[error("Invalid {kind} value for {fact_key}: {reason}")]
    InvalidValue {
        /// Key the value was submitted for
        fact_key: String,
        /// Declared taxonomy type
        kind: ValueKind,
        /// What was wrong with the payload
        reason: String,
    },

    /// Category submitted with a fact does not match the taxonomy
    #[error("Category mismatch for {fact_key}: expected {expected}, got {actual}")]
    CategoryMismatch {
        /// Key the fact was submitted for
        fact_key: String,
        /// Category declared in the taxonomy
        expected: String,
        /// Category submitted by the producer
        actual: String,
    },

    /// Confidence outside 0-100
    #[error("Confidence {0} is outside 0-100")]
    InvalidConfidence(i64),

    /// Malformed identifier
    #[error("Invalid identifier: {0}")]
    InvalidId(String),
}
