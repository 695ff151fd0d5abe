//! Matcher error types

use thiserror::Error;

/// Errors that can occur when building a matcher
///
/// Matching itself never fails: REVIEW_NEEDED is an outcome, not an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatcherError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
