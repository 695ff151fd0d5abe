//! Presenter error types

use thiserror::Error;

/// Errors that can occur when building a classifier or presenter
///
/// Rendering itself never fails; missing reliability falls back to DECLARED.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PresenterError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
