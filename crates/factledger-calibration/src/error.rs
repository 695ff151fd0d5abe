//! Error types for calibration runs

use thiserror::Error;

/// Errors that can occur while analyzing confidence calibration
#[derive(Error, Debug)]
pub enum CalibrationError {
    /// Storage layer error
    #[error("Storage error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
