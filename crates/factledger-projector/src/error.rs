//! Projector error types

use thiserror::Error;

/// Errors that can occur while projecting current facts
#[derive(Error, Debug)]
pub enum ProjectorError {
    /// The event log could not be read
    #[error("Store error: {0}")]
    Store(String),

    /// The snapshot could not be written
    #[error("Snapshot error: {0}")]
    Snapshot(String),
}
