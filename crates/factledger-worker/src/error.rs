//! Error types for the maintenance worker

use factledger_calibration::CalibrationError;
use factledger_ingest::IngestError;
use factledger_store::StoreError;
use thiserror::Error;

use crate::ConfigError;

/// Errors that can occur while running maintenance
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Storage layer error
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Calibration run failed
    #[error(transparent)]
    Calibration(#[from] CalibrationError),

    /// Ledger could not be built
    #[error(transparent)]
    Ingest(#[from] IngestError),
}
