//! Factledger Worker
//!
//! Background maintenance for the fact ledger:
//!
//! - **Snapshot refresh**: rewrites every deal's current-facts snapshot on a
//!   dedicated connection. Failures are logged and skipped; readers fall back
//!   to full recomputation.
//! - **Calibration**: periodically measures how often confident extractions
//!   were later overridden by analysts.
//!
//! Neither job sits on the ingest or read path.
//!
//! # Background Worker
//!
//! ```no_run
//! use factledger_worker::{MaintenanceWorker, WorkerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = WorkerConfig::from_file("factledger.toml")?;
//!     let mut worker = MaintenanceWorker::from_config(&config)?;
//!     worker.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! The `factledger-worker` binary wraps this with `--config`, `--database`
//! and `--once` flags.

#![warn(missing_docs)]

mod config;
mod error;
mod refresher;
mod worker;

pub use config::{ConfigError, WorkerConfig, WorkerSettings};
pub use error::WorkerError;
pub use refresher::{RefreshReport, ViewRefresher};
pub use worker::{MaintenanceWorker, WorkerMetrics};
