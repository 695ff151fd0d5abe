//! Factledger Calibration
//!
//! Offline analytics over the fact event log: buckets system-reported
//! confidence into bands and measures how often each band's observations were
//! later overridden by an analyst. A band whose override rate exceeds its
//! ceiling is reported as over-confident.
//!
//! This is a feedback signal for extraction quality. It never writes to the
//! log and sits outside the ingest and read paths.
//!
//! # Bands
//!
//! | Band | Confidence | Default ceiling |
//! |------|-----------|-----------------|
//! | Top | 95-100 | 5% |
//! | High | 85-94 | 10% |
//! | Moderate | 70-84 | 20% |
//!
//! Observations below 70 are counted separately and never judged.
//!
//! # Usage
//!
//! ```no_run
//! use chrono::Utc;
//! use factledger_calibration::{CalibrationAnalyzer, CalibrationConfig};
//! use factledger_store::SqliteStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SqliteStore::new("factledger.db")?;
//! let analyzer = CalibrationAnalyzer::new(CalibrationConfig::strict())?;
//!
//! let report = analyzer.analyze(&store, Utc::now())?;
//! for band in report.over_confident_bands() {
//!     println!("{} is over-confident", band);
//! }
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [calibration]
//! window_days = 30
//! min_sample_size = 10
//! top_band_max_override_rate = 0.05
//! high_band_max_override_rate = 0.10
//! moderate_band_max_override_rate = 0.20
//! ```

#![warn(missing_docs)]

mod analyzer;
mod config;
mod error;
mod report;

pub use analyzer::CalibrationAnalyzer;
pub use config::CalibrationConfig;
pub use error::CalibrationError;
pub use report::{BandStats, CalibrationReport, ConfidenceBand};
