//! Configuration file parsing for the worker
//!
//! One TOML file configures the worker and the components it drives:
//!
//! ```toml
//! [worker]
//! database_path = "/var/lib/factledger/ledger.db"
//! refresh_interval_secs = 300
//! calibration_interval_secs = 86400
//!
//! [matcher]
//! major_threshold = 0.30
//!
//! [ingest]
//! max_batch_size = 500
//!
//! [calibration]
//! window_days = 30
//! ```
//!
//! Every section and field is optional.

use std::path::{Path, PathBuf};
use std::time::Duration;

use factledger_calibration::CalibrationConfig;
use factledger_ingest::{FactLedger, IngestConfig};
use factledger_matcher::MatcherConfig;
use factledger_store::SqliteStore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::WorkerError;

/// Worker configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A section failed validation
    #[error("Invalid [{section}] configuration: {reason}")]
    Invalid {
        /// Section name
        section: &'static str,
        /// What was wrong
        reason: String,
    },
}

/// The `[worker]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerSettings {
    /// SQLite database holding the event log
    pub database_path: PathBuf,

    /// Seconds between snapshot refreshes
    pub refresh_interval_secs: u64,

    /// Seconds between calibration runs
    pub calibration_interval_secs: u64,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("factledger.db"),
            refresh_interval_secs: 300,
            calibration_interval_secs: 86_400,
        }
    }
}

/// Full configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Worker schedule and database
    pub worker: WorkerSettings,

    /// Matching thresholds used by ledgers opened from this file
    pub matcher: MatcherConfig,

    /// Write-path settings used by ledgers opened from this file
    pub ingest: IngestConfig,

    /// Calibration job settings
    pub calibration: CalibrationConfig,
}

impl WorkerConfig {
    /// Load and validate a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate a configuration string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: WorkerConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker.refresh_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                section: "worker",
                reason: "refresh_interval_secs must be greater than 0".to_string(),
            });
        }
        if self.worker.calibration_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                section: "worker",
                reason: "calibration_interval_secs must be greater than 0".to_string(),
            });
        }
        self.matcher
            .validate()
            .map_err(|reason| ConfigError::Invalid { section: "matcher", reason })?;
        self.ingest
            .validate()
            .map_err(|reason| ConfigError::Invalid { section: "ingest", reason })?;
        self.calibration
            .validate()
            .map_err(|reason| ConfigError::Invalid { section: "calibration", reason })?;
        Ok(())
    }

    /// Snapshot refresh interval
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.worker.refresh_interval_secs)
    }

    /// Calibration interval
    pub fn calibration_interval(&self) -> Duration {
        Duration::from_secs(self.worker.calibration_interval_secs)
    }

    /// Open a ledger on the configured database with this file's settings
    pub fn open_ledger(&self) -> Result<FactLedger<SqliteStore>, WorkerError> {
        let store = SqliteStore::new(&self.worker.database_path)?;
        Ok(FactLedger::new(store, self.matcher.clone(), self.ingest.clone())?)
    }
}
