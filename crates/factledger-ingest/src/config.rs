//! Configuration for the write path

use serde::{Deserialize, Serialize};

/// Configuration for [`FactLedger`](crate::FactLedger)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Append a PENDING_REVIEW event for every REVIEW_NEEDED candidate
    ///
    /// When off, review candidates are only reported in the result.
    pub record_pending_reviews: bool,

    /// Largest number of candidates accepted in one request
    pub max_batch_size: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            record_pending_reviews: true,
            max_batch_size: 500,
        }
    }
}

impl IngestConfig {
    /// Small batches, every review recorded
    pub fn strict() -> Self {
        Self {
            record_pending_reviews: true,
            max_batch_size: 100,
        }
    }

    /// Large batches, reviews reported but not recorded
    pub fn lenient() -> Self {
        Self {
            record_pending_reviews: false,
            max_batch_size: 5_000,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_batch_size == 0 {
            return Err("max_batch_size must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
