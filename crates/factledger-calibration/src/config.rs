//! Configuration for calibration runs
//!
//! Defines the analysis window, the sample size below which a band is not
//! judged, and the override rate each confidence band is allowed.

use serde::{Deserialize, Serialize};

use crate::ConfidenceBand;

/// Configuration for the calibration analyzer
///
/// # Examples
///
/// ```
/// use factledger_calibration::CalibrationConfig;
///
/// let config = CalibrationConfig::default();
/// assert_eq!(config.window_days, 30);
///
/// let config = CalibrationConfig::strict();
/// assert!(config.top_band_max_override_rate < 0.05);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Length of the analysis window ending at the run time (in days)
    pub window_days: u32,

    /// Bands with fewer events than this are reported but never flagged
    pub min_sample_size: usize,

    /// Highest acceptable override rate for the 95-100 band
    pub top_band_max_override_rate: f64,

    /// Highest acceptable override rate for the 85-94 band
    pub high_band_max_override_rate: f64,

    /// Highest acceptable override rate for the 70-84 band
    pub moderate_band_max_override_rate: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            window_days: 30,
            min_sample_size: 10,
            top_band_max_override_rate: 0.05,
            high_band_max_override_rate: 0.10,
            moderate_band_max_override_rate: 0.20,
        }
    }
}

impl CalibrationConfig {
    /// Tight ceilings and a larger sample before judging
    pub fn strict() -> Self {
        Self {
            window_days: 30,
            min_sample_size: 20,
            top_band_max_override_rate: 0.02,
            high_band_max_override_rate: 0.05,
            moderate_band_max_override_rate: 0.10,
        }
    }

    /// Longer window and looser ceilings for low-volume deployments
    pub fn lenient() -> Self {
        Self {
            window_days: 90,
            min_sample_size: 5,
            top_band_max_override_rate: 0.10,
            high_band_max_override_rate: 0.20,
            moderate_band_max_override_rate: 0.30,
        }
    }

    /// Ceiling configured for `band`
    pub fn max_override_rate(&self, band: ConfidenceBand) -> f64 {
        match band {
            ConfidenceBand::Top => self.top_band_max_override_rate,
            ConfidenceBand::High => self.high_band_max_override_rate,
            ConfidenceBand::Moderate => self.moderate_band_max_override_rate,
        }
    }

    /// Analysis window as a duration
    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.window_days))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.window_days == 0 {
            return Err("window_days must be > 0".to_string());
        }
        if self.min_sample_size == 0 {
            return Err("min_sample_size must be > 0".to_string());
        }
        for band in ConfidenceBand::ALL {
            let rate = self.max_override_rate(band);
            if !(0.0..=1.0).contains(&rate) {
                return Err(format!("max override rate for band {} must be within 0.0-1.0", band));
            }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CalibrationConfig::default();
        assert_eq!(config.min_sample_size, 10);
        assert_eq!(config.max_override_rate(ConfidenceBand::Top), 0.05);
        assert_eq!(config.max_override_rate(ConfidenceBand::High), 0.10);
        assert_eq!(config.max_override_rate(ConfidenceBand::Moderate), 0.20);
        assert_eq!(config.window(), chrono::Duration::days(30));
    }

    #[test]
    fn test_presets_validate() {
        assert!(CalibrationConfig::default().validate().is_ok());
        assert!(CalibrationConfig::strict().validate().is_ok());
        assert!(CalibrationConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut config = CalibrationConfig::default();
        config.window_days = 0;
        assert!(config.validate().is_err());

        let mut config = CalibrationConfig::default();
        config.high_band_max_override_rate = 1.5;
        assert!(config.validate().unwrap_err().contains("85-94"));
    }

    #[test]
    fn test_toml_serialization() {
        let config = CalibrationConfig::lenient();
        let toml_str = config.to_toml().unwrap();
        assert!(toml_str.contains("window_days = 90"));
        assert_eq!(CalibrationConfig::from_toml(&toml_str).unwrap(), config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = CalibrationConfig::from_toml("window_days = 7").unwrap();
        assert_eq!(config.window_days, 7);
        assert_eq!(config.min_sample_size, 10);
    }
}
