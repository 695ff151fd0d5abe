//! Matcher configuration

use serde::{Deserialize, Serialize};

/// Contradiction thresholds and review policy for the matching engine
///
/// Thresholds are relative deltas (`0.05` = 5%).
///
/// # Examples
///
/// ```
/// use factledger_matcher::MatcherConfig;
///
/// let config = MatcherConfig::default();
/// assert_eq!(config.major_threshold, 0.30);
/// assert!(config.validate().is_ok());
///
/// let strict = MatcherConfig::strict();
/// assert!(strict.major_threshold < config.major_threshold);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Smallest delta reported as a contradiction (MINOR)
    pub minor_threshold: f64,

    /// Delta at which a contradiction becomes SIGNIFICANT
    pub significant_threshold: f64,

    /// Delta at which a contradiction becomes MAJOR and needs a human
    pub major_threshold: f64,

    /// Route numeric comparisons that cannot be coerced to REVIEW_NEEDED
    ///
    /// When off, an uncomparable pair is treated as consistent and falls
    /// through to the source-priority decision.
    pub review_uncomparable: bool,

    /// Let BA_OVERRIDE candidates skip the MAJOR review gate
    pub human_override_bypasses_review: bool,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            minor_threshold: 0.05,
            significant_threshold: 0.15,
            major_threshold: 0.30,
            review_uncomparable: true,
            human_override_bypasses_review: false,
        }
    }
}

impl MatcherConfig {
    /// Tighter thresholds: smaller swings reach review
    pub fn strict() -> Self {
        Self {
            minor_threshold: 0.02,
            significant_threshold: 0.08,
            major_threshold: 0.15,
            review_uncomparable: true,
            human_override_bypasses_review: false,
        }
    }

    /// Looser thresholds: only very large swings reach review
    pub fn lenient() -> Self {
        Self {
            minor_threshold: 0.10,
            significant_threshold: 0.25,
            major_threshold: 0.50,
            review_uncomparable: false,
            human_override_bypasses_review: true,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        let thresholds = [
            ("minor_threshold", self.minor_threshold),
            ("significant_threshold", self.significant_threshold),
            ("major_threshold", self.major_threshold),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be a non-negative number, got {}", name, value));
            }
        }
        if self.minor_threshold >= self.significant_threshold {
            return Err("minor_threshold must be below significant_threshold".to_string());
        }
        if self.significant_threshold >= self.major_threshold {
            return Err("significant_threshold must be below major_threshold".to_string());
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
    fn test_presets_are_valid() {
        assert!(MatcherConfig::default().validate().is_ok());
        assert!(MatcherConfig::strict().validate().is_ok());
        assert!(MatcherConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_thresholds_must_increase() {
        let config = MatcherConfig {
            significant_threshold: 0.40,
            ..MatcherConfig::default()
        };
        assert!(config.validate().is_err());

        let config = MatcherConfig {
            minor_threshold: 0.15,
            ..MatcherConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_negative_threshold() {
        let config = MatcherConfig {
            minor_threshold: -0.01,
            ..MatcherConfig::default()
        };
        assert!(config.validate().unwrap_err().contains("minor_threshold"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = MatcherConfig::from_toml("major_threshold = 0.5").unwrap();
        assert_eq!(config.major_threshold, 0.5);
        assert_eq!(config.minor_threshold, 0.05);
        assert!(config.review_uncomparable);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = MatcherConfig::lenient();
        let toml_str = config.to_toml().unwrap();
        assert_eq!(MatcherConfig::from_toml(&toml_str).unwrap(), config);
    }
}
