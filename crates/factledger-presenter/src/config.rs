//! Classifier and presenter configuration

use factledger_domain::Reliability;
use serde::{Deserialize, Serialize};

/// Marker appended when annotated output hits its size cap
pub const DEFAULT_TRUNCATION_MARKER: &str = "\n[... truncated: further facts omitted ...]";

/// Rules for the keyword-based reliability classifier
///
/// Keywords are matched case-insensitively against a fact's supporting text
/// and display value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Words marking a forward-looking figure
    pub projection_keywords: Vec<String>,

    /// Words marking an approximation
    pub estimate_keywords: Vec<String>,

    /// Words marking audited figures
    pub audit_keywords: Vec<String>,

    /// CONTEXT_ENGINE values below this confidence are UNVERIFIABLE
    pub unverifiable_confidence_floor: u8,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            projection_keywords: words(&[
                "projected",
                "projection",
                "forecast",
                "expected",
                "target",
                "plan to",
                "will reach",
                "pipeline",
                "budget",
            ]),
            estimate_keywords: words(&[
                "approximately",
                "approx",
                "estimated",
                "estimate",
                "roughly",
                "around",
                "about",
                "circa",
                "~",
            ]),
            audit_keywords: words(&["audited", "audit report", "auditor"]),
            unverifiable_confidence_floor: 50,
        }
    }
}

impl ClassifierConfig {
    /// Wider keyword lists and a higher floor: more values get caveats
    pub fn strict() -> Self {
        let mut config = Self::default();
        config
            .projection_keywords
            .extend(words(&["anticipated", "goal", "run-rate", "run rate", "annualized"]));
        config
            .estimate_keywords
            .extend(words(&["nearly", "almost", "up to", "over", "more than"]));
        config.unverifiable_confidence_floor = 70;
        config
    }

    /// Default keywords with a lower floor for web context
    pub fn lenient() -> Self {
        Self {
            unverifiable_confidence_floor: 30,
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.unverifiable_confidence_floor > 100 {
            return Err("unverifiable_confidence_floor must be within 0-100".to_string());
        }
        let lists = [
            ("projection_keywords", &self.projection_keywords),
            ("estimate_keywords", &self.estimate_keywords),
            ("audit_keywords", &self.audit_keywords),
        ];
        for (name, list) in lists {
            if list.iter().any(|w| w.trim().is_empty()) {
                return Err(format!("{} contains an empty keyword", name));
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

/// Output limits and value-level filtering for the renderings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenterConfig {
    /// Character cap for the validation-annotated rendering
    pub max_annotated_chars: usize,

    /// Marker appended when the cap is hit
    pub truncation_marker: String,

    /// Facts below this reliability are dropped or replaced by placeholders
    pub min_reliability: Reliability,
}

impl Default for PresenterConfig {
    fn default() -> Self {
        Self {
            max_annotated_chars: 8000,
            truncation_marker: DEFAULT_TRUNCATION_MARKER.to_string(),
            min_reliability: Reliability::Declared,
        }
    }
}

impl PresenterConfig {
    /// Only verified values reach consumers
    pub fn strict() -> Self {
        Self {
            min_reliability: Reliability::Verified,
            ..Self::default()
        }
    }

    /// Everything but unverifiable values reaches consumers, with more room
    pub fn lenient() -> Self {
        Self {
            max_annotated_chars: 16_000,
            min_reliability: Reliability::Estimated,
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.truncation_marker.chars().count() >= self.max_annotated_chars {
            return Err("max_annotated_chars must leave room for the truncation marker".to_string());
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
