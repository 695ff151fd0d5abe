//! Contradiction records (ephemeral, produced by the matcher)

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{FactKey, FactSource, FactValue};

/// Magnitude of a detected contradiction
///
/// Ordered: `Minor < Significant < Major`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Significance {
    /// 5-15% relative delta, or any non-numeric difference
    Minor,
    /// 15-30% relative delta
    Significant,
    /// 30% or more; always needs a human
    Major,
}

impl Significance {
    /// Get the name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Significance::Minor => "MINOR",
            Significance::Significant => "SIGNIFICANT",
            Significance::Major => "MAJOR",
        }
    }
}

impl fmt::Display for Significance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A divergence between a candidate and the current value for a key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContradictionInfo {
    /// Key both observations are about
    pub fact_key: FactKey,
    /// Candidate value
    pub new_value: FactValue,
    /// Current value
    pub existing_value: FactValue,
    /// Candidate source
    pub new_source: FactSource,
    /// Current source
    pub existing_source: FactSource,
    /// Relative delta in percent, for numeric keys
    pub delta_percent: Option<f64>,
    /// Classified magnitude
    pub significance: Significance,
}

impl fmt::Display for ContradictionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {} ({}) vs {} ({})",
            self.significance,
            self.fact_key,
            self.new_value,
            self.new_source,
            self.existing_value,
            self.existing_source
        )?;
        if let Some(delta) = self.delta_percent {
            write!(f, ", delta {:.1}%", delta)?;
        }
        Ok(())
    }
}
