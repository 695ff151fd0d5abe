//! Fact sources and their priority order

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Origin of an observation
///
/// Sources carry a fixed priority used by the supersession engine:
/// `DATA_ROOM = BA_OVERRIDE (100) > FINANCIAL_MODEL (95) > PITCH_DECK (80)
/// > FOUNDER_RESPONSE (65) > CONTEXT_ENGINE (60)`.
///
/// Priority decides which observation wins. It says nothing about how far the
/// winning value can be trusted; see [`crate::Reliability`] for that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FactSource {
    /// Documents uploaded to the deal's data room
    DataRoom,
    /// Explicit correction entered by an analyst
    BaOverride,
    /// The company's financial model
    FinancialModel,
    /// The pitch deck
    PitchDeck,
    /// Written answers from the founders
    FounderResponse,
    /// Web search and third-party context
    ContextEngine,
}

impl FactSource {
    /// All sources, highest priority first
    pub const ALL: [FactSource; 6] = [
        FactSource::DataRoom,
        FactSource::BaOverride,
        FactSource::FinancialModel,
        FactSource::PitchDeck,
        FactSource::FounderResponse,
        FactSource::ContextEngine,
    ];

    /// Numeric priority; higher wins
    pub fn priority(&self) -> u8 {
        match self {
            FactSource::DataRoom | FactSource::BaOverride => 100,
            FactSource::FinancialModel => 95,
            FactSource::PitchDeck => 80,
            FactSource::FounderResponse => 65,
            FactSource::ContextEngine => 60,
        }
    }

    /// Whether this source strictly out-ranks `other`
    pub fn outranks(&self, other: FactSource) -> bool {
        self.priority() > other.priority()
    }

    /// Get the source name as stored
    pub fn as_str(&self) -> &'static str {
        match self {
            FactSource::DataRoom => "DATA_ROOM",
            FactSource::BaOverride => "BA_OVERRIDE",
            FactSource::FinancialModel => "FINANCIAL_MODEL",
            FactSource::PitchDeck => "PITCH_DECK",
            FactSource::FounderResponse => "FOUNDER_RESPONSE",
            FactSource::ContextEngine => "CONTEXT_ENGINE",
        }
    }

    /// Parse a source from its stored name
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|src| src.as_str() == s)
    }
}

impl std::str::FromStr for FactSource {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| DomainError::UnknownSource(s.to_string()))
    }
}

impl fmt::Display for FactSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
