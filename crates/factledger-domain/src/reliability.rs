//! Reliability tags (epistemic status of a resolved value)

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// How far a resolved value can be trusted
///
/// Orthogonal to [`crate::FactSource`] priority: a `DATA_ROOM` figure can
/// still be a projection and must be framed as one even though it wins
/// supersession against a pitch deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Reliability {
    /// Backed by audited statements
    Audited,
    /// Independently checked against a primary document
    Verified,
    /// Stated by the company, not independently checked
    #[default]
    Declared,
    /// Forward-looking figure
    Projected,
    /// Approximation or third-party estimate
    Estimated,
    /// Cannot be checked at all
    Unverifiable,
}

impl Reliability {
    /// All tags, most trustworthy first
    pub const ALL: [Reliability; 6] = [
        Reliability::Audited,
        Reliability::Verified,
        Reliability::Declared,
        Reliability::Projected,
        Reliability::Estimated,
        Reliability::Unverifiable,
    ];

    /// Fixed trust weight in [0.2, 1.0]
    pub fn weight(&self) -> f64 {
        match self {
            Reliability::Audited => 1.0,
            Reliability::Verified => 0.9,
            Reliability::Declared => 0.7,
            Reliability::Projected => 0.4,
            Reliability::Estimated => 0.3,
            Reliability::Unverifiable => 0.2,
        }
    }

    /// Whether the value describes the future rather than the present
    pub fn is_forward_looking(&self) -> bool {
        matches!(self, Reliability::Projected | Reliability::Estimated)
    }

    /// Get the tag name as stored
    pub fn as_str(&self) -> &'static str {
        match self {
            Reliability::Audited => "AUDITED",
            Reliability::Verified => "VERIFIED",
            Reliability::Declared => "DECLARED",
            Reliability::Projected => "PROJECTED",
            Reliability::Estimated => "ESTIMATED",
            Reliability::Unverifiable => "UNVERIFIABLE",
        }
    }

    /// Parse a tag from its stored name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|r| r.as_str().eq_ignore_ascii_case(s))
    }
}

impl std::str::FromStr for Reliability {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| DomainError::UnknownReliability(s.to_string()))
    }
}

impl fmt::Display for Reliability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying a fact's reliability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityClassification {
    /// Assigned tag
    pub reliability: Reliability,

    /// Why the tag was assigned
    pub reasoning: String,

    /// Whether the value is a forward-looking projection
    pub is_projection: bool,

    /// Notes on the time period the value refers to
    pub temporal_analysis: Option<String>,

    /// How the value was (or could be) verified
    pub verification_method: Option<String>,
}

impl ReliabilityClassification {
    /// Create a classification with just a tag and reasoning
    pub fn new(reliability: Reliability, reasoning: impl Into<String>) -> Self {
        Self {
            reliability,
            reasoning: reasoning.into(),
            is_projection: reliability == Reliability::Projected,
            temporal_analysis: None,
            verification_method: None,
        }
    }

    /// Attach a temporal note
    pub fn with_temporal_analysis(mut self, note: impl Into<String>) -> Self {
        self.temporal_analysis = Some(note.into());
        self
    }

    /// Attach a verification method
    pub fn with_verification_method(mut self, method: impl Into<String>) -> Self {
        self.verification_method = Some(method.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_are_monotonic() {
        for pair in Reliability::ALL.windows(2) {
            assert!(pair[0].weight() > pair[1].weight());
        }
        assert_eq!(Reliability::Audited.weight(), 1.0);
        assert_eq!(Reliability::Unverifiable.weight(), 0.2);
    }

    #[test]
    fn test_default_is_declared() {
        assert_eq!(Reliability::default(), Reliability::Declared);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(Reliability::parse("projected"), Some(Reliability::Projected));
        assert_eq!(Reliability::parse("bogus"), None);
    }

    #[test]
    fn test_classification_projection_flag() {
        let c = ReliabilityClassification::new(Reliability::Projected, "FY2027 plan");
        assert!(c.is_projection);
        let c = ReliabilityClassification::new(Reliability::Verified, "bank statement");
        assert!(!c.is_projection);
    }
}
