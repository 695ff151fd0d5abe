//! In-memory propagation of verification verdicts
//!
//! A fast path between pipeline phases: verdicts are applied to copies of the
//! current facts and nothing is written to the log.

use chrono::Utc;
use factledger_domain::{
    CurrentFact, DisputeDetails, FactKey, FactValue, Reliability, ReliabilityClassification,
};
use serde::{Deserialize, Serialize};

/// What a verification step concluded about a fact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum Verdict {
    /// The value was confirmed
    Verified,
    /// The value was wrong; this is the corrected one
    Contradicted {
        /// Corrected value
        corrected_value: FactValue,
        /// Rendering of the corrected value
        corrected_display_value: String,
    },
    /// The value could not be checked
    Unverifiable,
}

/// A verification verdict for one fact key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactValidation {
    /// Key the verdict applies to
    pub fact_key: FactKey,
    /// The verdict
    #[serde(flatten)]
    pub verdict: Verdict,
    /// Confidence after verification, 0-100
    pub confidence: u8,
    /// Verifier's explanation
    pub reason: Option<String>,
}

impl FactValidation {
    /// Create a validation
    pub fn new(fact_key: FactKey, verdict: Verdict, confidence: u8) -> Self {
        Self {
            fact_key,
            verdict,
            confidence: confidence.min(100),
            reason: None,
        }
    }

    /// Attach the verifier's explanation
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Apply verdicts to copies of `facts`
///
/// Facts without a verdict are copied unchanged. When several verdicts name
/// the same key the last one wins. The inputs are only borrowed, so the
/// caller's facts are never altered.
pub fn update_facts_in_memory(facts: &[CurrentFact], validations: &[FactValidation]) -> Vec<CurrentFact> {
    facts
        .iter()
        .map(|fact| {
            let mut updated = fact.clone();
            if let Some(validation) = validations.iter().rev().find(|v| v.fact_key == fact.fact_key) {
                apply(&mut updated, validation);
            }
            updated
        })
        .collect()
}

fn apply(fact: &mut CurrentFact, validation: &FactValidation) {
    fact.current_confidence = validation.confidence;
    let reason = validation.reason.clone();

    match &validation.verdict {
        Verdict::Verified => {
            let current = fact.reliability.as_ref().map(|c| c.reliability).unwrap_or_default();
            if current == Reliability::Declared {
                let mut classification =
                    ReliabilityClassification::new(Reliability::Verified, "confirmed by verification");
                classification.verification_method = reason;
                fact.reliability = Some(classification);
            }
        }
        Verdict::Contradicted {
            corrected_value,
            corrected_display_value,
        } => {
            fact.dispute_details = Some(DisputeDetails {
                conflicting_value: fact.current_value.clone(),
                conflicting_display_value: fact.current_display_value.clone(),
                conflicting_source: fact.current_source,
                reason,
                disputed_at: Utc::now(),
                resolved: false,
            });
            fact.current_value = corrected_value.clone();
            fact.current_display_value = corrected_display_value.clone();
            fact.is_disputed = true;
        }
        Verdict::Unverifiable => {
            let reasoning = reason.unwrap_or_else(|| "could not be verified".to_string());
            fact.reliability = Some(ReliabilityClassification::new(Reliability::Unverifiable, reasoning));
        }
    }

    tracing::debug!(
        fact_key = %fact.fact_key,
        confidence = fact.current_confidence,
        "applied verification verdict"
    );
}
