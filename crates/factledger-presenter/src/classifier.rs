//! Rule-based reliability classification

use chrono::{Datelike, NaiveDate};
use factledger_domain::{CurrentFact, FactSource, FactValue, Reliability, ReliabilityClassification};

use crate::{ClassifierConfig, PresenterError};

/// Tags each current fact with how far its value can be trusted
///
/// Rules, first match wins:
/// 1. a tag already on the fact (from the producer or a verifier)
/// 2. a date, fiscal year or period after the as-of date: PROJECTED
/// 3. projection keywords: PROJECTED
/// 4. estimate keywords: ESTIMATED
/// 5. audit keywords on a primary source: AUDITED
/// 6. the source: data room and analyst overrides are VERIFIED, company
///    material is DECLARED, web context is ESTIMATED or, below the
///    confidence floor, UNVERIFIABLE
#[derive(Debug, Clone, Default)]
pub struct ReliabilityClassifier {
    config: ClassifierConfig,
}

impl ReliabilityClassifier {
    /// Create a classifier, validating the configuration
    pub fn new(config: ClassifierConfig) -> Result<Self, PresenterError> {
        config.validate().map_err(PresenterError::Config)?;
        Ok(Self { config })
    }

    /// Classify one fact as of `as_of`
    pub fn classify(&self, fact: &CurrentFact, as_of: NaiveDate) -> ReliabilityClassification {
        if let Some(existing) = &fact.reliability {
            return existing.clone();
        }

        let text = normalize(&supporting_text(fact));

        if let FactValue::Date(date) = &fact.current_value {
            if *date > as_of {
                return ReliabilityClassification::new(Reliability::Projected, "date lies in the future")
                    .with_temporal_analysis(format!("{} is after {}", date, as_of));
            }
        }

        if let Some(year) = latest_fiscal_year(&text) {
            if year > as_of.year() {
                return ReliabilityClassification::new(
                    Reliability::Projected,
                    format!("refers to fiscal year {}", year),
                )
                .with_temporal_analysis(format!("FY{} is after {}", year, as_of.year()));
            }
        }

        if fact.fact_key.subkey().starts_with("projected_") {
            return ReliabilityClassification::new(Reliability::Projected, "forward-looking metric");
        }

        if let Some(word) = first_match(&text, &self.config.projection_keywords) {
            return ReliabilityClassification::new(
                Reliability::Projected,
                format!("forward-looking language: '{}'", word),
            );
        }

        if let Some(word) = first_match(&text, &self.config.estimate_keywords) {
            return ReliabilityClassification::new(
                Reliability::Estimated,
                format!("approximate language: '{}'", word),
            );
        }

        let primary = matches!(
            fact.current_source,
            FactSource::DataRoom | FactSource::FinancialModel
        );
        if primary {
            if let Some(word) = first_match(&text, &self.config.audit_keywords) {
                return ReliabilityClassification::new(
                    Reliability::Audited,
                    format!("audited figure: '{}'", word),
                )
                .with_verification_method("audited statements in primary source");
            }
        }

        self.classify_by_source(fact)
    }

    /// Attach a classification to a copy of each fact
    pub fn classify_facts(&self, facts: &[CurrentFact], as_of: NaiveDate) -> Vec<CurrentFact> {
        facts
            .iter()
            .map(|fact| {
                let mut classified = fact.clone();
                let classification = self.classify(fact, as_of);
                tracing::debug!(
                    fact_key = %fact.fact_key,
                    reliability = %classification.reliability,
                    "classified fact"
                );
                classified.reliability = Some(classification);
                classified
            })
            .collect()
    }

    fn classify_by_source(&self, fact: &CurrentFact) -> ReliabilityClassification {
        match fact.current_source {
            FactSource::DataRoom => {
                ReliabilityClassification::new(Reliability::Verified, "primary document in the data room")
                    .with_verification_method("data room document")
            }
            FactSource::BaOverride => {
                ReliabilityClassification::new(Reliability::Verified, "entered by an analyst")
                    .with_verification_method("analyst review")
            }
            FactSource::FinancialModel | FactSource::PitchDeck | FactSource::FounderResponse => {
                ReliabilityClassification::new(
                    Reliability::Declared,
                    format!("stated by the company ({})", fact.current_source),
                )
            }
            FactSource::ContextEngine if fact.current_confidence < self.config.unverifiable_confidence_floor => {
                ReliabilityClassification::new(
                    Reliability::Unverifiable,
                    format!("low-confidence web context ({}%)", fact.current_confidence),
                )
            }
            FactSource::ContextEngine => {
                ReliabilityClassification::new(Reliability::Estimated, "third-party web context")
            }
        }
    }
}

/// The frontier event's supporting text plus the display value
fn supporting_text(fact: &CurrentFact) -> String {
    let extracted = fact
        .event_history
        .iter()
        .find(|e| e.id == fact.current_event_id)
        .and_then(|e| e.extracted_text.as_deref())
        .unwrap_or_default();
    format!("{} {}", extracted, fact.current_display_value)
}

/// Lowercase with punctuation turned into single spaces, padded
fn normalize(text: &str) -> String {
    let spaced: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '~' || c == '-' { c } else { ' ' })
        .collect();
    format!(" {} ", spaced.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// First keyword present as a whole word or phrase
fn first_match<'a>(normalized: &str, keywords: &'a [String]) -> Option<&'a str> {
    keywords.iter().map(String::as_str).find(|kw| {
        let kw = kw.to_lowercase();
        if kw.chars().any(char::is_alphanumeric) {
            normalized.contains(&format!(" {} ", kw.trim()))
        } else {
            normalized.contains(kw.as_str())
        }
    })
}

/// Latest year named as `FY2027`, `FY27`, `2027E`, `2027F` or `2027P`
fn latest_fiscal_year(normalized: &str) -> Option<i32> {
    normalized
        .split_whitespace()
        .filter_map(|token| {
            if let Some(digits) = token.strip_prefix("fy") {
                match digits.len() {
                    4 => digits.parse().ok(),
                    2 => digits.parse::<i32>().ok().map(|yy| 2000 + yy),
                    _ => None,
                }
            } else if token.len() == 5 && token.ends_with(['e', 'f', 'p']) {
                token[..4].parse().ok()
            } else {
                None
            }
        })
        .max()
}
