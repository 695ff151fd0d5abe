//! Matching and supersession decisions

use std::collections::HashMap;
use std::fmt;

use factledger_domain::{
    ContradictionInfo, CurrentFact, ExtractedFact, FactKey, FactSource, Significance,
};
use serde::{Deserialize, Serialize};

use crate::{MatcherConfig, MatcherError};

/// Decision for one candidate fact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchType {
    /// No current value for the key
    New,
    /// Candidate replaces the current value
    Supersede,
    /// Candidate loses to the current value
    Ignore,
    /// A human must decide
    ReviewNeeded,
}

impl MatchType {
    /// Get the decision name
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::New => "NEW",
            MatchType::Supersede => "SUPERSEDE",
            MatchType::Ignore => "IGNORE",
            MatchType::ReviewNeeded => "REVIEW_NEEDED",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of matching a candidate against the current facts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    /// The decision
    pub match_type: MatchType,
    /// Audit explanation
    pub reason: String,
    /// Current fact the candidate was compared against
    pub existing: Option<CurrentFact>,
}

/// Result of comparing a candidate value with the current value
#[derive(Debug, Clone, PartialEq)]
pub enum ContradictionCheck {
    /// Values agree, or differ by less than the minor threshold
    Consistent,
    /// Values diverge
    Contradiction(ContradictionInfo),
    /// A numeric key where one side cannot be coerced to a number
    Uncomparable {
        /// What could not be coerced
        reason: String,
    },
}

impl ContradictionCheck {
    /// The contradiction, if one was detected
    pub fn contradiction(&self) -> Option<&ContradictionInfo> {
        match self {
            ContradictionCheck::Contradiction(info) => Some(info),
            _ => None,
        }
    }
}

/// A candidate together with its decision
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedFact {
    /// The candidate
    pub candidate: ExtractedFact,
    /// The decision
    pub result: MatchResult,
}

/// A batch of candidates partitioned by decision
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchMatch {
    /// Candidates for keys with no current value
    pub new_facts: Vec<MatchedFact>,
    /// Candidates that replace the current value
    pub to_supersede: Vec<MatchedFact>,
    /// Candidates that lose to the current value
    pub to_ignore: Vec<MatchedFact>,
    /// Candidates held for human review
    pub needs_review: Vec<MatchedFact>,
    /// Every contradiction found, whatever the decision
    pub contradictions: Vec<ContradictionInfo>,
}

impl BatchMatch {
    /// File a decided candidate into its bucket, keeping any contradiction
    pub fn record(&mut self, candidate: ExtractedFact, result: MatchResult, check: ContradictionCheck) {
        if let ContradictionCheck::Contradiction(info) = check {
            self.contradictions.push(info);
        }

        let bucket = match result.match_type {
            MatchType::New => &mut self.new_facts,
            MatchType::Supersede => &mut self.to_supersede,
            MatchType::Ignore => &mut self.to_ignore,
            MatchType::ReviewNeeded => &mut self.needs_review,
        };
        bucket.push(MatchedFact { candidate, result });
    }

    /// Number of candidates matched
    pub fn total(&self) -> usize {
        self.new_facts.len() + self.to_supersede.len() + self.to_ignore.len() + self.needs_review.len()
    }

    /// One-line summary for logs
    pub fn summary(&self) -> String {
        format!(
            "{} candidates: {} new, {} supersede, {} ignore, {} review, {} contradictions",
            self.total(),
            self.new_facts.len(),
            self.to_supersede.len(),
            self.to_ignore.len(),
            self.needs_review.len(),
            self.contradictions.len()
        )
    }
}

/// The matching engine
///
/// Pure: it classifies candidates but never touches the event log. The
/// caller persists whatever it decides.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    config: MatcherConfig,
}

impl Matcher {
    /// Create a matcher, validating the configuration
    pub fn new(config: MatcherConfig) -> Result<Self, MatcherError> {
        config.validate().map_err(MatcherError::Config)?;
        Ok(Self { config })
    }

    /// Get the active configuration
    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Classify a relative delta (`0.2` = 20%)
    ///
    /// `None` below the minor threshold.
    pub fn classify_delta(&self, delta: f64) -> Option<Significance> {
        if delta >= self.config.major_threshold {
            Some(Significance::Major)
        } else if delta >= self.config.significant_threshold {
            Some(Significance::Significant)
        } else if delta >= self.config.minor_threshold {
            Some(Significance::Minor)
        } else {
            None
        }
    }

    /// Compare a candidate with the current fact for its key
    pub fn check(&self, candidate: &ExtractedFact, existing: &CurrentFact) -> ContradictionCheck {
        if candidate.fact_key != existing.fact_key {
            return ContradictionCheck::Consistent;
        }

        if !candidate.fact_key.kind().is_numeric() {
            return if candidate.value == existing.current_value {
                ContradictionCheck::Consistent
            } else {
                ContradictionCheck::Contradiction(self.contradiction(
                    candidate,
                    existing,
                    None,
                    Significance::Minor,
                ))
            };
        }

        let (new, old) = match (candidate.value.as_number(), existing.current_value.as_number()) {
            (Some(new), Some(old)) => (new, old),
            (None, _) => {
                return ContradictionCheck::Uncomparable {
                    reason: format!("candidate value '{}' is not numeric", candidate.value),
                }
            }
            (_, None) => {
                return ContradictionCheck::Uncomparable {
                    reason: format!("current value '{}' is not numeric", existing.current_value),
                }
            }
        };

        let delta = if old == 0.0 {
            if new == 0.0 {
                return ContradictionCheck::Consistent;
            }
            1.0
        } else {
            (new - old).abs() / old.abs()
        };

        match self.classify_delta(delta) {
            Some(significance) => ContradictionCheck::Contradiction(self.contradiction(
                candidate,
                existing,
                Some(delta * 100.0),
                significance,
            )),
            None => ContradictionCheck::Consistent,
        }
    }

    /// The contradiction between a candidate and the current fact, if any
    ///
    /// Uncomparable numeric pairs report no contradiction here; use
    /// [`Matcher::check`] to tell them apart.
    pub fn detect_contradiction(
        &self,
        candidate: &ExtractedFact,
        existing: &CurrentFact,
    ) -> Option<ContradictionInfo> {
        match self.check(candidate, existing) {
            ContradictionCheck::Contradiction(info) => Some(info),
            _ => None,
        }
    }

    /// Decide what to do with one candidate
    ///
    /// # Examples
    ///
    /// ```
    /// use factledger_domain::{ExtractedFact, FactKey, FactSource, FactValue};
    /// use factledger_matcher::{MatchType, Matcher};
    ///
    /// let candidate = ExtractedFact::new(
    ///     FactKey::parse("financial.arr").unwrap(),
    ///     FactValue::Number(1_000_000.0),
    ///     "$1M",
    ///     FactSource::PitchDeck,
    ///     80,
    /// );
    /// let result = Matcher::default().match_fact(&candidate, &[]);
    /// assert_eq!(result.match_type, MatchType::New);
    /// ```
    pub fn match_fact(&self, candidate: &ExtractedFact, current_facts: &[CurrentFact]) -> MatchResult {
        let existing = current_facts
            .iter()
            .find(|fact| fact.fact_key == candidate.fact_key);
        self.decide(candidate, existing).0
    }

    /// Partition a whole extraction batch
    ///
    /// Every candidate is matched against `current_facts` as given; candidates
    /// in the same batch do not see each other.
    pub fn match_facts_batch(
        &self,
        candidates: &[ExtractedFact],
        current_facts: &[CurrentFact],
    ) -> BatchMatch {
        let by_key: HashMap<FactKey, &CurrentFact> = current_facts
            .iter()
            .map(|fact| (fact.fact_key, fact))
            .collect();

        let mut batch = BatchMatch::default();
        for candidate in candidates {
            let existing = by_key.get(&candidate.fact_key).copied();
            let (result, check) = self.decide(candidate, existing);
            batch.record(candidate.clone(), result, check);
        }

        tracing::info!("{}", batch.summary());
        batch
    }

    /// Decide a candidate against one current fact, or none
    ///
    /// Returns the comparison alongside the decision so callers that match
    /// candidates one at a time can still collect contradictions.
    pub fn decide(
        &self,
        candidate: &ExtractedFact,
        existing: Option<&CurrentFact>,
    ) -> (MatchResult, ContradictionCheck) {
        let Some(existing) = existing else {
            tracing::debug!(fact_key = %candidate.fact_key, "NEW: no current value");
            let result = MatchResult {
                match_type: MatchType::New,
                reason: format!("no current value for {}", candidate.fact_key),
                existing: None,
            };
            return (result, ContradictionCheck::Consistent);
        };

        let check = self.check(candidate, existing);
        let bypass = self.config.human_override_bypasses_review
            && candidate.source == FactSource::BaOverride;

        let review_reason = match &check {
            ContradictionCheck::Contradiction(info)
                if info.significance == Significance::Major && !bypass =>
            {
                Some(format!("major contradiction needs review: {}", info))
            }
            ContradictionCheck::Uncomparable { reason } if self.config.review_uncomparable && !bypass => {
                Some(format!("cannot compare {}: {}", candidate.fact_key, reason))
            }
            _ => None,
        };

        let (match_type, reason) = match review_reason {
            Some(reason) => (MatchType::ReviewNeeded, reason),
            None => priority_decision(candidate, existing, &check),
        };

        tracing::debug!(
            fact_key = %candidate.fact_key,
            decision = %match_type,
            reason = %reason,
            "matched candidate"
        );

        let result = MatchResult {
            match_type,
            reason,
            existing: Some(existing.clone()),
        };
        (result, check)
    }

    fn contradiction(
        &self,
        candidate: &ExtractedFact,
        existing: &CurrentFact,
        delta_percent: Option<f64>,
        significance: Significance,
    ) -> ContradictionInfo {
        ContradictionInfo {
            fact_key: candidate.fact_key,
            new_value: candidate.value.clone(),
            existing_value: existing.current_value.clone(),
            new_source: candidate.source,
            existing_source: existing.current_source,
            delta_percent,
            significance,
        }
    }
}

fn priority_decision(
    candidate: &ExtractedFact,
    existing: &CurrentFact,
    check: &ContradictionCheck,
) -> (MatchType, String) {
    let new = candidate.source;
    let old = existing.current_source;

    let (match_type, mut reason) = if new.outranks(old) {
        (
            MatchType::Supersede,
            format!(
                "higher priority source: {} ({}) over {} ({})",
                new,
                new.priority(),
                old,
                old.priority()
            ),
        )
    } else if old.outranks(new) {
        (
            MatchType::Ignore,
            format!(
                "lower priority source: {} ({}) below {} ({})",
                new,
                new.priority(),
                old,
                old.priority()
            ),
        )
    } else {
        let mut reason = format!("same priority source ({}): most recent wins", new.priority());
        if candidate.source_confidence < existing.current_confidence {
            reason.push_str(&format!(
                "; candidate confidence {} below current {}",
                candidate.source_confidence, existing.current_confidence
            ));
        }
        (MatchType::Supersede, reason)
    };

    if let Some(info) = check.contradiction() {
        reason.push_str(&format!(" [{}]", info));
    }
    (match_type, reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use factledger_domain::{DealId, EventId, FactValue};

    fn arr(amount: f64, source: FactSource) -> ExtractedFact {
        ExtractedFact::new(
            FactKey::parse("financial.arr").unwrap(),
            FactValue::Number(amount),
            format!("${}", amount),
            source,
            80,
        )
    }

    fn current(candidate: &ExtractedFact) -> CurrentFact {
        let now = Utc::now();
        CurrentFact {
            deal_id: DealId::from("deal-1"),
            fact_key: candidate.fact_key,
            category: candidate.category,
            current_event_id: EventId::new(),
            current_value: candidate.value.clone(),
            current_display_value: candidate.display_value.clone(),
            unit: None,
            current_source: candidate.source,
            current_confidence: candidate.source_confidence,
            is_disputed: false,
            dispute_details: None,
            event_history: Vec::new(),
            first_seen_at: now,
            last_updated_at: now,
            reliability: None,
        }
    }

    #[test]
    fn test_new_when_no_current_value() {
        let result = Matcher::default().match_fact(&arr(1_000_000.0, FactSource::PitchDeck), &[]);
        assert_eq!(result.match_type, MatchType::New);
        assert!(result.existing.is_none());
    }

    #[test]
    fn test_higher_priority_supersedes_moderate_change() {
        let existing = current(&arr(1_000_000.0, FactSource::PitchDeck));
        let result = Matcher::default()
            .match_fact(&arr(1_200_000.0, FactSource::DataRoom), &[existing.clone()]);
        assert_eq!(result.match_type, MatchType::Supersede);
        assert!(result.reason.contains("higher priority"));
        assert_eq!(result.existing, Some(existing));
    }

    #[test]
    fn test_major_change_needs_review_despite_priority() {
        let existing = current(&arr(1_000_000.0, FactSource::PitchDeck));
        let result =
            Matcher::default().match_fact(&arr(2_000_000.0, FactSource::DataRoom), &[existing]);
        assert_eq!(result.match_type, MatchType::ReviewNeeded);
        assert!(result.reason.contains("MAJOR"));
    }

    #[test]
    fn test_lower_priority_ignored_but_contradiction_recorded() {
        let existing = current(&arr(1_000_000.0, FactSource::DataRoom));
        let candidate = arr(900_000.0, FactSource::ContextEngine);
        let matcher = Matcher::default();

        let result = matcher.match_fact(&candidate, &[existing.clone()]);
        assert_eq!(result.match_type, MatchType::Ignore);

        let batch = matcher.match_facts_batch(&[candidate], &[existing]);
        assert_eq!(batch.to_ignore.len(), 1);
        assert_eq!(batch.contradictions.len(), 1);
        assert_eq!(batch.contradictions[0].significance, Significance::Minor);
    }

    #[test]
    fn test_batch_partitions_into_four_buckets() {
        let arr_existing = current(&arr(1_000_000.0, FactSource::PitchDeck));
        let mrr_existing = current(&ExtractedFact::new(
            FactKey::parse("financial.mrr").unwrap(),
            FactValue::Number(100_000.0),
            "$100k",
            FactSource::DataRoom,
            90,
        ));
        let burn_existing = current(&ExtractedFact::new(
            FactKey::parse("financial.burn_rate").unwrap(),
            FactValue::Number(50_000.0),
            "$50k",
            FactSource::PitchDeck,
            80,
        ));

        let candidates = vec![
            ExtractedFact::new(
                FactKey::parse("team.founder_count").unwrap(),
                FactValue::Number(2.0),
                "2",
                FactSource::PitchDeck,
                90,
            ),
            arr(1_200_000.0, FactSource::DataRoom),
            ExtractedFact::new(
                FactKey::parse("financial.mrr").unwrap(),
                FactValue::Number(101_000.0),
                "$101k",
                FactSource::ContextEngine,
                50,
            ),
            ExtractedFact::new(
                FactKey::parse("financial.burn_rate").unwrap(),
                FactValue::Number(200_000.0),
                "$200k",
                FactSource::FinancialModel,
                90,
            ),
        ];

        let batch = Matcher::default()
            .match_facts_batch(&candidates, &[arr_existing, mrr_existing, burn_existing]);
        assert_eq!(batch.new_facts.len(), 1);
        assert_eq!(batch.to_supersede.len(), 1);
        assert_eq!(batch.to_ignore.len(), 1);
        assert_eq!(batch.needs_review.len(), 1);
        assert_eq!(batch.total(), 4);
        assert_eq!(batch.needs_review[0].candidate.fact_key.as_str(), "financial.burn_rate");
        assert!(batch.summary().starts_with("4 candidates"));
    }

    #[test]
    fn test_equal_priority_supersedes_and_records_confidences() {
        let mut existing_fact = arr(1_000_000.0, FactSource::DataRoom);
        existing_fact.source_confidence = 95;
        let existing = current(&existing_fact);

        let mut candidate = arr(1_020_000.0, FactSource::BaOverride);
        candidate.source_confidence = 70;
        let result = Matcher::default().match_fact(&candidate, &[existing]);
        assert_eq!(result.match_type, MatchType::Supersede);
        assert!(result.reason.contains("70"));
        assert!(result.reason.contains("95"));
    }

    #[test]
    fn test_zero_baseline() {
        let matcher = Matcher::default();
        let zero = current(&arr(0.0, FactSource::PitchDeck));

        assert!(matcher
            .detect_contradiction(&arr(0.0, FactSource::DataRoom), &zero)
            .is_none());

        let info = matcher
            .detect_contradiction(&arr(10.0, FactSource::DataRoom), &zero)
            .unwrap();
        assert_eq!(info.significance, Significance::Major);
        assert_eq!(info.delta_percent, Some(100.0));
    }

    #[test]
    fn test_small_delta_is_not_a_contradiction() {
        let existing = current(&arr(1_000_000.0, FactSource::PitchDeck));
        assert!(Matcher::default()
            .detect_contradiction(&arr(1_040_000.0, FactSource::DataRoom), &existing)
            .is_none());
    }

    #[test]
    fn test_non_numeric_difference_is_minor() {
        let key = FactKey::parse("company.headquarters").unwrap();
        let existing = current(&ExtractedFact::new(
            key,
            FactValue::Text("Berlin".to_string()),
            "Berlin",
            FactSource::PitchDeck,
            80,
        ));
        let moved = ExtractedFact::new(
            key,
            FactValue::Text("Munich".to_string()),
            "Munich",
            FactSource::DataRoom,
            90,
        );
        let matcher = Matcher::default();
        let info = matcher.detect_contradiction(&moved, &existing).unwrap();
        assert_eq!(info.significance, Significance::Minor);
        assert!(info.delta_percent.is_none());

        let same = existing_candidate(&existing);
        assert!(matcher.detect_contradiction(&same, &existing).is_none());
    }

    fn existing_candidate(fact: &CurrentFact) -> ExtractedFact {
        ExtractedFact::new(
            fact.fact_key,
            fact.current_value.clone(),
            fact.current_display_value.clone(),
            fact.current_source,
            fact.current_confidence,
        )
    }

    #[test]
    fn test_mismatched_keys_never_contradict() {
        let existing = current(&arr(1_000_000.0, FactSource::PitchDeck));
        let other = ExtractedFact::new(
            FactKey::parse("financial.mrr").unwrap(),
            FactValue::Number(5.0),
            "5",
            FactSource::DataRoom,
            90,
        );
        assert_eq!(Matcher::default().check(&other, &existing), ContradictionCheck::Consistent);
    }

    #[test]
    fn test_uncomparable_numeric_goes_to_review() {
        let existing = current(&arr(1_000_000.0, FactSource::PitchDeck));
        let mut candidate = arr(0.0, FactSource::DataRoom);
        candidate.value = FactValue::Text("not disclosed".to_string());

        let matcher = Matcher::default();
        assert!(matches!(
            matcher.check(&candidate, &existing),
            ContradictionCheck::Uncomparable { .. }
        ));
        assert!(matcher.detect_contradiction(&candidate, &existing).is_none());
        assert_eq!(
            matcher.match_fact(&candidate, &[existing.clone()]).match_type,
            MatchType::ReviewNeeded
        );

        let permissive = Matcher::new(MatcherConfig {
            review_uncomparable: false,
            ..MatcherConfig::default()
        })
        .unwrap();
        assert_eq!(
            permissive.match_fact(&candidate, &[existing]).match_type,
            MatchType::Supersede
        );
    }

    #[test]
    fn test_text_numbers_are_coerced() {
        let existing = current(&arr(1_000_000.0, FactSource::PitchDeck));
        let mut candidate = arr(0.0, FactSource::DataRoom);
        candidate.value = FactValue::Text("$1,100,000".to_string());
        let info = Matcher::default().detect_contradiction(&candidate, &existing).unwrap();
        assert_eq!(info.significance, Significance::Minor);
    }

    #[test]
    fn test_human_override_bypass_is_opt_in() {
        let existing = current(&arr(1_000_000.0, FactSource::DataRoom));
        let correction = arr(3_000_000.0, FactSource::BaOverride);

        assert_eq!(
            Matcher::default().match_fact(&correction, &[existing.clone()]).match_type,
            MatchType::ReviewNeeded
        );

        let bypass = Matcher::new(MatcherConfig {
            human_override_bypasses_review: true,
            ..MatcherConfig::default()
        })
        .unwrap();
        assert_eq!(
            bypass.match_fact(&correction, &[existing.clone()]).match_type,
            MatchType::Supersede
        );
        // other sources are still gated
        assert_eq!(
            bypass
                .match_fact(&arr(3_000_000.0, FactSource::DataRoom), &[existing])
                .match_type,
            MatchType::ReviewNeeded
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = MatcherConfig {
            major_threshold: 0.01,
            ..MatcherConfig::default()
        };
        assert!(matches!(Matcher::new(config), Err(MatcherError::Config(_))));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use chrono::Utc;
    use factledger_domain::{DealId, EventId, FactValue};
    use proptest::prelude::*;

    fn source_strategy() -> impl Strategy<Value = FactSource> {
        prop::sample::select(FactSource::ALL.to_vec())
    }

    fn candidate(amount: f64, source: FactSource) -> ExtractedFact {
        ExtractedFact::new(
            FactKey::parse("financial.arr").unwrap(),
            FactValue::Number(amount),
            amount.to_string(),
            source,
            80,
        )
    }

    fn current(amount: f64, source: FactSource) -> CurrentFact {
        let now = Utc::now();
        CurrentFact {
            deal_id: DealId::from("deal-1"),
            fact_key: FactKey::parse("financial.arr").unwrap(),
            category: FactKey::parse("financial.arr").unwrap().category(),
            current_event_id: EventId::new(),
            current_value: FactValue::Number(amount),
            current_display_value: amount.to_string(),
            unit: None,
            current_source: source,
            current_confidence: 80,
            is_disputed: false,
            dispute_details: None,
            event_history: Vec::new(),
            first_seen_at: now,
            last_updated_at: now,
            reliability: None,
        }
    }

    proptest! {
        #[test]
        fn prop_priority_invariant(
            a in source_strategy(),
            b in source_strategy(),
            base in 1.0f64..1e9,
            factor in 0.75f64..1.25,
        ) {
            prop_assume!(a.priority() != b.priority());
            let (high, low) = if a.outranks(b) { (a, b) } else { (b, a) };
            let matcher = Matcher::default();

            let up = matcher.match_fact(&candidate(base * factor, high), &[current(base, low)]);
            prop_assert_eq!(up.match_type, MatchType::Supersede);

            let down = matcher.match_fact(&candidate(base * factor, low), &[current(base, high)]);
            prop_assert_eq!(down.match_type, MatchType::Ignore);
        }

        #[test]
        fn prop_tiering_is_monotonic(d1 in 0.0f64..2.0, d2 in 0.0f64..2.0) {
            let matcher = Matcher::default();
            let (lo, hi) = if d1 <= d2 { (d1, d2) } else { (d2, d1) };
            prop_assert!(matcher.classify_delta(lo) <= matcher.classify_delta(hi));
        }

        #[test]
        fn prop_detected_significance_follows_delta(delta in 0.0f64..1.0) {
            let matcher = Matcher::default();
            let existing = current(1_000.0, FactSource::PitchDeck);
            let info = matcher.detect_contradiction(
                &candidate(1_000.0 * (1.0 + delta), FactSource::DataRoom),
                &existing,
            );
            let measured = (1_000.0 * (1.0 + delta) - 1_000.0) / 1_000.0;
            prop_assert_eq!(info.map(|i| i.significance), matcher.classify_delta(measured));
        }
    }
}
