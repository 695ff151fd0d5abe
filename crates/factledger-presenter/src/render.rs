//! Renderings of current facts for downstream consumers
//!
//! Consumers are prompt-driven, so reliability is enforced in the text
//! itself: projected values are labelled as such, unverifiable values are
//! withheld.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use factledger_domain::{CurrentFact, FactCategory, FactKey, FactValue, Reliability};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as Json};

use crate::{PresenterConfig, PresenterError};

/// Legend printed above the prose rendering
pub const RELIABILITY_LEGEND: &str = "Reliability: AUDITED/VERIFIED = independently confirmed; \
DECLARED = stated by the company, not independently verified; \
PROJECTED/ESTIMATED = forward-looking or approximate, not a current fact; \
UNVERIFIABLE = could not be checked";

/// Presentation tier of a fact
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    /// AUDITED or VERIFIED
    Verified,
    /// DECLARED (also missing reliability)
    Declared,
    /// PROJECTED or ESTIMATED
    Projected,
    /// UNVERIFIABLE
    Unverifiable,
}

impl Tier {
    /// Tier for a reliability tag
    pub fn of(reliability: Reliability) -> Self {
        match reliability {
            Reliability::Audited | Reliability::Verified => Tier::Verified,
            Reliability::Declared => Tier::Declared,
            Reliability::Projected | Reliability::Estimated => Tier::Projected,
            Reliability::Unverifiable => Tier::Unverifiable,
        }
    }

    fn heading(&self) -> &'static str {
        match self {
            Tier::Verified => "VERIFIED FACTS (safe to use for scoring)",
            Tier::Declared => "DECLARED FACTS (company-stated, not independently verified)",
            Tier::Projected => "PROJECTIONS AND ESTIMATES (do not use for scoring)",
            Tier::Unverifiable => "UNVERIFIABLE CLAIMS (values withheld)",
        }
    }
}

/// A fact as handed to a consumer, with its value possibly withheld
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentedFact {
    /// Taxonomy key
    pub fact_key: FactKey,
    /// Human label of the key
    pub label: String,
    /// Value, or `None` when withheld
    pub value: Option<FactValue>,
    /// Rendering, or `None` when withheld
    pub display_value: Option<String>,
    /// Reliability the decision was based on
    pub reliability: Reliability,
    /// Explanation shown in place of a withheld value
    pub placeholder: Option<String>,
}

fn reliability_of(fact: &CurrentFact) -> Reliability {
    fact.reliability
        .as_ref()
        .map(|c| c.reliability)
        .unwrap_or_default()
}

fn value_with_unit(fact: &CurrentFact) -> String {
    match &fact.unit {
        Some(unit) if !fact.current_display_value.contains(unit.as_str()) => {
            format!("{} {}", fact.current_display_value, unit)
        }
        _ => fact.current_display_value.clone(),
    }
}

/// Facts grouped by category in taxonomy order, then by key
fn by_category(facts: &[CurrentFact]) -> Vec<(FactCategory, Vec<&CurrentFact>)> {
    FactCategory::ALL
        .iter()
        .filter_map(|category| {
            let mut group: Vec<&CurrentFact> =
                facts.iter().filter(|f| f.category == *category).collect();
            group.sort_by_key(|f| f.fact_key);
            (!group.is_empty()).then_some((*category, group))
        })
        .collect()
}

/// Renders current facts for prompt-driven consumers
#[derive(Debug, Clone, Default)]
pub struct Presenter {
    config: PresenterConfig,
}

impl Presenter {
    /// Create a presenter, validating the configuration
    pub fn new(config: PresenterConfig) -> Result<Self, PresenterError> {
        config.validate().map_err(PresenterError::Config)?;
        Ok(Self { config })
    }

    /// Get the active configuration
    pub fn config(&self) -> &PresenterConfig {
        &self.config
    }

    /// Grouped prose with a reliability legend and per-fact source tags
    ///
    /// ```text
    /// ## Financials
    /// - Annual recurring revenue: $1.2M [DATA_ROOM, 95%, VERIFIED]
    /// ```
    pub fn format_facts_for_prompt(&self, facts: &[CurrentFact]) -> String {
        if facts.is_empty() {
            return "No facts available.".to_string();
        }

        let mut out = String::new();
        let _ = writeln!(out, "{}", RELIABILITY_LEGEND);
        for (category, group) in by_category(facts) {
            let _ = writeln!(out, "\n## {}", category.title());
            for fact in group {
                let _ = write!(
                    out,
                    "- {}: {} [{}, {}%, {}]",
                    fact.fact_key.label(),
                    value_with_unit(fact),
                    fact.current_source,
                    fact.current_confidence,
                    reliability_of(fact)
                );
                if fact.is_disputed {
                    out.push_str(" (DISPUTED)");
                }
                out.push('\n');
            }
        }
        out
    }

    /// Nested JSON keyed by category, then subkey
    pub fn facts_to_json(&self, facts: &[CurrentFact]) -> Json {
        let mut root: BTreeMap<&'static str, Map<String, Json>> = BTreeMap::new();
        for fact in facts {
            root.entry(fact.category.as_str()).or_default().insert(
                fact.fact_key.subkey().to_string(),
                json!({
                    "value": fact.current_value.to_plain_json(),
                    "display": fact.current_display_value,
                    "unit": fact.unit,
                    "source": fact.current_source,
                    "confidence": fact.current_confidence,
                    "reliability": reliability_of(fact),
                    "disputed": fact.is_disputed,
                }),
            );
        }
        Json::Object(
            root.into_iter()
                .map(|(category, keys)| (category.to_string(), Json::Object(keys)))
                .collect(),
        )
    }

    /// Four-tier rendering for scoring agents
    ///
    /// Verified values are stated plainly, declared values carry a caveat,
    /// projections are shown but marked unusable for scoring, and
    /// unverifiable values are withheld entirely.
    pub fn format_facts_for_scoring_agents(&self, facts: &[CurrentFact]) -> String {
        if facts.is_empty() {
            return "No facts available.".to_string();
        }

        let mut tiers: BTreeMap<Tier, Vec<&CurrentFact>> = BTreeMap::new();
        for fact in facts {
            tiers.entry(Tier::of(reliability_of(fact))).or_default().push(fact);
        }

        let mut sections = Vec::new();
        for (tier, mut group) in tiers {
            group.sort_by_key(|f| f.fact_key);
            let mut section = format!("### {}\n", tier.heading());
            for fact in group {
                let label = fact.fact_key.label();
                let value = value_with_unit(fact);
                let line = match tier {
                    Tier::Verified => format!("- {}: {} (source: {})", label, value, fact.current_source),
                    Tier::Declared => format!(
                        "- {}: {} (declared by {}; not independently verified)",
                        label, value, fact.current_source
                    ),
                    Tier::Projected => format!(
                        "- {}: {} [{} - do not use for scoring]",
                        label,
                        value,
                        reliability_of(fact)
                    ),
                    Tier::Unverifiable => {
                        format!("- {}: a value was reported but could not be verified; withheld", label)
                    }
                };
                section.push_str(&line);
                section.push('\n');
            }
            sections.push(section);
        }
        sections.join("\n")
    }

    /// Prose annotated with verification results, capped in size
    ///
    /// Intended for facts that already went through verification. Output
    /// never exceeds `max_annotated_chars`; when facts are cut, the
    /// truncation marker is appended.
    pub fn format_facts_with_validation(&self, facts: &[CurrentFact]) -> String {
        let cap = self.config.max_annotated_chars;
        let marker = &self.config.truncation_marker;
        let budget = cap.saturating_sub(marker.chars().count());

        let mut lines = Vec::new();
        for (category, group) in by_category(facts) {
            lines.push(format!("## {}", category.title()));
            for fact in group {
                lines.push(annotated_line(fact));
            }
        }

        let total: usize = lines.iter().map(|l| l.chars().count() + 1).sum();
        if total <= cap {
            return lines.iter().map(|l| format!("{}\n", l)).collect();
        }

        let mut out = String::new();
        let mut used = 0;
        let mut kept = 0;
        for line in &lines {
            let len = line.chars().count() + 1;
            if used + len > budget {
                break;
            }
            out.push_str(line);
            out.push('\n');
            used += len;
            kept += 1;
        }
        tracing::debug!(kept, total = lines.len(), "annotated facts truncated");
        out.push_str(marker);
        out
    }

    /// Facts at or above the configured reliability floor
    pub fn filter_facts_by_reliability(&self, facts: &[CurrentFact]) -> Vec<CurrentFact> {
        let floor = self.config.min_reliability.weight();
        facts
            .iter()
            .filter(|f| reliability_of(f).weight() >= floor)
            .cloned()
            .collect()
    }

    /// Every fact, with values below the floor replaced by a placeholder
    pub fn replace_unreliable_with_placeholders(&self, facts: &[CurrentFact]) -> Vec<PresentedFact> {
        let floor = self.config.min_reliability;
        facts
            .iter()
            .map(|fact| {
                let reliability = reliability_of(fact);
                let label = fact.fact_key.label().to_string();
                if reliability.weight() >= floor.weight() {
                    PresentedFact {
                        fact_key: fact.fact_key,
                        label,
                        value: Some(fact.current_value.clone()),
                        display_value: Some(fact.current_display_value.clone()),
                        reliability,
                        placeholder: None,
                    }
                } else {
                    PresentedFact {
                        fact_key: fact.fact_key,
                        label,
                        value: None,
                        display_value: None,
                        reliability,
                        placeholder: Some(format!(
                            "[withheld: {} value from {}, below {} reliability]",
                            reliability, fact.current_source, floor
                        )),
                    }
                }
            })
            .collect()
    }
}

fn annotated_line(fact: &CurrentFact) -> String {
    let reliability = reliability_of(fact);
    let value = if reliability == Reliability::Unverifiable {
        "value withheld".to_string()
    } else {
        value_with_unit(fact)
    };
    let mut line = format!(
        "- {}: {} [{}, {}%, {}]",
        fact.fact_key.label(),
        value,
        fact.current_source,
        fact.current_confidence,
        reliability
    );
    if let Some(method) = fact
        .reliability
        .as_ref()
        .and_then(|c| c.verification_method.as_deref())
    {
        let _ = write!(line, " verified via {}", method);
    }
    if let Some(note) = fact
        .reliability
        .as_ref()
        .and_then(|c| c.temporal_analysis.as_deref())
    {
        let _ = write!(line, " ({})", note);
    }
    if let Some(dispute) = &fact.dispute_details {
        let _ = write!(
            line,
            " DISPUTED: {} reported {}",
            dispute.conflicting_source, dispute.conflicting_display_value
        );
        if let Some(reason) = &dispute.reason {
            let _ = write!(line, " ({})", reason);
        }
        if dispute.resolved {
            line.push_str(" [resolved]");
        }
    } else if fact.is_disputed {
        line.push_str(" DISPUTED");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use factledger_domain::{
        DealId, DisputeDetails, EventId, FactSource, ReliabilityClassification,
    };

    fn fact(key: &str, display: &str, source: FactSource, reliability: Option<Reliability>) -> CurrentFact {
        let fact_key = FactKey::parse(key).unwrap();
        CurrentFact {
            deal_id: DealId::from("deal-1"),
            fact_key,
            category: fact_key.category(),
            current_event_id: EventId::new(),
            current_value: FactValue::Text(display.to_string()),
            current_display_value: display.to_string(),
            unit: None,
            current_source: source,
            current_confidence: 90,
            is_disputed: false,
            dispute_details: None,
            event_history: Vec::new(),
            first_seen_at: Utc::now(),
            last_updated_at: Utc::now(),
            reliability: reliability.map(|r| ReliabilityClassification::new(r, "test")),
        }
    }

    fn sample() -> Vec<CurrentFact> {
        vec![
            fact("financial.arr", "$1.2M", FactSource::DataRoom, Some(Reliability::Verified)),
            fact("team.founder_count", "3", FactSource::PitchDeck, None),
            fact("financial.projected_revenue", "$10M", FactSource::PitchDeck, Some(Reliability::Projected)),
            fact("market.tam", "$40B", FactSource::ContextEngine, Some(Reliability::Unverifiable)),
        ]
    }

    #[test]
    fn test_prompt_groups_by_category() {
        let text = Presenter::default().format_facts_for_prompt(&sample());
        assert!(text.starts_with("Reliability:"));
        let financial = text.find("## Financial").unwrap();
        let team = text.find("## Team").unwrap();
        assert!(financial < team);
        assert!(text.contains("$1.2M [DATA_ROOM, 90%, VERIFIED]"));
        // missing reliability is presented as declared
        assert!(text.contains("3 [PITCH_DECK, 90%, DECLARED]"));
    }

    #[test]
    fn test_empty_input() {
        let presenter = Presenter::default();
        assert_eq!(presenter.format_facts_for_prompt(&[]), "No facts available.");
        assert_eq!(presenter.format_facts_for_scoring_agents(&[]), "No facts available.");
        assert_eq!(presenter.facts_to_json(&[]), json!({}));
        assert_eq!(presenter.format_facts_with_validation(&[]), "");
    }

    #[test]
    fn test_json_nested_by_category() {
        let json = Presenter::default().facts_to_json(&sample());
        assert_eq!(json["financial"]["arr"]["display"], "$1.2M");
        assert_eq!(json["financial"]["arr"]["source"], "DATA_ROOM");
        assert_eq!(json["team"]["founder_count"]["reliability"], "DECLARED");
        assert_eq!(json["market"]["tam"]["disputed"], false);
    }

    #[test]
    fn test_scoring_tiers() {
        let text = Presenter::default().format_facts_for_scoring_agents(&sample());
        let verified = text.find("VERIFIED FACTS").unwrap();
        let declared = text.find("DECLARED FACTS").unwrap();
        let projected = text.find("PROJECTIONS AND ESTIMATES").unwrap();
        let unverifiable = text.find("UNVERIFIABLE CLAIMS").unwrap();
        assert!(verified < declared && declared < projected && projected < unverifiable);

        assert!(text.contains("$1.2M (source: DATA_ROOM)"));
        assert!(text.contains("not independently verified"));
        assert!(text.contains("$10M [PROJECTED - do not use for scoring]"));
        assert!(!text.contains("$40B"), "unverifiable values are withheld");
    }

    #[test]
    fn test_empty_tiers_omitted() {
        let facts = vec![fact("financial.arr", "$1M", FactSource::DataRoom, Some(Reliability::Audited))];
        let text = Presenter::default().format_facts_for_scoring_agents(&facts);
        assert!(text.contains("VERIFIED FACTS"));
        assert!(!text.contains("DECLARED FACTS"));
    }

    #[test]
    fn test_validation_annotations() {
        let mut disputed = fact("financial.arr", "$800k", FactSource::PitchDeck, None);
        disputed.is_disputed = true;
        disputed.dispute_details = Some(DisputeDetails {
            conflicting_value: FactValue::Text("$1M".to_string()),
            conflicting_display_value: "$1M".to_string(),
            conflicting_source: FactSource::PitchDeck,
            reason: Some("bank statements".to_string()),
            disputed_at: Utc::now(),
            resolved: false,
        });
        let mut verified = fact("financial.mrr", "$70k", FactSource::DataRoom, None);
        verified.reliability = Some(
            ReliabilityClassification::new(Reliability::Verified, "checked")
                .with_verification_method("bank statement"),
        );

        let text = Presenter::default().format_facts_with_validation(&[disputed, verified]);
        assert!(text.contains("DISPUTED: PITCH_DECK reported $1M (bank statements)"));
        assert!(text.contains("verified via bank statement"));
    }

    #[test]
    fn test_validation_output_is_capped() {
        let facts: Vec<CurrentFact> = FactKey::all()
            .map(|k| fact(k.as_str(), &"x".repeat(200), FactSource::PitchDeck, None))
            .collect();
        let presenter = Presenter::default();
        let text = presenter.format_facts_with_validation(&facts);
        assert!(text.chars().count() <= 8000);
        assert!(text.ends_with(DEFAULT_MARKER_TAIL));
    }

    const DEFAULT_MARKER_TAIL: &str = "further facts omitted ...]";

    #[test]
    fn test_small_output_not_truncated() {
        let text = Presenter::default().format_facts_with_validation(&sample());
        assert!(!text.contains("truncated"));
        assert!(text.contains("$1.2M"));
        assert!(text.contains("$10M"));
    }

    #[test]
    fn test_annotated_output_withholds_unverifiable_values() {
        let text = Presenter::default().format_facts_with_validation(&sample());
        assert!(!text.contains("$40B"));
        let tam = text.lines().find(|l| l.contains(FactKey::parse("market.tam").unwrap().label())).unwrap();
        assert!(tam.contains("value withheld"));
        assert!(tam.contains("UNVERIFIABLE"));
    }

    #[test]
    fn test_filter_by_reliability() {
        let presenter = Presenter::default();
        let kept = presenter.filter_facts_by_reliability(&sample());
        let keys: Vec<&str> = kept.iter().map(|f| f.fact_key.as_str()).collect();
        assert_eq!(keys, vec!["financial.arr", "team.founder_count"]);

        let strict = Presenter::new(PresenterConfig::strict()).unwrap();
        assert_eq!(strict.filter_facts_by_reliability(&sample()).len(), 1);
    }

    #[test]
    fn test_placeholders() {
        let presented = Presenter::default().replace_unreliable_with_placeholders(&sample());
        assert_eq!(presented.len(), 4);
        assert!(presented[0].value.is_some());
        assert!(presented[0].placeholder.is_none());

        let tam = &presented[3];
        assert!(tam.value.is_none());
        assert!(tam.display_value.is_none());
        assert_eq!(tam.reliability, Reliability::Unverifiable);
        assert!(tam.placeholder.as_ref().unwrap().contains("CONTEXT_ENGINE"));
    }
}
