//! Candidate facts submitted by extraction agents

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::{DomainError, FactCategory, FactKey, FactSource, FactValue, Reliability};

/// A validated candidate fact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedFact {
    /// Taxonomy key
    pub fact_key: FactKey,
    /// Category the producer filed the fact under
    pub category: FactCategory,
    /// Typed value
    pub value: FactValue,
    /// Human-facing rendering
    pub display_value: String,
    /// Optional unit
    pub unit: Option<String>,
    /// Where the value came from
    pub source: FactSource,
    /// Document the value was extracted from
    pub source_document_id: Option<String>,
    /// Extractor confidence, 0-100
    pub source_confidence: u8,
    /// Verbatim supporting text
    pub extracted_text: Option<String>,
    /// Producer's own reliability assessment
    pub reliability: Option<Reliability>,
}

impl ExtractedFact {
    /// Create a candidate with the category taken from the taxonomy
    pub fn new(
        fact_key: FactKey,
        value: FactValue,
        display_value: impl Into<String>,
        source: FactSource,
        source_confidence: u8,
    ) -> Self {
        Self {
            fact_key,
            category: fact_key.category(),
            value,
            display_value: display_value.into(),
            unit: None,
            source,
            source_document_id: None,
            source_confidence,
            extracted_text: None,
            reliability: None,
        }
    }

    /// Attach the supporting text
    pub fn with_extracted_text(mut self, text: impl Into<String>) -> Self {
        self.extracted_text = Some(text.into());
        self
    }

    /// Attach the source document
    pub fn with_document(mut self, document_id: impl Into<String>) -> Self {
        self.source_document_id = Some(document_id.into());
        self
    }

    /// Attach a reliability tag
    pub fn with_reliability(mut self, reliability: Reliability) -> Self {
        self.reliability = Some(reliability);
        self
    }

    /// Check the candidate against the taxonomy
    ///
    /// The category must match the key's declared category, the value must
    /// fit the key's declared type, and the confidence must be within 0-100.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.category != self.fact_key.category() {
            return Err(DomainError::CategoryMismatch {
                fact_key: self.fact_key.to_string(),
                expected: self.fact_key.category().to_string(),
                actual: self.category.to_string(),
            });
        }
        if !self.value.conforms_to(self.fact_key.kind()) {
            return Err(DomainError::InvalidValue {
                fact_key: self.fact_key.to_string(),
                kind: self.fact_key.kind(),
                reason: format!("{} payload does not fit", self.value.type_name()),
            });
        }
        if self.source_confidence > 100 {
            return Err(DomainError::InvalidConfidence(self.source_confidence.into()));
        }
        Ok(())
    }
}

/// Wire form of a candidate, before taxonomy validation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawExtractedFact {
    /// Dotted key as sent by the producer
    pub fact_key: String,
    /// Category name as sent by the producer
    pub category: Option<String>,
    /// Untyped value
    pub value: Json,
    /// Human-facing rendering
    pub display_value: Option<String>,
    /// Optional unit
    pub unit: Option<String>,
    /// Source
    pub source: FactSource,
    /// Document the value was extracted from
    pub source_document_id: Option<String>,
    /// Extractor confidence, 0-100
    pub source_confidence: i64,
    /// Verbatim supporting text
    pub extracted_text: Option<String>,
    /// Producer's reliability tag
    pub reliability: Option<String>,
}

impl TryFrom<RawExtractedFact> for ExtractedFact {
    type Error = DomainError;

    fn try_from(raw: RawExtractedFact) -> Result<Self, Self::Error> {
        let fact_key = FactKey::parse(&raw.fact_key)?;
        let category = match raw.category.as_deref() {
            Some(name) => name.parse::<FactCategory>()?,
            None => fact_key.category(),
        };
        if !(0..=100).contains(&raw.source_confidence) {
            return Err(DomainError::InvalidConfidence(raw.source_confidence));
        }
        let value = FactValue::from_json(fact_key, &raw.value)?;
        let reliability = raw
            .reliability
            .as_deref()
            .map(str::parse::<Reliability>)
            .transpose()?;
        let display_value = raw.display_value.unwrap_or_else(|| value.to_string());

        let fact = ExtractedFact {
            fact_key,
            category,
            value,
            display_value,
            unit: raw.unit,
            source: raw.source,
            source_document_id: raw.source_document_id,
            source_confidence: raw.source_confidence as u8,
            extracted_text: raw.extracted_text,
            reliability,
        };
        fact.validate()?;
        Ok(fact)
    }
}
