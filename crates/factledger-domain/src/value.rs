//! Typed fact values
//!
//! Values are validated against the taxonomy type of their key when they are
//! ingested, so the rest of the system never handles an untyped blob.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::{DomainError, FactKey, ValueKind};

/// Currency assumed when a structured amount omits one
pub const DEFAULT_CURRENCY: &str = "USD";

/// Value payload of a fact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FactValue {
    /// Plain number (also used for percentages and bare currency figures)
    Number(f64),
    /// Free text or enum label
    Text(String),
    /// Yes/no
    Boolean(bool),
    /// Calendar date
    Date(NaiveDate),
    /// List of strings
    StringArray(Vec<String>),
    /// Monetary amount with explicit currency
    Amount {
        /// Amount in units of `currency`
        amount: f64,
        /// ISO currency code
        currency: String,
    },
}

impl FactValue {
    /// Validate and coerce a raw JSON payload for `key`
    ///
    /// Accepts raw numbers, numeric strings (with `k`/`m`/`bn` suffixes and
    /// formatting characters), and `{amount, currency}` / `{value}` objects
    /// for numeric keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use factledger_domain::{FactKey, FactValue};
    /// use serde_json::json;
    ///
    /// let arr = FactKey::parse("financial.arr").unwrap();
    /// assert_eq!(FactValue::from_json(arr, &json!("$1.2M")).unwrap(), FactValue::Number(1_200_000.0));
    /// assert!(FactValue::from_json(arr, &json!(true)).is_err());
    /// ```
    pub fn from_json(key: FactKey, json: &Json) -> Result<Self, DomainError> {
        let kind = key.kind();
        let invalid = |reason: &str| DomainError::InvalidValue {
            fact_key: key.as_str().to_string(),
            kind,
            reason: reason.to_string(),
        };

        match kind {
            ValueKind::Currency => match json {
                Json::Object(map) => {
                    if let Some(amount) = map.get("amount") {
                        let amount = json_number(amount)
                            .ok_or_else(|| invalid("amount is not numeric"))?;
                        let currency = map
                            .get("currency")
                            .and_then(Json::as_str)
                            .map(|c| c.trim().to_uppercase())
                            .filter(|c| !c.is_empty())
                            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
                        Ok(FactValue::Amount { amount, currency })
                    } else if let Some(inner) = map.get("value") {
                        Self::from_json(key, inner)
                    } else {
                        Err(invalid("object has neither `amount` nor `value`"))
                    }
                }
                other => json_number(other)
                    .map(FactValue::Number)
                    .ok_or_else(|| invalid("not a number")),
            },
            ValueKind::Percentage | ValueKind::Number => {
                let inner = match json {
                    Json::Object(map) => map
                        .get("value")
                        .or_else(|| map.get("amount"))
                        .ok_or_else(|| invalid("object has neither `value` nor `amount`"))?,
                    other => other,
                };
                json_number(inner)
                    .map(FactValue::Number)
                    .ok_or_else(|| invalid("not a number"))
            }
            ValueKind::String | ValueKind::Enum => {
                let text = match json {
                    Json::String(s) => s.trim().to_string(),
                    Json::Number(n) => n.to_string(),
                    Json::Bool(b) => b.to_string(),
                    _ => return Err(invalid("expected text")),
                };
                if text.is_empty() {
                    return Err(invalid("empty text"));
                }
                Ok(FactValue::Text(text))
            }
            ValueKind::Date => json
                .as_str()
                .and_then(parse_date)
                .map(FactValue::Date)
                .ok_or_else(|| invalid("expected YYYY-MM-DD, YYYY-MM or YYYY")),
            ValueKind::Boolean => match json {
                Json::Bool(b) => Ok(FactValue::Boolean(*b)),
                Json::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "yes" | "y" => Ok(FactValue::Boolean(true)),
                    "false" | "no" | "n" => Ok(FactValue::Boolean(false)),
                    _ => Err(invalid("expected yes/no")),
                },
                Json::Number(n) if n.as_f64() == Some(1.0) => Ok(FactValue::Boolean(true)),
                Json::Number(n) if n.as_f64() == Some(0.0) => Ok(FactValue::Boolean(false)),
                _ => Err(invalid("expected a boolean")),
            },
            ValueKind::Array => match json {
                Json::Array(items) => items
                    .iter()
                    .map(|item| match item {
                        Json::String(s) => Ok(s.trim().to_string()),
                        Json::Number(n) => Ok(n.to_string()),
                        Json::Bool(b) => Ok(b.to_string()),
                        _ => Err(invalid("array items must be scalars")),
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(FactValue::StringArray),
                Json::String(s) => Ok(FactValue::StringArray(
                    s.split(',')
                        .map(str::trim)
                        .filter(|part| !part.is_empty())
                        .map(str::to_string)
                        .collect(),
                )),
                _ => Err(invalid("expected a list")),
            },
        }
    }

    /// Whether this value is an acceptable payload for `kind`
    pub fn conforms_to(&self, kind: ValueKind) -> bool {
        match (kind, self) {
            (ValueKind::Currency, FactValue::Number(n)) => n.is_finite(),
            (ValueKind::Currency, FactValue::Amount { amount, .. }) => amount.is_finite(),
            (ValueKind::Percentage | ValueKind::Number, FactValue::Number(n)) => n.is_finite(),
            (ValueKind::String | ValueKind::Enum, FactValue::Text(t)) => !t.trim().is_empty(),
            (ValueKind::Date, FactValue::Date(_)) => true,
            (ValueKind::Boolean, FactValue::Boolean(_)) => true,
            (ValueKind::Array, FactValue::StringArray(_)) => true,
            _ => false,
        }
    }

    /// Coerce to a number for contradiction comparison
    ///
    /// Raw numbers and structured amounts convert directly; text has every
    /// non-numeric character stripped first. Anything else is `None`.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            FactValue::Number(n) => *n,
            FactValue::Amount { amount, .. } => *amount,
            FactValue::Text(t) => strip_to_number(t)?,
            _ => return None,
        };
        n.is_finite().then_some(n)
    }

    /// Short name of the variant
    pub fn type_name(&self) -> &'static str {
        match self {
            FactValue::Number(_) => "number",
            FactValue::Text(_) => "text",
            FactValue::Boolean(_) => "boolean",
            FactValue::Date(_) => "date",
            FactValue::StringArray(_) => "string_array",
            FactValue::Amount { .. } => "amount",
        }
    }

    /// Plain JSON rendering (no type tag) for consumers
    pub fn to_plain_json(&self) -> Json {
        match self {
            FactValue::Number(n) => serde_json::json!(n),
            FactValue::Text(t) => Json::String(t.clone()),
            FactValue::Boolean(b) => Json::Bool(*b),
            FactValue::Date(d) => Json::String(d.format("%Y-%m-%d").to_string()),
            FactValue::StringArray(items) => serde_json::json!(items),
            FactValue::Amount { amount, currency } => {
                serde_json::json!({ "amount": amount, "currency": currency })
            }
        }
    }
}

impl fmt::Display for FactValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            FactValue::Number(n) => write!(f, "{}", n),
            FactValue::Text(t) => f.write_str(t),
            FactValue::Boolean(true) => f.write_str("yes"),
            FactValue::Boolean(false) => f.write_str("no"),
            FactValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            FactValue::StringArray(items) => f.write_str(&items.join(", ")),
            FactValue::Amount { amount, currency } => write!(f, "{} {}", currency, amount),
        }
    }
}

/// Keep digits, `.` and `-`, then parse
fn strip_to_number(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    cleaned.parse::<f64>().ok()
}

/// Numeric text with an optional magnitude suffix (`1.2M`, `$450k`, `3bn`)
fn parse_scaled(text: &str) -> Option<f64> {
    let lowered = text.trim().to_ascii_lowercase();
    let (body, multiplier) = if let Some(rest) = lowered.strip_suffix("bn") {
        (rest, 1e9)
    } else if let Some(rest) = lowered.strip_suffix("mm") {
        (rest, 1e6)
    } else if let Some(rest) = lowered.strip_suffix('b') {
        (rest, 1e9)
    } else if let Some(rest) = lowered.strip_suffix('m') {
        (rest, 1e6)
    } else if let Some(rest) = lowered.strip_suffix('k') {
        (rest, 1e3)
    } else {
        (lowered.as_str(), 1.0)
    };
    strip_to_number(body).map(|n| n * multiplier)
}

fn json_number(json: &Json) -> Option<f64> {
    let n = match json {
        Json::Number(n) => n.as_f64()?,
        Json::String(s) => parse_scaled(s)?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01", text), "%Y-%m-%d"))
        .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01-01", text), "%Y-%m-%d"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(k: &str) -> FactKey {
        FactKey::parse(k).unwrap()
    }

    #[test]
    fn test_currency_coercion() {
        let arr = key("financial.arr");
        assert_eq!(FactValue::from_json(arr, &json!(1_000_000)).unwrap(), FactValue::Number(1_000_000.0));
        assert_eq!(FactValue::from_json(arr, &json!("$450k")).unwrap(), FactValue::Number(450_000.0));
        assert_eq!(FactValue::from_json(arr, &json!("1,200,000")).unwrap(), FactValue::Number(1_200_000.0));
        assert_eq!(
            FactValue::from_json(arr, &json!({"amount": 2_000_000, "currency": "eur"})).unwrap(),
            FactValue::Amount { amount: 2_000_000.0, currency: "EUR".to_string() }
        );
        assert_eq!(
            FactValue::from_json(arr, &json!({"amount": "3m"})).unwrap(),
            FactValue::Amount { amount: 3_000_000.0, currency: "USD".to_string() }
        );
        assert_eq!(FactValue::from_json(arr, &json!({"value": 5})).unwrap(), FactValue::Number(5.0));
        assert!(FactValue::from_json(arr, &json!("unknown")).is_err());
        assert!(FactValue::from_json(arr, &json!([1, 2])).is_err());
    }

    #[test]
    fn test_percentage_coercion() {
        let margin = key("financial.gross_margin");
        assert_eq!(FactValue::from_json(margin, &json!("72%")).unwrap(), FactValue::Number(72.0));
        assert_eq!(FactValue::from_json(margin, &json!({"value": 0.5})).unwrap(), FactValue::Number(0.5));
    }

    #[test]
    fn test_text_date_bool_array() {
        assert_eq!(
            FactValue::from_json(key("team.ceo_name"), &json!("  Ada  ")).unwrap(),
            FactValue::Text("Ada".to_string())
        );
        assert!(FactValue::from_json(key("team.ceo_name"), &json!("")).is_err());

        let founded = key("company.founded_date");
        assert_eq!(
            FactValue::from_json(founded, &json!("2021-03")).unwrap(),
            FactValue::Date(NaiveDate::from_ymd_opt(2021, 3, 1).unwrap())
        );
        assert_eq!(
            FactValue::from_json(founded, &json!("2019")).unwrap(),
            FactValue::Date(NaiveDate::from_ymd_opt(2019, 1, 1).unwrap())
        );
        assert!(FactValue::from_json(founded, &json!("last spring")).is_err());

        assert_eq!(
            FactValue::from_json(key("financial.is_profitable"), &json!("No")).unwrap(),
            FactValue::Boolean(false)
        );

        assert_eq!(
            FactValue::from_json(key("team.founders"), &json!("Ada, Grace,")).unwrap(),
            FactValue::StringArray(vec!["Ada".to_string(), "Grace".to_string()])
        );
        assert!(FactValue::from_json(key("team.founders"), &json!([{"name": "Ada"}])).is_err());
    }

    #[test]
    fn test_conforms_to() {
        assert!(FactValue::Number(1.0).conforms_to(ValueKind::Currency));
        assert!(FactValue::Amount { amount: 1.0, currency: "USD".into() }.conforms_to(ValueKind::Currency));
        assert!(!FactValue::Amount { amount: 1.0, currency: "USD".into() }.conforms_to(ValueKind::Number));
        assert!(!FactValue::Number(f64::NAN).conforms_to(ValueKind::Number));
        assert!(!FactValue::Text("x".into()).conforms_to(ValueKind::Number));
        assert!(FactValue::Text("seed".into()).conforms_to(ValueKind::Enum));
    }

    #[test]
    fn test_as_number() {
        assert_eq!(FactValue::Number(3.0).as_number(), Some(3.0));
        assert_eq!(FactValue::Amount { amount: 7.5, currency: "USD".into() }.as_number(), Some(7.5));
        assert_eq!(FactValue::Text("$1,000".into()).as_number(), Some(1000.0));
        // stripping is literal: magnitude suffixes are not expanded here
        assert_eq!(FactValue::Text("1.2M".into()).as_number(), Some(1.2));
        assert_eq!(FactValue::Text("n/a".into()).as_number(), None);
        assert_eq!(FactValue::Boolean(true).as_number(), None);
    }

    #[test]
    fn test_serde_shape() {
        let v = FactValue::Amount { amount: 10.0, currency: "USD".into() };
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json, json!({"type": "amount", "value": {"amount": 10.0, "currency": "USD"}}));
        let back: FactValue = serde_json::from_value(json).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn test_display() {
        assert_eq!(FactValue::Number(1_000_000.0).to_string(), "1000000");
        assert_eq!(FactValue::Number(0.25).to_string(), "0.25");
        assert_eq!(FactValue::Boolean(true).to_string(), "yes");
        assert_eq!(FactValue::StringArray(vec!["a".into(), "b".into()]).to_string(), "a, b");
    }
}
