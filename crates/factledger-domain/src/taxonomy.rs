//! Fact key taxonomy
//!
//! Every fact key the ledger accepts is declared here, together with the
//! semantic type of its value and the category it belongs to. A [`FactKey`]
//! can only be obtained by looking a key up in this table, so an event
//! carrying a key outside the taxonomy cannot be constructed.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Semantic type of a fact's value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// Monetary amount
    Currency,
    /// Percentage (0-100 scale)
    Percentage,
    /// Plain number
    Number,
    /// Free text
    String,
    /// Calendar date
    Date,
    /// Yes/no
    Boolean,
    /// List of strings
    Array,
    /// One of a closed set of labels (stored as text)
    Enum,
}

impl ValueKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Currency => "currency",
            ValueKind::Percentage => "percentage",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Date => "date",
            ValueKind::Boolean => "boolean",
            ValueKind::Array => "array",
            ValueKind::Enum => "enum",
        }
    }

    /// Whether contradictions for this kind are measured by relative delta
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ValueKind::Currency | ValueKind::Percentage | ValueKind::Number
        )
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level grouping of fact keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactCategory {
    /// Identity and basic company data
    Company,
    /// Financial metrics
    Financial,
    /// Customer and usage traction
    Traction,
    /// Founders and team
    Team,
    /// Market sizing and positioning
    Market,
    /// Product facts
    Product,
    /// Competitive landscape
    Competition,
    /// Current and past rounds
    Fundraising,
    /// Corporate and legal status
    Legal,
    /// Identified risks
    Risk,
}

impl FactCategory {
    /// All categories in presentation order
    pub const ALL: [FactCategory; 10] = [
        FactCategory::Company,
        FactCategory::Financial,
        FactCategory::Traction,
        FactCategory::Team,
        FactCategory::Market,
        FactCategory::Product,
        FactCategory::Competition,
        FactCategory::Fundraising,
        FactCategory::Legal,
        FactCategory::Risk,
    ];

    /// Get the category name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            FactCategory::Company => "company",
            FactCategory::Financial => "financial",
            FactCategory::Traction => "traction",
            FactCategory::Team => "team",
            FactCategory::Market => "market",
            FactCategory::Product => "product",
            FactCategory::Competition => "competition",
            FactCategory::Fundraising => "fundraising",
            FactCategory::Legal => "legal",
            FactCategory::Risk => "risk",
        }
    }

    /// Heading used when rendering facts for consumers
    pub fn title(&self) -> &'static str {
        match self {
            FactCategory::Company => "Company",
            FactCategory::Financial => "Financials",
            FactCategory::Traction => "Traction",
            FactCategory::Team => "Team",
            FactCategory::Market => "Market",
            FactCategory::Product => "Product",
            FactCategory::Competition => "Competition",
            FactCategory::Fundraising => "Fundraising",
            FactCategory::Legal => "Legal",
            FactCategory::Risk => "Risks",
        }
    }

    /// Parse a category from its name
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
    }
}

impl std::str::FromStr for FactCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| DomainError::UnknownCategory(s.to_string()))
    }
}

impl fmt::Display for FactCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the taxonomy
#[derive(Debug)]
pub struct TaxonomyEntry {
    /// Canonical dotted key
    pub key: &'static str,
    /// Declared value type
    pub kind: ValueKind,
    /// Owning category
    pub category: FactCategory,
    /// Human-readable label
    pub label: &'static str,
}

const fn entry(
    key: &'static str,
    kind: ValueKind,
    category: FactCategory,
    label: &'static str,
) -> TaxonomyEntry {
    TaxonomyEntry {
        key,
        kind,
        category,
        label,
    }
}

use self::FactCategory as C;
use self::ValueKind as K;

/// The fixed fact key taxonomy
pub static TAXONOMY: &[TaxonomyEntry] = &[
    // company
    entry("company.name", K::String, C::Company, "Company name"),
    entry("company.legal_name", K::String, C::Company, "Legal name"),
    entry("company.founded_date", K::Date, C::Company, "Founded"),
    entry("company.headquarters", K::String, C::Company, "Headquarters"),
    entry("company.stage", K::Enum, C::Company, "Stage"),
    entry("company.business_model", K::Enum, C::Company, "Business model"),
    entry("company.website", K::String, C::Company, "Website"),
    entry("company.employee_count", K::Number, C::Company, "Employees"),
    // financial
    entry("financial.arr", K::Currency, C::Financial, "ARR"),
    entry("financial.mrr", K::Currency, C::Financial, "MRR"),
    entry("financial.revenue", K::Currency, C::Financial, "Revenue"),
    entry("financial.revenue_growth_rate", K::Percentage, C::Financial, "Revenue growth"),
    entry("financial.gross_margin", K::Percentage, C::Financial, "Gross margin"),
    entry("financial.ebitda", K::Currency, C::Financial, "EBITDA"),
    entry("financial.net_income", K::Currency, C::Financial, "Net income"),
    entry("financial.burn_rate", K::Currency, C::Financial, "Monthly burn"),
    entry("financial.runway_months", K::Number, C::Financial, "Runway (months)"),
    entry("financial.cash_on_hand", K::Currency, C::Financial, "Cash on hand"),
    entry("financial.cac", K::Currency, C::Financial, "CAC"),
    entry("financial.ltv", K::Currency, C::Financial, "LTV"),
    entry("financial.ltv_cac_ratio", K::Number, C::Financial, "LTV/CAC"),
    entry("financial.payback_period_months", K::Number, C::Financial, "Payback (months)"),
    entry("financial.net_revenue_retention", K::Percentage, C::Financial, "Net revenue retention"),
    entry("financial.projected_revenue", K::Currency, C::Financial, "Projected revenue"),
    entry("financial.fiscal_year_end", K::Date, C::Financial, "Fiscal year end"),
    entry("financial.is_profitable", K::Boolean, C::Financial, "Profitable"),
    // traction
    entry("traction.customer_count", K::Number, C::Traction, "Customers"),
    entry("traction.paying_customers", K::Number, C::Traction, "Paying customers"),
    entry("traction.monthly_active_users", K::Number, C::Traction, "MAU"),
    entry("traction.daily_active_users", K::Number, C::Traction, "DAU"),
    entry("traction.churn_rate", K::Percentage, C::Traction, "Churn"),
    entry("traction.mom_growth", K::Percentage, C::Traction, "MoM growth"),
    entry("traction.gmv", K::Currency, C::Traction, "GMV"),
    entry("traction.pilot_count", K::Number, C::Traction, "Pilots"),
    entry("traction.key_customers", K::Array, C::Traction, "Key customers"),
    entry("traction.logo_retention", K::Percentage, C::Traction, "Logo retention"),
    // team
    entry("team.founder_count", K::Number, C::Team, "Founders"),
    entry("team.founders", K::Array, C::Team, "Founder names"),
    entry("team.ceo_name", K::String, C::Team, "CEO"),
    entry("team.cto_name", K::String, C::Team, "CTO"),
    entry("team.headcount", K::Number, C::Team, "Headcount"),
    entry("team.engineering_headcount", K::Number, C::Team, "Engineers"),
    entry("team.key_hires", K::Array, C::Team, "Key hires"),
    entry("team.has_technical_cofounder", K::Boolean, C::Team, "Technical co-founder"),
    entry("team.prior_exits", K::Number, C::Team, "Prior exits"),
    entry("team.advisors", K::Array, C::Team, "Advisors"),
    // market
    entry("market.tam", K::Currency, C::Market, "TAM"),
    entry("market.sam", K::Currency, C::Market, "SAM"),
    entry("market.som", K::Currency, C::Market, "SOM"),
    entry("market.growth_rate", K::Percentage, C::Market, "Market growth"),
    entry("market.segment", K::String, C::Market, "Segment"),
    entry("market.geography", K::Array, C::Market, "Geographies"),
    entry("market.target_customer", K::String, C::Market, "Target customer"),
    entry("market.timing_thesis", K::String, C::Market, "Why now"),
    // product
    entry("product.description", K::String, C::Product, "Product"),
    entry("product.category", K::Enum, C::Product, "Product category"),
    entry("product.launch_date", K::Date, C::Product, "Launch date"),
    entry("product.pricing_model", K::Enum, C::Product, "Pricing model"),
    entry("product.average_contract_value", K::Currency, C::Product, "ACV"),
    entry("product.patents", K::Number, C::Product, "Patents"),
    entry("product.tech_stack", K::Array, C::Product, "Tech stack"),
    entry("product.is_live", K::Boolean, C::Product, "Live in production"),
    // competition
    entry("competition.competitors", K::Array, C::Competition, "Competitors"),
    entry("competition.differentiation", K::String, C::Competition, "Differentiation"),
    entry("competition.moat", K::String, C::Competition, "Moat"),
    entry("competition.market_share", K::Percentage, C::Competition, "Market share"),
    entry("competition.competitor_count", K::Number, C::Competition, "Competitor count"),
    // fundraising
    entry("fundraising.round_type", K::Enum, C::Fundraising, "Round"),
    entry("fundraising.amount_raising", K::Currency, C::Fundraising, "Raising"),
    entry("fundraising.pre_money_valuation", K::Currency, C::Fundraising, "Pre-money valuation"),
    entry("fundraising.post_money_valuation", K::Currency, C::Fundraising, "Post-money valuation"),
    entry("fundraising.total_raised", K::Currency, C::Fundraising, "Total raised"),
    entry("fundraising.lead_investor", K::String, C::Fundraising, "Lead investor"),
    entry("fundraising.existing_investors", K::Array, C::Fundraising, "Existing investors"),
    entry("fundraising.use_of_funds", K::String, C::Fundraising, "Use of funds"),
    entry("fundraising.close_date", K::Date, C::Fundraising, "Target close"),
    entry("fundraising.instrument", K::Enum, C::Fundraising, "Instrument"),
    // legal
    entry("legal.incorporation_jurisdiction", K::String, C::Legal, "Jurisdiction"),
    entry("legal.entity_type", K::Enum, C::Legal, "Entity type"),
    entry("legal.pending_litigation", K::Boolean, C::Legal, "Pending litigation"),
    entry("legal.ip_assignment_complete", K::Boolean, C::Legal, "IP assigned"),
    entry("legal.regulatory_approvals", K::Array, C::Legal, "Regulatory approvals"),
    // risk
    entry("risk.key_risks", K::Array, C::Risk, "Key risks"),
    entry("risk.customer_concentration", K::Percentage, C::Risk, "Top customer share"),
    entry("risk.regulatory_exposure", K::String, C::Risk, "Regulatory exposure"),
];

/// A fact key validated against the taxonomy
///
/// Cheap to copy; compares and hashes by its dotted key.
#[derive(Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FactKey(&'static TaxonomyEntry);

impl FactKey {
    /// Look up a key in the taxonomy
    ///
    /// # Examples
    ///
    /// ```
    /// use factledger_domain::{FactKey, ValueKind};
    ///
    /// let key = FactKey::parse("financial.arr").unwrap();
    /// assert_eq!(key.kind(), ValueKind::Currency);
    /// assert!(FactKey::parse("financial.vibes").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        TAXONOMY
            .iter()
            .find(|e| e.key == s)
            .map(FactKey)
            .ok_or_else(|| DomainError::UnknownFactKey(s.to_string()))
    }

    /// Iterate over every key in the taxonomy
    pub fn all() -> impl Iterator<Item = FactKey> {
        TAXONOMY.iter().map(FactKey)
    }

    /// Dotted key
    pub fn as_str(&self) -> &'static str {
        self.0.key
    }

    /// Declared value type
    pub fn kind(&self) -> ValueKind {
        self.0.kind
    }

    /// Owning category
    pub fn category(&self) -> FactCategory {
        self.0.category
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        self.0.label
    }

    /// Key without its category prefix (`financial.arr` -> `arr`)
    pub fn subkey(&self) -> &'static str {
        self.0
            .key
            .split_once('.')
            .map(|(_, rest)| rest)
            .unwrap_or(self.0.key)
    }
}

impl PartialEq for FactKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.key == other.0.key
    }
}

impl Eq for FactKey {}

impl Hash for FactKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.key.hash(state);
    }
}

impl PartialOrd for FactKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FactKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.key.cmp(other.0.key)
    }
}

impl fmt::Debug for FactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FactKey({})", self.0.key)
    }
}

impl fmt::Display for FactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.key)
    }
}

impl std::str::FromStr for FactKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FactKey {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<FactKey> for String {
    fn from(key: FactKey) -> Self {
        key.as_str().to_string()
    }
}
