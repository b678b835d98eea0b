//! Rule types and comparison logic for segment criteria.

use serde::{Deserialize, Serialize};

/// Customer attribute a rule constrains.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum RuleField {
    MinSpend,
    MaxSpend,
    MinVisits,
    InactiveDays,
}

impl RuleField {
    pub const ALL: [RuleField; 4] = [
        RuleField::MinSpend,
        RuleField::MaxSpend,
        RuleField::MinVisits,
        RuleField::InactiveDays,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            RuleField::MinSpend => "minSpend",
            RuleField::MaxSpend => "maxSpend",
            RuleField::MinVisits => "minVisits",
            RuleField::InactiveDays => "inactiveDays",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RuleField::MinSpend => "Min Spend",
            RuleField::MaxSpend => "Max Spend",
            RuleField::MinVisits => "Min Visits",
            RuleField::InactiveDays => "Inactive Days",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        RuleField::ALL.into_iter().find(|f| f.key() == key.trim())
    }
}

impl std::fmt::Display for RuleField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Numeric comparison operator. Symbols outside the supported set are kept
/// as `Unrecognized` and never match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    Equal,
    Unrecognized(String),
}

impl Operator {
    pub fn parse(symbol: &str) -> Self {
        match symbol.trim() {
            ">" => Operator::GreaterThan,
            "<" => Operator::LessThan,
            ">=" => Operator::GreaterThanOrEqual,
            "<=" => Operator::LessThanOrEqual,
            "==" => Operator::Equal,
            other => Operator::Unrecognized(other.to_string()),
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            Operator::GreaterThan => ">",
            Operator::LessThan => "<",
            Operator::GreaterThanOrEqual => ">=",
            Operator::LessThanOrEqual => "<=",
            Operator::Equal => "==",
            Operator::Unrecognized(symbol) => symbol,
        }
    }

    pub fn compare(&self, actual: f64, expected: f64) -> bool {
        match self {
            Operator::GreaterThan => actual > expected,
            Operator::LessThan => actual < expected,
            Operator::GreaterThanOrEqual => actual >= expected,
            Operator::LessThanOrEqual => actual <= expected,
            Operator::Equal => actual == expected,
            Operator::Unrecognized(_) => false,
        }
    }
}

impl From<String> for Operator {
    fn from(symbol: String) -> Self {
        Operator::parse(&symbol)
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.symbol().to_string()
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// How the rules of a set combine.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Logic {
    #[default]
    And,
    Or,
}

impl std::str::FromStr for Logic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(Logic::And),
            "OR" => Ok(Logic::Or),
            other => Err(format!("unknown rule logic '{other}'")),
        }
    }
}

/// A validated rule. Only produced by validation or by code that already
/// holds a numeric value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub field: RuleField,
    pub op: Operator,
    pub value: f64,
}

impl Rule {
    pub fn new(field: RuleField, op: Operator, value: f64) -> Self {
        Self { field, op, value }
    }

    /// Display form, e.g. `Min Spend > 10000`.
    pub fn label(&self) -> String {
        format!("{} {} {}", self.field.label(), self.op, self.value)
    }
}

/// Ordered rules plus their combination mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub logic: Logic,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>, logic: Logic) -> Self {
        Self { rules, logic }
    }

    pub fn all(rules: Vec<Rule>) -> Self {
        Self::new(rules, Logic::And)
    }

    pub fn any(rules: Vec<Rule>) -> Self {
        Self::new(rules, Logic::Or)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// A rule as it arrives from a form or a JSON file, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleDraft {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub op: Option<String>,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl RuleDraft {
    pub fn new(
        field: impl Into<String>,
        op: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        Self {
            field: Some(field.into()),
            op: Some(op.into()),
            value: value.into(),
        }
    }
}

impl From<&Rule> for RuleDraft {
    fn from(rule: &Rule) -> Self {
        RuleDraft::new(rule.field.key(), rule.op.symbol(), rule.value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSetDraft {
    #[serde(default)]
    pub rules: Vec<RuleDraft>,
    #[serde(default)]
    pub logic: Logic,
}

impl RuleSetDraft {
    pub fn new(rules: Vec<RuleDraft>, logic: Logic) -> Self {
        Self { rules, logic }
    }
}
