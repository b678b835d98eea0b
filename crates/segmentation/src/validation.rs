//! Rule validation. Runs before every preview and submit so that partial or
//! non-numeric rules never reach the evaluator.

use crm_core::CrmError;
use serde_json::Value;
use thiserror::Error;

use crate::rules::{Operator, Rule, RuleField, RuleSet, RuleSetDraft};

/// Validation failure. Rule indices are 1-based, matching what the user sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Rule {index} is incomplete. Please fill all fields.")]
    IncompleteRule { index: usize },

    #[error("Rule {index} uses unknown field '{field}'.")]
    UnknownField { index: usize, field: String },

    #[error("Rule {index} value must be a valid number.")]
    NonNumericValue { index: usize },

    #[error("At least one rule is required.")]
    EmptyRuleSet,
}

impl ValidationError {
    /// 1-based position of the offending rule, if the error concerns one.
    pub fn index(&self) -> Option<usize> {
        match self {
            ValidationError::IncompleteRule { index }
            | ValidationError::UnknownField { index, .. }
            | ValidationError::NonNumericValue { index } => Some(*index),
            ValidationError::EmptyRuleSet => None,
        }
    }
}

impl From<ValidationError> for CrmError {
    fn from(err: ValidationError) -> Self {
        CrmError::Validation(err.to_string())
    }
}

pub type ValidationResult = Result<(), ValidationError>;

/// Checks a draft without keeping the typed result.
pub fn validate(draft: &RuleSetDraft) -> ValidationResult {
    draft.validate().map(|_| ())
}

/// Checks an already typed rule set, e.g. one assembled in code.
pub fn validate_rule_set(rule_set: &RuleSet) -> ValidationResult {
    if rule_set.rules.is_empty() {
        return Err(ValidationError::EmptyRuleSet);
    }
    match rule_set.rules.iter().position(|r| !r.value.is_finite()) {
        Some(pos) => Err(ValidationError::NonNumericValue { index: pos + 1 }),
        None => Ok(()),
    }
}

impl RuleSetDraft {
    /// Turns the draft into a typed rule set. Each rule is checked for
    /// completeness, then its field, then its value, and the first failure
    /// in rule order is reported.
    pub fn validate(&self) -> Result<RuleSet, ValidationError> {
        if self.rules.is_empty() {
            return Err(ValidationError::EmptyRuleSet);
        }

        let mut rules = Vec::with_capacity(self.rules.len());
        for (pos, draft) in self.rules.iter().enumerate() {
            let index = pos + 1;

            let (field, op) = match (non_blank(&draft.field), non_blank(&draft.op)) {
                (Some(field), Some(op)) if !is_blank(&draft.value) => (field, op),
                _ => return Err(ValidationError::IncompleteRule { index }),
            };

            let field = RuleField::from_key(field).ok_or_else(|| ValidationError::UnknownField {
                index,
                field: field.to_string(),
            })?;

            let value = coerce_number(&draft.value)
                .ok_or(ValidationError::NonNumericValue { index })?;

            rules.push(Rule::new(field, Operator::parse(op), value));
        }

        Ok(RuleSet::new(rules, self.logic))
    }
}

/// Numeric coercion for rule values: numbers as-is, strings trimmed and
/// parsed. Anything that does not land on a finite number is rejected.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}
