//! Segment builder — fluent API for assembling a segment creation request.

use crm_core::CrmError;
use thiserror::Error;

use crate::rules::{Logic, Operator, RuleDraft, RuleField, RuleSetDraft};
use crate::segment::NewSegment;
use crate::validation::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SegmentError {
    #[error("Segment name is required.")]
    MissingName,

    #[error(transparent)]
    Rules(#[from] ValidationError),
}

impl From<SegmentError> for CrmError {
    fn from(err: SegmentError) -> Self {
        match err {
            SegmentError::Rules(rules) => rules.into(),
            other => CrmError::Segment(other.to_string()),
        }
    }
}

pub struct SegmentBuilder {
    name: String,
    description: Option<String>,
    rules: Vec<RuleDraft>,
    logic: Logic,
    created_by: Option<String>,
}

impl SegmentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            rules: Vec::new(),
            logic: Logic::And,
            created_by: None,
        }
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_or(mut self) -> Self {
        self.logic = Logic::Or;
        self
    }

    pub fn logic(mut self, logic: Logic) -> Self {
        self.logic = logic;
        self
    }

    pub fn rule(mut self, field: RuleField, op: Operator, value: f64) -> Self {
        self.rules
            .push(RuleDraft::new(field.key(), op.symbol(), value));
        self
    }

    /// Adds a rule exactly as entered; it is validated in [`build`](Self::build).
    pub fn draft(mut self, draft: RuleDraft) -> Self {
        self.rules.push(draft);
        self
    }

    /// Takes over the rules and logic of an edited rule set.
    pub fn rules(mut self, draft: RuleSetDraft) -> Self {
        self.rules = draft.rules;
        self.logic = draft.logic;
        self
    }

    /// The acting user, passed in by the caller.
    pub fn created_by(mut self, actor: impl Into<String>) -> Self {
        self.created_by = Some(actor.into());
        self
    }

    pub fn build(self) -> Result<NewSegment, SegmentError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(SegmentError::MissingName);
        }

        let rule_set = RuleSetDraft::new(self.rules, self.logic).validate()?;

        Ok(NewSegment {
            name,
            description: self
                .description
                .map(|d| d.trim().to_string())
                .unwrap_or_default(),
            rules: rule_set.rules,
            logic: rule_set.logic,
            created_by: self.created_by,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_trims_and_coerces() {
        let segment = SegmentBuilder::new("  High value  ")
            .description(" Spent over 10k ")
            .draft(RuleDraft::new("minSpend", ">", "10000"))
            .rule(RuleField::InactiveDays, Operator::LessThan, 30.0)
            .with_or()
            .created_by("user-42")
            .build()
            .unwrap();

        assert_eq!(segment.name, "High value");
        assert_eq!(segment.description, "Spent over 10k");
        assert_eq!(segment.logic, Logic::Or);
        assert_eq!(segment.rules[0].value, 10000.0);

        let body = serde_json::to_value(&segment).unwrap();
        assert_eq!(
            body,
            json!({
                "name": "High value",
                "description": "Spent over 10k",
                "rules": [
                    { "field": "minSpend", "op": ">", "value": 10000.0 },
                    { "field": "inactiveDays", "op": "<", "value": 30.0 }
                ],
                "logic": "OR",
                "createdBy": "user-42"
            })
        );
    }

    #[test]
    fn test_blank_name_rejected() {
        let err = SegmentBuilder::new("   ")
            .rule(RuleField::MinVisits, Operator::GreaterThan, 1.0)
            .build()
            .unwrap_err();
        assert_eq!(err, SegmentError::MissingName);
    }

    #[test]
    fn test_invalid_rules_block_submit() {
        let err = SegmentBuilder::new("Lapsed")
            .draft(RuleDraft::new("inactiveDays", ">", 60))
            .draft(RuleDraft::new("minVisits", ">", ""))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SegmentError::Rules(ValidationError::IncompleteRule { index: 2 })
        );
        assert_eq!(err.to_string(), "Rule 2 is incomplete. Please fill all fields.");
    }

    #[test]
    fn test_segment_requires_a_rule() {
        let err = SegmentBuilder::new("Nobody").build().unwrap_err();
        assert_eq!(err, SegmentError::Rules(ValidationError::EmptyRuleSet));
    }

    #[test]
    fn test_rules_from_edited_draft() {
        let draft = RuleSetDraft::new(vec![RuleDraft::new("maxSpend", "<=", 99)], Logic::Or);
        let segment = SegmentBuilder::new("Budget").rules(draft).build().unwrap();
        assert_eq!(segment.logic, Logic::Or);
        assert_eq!(segment.rule_set().rules.len(), 1);
        assert!(segment.created_by.is_none());
    }
}
