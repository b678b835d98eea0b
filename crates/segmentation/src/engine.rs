//! Core rule evaluator: decides customer membership for a single rule or a
//! whole rule set, and filters customer collections.

use chrono::{DateTime, Utc};
use crm_core::config::SegmentationConfig;
use crm_core::Customer;
use tracing::{debug, info, warn};

use crate::computed::{resolve_field, NEVER_ACTIVE_DAYS};
use crate::rules::{Logic, Rule, RuleSet, RuleSetDraft};
use crate::summary::FilterResult;
use crate::validation::{validate_rule_set, ValidationError};

/// Evaluates rules against customers as of a fixed instant, so every rule in
/// one pass sees the same notion of "now".
#[derive(Debug, Clone, Copy)]
pub struct RuleEvaluator {
    now: DateTime<Utc>,
    never_active_days: f64,
}

impl RuleEvaluator {
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            never_active_days: NEVER_ACTIVE_DAYS,
        }
    }

    pub fn from_config(config: &SegmentationConfig) -> Self {
        Self::new().with_never_active_days(config.never_active_days)
    }

    pub fn with_never_active_days(mut self, days: f64) -> Self {
        self.never_active_days = days;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Single-rule membership. Absent customer data fails closed, and so
    /// does a rule whose value is not a finite number.
    pub fn evaluate(&self, customer: &Customer, rule: &Rule) -> bool {
        if !rule.value.is_finite() {
            return false;
        }
        match resolve_field(customer, rule.field, self.now, self.never_active_days) {
            Some(actual) => rule.op.compare(actual, rule.value),
            None => false,
        }
    }

    /// Rule-set membership for one customer. An empty set matches everyone.
    pub fn matches(&self, customer: &Customer, rule_set: &RuleSet) -> bool {
        if rule_set.is_empty() {
            return true;
        }
        match rule_set.logic {
            Logic::And => rule_set.rules.iter().all(|r| self.evaluate(customer, r)),
            Logic::Or => rule_set.rules.iter().any(|r| self.evaluate(customer, r)),
        }
    }

    /// Customers satisfying the rule set, borrowed from the input and in
    /// input order. AND narrows the selection one rule at a time in rule
    /// order; OR keeps a customer when any rule matches.
    pub fn select<'a>(&self, customers: &'a [Customer], rule_set: &RuleSet) -> Vec<&'a Customer> {
        let mut selected: Vec<&Customer> = customers.iter().collect();
        if rule_set.is_empty() {
            return selected;
        }
        if let Err(err) = validate_rule_set(rule_set) {
            warn!(error = %err, "Rule with a non-finite value matches no customer");
        }

        match rule_set.logic {
            Logic::And => {
                for rule in &rule_set.rules {
                    selected.retain(|c| self.evaluate(c, rule));
                }
            }
            Logic::Or => {
                selected.retain(|c| rule_set.rules.iter().any(|r| self.evaluate(c, r)));
            }
        }

        debug!(
            total = customers.len(),
            matched = selected.len(),
            rules = rule_set.rules.len(),
            logic = ?rule_set.logic,
            "Filtered customers"
        );
        selected
    }

    pub fn filter(&self, customers: &[Customer], rule_set: &RuleSet) -> Vec<Customer> {
        self.select(customers, rule_set)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Filters and packages the outcome with its count and active constraints.
    pub fn apply(&self, customers: &[Customer], rule_set: &RuleSet) -> FilterResult {
        FilterResult::new(self.filter(customers, rule_set), customers.len(), rule_set)
    }

    /// Validates the draft, then filters. An invalid draft is reported and
    /// nothing is evaluated.
    pub fn preview(
        &self,
        customers: &[Customer],
        draft: &RuleSetDraft,
    ) -> Result<FilterResult, ValidationError> {
        let rule_set = draft.validate().map_err(|err| {
            warn!(error = %err, "Audience preview rejected");
            err
        })?;

        if customers.is_empty() {
            warn!("No customer data available for preview");
        }

        let result = self.apply(customers, &rule_set);
        info!(
            audience_size = result.count,
            total = result.total,
            "Audience preview computed"
        );
        Ok(result)
    }
}

impl Default for RuleEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-rule membership as of now. Rule values are not validated here; a
/// non-finite value simply matches no one.
pub fn evaluate(customer: &Customer, rule: &Rule) -> bool {
    RuleEvaluator::new().evaluate(customer, rule)
}

/// Stable filter of `customers` as of now.
pub fn filter(customers: &[Customer], rule_set: &RuleSet) -> Vec<Customer> {
    RuleEvaluator::new().filter(customers, rule_set)
}
