//! Audience view: the current customer collection, the rule set applied to
//! it, and the latest result. Changing either input recomputes the result.

use chrono::{DateTime, Utc};
use crm_core::Customer;
use tracing::debug;

use crate::computed::NEVER_ACTIVE_DAYS;
use crate::engine::RuleEvaluator;
use crate::rules::RuleSet;
use crate::summary::FilterResult;

pub type Clock = fn() -> DateTime<Utc>;

pub struct AudienceView {
    customers: Vec<Customer>,
    rule_set: RuleSet,
    result: FilterResult,
    clock: Clock,
    never_active_days: f64,
}

impl AudienceView {
    pub fn new() -> Self {
        Self::with_clock(Utc::now)
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self {
            customers: Vec::new(),
            rule_set: RuleSet::default(),
            result: FilterResult::default(),
            clock,
            never_active_days: NEVER_ACTIVE_DAYS,
        }
    }

    pub fn with_never_active_days(mut self, days: f64) -> Self {
        self.never_active_days = days;
        self.recompute();
        self
    }

    pub fn set_customers(&mut self, customers: Vec<Customer>) -> &FilterResult {
        self.customers = customers;
        self.recompute();
        &self.result
    }

    pub fn set_rule_set(&mut self, rule_set: RuleSet) -> &FilterResult {
        self.rule_set = rule_set;
        self.recompute();
        &self.result
    }

    pub fn clear_rules(&mut self) -> &FilterResult {
        self.set_rule_set(RuleSet::default())
    }

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn rule_set(&self) -> &RuleSet {
        &self.rule_set
    }

    pub fn result(&self) -> &FilterResult {
        &self.result
    }

    fn recompute(&mut self) {
        let evaluator =
            RuleEvaluator::at((self.clock)()).with_never_active_days(self.never_active_days);
        self.result = evaluator.apply(&self.customers, &self.rule_set);
        debug!(
            matched = self.result.count,
            total = self.result.total,
            "Audience view recomputed"
        );
    }
}

impl Default for AudienceView {
    fn default() -> Self {
        Self::new()
    }
}
