//! Filter outcomes and the summary data shown next to them, plus the live
//! filter panel of the customer list.

use crm_core::Customer;
use serde::{Deserialize, Serialize};

use crate::rules::{Operator, Rule, RuleField, RuleSet};

/// One constraint currently narrowing the audience.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveFilter {
    pub field: RuleField,
    pub op: Operator,
    pub value: f64,
    pub label: String,
}

impl From<&Rule> for ActiveFilter {
    fn from(rule: &Rule) -> Self {
        Self {
            field: rule.field,
            op: rule.op.clone(),
            value: rule.value,
            label: rule.label(),
        }
    }
}

/// Outcome of one filter pass. Derived from its inputs and recomputed
/// whenever they change; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterResult {
    pub customers: Vec<Customer>,
    pub count: usize,
    /// Size of the collection the filter ran over.
    pub total: usize,
    pub active_filters: Vec<ActiveFilter>,
}

impl FilterResult {
    pub fn new(customers: Vec<Customer>, total: usize, rule_set: &RuleSet) -> Self {
        Self {
            count: customers.len(),
            customers,
            total,
            active_filters: rule_set.rules.iter().map(ActiveFilter::from).collect(),
        }
    }

    pub fn has_active_filters(&self) -> bool {
        !self.active_filters.is_empty()
    }

    /// Header line for the list, e.g. `3 of 10 customers`.
    pub fn headline(&self) -> String {
        format!("{} of {} customers", self.count, self.total)
    }
}

/// Filter controls of the customer list. Every control maps onto a rule, so
/// the panel filters through the same evaluator as segment previews.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterPanel {
    #[serde(default)]
    pub min_spend: f64,
    #[serde(default)]
    pub max_spend: Option<f64>,
    #[serde(default)]
    pub min_visits: u64,
    #[serde(default)]
    pub active_within_days: Option<f64>,
    #[serde(default)]
    pub inactive_for_days: Option<f64>,
}

impl FilterPanel {
    pub fn is_active(&self) -> bool {
        self.min_spend > 0.0
            || self.max_spend.is_some()
            || self.min_visits > 0
            || self.active_within_days.is_some()
            || self.inactive_for_days.is_some()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Conjunctive rule set for the controls that differ from their
    /// defaults. An untouched panel yields an empty set.
    pub fn to_rule_set(&self) -> RuleSet {
        let mut rules = Vec::new();
        if self.min_spend > 0.0 {
            rules.push(Rule::new(
                RuleField::MinSpend,
                Operator::GreaterThanOrEqual,
                self.min_spend,
            ));
        }
        if let Some(max) = self.max_spend {
            rules.push(Rule::new(RuleField::MaxSpend, Operator::LessThanOrEqual, max));
        }
        if self.min_visits > 0 {
            rules.push(Rule::new(
                RuleField::MinVisits,
                Operator::GreaterThanOrEqual,
                self.min_visits as f64,
            ));
        }
        if let Some(days) = self.active_within_days {
            rules.push(Rule::new(RuleField::InactiveDays, Operator::LessThanOrEqual, days));
        }
        if let Some(days) = self.inactive_for_days {
            rules.push(Rule::new(
                RuleField::InactiveDays,
                Operator::GreaterThanOrEqual,
                days,
            ));
        }
        RuleSet::all(rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RuleEvaluator;
    use crate::rules::Logic;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_default_panel_is_inactive_and_filters_nothing() {
        let panel = FilterPanel::default();
        assert!(!panel.is_active());
        assert!(panel.to_rule_set().is_empty());

        let customers = vec![Customer::default(), Customer::default()];
        let result = RuleEvaluator::new().apply(&customers, &panel.to_rule_set());
        assert_eq!(result.count, 2);
        assert!(!result.has_active_filters());
    }

    #[test]
    fn test_panel_maps_controls_to_rules() {
        let panel = FilterPanel {
            min_spend: 100.0,
            max_spend: Some(5000.0),
            min_visits: 3,
            active_within_days: Some(30.0),
            inactive_for_days: None,
        };
        assert!(panel.is_active());

        let rule_set = panel.to_rule_set();
        assert_eq!(rule_set.logic, Logic::And);
        let labels: Vec<String> = rule_set.rules.iter().map(Rule::label).collect();
        assert_eq!(
            labels,
            vec![
                "Min Spend >= 100",
                "Max Spend <= 5000",
                "Min Visits >= 3",
                "Inactive Days <= 30",
            ]
        );
    }

    #[test]
    fn test_panel_filters_through_evaluator() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let recent = Customer {
            total_spend: Some(200.0),
            visits: Some(4),
            last_active: Some(now - Duration::days(3)),
            ..Default::default()
        };
        let lapsed = Customer {
            last_active: Some(now - Duration::days(90)),
            ..recent.clone()
        };
        let never = Customer {
            last_active: None,
            ..recent.clone()
        };

        let panel = FilterPanel {
            min_spend: 100.0,
            active_within_days: Some(30.0),
            ..Default::default()
        };
        let customers = vec![recent.clone(), lapsed, never];
        let result = RuleEvaluator::at(now).apply(&customers, &panel.to_rule_set());
        assert_eq!(result.customers, vec![recent]);
        assert_eq!(result.headline(), "1 of 3 customers");
    }

    #[test]
    fn test_clear_resets_panel() {
        let mut panel = FilterPanel {
            min_visits: 2,
            inactive_for_days: Some(60.0),
            ..Default::default()
        };
        panel.clear();
        assert_eq!(panel, FilterPanel::default());
    }

    #[test]
    fn test_active_filters_reflect_rule_set() {
        let rule_set = RuleSet::any(vec![Rule::new(
            RuleField::MinSpend,
            Operator::GreaterThan,
            10000.0,
        )]);
        let result = FilterResult::new(Vec::new(), 0, &rule_set);
        assert_eq!(result.active_filters.len(), 1);
        assert_eq!(result.active_filters[0].label, "Min Spend > 10000");
    }
}
