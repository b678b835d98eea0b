//! Persisted segments as the backend returns them, and the payload used to
//! create one.

use chrono::{DateTime, Utc};
use crm_core::types::{lenient_timestamp, parse_timestamp};
use crm_core::RecordId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::computed::days_since;
use crate::rules::{Logic, Operator, Rule, RuleField, RuleSet};
use crate::summary::FilterPanel;

/// Legacy date keys and the inactivity comparison each one stands for.
const LEGACY_DATE_RULES: [(&str, Operator); 2] = [
    ("lastActiveAfter", Operator::LessThanOrEqual),
    ("lastActiveBefore", Operator::GreaterThanOrEqual),
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    #[serde(default, alias = "_id")]
    pub id: RecordId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Kept raw: older segments store a legacy constraint object here
    /// instead of a rule array.
    #[serde(default)]
    pub rules: serde_json::Value,
    #[serde(default)]
    pub logic: Logic,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_ids: Option<Vec<RecordId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl Segment {
    /// Stored audience size: the explicit count, else the number of member ids.
    pub fn audience_size(&self) -> Option<u64> {
        self.customer_count
            .or_else(|| self.customer_ids.as_ref().map(|ids| ids.len() as u64))
    }

    /// The segment's criteria as a rule set. Rule arrays are read directly.
    /// Legacy constraint objects are read through the filter panel mapping,
    /// with their absolute dates turned into inactivity rules as of `now`.
    /// Returns `None` when the stored rules cannot be interpreted in full.
    pub fn rule_set(&self, now: DateTime<Utc>) -> Option<RuleSet> {
        match &self.rules {
            Value::Array(_) => serde_json::from_value::<Vec<Rule>>(self.rules.clone())
                .ok()
                .map(|rules| RuleSet::new(rules, self.logic)),
            Value::Object(map) => legacy_rule_set(map, now),
            _ => None,
        }
    }
}

/// `lastActiveAfter: D` keeps customers active since D, i.e. inactive for at
/// most `now - D` days; `lastActiveBefore` is the converse.
fn legacy_rule_set(map: &Map<String, Value>, now: DateTime<Utc>) -> Option<RuleSet> {
    let panel: FilterPanel = serde_json::from_value(Value::Object(map.clone())).ok()?;
    let mut rules = panel.to_rule_set().rules;

    for (key, op) in LEGACY_DATE_RULES {
        match map.get(key) {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) if s.trim().is_empty() => {}
            Some(raw) => {
                let since = parse_timestamp(raw)?;
                rules.push(Rule::new(
                    RuleField::InactiveDays,
                    op,
                    days_since(since, now),
                ));
            }
        }
    }
    Some(RuleSet::all(rules))
}

/// Payload for `POST /segments`. Built through
/// [`SegmentBuilder`](crate::builder::SegmentBuilder) so that it only ever
/// carries validated, numeric rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSegment {
    pub name: String,
    pub description: String,
    pub rules: Vec<Rule>,
    pub logic: Logic,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

impl NewSegment {
    pub fn rule_set(&self) -> RuleSet {
        RuleSet::new(self.rules.clone(), self.logic)
    }
}
