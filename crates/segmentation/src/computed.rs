//! Derived customer attributes, resolved per rule field at evaluation time.

use chrono::{DateTime, Utc};
use crm_core::Customer;

use crate::rules::RuleField;

pub const MILLIS_PER_DAY: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

/// Inactivity reported for a customer with no `lastActive` timestamp. Large
/// enough that any "inactive for more than N days" rule matches.
pub const NEVER_ACTIVE_DAYS: f64 = 9999.0;

/// Fractional days between `last_active` and `now`, or `never_active_days`
/// when the customer has never been active. Future timestamps yield a
/// negative value.
pub fn inactive_days(
    customer: &Customer,
    now: DateTime<Utc>,
    never_active_days: f64,
) -> f64 {
    match customer.last_active {
        Some(last_active) => days_since(last_active, now),
        None => never_active_days,
    }
}

/// Fractional days from `then` to `now`.
pub fn days_since(then: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - then).num_milliseconds() as f64 / MILLIS_PER_DAY
}

/// The numeric comparand a rule field reads from a customer. `None` means
/// the underlying value is absent; only `inactiveDays` always resolves.
pub fn resolve_field(
    customer: &Customer,
    field: RuleField,
    now: DateTime<Utc>,
    never_active_days: f64,
) -> Option<f64> {
    match field {
        RuleField::MinSpend | RuleField::MaxSpend => customer.total_spend,
        RuleField::MinVisits => customer.visits.map(|v| v as f64),
        RuleField::InactiveDays => Some(inactive_days(customer, now, never_active_days)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_inactive_days_fractional() {
        let customer = Customer {
            last_active: Some(now() - Duration::hours(36)),
            ..Default::default()
        };
        assert_eq!(inactive_days(&customer, now(), NEVER_ACTIVE_DAYS), 1.5);
    }

    #[test]
    fn test_never_active_uses_sentinel() {
        let customer = Customer::default();
        assert_eq!(inactive_days(&customer, now(), NEVER_ACTIVE_DAYS), 9999.0);
        assert_eq!(inactive_days(&customer, now(), 365.0), 365.0);
    }

    #[test]
    fn test_resolve_field_mapping() {
        let customer = Customer {
            total_spend: Some(250.0),
            visits: Some(7),
            ..Default::default()
        };
        assert_eq!(
            resolve_field(&customer, RuleField::MinSpend, now(), NEVER_ACTIVE_DAYS),
            Some(250.0)
        );
        assert_eq!(
            resolve_field(&customer, RuleField::MaxSpend, now(), NEVER_ACTIVE_DAYS),
            Some(250.0)
        );
        assert_eq!(
            resolve_field(&customer, RuleField::MinVisits, now(), NEVER_ACTIVE_DAYS),
            Some(7.0)
        );
        assert_eq!(
            resolve_field(&Customer::default(), RuleField::MinSpend, now(), NEVER_ACTIVE_DAYS),
            None
        );
    }
}
