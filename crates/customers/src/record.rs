//! Customer record and its mutation value types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use basketflow_baskets::{BasketKey, UNKNOWN_DAYS};
use basketflow_core::{CompanyId, CustomerId, RepId};

/// A customer record as the lifecycle engine sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub id: CustomerId,
    pub company_id: CompanyId,
    pub first_name: String,
    pub last_name: String,
    /// Stable key of the basket the record currently sits in.
    pub current_basket_key: Option<BasketKey>,
    /// Refreshed exactly when `current_basket_key` changes.
    pub basket_entered_date: Option<DateTime<Utc>>,
    /// Monotonically non-decreasing; incremented on every redistribution.
    pub distribution_count: u32,
    /// Owning sales rep; cleared on redistribution.
    pub assigned_to: Option<RepId>,
    pub hold_until_date: Option<DateTime<Utc>>,
    pub last_order_date: Option<DateTime<Utc>>,
    pub order_count: u32,
}

impl CustomerRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Business age: whole days since the last order, or the
    /// [`UNKNOWN_DAYS`] sentinel for records with no order history.
    pub fn days_since_order(&self, now: DateTime<Utc>) -> i64 {
        match self.last_order_date {
            Some(last) => (now - last).num_days(),
            None => UNKNOWN_DAYS,
        }
    }

    /// Whole days spent in the current basket, if the entry date is known.
    pub fn dwell_days(&self, now: DateTime<Utc>) -> Option<i64> {
        self.basket_entered_date.map(|entered| (now - entered).num_days())
    }

    /// Whether a redistribution hold shields this record from re-selection.
    pub fn is_on_hold(&self, now: DateTime<Utc>) -> bool {
        self.hold_until_date.is_some_and(|until| until > now)
    }
}

/// Redistribution mutation: one record moving to a new basket, releasing its
/// owner. Committed atomically with its two audit rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerTransition {
    pub customer_id: CustomerId,
    pub to_basket_key: BasketKey,
    pub entered_at: DateTime<Utc>,
    pub hold_until: Option<DateTime<Utc>>,
}

impl CustomerTransition {
    /// The state change `commit_transition` must persist.
    pub fn apply_to(&self, record: &mut CustomerRecord) {
        record.current_basket_key = Some(self.to_basket_key.clone());
        record.basket_entered_date = Some(self.entered_at);
        record.assigned_to = None;
        record.hold_until_date = self.hold_until;
        record.distribution_count += 1;
    }
}

/// Bootstrap mutation: seeding a basket key onto a record that has none (or
/// carries an unresolvable one). Ownership, distribution count and holds are
/// untouched, and an already-known entry date is preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialAssignment {
    pub customer_id: CustomerId,
    pub to_basket_key: BasketKey,
    pub assigned_at: DateTime<Utc>,
}

impl InitialAssignment {
    /// The state change `commit_assignment` must persist.
    pub fn apply_to(&self, record: &mut CustomerRecord) {
        record.current_basket_key = Some(self.to_basket_key.clone());
        record.basket_entered_date = record.basket_entered_date.or(Some(self.assigned_at));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record() -> CustomerRecord {
        CustomerRecord {
            id: CustomerId::new(1),
            company_id: CompanyId::new(1),
            first_name: "Somchai".to_string(),
            last_name: "Jaidee".to_string(),
            current_basket_key: Some(BasketKey::from("month_1")),
            basket_entered_date: Some(Utc::now() - Duration::days(40)),
            distribution_count: 2,
            assigned_to: Some(RepId::new(9)),
            hold_until_date: None,
            last_order_date: Some(Utc::now() - Duration::days(75)),
            order_count: 3,
        }
    }

    #[test]
    fn business_age_defaults_to_the_unknown_sentinel() {
        let now = Utc::now();
        let mut r = record();
        assert_eq!(r.days_since_order(now), 75);
        r.last_order_date = None;
        assert_eq!(r.days_since_order(now), UNKNOWN_DAYS);
    }

    #[test]
    fn transition_clears_owner_and_bumps_distribution_count() {
        let now = Utc::now();
        let mut r = record();
        let hold = now + Duration::days(7);

        let t = CustomerTransition {
            customer_id: r.id,
            to_basket_key: BasketKey::from("waiting"),
            entered_at: now,
            hold_until: Some(hold),
        };
        t.apply_to(&mut r);

        assert_eq!(r.current_basket_key, Some(BasketKey::from("waiting")));
        assert_eq!(r.basket_entered_date, Some(now));
        assert_eq!(r.assigned_to, None);
        assert_eq!(r.hold_until_date, Some(hold));
        assert_eq!(r.distribution_count, 3);
    }

    #[test]
    fn initial_assignment_preserves_an_existing_entry_date() {
        let now = Utc::now();
        let mut r = record();
        let original_entered = r.basket_entered_date;

        let a = InitialAssignment {
            customer_id: r.id,
            to_basket_key: BasketKey::from("new_customer"),
            assigned_at: now,
        };
        a.apply_to(&mut r);

        assert_eq!(r.current_basket_key, Some(BasketKey::from("new_customer")));
        assert_eq!(r.basket_entered_date, original_entered);
        assert_eq!(r.assigned_to, Some(RepId::new(9)));
        assert_eq!(r.distribution_count, 2);

        r.basket_entered_date = None;
        a.apply_to(&mut r);
        assert_eq!(r.basket_entered_date, Some(now));
    }

    #[test]
    fn hold_shields_until_expiry() {
        let now = Utc::now();
        let mut r = record();
        assert!(!r.is_on_hold(now));
        r.hold_until_date = Some(now + Duration::hours(1));
        assert!(r.is_on_hold(now));
        r.hold_until_date = Some(now - Duration::hours(1));
        assert!(!r.is_on_hold(now));
    }
}
