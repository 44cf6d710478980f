//! End-to-end bootstrap runs against the in-memory store.

use chrono::{DateTime, Duration, Utc};

use basketflow_baskets::{ladder, BasketConfig, BasketKey, BasketSurface};
use basketflow_core::{BasketId, CompanyId, CustomerId, RepId};
use basketflow_customers::{CustomerRecord, TransitionType};
use basketflow_engine::{BootstrapInitializer, RunMode, RunOptions};
use basketflow_infra::InMemoryStore;

fn dashboard(id: i64, key: &str, order: i32, min: Option<i64>, max: Option<i64>) -> BasketConfig {
    BasketConfig {
        id: BasketId::new(id),
        key: BasketKey::from(key),
        name: key.to_string(),
        surface: BasketSurface::Dashboard,
        min_days_since_order: min,
        max_days_since_order: max,
        on_fail_basket_key: None,
        on_fail_reevaluate: false,
        fail_after_days: None,
        max_distribution_count: None,
        on_max_dist_basket_key: None,
        hold_days_before_redistribute: None,
        display_order: order,
        is_active: true,
    }
}

fn customer(id: i64, basket: Option<&str>, days_since_order: i64, now: DateTime<Utc>) -> CustomerRecord {
    CustomerRecord {
        id: CustomerId::new(id),
        company_id: CompanyId::new(1),
        first_name: format!("Customer{id}"),
        last_name: "T".to_string(),
        current_basket_key: basket.map(BasketKey::from),
        basket_entered_date: None,
        distribution_count: 0,
        assigned_to: None,
        hold_until_date: None,
        last_order_date: Some(now - Duration::days(days_since_order)),
        order_count: 1,
    }
}

fn opts(mode: RunMode, now: DateTime<Utc>) -> RunOptions {
    RunOptions {
        company: CompanyId::new(1),
        mode,
        limit: None,
        now,
    }
}

#[test]
fn seeds_null_and_stale_keys_but_leaves_known_keys_alone() {
    let now = Utc::now();
    let store = InMemoryStore::new().with_configs(vec![
        dashboard(1, "fresh", 1, Some(0), Some(179)),
        dashboard(2, "cold", 2, Some(180), None),
    ]);
    store.insert_customer(customer(1, None, 30, now));
    store.insert_customer(customer(2, Some("legacy_key"), 400, now));
    store.insert_customer(customer(3, Some("fresh"), 10, now));

    let report = BootstrapInitializer::new(&store)
        .run(&opts(RunMode::Live, now))
        .unwrap();
    assert_eq!(report.scanned, 2);
    assert_eq!(report.assigned, 2);
    assert_eq!(report.errors, 0);

    assert_eq!(
        store.customer(CustomerId::new(1)).unwrap().current_basket_key,
        Some(BasketKey::from("fresh"))
    );
    assert_eq!(
        store.customer(CustomerId::new(2)).unwrap().current_basket_key,
        Some(BasketKey::from("cold"))
    );
    // Already correctly keyed; not rescanned.
    assert_eq!(
        store.customer(CustomerId::new(3)).unwrap().current_basket_key,
        Some(BasketKey::from("fresh"))
    );

    let transitions = store.transition_log();
    assert_eq!(transitions.len(), 2);
    assert!(transitions
        .iter()
        .all(|t| t.transition_type == TransitionType::Bootstrap));
}

#[test]
fn assignment_does_not_touch_ownership_or_counters() {
    let now = Utc::now();
    let store =
        InMemoryStore::new().with_configs(vec![dashboard(1, "fresh", 1, Some(0), None)]);
    let mut record = customer(10, None, 30, now);
    record.assigned_to = Some(RepId::new(5));
    record.distribution_count = 2;
    store.insert_customer(record);

    BootstrapInitializer::new(&store)
        .run(&opts(RunMode::Live, now))
        .unwrap();

    let seeded = store.customer(CustomerId::new(10)).unwrap();
    assert_eq!(seeded.assigned_to, Some(RepId::new(5)));
    assert_eq!(seeded.distribution_count, 2);
    assert_eq!(seeded.basket_entered_date, Some(now));
}

#[test]
fn an_existing_entry_date_is_preserved() {
    let now = Utc::now();
    let entered = now - Duration::days(12);
    let store =
        InMemoryStore::new().with_configs(vec![dashboard(1, "fresh", 1, Some(0), None)]);
    let mut record = customer(20, Some("stale"), 30, now);
    record.basket_entered_date = Some(entered);
    store.insert_customer(record);

    BootstrapInitializer::new(&store)
        .run(&opts(RunMode::Live, now))
        .unwrap();

    let seeded = store.customer(CustomerId::new(20)).unwrap();
    assert_eq!(seeded.current_basket_key, Some(BasketKey::from("fresh")));
    assert_eq!(seeded.basket_entered_date, Some(entered));
}

#[test]
fn the_ladder_applies_only_when_no_tier_matches() {
    let now = Utc::now();
    let store = InMemoryStore::new().with_configs(vec![
        // Only covers very old records; a 30d record matches nothing.
        dashboard(1, "cold", 1, Some(2000), None),
        dashboard(2, ladder::NEW_CUSTOMER, 2, None, None),
    ]);
    store.insert_customer(customer(30, None, 30, now));
    store.insert_customer(customer(31, None, 2500, now));

    let report = BootstrapInitializer::new(&store)
        .run(&opts(RunMode::Live, now))
        .unwrap();
    assert_eq!(report.assigned, 2);

    // 30d: ladder names new_customer; 2500d: the configured tier matched.
    assert_eq!(
        store.customer(CustomerId::new(30)).unwrap().current_basket_key,
        Some(BasketKey::from(ladder::NEW_CUSTOMER))
    );
    assert_eq!(
        store.customer(CustomerId::new(31)).unwrap().current_basket_key,
        Some(BasketKey::from("cold"))
    );

    let reasons: Vec<String> = store
        .transition_log()
        .iter()
        .map(|t| t.reason.clone())
        .collect();
    assert!(reasons.contains(&format!("ladder({})", ladder::NEW_CUSTOMER)));
    assert!(reasons.contains(&"range(2000d+)".to_string()));
}

#[test]
fn dry_run_counts_but_never_mutates() {
    let now = Utc::now();
    let store =
        InMemoryStore::new().with_configs(vec![dashboard(1, "fresh", 1, Some(0), None)]);
    store.insert_customer(customer(40, None, 30, now));

    let report = BootstrapInitializer::new(&store)
        .run(&opts(RunMode::DryRun, now))
        .unwrap();
    assert_eq!(report.scanned, 1);
    assert_eq!(report.assigned, 1);

    assert_eq!(store.customer(CustomerId::new(40)).unwrap().current_basket_key, None);
    assert!(store.transition_log().is_empty());
}

#[test]
fn no_dashboard_baskets_means_nothing_to_do() {
    let now = Utc::now();
    let store = InMemoryStore::new();
    store.insert_customer(customer(50, None, 30, now));

    let report = BootstrapInitializer::new(&store)
        .run(&opts(RunMode::Live, now))
        .unwrap();
    assert_eq!(report.scanned, 0);
    assert_eq!(report.assigned, 0);
    assert_eq!(store.customer(CustomerId::new(50)).unwrap().current_basket_key, None);
}

#[test]
fn the_limit_caps_how_many_records_are_scanned() {
    let now = Utc::now();
    let store =
        InMemoryStore::new().with_configs(vec![dashboard(1, "fresh", 1, Some(0), None)]);
    for id in 60..65 {
        store.insert_customer(customer(id, None, 30, now));
    }

    let run_opts = RunOptions {
        limit: Some(3),
        ..opts(RunMode::Live, now)
    };
    let report = BootstrapInitializer::new(&store).run(&run_opts).unwrap();
    assert_eq!(report.scanned, 3);
    assert_eq!(report.assigned, 3);
}
