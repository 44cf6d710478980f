//! Transition planning: which records expire, and where they go.

use chrono::{DateTime, Utc};
use tracing::debug;

use basketflow_baskets::{BasketConfig, BasketRegistry, TierMatch, TierResolver};
use basketflow_core::CompanyId;
use basketflow_customers::CustomerRecord;
use basketflow_infra::{CustomerStore, StoreError};

use crate::outcome::{MatchReason, PlanError, PlanOutcome, TransitionPlan};

/// Plans transitions for records whose dwell time in an expiry-eligible
/// dashboard basket has run out.
pub struct TransitionPlanner<'a, S: CustomerStore + ?Sized> {
    store: &'a S,
    registry: &'a BasketRegistry,
    company: CompanyId,
    now: DateTime<Utc>,
}

impl<'a, S: CustomerStore + ?Sized> TransitionPlanner<'a, S> {
    pub fn new(
        store: &'a S,
        registry: &'a BasketRegistry,
        company: CompanyId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            store,
            registry,
            company,
            now,
        }
    }

    /// Select overdue records for one config and resolve a target per record.
    ///
    /// `limit` is the run's remaining record budget; the query never returns
    /// more than that. Storage failures propagate (fatal); per-record
    /// resolution failures become [`PlanOutcome::Unresolvable`].
    pub fn plan_for_config(
        &self,
        config: &BasketConfig,
        limit: Option<usize>,
    ) -> Result<Vec<PlanOutcome>, StoreError> {
        let Some(fail_after_days) = config.fail_after_days.filter(|d| *d > 0) else {
            return Ok(Vec::new());
        };

        let overdue = self.store.find_overdue(
            self.company,
            &config.key,
            fail_after_days,
            self.now,
            limit,
        )?;
        debug!(
            basket = %config.key,
            fail_after_days,
            matched = overdue.len(),
            "planning expired records"
        );

        let resolver = self.registry.resolver();
        Ok(overdue
            .into_iter()
            .map(|record| self.plan_record(config, &resolver, fail_after_days, record))
            .collect())
    }

    /// Resolve the target basket for one overdue record.
    ///
    /// Precedence: seeded fixed fallback, then business-age re-evaluation
    /// (when configured), then the max-distribution override on top.
    fn plan_record(
        &self,
        config: &BasketConfig,
        resolver: &TierResolver<'a>,
        fail_after_days: i64,
        record: CustomerRecord,
    ) -> PlanOutcome {
        let days_since_order = record.days_since_order(self.now);
        let dwell_days = record.dwell_days(self.now).unwrap_or(0);

        let mut target = config.on_fail_basket_key.clone();
        let mut reason = MatchReason::OnFail;

        if config.on_fail_reevaluate {
            // With no distribution tiers configured there is nothing to
            // override with; the seeded fallback stands.
            if let Some(matched) = resolver.resolve(days_since_order) {
                target = Some(matched.config().key.clone());
                reason = match matched {
                    TierMatch::Range(tier) => MatchReason::Reevaluated {
                        min: tier.min_days_since_order.unwrap_or(0),
                        max: tier.max_days_since_order,
                    },
                    TierMatch::Fallback(_) => MatchReason::ReevaluatedFallback,
                };
            }
        }

        if let Some(max_dist) = config.max_distribution_count.filter(|m| *m > 0) {
            if record.distribution_count >= max_dist {
                if let Some(key) = config.on_max_dist_basket_key.clone().or_else(|| target.clone())
                {
                    target = Some(key);
                    reason = MatchReason::MaxDistribution;
                }
            }
        }

        let Some(to_key) = target else {
            return PlanOutcome::Unresolvable {
                customer: record,
                error: PlanError::NoTarget,
            };
        };
        let Some(to_config) = self.registry.get(&to_key) else {
            return PlanOutcome::Unresolvable {
                customer: record,
                error: PlanError::UnknownTarget(to_key),
            };
        };

        PlanOutcome::Planned(TransitionPlan {
            customer: record,
            from_id: config.id,
            from_key: config.key.clone(),
            to_id: to_config.id,
            to_key: to_config.key.clone(),
            to_name: to_config.name.clone(),
            reason,
            fail_after_days,
            dwell_days,
            days_since_order,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use basketflow_baskets::{BasketKey, BasketSurface};
    use basketflow_core::{BasketId, CustomerId};
    use basketflow_infra::InMemoryStore;
    use chrono::Duration;

    fn dashboard(id: i64, key: &str, fail_after: i64) -> BasketConfig {
        BasketConfig {
            id: BasketId::new(id),
            key: BasketKey::from(key),
            name: key.to_string(),
            surface: BasketSurface::Dashboard,
            min_days_since_order: None,
            max_days_since_order: None,
            on_fail_basket_key: None,
            on_fail_reevaluate: false,
            fail_after_days: Some(fail_after),
            max_distribution_count: None,
            on_max_dist_basket_key: None,
            hold_days_before_redistribute: None,
            display_order: 0,
            is_active: true,
        }
    }

    fn tier(id: i64, key: &str, min: i64, max: Option<i64>) -> BasketConfig {
        BasketConfig {
            id: BasketId::new(id),
            key: BasketKey::from(key),
            name: key.to_string(),
            surface: BasketSurface::Distribution,
            min_days_since_order: Some(min),
            max_days_since_order: max,
            on_fail_basket_key: None,
            on_fail_reevaluate: false,
            fail_after_days: None,
            max_distribution_count: None,
            on_max_dist_basket_key: None,
            hold_days_before_redistribute: None,
            display_order: 0,
            is_active: true,
        }
    }

    fn record(id: i64, basket: &str, dwell: i64, since_order: i64, now: DateTime<Utc>) -> CustomerRecord {
        CustomerRecord {
            id: CustomerId::new(id),
            company_id: CompanyId::new(1),
            first_name: format!("c{id}"),
            last_name: String::new(),
            current_basket_key: Some(BasketKey::from(basket)),
            basket_entered_date: Some(now - Duration::days(dwell)),
            distribution_count: 0,
            assigned_to: None,
            hold_until_date: None,
            last_order_date: Some(now - Duration::days(since_order)),
            order_count: 1,
        }
    }

    #[test]
    fn reevaluation_overrides_the_seeded_fallback() {
        let now = Utc::now();
        let mut source = dashboard(1, "month_1", 30);
        source.on_fail_basket_key = Some(BasketKey::from("pool"));
        source.on_fail_reevaluate = true;

        let registry = BasketRegistry::new(vec![
            source.clone(),
            tier(2, "new", 0, Some(59)),
            tier(3, "mid", 60, Some(89)),
            tier(4, "pool", 90, None),
        ])
        .unwrap();

        let store = InMemoryStore::new();
        store.insert_customer(record(10, "month_1", 31, 75, now));

        let planner = TransitionPlanner::new(&store, &registry, CompanyId::new(1), now);
        let outcomes = planner.plan_for_config(&source, None).unwrap();
        assert_eq!(outcomes.len(), 1);
        match &outcomes[0] {
            PlanOutcome::Planned(plan) => {
                assert_eq!(plan.to_key, BasketKey::from("mid"));
                assert_eq!(plan.reason.to_string(), "re-eval(60-89d)");
            }
            other => panic!("expected a plan, got {other:?}"),
        }
    }

    #[test]
    fn reevaluation_without_tiers_keeps_the_seed() {
        let now = Utc::now();
        let mut source = dashboard(1, "month_1", 30);
        source.on_fail_basket_key = Some(BasketKey::from("pool"));
        source.on_fail_reevaluate = true;

        let mut pool = dashboard(2, "pool", 0);
        pool.fail_after_days = None;

        let registry = BasketRegistry::new(vec![source.clone(), pool]).unwrap();
        let store = InMemoryStore::new();
        store.insert_customer(record(10, "month_1", 31, 75, now));

        let planner = TransitionPlanner::new(&store, &registry, CompanyId::new(1), now);
        let outcomes = planner.plan_for_config(&source, None).unwrap();
        match &outcomes[0] {
            PlanOutcome::Planned(plan) => {
                assert_eq!(plan.to_key, BasketKey::from("pool"));
                assert_eq!(plan.reason, MatchReason::OnFail);
            }
            other => panic!("expected a plan, got {other:?}"),
        }
    }

    #[test]
    fn max_distribution_overrides_everything() {
        let now = Utc::now();
        let mut source = dashboard(1, "month_1", 30);
        source.on_fail_basket_key = Some(BasketKey::from("pool"));
        source.on_fail_reevaluate = true;
        source.max_distribution_count = Some(3);
        source.on_max_dist_basket_key = Some(BasketKey::from("archive"));

        let registry = BasketRegistry::new(vec![
            source.clone(),
            tier(2, "mid", 60, Some(89)),
            {
                let mut archive = dashboard(3, "archive", 0);
                archive.fail_after_days = None;
                archive
            },
        ])
        .unwrap();

        let store = InMemoryStore::new();
        let mut exhausted = record(10, "month_1", 31, 75, now);
        exhausted.distribution_count = 3;
        store.insert_customer(exhausted);

        let planner = TransitionPlanner::new(&store, &registry, CompanyId::new(1), now);
        let outcomes = planner.plan_for_config(&source, None).unwrap();
        match &outcomes[0] {
            PlanOutcome::Planned(plan) => {
                assert_eq!(plan.to_key, BasketKey::from("archive"));
                assert_eq!(plan.reason, MatchReason::MaxDistribution);
            }
            other => panic!("expected a plan, got {other:?}"),
        }
    }

    #[test]
    fn max_distribution_without_override_key_keeps_prior_target() {
        let now = Utc::now();
        let mut source = dashboard(1, "month_1", 30);
        source.on_fail_basket_key = Some(BasketKey::from("pool"));
        source.max_distribution_count = Some(2);

        let mut pool = dashboard(2, "pool", 0);
        pool.fail_after_days = None;

        let registry = BasketRegistry::new(vec![source.clone(), pool]).unwrap();
        let store = InMemoryStore::new();
        let mut exhausted = record(10, "month_1", 31, 75, now);
        exhausted.distribution_count = 5;
        store.insert_customer(exhausted);

        let planner = TransitionPlanner::new(&store, &registry, CompanyId::new(1), now);
        let outcomes = planner.plan_for_config(&source, None).unwrap();
        match &outcomes[0] {
            PlanOutcome::Planned(plan) => {
                assert_eq!(plan.to_key, BasketKey::from("pool"));
                assert_eq!(plan.reason, MatchReason::MaxDistribution);
            }
            other => panic!("expected a plan, got {other:?}"),
        }
    }

    #[test]
    fn missing_and_unknown_targets_are_unresolvable_outcomes() {
        let now = Utc::now();
        let no_target = dashboard(1, "dead_end", 30);

        let mut stale_target = dashboard(2, "stale", 30);
        stale_target.on_fail_basket_key = Some(BasketKey::from("renamed_away"));

        let registry = BasketRegistry::new(vec![no_target.clone(), stale_target.clone()]).unwrap();
        let store = InMemoryStore::new();
        store.insert_customer(record(10, "dead_end", 40, 75, now));
        store.insert_customer(record(11, "stale", 40, 75, now));

        let planner = TransitionPlanner::new(&store, &registry, CompanyId::new(1), now);

        let outcomes = planner.plan_for_config(&no_target, None).unwrap();
        assert!(matches!(
            &outcomes[0],
            PlanOutcome::Unresolvable { error: PlanError::NoTarget, .. }
        ));

        let outcomes = planner.plan_for_config(&stale_target, None).unwrap();
        assert!(matches!(
            &outcomes[0],
            PlanOutcome::Unresolvable { error: PlanError::UnknownTarget(_), .. }
        ));
    }
}
