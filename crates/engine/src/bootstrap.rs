//! One-shot initial basket assignment.
//!
//! Seeds a basket key onto records that have none, or carry a value no
//! longer present in the catalog. Matching walks the dashboard tiers in
//! display order, then the hardcoded day-bucket ladder, then the first
//! dashboard tier as a last resort.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use basketflow_baskets::{ladder, BasketConfig, BasketKey, BasketRegistry};
use basketflow_core::RunId;
use basketflow_customers::{
    CustomerRecord, InitialAssignment, LogEntryId, TransitionLogEntry, TransitionType,
};
use basketflow_infra::{ConfigStore, CustomerStore, StoreError};

use crate::orchestrator::{EngineError, RunOptions};
use crate::report::{BootstrapReport, DRY_RUN_PREVIEW_LIMIT};

/// How a bootstrap target was chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignReason {
    /// A configured dashboard tier's day range contained the business age.
    Tier { min: Option<i64>, max: Option<i64> },
    /// No tier matched; the day-bucket ladder named this key.
    Ladder(BasketKey),
    /// Even the ladder key is not in the catalog; first dashboard tier.
    FirstTier,
}

impl core::fmt::Display for AssignReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AssignReason::Tier { min, max } => {
                let min = min.unwrap_or(0);
                match max {
                    Some(max) => write!(f, "range({min}-{max}d)"),
                    None => write!(f, "range({min}d+)"),
                }
            }
            AssignReason::Ladder(key) => write!(f, "ladder({key})"),
            AssignReason::FirstTier => f.write_str("first_tier"),
        }
    }
}

/// Pick a dashboard basket for a record's business age.
///
/// Range-less tiers (e.g. an upsell queue) never match. The ladder is a
/// separate last-resort policy, not the tier resolver's catch-all.
pub fn choose_target<'r>(
    registry: &'r BasketRegistry,
    days_since_order: i64,
) -> Option<(&'r BasketConfig, AssignReason)> {
    for tier in registry.dashboard_tiers() {
        if !tier.has_day_range() {
            continue;
        }
        if tier.day_range_contains(days_since_order) {
            return Some((
                tier,
                AssignReason::Tier {
                    min: tier.min_days_since_order,
                    max: tier.max_days_since_order,
                },
            ));
        }
    }

    let ladder_key = ladder::fallback_key(days_since_order);
    if let Some(config) = registry.get(&ladder_key) {
        return Some((config, AssignReason::Ladder(ladder_key)));
    }

    registry
        .dashboard_tiers()
        .next()
        .map(|config| (config, AssignReason::FirstTier))
}

/// Runs the bootstrap job for one company.
pub struct BootstrapInitializer<'a, S: ConfigStore + CustomerStore> {
    store: &'a S,
}

impl<'a, S: ConfigStore + CustomerStore> BootstrapInitializer<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn run(&self, opts: &RunOptions) -> Result<BootstrapReport, EngineError> {
        let configs = self.store.load_active().map_err(EngineError::ConfigLoad)?;
        let registry = BasketRegistry::new(configs).map_err(EngineError::InvalidCatalog)?;

        let mut report = BootstrapReport::new(RunId::new(), opts.company, opts.mode, opts.now);

        if registry.dashboard_tiers().next().is_none() {
            info!(company = %opts.company, "no dashboard baskets configured; nothing to do");
            return Ok(report);
        }

        let known_keys = registry.keys();
        let candidates = self
            .store
            .find_unbasketed(opts.company, &known_keys, opts.limit)
            .map_err(EngineError::Storage)?;
        info!(
            company = %opts.company,
            mode = %opts.mode,
            candidates = candidates.len(),
            "starting initial basket assignment"
        );

        let mut preview_left = if opts.mode.is_dry_run() {
            DRY_RUN_PREVIEW_LIMIT
        } else {
            usize::MAX
        };

        for record in candidates {
            report.scanned += 1;
            let days_since_order = record.days_since_order(opts.now);

            let Some((target, reason)) = choose_target(&registry, days_since_order) else {
                warn!(customer = %record.id, "no assignable dashboard basket");
                report.errors += 1;
                report.lines.push(format!(
                    "- #{} {}: ERROR - no assignable basket",
                    record.id,
                    record.full_name()
                ));
                continue;
            };

            let line = format!(
                "- #{} {}: {}d since order -> {} [{}]",
                record.id,
                record.full_name(),
                days_since_order,
                target.name,
                reason
            );

            if opts.mode.is_dry_run() {
                report.assigned += 1;
            } else if let Err(error) = self.assign(&record, target, &reason, days_since_order, opts)
            {
                warn!(customer = %record.id, %error, "assignment failed; continuing");
                report.errors += 1;
                report.lines.push(format!(
                    "- #{} {}: ERROR - {}",
                    record.id,
                    record.full_name(),
                    error
                ));
                continue;
            } else {
                report.assigned += 1;
            }

            if preview_left > 0 {
                preview_left -= 1;
                report.lines.push(line);
            } else {
                report.elided += 1;
            }
        }

        info!(
            scanned = report.scanned,
            assigned = report.assigned,
            errors = report.errors,
            "bootstrap complete"
        );
        Ok(report)
    }

    fn assign(
        &self,
        record: &CustomerRecord,
        target: &BasketConfig,
        reason: &AssignReason,
        days_since_order: i64,
        opts: &RunOptions,
    ) -> Result<(), StoreError> {
        let assignment = InitialAssignment {
            customer_id: record.id,
            to_basket_key: target.key.clone(),
            assigned_at: opts.now,
        };
        let transition_log = TransitionLogEntry {
            id: LogEntryId::new(),
            customer_id: record.id,
            from_basket_key: record.current_basket_key.clone(),
            to_basket_key: target.key.clone(),
            transition_type: TransitionType::Bootstrap,
            reason: reason.to_string(),
            note: format!("{days_since_order}d since last order"),
            triggered_by: None,
            recorded_at: opts.now,
        };
        self.store.commit_assignment(&assignment, &transition_log)
    }
}
