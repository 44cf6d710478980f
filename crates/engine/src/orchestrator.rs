//! Batch orchestration: config iteration, counters, report assembly.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};

use basketflow_baskets::BasketRegistry;
use basketflow_core::{CompanyId, DomainError, RunId};
use basketflow_infra::{ConfigStore, CustomerStore, StoreError};

use crate::applier::{RunMode, TransitionApplier};
use crate::outcome::{ApplyOutcome, PlanOutcome};
use crate::planner::TransitionPlanner;
use crate::report::{ConfigSection, RunReport, DRY_RUN_PREVIEW_LIMIT};

/// Fatal run failure. Per-record problems never surface here; they are
/// counted in the report instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("basket catalog load failed: {0}")]
    ConfigLoad(StoreError),

    #[error("basket catalog invalid: {0}")]
    InvalidCatalog(DomainError),

    #[error("storage failure: {0}")]
    Storage(StoreError),
}

/// Invocation parameters for one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub company: CompanyId,
    pub mode: RunMode,
    /// Global processed-record cap, shared across all configs in the run.
    pub limit: Option<usize>,
    pub now: DateTime<Utc>,
}

/// Drives one transfer batch: catalog snapshot, then Planner → Applier per
/// expiry-eligible config, strictly sequentially.
pub struct BatchOrchestrator<'a, S: ConfigStore + CustomerStore> {
    store: &'a S,
}

impl<'a, S: ConfigStore + CustomerStore> BatchOrchestrator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn run(&self, opts: &RunOptions) -> Result<RunReport, EngineError> {
        let configs = self.store.load_active().map_err(EngineError::ConfigLoad)?;
        let registry = BasketRegistry::new(configs).map_err(EngineError::InvalidCatalog)?;

        info!(
            company = %opts.company,
            mode = %opts.mode,
            baskets = registry.len(),
            tiers = registry.distribution_tiers().count(),
            expiring = registry.expiring_dashboard().count(),
            "starting basket transfer run"
        );

        let planner = TransitionPlanner::new(self.store, &registry, opts.company, opts.now);
        let applier = TransitionApplier::new(self.store, &registry, opts.mode, opts.now);

        let mut report = RunReport::new(RunId::new(), opts.company, opts.mode, opts.now);
        let mut remaining = opts.limit;
        let mut preview_left = if opts.mode.is_dry_run() {
            DRY_RUN_PREVIEW_LIMIT
        } else {
            usize::MAX
        };

        for config in registry.expiring_dashboard() {
            if remaining == Some(0) {
                info!("record limit reached; remaining configs skipped");
                break;
            }

            let outcomes = planner
                .plan_for_config(config, remaining)
                .map_err(EngineError::Storage)?;
            if let Some(r) = remaining.as_mut() {
                *r -= outcomes.len();
            }

            let mut section = ConfigSection {
                basket_name: config.name.clone(),
                basket_key: config.key.clone(),
                fail_after_days: config.fail_after_days.unwrap_or(0),
                matched: outcomes.len(),
                lines: Vec::new(),
                elided: 0,
            };

            for outcome in outcomes {
                report.processed += 1;
                match outcome {
                    PlanOutcome::Planned(plan) => match applier.apply(plan) {
                        ApplyOutcome::Transferred(plan) | ApplyOutcome::Simulated(plan) => {
                            report.transferred += 1;
                            if preview_left > 0 {
                                preview_left -= 1;
                                section.lines.push(plan.summary_line());
                            } else {
                                section.elided += 1;
                            }
                        }
                        ApplyOutcome::Failed { plan, error } => {
                            report.errors += 1;
                            section.lines.push(format!(
                                "- #{} {}: ERROR - {}",
                                plan.customer.id,
                                plan.customer.full_name(),
                                error
                            ));
                        }
                    },
                    PlanOutcome::Unresolvable { customer, error } => {
                        warn!(customer = %customer.id, %error, "record skipped");
                        report.errors += 1;
                        section.lines.push(format!(
                            "- #{} {}: ERROR - {}",
                            customer.id,
                            customer.full_name(),
                            error
                        ));
                    }
                }
            }

            report.sections.push(section);
        }

        info!(
            processed = report.processed,
            transferred = report.transferred,
            errors = report.errors,
            "run complete"
        );
        Ok(report)
    }
}
