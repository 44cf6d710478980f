//! Transition execution: dry-run tallying or atomic commits.

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use basketflow_baskets::BasketRegistry;
use basketflow_customers::{
    CustomerTransition, LogEntryId, ReturnLogEntry, TransitionLogEntry, TransitionType,
};
use basketflow_infra::CustomerStore;

use crate::outcome::{ApplyOutcome, TransitionPlan};

/// Execution mode for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Compute and report, never mutate.
    DryRun,
    /// Commit transitions to storage.
    Live,
}

impl RunMode {
    pub fn is_dry_run(self) -> bool {
        self == RunMode::DryRun
    }
}

impl core::fmt::Display for RunMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RunMode::DryRun => f.write_str("DRY RUN"),
            RunMode::Live => f.write_str("LIVE"),
        }
    }
}

/// Applies planned transitions, one record at a time, each isolated from the
/// others.
pub struct TransitionApplier<'a, S: CustomerStore + ?Sized> {
    store: &'a S,
    registry: &'a BasketRegistry,
    mode: RunMode,
    now: DateTime<Utc>,
}

impl<'a, S: CustomerStore + ?Sized> TransitionApplier<'a, S> {
    pub fn new(
        store: &'a S,
        registry: &'a BasketRegistry,
        mode: RunMode,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            store,
            registry,
            mode,
            now,
        }
    }

    /// Execute one plan.
    ///
    /// Live mode commits the record update and both audit rows in a single
    /// store transaction; any failure is captured in the outcome and the
    /// caller moves on to the next record.
    pub fn apply(&self, plan: TransitionPlan) -> ApplyOutcome {
        if self.mode.is_dry_run() {
            return ApplyOutcome::Simulated(plan);
        }

        // Hold policy comes from the *target* config.
        let hold_until = self
            .registry
            .get(&plan.to_key)
            .and_then(|c| c.hold_days_before_redistribute)
            .filter(|days| *days > 0)
            .map(|days| self.now + Duration::days(days));

        let transition = CustomerTransition {
            customer_id: plan.customer.id,
            to_basket_key: plan.to_key.clone(),
            entered_at: self.now,
            hold_until,
        };

        // This record's own owner, captured before the update clears it.
        let prior_assignee = plan.customer.assigned_to;

        let transition_log = TransitionLogEntry {
            id: LogEntryId::new(),
            customer_id: plan.customer.id,
            from_basket_key: Some(plan.from_key.clone()),
            to_basket_key: plan.to_key.clone(),
            transition_type: TransitionType::MonthlyCron,
            reason: plan.reason.to_string(),
            note: format!(
                "exceeded {}d (dwell {}d), {}d since last order",
                plan.fail_after_days, plan.dwell_days, plan.days_since_order
            ),
            triggered_by: prior_assignee,
            recorded_at: self.now,
        };

        let return_log = ReturnLogEntry {
            id: LogEntryId::new(),
            customer_id: plan.customer.id,
            previous_assigned_to: prior_assignee,
            reason: format!(
                "basket expiry: {}d over the {}d threshold in {}",
                plan.dwell_days - plan.fail_after_days,
                plan.fail_after_days,
                self.registry.display_name(&plan.from_key),
            ),
            days_since_last_order: plan.days_since_order,
            batch_date: self.now.date_naive(),
            recorded_at: self.now,
        };

        match self
            .store
            .commit_transition(&transition, &transition_log, &return_log)
        {
            Ok(()) => {
                info!(
                    customer = %plan.customer.id,
                    from = %plan.from_key,
                    to = %plan.to_key,
                    reason = %plan.reason,
                    "transferred"
                );
                ApplyOutcome::Transferred(plan)
            }
            Err(error) => {
                warn!(
                    customer = %plan.customer.id,
                    from = %plan.from_key,
                    to = %plan.to_key,
                    %error,
                    "transition failed; continuing"
                );
                ApplyOutcome::Failed { plan, error }
            }
        }
    }
}
