//! Per-record planning and apply outcomes.
//!
//! The batch never uses errors for loop control: each record produces an
//! explicit outcome value, and the orchestrator turns those into counters
//! and report lines.

use thiserror::Error;

use basketflow_baskets::BasketKey;
use basketflow_core::BasketId;
use basketflow_customers::CustomerRecord;
use basketflow_infra::StoreError;

/// How a transition target was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchReason {
    /// The source config's fixed `on_fail_basket_key`.
    OnFail,
    /// Business-age re-evaluation landed in a tier's range.
    Reevaluated { min: i64, max: Option<i64> },
    /// Re-evaluation matched nothing; the highest-min tier caught it.
    ReevaluatedFallback,
    /// The record hit the source config's distribution ceiling.
    MaxDistribution,
}

impl core::fmt::Display for MatchReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MatchReason::OnFail => f.write_str("on_fail"),
            MatchReason::Reevaluated { min, max: Some(max) } => {
                write!(f, "re-eval({min}-{max}d)")
            }
            MatchReason::Reevaluated { min, max: None } => write!(f, "re-eval({min}d+)"),
            MatchReason::ReevaluatedFallback => f.write_str("re-eval(fallback)"),
            MatchReason::MaxDistribution => f.write_str("max_dist"),
        }
    }
}

/// A planned redistribution for one record.
#[derive(Debug, Clone)]
pub struct TransitionPlan {
    /// Snapshot of the record as selected, including its prior assignee.
    pub customer: CustomerRecord,
    pub from_id: BasketId,
    pub from_key: BasketKey,
    pub to_id: BasketId,
    pub to_key: BasketKey,
    pub to_name: String,
    pub reason: MatchReason,
    pub fail_after_days: i64,
    pub dwell_days: i64,
    pub days_since_order: i64,
}

impl TransitionPlan {
    /// One-line operator summary.
    pub fn summary_line(&self) -> String {
        format!(
            "- #{} {}: {}d in basket, {}d since order -> {} [{}]",
            self.customer.id,
            self.customer.full_name(),
            self.dwell_days,
            self.days_since_order,
            self.to_name,
            self.reason,
        )
    }
}

/// Why a record could not be planned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("no target basket resolvable")]
    NoTarget,

    #[error("target basket '{0}' not in catalog")]
    UnknownTarget(BasketKey),
}

/// Planner outcome for one selected record.
#[derive(Debug, Clone)]
pub enum PlanOutcome {
    Planned(TransitionPlan),
    /// Counted as an error; the record is left untouched.
    Unresolvable {
        customer: CustomerRecord,
        error: PlanError,
    },
}

/// Applier outcome for one planned transition.
#[derive(Debug)]
pub enum ApplyOutcome {
    /// Committed to storage.
    Transferred(TransitionPlan),
    /// Dry-run: counted, nothing written.
    Simulated(TransitionPlan),
    /// The commit failed; counted as an error, run continues.
    Failed {
        plan: TransitionPlan,
        error: StoreError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_reason_renders_operator_strings() {
        assert_eq!(MatchReason::OnFail.to_string(), "on_fail");
        assert_eq!(
            MatchReason::Reevaluated { min: 60, max: Some(89) }.to_string(),
            "re-eval(60-89d)"
        );
        assert_eq!(
            MatchReason::Reevaluated { min: 365, max: None }.to_string(),
            "re-eval(365d+)"
        );
        assert_eq!(MatchReason::ReevaluatedFallback.to_string(), "re-eval(fallback)");
        assert_eq!(MatchReason::MaxDistribution.to_string(), "max_dist");
    }
}
