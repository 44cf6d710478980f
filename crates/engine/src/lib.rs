//! `basketflow-engine` — the basket lifecycle batch.
//!
//! One run: load the rule catalog into an immutable [`BasketRegistry`]
//! snapshot, scan each expiry-eligible dashboard basket for records whose
//! dwell time has run out, plan a target basket per record (fixed fallback,
//! business-age re-evaluation, max-distribution override), and commit each
//! transition atomically with its audit rows, or merely tally it under
//! dry-run. Every record is processed in isolation: one bad row is counted
//! and skipped, never allowed to abort the batch.
//!
//! Execution is strictly sequential: audit-log ordering stays deterministic,
//! and each record's update plus its two log inserts must be causally
//! ordered. Concurrent runs against the *same* company are unsafe and must
//! be serialized by the external scheduler.
//!
//! [`BasketRegistry`]: basketflow_baskets::BasketRegistry

pub mod applier;
pub mod bootstrap;
pub mod orchestrator;
pub mod outcome;
pub mod planner;
pub mod report;

pub use applier::{RunMode, TransitionApplier};
pub use bootstrap::{AssignReason, BootstrapInitializer};
pub use orchestrator::{BatchOrchestrator, EngineError, RunOptions};
pub use outcome::{ApplyOutcome, MatchReason, PlanError, PlanOutcome, TransitionPlan};
pub use report::{BootstrapReport, ConfigSection, RunReport, DRY_RUN_PREVIEW_LIMIT};
