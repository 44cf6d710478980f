//! Append-only audit rows.
//!
//! Two independent logs: the transition log records every basket move; the
//! return log records *why* ownership was released back to the pool. A
//! redistribution writes one row to each, atomically with the record update.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use basketflow_baskets::BasketKey;
use basketflow_core::{CustomerId, RepId};

/// Unique audit row identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogEntryId(pub Uuid);

impl LogEntryId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for LogEntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for LogEntryId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// What triggered a basket move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionType {
    /// One-shot initial assignment for records without a usable basket key.
    Bootstrap,
    /// The scheduled dwell-time expiry batch.
    MonthlyCron,
}

impl core::fmt::Display for TransitionType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TransitionType::Bootstrap => f.write_str("bootstrap"),
            TransitionType::MonthlyCron => f.write_str("monthly_cron"),
        }
    }
}

/// One basket move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionLogEntry {
    pub id: LogEntryId,
    pub customer_id: CustomerId,
    pub from_basket_key: Option<BasketKey>,
    pub to_basket_key: BasketKey,
    pub transition_type: TransitionType,
    /// How the target was chosen (e.g. `on_fail`, `re-eval(60-89d)`).
    pub reason: String,
    /// Free-text context (dwell time, business age).
    pub note: String,
    /// The rep who owned the record before the move, if any.
    pub triggered_by: Option<RepId>,
    pub recorded_at: DateTime<Utc>,
}

/// One ownership release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnLogEntry {
    pub id: LogEntryId,
    pub customer_id: CustomerId,
    pub previous_assigned_to: Option<RepId>,
    pub reason: String,
    /// Business-age snapshot at release time.
    pub days_since_last_order: i64,
    pub batch_date: NaiveDate,
    pub recorded_at: DateTime<Utc>,
}
