//! Storage traits and implementations.

use chrono::{DateTime, Utc};
use thiserror::Error;

use basketflow_baskets::{BasketConfig, BasketKey};
use basketflow_core::{CompanyId, CustomerId};
use basketflow_customers::{
    CustomerRecord, CustomerTransition, InitialAssignment, ReturnLogEntry, TransitionLogEntry,
};

mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use in_memory::InMemoryStore;

/// Storage error.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("storage connection failed: {0}")]
    Connection(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("customer not found: {0}")]
    CustomerNotFound(CustomerId),

    #[error("transaction failed: {0}")]
    Transaction(String),
}

/// Rule catalog access.
pub trait ConfigStore: Send + Sync {
    /// Load every active basket config (global, not company-scoped).
    ///
    /// A failure here is fatal to the run.
    fn load_active(&self) -> Result<Vec<BasketConfig>, StoreError>;
}

/// Customer record queries and atomic transition commits.
pub trait CustomerStore: Send + Sync {
    /// Records in the given basket whose dwell time has reached
    /// `fail_after_days`, scoped to one company, excluding records still
    /// under a redistribution hold. Ordered by customer id; `limit` bounds
    /// the result (the caller passes its remaining run budget).
    fn find_overdue(
        &self,
        company: CompanyId,
        basket_key: &BasketKey,
        fail_after_days: i64,
        now: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<Vec<CustomerRecord>, StoreError>;

    /// Records with no basket key, or a key outside `known_keys` (stale
    /// values from before the catalog was keyed). Ordered by customer id.
    fn find_unbasketed(
        &self,
        company: CompanyId,
        known_keys: &[BasketKey],
        limit: Option<usize>,
    ) -> Result<Vec<CustomerRecord>, StoreError>;

    /// Point lookup.
    fn get(&self, id: CustomerId) -> Result<Option<CustomerRecord>, StoreError>;

    /// Persist one redistribution: the record update plus both audit rows,
    /// in a single transaction. A crash must never leave the record moved
    /// without its audit trail (or vice versa).
    fn commit_transition(
        &self,
        transition: &CustomerTransition,
        transition_log: &TransitionLogEntry,
        return_log: &ReturnLogEntry,
    ) -> Result<(), StoreError>;

    /// Persist one bootstrap assignment plus its transition-log row, in a
    /// single transaction.
    fn commit_assignment(
        &self,
        assignment: &InitialAssignment,
        transition_log: &TransitionLogEntry,
    ) -> Result<(), StoreError>;
}
