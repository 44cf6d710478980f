//! In-memory store for tests/dev.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use basketflow_baskets::{BasketConfig, BasketKey};
use basketflow_core::{CompanyId, CustomerId};
use basketflow_customers::{
    CustomerRecord, CustomerTransition, InitialAssignment, ReturnLogEntry, TransitionLogEntry,
};

use super::{ConfigStore, CustomerStore, StoreError};

/// In-memory implementation of both store traits.
///
/// Commits hold the customer write lock for the whole mutation, so the
/// record update and its log rows land together, mirroring the transaction
/// a persistent backend runs.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    configs: RwLock<Vec<BasketConfig>>,
    customers: RwLock<HashMap<CustomerId, CustomerRecord>>,
    transition_log: RwLock<Vec<TransitionLogEntry>>,
    return_log: RwLock<Vec<ReturnLogEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_configs(self, configs: Vec<BasketConfig>) -> Self {
        *self.configs.write().unwrap() = configs;
        self
    }

    pub fn insert_customer(&self, record: CustomerRecord) {
        self.customers.write().unwrap().insert(record.id, record);
    }

    /// Snapshot of one record (test inspection).
    pub fn customer(&self, id: CustomerId) -> Option<CustomerRecord> {
        self.customers.read().unwrap().get(&id).cloned()
    }

    /// Snapshot of the transition log (test inspection).
    pub fn transition_log(&self) -> Vec<TransitionLogEntry> {
        self.transition_log.read().unwrap().clone()
    }

    /// Snapshot of the return log (test inspection).
    pub fn return_log(&self) -> Vec<ReturnLogEntry> {
        self.return_log.read().unwrap().clone()
    }
}

impl ConfigStore for InMemoryStore {
    fn load_active(&self) -> Result<Vec<BasketConfig>, StoreError> {
        let configs = self.configs.read().unwrap();
        Ok(configs.iter().filter(|c| c.is_active).cloned().collect())
    }
}

impl CustomerStore for InMemoryStore {
    fn find_overdue(
        &self,
        company: CompanyId,
        basket_key: &BasketKey,
        fail_after_days: i64,
        now: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<Vec<CustomerRecord>, StoreError> {
        let customers = self.customers.read().unwrap();
        let mut matched: Vec<CustomerRecord> = customers
            .values()
            .filter(|r| r.company_id == company)
            .filter(|r| r.current_basket_key.as_ref() == Some(basket_key))
            .filter(|r| r.dwell_days(now).is_some_and(|d| d >= fail_after_days))
            .filter(|r| !r.is_on_hold(now))
            .cloned()
            .collect();
        matched.sort_by_key(|r| r.id);
        if let Some(limit) = limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }

    fn find_unbasketed(
        &self,
        company: CompanyId,
        known_keys: &[BasketKey],
        limit: Option<usize>,
    ) -> Result<Vec<CustomerRecord>, StoreError> {
        let customers = self.customers.read().unwrap();
        let mut matched: Vec<CustomerRecord> = customers
            .values()
            .filter(|r| r.company_id == company)
            .filter(|r| {
                r.current_basket_key
                    .as_ref()
                    .is_none_or(|key| !known_keys.contains(key))
            })
            .cloned()
            .collect();
        matched.sort_by_key(|r| r.id);
        if let Some(limit) = limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }

    fn get(&self, id: CustomerId) -> Result<Option<CustomerRecord>, StoreError> {
        Ok(self.customers.read().unwrap().get(&id).cloned())
    }

    fn commit_transition(
        &self,
        transition: &CustomerTransition,
        transition_log: &TransitionLogEntry,
        return_log: &ReturnLogEntry,
    ) -> Result<(), StoreError> {
        let mut customers = self.customers.write().unwrap();
        let record = customers
            .get_mut(&transition.customer_id)
            .ok_or(StoreError::CustomerNotFound(transition.customer_id))?;
        transition.apply_to(record);
        self.transition_log.write().unwrap().push(transition_log.clone());
        self.return_log.write().unwrap().push(return_log.clone());
        Ok(())
    }

    fn commit_assignment(
        &self,
        assignment: &InitialAssignment,
        transition_log: &TransitionLogEntry,
    ) -> Result<(), StoreError> {
        let mut customers = self.customers.write().unwrap();
        let record = customers
            .get_mut(&assignment.customer_id)
            .ok_or(StoreError::CustomerNotFound(assignment.customer_id))?;
        assignment.apply_to(record);
        self.transition_log.write().unwrap().push(transition_log.clone());
        Ok(())
    }
}
