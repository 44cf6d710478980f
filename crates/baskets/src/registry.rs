//! Immutable per-run snapshot of the basket catalog.

use std::collections::HashMap;

use basketflow_core::{BasketId, DomainError, DomainResult};

use crate::config::{BasketConfig, BasketKey};
use crate::resolver::TierResolver;

/// The basket catalog as one typed value, constructed once per run and passed
/// by reference into the planner/applier.
///
/// Replaces the ad-hoc key→id, id→key and id→name maps with accessor methods,
/// and precomputes the derived views each phase consumes:
///
/// - distribution tiers (re-evaluation ladder), ascending by `min_days_since_order`;
/// - expiring dashboard configs (dwell-time scanning);
/// - dashboard tiers in display order (bootstrap matching).
#[derive(Debug, Clone)]
pub struct BasketRegistry {
    configs: Vec<BasketConfig>,
    by_key: HashMap<BasketKey, usize>,
    by_id: HashMap<BasketId, usize>,
    distribution_tiers: Vec<usize>,
    expiring_dashboard: Vec<usize>,
    dashboard_tiers: Vec<usize>,
}

impl BasketRegistry {
    /// Build the registry from the loaded catalog.
    ///
    /// Rejects duplicate keys or ids: the key is the stable reference
    /// customer records carry, so a catalog with two rows claiming the same
    /// key cannot be planned against.
    pub fn new(configs: Vec<BasketConfig>) -> DomainResult<Self> {
        let mut by_key = HashMap::with_capacity(configs.len());
        let mut by_id = HashMap::with_capacity(configs.len());

        for (idx, config) in configs.iter().enumerate() {
            if by_key.insert(config.key.clone(), idx).is_some() {
                return Err(DomainError::validation(format!(
                    "duplicate basket key '{}'",
                    config.key
                )));
            }
            if by_id.insert(config.id, idx).is_some() {
                return Err(DomainError::validation(format!(
                    "duplicate basket id {}",
                    config.id
                )));
            }
        }

        let mut distribution_tiers: Vec<usize> = configs
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_distribution_tier())
            .map(|(idx, _)| idx)
            .collect();
        // min_days_since_order is Some for every distribution tier; lowest
        // min first so overlapping ranges resolve by lowest-min precedence.
        distribution_tiers.sort_by_key(|&idx| configs[idx].min_days_since_order);

        let expiring_dashboard: Vec<usize> = configs
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_expiring_dashboard())
            .map(|(idx, _)| idx)
            .collect();

        let mut dashboard_tiers: Vec<usize> = configs
            .iter()
            .enumerate()
            .filter(|(_, c)| c.surface == crate::config::BasketSurface::Dashboard)
            .map(|(idx, _)| idx)
            .collect();
        dashboard_tiers.sort_by_key(|&idx| configs[idx].display_order);

        Ok(Self {
            configs,
            by_key,
            by_id,
            distribution_tiers,
            expiring_dashboard,
            dashboard_tiers,
        })
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// Look up a config by its stable key.
    pub fn get(&self, key: &BasketKey) -> Option<&BasketConfig> {
        self.by_key.get(key).map(|&idx| &self.configs[idx])
    }

    /// Look up a config by row id.
    pub fn by_id(&self, id: BasketId) -> Option<&BasketConfig> {
        self.by_id.get(&id).map(|&idx| &self.configs[idx])
    }

    /// Whether a key refers to a registered basket.
    pub fn contains(&self, key: &BasketKey) -> bool {
        self.by_key.contains_key(key)
    }

    /// Every registered key (for storage-side membership filters).
    pub fn keys(&self) -> Vec<BasketKey> {
        self.configs.iter().map(|c| c.key.clone()).collect()
    }

    /// Distribution tiers, ascending by `min_days_since_order`.
    pub fn distribution_tiers(&self) -> impl Iterator<Item = &BasketConfig> {
        self.distribution_tiers.iter().map(|&idx| &self.configs[idx])
    }

    /// Dashboard configs eligible for expiry scanning.
    pub fn expiring_dashboard(&self) -> impl Iterator<Item = &BasketConfig> {
        self.expiring_dashboard.iter().map(|&idx| &self.configs[idx])
    }

    /// Dashboard configs in display order (bootstrap tier matching).
    pub fn dashboard_tiers(&self) -> impl Iterator<Item = &BasketConfig> {
        self.dashboard_tiers.iter().map(|&idx| &self.configs[idx])
    }

    /// Business-age resolver over the distribution tiers.
    pub fn resolver(&self) -> TierResolver<'_> {
        TierResolver::new(self.distribution_tiers().collect())
    }

    /// Display name for a key, falling back to the key text itself when the
    /// key is not registered (report rendering must never fail on stale keys).
    pub fn display_name<'k>(&'k self, key: &'k BasketKey) -> &'k str {
        self.get(key).map_or_else(|| key.as_str(), |c| c.name.as_str())
    }
}
