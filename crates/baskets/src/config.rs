//! Basket rule catalog entries.

use serde::{Deserialize, Serialize};

use basketflow_core::BasketId;

/// Stable basket reference.
///
/// Customer records carry this key, not the row id: config rows may be
/// regenerated, the key never changes once referenced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BasketKey(String);

impl BasketKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for BasketKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<&str> for BasketKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for BasketKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Which consumer phase a basket belongs to.
///
/// Dashboard baskets are scanned for dwell-time expiry; distribution baskets
/// form the business-age tier ladder used for re-evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BasketSurface {
    Dashboard,
    Distribution,
}

/// One basket rule definition.
///
/// `min_days_since_order`/`max_days_since_order` bound the business-age range
/// a record must fall into for this basket to match; `None` is unbounded on
/// that side. Only dashboard-surface configs with a positive
/// `fail_after_days` are eligible for expiry scanning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasketConfig {
    pub id: BasketId,
    pub key: BasketKey,
    pub name: String,
    pub surface: BasketSurface,
    pub min_days_since_order: Option<i64>,
    pub max_days_since_order: Option<i64>,
    pub on_fail_basket_key: Option<BasketKey>,
    pub on_fail_reevaluate: bool,
    pub fail_after_days: Option<i64>,
    pub max_distribution_count: Option<u32>,
    pub on_max_dist_basket_key: Option<BasketKey>,
    pub hold_days_before_redistribute: Option<i64>,
    pub display_order: i32,
    pub is_active: bool,
}

impl BasketConfig {
    /// Whether the expiry scanner should consider this basket.
    pub fn is_expiring_dashboard(&self) -> bool {
        self.surface == BasketSurface::Dashboard && self.fail_after_days.is_some_and(|d| d > 0)
    }

    /// Whether this basket participates in the re-evaluation tier ladder.
    pub fn is_distribution_tier(&self) -> bool {
        self.surface == BasketSurface::Distribution && self.min_days_since_order.is_some()
    }

    /// Whether the basket carries any business-age range at all.
    ///
    /// Range-less baskets (e.g. an upsell queue) never match by age.
    pub fn has_day_range(&self) -> bool {
        self.min_days_since_order.is_some() || self.max_days_since_order.is_some()
    }

    /// Upper range bound, unbounded mapped to `i64::MAX`.
    pub fn max_days_or_unbounded(&self) -> i64 {
        self.max_days_since_order.unwrap_or(i64::MAX)
    }

    /// Range containment with `None` bounds matching on that side.
    pub fn day_range_contains(&self, days: i64) -> bool {
        let above_min = self.min_days_since_order.is_none_or(|min| days >= min);
        let below_max = self.max_days_since_order.is_none_or(|max| days <= max);
        above_min && below_max
    }
}
