//! Business-age tier resolution.

use crate::config::BasketConfig;

/// Sentinel business age for records with no order history.
///
/// Large enough to land in the oldest configured tier.
pub const UNKNOWN_DAYS: i64 = 9999;

/// How a tier was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierMatch<'a> {
    /// The value fell inside the tier's `[min, max]` range.
    Range(&'a BasketConfig),
    /// No range contained the value; the highest-min tier was used as the
    /// catch-all.
    Fallback(&'a BasketConfig),
}

impl<'a> TierMatch<'a> {
    pub fn config(&self) -> &'a BasketConfig {
        match self {
            TierMatch::Range(c) | TierMatch::Fallback(c) => c,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, TierMatch::Fallback(_))
    }
}

/// Resolves a days-since-last-order value to a distribution tier.
///
/// Tiers must be ordered ascending by `min_days_since_order` (the registry
/// guarantees this); first match wins, so overlapping ranges resolve by
/// lowest-min precedence. Overlap itself is not validated.
#[derive(Debug, Clone)]
pub struct TierResolver<'a> {
    tiers: Vec<&'a BasketConfig>,
}

impl<'a> TierResolver<'a> {
    pub fn new(tiers: Vec<&'a BasketConfig>) -> Self {
        Self { tiers }
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Resolve a business age to a tier.
    ///
    /// Returns `None` only when no tiers are configured at all; otherwise a
    /// record always resolves somewhere, via the catch-all tail if nothing
    /// contains the value.
    pub fn resolve(&self, days_since_order: i64) -> Option<TierMatch<'a>> {
        for &tier in &self.tiers {
            let min = tier.min_days_since_order.unwrap_or(0);
            if days_since_order >= min && days_since_order <= tier.max_days_or_unbounded() {
                return Some(TierMatch::Range(tier));
            }
        }
        self.tiers.last().copied().map(TierMatch::Fallback)
    }
}
