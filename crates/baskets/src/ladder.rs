//! Bootstrap fallback ladder.
//!
//! Last-resort day buckets for the one-shot initial assignment job, applied
//! only when no configured dashboard tier matches a record. This is a
//! deliberately separate policy from [`crate::resolver::TierResolver`]'s own
//! catch-all and must not be merged with it: the resolver serves the monthly
//! re-evaluation over *distribution* tiers, the ladder seeds never-bucketed
//! records into well-known *dashboard* baskets.

use crate::config::BasketKey;

/// Well-known dashboard basket keys the ladder can land on.
pub const NEW_CUSTOMER: &str = "new_customer";
pub const PERSONAL_1_2M: &str = "personal_1_2m";
pub const PERSONAL_LAST_CHANCE: &str = "personal_last_chance";
pub const MID_6_12M: &str = "mid_6_12m_dash";
pub const MID_1_3Y: &str = "mid_1_3y_dash";
pub const ANCIENT: &str = "ancient_dash";

/// Bucket a business age into a well-known dashboard basket key.
pub fn fallback_key(days_since_order: i64) -> BasketKey {
    let key = if days_since_order < 60 {
        NEW_CUSTOMER
    } else if days_since_order < 90 {
        PERSONAL_1_2M
    } else if days_since_order < 180 {
        PERSONAL_LAST_CHANCE
    } else if days_since_order < 365 {
        MID_6_12M
    } else if days_since_order < 1095 {
        MID_1_3Y
    } else {
        ANCIENT
    };
    BasketKey::from(key)
}
