//! `basketflow-baskets` — basket rule domain.
//!
//! A *basket* is a named work-queue a customer record belongs to. This crate
//! holds the rule catalog (`BasketConfig`), the immutable per-run snapshot of
//! that catalog (`BasketRegistry`) with its derived lookup views, the
//! business-age tier resolver used for re-evaluation, and the bootstrap
//! fallback ladder.

pub mod config;
pub mod ladder;
pub mod registry;
pub mod resolver;

pub use config::{BasketConfig, BasketKey, BasketSurface};
pub use registry::BasketRegistry;
pub use resolver::{TierMatch, TierResolver, UNKNOWN_DAYS};
