//! `basketflow-infra` — storage interface for the lifecycle engine.
//!
//! The engine talks to storage through two narrow traits: [`store::ConfigStore`]
//! for the rule catalog and [`store::CustomerStore`] for record queries and the
//! atomic transition commits. An in-memory implementation backs tests and dev;
//! a Postgres implementation lives behind the `postgres` feature.

pub mod store;

pub use store::{ConfigStore, CustomerStore, InMemoryStore, StoreError};

#[cfg(feature = "postgres")]
pub use store::postgres::PostgresStore;
