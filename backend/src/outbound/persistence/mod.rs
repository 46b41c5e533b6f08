//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the catalogue store ports backed by
//! PostgreSQL through `diesel-async` and `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: the store only translates between Diesel rows and
//!   domain records. No business logic resides here.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Strongly typed errors**: all database errors are mapped to
//!   `StoreError` in `diesel_helpers`.
//!
//! # Example
//!
//! ```ignore
//! use fold_backend::outbound::persistence::{DbPool, DieselCatalogueStore, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/fold")).await?;
//! let store = DieselCatalogueStore::new(pool);
//! ```

mod diesel_catalogue_store;
pub(crate) mod diesel_helpers;
mod models;
mod pool;
mod schema;

pub use diesel_catalogue_store::{DieselCatalogueStore, DieselTransaction};
pub use pool::{DbPool, OwnedConnection, PoolConfig, PoolError};

/// Catalogue schema applied by the integration suite and by operators.
pub const CATALOGUE_SCHEMA_SQL: &str =
    include_str!("../../../migrations/2024-01-01-000000_create_catalogue/up.sql");
