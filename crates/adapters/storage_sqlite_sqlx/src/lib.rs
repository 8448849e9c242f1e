//! # habridge-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the `AttributeStore` and `ObjectModel` ports defined in
//!   `habridge-app::ports`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `habridge-app` (for port traits) and `habridge-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod attribute_store;
pub mod error;
pub mod object_model;
pub mod pool;

pub use attribute_store::SqliteAttributeStore;
pub use error::StorageError;
pub use object_model::{SqliteObjectModel, StoredVariable};
pub use pool::{Config, Database};
