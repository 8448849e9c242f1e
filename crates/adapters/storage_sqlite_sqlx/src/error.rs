//! Storage-specific error type wrapping sqlx errors.

use habridge_domain::error::BridgeError;
use habridge_domain::id::ObjectId;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Failed to (de)serialize a stored JSON value.
    #[error("JSON serialization error")]
    Json(#[from] serde_json::Error),

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// An update targeted a variable that does not exist.
    #[error("no variable with id {0}")]
    UnknownVariable(ObjectId),
}

impl From<StorageError> for BridgeError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}
