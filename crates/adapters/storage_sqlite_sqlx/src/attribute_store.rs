//! `SQLite` implementation of [`AttributeStore`].

use std::future::Future;

use sqlx::SqlitePool;

use habridge_app::ports::AttributeStore;
use habridge_domain::error::BridgeError;
use habridge_domain::time::now;

use crate::error::StorageError;

const SELECT: &str = "SELECT value FROM attributes WHERE instance = ? AND name = ?";
const UPSERT: &str = "INSERT INTO attributes (instance, name, value, updated_at) VALUES (?, ?, ?, ?) \
     ON CONFLICT (instance, name) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at";

/// `SQLite`-backed attribute store, scoped to one bridge instance.
pub struct SqliteAttributeStore {
    pool: SqlitePool,
    instance: String,
}

impl SqliteAttributeStore {
    /// Create a store for `instance` using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool, instance: impl Into<String>) -> Self {
        Self {
            pool,
            instance: instance.into(),
        }
    }
}

impl AttributeStore for SqliteAttributeStore {
    fn read_attribute(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<String>, BridgeError>> + Send {
        let pool = self.pool.clone();
        let instance = self.instance.clone();
        let name = name.to_string();
        async move {
            let row: Option<(String,)> = sqlx::query_as(SELECT)
                .bind(&instance)
                .bind(&name)
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(row.map(|(value,)| value))
        }
    }

    fn write_attribute(
        &self,
        name: &str,
        value: String,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        let pool = self.pool.clone();
        let instance = self.instance.clone();
        let name = name.to_string();
        async move {
            sqlx::query(UPSERT)
                .bind(&instance)
                .bind(&name)
                .bind(&value)
                .bind(now().to_rfc3339())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            tracing::debug!(%instance, %name, bytes = value.len(), "attribute written");
            Ok(())
        }
    }
}
