//! `SQLite` implementation of [`ObjectModel`].
//!
//! Categories are keyed by their ident (the device class), variables by
//! theirs (the entity id). Values are stored as JSON so the variant survives
//! a round trip.

use std::future::Future;
use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use habridge_app::ports::{ObjectModel, VariableSpec};
use habridge_domain::device_class::DisplayProfile;
use habridge_domain::error::BridgeError;
use habridge_domain::id::{CategoryId, ObjectId};
use habridge_domain::time::{Timestamp, now, parse_timestamp};
use habridge_domain::value::{Value, ValueKind};

use crate::error::StorageError;

/// A local variable as stored by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredVariable {
    pub id: ObjectId,
    pub ident: String,
    pub category_id: CategoryId,
    pub kind: ValueKind,
    pub profile: DisplayProfile,
    pub name: String,
    pub writable: bool,
    pub value: Option<Value>,
    pub updated_at: Option<Timestamp>,
}

fn decode<E>(err: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::Decode(Box::new(err))
}

/// Wrapper for converting database rows into [`StoredVariable`].
struct Wrapper(StoredVariable);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let category_id: String = row.try_get("category_id")?;
        let kind: String = row.try_get("kind")?;
        let profile: String = row.try_get("profile")?;
        let value: Option<String> = row.try_get("value")?;
        let updated_at: Option<String> = row.try_get("updated_at")?;

        Ok(Self(StoredVariable {
            id: ObjectId::from_str(&id).map_err(decode)?,
            ident: row.try_get("ident")?,
            category_id: CategoryId::from_str(&category_id).map_err(decode)?,
            kind: ValueKind::from_str(&kind).map_err(decode)?,
            profile: DisplayProfile::from_str(&profile).map_err(decode)?,
            name: row.try_get("name")?,
            writable: row.try_get("writable")?,
            value: value
                .map(|v| serde_json::from_str(&v))
                .transpose()
                .map_err(decode)?,
            updated_at: updated_at
                .map(|t| parse_timestamp(&t))
                .transpose()
                .map_err(decode)?,
        }))
    }
}

const INSERT_CATEGORY: &str =
    "INSERT INTO categories (id, ident, name) VALUES (?, ?, ?) ON CONFLICT (ident) DO NOTHING";
const SELECT_CATEGORY_ID: &str = "SELECT id FROM categories WHERE ident = ?";
// A kind change drops the stored value: it no longer fits the variable.
const UPSERT_VARIABLE: &str = "INSERT INTO variables (id, ident, category_id, kind, profile, name) \
     VALUES (?, ?, ?, ?, ?, ?) \
     ON CONFLICT (ident) DO UPDATE SET \
         category_id = excluded.category_id, \
         value = CASE WHEN variables.kind = excluded.kind THEN variables.value ELSE NULL END, \
         kind = excluded.kind, \
         profile = excluded.profile";
const SELECT_VARIABLE_ID: &str = "SELECT id FROM variables WHERE ident = ?";
const SELECT_VARIABLE: &str = "SELECT * FROM variables WHERE id = ?";
const SELECT_ALL_VARIABLES: &str = "SELECT * FROM variables ORDER BY ident";
const UPDATE_NAME: &str = "UPDATE variables SET name = ? WHERE id = ?";
const UPDATE_WRITABLE: &str = "UPDATE variables SET writable = ? WHERE id = ?";
const UPDATE_VALUE: &str = "UPDATE variables SET value = ?, updated_at = ? WHERE id = ?";
const SELECT_VALUE: &str = "SELECT value FROM variables WHERE id = ?";

/// `SQLite`-backed host object model.
pub struct SqliteObjectModel {
    pool: SqlitePool,
}

impl SqliteObjectModel {
    /// Create a new object model using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Fetch one variable.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Database`] if the query fails.
    pub async fn variable(&self, id: ObjectId) -> Result<Option<StoredVariable>, StorageError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_VARIABLE)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|w| w.0))
    }

    /// Every variable, ordered by ident.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Database`] if the query fails.
    pub async fn variables(&self) -> Result<Vec<StoredVariable>, StorageError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL_VARIABLES)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}

fn ensure_updated(id: ObjectId, rows_affected: u64) -> Result<(), StorageError> {
    if rows_affected == 0 {
        return Err(StorageError::UnknownVariable(id));
    }
    Ok(())
}

impl ObjectModel for SqliteObjectModel {
    fn ensure_category(
        &self,
        ident: &str,
        name: &str,
    ) -> impl Future<Output = Result<CategoryId, BridgeError>> + Send {
        let pool = self.pool.clone();
        let ident = ident.to_string();
        let name = name.to_string();
        async move {
            sqlx::query(INSERT_CATEGORY)
                .bind(CategoryId::new().to_string())
                .bind(&ident)
                .bind(&name)
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            let (id,): (String,) = sqlx::query_as(SELECT_CATEGORY_ID)
                .bind(&ident)
                .fetch_one(&pool)
                .await
                .map_err(StorageError::from)?;

            let id = CategoryId::from_str(&id)
                .map_err(|err| StorageError::Database(decode(err)))?;
            Ok(id)
        }
    }

    fn ensure_variable(
        &self,
        spec: VariableSpec,
    ) -> impl Future<Output = Result<ObjectId, BridgeError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(UPSERT_VARIABLE)
                .bind(ObjectId::new().to_string())
                .bind(&spec.ident)
                .bind(spec.category.to_string())
                .bind(spec.kind.as_str())
                .bind(spec.profile.to_string())
                .bind(&spec.ident)
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            let (id,): (String,) = sqlx::query_as(SELECT_VARIABLE_ID)
                .bind(&spec.ident)
                .fetch_one(&pool)
                .await
                .map_err(StorageError::from)?;

            let id = ObjectId::from_str(&id).map_err(|err| StorageError::Database(decode(err)))?;
            Ok(id)
        }
    }

    fn set_display_name(
        &self,
        id: ObjectId,
        name: &str,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        let pool = self.pool.clone();
        let name = name.to_string();
        async move {
            let result = sqlx::query(UPDATE_NAME)
                .bind(&name)
                .bind(id.to_string())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            ensure_updated(id, result.rows_affected())?;
            Ok(())
        }
    }

    fn set_write_action(
        &self,
        id: ObjectId,
        enabled: bool,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        let pool = self.pool.clone();
        async move {
            let result = sqlx::query(UPDATE_WRITABLE)
                .bind(enabled)
                .bind(id.to_string())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            ensure_updated(id, result.rows_affected())?;
            Ok(())
        }
    }

    fn set_value(
        &self,
        id: ObjectId,
        value: Value,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        let pool = self.pool.clone();
        async move {
            let json = serde_json::to_string(&value).map_err(StorageError::from)?;
            let result = sqlx::query(UPDATE_VALUE)
                .bind(&json)
                .bind(now().to_rfc3339())
                .bind(id.to_string())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            ensure_updated(id, result.rows_affected())?;
            Ok(())
        }
    }

    fn get_value(
        &self,
        id: ObjectId,
    ) -> impl Future<Output = Result<Option<Value>, BridgeError>> + Send {
        let pool = self.pool.clone();
        async move {
            let row: Option<(Option<String>,)> = sqlx::query_as(SELECT_VALUE)
                .bind(id.to_string())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            let Some((value,)) = row else {
                return Err(StorageError::UnknownVariable(id).into());
            };
            let value = value
                .map(|v| serde_json::from_str(&v))
                .transpose()
                .map_err(StorageError::from)?;
            Ok(value)
        }
    }
}
