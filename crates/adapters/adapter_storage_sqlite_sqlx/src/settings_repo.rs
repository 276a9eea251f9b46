//! `SQLite` implementation of [`SettingsRepository`].
//!
//! One row per settings key, the value stored as JSON text so the table
//! reads like the panel's key-value storage.

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use flowmate_app::ports::SettingsRepository;
use flowmate_domain::error::FlowMateError;
use flowmate_domain::settings::{Settings, SettingsPatch};

use crate::error::StorageError;

struct Entry {
    key: String,
    value: String,
}

impl<'r> FromRow<'r, SqliteRow> for Entry {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            key: row.try_get("key")?,
            value: row.try_get("value")?,
        })
    }
}

impl Entry {
    fn decode(self) -> Result<(String, serde_json::Value), StorageError> {
        let value = serde_json::from_str(&self.value).map_err(|source| StorageError::Json {
            key: self.key.clone(),
            source,
        })?;
        Ok((self.key, value))
    }
}

const SELECT_ALL: &str = "SELECT key, value FROM settings";
const UPSERT: &str = "INSERT INTO settings (key, value) VALUES (?, ?) \
     ON CONFLICT(key) DO UPDATE SET value = excluded.value";

/// `SQLite`-backed settings repository.
pub struct SqliteSettingsRepository {
    pool: SqlitePool,
}

impl SqliteSettingsRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl SettingsRepository for SqliteSettingsRepository {
    fn load(&self) -> impl Future<Output = Result<SettingsPatch, FlowMateError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Entry> = sqlx::query_as(SELECT_ALL)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            let entries = rows
                .into_iter()
                .map(Entry::decode)
                .collect::<Result<Vec<_>, _>>()?;

            Ok(SettingsPatch::from_entries(entries))
        }
    }

    fn store(&self, settings: &Settings) -> impl Future<Output = Result<(), FlowMateError>> + Send {
        let pool = self.pool.clone();
        let entries = settings.entries();
        async move {
            let mut tx = pool.begin().await.map_err(StorageError::from)?;
            for (key, value) in entries {
                sqlx::query(UPSERT)
                    .bind(key)
                    .bind(value.to_string())
                    .execute(&mut *tx)
                    .await
                    .map_err(StorageError::from)?;
            }
            tx.commit().await.map_err(StorageError::from)?;

            Ok(())
        }
    }
}
