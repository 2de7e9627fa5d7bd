//! SQLite-backed task store

use crate::error::StoreError;
use async_trait::async_trait;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::TaskStore;

/// Persistent task store on SQLite
///
/// Task records live in a `kv` table keyed by the task key; counters live in
/// a separate `counters` table so a prefix scan over records never observes
/// the allocator state. Expiry is an `expires_at` column filtered on every
/// read and purged opportunistically during prefix scans.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) a store at the given database path
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StoreError::ConnectionFailed(format!("failed to create store directory: {e}"))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePool::connect_with(options).await.map_err(|e| {
            StoreError::ConnectionFailed(format!("failed to connect to database: {e}"))
        })?;

        let store = Self { pool };
        store.create_schema().await?;
        Ok(store)
    }

    /// Open an in-memory store (single shared connection)
    ///
    /// Useful for tests; the database disappears when the store is dropped.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new().in_memory(true);

        // One connection only: each pooled connection to ":memory:" would
        // otherwise get its own private database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| {
                StoreError::ConnectionFailed(format!("failed to open in-memory database: {e}"))
            })?;

        let store = Self { pool };
        store.create_schema().await?;
        Ok(store)
    }

    async fn create_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL,
                expires_at INTEGER
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::ConnectionFailed(format!("failed to create kv table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS counters (
                name TEXT PRIMARY KEY,
                value INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            StoreError::ConnectionFailed(format!("failed to create counters table: {e}"))
        })?;

        Ok(())
    }

    fn now() -> i64 {
        // Saturating: pre-epoch clocks read as 0
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }

    fn deadline(ttl: Option<Duration>) -> Option<i64> {
        ttl.map(|t| Self::now() + t.as_secs() as i64)
    }
}

#[async_trait]
impl TaskStore for SqliteStore {
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let row: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT 1 FROM kv
            WHERE key = ? AND (expires_at IS NULL OR expires_at > ?)
            "#,
        )
        .bind(key)
        .bind(Self::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("exists {key}: {e}")))?;

        Ok(row.is_some())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        sqlx::query_scalar(
            r#"
            SELECT value FROM kv
            WHERE key = ? AND (expires_at IS NULL OR expires_at > ?)
            "#,
        )
        .bind(key)
        .bind(Self::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("get {key}: {e}")))
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>, StoreError> {
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            values.push(self.get(key).await?);
        }
        Ok(values)
    }

    async fn get_by_prefix(&self, prefix: &str) -> Result<Vec<Vec<u8>>, StoreError> {
        let now = Self::now();

        // Opportunistic purge so expired rows don't accumulate
        sqlx::query("DELETE FROM kv WHERE expires_at IS NOT NULL AND expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("purge expired: {e}")))?;

        let pattern = format!(
            "{}%",
            prefix.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
        );

        let rows = sqlx::query(
            r#"
            SELECT value FROM kv
            WHERE key LIKE ? ESCAPE '\'
              AND (expires_at IS NULL OR expires_at > ?)
            "#,
        )
        .bind(pattern)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("prefix scan {prefix}: {e}")))?;

        Ok(rows.into_iter().map(|row| row.get("value")).collect())
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO kv (key, value, expires_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Self::deadline(ttl))
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("set {key}: {e}")))?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("delete {key}: {e}")))?;

        Ok(())
    }

    async fn next_id(&self, counter: &str) -> Result<u64, StoreError> {
        // Single upsert-returning statement: the increment and the read are
        // one atomic operation, so concurrent allocations cannot collide.
        let value: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO counters (name, value)
            VALUES (?, 1)
            ON CONFLICT(name) DO UPDATE SET value = value + 1
            RETURNING value
            "#,
        )
        .bind(counter)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("next_id {counter}: {e}")))?;

        Ok(value as u64)
    }
}
