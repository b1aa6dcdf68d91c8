//! SQLite-backed transient store.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

use super::cache::{CacheStore, expires_at};

/// Persistent cache store that outlives a single run.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open or create the database at the given path.
    pub async fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create cache directory")?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .context("Failed to open SQLite cache")?;

        let store = Self { pool };
        store.migrate().await?;

        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS transients (
                id TEXT PRIMARY KEY,
                payload BLOB NOT NULL,
                expires_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_transients_expiry ON transients(expires_at)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Delete expired entries, returns how many were removed.
    pub async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM transients WHERE expires_at <= ?")
            .bind(Utc::now().timestamp())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete every entry, returns how many were removed.
    pub async fn clear(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM transients")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Count entries as (live, expired).
    pub async fn counts(&self) -> Result<(i64, i64)> {
        let now = Utc::now().timestamp();
        let row = sqlx::query(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN expires_at > ? THEN 1 ELSE 0 END), 0) AS live,
                COALESCE(SUM(CASE WHEN expires_at <= ? THEN 1 ELSE 0 END), 0) AS expired
            FROM transients
            "#,
        )
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok((row.get("live"), row.get("expired")))
    }
}

#[async_trait]
impl CacheStore for SqliteStore {
    async fn get_transient(&self, id: &str) -> Result<Option<Vec<u8>>> {
        let row = sqlx::query("SELECT payload FROM transients WHERE id = ? AND expires_at > ?")
            .bind(id)
            .bind(Utc::now().timestamp())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.get("payload")))
    }

    async fn set_transient(&self, id: &str, bytes: &[u8], ttl: Duration) -> Result<()> {
        let expires_at = expires_at(ttl);
        sqlx::query(
            r#"
            INSERT INTO transients (id, payload, expires_at)
            VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                payload = excluded.payload,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(id)
        .bind(bytes)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_transient(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM transients WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
