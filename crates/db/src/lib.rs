//! SQLite connection pool and migration runner for Libris.

use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Transaction;

pub mod migrate;

pub use migrate::{run_migrations, Migration, MigrationError, MigrationReport};

/// How long a writer waits for the database lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared handle to the relational store.
#[derive(Clone, Debug)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    /// Open a pool against `url`, creating the database file when missing.
    ///
    /// Foreign keys are always switched on: book rows rely on
    /// `ON DELETE CASCADE` to follow their author.
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid database url '{url}'"))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await
            .with_context(|| format!("failed to open database pool at '{url}'"))?;

        tracing::info!(target: "libris-db", %url, max_connections, "database pool ready");
        Ok(Self { pool })
    }

    /// Private in-memory database.
    ///
    /// Every connection to `sqlite::memory:` sees its own empty database, so
    /// the pool is pinned to exactly one long-lived connection.
    pub async fn in_memory() -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .context("invalid in-memory database url")?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("failed to open in-memory database")?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Open a transaction holding the write lock from its first statement.
    ///
    /// Deferred transactions that read before writing cannot upgrade their
    /// lock while another one does the same, and SQLite fails one of them
    /// without waiting. Immediate transactions queue on the busy timeout.
    pub async fn begin_write(&self) -> anyhow::Result<Transaction<'static, Sqlite>> {
        self.pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .context("failed to begin write transaction")
    }

    /// Round-trip a trivial statement to prove the pool is usable.
    pub async fn ping(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("database ping failed")?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!(target: "libris-db", "database pool closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_database_answers_ping() {
        let db = Db::in_memory().await.unwrap();
        db.ping().await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_read_then_write_transactions_all_commit() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("writers.db").display());
        let db = Db::connect(&url, 5).await.unwrap();
        sqlx::query("CREATE TABLE counter (n INTEGER NOT NULL)")
            .execute(db.pool())
            .await
            .unwrap();

        let mut writers = tokio::task::JoinSet::new();
        for n in 0..20_i64 {
            let db = db.clone();
            writers.spawn(async move {
                let mut tx = db.begin_write().await?;
                let _: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM counter")
                    .fetch_one(&mut *tx)
                    .await?;
                sqlx::query("INSERT INTO counter (n) VALUES (?)")
                    .bind(n)
                    .execute(&mut *tx)
                    .await?;
                tx.commit().await?;
                anyhow::Ok(())
            });
        }
        while let Some(joined) = writers.join_next().await {
            joined.unwrap().unwrap();
        }

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM counter")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(rows, 20);
    }

    #[tokio::test]
    async fn foreign_keys_are_enforced() {
        let db = Db::in_memory().await.unwrap();
        let enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(enabled, 1);
    }
}
