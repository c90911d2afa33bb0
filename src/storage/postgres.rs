//! PostgreSQL Storage - connection pool, errors, migrations
//!
//! Every persisted record lives in one database split into three schemas:
//! - `game`: live content read by the game servers
//! - `tooling`: pending content owned by the authoring tool
//! - `management`: moderation words and server instances
//!
//! Domain operations are added to [`PostgresStore`] by the sibling modules
//! (`content`, `expeditions`, `quests`, ...).

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Acquire, Postgres, Transaction};
use tracing::{debug, info, warn};

use super::migrations;

/// Pause between migration attempts while the database is unreachable.
pub const MIGRATION_RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// PostgreSQL connection pool wrapper
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

/// Error type for PostgreSQL operations
#[derive(Debug, thiserror::Error)]
pub enum PostgresError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
}

impl PostgresError {
    pub fn validation(message: impl Into<String>) -> Self {
        PostgresError::Validation(message.into())
    }
}

impl PostgresStore {
    /// Connect to PostgreSQL and run migrations
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await?;

        info!("PostgreSQL connected (max_connections={})", max_connections);

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Build the pool without connecting; connections open on first use.
    ///
    /// Fails only on a malformed URL. Pair with [`Self::migrate_with_retry`].
    pub fn connect_lazy(database_url: &str, max_connections: u32) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect_lazy(database_url)?;
        Ok(Self { pool })
    }

    /// Keep running migrations until they succeed.
    ///
    /// Requests made meanwhile fail individually with a database error.
    pub async fn migrate_with_retry(&self, interval: Duration) {
        let mut attempt: u32 = 1;
        loop {
            match self.run_migrations().await {
                Ok(()) => {
                    info!("PostgreSQL ready (migrations applied)");
                    return;
                }
                Err(e) => warn!(
                    "Migrations failed (attempt {}), retrying in {:?}: {}",
                    attempt, interval, e
                ),
            }
            attempt += 1;
            tokio::time::sleep(interval).await;
        }
    }

    /// Wrap an existing pool (tests, lazily connected pools)
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub(crate) async fn begin(&self) -> Result<Transaction<'static, Postgres>, PostgresError> {
        Ok(self.pool.begin().await?)
    }

    /// Run all pending migrations
    pub async fn run_migrations(&self) -> Result<(), PostgresError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS _migrations (
                name VARCHAR(100) PRIMARY KEY,
                applied_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )",
        )
        .execute(&self.pool)
        .await?;

        for (name, sql) in migrations::get_migrations() {
            let applied: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM _migrations WHERE name = $1)")
                    .bind(name)
                    .fetch_one(&self.pool)
                    .await?;

            if !applied {
                info!("Running migration: {}", name);
                let mut tx = self.pool.begin().await?;
                sqlx::Executor::execute(&mut *tx, sqlx::raw_sql(sql))
                    .await
                    .map_err(|e| PostgresError::Migration(format!("{}: {}", name, e)))?;

                sqlx::query("INSERT INTO _migrations (name) VALUES ($1)")
                    .bind(name)
                    .execute(&mut *tx)
                    .await?;
                tx.commit().await?;

                info!("Migration applied: {}", name);
            } else {
                debug!("Migration already applied: {}", name);
            }
        }

        Ok(())
    }

    /// Publish a JSON payload on a notification channel as part of `tx`.
    ///
    /// Runs inside a savepoint so a failed notify is logged and rolled back
    /// on its own without aborting the surrounding write.
    pub(crate) async fn notify(
        tx: &mut Transaction<'static, Postgres>,
        channel: &str,
        payload: &serde_json::Value,
    ) {
        let result = async {
            let mut savepoint = tx.begin().await?;
            sqlx::query("SELECT pg_notify($1, $2)")
                .bind(channel)
                .bind(payload.to_string())
                .execute(&mut *savepoint)
                .await?;
            savepoint.commit().await
        }
        .await;

        if let Err(e) = result {
            warn!("Notification on {} failed: {}", channel, e);
        }
    }
}
