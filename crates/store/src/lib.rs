//! Lus Store - relational persistence for the ledger engine
//!
//! SQLite through `sqlx`. Each table has a stateless repository in [`repos`]
//! operating on a borrowed connection; [`Store`] owns the pool and hands out
//! connections and transactions.

pub mod codec;
pub mod error;
pub mod repos;
pub mod rows;
pub mod schema;

pub use error::{StoreError, StoreResult};
pub use repos::{
    AccountRepo, AlertFilter, AlertRepo, DailyReset, JournalRepo, OrganizationCounters,
    OrganizationRepo, RevenueRepo, SettlementRepo, SettlementStats, TransactionRepo,
    TransitionUpdate, UserRepo, WalletRepo,
};

use lus_ledger::ChartOfAccounts;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_MAX_CONNECTIONS: u32 = 8;

/// Handle to the database
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Connect to a `sqlite:` URL, creating the file if needed, and migrate.
    pub async fn connect(url: &str, acquire_timeout: Duration) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(acquire_timeout);
        let pool = SqlitePoolOptions::new()
            .max_connections(DEFAULT_MAX_CONNECTIONS)
            .acquire_timeout(acquire_timeout)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        info!(url, "store opened");
        Ok(store)
    }

    /// Open (or create) a database file.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let url = format!("sqlite://{}", path.as_ref().display());
        Self::connect(&url, Duration::from_secs(5)).await
    }

    /// Private in-memory database on a single connection.
    pub async fn in_memory() -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Apply the schema and seed the default chart of accounts. Idempotent.
    pub async fn migrate(&self) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        for statement in schema::SCHEMA {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        AccountRepo::seed(&mut *tx, &ChartOfAccounts::default_accounts()).await?;
        tx.commit().await?;
        debug!(tables = schema::SCHEMA.len(), "schema applied");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn acquire(&self) -> StoreResult<PoolConnection<Sqlite>> {
        Ok(self.pool.acquire().await?)
    }

    pub async fn begin(&self) -> StoreResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lus.db");

        let store = Store::open(&path).await.unwrap();
        let mut conn = store.acquire().await.unwrap();
        let user = lus_core::User::new("u-1", "Ann", lus_core::UserRole::Customer);
        UserRepo::insert(&mut conn, &user, chrono::Utc::now()).await.unwrap();
        drop(conn);
        store.close().await;

        let reopened = Store::open(&path).await.unwrap();
        let mut conn = reopened.acquire().await.unwrap();
        assert!(UserRepo::get(&mut conn, "u-1").await.unwrap().is_some());
    }
}
