//! Transaction history backed by the ledger store

use crate::error::ComplianceResult;
use crate::ports::TransactionHistoryReader;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lus_core::Transaction;
use lus_store::{Store, TransactionRepo};

/// Reads history through its own pooled connection.
///
/// Callers must not hold the only pooled connection while screening.
#[derive(Debug, Clone)]
pub struct StoreHistoryReader {
    store: Store,
}

impl StoreHistoryReader {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl TransactionHistoryReader for StoreHistoryReader {
    async fn originated_between(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> ComplianceResult<Vec<Transaction>> {
        let mut conn = self.store.acquire().await?;
        Ok(TransactionRepo::originated_between(&mut conn, user_id, from, until).await?)
    }
}
