//! Capabilities the gate consults but does not own

use crate::error::ComplianceResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lus_core::Transaction;

/// A name matched against a sanctions list
#[derive(Debug, Clone, PartialEq)]
pub struct SanctionsHit {
    pub screened_name: String,
    pub listed_name: String,
    /// Similarity in `[0, 1]`
    pub similarity: f64,
}

/// Sanctions list lookup
#[async_trait]
pub trait SanctionsChecker: Send + Sync {
    /// Best match for `name` at or above the checker's threshold, if any
    async fn check_name(&self, name: &str) -> ComplianceResult<Option<SanctionsHit>>;
}

/// Read access to a user's past transactions
#[async_trait]
pub trait TransactionHistoryReader: Send + Sync {
    /// Live transactions originated by `user_id` within `[from, until)`, oldest first
    async fn originated_between(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> ComplianceResult<Vec<Transaction>>;
}
