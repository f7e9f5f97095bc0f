//! Settlement requests and their review trail

use crate::codec::{day, ts};
use crate::error::{StoreError, StoreResult};
use crate::rows::{SettlementReviewRow, SettlementRow};
use chrono::{DateTime, NaiveDate, Utc};
use lus_core::{
    SettlementReason, SettlementRequest, SettlementReview, SettlementStatus,
};
use sqlx::SqliteConnection;
use std::collections::BTreeMap;

/// Number of requests per status
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettlementStats {
    pub by_status: BTreeMap<String, u64>,
}

impl SettlementStats {
    pub fn count(&self, status: SettlementStatus) -> u64 {
        self.by_status.get(&status.to_string()).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.by_status.values().sum()
    }
}

pub struct SettlementRepo;

impl SettlementRepo {
    pub async fn insert(
        conn: &mut SqliteConnection,
        request: &SettlementRequest,
        counters_date: NaiveDate,
    ) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO settlement_requests (
                id, organization_id, user_id, amount_cents, bank_name, account_number,
                status, priority, counters_date, created_at, updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&request.id)
        .bind(&request.organization_id)
        .bind(&request.user_id)
        .bind(request.amount.to_cents()?)
        .bind(&request.bank_name)
        .bind(&request.account_number)
        .bind(request.status.to_string())
        .bind(request.priority.to_string())
        .bind(day(&counters_date))
        .bind(ts(&request.created_at))
        .bind(ts(&request.updated_at))
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub async fn get(conn: &mut SqliteConnection, id: &str) -> StoreResult<Option<SettlementRequest>> {
        Self::row(conn, id)
            .await?
            .map(SettlementRequest::try_from)
            .transpose()
    }

    pub async fn require(conn: &mut SqliteConnection, id: &str) -> StoreResult<SettlementRequest> {
        Self::get(conn, id)
            .await?
            .ok_or_else(|| StoreError::not_found("SettlementRequest", id))
    }

    /// Day whose organization counters the request's amount was reserved against.
    pub async fn counters_date(conn: &mut SqliteConnection, id: &str) -> StoreResult<NaiveDate> {
        let row = Self::row(conn, id)
            .await?
            .ok_or_else(|| StoreError::not_found("SettlementRequest", id))?;
        crate::codec::parse_day("settlement_requests.counters_date", &row.counters_date)
    }

    async fn row(conn: &mut SqliteConnection, id: &str) -> StoreResult<Option<SettlementRow>> {
        Ok(
            sqlx::query_as::<_, SettlementRow>("SELECT * FROM settlement_requests WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?,
        )
    }

    /// Conditional status change recording the reviewer.
    ///
    /// A hold or reject replaces the comment, so it always belongs to the
    /// latest reason. Returns `false` when the stored status is no longer `from`.
    #[allow(clippy::too_many_arguments)]
    pub async fn review(
        conn: &mut SqliteConnection,
        id: &str,
        from: SettlementStatus,
        to: SettlementStatus,
        reviewer_id: &str,
        reason: Option<SettlementReason>,
        comment: Option<&str>,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let (hold_reason, reject_reason) = match to {
            SettlementStatus::Hold => (reason, None),
            SettlementStatus::Rejected => (None, reason),
            _ => (None, None),
        };
        let result = sqlx::query(
            "UPDATE settlement_requests SET
                status = ?3,
                hold_reason = COALESCE(?4, hold_reason),
                reject_reason = COALESCE(?5, reject_reason),
                reason_comment = CASE WHEN ?3 IN ('hold', 'rejected') THEN ?6 ELSE reason_comment END,
                reviewed_by = ?7,
                reviewed_at = ?8,
                updated_at = ?8
             WHERE id = ?1 AND status = ?2",
        )
        .bind(id)
        .bind(from.to_string())
        .bind(to.to_string())
        .bind(hold_reason.map(|r| r.to_string()))
        .bind(reject_reason.map(|r| r.to_string()))
        .bind(comment)
        .bind(reviewer_id)
        .bind(ts(&now))
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn link_transaction(
        conn: &mut SqliteConnection,
        id: &str,
        transaction_id: &str,
    ) -> StoreResult<()> {
        sqlx::query("UPDATE settlement_requests SET transaction_id = ? WHERE id = ?")
            .bind(transaction_id)
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Record the gateway outcome on an approved request.
    pub async fn record_payout(
        conn: &mut SqliteConnection,
        id: &str,
        to: SettlementStatus,
        reject_reason: Option<SettlementReason>,
        payout_reference: Option<&str>,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE settlement_requests SET
                status = ?2,
                reject_reason = COALESCE(?3, reject_reason),
                payout_reference = ?4,
                updated_at = ?5
             WHERE id = ?1 AND status = 'approved'",
        )
        .bind(id)
        .bind(to.to_string())
        .bind(reject_reason.map(|r| r.to_string()))
        .bind(payout_reference)
        .bind(ts(&now))
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn insert_review(conn: &mut SqliteConnection, review: &SettlementReview) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO settlement_reviews
                (settlement_id, from_status, to_status, reviewer_id, reason, comment, reviewed_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&review.settlement_id)
        .bind(review.from_status.to_string())
        .bind(review.to_status.to_string())
        .bind(&review.reviewer_id)
        .bind(review.reason.map(|r| r.to_string()))
        .bind(&review.comment)
        .bind(ts(&review.reviewed_at))
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub async fn reviews(conn: &mut SqliteConnection, settlement_id: &str) -> StoreResult<Vec<SettlementReview>> {
        sqlx::query_as::<_, SettlementReviewRow>(
            "SELECT settlement_id, from_status, to_status, reviewer_id, reason, comment, reviewed_at
             FROM settlement_reviews WHERE settlement_id = ? ORDER BY id",
        )
        .bind(settlement_id)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(SettlementReview::try_from)
        .collect()
    }

    pub async fn list_by_status(
        conn: &mut SqliteConnection,
        status: SettlementStatus,
    ) -> StoreResult<Vec<SettlementRequest>> {
        sqlx::query_as::<_, SettlementRow>(
            "SELECT * FROM settlement_requests WHERE status = ?
             ORDER BY CASE priority WHEN 'high' THEN 0 WHEN 'medium' THEN 1 ELSE 2 END, created_at",
        )
        .bind(status.to_string())
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(SettlementRequest::try_from)
        .collect()
    }

    /// Settlement history for regulatory reporting.
    pub async fn list_between(
        conn: &mut SqliteConnection,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<SettlementRequest>> {
        sqlx::query_as::<_, SettlementRow>(
            "SELECT * FROM settlement_requests WHERE created_at >= ? AND created_at <= ? ORDER BY created_at",
        )
        .bind(ts(&from))
        .bind(ts(&to))
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(SettlementRequest::try_from)
        .collect()
    }

    pub async fn stats(conn: &mut SqliteConnection) -> StoreResult<SettlementStats> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT status, COUNT(*) FROM settlement_requests GROUP BY status",
        )
        .fetch_all(&mut *conn)
        .await?;
        let by_status = rows
            .into_iter()
            .map(|(status, count)| (status, u64::try_from(count).unwrap_or(0)))
            .collect();
        Ok(SettlementStats { by_status })
    }
}
