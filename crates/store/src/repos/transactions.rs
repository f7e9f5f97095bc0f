//! Transaction persistence

use crate::codec::ts;
use crate::error::{StoreError, StoreResult};
use crate::rows::TransactionRow;
use chrono::{DateTime, Utc};
use lus_core::{Transaction, TransactionStatus};
use sqlx::SqliteConnection;

pub struct TransactionRepo;

impl TransactionRepo {
    /// Insert a new transaction.
    ///
    /// A second pending transaction for the same originator and type violates
    /// `idx_transactions_single_pending` and surfaces as
    /// [`StoreError::UniqueViolation`].
    pub async fn insert(conn: &mut SqliteConnection, tx: &Transaction) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO transactions (
                transaction_id, from_user_id, to_user_id, amount_cents, transaction_type,
                status, priority, vmf_number, expires_at, rejection_reason, processed_by,
                created_at, updated_at, completed_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(tx.transaction_id.as_str())
        .bind(&tx.from_user_id)
        .bind(&tx.to_user_id)
        .bind(tx.amount.to_cents()?)
        .bind(tx.transaction_type.to_string())
        .bind(tx.status.to_string())
        .bind(tx.priority.to_string())
        .bind(&tx.vmf_number)
        .bind(tx.expires_at.as_ref().map(ts))
        .bind(&tx.rejection_reason)
        .bind(&tx.processed_by)
        .bind(ts(&tx.created_at))
        .bind(ts(&tx.updated_at))
        .bind(tx.completed_at.as_ref().map(ts))
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub async fn get(conn: &mut SqliteConnection, id: &str) -> StoreResult<Option<Transaction>> {
        sqlx::query_as::<_, TransactionRow>("SELECT * FROM transactions WHERE transaction_id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .map(Transaction::try_from)
            .transpose()
    }

    pub async fn require(conn: &mut SqliteConnection, id: &str) -> StoreResult<Transaction> {
        Self::get(conn, id)
            .await?
            .ok_or_else(|| StoreError::not_found("Transaction", id))
    }

    /// Move every pending transaction past its expiry to `expired`.
    ///
    /// Returns the ids that were swept.
    pub async fn expire_stale(conn: &mut SqliteConnection, now: DateTime<Utc>) -> StoreResult<Vec<String>> {
        let now = ts(&now);
        let rows = sqlx::query_as::<_, (String,)>(
            "UPDATE transactions SET status = 'expired', updated_at = ?1
             WHERE status = 'pending' AND expires_at IS NOT NULL AND expires_at < ?1
             RETURNING transaction_id",
        )
        .bind(&now)
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Conditionally move a transaction from one of `from` to `to`.
    ///
    /// Returns `false` when the transaction is no longer in any of `from`.
    pub async fn transition(
        conn: &mut SqliteConnection,
        id: &str,
        from: &[TransactionStatus],
        to: TransactionStatus,
        update: TransitionUpdate<'_>,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let placeholders = vec!["?"; from.len()].join(", ");
        let sql = format!(
            "UPDATE transactions SET
                status = ?,
                processed_by = COALESCE(?, processed_by),
                rejection_reason = COALESCE(?, rejection_reason),
                completed_at = COALESCE(?, completed_at),
                updated_at = ?
             WHERE transaction_id = ? AND status IN ({placeholders})"
        );
        let mut query = sqlx::query(&sql)
            .bind(to.to_string())
            .bind(update.processed_by)
            .bind(update.rejection_reason)
            .bind(update.completed_at.as_ref().map(ts))
            .bind(ts(&now))
            .bind(id);
        for status in from {
            query = query.bind(status.to_string());
        }
        let result = query.execute(&mut *conn).await?;
        Ok(result.rows_affected() == 1)
    }

    /// Pending transactions still inside their validity window.
    pub async fn list_active_pending(
        conn: &mut SqliteConnection,
        user_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<Transaction>> {
        sqlx::query_as::<_, TransactionRow>(
            "SELECT * FROM transactions
             WHERE status = 'pending'
               AND (expires_at IS NULL OR expires_at >= ?1)
               AND (?2 IS NULL OR from_user_id = ?2 OR to_user_id = ?2)
             ORDER BY created_at",
        )
        .bind(ts(&now))
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(Transaction::try_from)
        .collect()
    }

    /// Transactions a user took part in, created within `[from, to]`.
    pub async fn list_for_user(
        conn: &mut SqliteConnection,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<Transaction>> {
        sqlx::query_as::<_, TransactionRow>(
            "SELECT * FROM transactions
             WHERE (from_user_id = ?1 OR to_user_id = ?1)
               AND created_at >= ?2 AND created_at <= ?3
             ORDER BY created_at",
        )
        .bind(user_id)
        .bind(ts(&from))
        .bind(ts(&to))
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(Transaction::try_from)
        .collect()
    }

    /// Live (not rejected, not expired) transactions originated by a user
    /// within `[from, until)`.
    pub async fn originated_between(
        conn: &mut SqliteConnection,
        user_id: &str,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> StoreResult<Vec<Transaction>> {
        sqlx::query_as::<_, TransactionRow>(
            "SELECT * FROM transactions
             WHERE from_user_id = ?1
               AND created_at >= ?2 AND created_at < ?3
               AND status IN ('pending', 'approved', 'completed')
             ORDER BY created_at",
        )
        .bind(user_id)
        .bind(ts(&from))
        .bind(ts(&until))
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(Transaction::try_from)
        .collect()
    }
}

/// Optional columns written alongside a status transition
#[derive(Debug, Default, Clone, Copy)]
pub struct TransitionUpdate<'a> {
    pub processed_by: Option<&'a str>,
    pub rejection_reason: Option<&'a str>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::UserRepo;
    use crate::Store;
    use chrono::Duration;
    use lus_core::{Amount, Priority, TransactionId, TransactionType, User, UserRole};
    use rust_decimal_macros::dec;

    fn pending(from: &str, ty: TransactionType, now: DateTime<Utc>, expires_at: Option<DateTime<Utc>>) -> Transaction {
        Transaction {
            transaction_id: TransactionId::generate(None),
            from_user_id: from.into(),
            to_user_id: None,
            amount: Amount::new(dec!(100)).unwrap(),
            transaction_type: ty,
            status: TransactionStatus::Pending,
            priority: Priority::Medium,
            vmf_number: None,
            expires_at,
            rejection_reason: None,
            processed_by: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    async fn store_with_user() -> Store {
        let store = Store::in_memory().await.unwrap();
        let mut conn = store.acquire().await.unwrap();
        UserRepo::insert(&mut conn, &User::new("u-1", "Ann", UserRole::Customer), Utc::now())
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_single_pending_per_type() {
        let store = store_with_user().await;
        let mut conn = store.acquire().await.unwrap();
        let now = Utc::now();
        TransactionRepo::insert(&mut conn, &pending("u-1", TransactionType::Rtp, now, None)).await.unwrap();
        let dup = TransactionRepo::insert(&mut conn, &pending("u-1", TransactionType::Rtp, now, None)).await;
        assert!(dup.unwrap_err().is_unique_violation());
        // Different context is fine
        TransactionRepo::insert(&mut conn, &pending("u-1", TransactionType::P2pTransfer, now, None))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_expire_stale_and_listing() {
        let store = store_with_user().await;
        let mut conn = store.acquire().await.unwrap();
        let now = Utc::now();
        let stale = pending("u-1", TransactionType::Rtp, now - Duration::minutes(5), Some(now - Duration::minutes(3)));
        let fresh = pending("u-1", TransactionType::QrCodePayment, now, Some(now + Duration::minutes(2)));
        TransactionRepo::insert(&mut conn, &stale).await.unwrap();
        TransactionRepo::insert(&mut conn, &fresh).await.unwrap();

        let active = TransactionRepo::list_active_pending(&mut conn, Some("u-1"), now).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].transaction_id, fresh.transaction_id);

        let swept = TransactionRepo::expire_stale(&mut conn, now).await.unwrap();
        assert_eq!(swept, vec![stale.transaction_id.to_string()]);
        let reloaded = TransactionRepo::require(&mut conn, stale.transaction_id.as_str()).await.unwrap();
        assert_eq!(reloaded.status, TransactionStatus::Expired);
    }

    #[tokio::test]
    async fn test_transition_is_conditional() {
        let store = store_with_user().await;
        let mut conn = store.acquire().await.unwrap();
        let now = Utc::now();
        let tx = pending("u-1", TransactionType::CashOut, now, None);
        TransactionRepo::insert(&mut conn, &tx).await.unwrap();
        let id = tx.transaction_id.as_str();
        let from = [TransactionStatus::Pending, TransactionStatus::Approved];
        let update = TransitionUpdate { completed_at: Some(now), ..Default::default() };

        assert!(TransactionRepo::transition(&mut conn, id, &from, TransactionStatus::Completed, update, now).await.unwrap());
        assert!(!TransactionRepo::transition(&mut conn, id, &from, TransactionStatus::Completed, update, now).await.unwrap());
        let reloaded = TransactionRepo::require(&mut conn, id).await.unwrap();
        assert_eq!(reloaded.status, TransactionStatus::Completed);
        assert!(reloaded.completed_at.is_some());
    }
}
