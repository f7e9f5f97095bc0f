//! Wallet persistence
//!
//! Every mutation is a single conditional `UPDATE`; the `WHERE` clause carries
//! the precondition so concurrent callers can never both succeed against the
//! same stale read.

use crate::codec::{day, ts};
use crate::error::{StoreError, StoreResult};
use crate::rows::WalletRow;
use chrono::{DateTime, NaiveDate, Utc};
use lus_core::{Amount, Wallet};
use sqlx::SqliteConnection;

/// Which counters a daily reset touches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DailyReset {
    pub spent: bool,
    pub collected: bool,
    /// Replace the balance with the daily allocation
    pub allocation: bool,
}

impl DailyReset {
    pub fn is_noop(&self) -> bool {
        !(self.spent || self.collected || self.allocation)
    }
}

pub struct WalletRepo;

impl WalletRepo {
    /// Create the wallet if missing. Returns `true` when a row was inserted.
    pub async fn insert_if_missing(
        conn: &mut SqliteConnection,
        user_id: &str,
        daily_limit: Option<Amount>,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let limit = daily_limit.map(|l| l.to_cents()).transpose()?;
        let result = sqlx::query(
            "INSERT OR IGNORE INTO wallets
                (user_id, daily_limit_cents, last_reset_date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
        )
        .bind(user_id)
        .bind(limit)
        .bind(day(&now.date_naive()))
        .bind(ts(&now))
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn get(conn: &mut SqliteConnection, user_id: &str) -> StoreResult<Option<Wallet>> {
        sqlx::query_as::<_, WalletRow>("SELECT * FROM wallets WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?
            .map(Wallet::try_from)
            .transpose()
    }

    pub async fn require(conn: &mut SqliteConnection, user_id: &str) -> StoreResult<Wallet> {
        Self::get(conn, user_id)
            .await?
            .ok_or_else(|| StoreError::not_found("Wallet", user_id))
    }

    /// Compare-and-set daily reset keyed on `last_reset_date`.
    ///
    /// Returns `true` for the single caller that performed the reset.
    pub async fn reset_daily(
        conn: &mut SqliteConnection,
        user_id: &str,
        reset: DailyReset,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        if reset.is_noop() {
            return Ok(false);
        }
        let result = sqlx::query(
            "UPDATE wallets SET
                daily_spent_cents = CASE WHEN ?2 THEN 0 ELSE daily_spent_cents END,
                daily_collected_cents = CASE WHEN ?3 THEN 0 ELSE daily_collected_cents END,
                balance_cents = CASE WHEN ?4 THEN daily_allocation_cents ELSE balance_cents END,
                last_reset_date = ?5,
                updated_at = ?6
             WHERE user_id = ?1 AND last_reset_date < ?5",
        )
        .bind(user_id)
        .bind(reset.spent)
        .bind(reset.collected)
        .bind(reset.allocation)
        .bind(day(&today))
        .bind(ts(&now))
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Debit `amount` if the wallet is active, funded, and (when `track_spent`)
    /// within its daily limit. Returns `false` without changes otherwise.
    pub async fn debit(
        conn: &mut SqliteConnection,
        user_id: &str,
        amount: Amount,
        track_spent: bool,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE wallets SET
                balance_cents = balance_cents - ?2,
                daily_spent_cents = daily_spent_cents + CASE WHEN ?3 THEN ?2 ELSE 0 END,
                updated_at = ?4
             WHERE user_id = ?1
               AND is_active = 1
               AND balance_cents >= ?2
               AND (NOT ?3 OR daily_limit_cents IS NULL OR daily_spent_cents + ?2 <= daily_limit_cents)",
        )
        .bind(user_id)
        .bind(amount.to_cents()?)
        .bind(track_spent)
        .bind(ts(&now))
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Credit `amount` to an active wallet, optionally counting it as collected.
    pub async fn credit(
        conn: &mut SqliteConnection,
        user_id: &str,
        amount: Amount,
        track_collected: bool,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE wallets SET
                balance_cents = balance_cents + ?2,
                daily_collected_cents = daily_collected_cents + CASE WHEN ?3 THEN ?2 ELSE 0 END,
                updated_at = ?4
             WHERE user_id = ?1 AND is_active = 1",
        )
        .bind(user_id)
        .bind(amount.to_cents()?)
        .bind(track_collected)
        .bind(ts(&now))
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Undo a debit, including the spent counter when it was tracked.
    pub async fn refund(
        conn: &mut SqliteConnection,
        user_id: &str,
        amount: Amount,
        untrack_spent: bool,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE wallets SET
                balance_cents = balance_cents + ?2,
                daily_spent_cents = CASE WHEN ?3 THEN MAX(daily_spent_cents - ?2, 0)
                                         ELSE daily_spent_cents END,
                updated_at = ?4
             WHERE user_id = ?1",
        )
        .bind(user_id)
        .bind(amount.to_cents()?)
        .bind(untrack_spent)
        .bind(ts(&now))
        .execute(&mut *conn)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Wallet", user_id));
        }
        Ok(())
    }

    /// Set a cashier's allocation; the balance becomes the allocation.
    pub async fn set_allocation(
        conn: &mut SqliteConnection,
        user_id: &str,
        allocation: Amount,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE wallets SET
                daily_allocation_cents = ?2,
                balance_cents = ?2,
                last_reset_date = ?3,
                updated_at = ?4
             WHERE user_id = ?1",
        )
        .bind(user_id)
        .bind(allocation.to_cents()?)
        .bind(day(&now.date_naive()))
        .bind(ts(&now))
        .execute(&mut *conn)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Wallet", user_id));
        }
        Ok(())
    }

    pub async fn set_active(
        conn: &mut SqliteConnection,
        user_id: &str,
        active: bool,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let result = sqlx::query("UPDATE wallets SET is_active = ?2, updated_at = ?3 WHERE user_id = ?1")
            .bind(user_id)
            .bind(active)
            .bind(ts(&now))
            .execute(&mut *conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Wallet", user_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::UserRepo;
    use crate::Store;
    use chrono::Duration;
    use lus_core::{User, UserRole};
    use rust_decimal_macros::dec;

    async fn setup() -> (Store, DateTime<Utc>) {
        let store = Store::in_memory().await.unwrap();
        let now = Utc::now();
        let mut conn = store.acquire().await.unwrap();
        UserRepo::insert(&mut conn, &User::new("u-1", "Ann", UserRole::Customer), now)
            .await
            .unwrap();
        WalletRepo::insert_if_missing(&mut conn, "u-1", Some(Amount::new(dec!(100)).unwrap()), now)
            .await
            .unwrap();
        (store, now)
    }

    #[tokio::test]
    async fn test_insert_is_idempotent() {
        let (store, now) = setup().await;
        let mut conn = store.acquire().await.unwrap();
        assert!(!WalletRepo::insert_if_missing(&mut conn, "u-1", None, now).await.unwrap());
        let wallet = WalletRepo::require(&mut conn, "u-1").await.unwrap();
        assert_eq!(wallet.daily_limit, Some(Amount::new(dec!(100)).unwrap()));
        assert!(wallet.balance.is_zero());
    }

    #[tokio::test]
    async fn test_debit_respects_balance_and_limit() {
        let (store, now) = setup().await;
        let mut conn = store.acquire().await.unwrap();
        let amt = |v| Amount::new(v).unwrap();

        WalletRepo::credit(&mut conn, "u-1", amt(dec!(500)), false, now).await.unwrap();
        assert!(!WalletRepo::debit(&mut conn, "u-1", amt(dec!(600)), false, now).await.unwrap());
        assert!(WalletRepo::debit(&mut conn, "u-1", amt(dec!(80)), true, now).await.unwrap());
        // 80 + 30 > 100 daily limit
        assert!(!WalletRepo::debit(&mut conn, "u-1", amt(dec!(30)), true, now).await.unwrap());

        let wallet = WalletRepo::require(&mut conn, "u-1").await.unwrap();
        assert_eq!(wallet.balance, amt(dec!(420)));
        assert_eq!(wallet.daily_spent, amt(dec!(80)));
    }

    #[tokio::test]
    async fn test_reset_once_per_day() {
        let (store, now) = setup().await;
        let mut conn = store.acquire().await.unwrap();
        let reset = DailyReset { spent: true, ..Default::default() };
        let today = now.date_naive();
        assert!(!WalletRepo::reset_daily(&mut conn, "u-1", reset, today, now).await.unwrap());

        let tomorrow = now + Duration::days(1);
        assert!(WalletRepo::reset_daily(&mut conn, "u-1", reset, tomorrow.date_naive(), tomorrow).await.unwrap());
        assert!(!WalletRepo::reset_daily(&mut conn, "u-1", reset, tomorrow.date_naive(), tomorrow).await.unwrap());
    }

    #[tokio::test]
    async fn test_inactive_wallet_rejects_movements() {
        let (store, now) = setup().await;
        let mut conn = store.acquire().await.unwrap();
        WalletRepo::set_active(&mut conn, "u-1", false, now).await.unwrap();
        assert!(!WalletRepo::credit(&mut conn, "u-1", Amount::new(dec!(1)).unwrap(), false, now).await.unwrap());
    }
}
