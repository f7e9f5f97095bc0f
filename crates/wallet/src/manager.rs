//! Wallet & limit manager
//!
//! Owns wallet balances, per-role daily counters and their reset cycle. Every
//! operation runs on a caller-supplied connection so the transaction engine can
//! compose wallet mutations with journal posting inside one database
//! transaction.

use crate::config::{LimitConfig, RolePolicy};
use crate::error::{WalletError, WalletResult};
use crate::limits::{LimitCheck, LimitViolation};
use lus_core::{Amount, Clock, User, Wallet};
use lus_store::{DailyReset, UserRepo, WalletRepo};
use sqlx::SqliteConnection;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct WalletManager {
    config: LimitConfig,
    clock: Arc<dyn Clock>,
}

impl WalletManager {
    pub fn new(config: LimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    pub fn config(&self) -> &LimitConfig {
        &self.config
    }

    pub fn policy_for(&self, user: &User) -> &RolePolicy {
        self.config.policy_for(user.role)
    }

    async fn user(&self, conn: &mut SqliteConnection, user_id: &str) -> WalletResult<User> {
        UserRepo::get(conn, user_id)
            .await?
            .ok_or_else(|| WalletError::UserNotFound(user_id.to_string()))
    }

    /// Fetch a user's wallet, creating it with a zero balance on first
    /// reference and applying the daily reset before returning it.
    pub async fn get_or_create_wallet(
        &self,
        conn: &mut SqliteConnection,
        user_id: &str,
    ) -> WalletResult<Wallet> {
        let user = self.user(conn, user_id).await?;
        self.wallet_for(conn, &user).await
    }

    /// Same as [`get_or_create_wallet`](Self::get_or_create_wallet) for an already loaded user.
    pub async fn wallet_for(&self, conn: &mut SqliteConnection, user: &User) -> WalletResult<Wallet> {
        let now = self.clock.now();
        let created = WalletRepo::insert_if_missing(
            conn,
            &user.id,
            self.config.initial_daily_limit(user.role),
            now,
        )
        .await?;
        if created {
            debug!(user_id = %user.id, role = %user.role, "wallet created");
            if self.policy_for(user).allocation_based && !self.config.default_cashier_allocation.is_zero() {
                WalletRepo::set_allocation(conn, &user.id, self.config.default_cashier_allocation, now)
                    .await?;
            }
        }
        self.check_and_reset_daily(conn, user).await?;
        Ok(WalletRepo::require(conn, &user.id).await?)
    }

    /// Zero the role's daily counters on the first access of a new calendar day.
    ///
    /// A single compare-and-set on `last_reset_date`: repeated or concurrent
    /// calls on the same day reset at most once. Returns whether this call did
    /// the reset.
    pub async fn check_and_reset_daily(
        &self,
        conn: &mut SqliteConnection,
        user: &User,
    ) -> WalletResult<bool> {
        let policy = self.policy_for(user);
        let reset = DailyReset {
            spent: policy.tracks_daily_spending,
            collected: policy.tracks_collections,
            allocation: policy.allocation_based,
        };
        let today = self.clock.today();
        let did_reset = WalletRepo::reset_daily(conn, &user.id, reset, today, self.clock.now()).await?;
        if did_reset {
            info!(user_id = %user.id, %today, "daily counters reset");
        }
        Ok(did_reset)
    }

    /// Evaluate, without mutating anything, whether `user_id` may send `amount`.
    ///
    /// Rules in order: wallet active, balance covers the amount, and for roles
    /// that track spending the daily cap is not exceeded.
    pub async fn check_transfer_limits(
        &self,
        conn: &mut SqliteConnection,
        user_id: &str,
        amount: Amount,
    ) -> WalletResult<LimitCheck> {
        let user = self.user(conn, user_id).await?;
        let wallet = self.wallet_for(conn, &user).await?;
        Ok(self.evaluate(&user, &wallet, amount))
    }

    fn evaluate(&self, user: &User, wallet: &Wallet, amount: Amount) -> LimitCheck {
        if !wallet.is_active {
            return LimitCheck::denied(LimitViolation::WalletInactive);
        }
        if amount > wallet.balance {
            return LimitCheck::denied(LimitViolation::insufficient_balance(wallet.balance, amount));
        }
        let policy = self.policy_for(user);
        if policy.tracks_daily_spending {
            if let Some(limit) = wallet.daily_limit {
                let exceeds = wallet
                    .daily_spent
                    .checked_add(&amount)
                    .map_or(true, |total| total > limit);
                if exceeds {
                    return LimitCheck::denied(LimitViolation::daily_limit_exceeded(
                        limit,
                        wallet.daily_spent,
                        amount,
                    ));
                }
            }
        }
        LimitCheck::allowed()
    }

    /// Replace a cashier's float with `allocation`; the balance becomes the allocation.
    pub async fn set_cashier_daily_allocation(
        &self,
        conn: &mut SqliteConnection,
        user_id: &str,
        allocation: Amount,
    ) -> WalletResult<Wallet> {
        let user = self.user(conn, user_id).await?;
        self.require_allocation_based(&user)?;
        self.wallet_for(conn, &user).await?;
        WalletRepo::set_allocation(conn, &user.id, allocation, self.clock.now()).await?;
        info!(user_id = %user.id, %allocation, "cashier allocation set");
        Ok(WalletRepo::require(conn, &user.id).await?)
    }

    /// Whether a cashier's remaining float covers `amount`.
    pub async fn check_cashier_balance(
        &self,
        conn: &mut SqliteConnection,
        user_id: &str,
        amount: Amount,
    ) -> WalletResult<LimitCheck> {
        let user = self.user(conn, user_id).await?;
        self.require_allocation_based(&user)?;
        let wallet = self.wallet_for(conn, &user).await?;
        Ok(self.evaluate(&user, &wallet, amount))
    }

    fn require_allocation_based(&self, user: &User) -> WalletResult<()> {
        if self.policy_for(user).allocation_based {
            Ok(())
        } else {
            Err(WalletError::NotAllocationBased {
                user_id: user.id.clone(),
                role: user.role,
            })
        }
    }

    /// Debit a finalized movement, counting it against the daily cap when the
    /// role tracks spending.
    ///
    /// The balance and limit checks are part of the `UPDATE` itself, so a
    /// concurrent debit can never overdraw the wallet. On refusal the wallet is
    /// re-read to report the precise violation.
    pub async fn apply_debit(
        &self,
        conn: &mut SqliteConnection,
        user: &User,
        amount: Amount,
    ) -> WalletResult<()> {
        self.wallet_for(conn, user).await?;
        let track_spent = self.policy_for(user).tracks_daily_spending;
        let now = self.clock.now();
        if WalletRepo::debit(conn, &user.id, amount, track_spent, now).await? {
            debug!(user_id = %user.id, %amount, "wallet debited");
            return Ok(());
        }
        let wallet = WalletRepo::require(conn, &user.id).await?;
        let violation = self
            .evaluate(user, &wallet, amount)
            .reason
            .unwrap_or_else(|| LimitViolation::insufficient_balance(wallet.balance, amount));
        Err(WalletError::Limit(violation))
    }

    /// Credit a finalized movement, counting it as collected when the role
    /// tracks collections. Refused only for inactive wallets.
    pub async fn apply_credit(
        &self,
        conn: &mut SqliteConnection,
        user: &User,
        amount: Amount,
    ) -> WalletResult<()> {
        self.wallet_for(conn, user).await?;
        let track_collected = self.policy_for(user).tracks_collections;
        if WalletRepo::credit(conn, &user.id, amount, track_collected, self.clock.now()).await? {
            debug!(user_id = %user.id, %amount, "wallet credited");
            Ok(())
        } else {
            Err(WalletError::Limit(LimitViolation::WalletInactive))
        }
    }

    /// Return a previously debited amount, unwinding the spent counter too.
    pub async fn refund(
        &self,
        conn: &mut SqliteConnection,
        user: &User,
        amount: Amount,
    ) -> WalletResult<()> {
        let untrack = self.policy_for(user).tracks_daily_spending;
        WalletRepo::refund(conn, &user.id, amount, untrack, self.clock.now()).await?;
        info!(user_id = %user.id, %amount, "wallet refunded");
        Ok(())
    }

    /// Administrative freeze/unfreeze
    pub async fn set_wallet_active(
        &self,
        conn: &mut SqliteConnection,
        user_id: &str,
        active: bool,
    ) -> WalletResult<Wallet> {
        let user = self.user(conn, user_id).await?;
        self.wallet_for(conn, &user).await?;
        WalletRepo::set_active(conn, &user.id, active, self.clock.now()).await?;
        info!(user_id = %user.id, active, "wallet status changed");
        Ok(WalletRepo::require(conn, &user.id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use lus_core::{ManualClock, UserRole};
    use lus_store::Store;
    use rust_decimal_macros::dec;

    fn amt(v: rust_decimal::Decimal) -> Amount {
        Amount::new(v).unwrap()
    }

    async fn setup() -> (Store, WalletManager, ManualClock) {
        let store = Store::in_memory().await.unwrap();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap());
        let manager = WalletManager::new(LimitConfig::default(), Arc::new(clock.clone()));
        let mut conn = store.acquire().await.unwrap();
        for user in [
            User::new("cust-1", "Ann", UserRole::Customer),
            User::new("merch-1", "Mo", UserRole::Merchant),
            User::new("cash-1", "Cy", UserRole::Cashier),
        ] {
            UserRepo::insert(&mut conn, &user, clock.now()).await.unwrap();
        }
        (store, manager, clock)
    }

    #[tokio::test]
    async fn test_lazy_creation() {
        let (store, manager, _) = setup().await;
        let mut conn = store.acquire().await.unwrap();
        let wallet = manager.get_or_create_wallet(&mut conn, "cust-1").await.unwrap();
        assert!(wallet.balance.is_zero());
        assert_eq!(wallet.daily_limit, Some(amt(dec!(50000))));
        assert!(matches!(
            manager.get_or_create_wallet(&mut conn, "ghost").await,
            Err(WalletError::UserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_limit_rules_in_order() {
        let (store, manager, _) = setup().await;
        let mut conn = store.acquire().await.unwrap();
        let customer = UserRepo::require(&mut conn, "cust-1").await.unwrap();
        manager.apply_credit(&mut conn, &customer, amt(dec!(60000))).await.unwrap();

        let check = manager.check_transfer_limits(&mut conn, "cust-1", amt(dec!(70000))).await.unwrap();
        assert_eq!(check.reason.map(|r| r.code()), Some("INSUFFICIENT_BALANCE"));

        let check = manager.check_transfer_limits(&mut conn, "cust-1", amt(dec!(50000.01))).await.unwrap();
        assert_eq!(check.reason.map(|r| r.code()), Some("DAILY_LIMIT_EXCEEDED"));

        let check = manager.check_transfer_limits(&mut conn, "cust-1", amt(dec!(50000))).await.unwrap();
        assert!(check.allowed);

        manager.set_wallet_active(&mut conn, "cust-1", false).await.unwrap();
        let check = manager.check_transfer_limits(&mut conn, "cust-1", amt(dec!(1))).await.unwrap();
        assert_eq!(check.reason, Some(LimitViolation::WalletInactive));
    }

    #[tokio::test]
    async fn test_debit_tracks_spending_and_refuses_overdraft() {
        let (store, manager, _) = setup().await;
        let mut conn = store.acquire().await.unwrap();
        let customer = UserRepo::require(&mut conn, "cust-1").await.unwrap();
        manager.apply_credit(&mut conn, &customer, amt(dec!(100))).await.unwrap();

        manager.apply_debit(&mut conn, &customer, amt(dec!(60))).await.unwrap();
        let err = manager.apply_debit(&mut conn, &customer, amt(dec!(50))).await.unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_BALANCE");

        let wallet = manager.get_or_create_wallet(&mut conn, "cust-1").await.unwrap();
        assert_eq!(wallet.balance, amt(dec!(40)));
        assert_eq!(wallet.daily_spent, amt(dec!(60)));
    }

    #[tokio::test]
    async fn test_daily_reset_once_per_day() {
        let (store, manager, clock) = setup().await;
        let mut conn = store.acquire().await.unwrap();
        let merchant = UserRepo::require(&mut conn, "merch-1").await.unwrap();
        manager.apply_credit(&mut conn, &merchant, amt(dec!(250))).await.unwrap();
        assert!(!manager.check_and_reset_daily(&mut conn, &merchant).await.unwrap());

        clock.advance(Duration::days(1));
        assert!(manager.check_and_reset_daily(&mut conn, &merchant).await.unwrap());
        for _ in 0..3 {
            assert!(!manager.check_and_reset_daily(&mut conn, &merchant).await.unwrap());
        }
        let wallet = manager.get_or_create_wallet(&mut conn, "merch-1").await.unwrap();
        assert!(wallet.daily_collected.is_zero());
        // Collections reset, balance does not
        assert_eq!(wallet.balance, amt(dec!(250)));
    }

    #[tokio::test]
    async fn test_cashier_allocation_replaces_balance_daily() {
        let (store, manager, clock) = setup().await;
        let mut conn = store.acquire().await.unwrap();
        let wallet = manager
            .set_cashier_daily_allocation(&mut conn, "cash-1", amt(dec!(20000)))
            .await
            .unwrap();
        assert_eq!(wallet.balance, amt(dec!(20000)));

        let cashier = UserRepo::require(&mut conn, "cash-1").await.unwrap();
        manager.apply_debit(&mut conn, &cashier, amt(dec!(15000))).await.unwrap();
        let check = manager.check_cashier_balance(&mut conn, "cash-1", amt(dec!(6000))).await.unwrap();
        assert!(!check.allowed);

        clock.advance(Duration::days(1));
        let check = manager.check_cashier_balance(&mut conn, "cash-1", amt(dec!(6000))).await.unwrap();
        assert!(check.allowed);

        assert!(matches!(
            manager.check_cashier_balance(&mut conn, "cust-1", amt(dec!(1))).await,
            Err(WalletError::NotAllocationBased { .. })
        ));
    }
}
