//! Wallet behaviour under concurrent callers on a file-backed database

use chrono::{Duration, TimeZone, Utc};
use lus_core::{Amount, Clock, ManualClock, User, UserRole};
use lus_store::{Store, UserRepo};
use lus_wallet::{LimitConfig, WalletManager};
use rust_decimal_macros::dec;
use std::sync::Arc;
use tempfile::TempDir;

async fn setup(dir: &TempDir) -> (Store, WalletManager, ManualClock) {
    let store = Store::open(dir.path().join("wallets.db")).await.unwrap();
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 30, 23, 59, 0).unwrap());
    let manager = WalletManager::new(LimitConfig::default(), Arc::new(clock.clone()));
    let mut conn = store.acquire().await.unwrap();
    let user = User::new("cust-1", "Ann", UserRole::Customer);
    UserRepo::insert(&mut conn, &user, clock.now()).await.unwrap();
    manager
        .apply_credit(&mut conn, &user, Amount::new(dec!(100)).unwrap())
        .await
        .unwrap();
    (store, manager, clock)
}

#[tokio::test]
async fn test_concurrent_reset_happens_exactly_once() {
    let dir = TempDir::new().unwrap();
    let (store, manager, clock) = setup(&dir).await;
    clock.advance(Duration::minutes(2));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = store.clone();
        let manager = manager.clone();
        handles.push(tokio::spawn(async move {
            let mut conn = store.acquire().await.unwrap();
            let user = UserRepo::require(&mut conn, "cust-1").await.unwrap();
            manager.check_and_reset_daily(&mut conn, &user).await.unwrap()
        }));
    }

    let mut resets = 0;
    for handle in handles {
        if handle.await.unwrap() {
            resets += 1;
        }
    }
    assert_eq!(resets, 1);
}

#[tokio::test]
async fn test_concurrent_debits_never_overdraw() {
    let dir = TempDir::new().unwrap();
    let (store, manager, _clock) = setup(&dir).await;

    let mut handles = Vec::new();
    for _ in 0..6 {
        let store = store.clone();
        let manager = manager.clone();
        handles.push(tokio::spawn(async move {
            let mut conn = store.acquire().await.unwrap();
            let user = UserRepo::require(&mut conn, "cust-1").await.unwrap();
            manager
                .apply_debit(&mut conn, &user, Amount::new(dec!(30)).unwrap())
                .await
                .is_ok()
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        if handle.await.unwrap() {
            succeeded += 1;
        }
    }
    assert_eq!(succeeded, 3);

    let mut conn = store.acquire().await.unwrap();
    let wallet = manager.get_or_create_wallet(&mut conn, "cust-1").await.unwrap();
    assert_eq!(wallet.balance, Amount::new(dec!(10)).unwrap());
    assert_eq!(wallet.daily_spent, Amount::new(dec!(90)).unwrap());
}
