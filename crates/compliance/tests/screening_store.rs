//! Screening against history held in the store, alert persistence and STR

use chrono::{DateTime, Duration, TimeZone, Utc};
use lus_compliance::{
    record_alerts, review_alert, rules, suspicious_transaction_report, ComplianceError,
    ScreeningCandidate, ScreeningConfig, ScreeningGate, StaticSanctionsList, StoreHistoryReader,
};
use lus_core::{
    AlertStatus, Amount, Priority, ScreeningDecision, Transaction, TransactionId, TransactionStatus,
    TransactionType, User, UserRole,
};
use lus_store::{AlertFilter, AlertRepo, Store, TransactionRepo, UserRepo};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 10, 9, 30, 0).unwrap()
}

fn transfer(amount: Decimal, at: DateTime<Utc>, status: TransactionStatus) -> Transaction {
    Transaction {
        transaction_id: TransactionId::generate(None),
        from_user_id: "cust-1".into(),
        to_user_id: Some("cust-2".into()),
        amount: Amount::new(amount).unwrap(),
        transaction_type: TransactionType::P2pTransfer,
        status,
        priority: Priority::Medium,
        vmf_number: None,
        expires_at: None,
        rejection_reason: None,
        processed_by: None,
        created_at: at,
        updated_at: at,
        completed_at: None,
    }
}

async fn setup(history: &[Transaction]) -> (Store, ScreeningGate) {
    let store = Store::in_memory().await.unwrap();
    {
        let mut conn = store.acquire().await.unwrap();
        UserRepo::insert(&mut conn, &User::new("cust-1", "Ann Sender", UserRole::Customer), now())
            .await
            .unwrap();
        UserRepo::insert(&mut conn, &User::new("cust-2", "Ben Receiver", UserRole::Customer), now())
            .await
            .unwrap();
        for tx in history {
            TransactionRepo::insert(&mut conn, tx).await.unwrap();
        }
    }
    let gate = ScreeningGate::new(
        ScreeningConfig::default(),
        Arc::new(StaticSanctionsList::empty()),
        Arc::new(StoreHistoryReader::new(store.clone())),
    )
    .unwrap();
    (store, gate)
}

fn candidate(amount: Decimal) -> ScreeningCandidate {
    ScreeningCandidate::new(
        User::new("cust-1", "Ann Sender", UserRole::Customer),
        Amount::new(amount).unwrap(),
        TransactionType::P2pTransfer,
        now(),
    )
    .with_counterparty(Some(User::new("cust-2", "Ben Receiver", UserRole::Customer)))
}

#[tokio::test]
async fn test_structuring_detected_from_stored_history() {
    let history: Vec<Transaction> = (1..=3)
        .map(|d| transfer(dec!(45000), now() - Duration::days(d), TransactionStatus::Completed))
        .collect();
    let (_store, gate) = setup(&history).await;

    let result = gate.screen(&candidate(dec!(25))).await.unwrap();
    assert!(result.has_rule(rules::STRUCTURING));
    assert_eq!(result.decision(), ScreeningDecision::HoldForReview);
}

#[tokio::test]
async fn test_rejected_history_does_not_count() {
    let mut history: Vec<Transaction> = (1..=2)
        .map(|d| transfer(dec!(45000), now() - Duration::days(d), TransactionStatus::Completed))
        .collect();
    history.push(transfer(dec!(45000), now() - Duration::days(3), TransactionStatus::Rejected));
    let (_store, gate) = setup(&history).await;

    let result = gate.screen(&candidate(dec!(25))).await.unwrap();
    assert!(!result.has_rule(rules::STRUCTURING));
    assert!(result.approved);
}

#[tokio::test]
async fn test_alerts_persist_and_review_once() {
    let (store, gate) = setup(&[]).await;
    let result = gate.screen(&candidate(dec!(60000))).await.unwrap();
    assert_eq!(result.decision(), ScreeningDecision::Block);

    let mut conn = store.acquire().await.unwrap();
    assert_eq!(record_alerts(&mut conn, &result).await.unwrap(), 2);
    let open = AlertRepo::list(&mut conn, &AlertFilter { status: Some(AlertStatus::Open), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(open.len(), 2);

    let id = open[0].id.clone();
    let reviewed = review_alert(&mut conn, &id, "admin-1", AlertStatus::Escalated, now()).await.unwrap();
    assert_eq!(reviewed.status, AlertStatus::Escalated);
    assert_eq!(reviewed.reviewed_by.as_deref(), Some("admin-1"));
    assert_eq!(reviewed.risk_score, open[0].risk_score);

    assert!(matches!(
        review_alert(&mut conn, &id, "admin-1", AlertStatus::Cleared, now()).await,
        Err(ComplianceError::AlertAlreadyReviewed(_))
    ));
    assert!(matches!(
        review_alert(&mut conn, "ALERT-NONE", "admin-1", AlertStatus::Cleared, now()).await,
        Err(ComplianceError::AlertNotFound(_))
    ));
}

#[tokio::test]
async fn test_str_flags_the_fourth_clustered_transfer() {
    let history: Vec<Transaction> = (1..=4)
        .map(|d| transfer(dec!(45000), now() - Duration::days(d), TransactionStatus::Completed))
        .collect();
    let (store, gate) = setup(&history).await;

    let report = suspicious_transaction_report(
        &gate,
        &store,
        "cust-1",
        now() - Duration::days(10),
        now(),
        now(),
    )
    .await
    .unwrap();

    assert_eq!(report.transactions_reviewed, 4);
    // Only the most recent transfer had three clustered predecessors
    assert_eq!(report.flagged.len(), 1);
    assert!(report.rules_triggered.contains(rules::STRUCTURING));
    assert_eq!(report.total_flagged_amount, Amount::new(dec!(45000)).unwrap());
    assert!(report.is_reportable());
}
