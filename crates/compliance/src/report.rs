//! Suspicious Transaction Report generation
//!
//! Re-screens a subject's transactions over a period as they looked at the
//! time they were made, without persisting anything, and merges in the
//! alerts already on file.

use crate::error::{ComplianceError, ComplianceResult};
use crate::gate::{ScreeningCandidate, ScreeningGate};
use chrono::{DateTime, Utc};
use lus_core::{Amount, ComplianceAlert, ScreeningDecision, Transaction, User};
use lus_store::{AlertRepo, Store, TransactionRepo, UserRepo};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::info;

/// A transaction that would not have been auto-approved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlaggedTransaction {
    pub transaction: Transaction,
    pub risk_score: u32,
    pub decision: ScreeningDecision,
    pub rules: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuspiciousActivityReport {
    pub subject: User,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub transactions_reviewed: usize,
    pub flagged: Vec<FlaggedTransaction>,
    pub stored_alerts: Vec<ComplianceAlert>,
    pub rules_triggered: BTreeSet<String>,
    pub total_flagged_amount: Amount,
    pub highest_risk_score: u32,
    pub narrative: String,
    pub generated_at: DateTime<Utc>,
}

impl SuspiciousActivityReport {
    pub fn is_reportable(&self) -> bool {
        !self.flagged.is_empty() || !self.stored_alerts.is_empty()
    }
}

pub async fn suspicious_transaction_report(
    gate: &ScreeningGate,
    store: &Store,
    user_id: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    generated_at: DateTime<Utc>,
) -> ComplianceResult<SuspiciousActivityReport> {
    if from > to {
        return Err(ComplianceError::InvalidPeriod(format!("{from} is after {to}")));
    }

    // Load everything first; screening reads history through its own connection.
    let (subject, transactions, counterparties, stored_alerts) = {
        let mut conn = store.acquire().await?;
        let subject = UserRepo::get(&mut conn, user_id)
            .await?
            .ok_or_else(|| ComplianceError::UserNotFound(user_id.to_string()))?;
        let transactions: Vec<Transaction> = TransactionRepo::list_for_user(&mut conn, user_id, from, to)
            .await?
            .into_iter()
            .filter(|tx| tx.from_user_id == user_id)
            .collect();
        let mut counterparties = Vec::with_capacity(transactions.len());
        for tx in &transactions {
            let counterparty = match &tx.to_user_id {
                Some(id) => UserRepo::get(&mut conn, id).await?,
                None => None,
            };
            counterparties.push(counterparty);
        }
        let stored_alerts = AlertRepo::for_user_between(&mut conn, user_id, from, to).await?;
        (subject, transactions, counterparties, stored_alerts)
    };

    let mut flagged = Vec::new();
    for (tx, counterparty) in transactions.iter().zip(counterparties) {
        let candidate = ScreeningCandidate::new(subject.clone(), tx.amount, tx.transaction_type, tx.created_at)
            .with_counterparty(counterparty)
            .with_transaction_id(tx.transaction_id.as_str());
        let result = gate.screen(&candidate).await?;
        if !result.approved {
            flagged.push(FlaggedTransaction {
                transaction: tx.clone(),
                risk_score: result.risk_score,
                decision: result.decision(),
                rules: result.triggered_rules(),
            });
        }
    }

    let mut rules_triggered: BTreeSet<String> = flagged.iter().flat_map(|f| f.rules.iter().cloned()).collect();
    rules_triggered.extend(stored_alerts.iter().flat_map(|a| a.triggered_rules.iter().cloned()));
    let total_flagged_amount: Amount = flagged.iter().map(|f| f.transaction.amount).sum();
    let highest_risk_score = flagged
        .iter()
        .map(|f| f.risk_score)
        .chain(stored_alerts.iter().map(|a| a.risk_score))
        .max()
        .unwrap_or(0);

    let narrative = if flagged.is_empty() && stored_alerts.is_empty() {
        format!(
            "No suspicious activity found for {} across {} transactions between {} and {}.",
            subject.full_name,
            transactions.len(),
            from.date_naive(),
            to.date_naive()
        )
    } else {
        format!(
            "{} of {} transactions by {} between {} and {} were not auto-approved, totalling {}. \
             {} alerts on file. Rules: {}. Highest risk score {}.",
            flagged.len(),
            transactions.len(),
            subject.full_name,
            from.date_naive(),
            to.date_naive(),
            total_flagged_amount,
            stored_alerts.len(),
            rules_triggered.iter().cloned().collect::<Vec<_>>().join(", "),
            highest_risk_score
        )
    };

    info!(
        user_id,
        flagged = flagged.len(),
        alerts = stored_alerts.len(),
        "suspicious transaction report generated"
    );

    Ok(SuspiciousActivityReport {
        subject,
        period_start: from,
        period_end: to,
        transactions_reviewed: transactions.len(),
        flagged,
        stored_alerts,
        rules_triggered,
        total_flagged_amount,
        highest_risk_score,
        narrative,
        generated_at,
    })
}
