//! Compliance screening gate
//!
//! Additive risk scoring: every rule is evaluated and every applicable alert
//! is surfaced, then the total score and alert severities decide between
//! approve, hold-for-review and block.

use crate::config::{FailPolicy, ScreeningConfig};
use crate::error::{ComplianceError, ComplianceResult};
use crate::ports::{SanctionsChecker, TransactionHistoryReader};
use chrono::{DateTime, Utc};
use lus_core::{
    AlertSeverity, AlertStatus, AlertType, Amount, ComplianceAlert, ScreeningDecision, Transaction,
    TransactionType, User,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub mod rules {
    pub const LARGE_AMOUNT: &str = "large_amount";
    pub const SANCTIONS_MATCH: &str = "sanctions_match";
    pub const SANCTIONS_UNAVAILABLE: &str = "sanctions_unavailable";
    pub const PEP_COUNTERPARTY: &str = "pep_counterparty";
    pub const HIGH_RISK_JURISDICTION: &str = "high_risk_jurisdiction";
    pub const HIGH_FREQUENCY: &str = "high_frequency";
    pub const ROUND_AMOUNT: &str = "round_amount";
    pub const STRUCTURING: &str = "structuring";
}

/// A money movement submitted for screening
#[derive(Debug, Clone)]
pub struct ScreeningCandidate {
    pub originator: User,
    pub counterparty: Option<User>,
    pub amount: Amount,
    pub transaction_type: TransactionType,
    pub transaction_id: Option<String>,
    pub settlement_id: Option<String>,
    /// Instant the movement is evaluated at; history is read strictly before it
    pub occurred_at: DateTime<Utc>,
}

impl ScreeningCandidate {
    pub fn new(originator: User, amount: Amount, transaction_type: TransactionType, occurred_at: DateTime<Utc>) -> Self {
        Self {
            originator,
            counterparty: None,
            amount,
            transaction_type,
            transaction_id: None,
            settlement_id: None,
            occurred_at,
        }
    }

    pub fn with_counterparty(mut self, counterparty: Option<User>) -> Self {
        self.counterparty = counterparty;
        self
    }

    pub fn with_transaction_id(mut self, id: impl Into<String>) -> Self {
        self.transaction_id = Some(id.into());
        self
    }

    pub fn with_settlement_id(mut self, id: impl Into<String>) -> Self {
        self.settlement_id = Some(id.into());
        self
    }

    /// Party whose jurisdiction is assessed
    fn beneficiary(&self) -> &User {
        self.counterparty.as_ref().unwrap_or(&self.originator)
    }
}

/// Outcome of screening one candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningResult {
    pub approved: bool,
    pub risk_score: u32,
    pub alerts: Vec<ComplianceAlert>,
    pub requires_manual_review: bool,
}

impl ScreeningResult {
    pub fn decision(&self) -> ScreeningDecision {
        if self.approved {
            ScreeningDecision::Approve
        } else if self.requires_manual_review {
            ScreeningDecision::HoldForReview
        } else {
            ScreeningDecision::Block
        }
    }

    pub fn triggered_rules(&self) -> Vec<String> {
        let mut rules: Vec<String> = Vec::new();
        for rule in self.alerts.iter().flat_map(|a| a.triggered_rules.iter()) {
            if !rules.contains(rule) {
                rules.push(rule.clone());
            }
        }
        rules
    }

    pub fn has_rule(&self, rule: &str) -> bool {
        self.alerts
            .iter()
            .any(|a| a.triggered_rules.iter().any(|r| r == rule))
    }
}

/// One triggered rule before it becomes an alert
#[derive(Debug)]
struct RuleHit {
    rule: &'static str,
    alert_type: AlertType,
    severity: AlertSeverity,
    score: u32,
    description: String,
}

pub struct ScreeningGate {
    config: ScreeningConfig,
    sanctions: Arc<dyn SanctionsChecker>,
    history: Arc<dyn TransactionHistoryReader>,
}

impl ScreeningGate {
    pub fn new(
        config: ScreeningConfig,
        sanctions: Arc<dyn SanctionsChecker>,
        history: Arc<dyn TransactionHistoryReader>,
    ) -> ComplianceResult<Self> {
        config.validate().map_err(ComplianceError::ConfigError)?;
        Ok(Self {
            config,
            sanctions,
            history,
        })
    }

    pub fn config(&self) -> &ScreeningConfig {
        &self.config
    }

    /// Score a candidate against every rule. Nothing is persisted here.
    pub async fn screen(&self, candidate: &ScreeningCandidate) -> ComplianceResult<ScreeningResult> {
        let mut hits = Vec::new();

        self.check_amount(candidate, &mut hits);
        self.check_sanctions(candidate, &mut hits).await;
        self.check_pep(candidate, &mut hits);
        self.check_geography(candidate, &mut hits);

        let since = candidate.occurred_at - self.config.lookback();
        let history: Vec<Transaction> = self
            .history
            .originated_between(&candidate.originator.id, since, candidate.occurred_at)
            .await?
            .into_iter()
            .filter(|tx| Some(tx.transaction_id.as_str()) != candidate.transaction_id.as_deref())
            .collect();
        self.check_patterns(candidate, &history, &mut hits);

        let risk_score: u32 = hits.iter().map(|h| h.score).sum();
        let any_critical = hits.iter().any(|h| h.severity == AlertSeverity::Critical);
        let requires_manual_review = risk_score >= self.config.manual_review_at || any_critical;
        let approved = risk_score < self.config.auto_approve_below && !requires_manual_review;

        let mut result = ScreeningResult {
            approved,
            risk_score,
            alerts: Vec::with_capacity(hits.len()),
            requires_manual_review,
        };
        let decision = result.decision();
        let all_rules: Vec<String> = hits.iter().map(|h| h.rule.to_string()).collect();
        result.alerts = hits
            .into_iter()
            .map(|hit| self.to_alert(candidate, hit, risk_score, &all_rules, decision))
            .collect();

        match decision {
            ScreeningDecision::Approve => debug!(
                user_id = %candidate.originator.id,
                amount = %candidate.amount,
                risk_score,
                "screening approved"
            ),
            _ => info!(
                user_id = %candidate.originator.id,
                amount = %candidate.amount,
                risk_score,
                ?decision,
                rules = ?all_rules,
                "screening flagged"
            ),
        }
        Ok(result)
    }

    fn to_alert(
        &self,
        candidate: &ScreeningCandidate,
        hit: RuleHit,
        risk_score: u32,
        all_rules: &[String],
        decision: ScreeningDecision,
    ) -> ComplianceAlert {
        // Own rule first, then the other rules of the same screening for context
        let mut triggered_rules = vec![hit.rule.to_string()];
        triggered_rules.extend(all_rules.iter().filter(|r| r.as_str() != hit.rule).cloned());
        ComplianceAlert {
            id: format!("ALERT-{}", uuid::Uuid::new_v4().simple()).to_uppercase(),
            alert_type: hit.alert_type,
            severity: hit.severity,
            risk_score,
            triggered_rules,
            description: hit.description,
            user_id: candidate.originator.id.clone(),
            transaction_id: candidate.transaction_id.clone(),
            settlement_id: candidate.settlement_id.clone(),
            decision,
            status: AlertStatus::Open,
            reviewed_by: None,
            reviewed_at: None,
            created_at: candidate.occurred_at,
        }
    }

    fn check_amount(&self, candidate: &ScreeningCandidate, hits: &mut Vec<RuleHit>) {
        if candidate.amount < self.config.single_tx_threshold {
            return;
        }
        let (score, severity) = if candidate.transaction_type.is_cash_intensive() {
            (self.config.cash_intensive_threshold_score, AlertSeverity::High)
        } else {
            (self.config.large_amount_score, AlertSeverity::Medium)
        };
        hits.push(RuleHit {
            rule: rules::LARGE_AMOUNT,
            alert_type: AlertType::Aml,
            severity,
            score,
            description: format!(
                "{} of {} at or above the {} reporting threshold",
                candidate.transaction_type, candidate.amount, self.config.single_tx_threshold
            ),
        });
    }

    async fn check_sanctions(&self, candidate: &ScreeningCandidate, hits: &mut Vec<RuleHit>) {
        let mut names = vec![candidate.originator.full_name.as_str()];
        if let Some(counterparty) = &candidate.counterparty {
            names.push(counterparty.full_name.as_str());
        }

        for name in names {
            let lookup = tokio::time::timeout(self.config.external_timeout(), self.sanctions.check_name(name)).await;
            let outcome = match lookup {
                Ok(result) => result,
                Err(_) => Err(ComplianceError::ExternalServiceTimeout(self.config.external_timeout_ms)),
            };
            match outcome {
                Ok(Some(hit)) => hits.push(RuleHit {
                    rule: rules::SANCTIONS_MATCH,
                    alert_type: AlertType::Sanctions,
                    severity: AlertSeverity::Critical,
                    score: self.config.sanctions_score,
                    description: format!(
                        "'{}' matches sanctioned name '{}' (similarity {:.2})",
                        hit.screened_name, hit.listed_name, hit.similarity
                    ),
                }),
                Ok(None) => {}
                Err(err) => {
                    warn!(name, error = %err, policy = ?self.config.fail_policy, "sanctions lookup failed");
                    let (severity, score) = match self.config.fail_policy {
                        FailPolicy::FailClosed => (AlertSeverity::Critical, self.config.sanctions_score),
                        FailPolicy::FailOpen => (AlertSeverity::Low, 0),
                    };
                    hits.push(RuleHit {
                        rule: rules::SANCTIONS_UNAVAILABLE,
                        alert_type: AlertType::Sanctions,
                        severity,
                        score,
                        description: format!("sanctions screening unavailable for '{name}': {err}"),
                    });
                }
            }
        }
    }

    fn check_pep(&self, candidate: &ScreeningCandidate, hits: &mut Vec<RuleHit>) {
        if let Some(counterparty) = candidate.counterparty.as_ref().filter(|c| c.is_pep) {
            hits.push(RuleHit {
                rule: rules::PEP_COUNTERPARTY,
                alert_type: AlertType::Pep,
                severity: AlertSeverity::Medium,
                score: self.config.pep_score,
                description: format!("counterparty {} is a politically exposed person", counterparty.id),
            });
        }
    }

    fn check_geography(&self, candidate: &ScreeningCandidate, hits: &mut Vec<RuleHit>) {
        let beneficiary = candidate.beneficiary();
        if let Some(country) = beneficiary
            .country
            .as_deref()
            .filter(|c| self.config.is_high_risk_country(c))
        {
            hits.push(RuleHit {
                rule: rules::HIGH_RISK_JURISDICTION,
                alert_type: AlertType::Aml,
                severity: AlertSeverity::Medium,
                score: self.config.geographic_score,
                description: format!("beneficiary {} is in high-risk jurisdiction {country}", beneficiary.id),
            });
        }
    }

    fn check_patterns(&self, candidate: &ScreeningCandidate, history: &[Transaction], hits: &mut Vec<RuleHit>) {
        let day = candidate.occurred_at.date_naive();
        let todays = history.iter().filter(|tx| tx.created_at.date_naive() == day).count() + 1;
        if todays > self.config.daily_frequency_threshold as usize {
            hits.push(RuleHit {
                rule: rules::HIGH_FREQUENCY,
                alert_type: AlertType::UnusualActivity,
                severity: AlertSeverity::Low,
                score: self.config.frequency_score,
                description: format!("{todays} transactions today, threshold {}", self.config.daily_frequency_threshold),
            });
        }

        let amount = candidate.amount.value();
        let multiple = self.config.round_amount_multiple.value();
        if candidate.amount >= self.config.round_amount_floor && (amount % multiple).is_zero() {
            hits.push(RuleHit {
                rule: rules::ROUND_AMOUNT,
                alert_type: AlertType::UnusualActivity,
                severity: AlertSeverity::Low,
                score: self.config.round_amount_score,
                description: format!("round amount {} (multiple of {multiple})", candidate.amount),
            });
        }

        let floor = self.config.structuring_floor();
        let ceiling = self.config.single_tx_threshold.value();
        let clustered: Vec<Decimal> = history
            .iter()
            .map(|tx| tx.amount.value())
            .filter(|v| *v >= floor && *v < ceiling)
            .collect();
        if clustered.len() >= self.config.structuring_min_count as usize {
            let total: Decimal = clustered.iter().sum();
            hits.push(RuleHit {
                rule: rules::STRUCTURING,
                alert_type: AlertType::Aml,
                severity: AlertSeverity::High,
                score: self.config.structuring_score,
                description: format!(
                    "{} transactions totalling {total} just under the {ceiling} threshold in {} days",
                    clustered.len(),
                    self.config.lookback_days
                ),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanctions::StaticSanctionsList;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use lus_core::{Priority, TransactionId, TransactionStatus, UserRole};
    use rust_decimal_macros::dec;

    struct FixedHistory(Vec<Transaction>);

    #[async_trait]
    impl TransactionHistoryReader for FixedHistory {
        async fn originated_between(
            &self,
            user_id: &str,
            from: DateTime<Utc>,
            until: DateTime<Utc>,
        ) -> ComplianceResult<Vec<Transaction>> {
            Ok(self
                .0
                .iter()
                .filter(|tx| tx.from_user_id == user_id && tx.created_at >= from && tx.created_at < until)
                .cloned()
                .collect())
        }
    }

    struct SlowSanctions;

    #[async_trait]
    impl SanctionsChecker for SlowSanctions {
        async fn check_name(&self, _name: &str) -> ComplianceResult<Option<crate::ports::SanctionsHit>> {
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            Ok(None)
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 15, 12, 0, 0).unwrap()
    }

    fn amt(v: Decimal) -> Amount {
        Amount::new(v).unwrap()
    }

    fn past(amount: Decimal, days_ago: i64) -> Transaction {
        let at = now() - Duration::days(days_ago) - Duration::minutes(1);
        Transaction {
            transaction_id: TransactionId::generate(None),
            from_user_id: "cust-1".into(),
            to_user_id: Some("cust-2".into()),
            amount: amt(amount),
            transaction_type: TransactionType::P2pTransfer,
            status: TransactionStatus::Completed,
            priority: Priority::Medium,
            vmf_number: None,
            expires_at: None,
            rejection_reason: None,
            processed_by: None,
            created_at: at,
            updated_at: at,
            completed_at: Some(at),
        }
    }

    fn gate(history: Vec<Transaction>) -> ScreeningGate {
        ScreeningGate::new(
            ScreeningConfig::default(),
            Arc::new(StaticSanctionsList::new(["Viktor Blacklist"], 0.85)),
            Arc::new(FixedHistory(history)),
        )
        .unwrap()
    }

    fn candidate(amount: Decimal) -> ScreeningCandidate {
        ScreeningCandidate::new(
            User::new("cust-1", "Ann Customer", UserRole::Customer),
            amt(amount),
            TransactionType::P2pTransfer,
            now(),
        )
        .with_counterparty(Some(User::new("cust-2", "Ben Receiver", UserRole::Customer)))
    }

    #[tokio::test]
    async fn test_small_transfer_approved_without_alerts() {
        let result = gate(vec![]).screen(&candidate(dec!(120.50))).await.unwrap();
        assert!(result.approved);
        assert_eq!(result.risk_score, 0);
        assert!(result.alerts.is_empty());
        assert_eq!(result.decision(), ScreeningDecision::Approve);
    }

    #[tokio::test]
    async fn test_structuring_needs_three_clustered_transactions() {
        let three = vec![past(dec!(45000), 1), past(dec!(45000), 5), past(dec!(45000), 20)];
        let result = gate(three).screen(&candidate(dec!(10))).await.unwrap();
        assert!(result.has_rule(rules::STRUCTURING));
        assert!(result.requires_manual_review);
        assert_eq!(result.decision(), ScreeningDecision::HoldForReview);

        let two = vec![past(dec!(45000), 1), past(dec!(45000), 5)];
        let result = gate(two).screen(&candidate(dec!(10))).await.unwrap();
        assert!(!result.has_rule(rules::STRUCTURING));
        assert!(result.approved);
    }

    #[tokio::test]
    async fn test_structuring_ignores_history_outside_lookback() {
        let history = vec![past(dec!(45000), 1), past(dec!(45000), 5), past(dec!(45000), 31)];
        let result = gate(history).screen(&candidate(dec!(10))).await.unwrap();
        assert!(!result.has_rule(rules::STRUCTURING));
    }

    #[tokio::test]
    async fn test_sanctions_match_is_critical() {
        let c = candidate(dec!(10))
            .with_counterparty(Some(User::new("x-1", "Viktor Blaklist", UserRole::Customer)));
        let result = gate(vec![]).screen(&c).await.unwrap();
        assert!(result.requires_manual_review);
        let alert = &result.alerts[0];
        assert_eq!(alert.alert_type, AlertType::Sanctions);
        assert_eq!(alert.severity, AlertSeverity::Critical);
        assert_eq!(alert.decision, ScreeningDecision::HoldForReview);
    }

    #[tokio::test]
    async fn test_mid_band_score_is_blocked() {
        // large amount (25) + round amount (10) = 35: above auto-approve, below review
        let result = gate(vec![]).screen(&candidate(dec!(60000))).await.unwrap();
        assert_eq!(result.risk_score, 35);
        assert_eq!(result.decision(), ScreeningDecision::Block);
        assert_eq!(result.alerts.len(), 2);
        assert!(result.alerts.iter().all(|a| a.decision == ScreeningDecision::Block));
    }

    #[tokio::test]
    async fn test_cash_intensive_large_amount_goes_to_review() {
        let mut c = candidate(dec!(55000.10));
        c.transaction_type = TransactionType::CashIn;
        let result = gate(vec![]).screen(&c).await.unwrap();
        assert_eq!(result.risk_score, 50);
        assert_eq!(result.decision(), ScreeningDecision::HoldForReview);
    }

    #[tokio::test]
    async fn test_pep_and_geography_add_up() {
        let counterparty = User::new("cust-9", "Paula Official", UserRole::Customer)
            .with_pep(true)
            .with_country("ir");
        let c = candidate(dec!(10)).with_counterparty(Some(counterparty));
        let result = gate(vec![]).screen(&c).await.unwrap();
        assert!(result.has_rule(rules::PEP_COUNTERPARTY));
        assert!(result.has_rule(rules::HIGH_RISK_JURISDICTION));
        assert_eq!(result.risk_score, 45);
    }

    #[tokio::test]
    async fn test_frequency_counts_candidate() {
        let history: Vec<Transaction> = (0..10).map(|_| past(dec!(5), 0)).collect();
        let result = gate(history).screen(&candidate(dec!(5))).await.unwrap();
        assert!(result.has_rule(rules::HIGH_FREQUENCY));
    }

    fn short_timeout(fail_policy: FailPolicy) -> ScreeningConfig {
        ScreeningConfig {
            external_timeout_ms: 20,
            fail_policy,
            ..ScreeningConfig::default()
        }
    }

    #[tokio::test]
    async fn test_sanctions_timeout_fails_closed() {
        let config = short_timeout(FailPolicy::FailClosed);
        let gate = ScreeningGate::new(config, Arc::new(SlowSanctions), Arc::new(FixedHistory(vec![]))).unwrap();
        let result = gate.screen(&candidate(dec!(10))).await.unwrap();
        assert!(result.has_rule(rules::SANCTIONS_UNAVAILABLE));
        assert!(result.requires_manual_review);
    }

    #[tokio::test]
    async fn test_sanctions_timeout_fail_open_continues() {
        let config = short_timeout(FailPolicy::FailOpen);
        let gate = ScreeningGate::new(config, Arc::new(SlowSanctions), Arc::new(FixedHistory(vec![]))).unwrap();
        let result = gate.screen(&candidate(dec!(10))).await.unwrap();
        assert!(result.has_rule(rules::SANCTIONS_UNAVAILABLE));
        assert!(result.approved);
    }
}
