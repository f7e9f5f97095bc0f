//! Transaction domain types and lifecycle rules

use crate::amount::Amount;
use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Kind of value movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    CashIn,
    CashOut,
    P2pTransfer,
    Settlement,
    QrCodePayment,
    CashDigitization,
    /// Request to pay
    Rtp,
}

impl TransactionType {
    pub const ALL: [TransactionType; 7] = [
        TransactionType::CashIn,
        TransactionType::CashOut,
        TransactionType::P2pTransfer,
        TransactionType::Settlement,
        TransactionType::QrCodePayment,
        TransactionType::CashDigitization,
        TransactionType::Rtp,
    ];

    /// Types where physical cash crosses the counter
    pub fn is_cash_intensive(&self) -> bool {
        matches!(
            self,
            TransactionType::CashIn | TransactionType::CashOut | TransactionType::CashDigitization
        )
    }
}

/// Lifecycle state of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Approved,
    Completed,
    Rejected,
    Expired,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Completed | TransactionStatus::Rejected | TransactionStatus::Expired
        )
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        use TransactionStatus::*;
        matches!(
            (self, next),
            (Pending, Approved)
                | (Pending, Completed)
                | (Pending, Rejected)
                | (Pending, Expired)
                | (Approved, Completed)
                | (Approved, Rejected)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

/// Human-readable transaction reference.
///
/// Format: `LUS-<random6>` or `LUS-<VMF>-<random6>` when the movement is tied
/// to a physical slip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    pub const PREFIX: &'static str = "LUS";

    pub fn generate(vmf_number: Option<&str>) -> Self {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(6)
            .map(|b| char::from(b).to_ascii_uppercase())
            .collect();
        match vmf_number.map(str::trim).filter(|v| !v.is_empty()) {
            Some(vmf) => Self(format!("{}-{}-{}", Self::PREFIX, vmf.to_uppercase(), suffix)),
            None => Self(format!("{}-{}", Self::PREFIX, suffix)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TransactionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One value movement between platform users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: TransactionId,
    pub from_user_id: String,
    pub to_user_id: Option<String>,
    pub amount: Amount,
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub priority: Priority,
    pub vmf_number: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub processed_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// A pending transaction past its validity window.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.status == TransactionStatus::Pending && self.expires_at.is_some_and(|at| now > at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_transaction_id_format() {
        let plain = TransactionId::generate(None);
        assert!(plain.as_str().starts_with("LUS-"));
        assert_eq!(plain.as_str().len(), 10);

        let slip = TransactionId::generate(Some("vmf778"));
        let parts: Vec<&str> = slip.as_str().split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1], "VMF778");
        assert_eq!(parts[2].len(), 6);
        assert!(parts[2].chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_blank_vmf_ignored() {
        assert_eq!(TransactionId::generate(Some("  ")).as_str().len(), 10);
    }

    #[test]
    fn test_lifecycle_transitions() {
        use TransactionStatus::*;
        assert!(Pending.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Approved));
        assert!(Approved.can_transition_to(Completed));
        assert!(!Approved.can_transition_to(Expired));
        assert!(!Completed.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Completed));
        assert!(!Expired.can_transition_to(Pending));
    }

    #[test]
    fn test_type_strings() {
        assert_eq!(TransactionType::P2pTransfer.to_string(), "p2p_transfer");
        assert_eq!(
            TransactionType::from_str("qr_code_payment").unwrap(),
            TransactionType::QrCodePayment
        );
        assert!(TransactionType::CashDigitization.is_cash_intensive());
        assert!(!TransactionType::Rtp.is_cash_intensive());
    }
}
