//! Lifecycle events for pub/sub distribution

use chrono::{DateTime, Utc};
use lus_core::{Amount, SettlementReason, Transaction, TransactionType};
use serde::{Deserialize, Serialize};

/// Terminal or review-state transitions that affected parties care about.
///
/// Published only after the owning database transaction has committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
    TransactionCompleted {
        transaction_id: String,
        transaction_type: TransactionType,
        from_user_id: String,
        to_user_id: Option<String>,
        amount: Amount,
        timestamp: DateTime<Utc>,
    },

    TransactionRejected {
        transaction_id: String,
        from_user_id: String,
        to_user_id: Option<String>,
        reason: Option<String>,
        timestamp: DateTime<Utc>,
    },

    TransactionExpired {
        transaction_id: String,
        timestamp: DateTime<Utc>,
    },

    SettlementApproved {
        settlement_id: String,
        user_id: String,
        amount: Amount,
        reviewer_id: String,
        timestamp: DateTime<Utc>,
    },

    SettlementHeld {
        settlement_id: String,
        user_id: String,
        reason: SettlementReason,
        timestamp: DateTime<Utc>,
    },

    SettlementRejected {
        settlement_id: String,
        user_id: String,
        reason: SettlementReason,
        timestamp: DateTime<Utc>,
    },

    /// Paid out by the settlement gateway
    SettlementCompleted {
        settlement_id: String,
        user_id: String,
        payout_reference: Option<String>,
        timestamp: DateTime<Utc>,
    },
}

impl LifecycleEvent {
    /// Event for a transaction that just reached `completed` or `rejected`.
    ///
    /// Returns `None` for non-terminal states.
    pub fn for_transaction(tx: &Transaction, timestamp: DateTime<Utc>) -> Option<Self> {
        use lus_core::TransactionStatus::*;
        match tx.status {
            Completed => Some(Self::TransactionCompleted {
                transaction_id: tx.transaction_id.to_string(),
                transaction_type: tx.transaction_type,
                from_user_id: tx.from_user_id.clone(),
                to_user_id: tx.to_user_id.clone(),
                amount: tx.amount,
                timestamp,
            }),
            Rejected => Some(Self::TransactionRejected {
                transaction_id: tx.transaction_id.to_string(),
                from_user_id: tx.from_user_id.clone(),
                to_user_id: tx.to_user_id.clone(),
                reason: tx.rejection_reason.clone(),
                timestamp,
            }),
            Expired => Some(Self::TransactionExpired {
                transaction_id: tx.transaction_id.to_string(),
                timestamp,
            }),
            Pending | Approved => None,
        }
    }

    pub fn transaction_expired(transaction_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self::TransactionExpired {
            transaction_id: transaction_id.into(),
            timestamp,
        }
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::TransactionCompleted { .. } => "transaction_completed",
            Self::TransactionRejected { .. } => "transaction_rejected",
            Self::TransactionExpired { .. } => "transaction_expired",
            Self::SettlementApproved { .. } => "settlement_approved",
            Self::SettlementHeld { .. } => "settlement_held",
            Self::SettlementRejected { .. } => "settlement_rejected",
            Self::SettlementCompleted { .. } => "settlement_completed",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::TransactionCompleted { timestamp, .. }
            | Self::TransactionRejected { timestamp, .. }
            | Self::TransactionExpired { timestamp, .. }
            | Self::SettlementApproved { timestamp, .. }
            | Self::SettlementHeld { timestamp, .. }
            | Self::SettlementRejected { timestamp, .. }
            | Self::SettlementCompleted { timestamp, .. } => *timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lus_core::{Priority, TransactionId, TransactionStatus};
    use rust_decimal_macros::dec;

    fn tx(status: TransactionStatus) -> Transaction {
        let now = Utc::now();
        Transaction {
            transaction_id: TransactionId::from("LUS-ABC123".to_string()),
            from_user_id: "u-1".into(),
            to_user_id: Some("u-2".into()),
            amount: Amount::new(dec!(250)).unwrap(),
            transaction_type: TransactionType::P2pTransfer,
            status,
            priority: Priority::Medium,
            vmf_number: None,
            expires_at: None,
            rejection_reason: Some("compliance_block".into()),
            processed_by: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    #[test]
    fn test_only_terminal_states_notify() {
        let now = Utc::now();
        assert!(LifecycleEvent::for_transaction(&tx(TransactionStatus::Pending), now).is_none());
        assert!(LifecycleEvent::for_transaction(&tx(TransactionStatus::Approved), now).is_none());

        let rejected = LifecycleEvent::for_transaction(&tx(TransactionStatus::Rejected), now).unwrap();
        assert_eq!(rejected.name(), "transaction_rejected");
        match rejected {
            LifecycleEvent::TransactionRejected { reason, .. } => {
                assert_eq!(reason.as_deref(), Some("compliance_block"))
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_serialized_tag() {
        let event = LifecycleEvent::transaction_expired("LUS-XYZ999", Utc::now());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "transaction_expired");
        assert_eq!(json["transaction_id"], "LUS-XYZ999");
    }
}
