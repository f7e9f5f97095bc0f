//! Settlement request types

use crate::amount::Amount;
use crate::transaction::Priority;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Maximum length of the free-text comment attached to a hold/reject.
pub const MAX_REASON_COMMENT_LEN: usize = 125;

/// Settlement request status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SettlementStatus {
    Pending,
    Hold,
    Approved,
    Rejected,
    /// Paid out by the settlement gateway
    Completed,
}

impl SettlementStatus {
    pub fn can_transition_to(&self, next: SettlementStatus) -> bool {
        use SettlementStatus::*;
        matches!(
            (self, next),
            (Pending, Approved)
                | (Pending, Hold)
                | (Pending, Rejected)
                | (Hold, Approved)
                | (Hold, Rejected)
                | (Approved, Completed)
                | (Approved, Rejected)
        )
    }

    /// Whether the request has left the review queue.
    pub fn is_reviewed(&self) -> bool {
        matches!(
            self,
            SettlementStatus::Approved | SettlementStatus::Rejected | SettlementStatus::Completed
        )
    }
}

/// Enumerated reasons for holding or rejecting a settlement request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SettlementReason {
    InsufficientDocumentation,
    SuspectedFraud,
    AccountMismatch,
    ComplianceReview,
    DuplicateRequest,
    /// Requires a free-text comment
    Other,
    /// Set by the engine when the gateway reports a failed payout
    PayoutFailed,
}

impl SettlementReason {
    /// Reasons a reviewer may pick
    pub fn is_reviewer_selectable(&self) -> bool {
        !matches!(self, SettlementReason::PayoutFailed)
    }

    pub fn requires_comment(&self) -> bool {
        matches!(self, SettlementReason::Other)
    }
}

/// A request from an organization to move collected funds to its bank account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRequest {
    pub id: String,
    pub organization_id: String,
    pub user_id: String,
    pub amount: Amount,
    pub bank_name: String,
    pub account_number: String,
    pub status: SettlementStatus,
    pub priority: Priority,
    pub hold_reason: Option<SettlementReason>,
    pub reject_reason: Option<SettlementReason>,
    pub reason_comment: Option<String>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Settlement transaction posted on approval
    pub transaction_id: Option<String>,
    pub payout_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row of a settlement's review trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReview {
    pub settlement_id: String,
    pub from_status: SettlementStatus,
    pub to_status: SettlementStatus,
    pub reviewer_id: String,
    pub reason: Option<SettlementReason>,
    pub comment: Option<String>,
    pub reviewed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_release_from_hold() {
        assert!(SettlementStatus::Hold.can_transition_to(SettlementStatus::Approved));
        assert!(!SettlementStatus::Hold.can_transition_to(SettlementStatus::Hold));
        assert!(!SettlementStatus::Rejected.can_transition_to(SettlementStatus::Approved));
        assert!(!SettlementStatus::Completed.can_transition_to(SettlementStatus::Rejected));
    }

    #[test]
    fn test_reason_parsing() {
        assert_eq!(
            SettlementReason::from_str("account_mismatch").unwrap(),
            SettlementReason::AccountMismatch
        );
        assert!(SettlementReason::Other.requires_comment());
        assert!(!SettlementReason::SuspectedFraud.requires_comment());
        assert!(!SettlementReason::PayoutFailed.is_reviewer_selectable());
    }
}
