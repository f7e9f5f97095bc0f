//! Settlement workflow errors

use lus_compliance::ComplianceError;
use lus_core::{Amount, AmountError, ErrorKind, SettlementReason, SettlementStatus, UserRole};
use lus_engine::EngineError;
use lus_store::StoreError;
use lus_wallet::WalletError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    #[error("Bank name and account number are required")]
    BankDetailsRequired,

    #[error(
        "Settlement capacity of {organization_id} exceeded: available {available}, requested {requested}, short by {shortfall}"
    )]
    CapacityExceeded {
        organization_id: String,
        collected: Amount,
        used: Amount,
        available: Amount,
        requested: Amount,
        shortfall: Amount,
    },

    #[error("User {user_id} has role {role}, which cannot request settlements")]
    NotRequester { user_id: String, role: UserRole },

    #[error("User {0} does not belong to an organization")]
    NoOrganization(String),

    #[error("User {user_id} has role {role}, which cannot review settlements")]
    NotReviewer { user_id: String, role: UserRole },

    #[error("User {0} cannot review their own settlement request")]
    SelfReview(String),

    #[error("Reason {0} cannot be chosen by a reviewer")]
    ReasonNotSelectable(SettlementReason),

    #[error("Reason {0} requires a comment")]
    CommentRequired(SettlementReason),

    #[error("Comment is {len} characters, the maximum is {max}")]
    CommentTooLong { len: usize, max: usize },

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Settlement request not found: {0}")]
    NotFound(String),

    #[error("Cannot move settlement {id} from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: SettlementStatus,
        to: SettlementStatus,
    },

    #[error("Approved settlement {0} has no posted transaction")]
    NotPosted(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error("Compliance screening failed: {0}")]
    Compliance(#[from] ComplianceError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type SettlementResult<T> = Result<T, SettlementError>;

impl From<sqlx::Error> for SettlementError {
    fn from(err: sqlx::Error) -> Self {
        Self::Store(StoreError::from(err))
    }
}

impl SettlementError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::BankDetailsRequired => "BANK_DETAILS_REQUIRED",
            Self::CapacityExceeded { .. } => "SETTLEMENT_CAPACITY_EXCEEDED",
            Self::NotRequester { .. } => "NOT_SETTLEMENT_REQUESTER",
            Self::NoOrganization(_) => "NO_ORGANIZATION",
            Self::NotReviewer { .. } => "NOT_SETTLEMENT_REVIEWER",
            Self::SelfReview(_) => "SELF_REVIEW",
            Self::ReasonNotSelectable(_) => "INVALID_REASON",
            Self::CommentRequired(_) => "COMMENT_REQUIRED",
            Self::CommentTooLong { .. } => "COMMENT_TOO_LONG",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::NotFound(_) => "SETTLEMENT_NOT_FOUND",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::NotPosted(_) => "LEDGER_INTEGRITY",
            Self::Engine(err) => err.code(),
            Self::Wallet(err) => err.code(),
            Self::Compliance(_) => "COMPLIANCE_UNAVAILABLE",
            Self::Store(StoreError::Ledger(_)) => "LEDGER_INTEGRITY",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAmount(_)
            | Self::BankDetailsRequired
            | Self::NotRequester { .. }
            | Self::NoOrganization(_)
            | Self::NotReviewer { .. }
            | Self::SelfReview(_)
            | Self::ReasonNotSelectable(_)
            | Self::CommentRequired(_)
            | Self::CommentTooLong { .. } => ErrorKind::Validation,
            Self::CapacityExceeded { .. } => ErrorKind::Capacity,
            Self::UserNotFound(_) | Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidTransition { .. } => ErrorKind::Conflict,
            Self::NotPosted(_) => ErrorKind::Integrity,
            Self::Engine(err) => err.kind(),
            Self::Wallet(err) => err.kind(),
            Self::Compliance(_) => ErrorKind::Infrastructure,
            Self::Store(StoreError::Ledger(_)) => ErrorKind::Integrity,
            Self::Store(_) => ErrorKind::Infrastructure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_capacity_error_reports_figures() {
        let err = SettlementError::CapacityExceeded {
            organization_id: "ORG-1".into(),
            collected: Amount::new(dec!(100000)).unwrap(),
            used: Amount::new(dec!(30000)).unwrap(),
            available: Amount::new(dec!(70000)).unwrap(),
            requested: Amount::new(dec!(70001)).unwrap(),
            shortfall: Amount::new(dec!(1)).unwrap(),
        };
        assert_eq!(err.kind(), ErrorKind::Capacity);
        assert!(err.to_string().contains("short by 1.00"));
    }

    #[test]
    fn test_engine_errors_keep_their_code() {
        let err = SettlementError::from(EngineError::ReasonRequired);
        assert_eq!(err.code(), "REASON_REQUIRED");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
