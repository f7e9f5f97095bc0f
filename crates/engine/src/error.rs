//! Transaction engine errors

use lus_compliance::ComplianceError;
use lus_core::{AmountError, ErrorKind, TransactionStatus, TransactionType};
use lus_ledger::LedgerError;
use lus_store::StoreError;
use lus_wallet::WalletError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    #[error("Transactions cannot be created as {0}")]
    InvalidRequestedStatus(TransactionStatus),

    #[error("A reason is required to reject a transaction")]
    ReasonRequired,

    #[error("{0} requires a counterparty")]
    CounterpartyRequired(TransactionType),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("A pending {transaction_type} transaction already exists for {user_id}")]
    PendingTransactionExists {
        user_id: String,
        transaction_type: TransactionType,
    },

    #[error("Cannot move transaction {id} from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: TransactionStatus,
        to: TransactionStatus,
    },

    #[error("Transaction {0} has expired")]
    TransactionExpired(String),

    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error("Ledger integrity error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Compliance screening failed: {0}")]
    Compliance(#[from] ComplianceError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        Self::Store(StoreError::from(err))
    }
}

impl EngineError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::InvalidRequestedStatus(_) => "INVALID_STATUS",
            Self::ReasonRequired => "REASON_REQUIRED",
            Self::CounterpartyRequired(_) => "COUNTERPARTY_REQUIRED",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::PendingTransactionExists { .. } => "PENDING_TRANSACTION_EXISTS",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::TransactionExpired(_) => "TRANSACTION_EXPIRED",
            Self::InvalidPeriod(_) => "INVALID_PERIOD",
            Self::Wallet(e) => e.code(),
            Self::Ledger(LedgerError::InvalidPeriod(_)) => "INVALID_PERIOD",
            Self::Ledger(_) => "LEDGER_INTEGRITY",
            Self::Compliance(_) => "COMPLIANCE_UNAVAILABLE",
            Self::Store(StoreError::Ledger(_)) => "LEDGER_INTEGRITY",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAmount(_)
            | Self::InvalidRequestedStatus(_)
            | Self::ReasonRequired
            | Self::CounterpartyRequired(_)
            | Self::InvalidPeriod(_)
            | Self::Ledger(LedgerError::InvalidPeriod(_)) => ErrorKind::Validation,
            Self::UserNotFound(_) | Self::TransactionNotFound(_) => ErrorKind::NotFound,
            Self::PendingTransactionExists { .. }
            | Self::InvalidTransition { .. }
            | Self::TransactionExpired(_) => ErrorKind::Conflict,
            Self::Wallet(e) => e.kind(),
            Self::Ledger(_) | Self::Store(StoreError::Ledger(_)) => ErrorKind::Integrity,
            Self::Compliance(_) | Self::Store(_) => ErrorKind::Infrastructure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lus_wallet::LimitViolation;
    use rust_decimal_macros::dec;

    #[test]
    fn test_codes_and_kinds() {
        let err = EngineError::PendingTransactionExists {
            user_id: "u-1".into(),
            transaction_type: TransactionType::Rtp,
        };
        assert_eq!(err.code(), "PENDING_TRANSACTION_EXISTS");
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let limit = EngineError::from(WalletError::from(LimitViolation::insufficient_balance(
            lus_core::Amount::new(dec!(10)).unwrap(),
            lus_core::Amount::new(dec!(25)).unwrap(),
        )));
        assert_eq!(limit.code(), "INSUFFICIENT_BALANCE");
        assert_eq!(limit.kind(), ErrorKind::Capacity);

        let unbalanced = EngineError::from(LedgerError::UnbalancedEntry {
            debits: dec!(10),
            credits: dec!(9),
        });
        assert_eq!(unbalanced.kind(), ErrorKind::Integrity);
    }
}
