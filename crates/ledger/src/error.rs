//! Ledger errors
//!
//! Every variant is an integrity failure: callers must roll back the
//! surrounding unit of work rather than persist anything.

use lus_core::AmountError;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Entry must have at least 2 lines for double-entry")]
    InsufficientLines,

    #[error("Entry unbalanced: debits {debits} != credits {credits}")]
    UnbalancedEntry { debits: Decimal, credits: Decimal },

    #[error("Unknown account code: {0}")]
    UnknownAccount(String),

    #[error("Duplicate account code: {0}")]
    DuplicateAccount(String),

    #[error("Journal line on {account} must carry a positive amount")]
    ZeroLine { account: String },

    #[error("Invalid {strategy} line on {account}: {reason}")]
    InvalidStrategyLine {
        strategy: &'static str,
        account: String,
        reason: &'static str,
    },

    #[error("Fee {fee} exceeds transaction amount {amount}")]
    FeeExceedsAmount { fee: Decimal, amount: Decimal },

    #[error("Invalid fee configuration: {0}")]
    InvalidFeeConfig(String),

    #[error("Invalid reporting period: {0}")]
    InvalidPeriod(String),

    #[error("Amount error: {0}")]
    Amount(#[from] AmountError),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
