//! Structured limit-check outcomes

use lus_core::Amount;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a debit would not be allowed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LimitViolation {
    WalletInactive,
    InsufficientBalance {
        available: Amount,
        required: Amount,
        shortfall: Amount,
    },
    DailyLimitExceeded {
        limit: Amount,
        spent: Amount,
        required: Amount,
        shortfall: Amount,
    },
}

impl LimitViolation {
    pub fn insufficient_balance(available: Amount, required: Amount) -> Self {
        Self::InsufficientBalance {
            available,
            required,
            shortfall: required.saturating_sub(&available),
        }
    }

    pub fn daily_limit_exceeded(limit: Amount, spent: Amount, required: Amount) -> Self {
        let headroom = limit.saturating_sub(&spent);
        Self::DailyLimitExceeded {
            limit,
            spent,
            required,
            shortfall: required.saturating_sub(&headroom),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::WalletInactive => "WALLET_INACTIVE",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::DailyLimitExceeded { .. } => "DAILY_LIMIT_EXCEEDED",
        }
    }
}

impl fmt::Display for LimitViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WalletInactive => write!(f, "wallet is inactive"),
            Self::InsufficientBalance { available, required, shortfall } => write!(
                f,
                "insufficient balance: available {available}, required {required}, short by {shortfall}"
            ),
            Self::DailyLimitExceeded { limit, spent, required, shortfall } => write!(
                f,
                "daily limit {limit} exceeded: spent {spent}, required {required}, short by {shortfall}"
            ),
        }
    }
}

/// Result of `check_transfer_limits`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitCheck {
    pub allowed: bool,
    pub reason: Option<LimitViolation>,
}

impl LimitCheck {
    pub fn allowed() -> Self {
        Self { allowed: true, reason: None }
    }

    pub fn denied(reason: LimitViolation) -> Self {
        Self { allowed: false, reason: Some(reason) }
    }

    /// `Err` with the first failing reason, for callers that stop on denial
    pub fn into_result(self) -> Result<(), LimitViolation> {
        match self.reason {
            Some(reason) => Err(reason),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_shortfall_figures() {
        let amt = |v| Amount::new(v).unwrap();
        let v = LimitViolation::insufficient_balance(amt(dec!(40)), amt(dec!(100)));
        assert_eq!(
            v,
            LimitViolation::InsufficientBalance {
                available: amt(dec!(40)),
                required: amt(dec!(100)),
                shortfall: amt(dec!(60)),
            }
        );

        let v = LimitViolation::daily_limit_exceeded(amt(dec!(50000)), amt(dec!(49000)), amt(dec!(1500)));
        match v {
            LimitViolation::DailyLimitExceeded { shortfall, .. } => assert_eq!(shortfall, amt(dec!(500))),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(v.code(), "DAILY_LIMIT_EXCEEDED");
    }

    #[test]
    fn test_check_into_result() {
        assert!(LimitCheck::allowed().into_result().is_ok());
        let denied = LimitCheck::denied(LimitViolation::WalletInactive);
        assert!(!denied.allowed);
        assert_eq!(denied.into_result(), Err(LimitViolation::WalletInactive));
    }
}
