//! Amount - non-negative, cent-precision money
//!
//! All money in Lus carries exactly two decimal places of precision.
//! Values are validated at construction; rounding only happens through
//! [`Amount::round_half_up`], which the fee calculator uses.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use thiserror::Error;

/// Errors that can occur when working with amounts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount cannot be negative: {0}")]
    NegativeAmount(Decimal),

    #[error("Amount must be greater than zero")]
    NotPositive,

    #[error("Amount has more than two decimal places: {0}")]
    PrecisionExceeded(Decimal),

    #[error("Amount out of range: {0}")]
    Overflow(Decimal),
}

/// A non-negative money amount with at most two decimal places.
///
/// # Example
/// ```
/// use lus_core::Amount;
/// use rust_decimal::Decimal;
///
/// let amount = Amount::new(Decimal::new(10050, 2)).unwrap();
/// assert_eq!(amount.to_cents().unwrap(), 10050);
///
/// assert!(Amount::new(Decimal::new(-1, 0)).is_err());
/// assert!(Amount::new(Decimal::new(1001, 3)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new Amount, rejecting negatives and sub-cent precision.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value < Decimal::ZERO {
            return Err(AmountError::NegativeAmount(value));
        }
        let normalized = value.normalize();
        if normalized.scale() > 2 {
            return Err(AmountError::PrecisionExceeded(value));
        }
        Ok(Self(normalized))
    }

    /// Create an Amount that must be strictly greater than zero.
    pub fn positive(value: Decimal) -> Result<Self, AmountError> {
        let amount = Self::new(value)?;
        if amount.is_zero() {
            return Err(AmountError::NotPositive);
        }
        Ok(amount)
    }

    /// Round an arbitrary non-negative decimal to the nearest cent (half away from zero).
    pub fn round_half_up(value: Decimal) -> Result<Self, AmountError> {
        Self::new(value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }

    /// Rebuild an Amount from integer minor units.
    pub fn from_cents(cents: i64) -> Result<Self, AmountError> {
        Self::new(Decimal::new(cents, 2))
    }

    /// Integer minor units (cents).
    pub fn to_cents(&self) -> Result<i64, AmountError> {
        (self.0 * Decimal::ONE_HUNDRED)
            .to_i64()
            .ok_or(AmountError::Overflow(self.0))
    }

    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(&self, other: &Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// Returns None if the result would be negative
    pub fn checked_sub(&self, other: &Amount) -> Option<Amount> {
        let result = self.0.checked_sub(other.0)?;
        if result < Decimal::ZERO {
            None
        } else {
            Some(Amount(result))
        }
    }

    /// Subtraction floored at zero.
    pub fn saturating_sub(&self, other: &Amount) -> Amount {
        self.checked_sub(other).unwrap_or(Amount::ZERO)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        Amount(iter.map(|a| a.0).sum())
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_negative_rejected() {
        assert!(matches!(
            Amount::new(dec!(-0.01)),
            Err(AmountError::NegativeAmount(_))
        ));
    }

    #[test]
    fn test_precision_enforced() {
        assert!(Amount::new(dec!(10.50)).is_ok());
        assert!(Amount::new(dec!(10.500)).is_ok());
        assert!(matches!(
            Amount::new(dec!(10.505)),
            Err(AmountError::PrecisionExceeded(_))
        ));
    }

    #[test]
    fn test_positive_rejects_zero() {
        assert_eq!(Amount::positive(Decimal::ZERO), Err(AmountError::NotPositive));
        assert!(Amount::positive(dec!(0.01)).is_ok());
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(Amount::round_half_up(dec!(1.005)).unwrap().value(), dec!(1.01));
        assert_eq!(Amount::round_half_up(dec!(1.004)).unwrap().value(), dec!(1));
    }

    #[test]
    fn test_cents_conversion() {
        let amount = Amount::new(dec!(9900)).unwrap();
        assert_eq!(amount.to_cents().unwrap(), 990_000);
        assert_eq!(Amount::from_cents(990_000).unwrap(), amount);
        assert!(Amount::from_cents(-1).is_err());
    }

    #[test]
    fn test_checked_sub_prevents_negative() {
        let a = Amount::new(dec!(50)).unwrap();
        let b = Amount::new(dec!(100)).unwrap();
        assert!(a.checked_sub(&b).is_none());
        assert_eq!(a.saturating_sub(&b), Amount::ZERO);
    }

    #[test]
    fn test_display_two_places() {
        assert_eq!(Amount::new(dec!(100)).unwrap().to_string(), "100.00");
    }

    #[test]
    fn test_serde_rejects_negative() {
        let parsed: Result<Amount, _> = serde_json::from_str("\"-5\"");
        assert!(parsed.is_err());
    }
}
