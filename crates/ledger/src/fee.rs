//! Fee configuration and revenue calculation

use crate::error::{LedgerError, LedgerResult};
use lus_core::{Amount, TransactionType};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Settlement fee schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SettlementFeeSchedule {
    #[default]
    None,
    Flat { amount: Amount },
    /// Below `threshold`: `amount × below_rate + below_flat`.
    /// At or above `threshold`: `amount × at_or_above_rate`.
    Tiered {
        threshold: Amount,
        below_rate: Decimal,
        below_flat: Amount,
        at_or_above_rate: Decimal,
    },
}

impl SettlementFeeSchedule {
    pub fn fee_for(&self, amount: Amount) -> LedgerResult<Amount> {
        let fee = match self {
            SettlementFeeSchedule::None => Amount::ZERO,
            SettlementFeeSchedule::Flat { amount: flat } => *flat,
            SettlementFeeSchedule::Tiered {
                threshold,
                below_rate,
                below_flat,
                at_or_above_rate,
            } => {
                if amount >= *threshold {
                    Amount::round_half_up(amount.value() * at_or_above_rate)?
                } else {
                    let pct = Amount::round_half_up(amount.value() * below_rate)?;
                    pct.checked_add(below_flat)
                        .ok_or_else(|| LedgerError::InvalidFeeConfig("fee overflow".into()))?
                }
            }
        };
        Ok(fee)
    }
}

fn default_transaction_fee_rate() -> Decimal {
    dec!(0.01)
}

/// Fee tables, passed into the ledger at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeConfig {
    /// Rate applied to transaction types without an explicit entry
    #[serde(default = "default_transaction_fee_rate")]
    pub default_rate: Decimal,

    /// Per-type overrides
    #[serde(default)]
    pub rates: BTreeMap<TransactionType, Decimal>,

    #[serde(default)]
    pub settlement_fee: SettlementFeeSchedule,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            default_rate: default_transaction_fee_rate(),
            rates: BTreeMap::new(),
            settlement_fee: SettlementFeeSchedule::None,
        }
    }
}

impl FeeConfig {
    pub fn with_rate(mut self, transaction_type: TransactionType, rate: Decimal) -> Self {
        self.rates.insert(transaction_type, rate);
        self
    }

    pub fn with_settlement_fee(mut self, schedule: SettlementFeeSchedule) -> Self {
        self.settlement_fee = schedule;
        self
    }

    pub fn rate_for(&self, transaction_type: TransactionType) -> Decimal {
        self.rates
            .get(&transaction_type)
            .copied()
            .unwrap_or(self.default_rate)
    }

    /// Rates must lie in [0, 1].
    pub fn validate(&self) -> LedgerResult<()> {
        let in_range = |r: &Decimal| *r >= Decimal::ZERO && *r <= Decimal::ONE;
        if !in_range(&self.default_rate) {
            return Err(LedgerError::InvalidFeeConfig(format!(
                "default_rate {} out of range",
                self.default_rate
            )));
        }
        if let Some((ty, rate)) = self.rates.iter().find(|(_, r)| !in_range(r)) {
            return Err(LedgerError::InvalidFeeConfig(format!(
                "rate {rate} for {ty} out of range"
            )));
        }
        if let SettlementFeeSchedule::Tiered {
            below_rate,
            at_or_above_rate,
            ..
        } = &self.settlement_fee
        {
            if !in_range(below_rate) || !in_range(at_or_above_rate) {
                return Err(LedgerError::InvalidFeeConfig(
                    "tiered settlement rates out of range".into(),
                ));
            }
        }
        Ok(())
    }

    /// Revenue earned on one movement of `amount`.
    pub fn calculate_revenue(
        &self,
        amount: Amount,
        transaction_type: TransactionType,
    ) -> LedgerResult<RevenueBreakdown> {
        let transaction_fee = Amount::round_half_up(amount.value() * self.rate_for(transaction_type))?;
        let settlement_fee = match transaction_type {
            TransactionType::Settlement => Some(self.settlement_fee.fee_for(amount)?),
            _ => None,
        };
        let total_revenue = transaction_fee
            .checked_add(&settlement_fee.unwrap_or(Amount::ZERO))
            .ok_or_else(|| LedgerError::InvalidFeeConfig("fee overflow".into()))?;
        if total_revenue > amount {
            return Err(LedgerError::FeeExceedsAmount {
                fee: total_revenue.value(),
                amount: amount.value(),
            });
        }
        Ok(RevenueBreakdown {
            gross_amount: amount,
            transaction_fee,
            settlement_fee,
            total_revenue,
        })
    }
}

/// Fees earned on a single movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueBreakdown {
    pub gross_amount: Amount,
    pub transaction_fee: Amount,
    pub settlement_fee: Option<Amount>,
    pub total_revenue: Amount,
}

impl RevenueBreakdown {
    /// Amount left for the beneficiary after fees
    pub fn net_amount(&self) -> Amount {
        self.gross_amount.saturating_sub(&self.total_revenue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount(v: Decimal) -> Amount {
        Amount::new(v).unwrap()
    }

    fn tiered() -> FeeConfig {
        FeeConfig::default().with_settlement_fee(SettlementFeeSchedule::Tiered {
            threshold: amount(dec!(100000)),
            below_rate: dec!(0.005),
            below_flat: amount(dec!(50)),
            at_or_above_rate: dec!(0.003),
        })
    }

    #[test]
    fn test_cash_in_one_percent() {
        let revenue = FeeConfig::default()
            .calculate_revenue(amount(dec!(10000)), TransactionType::CashIn)
            .unwrap();
        assert_eq!(revenue.transaction_fee.value(), dec!(100));
        assert_eq!(revenue.settlement_fee, None);
        assert_eq!(revenue.net_amount().value(), dec!(9900));
    }

    #[test]
    fn test_fee_rounds_to_nearest_cent() {
        let revenue = FeeConfig::default()
            .calculate_revenue(amount(dec!(12.35)), TransactionType::P2pTransfer)
            .unwrap();
        // 0.1235 -> 0.12
        assert_eq!(revenue.transaction_fee.value(), dec!(0.12));
        let revenue = FeeConfig::default()
            .calculate_revenue(amount(dec!(12.50)), TransactionType::P2pTransfer)
            .unwrap();
        // 0.125 -> 0.13
        assert_eq!(revenue.transaction_fee.value(), dec!(0.13));
    }

    #[test]
    fn test_tier_boundary_inclusive() {
        let config = tiered().with_rate(TransactionType::Settlement, Decimal::ZERO);

        let below = config
            .calculate_revenue(amount(dec!(99999)), TransactionType::Settlement)
            .unwrap();
        // 99,999 × 0.5% = 499.995 -> 500.00, plus flat 50
        assert_eq!(below.settlement_fee, Some(amount(dec!(550))));

        let at = config
            .calculate_revenue(amount(dec!(100000)), TransactionType::Settlement)
            .unwrap();
        assert_eq!(at.settlement_fee, Some(amount(dec!(300))));
    }

    #[test]
    fn test_flat_settlement_fee_only_for_settlements() {
        let config = FeeConfig::default().with_settlement_fee(SettlementFeeSchedule::Flat {
            amount: amount(dec!(25)),
        });
        let settlement = config
            .calculate_revenue(amount(dec!(1000)), TransactionType::Settlement)
            .unwrap();
        assert_eq!(settlement.total_revenue.value(), dec!(35));
        let cash_in = config
            .calculate_revenue(amount(dec!(1000)), TransactionType::CashIn)
            .unwrap();
        assert_eq!(cash_in.total_revenue.value(), dec!(10));
    }

    #[test]
    fn test_fee_exceeding_amount_rejected() {
        let config = FeeConfig::default().with_settlement_fee(SettlementFeeSchedule::Flat {
            amount: amount(dec!(25)),
        });
        let result = config.calculate_revenue(amount(dec!(10)), TransactionType::Settlement);
        assert!(matches!(result, Err(LedgerError::FeeExceedsAmount { .. })));
    }

    #[test]
    fn test_config_from_json_defaults() {
        let config: FeeConfig = serde_json::from_str(
            r#"{"rates": {"p2p_transfer": "0.005"},
                "settlement_fee": {"kind": "flat", "amount": "20"}}"#,
        )
        .unwrap();
        assert_eq!(config.default_rate, dec!(0.01));
        assert_eq!(config.rate_for(TransactionType::P2pTransfer), dec!(0.005));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_out_of_range_rate_rejected() {
        let config = FeeConfig::default().with_rate(TransactionType::Rtp, dec!(1.5));
        assert!(config.validate().is_err());
    }
}
