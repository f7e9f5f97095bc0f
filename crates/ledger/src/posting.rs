//! Posting strategies: one journal-line shape per kind of movement

use crate::account::codes;
use crate::entry::{JournalEntry, JournalEntryBuilder};
use crate::error::LedgerResult;
use crate::fee::RevenueBreakdown;
use chrono::{DateTime, Utc};
use lus_core::{Amount, TransactionType};
use serde::{Deserialize, Serialize};

/// How a transaction type lands in the books.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostingStrategy {
    /// Cash enters the platform: Dr cash (gross), Cr wallets (net), Cr revenue (fees)
    CashDeposit,
    /// Value leaves the platform: Dr wallets (gross), Cr cash (net), Cr revenue (fees)
    CashWithdrawal,
    /// Value moves between wallets: Dr wallets (fee), Cr revenue (fee)
    FeeOnly,
}

impl PostingStrategy {
    pub fn for_type(transaction_type: TransactionType) -> Self {
        match transaction_type {
            TransactionType::CashIn | TransactionType::CashDigitization => {
                PostingStrategy::CashDeposit
            }
            TransactionType::Settlement | TransactionType::CashOut => {
                PostingStrategy::CashWithdrawal
            }
            TransactionType::P2pTransfer
            | TransactionType::QrCodePayment
            | TransactionType::Rtp => PostingStrategy::FeeOnly,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PostingStrategy::CashDeposit => "cash_deposit",
            PostingStrategy::CashWithdrawal => "cash_withdrawal",
            PostingStrategy::FeeOnly => "fee_only",
        }
    }

    /// Build the entry for one movement.
    ///
    /// Returns `None` when the movement carries no bookable value (a fee-only
    /// movement with a zero fee).
    pub fn build_entry(
        &self,
        transaction_id: &str,
        transaction_type: TransactionType,
        revenue: &RevenueBreakdown,
        posted_at: DateTime<Utc>,
    ) -> LedgerResult<Option<JournalEntry>> {
        let gross = revenue.gross_amount;
        let net = revenue.net_amount();
        let settlement_fee = revenue.settlement_fee.unwrap_or(Amount::ZERO);

        let builder = JournalEntryBuilder::new()
            .transaction_id(transaction_id)
            .description(format!("{transaction_type} {transaction_id}"))
            .posted_at(posted_at);

        let builder = match self {
            PostingStrategy::CashDeposit => builder
                .debit(codes::CASH_AND_BANK, gross)
                .credit(codes::CUSTOMER_WALLETS, net),
            PostingStrategy::CashWithdrawal => builder
                .debit(codes::CUSTOMER_WALLETS, gross)
                .credit(codes::CASH_AND_BANK, net),
            PostingStrategy::FeeOnly => {
                builder.debit(codes::CUSTOMER_WALLETS, revenue.total_revenue)
            }
        };
        let builder = builder
            .credit(codes::TRANSACTION_FEE_REVENUE, revenue.transaction_fee)
            .credit(codes::SETTLEMENT_FEE_REVENUE, settlement_fee);

        if builder.line_count() == 0 {
            return Ok(None);
        }
        builder.build().map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Side;
    use crate::fee::{FeeConfig, SettlementFeeSchedule};
    use rust_decimal_macros::dec;

    fn revenue(config: &FeeConfig, amount: Amount, ty: TransactionType) -> RevenueBreakdown {
        config.calculate_revenue(amount, ty).unwrap()
    }

    #[test]
    fn test_strategy_per_type() {
        assert_eq!(
            PostingStrategy::for_type(TransactionType::CashIn),
            PostingStrategy::CashDeposit
        );
        assert_eq!(
            PostingStrategy::for_type(TransactionType::Settlement),
            PostingStrategy::CashWithdrawal
        );
        assert_eq!(
            PostingStrategy::for_type(TransactionType::P2pTransfer),
            PostingStrategy::FeeOnly
        );
    }

    #[test]
    fn test_cash_in_three_lines() {
        let amount = Amount::new(dec!(10000)).unwrap();
        let rev = revenue(&FeeConfig::default(), amount, TransactionType::CashIn);
        let entry = PostingStrategy::CashDeposit
            .build_entry("LUS-AAAAAA", TransactionType::CashIn, &rev, Utc::now())
            .unwrap()
            .unwrap();

        assert_eq!(entry.lines.len(), 3);
        assert_eq!(entry.lines[0].account_code, codes::CASH_AND_BANK);
        assert_eq!(entry.lines[0].side, Side::Debit);
        assert_eq!(entry.lines[0].amount.value(), dec!(10000));
        assert_eq!(entry.lines[1].account_code, codes::CUSTOMER_WALLETS);
        assert_eq!(entry.lines[1].amount.value(), dec!(9900));
        assert_eq!(entry.lines[2].account_code, codes::TRANSACTION_FEE_REVENUE);
        assert_eq!(entry.lines[2].amount.value(), dec!(100));
    }

    #[test]
    fn test_settlement_four_lines_with_settlement_fee() {
        let config = FeeConfig::default().with_settlement_fee(SettlementFeeSchedule::Flat {
            amount: Amount::new(dec!(20)).unwrap(),
        });
        let amount = Amount::new(dec!(5000)).unwrap();
        let rev = revenue(&config, amount, TransactionType::Settlement);
        let entry = PostingStrategy::CashWithdrawal
            .build_entry("LUS-BBBBBB", TransactionType::Settlement, &rev, Utc::now())
            .unwrap()
            .unwrap();

        assert_eq!(entry.lines.len(), 4);
        assert_eq!(entry.lines[0].account_code, codes::CUSTOMER_WALLETS);
        assert_eq!(entry.lines[0].side, Side::Debit);
        assert_eq!(entry.lines[1].amount.value(), dec!(4930));
        assert_eq!(entry.total_debits(), dec!(5000));
        assert_eq!(entry.total_credits(), dec!(5000));
    }

    #[test]
    fn test_p2p_books_fee_only() {
        let amount = Amount::new(dec!(2500)).unwrap();
        let rev = revenue(&FeeConfig::default(), amount, TransactionType::P2pTransfer);
        let entry = PostingStrategy::FeeOnly
            .build_entry("LUS-CCCCCC", TransactionType::P2pTransfer, &rev, Utc::now())
            .unwrap()
            .unwrap();

        assert_eq!(entry.lines.len(), 2);
        assert_eq!(entry.total_debits(), dec!(25));
    }

    #[test]
    fn test_zero_fee_p2p_posts_nothing() {
        let config = FeeConfig::default().with_rate(TransactionType::P2pTransfer, dec!(0));
        let amount = Amount::new(dec!(2500)).unwrap();
        let rev = revenue(&config, amount, TransactionType::P2pTransfer);
        let entry = PostingStrategy::FeeOnly
            .build_entry("LUS-DDDDDD", TransactionType::P2pTransfer, &rev, Utc::now())
            .unwrap();
        assert!(entry.is_none());
    }
}
