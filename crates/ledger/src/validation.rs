//! Commit-time validation of journal entries
//!
//! Every entry must balance and reference known accounts. On top of that each
//! posting strategy restricts which account types may appear on which side.

use crate::account::{AccountType, ChartOfAccounts};
use crate::entry::{JournalEntry, Side};
use crate::error::LedgerError;
use crate::posting::PostingStrategy;

pub type ValidationResult = Result<(), LedgerError>;

/// Validate an entry against the chart: balance first, then account codes.
pub fn validate_entry(entry: &JournalEntry, chart: &ChartOfAccounts) -> ValidationResult {
    entry.validate_balance()?;
    for line in &entry.lines {
        chart.require(&line.account_code)?;
    }
    Ok(())
}

/// Validate an entry produced for a given posting strategy
pub fn validate_posting(
    entry: &JournalEntry,
    strategy: PostingStrategy,
    chart: &ChartOfAccounts,
) -> ValidationResult {
    validate_entry(entry, chart)?;
    match strategy {
        PostingStrategy::CashDeposit => validate_cash_deposit(entry, chart),
        PostingStrategy::CashWithdrawal => validate_cash_withdrawal(entry, chart),
        PostingStrategy::FeeOnly => validate_fee_only(entry, chart),
    }
}

fn has_line(entry: &JournalEntry, chart: &ChartOfAccounts, ty: AccountType, side: Side) -> bool {
    entry.lines.iter().any(|l| {
        l.side == side
            && chart
                .get(&l.account_code)
                .is_some_and(|a| a.account_type == ty)
    })
}

/// Cash deposit: ASSET ↑, LIAB ↑
fn validate_cash_deposit(entry: &JournalEntry, chart: &ChartOfAccounts) -> ValidationResult {
    if !has_line(entry, chart, AccountType::Asset, Side::Debit)
        || !has_line(entry, chart, AccountType::Liability, Side::Credit)
    {
        return Err(LedgerError::InvalidStrategyLine {
            strategy: "cash_deposit",
            account: String::new(),
            reason: "requires ASSET debit and LIABILITY credit",
        });
    }
    Ok(())
}

/// Cash withdrawal: LIAB ↓, ASSET ↓
fn validate_cash_withdrawal(entry: &JournalEntry, chart: &ChartOfAccounts) -> ValidationResult {
    if !has_line(entry, chart, AccountType::Liability, Side::Debit)
        || !has_line(entry, chart, AccountType::Asset, Side::Credit)
    {
        return Err(LedgerError::InvalidStrategyLine {
            strategy: "cash_withdrawal",
            account: String::new(),
            reason: "requires LIABILITY debit and ASSET credit",
        });
    }
    Ok(())
}

/// Fee only: LIAB ↓, REV ↑, nothing else
fn validate_fee_only(entry: &JournalEntry, chart: &ChartOfAccounts) -> ValidationResult {
    for line in &entry.lines {
        let account = chart.require(&line.account_code)?;
        let valid = matches!(
            (account.account_type, line.side),
            (AccountType::Liability, Side::Debit) | (AccountType::Revenue, Side::Credit)
        );
        if !valid {
            return Err(LedgerError::InvalidStrategyLine {
                strategy: "fee_only",
                account: line.account_code.clone(),
                reason: "only LIABILITY debit or REVENUE credit allowed",
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::codes;
    use crate::entry::JournalEntryBuilder;
    use lus_core::Amount;
    use rust_decimal_macros::dec;

    fn chart() -> ChartOfAccounts {
        ChartOfAccounts::new(ChartOfAccounts::default_accounts()).unwrap()
    }

    fn amount(v: rust_decimal::Decimal) -> Amount {
        Amount::new(v).unwrap()
    }

    #[test]
    fn test_unknown_account_rejected() {
        let entry = JournalEntryBuilder::new()
            .debit("1999", amount(dec!(10)))
            .credit(codes::CUSTOMER_WALLETS, amount(dec!(10)))
            .build()
            .unwrap();
        assert_eq!(
            validate_entry(&entry, &chart()),
            Err(LedgerError::UnknownAccount("1999".into()))
        );
    }

    #[test]
    fn test_cash_deposit_shape() {
        let entry = JournalEntryBuilder::new()
            .debit(codes::CASH_AND_BANK, amount(dec!(100)))
            .credit(codes::CUSTOMER_WALLETS, amount(dec!(99)))
            .credit(codes::TRANSACTION_FEE_REVENUE, amount(dec!(1)))
            .build()
            .unwrap();
        assert!(validate_posting(&entry, PostingStrategy::CashDeposit, &chart()).is_ok());
        assert!(matches!(
            validate_posting(&entry, PostingStrategy::CashWithdrawal, &chart()),
            Err(LedgerError::InvalidStrategyLine { .. })
        ));
    }

    #[test]
    fn test_fee_only_rejects_cash_movement() {
        let entry = JournalEntryBuilder::new()
            .debit(codes::CUSTOMER_WALLETS, amount(dec!(100)))
            .credit(codes::CASH_AND_BANK, amount(dec!(100)))
            .build()
            .unwrap();
        assert!(matches!(
            validate_posting(&entry, PostingStrategy::FeeOnly, &chart()),
            Err(LedgerError::InvalidStrategyLine { strategy: "fee_only", .. })
        ));
    }
}
