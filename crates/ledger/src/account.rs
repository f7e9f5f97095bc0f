//! Chart of accounts
//!
//! Accounts are identified by a unique numeric code. The account type decides
//! the normal balance side used by every balance and statement computation.

use crate::entry::Side;
use crate::error::{LedgerError, LedgerResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::{Display, EnumString};

/// Well-known account codes of the default chart
pub mod codes {
    pub const CASH_AND_BANK: &str = "1000";
    pub const CUSTOMER_WALLETS: &str = "2000";
    pub const RETAINED_EARNINGS: &str = "3000";
    pub const TRANSACTION_FEE_REVENUE: &str = "4000";
    pub const SETTLEMENT_FEE_REVENUE: &str = "4100";
    pub const OPERATING_EXPENSES: &str = "5000";
}

/// Account type following standard accounting principles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    /// Cash held at partner banks
    Asset,
    /// E-money owed to wallet holders
    Liability,
    Equity,
    /// Fees earned
    Revenue,
    Expense,
}

impl AccountType {
    /// Returns the normal balance side for this type.
    ///
    /// - Assets and Expenses increase on Debit
    /// - Liabilities, Equity, and Revenue increase on Credit
    pub fn normal_balance(&self) -> Side {
        match self {
            AccountType::Asset | AccountType::Expense => Side::Debit,
            AccountType::Liability | AccountType::Equity | AccountType::Revenue => Side::Credit,
        }
    }

    /// Balance from debit/credit totals, positive on the normal side.
    pub fn signed_balance(&self, debits: Decimal, credits: Decimal) -> Decimal {
        match self.normal_balance() {
            Side::Debit => debits - credits,
            Side::Credit => credits - debits,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub parent_code: Option<String>,
}

impl Account {
    pub fn new(code: impl Into<String>, name: impl Into<String>, account_type: AccountType) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            account_type,
            parent_code: None,
        }
    }

    pub fn with_parent(mut self, parent_code: impl Into<String>) -> Self {
        self.parent_code = Some(parent_code.into());
        self
    }
}

/// In-memory view of the chart of accounts, keyed by code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartOfAccounts {
    accounts: BTreeMap<String, Account>,
}

impl ChartOfAccounts {
    /// Build a chart, rejecting duplicate codes and dangling parents.
    pub fn new(accounts: impl IntoIterator<Item = Account>) -> LedgerResult<Self> {
        let mut map = BTreeMap::new();
        for account in accounts {
            if map.contains_key(&account.code) {
                return Err(LedgerError::DuplicateAccount(account.code));
            }
            map.insert(account.code.clone(), account);
        }
        for account in map.values() {
            if let Some(parent) = &account.parent_code {
                if !map.contains_key(parent) {
                    return Err(LedgerError::UnknownAccount(parent.clone()));
                }
            }
        }
        Ok(Self { accounts: map })
    }

    /// The chart seeded into every new store.
    pub fn default_accounts() -> Vec<Account> {
        vec![
            Account::new(codes::CASH_AND_BANK, "Cash and Bank", AccountType::Asset),
            Account::new(
                codes::CUSTOMER_WALLETS,
                "Customer Wallet Liabilities",
                AccountType::Liability,
            ),
            Account::new(codes::RETAINED_EARNINGS, "Retained Earnings", AccountType::Equity),
            Account::new(
                codes::TRANSACTION_FEE_REVENUE,
                "Transaction Fee Revenue",
                AccountType::Revenue,
            ),
            Account::new(
                codes::SETTLEMENT_FEE_REVENUE,
                "Settlement Fee Revenue",
                AccountType::Revenue,
            )
            .with_parent(codes::TRANSACTION_FEE_REVENUE),
            Account::new(codes::OPERATING_EXPENSES, "Operating Expenses", AccountType::Expense),
        ]
    }

    pub fn get(&self, code: &str) -> Option<&Account> {
        self.accounts.get(code)
    }

    pub fn require(&self, code: &str) -> LedgerResult<&Account> {
        self.get(code)
            .ok_or_else(|| LedgerError::UnknownAccount(code.to_string()))
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_normal_balance() {
        assert_eq!(AccountType::Asset.normal_balance(), Side::Debit);
        assert_eq!(AccountType::Liability.normal_balance(), Side::Credit);
        assert_eq!(AccountType::Revenue.normal_balance(), Side::Credit);
        assert_eq!(AccountType::Expense.normal_balance(), Side::Debit);
    }

    #[test]
    fn test_signed_balance() {
        assert_eq!(AccountType::Asset.signed_balance(dec!(100), dec!(30)), dec!(70));
        assert_eq!(AccountType::Liability.signed_balance(dec!(100), dec!(30)), dec!(-70));
        assert_eq!(AccountType::Revenue.signed_balance(dec!(0), dec!(100)), dec!(100));
    }

    #[test]
    fn test_default_chart_is_valid() {
        let chart = ChartOfAccounts::new(ChartOfAccounts::default_accounts()).unwrap();
        assert_eq!(chart.len(), 6);
        assert_eq!(
            chart.require(codes::SETTLEMENT_FEE_REVENUE).unwrap().parent_code.as_deref(),
            Some(codes::TRANSACTION_FEE_REVENUE)
        );
        assert!(matches!(chart.require("9999"), Err(LedgerError::UnknownAccount(_))));
    }

    #[test]
    fn test_duplicate_code_rejected() {
        let result = ChartOfAccounts::new(vec![
            Account::new("1000", "Cash", AccountType::Asset),
            Account::new("1000", "Bank", AccountType::Asset),
        ]);
        assert!(matches!(result, Err(LedgerError::DuplicateAccount(_))));
    }

    #[test]
    fn test_dangling_parent_rejected() {
        let result = ChartOfAccounts::new(vec![
            Account::new("4100", "Fees", AccountType::Revenue).with_parent("4000"),
        ]);
        assert!(matches!(result, Err(LedgerError::UnknownAccount(_))));
    }
}
