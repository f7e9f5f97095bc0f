//! Financial statements and revenue reports
//!
//! Both are pure aggregations over rows the store has already filtered to
//! posted entries within the period. Figures are signed: a balance on the
//! wrong side of its normal balance shows up negative instead of being clamped.

use crate::account::{AccountType, ChartOfAccounts};
use crate::error::{LedgerError, LedgerResult};
use chrono::{DateTime, Utc};
use lus_core::{Amount, TransactionType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Debit/credit totals of one account over a period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountActivity {
    pub account_code: String,
    pub total_debits: Decimal,
    pub total_credits: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementLine {
    pub account_code: String,
    pub account_name: String,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementSection {
    pub lines: Vec<StatementLine>,
    pub total: Decimal,
}

impl StatementSection {
    fn push(&mut self, line: StatementLine) {
        self.total += line.balance;
        self.lines.push(line);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialStatements {
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub assets: StatementSection,
    pub liabilities: StatementSection,
    pub equity: StatementSection,
    pub revenue: StatementSection,
    pub expenses: StatementSection,
    pub net_income: Decimal,
}

impl FinancialStatements {
    /// Aggregate account activity into statement sections.
    ///
    /// Fails on activity for an account missing from the chart.
    pub fn build(
        chart: &ChartOfAccounts,
        activity: &[AccountActivity],
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> LedgerResult<Self> {
        check_period(period_start, period_end)?;

        let mut statements = FinancialStatements {
            period_start,
            period_end,
            assets: StatementSection::default(),
            liabilities: StatementSection::default(),
            equity: StatementSection::default(),
            revenue: StatementSection::default(),
            expenses: StatementSection::default(),
            net_income: Decimal::ZERO,
        };

        for row in activity {
            let account = chart.require(&row.account_code)?;
            let line = StatementLine {
                account_code: account.code.clone(),
                account_name: account.name.clone(),
                balance: account
                    .account_type
                    .signed_balance(row.total_debits, row.total_credits),
            };
            let section = match account.account_type {
                AccountType::Asset => &mut statements.assets,
                AccountType::Liability => &mut statements.liabilities,
                AccountType::Equity => &mut statements.equity,
                AccountType::Revenue => &mut statements.revenue,
                AccountType::Expense => &mut statements.expenses,
            };
            section.push(line);
        }

        statements.net_income = statements.revenue.total - statements.expenses.total;
        Ok(statements)
    }
}

/// Point-in-time balance of one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub account_code: String,
    pub account_type: AccountType,
    pub as_of: DateTime<Utc>,
    pub balance: Decimal,
}

/// Revenue recognised for one finalized movement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueEvent {
    pub transaction_id: String,
    pub transaction_type: TransactionType,
    pub organization_id: Option<String>,
    pub transaction_fee: Amount,
    pub settlement_fee: Amount,
    pub total: Amount,
    pub recorded_at: DateTime<Utc>,
}

pub const UNASSIGNED_ORGANIZATION: &str = "unassigned";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueReport {
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub transaction_fees: Amount,
    pub settlement_fees: Amount,
    pub total_revenue: Amount,
    pub event_count: usize,
    pub by_type: BTreeMap<TransactionType, Amount>,
    pub by_organization: BTreeMap<String, Amount>,
}

impl RevenueReport {
    pub fn build(
        events: &[RevenueEvent],
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> LedgerResult<Self> {
        check_period(period_start, period_end)?;

        let mut by_type: BTreeMap<TransactionType, Amount> = BTreeMap::new();
        let mut by_organization: BTreeMap<String, Amount> = BTreeMap::new();
        for event in events {
            let slot = by_type.entry(event.transaction_type).or_default();
            *slot = add(*slot, event.total)?;
            let org = event
                .organization_id
                .clone()
                .unwrap_or_else(|| UNASSIGNED_ORGANIZATION.to_string());
            let slot = by_organization.entry(org).or_default();
            *slot = add(*slot, event.total)?;
        }

        Ok(Self {
            period_start,
            period_end,
            transaction_fees: events.iter().map(|e| e.transaction_fee).sum(),
            settlement_fees: events.iter().map(|e| e.settlement_fee).sum(),
            total_revenue: events.iter().map(|e| e.total).sum(),
            event_count: events.len(),
            by_type,
            by_organization,
        })
    }
}

fn add(a: Amount, b: Amount) -> LedgerResult<Amount> {
    a.checked_add(&b)
        .ok_or_else(|| LedgerError::InvalidPeriod("revenue total overflow".into()))
}

fn check_period(start: DateTime<Utc>, end: DateTime<Utc>) -> LedgerResult<()> {
    if start > end {
        return Err(LedgerError::InvalidPeriod(format!(
            "start {start} is after end {end}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::codes;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn chart() -> ChartOfAccounts {
        ChartOfAccounts::new(ChartOfAccounts::default_accounts()).unwrap()
    }

    fn activity(code: &str, debits: Decimal, credits: Decimal) -> AccountActivity {
        AccountActivity {
            account_code: code.into(),
            total_debits: debits,
            total_credits: credits,
        }
    }

    #[test]
    fn test_statements_sign_convention() {
        let end = Utc::now();
        let start = end - Duration::days(1);
        let rows = vec![
            activity(codes::CASH_AND_BANK, dec!(10000), dec!(0)),
            activity(codes::CUSTOMER_WALLETS, dec!(25), dec!(9900)),
            activity(codes::TRANSACTION_FEE_REVENUE, dec!(0), dec!(125)),
            activity(codes::OPERATING_EXPENSES, dec!(40), dec!(0)),
        ];
        let st = FinancialStatements::build(&chart(), &rows, start, end).unwrap();
        assert_eq!(st.assets.total, dec!(10000));
        assert_eq!(st.liabilities.total, dec!(9875));
        assert_eq!(st.revenue.total, dec!(125));
        assert_eq!(st.expenses.total, dec!(40));
        assert_eq!(st.net_income, dec!(85));
    }

    #[test]
    fn test_statements_fail_closed_on_unknown_account() {
        let end = Utc::now();
        let rows = vec![activity("7777", dec!(1), dec!(0))];
        assert!(matches!(
            FinancialStatements::build(&chart(), &rows, end - Duration::days(1), end),
            Err(LedgerError::UnknownAccount(_))
        ));
    }

    #[test]
    fn test_inverted_period_rejected() {
        let now = Utc::now();
        assert!(matches!(
            RevenueReport::build(&[], now, now - Duration::days(1)),
            Err(LedgerError::InvalidPeriod(_))
        ));
    }

    #[test]
    fn test_revenue_report_groups() {
        let now = Utc::now();
        let fee = |v| Amount::new(v).unwrap();
        let events = vec![
            RevenueEvent {
                transaction_id: "LUS-1".into(),
                transaction_type: TransactionType::CashIn,
                organization_id: None,
                transaction_fee: fee(dec!(100)),
                settlement_fee: Amount::ZERO,
                total: fee(dec!(100)),
                recorded_at: now,
            },
            RevenueEvent {
                transaction_id: "LUS-2".into(),
                transaction_type: TransactionType::Settlement,
                organization_id: Some("ORG-1".into()),
                transaction_fee: fee(dec!(10)),
                settlement_fee: fee(dec!(20)),
                total: fee(dec!(30)),
                recorded_at: now,
            },
        ];
        let report = RevenueReport::build(&events, now - Duration::days(1), now).unwrap();
        assert_eq!(report.transaction_fees.value(), dec!(110));
        assert_eq!(report.settlement_fees.value(), dec!(20));
        assert_eq!(report.total_revenue.value(), dec!(130));
        assert_eq!(report.by_type[&TransactionType::Settlement].value(), dec!(30));
        assert_eq!(report.by_organization[UNASSIGNED_ORGANIZATION].value(), dec!(100));
    }
}
