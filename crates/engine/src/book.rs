//! Ledger book: posting and reporting against the store
//!
//! Posting runs on the caller's connection so it commits or rolls back with
//! the wallet mutations of the same movement.

use crate::error::EngineResult;
use chrono::{DateTime, Utc};
use lus_core::{Amount, Transaction, TransactionType};
use lus_ledger::{
    validate_entry, validate_posting, AccountBalance, FeeConfig, FinancialStatements, JournalEntry,
    LedgerError, PostingStrategy, RevenueBreakdown, RevenueEvent, RevenueReport,
};
use lus_store::{AccountRepo, JournalRepo, RevenueRepo, StoreError};
use sqlx::SqliteConnection;
use tracing::{debug, info};

/// What finalizing one movement put in the books
#[derive(Debug, Clone)]
pub struct Posting {
    pub strategy: PostingStrategy,
    pub revenue: RevenueBreakdown,
    /// `None` when the movement carried nothing bookable
    pub entry: Option<JournalEntry>,
}

#[derive(Debug, Clone)]
pub struct LedgerBook {
    fees: FeeConfig,
}

impl LedgerBook {
    pub fn new(fees: FeeConfig) -> EngineResult<Self> {
        fees.validate()?;
        Ok(Self { fees })
    }

    pub fn fees(&self) -> &FeeConfig {
        &self.fees
    }

    pub fn calculate_revenue(
        &self,
        amount: Amount,
        transaction_type: TransactionType,
    ) -> EngineResult<RevenueBreakdown> {
        Ok(self.fees.calculate_revenue(amount, transaction_type)?)
    }

    /// Post the journal entry for a finalized transaction and recognise its revenue.
    ///
    /// The entry is validated against the stored chart and its strategy before
    /// anything is written.
    pub async fn process_transaction(
        &self,
        conn: &mut SqliteConnection,
        tx: &Transaction,
        organization_id: Option<&str>,
        posted_at: DateTime<Utc>,
    ) -> EngineResult<Posting> {
        let strategy = PostingStrategy::for_type(tx.transaction_type);
        let revenue = self.calculate_revenue(tx.amount, tx.transaction_type)?;
        let entry = strategy.build_entry(tx.transaction_id.as_str(), tx.transaction_type, &revenue, posted_at)?;

        if let Some(entry) = &entry {
            let chart = AccountRepo::chart(conn).await?;
            validate_posting(entry, strategy, &chart)?;
            JournalRepo::insert(conn, entry).await?;
            debug!(
                tx_id = %tx.transaction_id,
                entry_id = %entry.id,
                strategy = strategy.name(),
                lines = entry.lines.len(),
                "journal entry posted"
            );
        }

        if !revenue.total_revenue.is_zero() {
            RevenueRepo::insert(
                conn,
                &RevenueEvent {
                    transaction_id: tx.transaction_id.to_string(),
                    transaction_type: tx.transaction_type,
                    organization_id: organization_id.map(str::to_string),
                    transaction_fee: revenue.transaction_fee,
                    settlement_fee: revenue.settlement_fee.unwrap_or(Amount::ZERO),
                    total: revenue.total_revenue,
                    recorded_at: posted_at,
                },
            )
            .await?;
        }

        Ok(Posting {
            strategy,
            revenue,
            entry,
        })
    }

    /// Post the mirror of `entry_id`. The original stays posted.
    pub async fn reverse_entry(
        &self,
        conn: &mut SqliteConnection,
        entry_id: &str,
        posted_at: DateTime<Utc>,
    ) -> EngineResult<JournalEntry> {
        let original = JournalRepo::get(conn, entry_id)
            .await?
            .ok_or_else(|| StoreError::not_found("JournalEntry", entry_id))?;
        let reversal = original.reversal(posted_at)?;
        let chart = AccountRepo::chart(conn).await?;
        validate_entry(&reversal, &chart)?;
        JournalRepo::insert(conn, &reversal).await?;
        info!(original = %entry_id, reversal = %reversal.id, "journal entry reversed");
        Ok(reversal)
    }

    pub async fn financial_statements(
        &self,
        conn: &mut SqliteConnection,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> EngineResult<FinancialStatements> {
        check_period(from, to)?;
        let chart = AccountRepo::chart(conn).await?;
        let activity = JournalRepo::activity(conn, from, to).await?;
        Ok(FinancialStatements::build(&chart, &activity, from, to)?)
    }

    pub async fn revenue_report(
        &self,
        conn: &mut SqliteConnection,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> EngineResult<RevenueReport> {
        check_period(from, to)?;
        let events = RevenueRepo::between(conn, from, to).await?;
        Ok(RevenueReport::build(&events, from, to)?)
    }

    /// Balance of one account over posted entries up to `as_of`, in the
    /// account's normal-balance sign.
    pub async fn account_balance(
        &self,
        conn: &mut SqliteConnection,
        account_code: &str,
        as_of: DateTime<Utc>,
    ) -> EngineResult<AccountBalance> {
        let chart = AccountRepo::chart(conn).await?;
        let account = chart.require(account_code)?;
        let (debits, credits) = JournalRepo::totals_as_of(conn, account_code, as_of).await?;
        Ok(AccountBalance {
            account_code: account.code.clone(),
            account_type: account.account_type,
            as_of,
            balance: account.account_type.signed_balance(debits, credits),
        })
    }

    /// Ids of persisted entries that do not balance
    pub async fn unbalanced_entries(&self, conn: &mut SqliteConnection) -> EngineResult<Vec<String>> {
        Ok(JournalRepo::unbalanced_entries(conn).await?)
    }
}

fn check_period(from: DateTime<Utc>, to: DateTime<Utc>) -> EngineResult<()> {
    if from > to {
        return Err(LedgerError::InvalidPeriod(format!("{from} is after {to}")).into());
    }
    Ok(())
}
