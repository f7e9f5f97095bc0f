//! Lus Ledger - Double-entry accounting core
//!
//! Pure accounting rules; persistence lives in `lus-store`.
//!
//! # Key Types
//! - `ChartOfAccounts` / `AccountType`: account codes and normal balances
//! - `JournalEntry` / `JournalLine`: balanced accounting events
//! - `FeeConfig`: fee tables and revenue calculation
//! - `PostingStrategy`: journal-line shape per transaction type
//! - `FinancialStatements` / `RevenueReport`: period aggregations

pub mod account;
pub mod entry;
pub mod error;
pub mod fee;
pub mod posting;
pub mod statement;
pub mod validation;

pub use account::{codes, Account, AccountType, ChartOfAccounts};
pub use entry::{EntryStatus, JournalEntry, JournalEntryBuilder, JournalLine, Side};
pub use error::{LedgerError, LedgerResult};
pub use fee::{FeeConfig, RevenueBreakdown, SettlementFeeSchedule};
pub use posting::PostingStrategy;
pub use statement::{
    AccountActivity, AccountBalance, FinancialStatements, RevenueEvent, RevenueReport,
    StatementLine, StatementSection, UNASSIGNED_ORGANIZATION,
};
pub use validation::{validate_entry, validate_posting};
