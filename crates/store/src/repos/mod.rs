//! Repositories
//!
//! Every function takes a `&mut SqliteConnection`, so callers decide whether it
//! runs on a pooled connection or inside an open transaction.

mod alerts;
mod journal;
mod settlements;
mod transactions;
mod users;
mod wallets;

pub use alerts::{AlertFilter, AlertRepo};
pub use journal::{AccountRepo, JournalRepo, RevenueRepo};
pub use settlements::{SettlementRepo, SettlementStats};
pub use transactions::{TransactionRepo, TransitionUpdate};
pub use users::{OrganizationCounters, OrganizationRepo, UserRepo};
pub use wallets::{DailyReset, WalletRepo};
