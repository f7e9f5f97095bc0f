//! Lus Engine - Transaction state machine and ledger posting
//!
//! ```text
//! NewTransaction
//!     │
//!     ▼
//! ┌─────────────────────────────┐
//! │ sweep expired pending       │
//! └─────────────────────────────┘
//!     │
//!     ▼
//! ┌─────────────────────────────┐
//! │ SCREENING GATE              │ ← block → rejected
//! │                             │ ← hold  → pending (high priority)
//! └─────────────────────────────┘
//!     │
//!     ▼
//! ┌─────────────────────────────┐
//! │ DB TRANSACTION              │
//! │  insert → wallets → journal │
//! │  → revenue → alerts         │
//! └─────────────────────────────┘
//!     │
//!     ▼
//! ┌─────────────────────────────┐
//! │ EVENT BUS (after commit)    │
//! └─────────────────────────────┘
//! ```

pub mod book;
pub mod config;
pub mod error;
pub mod machine;
pub mod request;

pub use book::{LedgerBook, Posting};
pub use config::TransactionConfig;
pub use error::{EngineError, EngineResult};
pub use machine::{EngineBuilder, TransactionEngine, COMPLIANCE_BLOCK};
pub use request::{NewTransaction, TransactionOutcome};
