//! Lus Compliance - AML/CFT screening gate
//!
//! - [`ScreeningGate`]: additive risk scoring over amount, sanctions/PEP,
//!   geography and historical patterns (frequency, round amounts, structuring)
//! - [`SanctionsChecker`] / [`TransactionHistoryReader`]: injected lookups, with
//!   [`StaticSanctionsList`] and [`StoreHistoryReader`] as bundled adapters
//! - alert persistence and review, Suspicious Transaction Reports

pub mod alerts;
pub mod config;
pub mod error;
pub mod gate;
pub mod history;
pub mod ports;
pub mod report;
pub mod sanctions;

pub use alerts::{list_alerts, record_alerts, review_alert};
pub use config::{FailPolicy, ScreeningConfig};
pub use error::{ComplianceError, ComplianceResult};
pub use gate::{rules, ScreeningCandidate, ScreeningGate, ScreeningResult};
pub use history::StoreHistoryReader;
pub use ports::{SanctionsChecker, SanctionsHit, TransactionHistoryReader};
pub use report::{suspicious_transaction_report, FlaggedTransaction, SuspiciousActivityReport};
pub use sanctions::StaticSanctionsList;
