//! Lus Core - Domain types
//!
//! This crate contains the fundamental types shared by every Lus component:
//! - `Amount`: non-negative, cent-precision money
//! - `UserRole`, `User`, `Actor`: who is acting and under which policy
//! - `Transaction` and its lifecycle enums
//! - `SettlementRequest` and its review reasons
//! - `ComplianceAlert` and screening outcomes
//! - `Clock`: injectable time source
//! - `ErrorKind`: shared classification of rejections

pub mod alert;
pub mod amount;
pub mod clock;
pub mod kind;
pub mod role;
pub mod settlement;
pub mod transaction;
pub mod wallet;

pub use alert::{AlertSeverity, AlertStatus, AlertType, ComplianceAlert, ScreeningDecision};
pub use amount::{Amount, AmountError};
pub use clock::{Clock, ManualClock, SystemClock};
pub use kind::ErrorKind;
pub use role::{Actor, Organization, User, UserRole};
pub use settlement::{
    SettlementReason, SettlementRequest, SettlementReview, SettlementStatus,
    MAX_REASON_COMMENT_LEN,
};
pub use transaction::{Priority, Transaction, TransactionId, TransactionStatus, TransactionType};
pub use wallet::Wallet;
