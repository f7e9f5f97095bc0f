//! Lus Wallet - balances, per-role daily limits and their reset cycle
//!
//! Limit violations are reported as a structured [`LimitCheck`] rather than
//! raised; only the mutating operations turn them into [`WalletError::Limit`].

pub mod config;
pub mod error;
pub mod limits;
pub mod manager;

pub use config::{LimitConfig, RolePolicy};
pub use error::{WalletError, WalletResult};
pub use limits::{LimitCheck, LimitViolation};
pub use manager::WalletManager;
