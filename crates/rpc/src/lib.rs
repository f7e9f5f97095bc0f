//! Lus RPC - CLI orchestrator
//!
//! Loads [`PlatformConfig`], wires the store, screening gate, transaction
//! engine and settlement workflow into an [`AppContext`], and exposes the
//! commands behind the `lus` binary.

pub mod commands;
pub mod config;
pub mod context;
pub mod notify;

pub use config::PlatformConfig;
pub use context::AppContext;
pub use notify::LogNotifier;
