//! # Lus Settlement
//!
//! Maker-checker workflow that turns an organization's daily collections
//! into bank settlements.
//!
//! ## Scope
//! - Capacity check: today's collections minus today's requested amounts
//! - Review by a different role than the requester (admin checks merchant/finance)
//! - Hold and reject with an enumerated reason, `other` needing a comment
//! - Approval posts the settlement through the transaction engine
//! - Gateway payout callback, reversing the posting on failure
//!
//! Every transition is idempotent against re-submission of the same target
//! state and leaves a row in the review history.

mod config;
mod error;
mod review;
mod workflow;

pub use config::SettlementConfig;
pub use error::{SettlementError, SettlementResult};
pub use review::ReviewNote;
pub use workflow::{SettlementOutcome, SettlementWorkflow};
