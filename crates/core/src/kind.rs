//! Classification of user-facing rejections

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Broad category of a rejected operation.
///
/// Component error enums map every variant onto one of these so callers can
/// decide between retrying, surfacing a validation message, or paging someone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad input; nothing was changed
    Validation,
    /// Balance, limit or settlement capacity exceeded
    Capacity,
    /// Duplicate or already-reviewed state
    Conflict,
    NotFound,
    /// Ledger invariant broken; the enclosing unit rolled back
    Integrity,
    /// Database or external dependency failure
    Infrastructure,
}

impl ErrorKind {
    /// Whether the same request may succeed if simply retried later
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Infrastructure)
    }
}
