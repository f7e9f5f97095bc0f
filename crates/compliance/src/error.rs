//! Compliance errors

use lus_store::StoreError;
use thiserror::Error;

/// Errors from the screening gate and alert handling
#[derive(Debug, Error)]
pub enum ComplianceError {
    #[error("Invalid screening configuration: {0}")]
    ConfigError(String),

    #[error("Sanctions lookup timed out after {0}ms")]
    ExternalServiceTimeout(u64),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Alert not found: {0}")]
    AlertNotFound(String),

    #[error("Alert already reviewed: {0}")]
    AlertAlreadyReviewed(String),

    #[error("Alerts can only be cleared or escalated")]
    InvalidReviewOutcome,

    #[error("Invalid report period: {0}")]
    InvalidPeriod(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for compliance operations
pub type ComplianceResult<T> = Result<T, ComplianceError>;
