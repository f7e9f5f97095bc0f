//! Wallet errors

use crate::limits::LimitViolation;
use lus_core::{ErrorKind, UserRole};
use lus_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Limit check failed: {0}")]
    Limit(LimitViolation),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("User {user_id} has role {role}, which has no daily allocation")]
    NotAllocationBased { user_id: String, role: UserRole },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type WalletResult<T> = Result<T, WalletError>;

impl WalletError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Limit(violation) => violation.code(),
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::NotAllocationBased { .. } => "NOT_ALLOCATION_BASED",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Limit(LimitViolation::WalletInactive) => ErrorKind::Validation,
            Self::Limit(_) => ErrorKind::Capacity,
            Self::UserNotFound(_) => ErrorKind::NotFound,
            Self::NotAllocationBased { .. } => ErrorKind::Validation,
            Self::Store(StoreError::Ledger(_)) => ErrorKind::Integrity,
            Self::Store(_) => ErrorKind::Infrastructure,
        }
    }
}

impl From<LimitViolation> for WalletError {
    fn from(violation: LimitViolation) -> Self {
        Self::Limit(violation)
    }
}
