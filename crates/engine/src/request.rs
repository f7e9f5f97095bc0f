//! Inputs and outputs of the transaction engine

use lus_compliance::ScreeningResult;
use lus_core::{Priority, ScreeningDecision, Transaction, TransactionStatus, TransactionType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A request to create one transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub from_user_id: String,
    #[serde(default)]
    pub to_user_id: Option<String>,
    /// Validated into a positive cent-precision amount on creation
    pub amount: Decimal,
    pub transaction_type: TransactionType,
    /// `pending` or `completed`
    #[serde(default = "default_requested_status")]
    pub requested_status: TransactionStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub vmf_number: Option<String>,
    /// Who submitted the request
    #[serde(default)]
    pub processed_by: Option<String>,
}

fn default_requested_status() -> TransactionStatus {
    TransactionStatus::Pending
}

impl NewTransaction {
    pub fn new(from_user_id: impl Into<String>, amount: Decimal, transaction_type: TransactionType) -> Self {
        Self {
            from_user_id: from_user_id.into(),
            to_user_id: None,
            amount,
            transaction_type,
            requested_status: TransactionStatus::Pending,
            priority: Priority::default(),
            vmf_number: None,
            processed_by: None,
        }
    }

    pub fn to(mut self, to_user_id: impl Into<String>) -> Self {
        self.to_user_id = Some(to_user_id.into());
        self
    }

    pub fn completed(mut self) -> Self {
        self.requested_status = TransactionStatus::Completed;
        self
    }

    pub fn with_vmf(mut self, vmf_number: impl Into<String>) -> Self {
        self.vmf_number = Some(vmf_number.into());
        self
    }

    pub fn processed_by(mut self, user_id: impl Into<String>) -> Self {
        self.processed_by = Some(user_id.into());
        self
    }
}

/// A created transaction together with the screening that shaped it
#[derive(Debug, Clone)]
pub struct TransactionOutcome {
    pub transaction: Transaction,
    pub screening: ScreeningResult,
}

impl TransactionOutcome {
    pub fn decision(&self) -> ScreeningDecision {
        self.screening.decision()
    }
}
