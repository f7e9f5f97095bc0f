//! Settlement workflow configuration

use lus_core::{Priority, MAX_REASON_COMMENT_LEN};
use serde::{Deserialize, Serialize};

/// Configuration for the settlement workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementConfig {
    /// Upper bound on the free-text comment of a hold or reject, in characters
    #[serde(default = "default_max_comment_len")]
    pub max_comment_len: usize,

    /// Priority given to requests screening did not auto-approve
    #[serde(default = "default_manual_review_priority")]
    pub manual_review_priority: Priority,

    /// Reviewer recorded in the history when the gateway reports a payout
    #[serde(default = "default_gateway_reviewer")]
    pub gateway_reviewer: String,
}

fn default_max_comment_len() -> usize {
    MAX_REASON_COMMENT_LEN
}

fn default_manual_review_priority() -> Priority {
    Priority::High
}

fn default_gateway_reviewer() -> String {
    "settlement-gateway".to_string()
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            max_comment_len: default_max_comment_len(),
            manual_review_priority: default_manual_review_priority(),
            gateway_reviewer: default_gateway_reviewer(),
        }
    }
}
