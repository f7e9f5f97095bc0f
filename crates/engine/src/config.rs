//! Transaction lifecycle configuration

use lus_core::TransactionType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionConfig {
    /// How long a real-time pending transaction stays actionable
    #[serde(default = "default_pending_validity_secs")]
    pub pending_validity_secs: i64,

    /// Types whose pending transactions expire
    #[serde(default = "default_expiring_types")]
    pub expiring_types: Vec<TransactionType>,
}

fn default_pending_validity_secs() -> i64 {
    120
}

fn default_expiring_types() -> Vec<TransactionType> {
    vec![TransactionType::QrCodePayment, TransactionType::Rtp]
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            pending_validity_secs: default_pending_validity_secs(),
            expiring_types: default_expiring_types(),
        }
    }
}

impl TransactionConfig {
    pub fn pending_validity(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.pending_validity_secs)
    }

    pub fn expires(&self, transaction_type: TransactionType) -> bool {
        self.expiring_types.contains(&transaction_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: TransactionConfig = serde_json::from_str(r#"{"pending_validity_secs": 30}"#).unwrap();
        assert_eq!(config.pending_validity(), chrono::Duration::seconds(30));
        assert!(config.expires(TransactionType::Rtp));
        assert!(!config.expires(TransactionType::CashIn));
    }
}
