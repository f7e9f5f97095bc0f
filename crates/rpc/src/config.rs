//! Platform configuration
//!
//! One JSON document with a section per component. Every field has a
//! default, so a partial file (or none at all) is valid.

use anyhow::Context;
use lus_compliance::ScreeningConfig;
use lus_engine::TransactionConfig;
use lus_ledger::FeeConfig;
use lus_settlement::SettlementConfig;
use lus_wallet::LimitConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding [`PlatformConfig::database_url`]
pub const DATABASE_URL_ENV: &str = "LUS_DATABASE_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// `sqlite:` URL; defaults to `lus.db` inside the data directory
    #[serde(default)]
    pub database_url: Option<String>,

    /// Bound on acquiring a connection and on lock waits
    #[serde(default = "default_db_timeout_ms")]
    pub db_timeout_ms: u64,

    #[serde(default)]
    pub fees: FeeConfig,

    #[serde(default)]
    pub limits: LimitConfig,

    #[serde(default)]
    pub screening: ScreeningConfig,

    #[serde(default)]
    pub transactions: TransactionConfig,

    #[serde(default)]
    pub settlement: SettlementConfig,

    /// Names on the sanctions list
    #[serde(default)]
    pub sanctions: Vec<String>,
}

fn default_db_timeout_ms() -> u64 {
    5_000
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            db_timeout_ms: default_db_timeout_ms(),
            fees: FeeConfig::default(),
            limits: LimitConfig::default(),
            screening: ScreeningConfig::default(),
            transactions: TransactionConfig::default(),
            settlement: SettlementConfig::default(),
            sanctions: Vec::new(),
        }
    }
}

impl PlatformConfig {
    /// Load from a JSON file. A missing file yields the defaults.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
            if !url.trim().is_empty() {
                self.database_url = Some(url);
            }
        }
    }

    /// Database URL, falling back to a file in `data_dir`.
    pub fn database_url(&self, data_dir: &Path) -> String {
        match &self.database_url {
            Some(url) => url.clone(),
            None => format!("sqlite://{}", data_dir.join("lus.db").display()),
        }
    }

    pub fn db_timeout(&self) -> Duration {
        Duration::from_millis(self.db_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lus_core::TransactionType;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_means_defaults() {
        let dir = TempDir::new().unwrap();
        let config = PlatformConfig::from_file(dir.path().join("absent.json")).unwrap();
        assert_eq!(config.db_timeout_ms, 5_000);
        assert_eq!(config.settlement.max_comment_len, 125);
        assert!(config.sanctions.is_empty());
    }

    #[test]
    fn test_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lus.json");
        std::fs::write(
            &path,
            r#"{
                "db_timeout_ms": 250,
                "fees": { "rates": { "cash_out": "0.02" } },
                "transactions": { "pending_validity_secs": 60 },
                "sanctions": ["Ivan Petrov"]
            }"#,
        )
        .unwrap();

        let config = PlatformConfig::from_file(&path).unwrap();
        assert_eq!(config.db_timeout(), Duration::from_millis(250));
        assert_eq!(config.fees.rate_for(TransactionType::CashOut), dec!(0.02));
        assert_eq!(config.fees.rate_for(TransactionType::CashIn), dec!(0.01));
        assert_eq!(config.transactions.pending_validity_secs, 60);
        assert_eq!(config.sanctions, vec!["Ivan Petrov".to_string()]);
    }

    #[test]
    fn test_database_url_defaults_into_data_dir() {
        let config = PlatformConfig::default();
        let url = config.database_url(Path::new("/var/lus"));
        assert_eq!(url, "sqlite:///var/lus/lus.db");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(PlatformConfig::from_file(&path).is_err());
    }
}
