//! Screening configuration
//!
//! Every threshold and rule weight the gate uses lives here and is passed in
//! at construction, so deployments can tune policy without recompiling and
//! tests can inject deterministic values.

use lus_core::Amount;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the screening gate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningConfig {
    // === Amount thresholds ===
    /// Single-transaction reporting threshold
    #[serde(default = "default_single_tx_threshold")]
    pub single_tx_threshold: Amount,

    /// Score added by a large non-cash transaction
    #[serde(default = "default_large_amount_score")]
    pub large_amount_score: u32,

    /// Score added by a large cash-intensive transaction
    #[serde(default = "default_cash_intensive_threshold_score")]
    pub cash_intensive_threshold_score: u32,

    // === Sanctions / PEP ===
    /// Similarity in `[0, 1]` at which a name counts as a sanctions match
    #[serde(default = "default_sanctions_match_threshold")]
    pub sanctions_match_threshold: f64,

    #[serde(default = "default_sanctions_score")]
    pub sanctions_score: u32,

    #[serde(default = "default_pep_score")]
    pub pep_score: u32,

    // === Geography ===
    /// ISO country codes treated as high-risk jurisdictions
    #[serde(default = "default_high_risk_countries")]
    pub high_risk_countries: Vec<String>,

    #[serde(default = "default_geographic_score")]
    pub geographic_score: u32,

    // === Patterns ===
    #[serde(default = "default_lookback_days")]
    pub lookback_days: i64,

    /// Transactions per day (including the candidate) above which frequency is flagged
    #[serde(default = "default_daily_frequency_threshold")]
    pub daily_frequency_threshold: u32,

    #[serde(default = "default_frequency_score")]
    pub frequency_score: u32,

    #[serde(default = "default_round_amount_multiple")]
    pub round_amount_multiple: Amount,

    /// Round amounts below this floor are ignored
    #[serde(default = "default_round_amount_floor")]
    pub round_amount_floor: Amount,

    #[serde(default = "default_round_amount_score")]
    pub round_amount_score: u32,

    /// Lower bound of the structuring band as a fraction of `single_tx_threshold`
    #[serde(default = "default_structuring_lower_ratio")]
    pub structuring_lower_ratio: Decimal,

    #[serde(default = "default_structuring_min_count")]
    pub structuring_min_count: u32,

    #[serde(default = "default_structuring_score")]
    pub structuring_score: u32,

    // === Decision ===
    /// Scores strictly below this are approved automatically
    #[serde(default = "default_auto_approve_below")]
    pub auto_approve_below: u32,

    /// Scores at or above this are held for manual review
    #[serde(default = "default_manual_review_at")]
    pub manual_review_at: u32,

    // === External services ===
    /// Timeout for sanctions lookups
    #[serde(default = "default_external_timeout_ms")]
    pub external_timeout_ms: u64,

    /// Policy when the sanctions lookup fails or times out
    #[serde(default)]
    pub fail_policy: FailPolicy,
}

/// Policy when an external lookup fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailPolicy {
    /// Raise a critical alert, forcing manual review
    #[default]
    FailClosed,

    /// Continue screening and record a low-severity alert
    FailOpen,
}

fn default_single_tx_threshold() -> Amount {
    Amount::from_cents(5_000_000).unwrap_or_default()
}

fn default_large_amount_score() -> u32 {
    25
}

fn default_cash_intensive_threshold_score() -> u32 {
    50
}

fn default_sanctions_match_threshold() -> f64 {
    0.85
}

fn default_sanctions_score() -> u32 {
    100
}

fn default_pep_score() -> u32 {
    20
}

fn default_high_risk_countries() -> Vec<String> {
    ["IR", "KP", "MM", "SY"].iter().map(|c| c.to_string()).collect()
}

fn default_geographic_score() -> u32 {
    25
}

fn default_lookback_days() -> i64 {
    30
}

fn default_daily_frequency_threshold() -> u32 {
    10
}

fn default_frequency_score() -> u32 {
    15
}

fn default_round_amount_multiple() -> Amount {
    Amount::from_cents(1_000_000).unwrap_or_default()
}

fn default_round_amount_floor() -> Amount {
    Amount::from_cents(1_000_000).unwrap_or_default()
}

fn default_round_amount_score() -> u32 {
    10
}

fn default_structuring_lower_ratio() -> Decimal {
    Decimal::new(8, 1)
}

fn default_structuring_min_count() -> u32 {
    3
}

fn default_structuring_score() -> u32 {
    50
}

fn default_auto_approve_below() -> u32 {
    30
}

fn default_manual_review_at() -> u32 {
    50
}

fn default_external_timeout_ms() -> u64 {
    500
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            single_tx_threshold: default_single_tx_threshold(),
            large_amount_score: default_large_amount_score(),
            cash_intensive_threshold_score: default_cash_intensive_threshold_score(),
            sanctions_match_threshold: default_sanctions_match_threshold(),
            sanctions_score: default_sanctions_score(),
            pep_score: default_pep_score(),
            high_risk_countries: default_high_risk_countries(),
            geographic_score: default_geographic_score(),
            lookback_days: default_lookback_days(),
            daily_frequency_threshold: default_daily_frequency_threshold(),
            frequency_score: default_frequency_score(),
            round_amount_multiple: default_round_amount_multiple(),
            round_amount_floor: default_round_amount_floor(),
            round_amount_score: default_round_amount_score(),
            structuring_lower_ratio: default_structuring_lower_ratio(),
            structuring_min_count: default_structuring_min_count(),
            structuring_score: default_structuring_score(),
            auto_approve_below: default_auto_approve_below(),
            manual_review_at: default_manual_review_at(),
            external_timeout_ms: default_external_timeout_ms(),
            fail_policy: FailPolicy::default(),
        }
    }
}

impl ScreeningConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    pub fn external_timeout(&self) -> Duration {
        Duration::from_millis(self.external_timeout_ms)
    }

    pub fn lookback(&self) -> chrono::Duration {
        chrono::Duration::days(self.lookback_days)
    }

    /// Inclusive lower bound of the structuring band
    pub fn structuring_floor(&self) -> Decimal {
        self.single_tx_threshold.value() * self.structuring_lower_ratio
    }

    pub fn is_high_risk_country(&self, country: &str) -> bool {
        self.high_risk_countries
            .iter()
            .any(|c| c.eq_ignore_ascii_case(country))
    }

    /// Reject configurations whose decision bands overlap or are empty
    pub fn validate(&self) -> Result<(), String> {
        if self.auto_approve_below > self.manual_review_at {
            return Err(format!(
                "auto_approve_below ({}) must not exceed manual_review_at ({})",
                self.auto_approve_below, self.manual_review_at
            ));
        }
        if self.structuring_lower_ratio <= Decimal::ZERO || self.structuring_lower_ratio >= Decimal::ONE {
            return Err(format!(
                "structuring_lower_ratio must be in (0, 1), got {}",
                self.structuring_lower_ratio
            ));
        }
        if !(0.0..=1.0).contains(&self.sanctions_match_threshold) {
            return Err(format!(
                "sanctions_match_threshold must be in [0, 1], got {}",
                self.sanctions_match_threshold
            ));
        }
        if self.round_amount_multiple.is_zero() {
            return Err("round_amount_multiple must be positive".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config() {
        let config = ScreeningConfig::default();

        assert_eq!(config.single_tx_threshold.value(), dec!(50000));
        assert_eq!(config.structuring_floor(), dec!(40000));
        assert_eq!(config.structuring_min_count, 3);
        assert_eq!(config.lookback_days, 30);
        assert_eq!(config.auto_approve_below, 30);
        assert_eq!(config.manual_review_at, 50);
        assert_eq!(config.round_amount_multiple.value(), dec!(10000));
        assert_eq!(config.fail_policy, FailPolicy::FailClosed);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "single_tx_threshold": "1000", "fail_policy": "fail_open" }"#;
        let config: ScreeningConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.single_tx_threshold.value(), dec!(1000));
        assert_eq!(config.fail_policy, FailPolicy::FailOpen);
        assert_eq!(config.manual_review_at, 50);
    }

    #[test]
    fn test_high_risk_country_case_insensitive() {
        let config = ScreeningConfig::default();
        assert!(config.is_high_risk_country("kp"));
        assert!(!config.is_high_risk_country("KE"));
    }

    #[test]
    fn test_overlapping_bands_rejected() {
        let config = ScreeningConfig {
            auto_approve_below: 60,
            ..ScreeningConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
