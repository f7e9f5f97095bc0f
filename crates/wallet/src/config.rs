//! Per-role wallet policy
//!
//! Which daily counters a wallet keeps, and any cap on them, is decided by
//! the owner's role. Values come from configuration, never from constants in
//! the manager.

use lus_core::{Amount, UserRole};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Daily-tracking policy of one role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RolePolicy {
    /// Accumulate outgoing amounts in `daily_spent`
    #[serde(default)]
    pub tracks_daily_spending: bool,

    /// Cap on `daily_spent`; only meaningful when spending is tracked
    #[serde(default)]
    pub daily_limit: Option<Amount>,

    /// Accumulate incoming amounts in `daily_collected`
    #[serde(default)]
    pub tracks_collections: bool,

    /// Balance is a float replaced by `daily_allocation` every day
    #[serde(default)]
    pub allocation_based: bool,
}

impl RolePolicy {
    pub fn tracks_daily_usage(&self) -> bool {
        self.tracks_daily_spending || self.tracks_collections || self.allocation_based
    }
}

/// Wallet & limit configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitConfig {
    #[serde(default = "default_customer_policy")]
    pub customer: RolePolicy,

    #[serde(default = "default_merchant_policy")]
    pub merchant: RolePolicy,

    #[serde(default = "default_cashier_policy")]
    pub cashier: RolePolicy,

    #[serde(default)]
    pub finance: RolePolicy,

    #[serde(default)]
    pub admin: RolePolicy,

    /// Float given to a cashier until an explicit allocation is set
    #[serde(default)]
    pub default_cashier_allocation: Amount,
}

fn default_customer_policy() -> RolePolicy {
    RolePolicy {
        tracks_daily_spending: true,
        daily_limit: Amount::new(Decimal::new(50_000, 0)).ok(),
        ..RolePolicy::default()
    }
}

fn default_merchant_policy() -> RolePolicy {
    RolePolicy {
        tracks_collections: true,
        ..RolePolicy::default()
    }
}

fn default_cashier_policy() -> RolePolicy {
    RolePolicy {
        allocation_based: true,
        ..RolePolicy::default()
    }
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            customer: default_customer_policy(),
            merchant: default_merchant_policy(),
            cashier: default_cashier_policy(),
            finance: RolePolicy::default(),
            admin: RolePolicy::default(),
            default_cashier_allocation: Amount::ZERO,
        }
    }
}

impl LimitConfig {
    pub fn policy_for(&self, role: UserRole) -> &RolePolicy {
        match role {
            UserRole::Customer => &self.customer,
            UserRole::Merchant => &self.merchant,
            UserRole::Cashier => &self.cashier,
            UserRole::Finance => &self.finance,
            UserRole::Admin => &self.admin,
        }
    }

    /// Daily limit stored on a newly created wallet
    pub fn initial_daily_limit(&self, role: UserRole) -> Option<Amount> {
        let policy = self.policy_for(role);
        if policy.tracks_daily_spending {
            policy.daily_limit
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_policies() {
        let config = LimitConfig::default();
        assert_eq!(
            config.initial_daily_limit(UserRole::Customer),
            Some(Amount::new(dec!(50000)).unwrap())
        );
        assert!(config.policy_for(UserRole::Merchant).tracks_collections);
        assert!(config.policy_for(UserRole::Cashier).allocation_based);
        assert!(!config.policy_for(UserRole::Admin).tracks_daily_usage());
        assert_eq!(config.initial_daily_limit(UserRole::Merchant), None);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: LimitConfig =
            serde_json::from_str(r#"{"customer": {"tracks_daily_spending": true, "daily_limit": "100"}}"#)
                .unwrap();
        assert_eq!(config.customer.daily_limit, Some(Amount::new(dec!(100)).unwrap()));
        assert!(config.merchant.tracks_collections);
    }
}
