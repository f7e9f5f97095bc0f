//! Wallet snapshot

use crate::amount::Amount;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One wallet per user.
///
/// `daily_spent` and `daily_collected` refer to `last_reset_date`; they are
/// zeroed by the first access on a later calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub user_id: String,
    pub balance: Amount,
    pub daily_limit: Option<Amount>,
    pub daily_spent: Amount,
    pub daily_collected: Amount,
    pub daily_allocation: Amount,
    pub last_reset_date: NaiveDate,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// Remaining headroom under the daily limit, if one applies.
    pub fn remaining_daily_limit(&self) -> Option<Amount> {
        self.daily_limit.map(|limit| limit.saturating_sub(&self.daily_spent))
    }
}
