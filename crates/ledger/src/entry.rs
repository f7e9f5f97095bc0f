//! Journal entries and their lines

use crate::error::{LedgerError, LedgerResult};
use chrono::{DateTime, Utc};
use lus_core::Amount;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Debit,
    Credit,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::Debit => Side::Credit,
            Side::Credit => Side::Debit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Draft,
    Posted,
}

/// A single debit or credit against one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    pub account_code: String,
    pub side: Side,
    pub amount: Amount,
    pub description: Option<String>,
}

impl JournalLine {
    pub fn debit(account_code: impl Into<String>, amount: Amount) -> Self {
        Self {
            account_code: account_code.into(),
            side: Side::Debit,
            amount,
            description: None,
        }
    }

    pub fn credit(account_code: impl Into<String>, amount: Amount) -> Self {
        Self {
            account_code: account_code.into(),
            side: Side::Credit,
            amount,
            description: None,
        }
    }

    pub fn debit_amount(&self) -> Decimal {
        match self.side {
            Side::Debit => self.amount.value(),
            Side::Credit => Decimal::ZERO,
        }
    }

    pub fn credit_amount(&self) -> Decimal {
        match self.side {
            Side::Credit => self.amount.value(),
            Side::Debit => Decimal::ZERO,
        }
    }
}

/// One accounting event.
///
/// Entries are only constructed through [`JournalEntryBuilder::build`], which
/// refuses unbalanced line sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: String,
    pub transaction_id: Option<String>,
    pub description: String,
    pub status: EntryStatus,
    pub posted_at: DateTime<Utc>,
    pub lines: Vec<JournalLine>,
    /// Set on a reversal: the entry it mirrors
    #[serde(default)]
    pub reverses_entry_id: Option<String>,
}

impl JournalEntry {
    pub fn total_debits(&self) -> Decimal {
        self.lines.iter().map(JournalLine::debit_amount).sum()
    }

    pub fn total_credits(&self) -> Decimal {
        self.lines.iter().map(JournalLine::credit_amount).sum()
    }

    /// Double-entry check: at least two lines, no zero lines, debits == credits.
    pub fn validate_balance(&self) -> LedgerResult<()> {
        if self.lines.len() < 2 {
            return Err(LedgerError::InsufficientLines);
        }
        if let Some(line) = self.lines.iter().find(|l| l.amount.is_zero()) {
            return Err(LedgerError::ZeroLine {
                account: line.account_code.clone(),
            });
        }
        let debits = self.total_debits();
        let credits = self.total_credits();
        if debits != credits {
            return Err(LedgerError::UnbalancedEntry { debits, credits });
        }
        Ok(())
    }

    /// Mirror entry with every debit and credit swapped.
    pub fn reversal(&self, posted_at: DateTime<Utc>) -> LedgerResult<JournalEntry> {
        let mut builder = JournalEntryBuilder::new()
            .description(format!("Reversal of {}", self.id))
            .reverses(self.id.clone())
            .posted_at(posted_at);
        if let Some(tx) = &self.transaction_id {
            builder = builder.transaction_id(tx.clone());
        }
        for line in &self.lines {
            builder = builder.line(JournalLine {
                side: line.side.opposite(),
                ..line.clone()
            });
        }
        builder.build()
    }
}

/// Builder for journal entries
#[derive(Debug, Default)]
pub struct JournalEntryBuilder {
    transaction_id: Option<String>,
    description: Option<String>,
    posted_at: Option<DateTime<Utc>>,
    lines: Vec<JournalLine>,
    reverses_entry_id: Option<String>,
}

impl JournalEntryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transaction_id(mut self, id: impl Into<String>) -> Self {
        self.transaction_id = Some(id.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn reverses(mut self, entry_id: impl Into<String>) -> Self {
        self.reverses_entry_id = Some(entry_id.into());
        self
    }

    pub fn posted_at(mut self, at: DateTime<Utc>) -> Self {
        self.posted_at = Some(at);
        self
    }

    pub fn debit(self, account_code: impl Into<String>, amount: Amount) -> Self {
        self.line(JournalLine::debit(account_code, amount))
    }

    pub fn credit(self, account_code: impl Into<String>, amount: Amount) -> Self {
        self.line(JournalLine::credit(account_code, amount))
    }

    /// Zero-value lines are dropped
    pub fn line(mut self, line: JournalLine) -> Self {
        if !line.amount.is_zero() {
            self.lines.push(line);
        }
        self
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn build(self) -> LedgerResult<JournalEntry> {
        let entry = JournalEntry {
            id: format!("JE-{}", &Uuid::new_v4().simple().to_string()[..12].to_uppercase()),
            transaction_id: self.transaction_id,
            description: self.description.unwrap_or_default(),
            status: EntryStatus::Posted,
            posted_at: self.posted_at.unwrap_or_else(Utc::now),
            lines: self.lines,
            reverses_entry_id: self.reverses_entry_id,
        };
        entry.validate_balance()?;
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn amount(v: Decimal) -> Amount {
        Amount::new(v).unwrap()
    }

    #[test]
    fn test_balanced_entry_builds() {
        let entry = JournalEntryBuilder::new()
            .transaction_id("LUS-ABC123")
            .debit("1000", amount(dec!(10000)))
            .credit("2000", amount(dec!(9900)))
            .credit("4000", amount(dec!(100)))
            .build()
            .unwrap();
        assert_eq!(entry.lines.len(), 3);
        assert_eq!(entry.total_debits(), entry.total_credits());
        assert!(entry.id.starts_with("JE-"));
    }

    #[test]
    fn test_unbalanced_entry_rejected() {
        let result = JournalEntryBuilder::new()
            .debit("1000", amount(dec!(100)))
            .credit("2000", amount(dec!(99.99)))
            .build();
        assert!(matches!(result, Err(LedgerError::UnbalancedEntry { .. })));
    }

    #[test]
    fn test_single_line_rejected() {
        let result = JournalEntryBuilder::new()
            .debit("1000", amount(dec!(100)))
            .credit("4000", Amount::ZERO)
            .build();
        assert_eq!(result, Err(LedgerError::InsufficientLines));
    }

    #[test]
    fn test_reversal_swaps_sides() {
        let entry = JournalEntryBuilder::new()
            .debit("2000", amount(dec!(50)))
            .credit("1000", amount(dec!(45)))
            .credit("4000", amount(dec!(5)))
            .build()
            .unwrap();
        let reversal = entry.reversal(Utc::now()).unwrap();
        assert_eq!(reversal.lines[0].side, Side::Credit);
        assert_eq!(reversal.lines[1].side, Side::Debit);
        assert_ne!(reversal.id, entry.id);
        assert_eq!(reversal.reverses_entry_id.as_deref(), Some(entry.id.as_str()));
        assert_eq!(entry.reverses_entry_id, None);
    }
}
