//! Row structs mapped from SQLite and their conversion into domain types

use crate::codec::{amount, parse_day, parse_enum, parse_opt_enum, parse_opt_ts, parse_ts};
use crate::error::{StoreError, StoreResult};
use lus_core::{
    ComplianceAlert, Organization, SettlementRequest, SettlementReview, Transaction, TransactionId,
    User, Wallet,
};
use lus_ledger::{Account, JournalLine, RevenueEvent, Side};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub full_name: String,
    pub role: String,
    pub organization_id: Option<String>,
    pub country: Option<String>,
    pub is_pep: bool,
    pub created_at: String,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> StoreResult<Self> {
        Ok(User {
            id: row.id,
            full_name: row.full_name,
            role: parse_enum("users.role", &row.role)?,
            organization_id: row.organization_id,
            country: row.country,
            is_pep: row.is_pep,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrganizationRow {
    pub id: String,
    pub name: String,
    pub daily_collected_cents: i64,
    pub daily_settlement_used_cents: i64,
    pub counters_date: String,
    pub created_at: String,
}

impl From<OrganizationRow> for Organization {
    fn from(row: OrganizationRow) -> Self {
        Organization {
            id: row.id,
            name: row.name,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WalletRow {
    pub user_id: String,
    pub balance_cents: i64,
    pub daily_limit_cents: Option<i64>,
    pub daily_spent_cents: i64,
    pub daily_collected_cents: i64,
    pub daily_allocation_cents: i64,
    pub last_reset_date: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<WalletRow> for Wallet {
    type Error = StoreError;

    fn try_from(row: WalletRow) -> StoreResult<Self> {
        Ok(Wallet {
            user_id: row.user_id,
            balance: amount(row.balance_cents)?,
            daily_limit: row.daily_limit_cents.map(amount).transpose()?,
            daily_spent: amount(row.daily_spent_cents)?,
            daily_collected: amount(row.daily_collected_cents)?,
            daily_allocation: amount(row.daily_allocation_cents)?,
            last_reset_date: parse_day("wallets.last_reset_date", &row.last_reset_date)?,
            is_active: row.is_active,
            created_at: parse_ts("wallets.created_at", &row.created_at)?,
            updated_at: parse_ts("wallets.updated_at", &row.updated_at)?,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TransactionRow {
    pub transaction_id: String,
    pub from_user_id: String,
    pub to_user_id: Option<String>,
    pub amount_cents: i64,
    pub transaction_type: String,
    pub status: String,
    pub priority: String,
    pub vmf_number: Option<String>,
    pub expires_at: Option<String>,
    pub rejection_reason: Option<String>,
    pub processed_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub completed_at: Option<String>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = StoreError;

    fn try_from(row: TransactionRow) -> StoreResult<Self> {
        Ok(Transaction {
            transaction_id: TransactionId::from(row.transaction_id),
            from_user_id: row.from_user_id,
            to_user_id: row.to_user_id,
            amount: amount(row.amount_cents)?,
            transaction_type: parse_enum("transactions.transaction_type", &row.transaction_type)?,
            status: parse_enum("transactions.status", &row.status)?,
            priority: parse_enum("transactions.priority", &row.priority)?,
            vmf_number: row.vmf_number,
            expires_at: parse_opt_ts("transactions.expires_at", row.expires_at.as_deref())?,
            rejection_reason: row.rejection_reason,
            processed_by: row.processed_by,
            created_at: parse_ts("transactions.created_at", &row.created_at)?,
            updated_at: parse_ts("transactions.updated_at", &row.updated_at)?,
            completed_at: parse_opt_ts("transactions.completed_at", row.completed_at.as_deref())?,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SettlementRow {
    pub id: String,
    pub organization_id: String,
    pub user_id: String,
    pub amount_cents: i64,
    pub bank_name: String,
    pub account_number: String,
    pub status: String,
    pub priority: String,
    pub hold_reason: Option<String>,
    pub reject_reason: Option<String>,
    pub reason_comment: Option<String>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<String>,
    pub transaction_id: Option<String>,
    pub payout_reference: Option<String>,
    pub counters_date: String,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<SettlementRow> for SettlementRequest {
    type Error = StoreError;

    fn try_from(row: SettlementRow) -> StoreResult<Self> {
        Ok(SettlementRequest {
            id: row.id,
            organization_id: row.organization_id,
            user_id: row.user_id,
            amount: amount(row.amount_cents)?,
            bank_name: row.bank_name,
            account_number: row.account_number,
            status: parse_enum("settlement_requests.status", &row.status)?,
            priority: parse_enum("settlement_requests.priority", &row.priority)?,
            hold_reason: parse_opt_enum("settlement_requests.hold_reason", row.hold_reason.as_deref())?,
            reject_reason: parse_opt_enum(
                "settlement_requests.reject_reason",
                row.reject_reason.as_deref(),
            )?,
            reason_comment: row.reason_comment,
            reviewed_by: row.reviewed_by,
            reviewed_at: parse_opt_ts("settlement_requests.reviewed_at", row.reviewed_at.as_deref())?,
            transaction_id: row.transaction_id,
            payout_reference: row.payout_reference,
            created_at: parse_ts("settlement_requests.created_at", &row.created_at)?,
            updated_at: parse_ts("settlement_requests.updated_at", &row.updated_at)?,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SettlementReviewRow {
    pub settlement_id: String,
    pub from_status: String,
    pub to_status: String,
    pub reviewer_id: String,
    pub reason: Option<String>,
    pub comment: Option<String>,
    pub reviewed_at: String,
}

impl TryFrom<SettlementReviewRow> for SettlementReview {
    type Error = StoreError;

    fn try_from(row: SettlementReviewRow) -> StoreResult<Self> {
        Ok(SettlementReview {
            settlement_id: row.settlement_id,
            from_status: parse_enum("settlement_reviews.from_status", &row.from_status)?,
            to_status: parse_enum("settlement_reviews.to_status", &row.to_status)?,
            reviewer_id: row.reviewer_id,
            reason: parse_opt_enum("settlement_reviews.reason", row.reason.as_deref())?,
            comment: row.comment,
            reviewed_at: parse_ts("settlement_reviews.reviewed_at", &row.reviewed_at)?,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AlertRow {
    pub id: String,
    pub alert_type: String,
    pub severity: String,
    pub risk_score: i64,
    pub triggered_rules: String,
    pub description: String,
    pub user_id: String,
    pub transaction_id: Option<String>,
    pub settlement_id: Option<String>,
    pub decision: String,
    pub status: String,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<String>,
    pub created_at: String,
}

impl TryFrom<AlertRow> for ComplianceAlert {
    type Error = StoreError;

    fn try_from(row: AlertRow) -> StoreResult<Self> {
        Ok(ComplianceAlert {
            id: row.id,
            alert_type: parse_enum("compliance_alerts.alert_type", &row.alert_type)?,
            severity: parse_enum("compliance_alerts.severity", &row.severity)?,
            risk_score: u32::try_from(row.risk_score).map_err(|_| {
                StoreError::invalid_value("compliance_alerts.risk_score", row.risk_score.to_string())
            })?,
            triggered_rules: serde_json::from_str(&row.triggered_rules)?,
            description: row.description,
            user_id: row.user_id,
            transaction_id: row.transaction_id,
            settlement_id: row.settlement_id,
            decision: parse_enum("compliance_alerts.decision", &row.decision)?,
            status: parse_enum("compliance_alerts.status", &row.status)?,
            reviewed_by: row.reviewed_by,
            reviewed_at: parse_opt_ts("compliance_alerts.reviewed_at", row.reviewed_at.as_deref())?,
            created_at: parse_ts("compliance_alerts.created_at", &row.created_at)?,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccountRow {
    pub code: String,
    pub name: String,
    pub account_type: String,
    pub parent_code: Option<String>,
}

impl TryFrom<AccountRow> for Account {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> StoreResult<Self> {
        Ok(Account {
            code: row.code,
            name: row.name,
            account_type: parse_enum("accounts.account_type", &row.account_type)?,
            parent_code: row.parent_code,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JournalEntryRow {
    pub id: String,
    pub transaction_id: Option<String>,
    pub description: String,
    pub status: String,
    pub posted_at: String,
    pub reverses_entry_id: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JournalLineRow {
    pub entry_id: String,
    pub account_code: String,
    pub debit_cents: i64,
    pub credit_cents: i64,
    pub description: Option<String>,
}

impl TryFrom<JournalLineRow> for JournalLine {
    type Error = StoreError;

    fn try_from(row: JournalLineRow) -> StoreResult<Self> {
        let (side, cents) = match (row.debit_cents, row.credit_cents) {
            (d, 0) if d > 0 => (Side::Debit, d),
            (0, c) if c > 0 => (Side::Credit, c),
            (d, c) => {
                return Err(StoreError::invalid_value(
                    "journal_entry_lines.amount",
                    format!("debit={d} credit={c}"),
                ))
            }
        };
        Ok(JournalLine {
            account_code: row.account_code,
            side,
            amount: amount(cents)?,
            description: row.description,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RevenueEventRow {
    pub transaction_id: String,
    pub transaction_type: String,
    pub organization_id: Option<String>,
    pub transaction_fee_cents: i64,
    pub settlement_fee_cents: i64,
    pub total_cents: i64,
    pub recorded_at: String,
}

impl TryFrom<RevenueEventRow> for RevenueEvent {
    type Error = StoreError;

    fn try_from(row: RevenueEventRow) -> StoreResult<Self> {
        Ok(RevenueEvent {
            transaction_id: row.transaction_id,
            transaction_type: parse_enum("revenue_events.transaction_type", &row.transaction_type)?,
            organization_id: row.organization_id,
            transaction_fee: amount(row.transaction_fee_cents)?,
            settlement_fee: amount(row.settlement_fee_cents)?,
            total: amount(row.total_cents)?,
            recorded_at: parse_ts("revenue_events.recorded_at", &row.recorded_at)?,
        })
    }
}
