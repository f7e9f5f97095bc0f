//! Chart of accounts, journal entries and revenue events

use crate::codec::{parse_enum, parse_ts, ts};
use crate::error::{StoreError, StoreResult};
use crate::rows::{AccountRow, JournalEntryRow, JournalLineRow, RevenueEventRow};
use chrono::{DateTime, Utc};
use lus_ledger::{
    Account, AccountActivity, ChartOfAccounts, JournalEntry, JournalLine, RevenueEvent, Side,
};
use rust_decimal::Decimal;
use sqlx::SqliteConnection;

pub struct AccountRepo;

impl AccountRepo {
    /// Insert accounts that do not exist yet; parents must precede children.
    pub async fn seed(conn: &mut SqliteConnection, accounts: &[Account]) -> StoreResult<()> {
        for account in accounts {
            sqlx::query(
                "INSERT OR IGNORE INTO accounts (code, name, account_type, parent_code)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(&account.code)
            .bind(&account.name)
            .bind(account.account_type.to_string())
            .bind(&account.parent_code)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    pub async fn list(conn: &mut SqliteConnection) -> StoreResult<Vec<Account>> {
        sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts ORDER BY code")
            .fetch_all(&mut *conn)
            .await?
            .into_iter()
            .map(Account::try_from)
            .collect()
    }

    pub async fn chart(conn: &mut SqliteConnection) -> StoreResult<ChartOfAccounts> {
        Ok(ChartOfAccounts::new(Self::list(conn).await?)?)
    }
}

pub struct JournalRepo;

impl JournalRepo {
    /// Persist a balanced entry and its lines.
    ///
    /// The balance is re-checked here so an unbalanced entry can never reach disk,
    /// whatever built it.
    pub async fn insert(conn: &mut SqliteConnection, entry: &JournalEntry) -> StoreResult<()> {
        entry.validate_balance()?;
        sqlx::query(
            "INSERT INTO journal_entries (id, transaction_id, description, status, posted_at, reverses_entry_id)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&entry.id)
        .bind(&entry.transaction_id)
        .bind(&entry.description)
        .bind(entry.status.to_string())
        .bind(ts(&entry.posted_at))
        .bind(&entry.reverses_entry_id)
        .execute(&mut *conn)
        .await?;

        for (line_no, line) in entry.lines.iter().enumerate() {
            let cents = line.amount.to_cents()?;
            let (debit, credit) = match line.side {
                Side::Debit => (cents, 0),
                Side::Credit => (0, cents),
            };
            sqlx::query(
                "INSERT INTO journal_entry_lines
                    (entry_id, line_no, account_code, debit_cents, credit_cents, description)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&entry.id)
            .bind(line_no as i64)
            .bind(&line.account_code)
            .bind(debit)
            .bind(credit)
            .bind(&line.description)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    pub async fn get(conn: &mut SqliteConnection, id: &str) -> StoreResult<Option<JournalEntry>> {
        let row = sqlx::query_as::<_, JournalEntryRow>("SELECT * FROM journal_entries WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        match row {
            Some(row) => Ok(Some(Self::hydrate(conn, row).await?)),
            None => Ok(None),
        }
    }

    pub async fn for_transaction(
        conn: &mut SqliteConnection,
        transaction_id: &str,
    ) -> StoreResult<Vec<JournalEntry>> {
        let rows = sqlx::query_as::<_, JournalEntryRow>(
            "SELECT * FROM journal_entries WHERE transaction_id = ? ORDER BY posted_at, id",
        )
        .bind(transaction_id)
        .fetch_all(&mut *conn)
        .await?;
        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(Self::hydrate(conn, row).await?);
        }
        Ok(entries)
    }

    /// Posted entries within `[from, to]`, for regulatory reads.
    pub async fn posted_between(
        conn: &mut SqliteConnection,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<JournalEntry>> {
        let rows = sqlx::query_as::<_, JournalEntryRow>(
            "SELECT * FROM journal_entries
             WHERE status = 'posted' AND posted_at >= ? AND posted_at <= ?
             ORDER BY posted_at, id",
        )
        .bind(ts(&from))
        .bind(ts(&to))
        .fetch_all(&mut *conn)
        .await?;
        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(Self::hydrate(conn, row).await?);
        }
        Ok(entries)
    }

    async fn hydrate(conn: &mut SqliteConnection, row: JournalEntryRow) -> StoreResult<JournalEntry> {
        let lines = sqlx::query_as::<_, JournalLineRow>(
            "SELECT entry_id, account_code, debit_cents, credit_cents, description
             FROM journal_entry_lines WHERE entry_id = ? ORDER BY line_no",
        )
        .bind(&row.id)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(JournalLine::try_from)
        .collect::<StoreResult<Vec<_>>>()?;

        Ok(JournalEntry {
            status: parse_enum("journal_entries.status", &row.status)?,
            posted_at: parse_ts("journal_entries.posted_at", &row.posted_at)?,
            id: row.id,
            transaction_id: row.transaction_id,
            description: row.description,
            lines,
            reverses_entry_id: row.reverses_entry_id,
        })
    }

    /// Per-account debit/credit totals of posted entries within `[from, to]`.
    pub async fn activity(
        conn: &mut SqliteConnection,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<AccountActivity>> {
        let rows = sqlx::query_as::<_, (String, i64, i64)>(
            "SELECT l.account_code, COALESCE(SUM(l.debit_cents), 0), COALESCE(SUM(l.credit_cents), 0)
             FROM journal_entry_lines l
             JOIN journal_entries e ON e.id = l.entry_id
             WHERE e.status = 'posted' AND e.posted_at >= ? AND e.posted_at <= ?
             GROUP BY l.account_code
             ORDER BY l.account_code",
        )
        .bind(ts(&from))
        .bind(ts(&to))
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(account_code, debits, credits)| AccountActivity {
                account_code,
                total_debits: Decimal::new(debits, 2),
                total_credits: Decimal::new(credits, 2),
            })
            .collect())
    }

    /// Debit/credit totals of one account over posted entries up to `as_of`.
    pub async fn totals_as_of(
        conn: &mut SqliteConnection,
        account_code: &str,
        as_of: DateTime<Utc>,
    ) -> StoreResult<(Decimal, Decimal)> {
        let (debits, credits) = sqlx::query_as::<_, (i64, i64)>(
            "SELECT COALESCE(SUM(l.debit_cents), 0), COALESCE(SUM(l.credit_cents), 0)
             FROM journal_entry_lines l
             JOIN journal_entries e ON e.id = l.entry_id
             WHERE l.account_code = ? AND e.status = 'posted' AND e.posted_at <= ?",
        )
        .bind(account_code)
        .bind(ts(&as_of))
        .fetch_one(&mut *conn)
        .await?;
        Ok((Decimal::new(debits, 2), Decimal::new(credits, 2)))
    }

    /// Ids of entries whose persisted lines do not balance. Always empty on a healthy book.
    pub async fn unbalanced_entries(conn: &mut SqliteConnection) -> StoreResult<Vec<String>> {
        let rows = sqlx::query_as::<_, (String,)>(
            "SELECT entry_id FROM journal_entry_lines
             GROUP BY entry_id
             HAVING SUM(debit_cents) <> SUM(credit_cents) OR COUNT(*) < 2",
        )
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}

pub struct RevenueRepo;

impl RevenueRepo {
    pub async fn insert(conn: &mut SqliteConnection, event: &RevenueEvent) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO revenue_events (
                transaction_id, transaction_type, organization_id,
                transaction_fee_cents, settlement_fee_cents, total_cents, recorded_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&event.transaction_id)
        .bind(event.transaction_type.to_string())
        .bind(&event.organization_id)
        .bind(event.transaction_fee.to_cents()?)
        .bind(event.settlement_fee.to_cents()?)
        .bind(event.total.to_cents()?)
        .bind(ts(&event.recorded_at))
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub async fn between(
        conn: &mut SqliteConnection,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<RevenueEvent>> {
        sqlx::query_as::<_, RevenueEventRow>(
            "SELECT transaction_id, transaction_type, organization_id, transaction_fee_cents,
                    settlement_fee_cents, total_cents, recorded_at
             FROM revenue_events WHERE recorded_at >= ? AND recorded_at <= ?
             ORDER BY recorded_at, id",
        )
        .bind(ts(&from))
        .bind(ts(&to))
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(RevenueEvent::try_from)
        .collect()
    }
}
