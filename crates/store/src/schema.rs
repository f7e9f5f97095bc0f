//! Relational schema
//!
//! Applied idempotently by [`crate::Store::migrate`].

pub const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS organizations (
        id                          TEXT PRIMARY KEY,
        name                        TEXT NOT NULL,
        daily_collected_cents       INTEGER NOT NULL DEFAULT 0 CHECK (daily_collected_cents >= 0),
        daily_settlement_used_cents INTEGER NOT NULL DEFAULT 0 CHECK (daily_settlement_used_cents >= 0),
        counters_date               TEXT NOT NULL,
        created_at                  TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id              TEXT PRIMARY KEY,
        full_name       TEXT NOT NULL,
        role            TEXT NOT NULL,
        organization_id TEXT REFERENCES organizations(id),
        country         TEXT,
        is_pep          INTEGER NOT NULL DEFAULT 0,
        created_at      TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS wallets (
        user_id                TEXT PRIMARY KEY REFERENCES users(id),
        balance_cents          INTEGER NOT NULL DEFAULT 0 CHECK (balance_cents >= 0),
        daily_limit_cents      INTEGER,
        daily_spent_cents      INTEGER NOT NULL DEFAULT 0 CHECK (daily_spent_cents >= 0),
        daily_collected_cents  INTEGER NOT NULL DEFAULT 0 CHECK (daily_collected_cents >= 0),
        daily_allocation_cents INTEGER NOT NULL DEFAULT 0 CHECK (daily_allocation_cents >= 0),
        last_reset_date        TEXT NOT NULL,
        is_active              INTEGER NOT NULL DEFAULT 1,
        created_at             TEXT NOT NULL,
        updated_at             TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS transactions (
        transaction_id   TEXT PRIMARY KEY,
        from_user_id     TEXT NOT NULL REFERENCES users(id),
        to_user_id       TEXT REFERENCES users(id),
        amount_cents     INTEGER NOT NULL CHECK (amount_cents > 0),
        transaction_type TEXT NOT NULL,
        status           TEXT NOT NULL,
        priority         TEXT NOT NULL,
        vmf_number       TEXT,
        expires_at       TEXT,
        rejection_reason TEXT,
        processed_by     TEXT,
        created_at       TEXT NOT NULL,
        updated_at       TEXT NOT NULL,
        completed_at     TEXT
    )
    "#,
    // At most one open pending transaction per originator and type
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS idx_transactions_single_pending
        ON transactions(from_user_id, transaction_type)
        WHERE status = 'pending'
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_transactions_from_created
        ON transactions(from_user_id, created_at)
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_transactions_status_expiry
        ON transactions(status, expires_at)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS accounts (
        code         TEXT PRIMARY KEY,
        name         TEXT NOT NULL,
        account_type TEXT NOT NULL,
        parent_code  TEXT REFERENCES accounts(code)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS journal_entries (
        id             TEXT PRIMARY KEY,
        transaction_id TEXT REFERENCES transactions(transaction_id),
        description    TEXT NOT NULL,
        status         TEXT NOT NULL,
        posted_at      TEXT NOT NULL,
        reverses_entry_id TEXT UNIQUE REFERENCES journal_entries(id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS journal_entry_lines (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        entry_id     TEXT NOT NULL REFERENCES journal_entries(id),
        line_no      INTEGER NOT NULL,
        account_code TEXT NOT NULL REFERENCES accounts(code),
        debit_cents  INTEGER NOT NULL DEFAULT 0 CHECK (debit_cents >= 0),
        credit_cents INTEGER NOT NULL DEFAULT 0 CHECK (credit_cents >= 0),
        description  TEXT,
        CHECK ((debit_cents = 0) <> (credit_cents = 0))
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_journal_lines_entry ON journal_entry_lines(entry_id)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS revenue_events (
        id                   INTEGER PRIMARY KEY AUTOINCREMENT,
        transaction_id       TEXT NOT NULL REFERENCES transactions(transaction_id),
        transaction_type     TEXT NOT NULL,
        organization_id      TEXT REFERENCES organizations(id),
        transaction_fee_cents INTEGER NOT NULL,
        settlement_fee_cents INTEGER NOT NULL,
        total_cents          INTEGER NOT NULL,
        recorded_at          TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS settlement_requests (
        id              TEXT PRIMARY KEY,
        organization_id TEXT NOT NULL REFERENCES organizations(id),
        user_id         TEXT NOT NULL REFERENCES users(id),
        amount_cents    INTEGER NOT NULL CHECK (amount_cents > 0),
        bank_name       TEXT NOT NULL,
        account_number  TEXT NOT NULL,
        status          TEXT NOT NULL,
        priority        TEXT NOT NULL,
        hold_reason     TEXT,
        reject_reason   TEXT,
        reason_comment  TEXT CHECK (reason_comment IS NULL OR length(reason_comment) <= 125),
        reviewed_by     TEXT REFERENCES users(id),
        reviewed_at     TEXT,
        transaction_id  TEXT REFERENCES transactions(transaction_id),
        payout_reference TEXT,
        counters_date   TEXT NOT NULL,
        created_at      TEXT NOT NULL,
        updated_at      TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS settlement_reviews (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        settlement_id TEXT NOT NULL REFERENCES settlement_requests(id),
        from_status   TEXT NOT NULL,
        to_status     TEXT NOT NULL,
        reviewer_id   TEXT NOT NULL,
        reason        TEXT,
        comment       TEXT,
        reviewed_at   TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS compliance_alerts (
        id              TEXT PRIMARY KEY,
        alert_type      TEXT NOT NULL,
        severity        TEXT NOT NULL,
        risk_score      INTEGER NOT NULL,
        triggered_rules TEXT NOT NULL,
        description     TEXT NOT NULL,
        user_id         TEXT NOT NULL REFERENCES users(id),
        transaction_id  TEXT REFERENCES transactions(transaction_id),
        settlement_id   TEXT REFERENCES settlement_requests(id),
        decision        TEXT NOT NULL,
        status          TEXT NOT NULL,
        reviewed_by     TEXT,
        reviewed_at     TEXT,
        created_at      TEXT NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_alerts_user_created ON compliance_alerts(user_id, created_at)
    "#,
];
