//! CLI commands
//!
//! Each command prints a short confirmation and returns what it produced so
//! tests can drive the same code paths as the binary.

use crate::context::AppContext;
use chrono::{DateTime, Duration, Utc};
use lus_compliance::{list_alerts, review_alert, suspicious_transaction_report, SuspiciousActivityReport};
use lus_core::{
    AlertStatus, Amount, ComplianceAlert, Organization, Priority, SettlementReason,
    SettlementRequest, Transaction, TransactionStatus, TransactionType, User, UserRole, Wallet,
};
use lus_engine::{NewTransaction, TransactionOutcome};
use lus_ledger::{AccountBalance, FinancialStatements, RevenueReport};
use lus_settlement::SettlementOutcome;
use lus_store::{AccountRepo, AlertFilter, OrganizationRepo, SettlementStats, UserRepo};
use rust_decimal::Decimal;
use serde::Serialize;

/// Report the chart of accounts and check persisted entries balance.
pub async fn init(ctx: &AppContext) -> anyhow::Result<usize> {
    let mut conn = ctx.store.acquire().await?;
    let accounts = AccountRepo::list(&mut conn).await?;
    let unbalanced = ctx.engine.book().unbalanced_entries(&mut conn).await?;
    if !unbalanced.is_empty() {
        anyhow::bail!("{} unbalanced journal entries: {}", unbalanced.len(), unbalanced.join(", "));
    }

    println!("✅ Store ready with {} accounts", accounts.len());
    for account in &accounts {
        println!("   {} {:<28} {}", account.code, account.name, account.account_type);
    }
    Ok(accounts.len())
}

pub async fn add_organization(ctx: &AppContext, id: &str, name: &str) -> anyhow::Result<Organization> {
    let org = Organization {
        id: id.to_string(),
        name: name.to_string(),
    };
    let mut conn = ctx.store.acquire().await?;
    OrganizationRepo::insert(&mut conn, &org, ctx.clock().now()).await?;
    println!("✅ Organization {} ({}) added", org.id, org.name);
    Ok(org)
}

#[allow(clippy::too_many_arguments)]
pub async fn add_user(
    ctx: &AppContext,
    id: &str,
    name: &str,
    role: UserRole,
    organization: Option<&str>,
    country: Option<&str>,
    pep: bool,
) -> anyhow::Result<User> {
    let mut user = User::new(id, name, role).with_pep(pep);
    if let Some(org) = organization {
        user = user.with_organization(org);
    }
    if let Some(country) = country {
        user = user.with_country(country);
    }

    let mut conn = ctx.store.acquire().await?;
    UserRepo::insert(&mut conn, &user, ctx.clock().now()).await?;
    ctx.engine.wallets().wallet_for(&mut conn, &user).await?;
    println!("✅ User {} added as {}", user.id, user.role);
    Ok(user)
}

pub async fn wallet_show(ctx: &AppContext, user_id: &str) -> anyhow::Result<Wallet> {
    let mut conn = ctx.store.acquire().await?;
    let user = UserRepo::require(&mut conn, user_id).await?;
    let wallet = ctx.engine.wallets().wallet_for(&mut conn, &user).await?;

    println!("Wallet of {} ({})", user.id, user.role);
    println!("   balance:         {}", wallet.balance);
    if let Some(remaining) = wallet.remaining_daily_limit() {
        println!("   daily spent:     {} (remaining {})", wallet.daily_spent, remaining);
    }
    if ctx.engine.wallets().policy_for(&user).tracks_collections {
        println!("   collected today: {}", wallet.daily_collected);
    }
    if ctx.engine.wallets().policy_for(&user).allocation_based {
        println!("   allocation:      {}", wallet.daily_allocation);
    }
    if !wallet.is_active {
        println!("   FROZEN");
    }
    Ok(wallet)
}

pub async fn wallet_allocate(ctx: &AppContext, user_id: &str, amount: Decimal) -> anyhow::Result<Wallet> {
    let amount = Amount::new(amount)?;
    let mut conn = ctx.store.acquire().await?;
    let wallet = ctx
        .engine
        .wallets()
        .set_cashier_daily_allocation(&mut conn, user_id, amount)
        .await?;
    println!("✅ Daily allocation of {} set to {}", user_id, amount);
    Ok(wallet)
}

pub async fn wallet_freeze(ctx: &AppContext, user_id: &str, frozen: bool) -> anyhow::Result<Wallet> {
    let mut conn = ctx.store.acquire().await?;
    let wallet = ctx.engine.wallets().set_wallet_active(&mut conn, user_id, !frozen).await?;
    println!("✅ Wallet of {} {}", user_id, if frozen { "frozen" } else { "unfrozen" });
    Ok(wallet)
}

pub async fn tx_create(ctx: &AppContext, request: NewTransaction) -> anyhow::Result<TransactionOutcome> {
    let outcome = ctx.engine.create_transaction(request).await?;
    let tx = &outcome.transaction;
    println!(
        "✅ {} {} {} -> {} [{}] risk {} ({})",
        tx.transaction_id,
        tx.transaction_type,
        tx.amount,
        tx.to_user_id.as_deref().unwrap_or("-"),
        tx.status,
        outcome.screening.risk_score,
        outcome.decision()
    );
    if let Some(expires_at) = tx.expires_at {
        println!("   expires at {expires_at}");
    }
    Ok(outcome)
}

/// Approve, complete or reject a transaction on behalf of `actor_id`.
pub async fn tx_update(
    ctx: &AppContext,
    transaction_id: &str,
    target: TransactionStatus,
    actor_id: &str,
    reason: Option<&str>,
) -> anyhow::Result<Transaction> {
    let actor = ctx.actor(actor_id).await?;
    let tx = ctx
        .engine
        .update_transaction_status(transaction_id, target, &actor, reason)
        .await?;
    println!("✅ {} is now {}", tx.transaction_id, tx.status);
    Ok(tx)
}

pub async fn tx_list(
    ctx: &AppContext,
    user_id: &str,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    pending_only: bool,
) -> anyhow::Result<Vec<Transaction>> {
    let transactions = if pending_only {
        ctx.engine.list_active_pending(Some(user_id)).await?
    } else {
        let (from, to) = period(ctx, from, to);
        ctx.engine.list_transactions(user_id, from, to).await?
    };
    for tx in &transactions {
        println!(
            "{}  {:<16} {:>14}  {:<9} {}",
            tx.transaction_id, tx.transaction_type, tx.amount, tx.status, tx.created_at
        );
    }
    println!("{} transactions", transactions.len());
    Ok(transactions)
}

pub async fn settlement_create(
    ctx: &AppContext,
    requester_id: &str,
    amount: Decimal,
    bank_name: &str,
    account_number: &str,
) -> anyhow::Result<SettlementOutcome> {
    let outcome = ctx
        .settlement
        .create_settlement_request(requester_id, amount, bank_name, account_number)
        .await?;
    let request = &outcome.request;
    println!(
        "✅ Settlement {} for {} requested by {} ({} priority, risk {})",
        request.id, request.amount, request.user_id, request.priority, outcome.screening.risk_score
    );
    if request.priority == Priority::High {
        println!("   flagged for manual review: {}", outcome.screening.triggered_rules().join(", "));
    }
    Ok(outcome)
}

pub async fn settlement_approve(ctx: &AppContext, id: &str, actor_id: &str) -> anyhow::Result<SettlementRequest> {
    let actor = ctx.actor(actor_id).await?;
    let request = ctx.settlement.approve(id, &actor).await?;
    println!(
        "✅ Settlement {} approved by {} (transaction {})",
        request.id,
        actor.user_id,
        request.transaction_id.as_deref().unwrap_or("-")
    );
    Ok(request)
}

pub async fn settlement_hold(
    ctx: &AppContext,
    id: &str,
    actor_id: &str,
    reason: SettlementReason,
    comment: Option<&str>,
) -> anyhow::Result<SettlementRequest> {
    let actor = ctx.actor(actor_id).await?;
    let request = ctx.settlement.hold(id, &actor, reason, comment).await?;
    println!("⏸  Settlement {} held: {}", request.id, reason);
    Ok(request)
}

pub async fn settlement_reject(
    ctx: &AppContext,
    id: &str,
    actor_id: &str,
    reason: SettlementReason,
    comment: Option<&str>,
) -> anyhow::Result<SettlementRequest> {
    let actor = ctx.actor(actor_id).await?;
    let request = ctx.settlement.reject(id, &actor, reason, comment).await?;
    println!("❌ Settlement {} rejected: {}", request.id, reason);
    Ok(request)
}

pub async fn settlement_payout(
    ctx: &AppContext,
    id: &str,
    success: bool,
    reference: Option<&str>,
) -> anyhow::Result<SettlementRequest> {
    let request = ctx.settlement.record_payout_result(id, success, reference).await?;
    println!("✅ Settlement {} is now {}", request.id, request.status);
    Ok(request)
}

pub async fn settlement_stats(ctx: &AppContext) -> anyhow::Result<SettlementStats> {
    let stats = ctx.settlement.settlement_stats().await?;
    for (status, count) in &stats.by_status {
        println!("{status:<10} {count}");
    }
    println!("{:<10} {}", "total", stats.total());
    Ok(stats)
}

pub async fn alerts_list(
    ctx: &AppContext,
    status: Option<AlertStatus>,
    user_id: Option<&str>,
) -> anyhow::Result<Vec<ComplianceAlert>> {
    let filter = AlertFilter {
        status,
        user_id: user_id.map(str::to_string),
    };
    let mut conn = ctx.store.acquire().await?;
    let alerts = list_alerts(&mut conn, &filter).await?;
    for alert in &alerts {
        println!(
            "{}  {:<18} {:<8} score {:>3}  {:<8} {}",
            alert.id, alert.alert_type, alert.severity, alert.risk_score, alert.status, alert.description
        );
    }
    println!("{} alerts", alerts.len());
    Ok(alerts)
}

pub async fn alerts_review(
    ctx: &AppContext,
    alert_id: &str,
    reviewer_id: &str,
    outcome: AlertStatus,
) -> anyhow::Result<ComplianceAlert> {
    let reviewer = ctx.actor(reviewer_id).await?;
    let mut conn = ctx.store.acquire().await?;
    let alert = review_alert(&mut conn, alert_id, &reviewer.user_id, outcome, ctx.clock().now()).await?;
    println!("✅ Alert {} {}", alert.id, alert.status);
    Ok(alert)
}

pub async fn report_statements(
    ctx: &AppContext,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> anyhow::Result<FinancialStatements> {
    let (from, to) = period(ctx, from, to);
    let mut conn = ctx.store.acquire().await?;
    let statements = ctx.engine.book().financial_statements(&mut conn, from, to).await?;
    print_json(&statements)?;
    Ok(statements)
}

pub async fn report_revenue(
    ctx: &AppContext,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> anyhow::Result<RevenueReport> {
    let (from, to) = period(ctx, from, to);
    let mut conn = ctx.store.acquire().await?;
    let report = ctx.engine.book().revenue_report(&mut conn, from, to).await?;
    print_json(&report)?;
    Ok(report)
}

pub async fn report_balance(
    ctx: &AppContext,
    account_code: &str,
    as_of: Option<DateTime<Utc>>,
) -> anyhow::Result<AccountBalance> {
    let as_of = as_of.unwrap_or_else(|| ctx.clock().now());
    let mut conn = ctx.store.acquire().await?;
    let balance = ctx.engine.book().account_balance(&mut conn, account_code, as_of).await?;
    println!("{} ({}) as of {}: {}", balance.account_code, balance.account_type, as_of, balance.balance);
    Ok(balance)
}

pub async fn report_str(
    ctx: &AppContext,
    user_id: &str,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> anyhow::Result<SuspiciousActivityReport> {
    let (from, to) = period(ctx, from, to);
    let report = suspicious_transaction_report(
        ctx.engine.gate(),
        &ctx.store,
        user_id,
        from,
        to,
        ctx.clock().now(),
    )
    .await?;
    print_json(&report)?;
    Ok(report)
}

/// Reports default to the last 30 days.
fn period(ctx: &AppContext, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> (DateTime<Utc>, DateTime<Utc>) {
    let to = to.unwrap_or_else(|| ctx.clock().now());
    let from = from.unwrap_or_else(|| to - Duration::days(30));
    (from, to)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parse a transaction request from CLI arguments.
pub fn new_transaction(
    from: &str,
    to: Option<&str>,
    amount: Decimal,
    transaction_type: TransactionType,
    complete: bool,
    priority: Priority,
    vmf: Option<&str>,
) -> NewTransaction {
    let mut request = NewTransaction::new(from, amount, transaction_type).processed_by(from);
    request.priority = priority;
    if let Some(to) = to {
        request = request.to(to);
    }
    if let Some(vmf) = vmf {
        request = request.with_vmf(vmf);
    }
    if complete {
        request = request.completed();
    }
    request
}
