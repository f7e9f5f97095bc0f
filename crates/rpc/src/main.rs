//! Lus CLI - Main entry point

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use lus_core::{AlertStatus, Priority, SettlementReason, TransactionStatus, TransactionType, UserRole};
use lus_rpc::{commands, AppContext, PlatformConfig};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lus")]
#[command(about = "Lus - Mobile money ledger engine", long_about = None)]
struct Cli {
    /// Data directory path
    #[arg(short, long, default_value = "./data")]
    data: PathBuf,

    /// JSON configuration file (defaults if absent)
    #[arg(short, long, default_value = "./lus.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the schema and verify the books balance
    Init,

    /// Manage users
    #[command(subcommand)]
    User(UserCommand),

    /// Manage organizations
    #[command(subcommand)]
    Org(OrgCommand),

    /// Inspect and administer wallets
    #[command(subcommand)]
    Wallet(WalletCommand),

    /// Create and move transactions
    #[command(subcommand)]
    Tx(TxCommand),

    /// Settlement maker-checker workflow
    #[command(subcommand)]
    Settlement(SettlementCommand),

    /// Compliance alerts
    #[command(subcommand)]
    Alerts(AlertsCommand),

    /// Regulatory and financial reports
    #[command(subcommand)]
    Report(ReportCommand),
}

#[derive(Subcommand)]
enum UserCommand {
    Add {
        id: String,
        name: String,
        /// customer, merchant, cashier, finance or admin
        #[arg(long)]
        role: UserRole,
        #[arg(long)]
        org: Option<String>,
        /// ISO 3166 alpha-2 code
        #[arg(long)]
        country: Option<String>,
        /// Politically exposed person
        #[arg(long)]
        pep: bool,
    },
}

#[derive(Subcommand)]
enum OrgCommand {
    Add { id: String, name: String },
}

#[derive(Subcommand)]
enum WalletCommand {
    Show {
        user: String,
    },
    /// Set a cashier's daily float
    Allocate {
        user: String,
        amount: Decimal,
    },
    Freeze {
        user: String,
        /// Reactivate instead
        #[arg(long)]
        unfreeze: bool,
    },
}

#[derive(Subcommand)]
enum TxCommand {
    Create {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        amount: Decimal,
        /// cash_in, cash_out, p2p_transfer, settlement, qr_code_payment, cash_digitization, rtp
        #[arg(long = "type")]
        transaction_type: TransactionType,
        /// Request immediate completion instead of pending
        #[arg(long)]
        complete: bool,
        #[arg(long, default_value = "medium")]
        priority: Priority,
        /// Virtual merchant facility number embedded in the id
        #[arg(long)]
        vmf: Option<String>,
    },
    Approve {
        id: String,
        #[arg(long)]
        actor: String,
    },
    Complete {
        id: String,
        #[arg(long)]
        actor: String,
    },
    Reject {
        id: String,
        #[arg(long)]
        actor: String,
        #[arg(long)]
        reason: String,
    },
    List {
        user: String,
        #[arg(long)]
        from: Option<DateTime<Utc>>,
        #[arg(long)]
        to: Option<DateTime<Utc>>,
        /// Only pending transactions still inside their window
        #[arg(long)]
        pending: bool,
    },
}

#[derive(Subcommand)]
enum SettlementCommand {
    Create {
        #[arg(long)]
        requester: String,
        #[arg(long)]
        amount: Decimal,
        #[arg(long)]
        bank: String,
        #[arg(long)]
        account: String,
    },
    Approve {
        id: String,
        #[arg(long)]
        actor: String,
    },
    Hold {
        id: String,
        #[arg(long)]
        actor: String,
        #[arg(long)]
        reason: SettlementReason,
        #[arg(long)]
        comment: Option<String>,
    },
    Reject {
        id: String,
        #[arg(long)]
        actor: String,
        #[arg(long)]
        reason: SettlementReason,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Record the gateway's payout result
    Payout {
        id: String,
        #[arg(long)]
        failed: bool,
        #[arg(long)]
        reference: Option<String>,
    },
    Stats,
}

#[derive(Subcommand)]
enum AlertsCommand {
    List {
        #[arg(long)]
        status: Option<AlertStatus>,
        #[arg(long)]
        user: Option<String>,
    },
    Review {
        id: String,
        #[arg(long)]
        reviewer: String,
        /// cleared or escalated
        #[arg(long)]
        outcome: AlertStatus,
    },
}

#[derive(Subcommand)]
enum ReportCommand {
    Statements {
        #[arg(long)]
        from: Option<DateTime<Utc>>,
        #[arg(long)]
        to: Option<DateTime<Utc>>,
    },
    Revenue {
        #[arg(long)]
        from: Option<DateTime<Utc>>,
        #[arg(long)]
        to: Option<DateTime<Utc>>,
    },
    Balance {
        account: String,
        #[arg(long)]
        as_of: Option<DateTime<Utc>>,
    },
    /// Suspicious transaction report for one user
    Str {
        user: String,
        #[arg(long)]
        from: Option<DateTime<Utc>>,
        #[arg(long)]
        to: Option<DateTime<Utc>>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = PlatformConfig::from_file(&cli.config)?;
    let ctx = AppContext::new(&cli.data, config).await?;
    let notifications = ctx.start_notifications();

    match cli.command {
        Commands::Init => {
            commands::init(&ctx).await?;
        }

        Commands::User(UserCommand::Add {
            id,
            name,
            role,
            org,
            country,
            pep,
        }) => {
            commands::add_user(&ctx, &id, &name, role, org.as_deref(), country.as_deref(), pep).await?;
        }

        Commands::Org(OrgCommand::Add { id, name }) => {
            commands::add_organization(&ctx, &id, &name).await?;
        }

        Commands::Wallet(cmd) => match cmd {
            WalletCommand::Show { user } => {
                commands::wallet_show(&ctx, &user).await?;
            }
            WalletCommand::Allocate { user, amount } => {
                commands::wallet_allocate(&ctx, &user, amount).await?;
            }
            WalletCommand::Freeze { user, unfreeze } => {
                commands::wallet_freeze(&ctx, &user, !unfreeze).await?;
            }
        },

        Commands::Tx(cmd) => match cmd {
            TxCommand::Create {
                from,
                to,
                amount,
                transaction_type,
                complete,
                priority,
                vmf,
            } => {
                let request = commands::new_transaction(
                    &from,
                    to.as_deref(),
                    amount,
                    transaction_type,
                    complete,
                    priority,
                    vmf.as_deref(),
                );
                commands::tx_create(&ctx, request).await?;
            }
            TxCommand::Approve { id, actor } => {
                commands::tx_update(&ctx, &id, TransactionStatus::Approved, &actor, None).await?;
            }
            TxCommand::Complete { id, actor } => {
                commands::tx_update(&ctx, &id, TransactionStatus::Completed, &actor, None).await?;
            }
            TxCommand::Reject { id, actor, reason } => {
                commands::tx_update(&ctx, &id, TransactionStatus::Rejected, &actor, Some(&reason)).await?;
            }
            TxCommand::List {
                user,
                from,
                to,
                pending,
            } => {
                commands::tx_list(&ctx, &user, from, to, pending).await?;
            }
        },

        Commands::Settlement(cmd) => match cmd {
            SettlementCommand::Create {
                requester,
                amount,
                bank,
                account,
            } => {
                commands::settlement_create(&ctx, &requester, amount, &bank, &account).await?;
            }
            SettlementCommand::Approve { id, actor } => {
                commands::settlement_approve(&ctx, &id, &actor).await?;
            }
            SettlementCommand::Hold {
                id,
                actor,
                reason,
                comment,
            } => {
                commands::settlement_hold(&ctx, &id, &actor, reason, comment.as_deref()).await?;
            }
            SettlementCommand::Reject {
                id,
                actor,
                reason,
                comment,
            } => {
                commands::settlement_reject(&ctx, &id, &actor, reason, comment.as_deref()).await?;
            }
            SettlementCommand::Payout { id, failed, reference } => {
                commands::settlement_payout(&ctx, &id, !failed, reference.as_deref()).await?;
            }
            SettlementCommand::Stats => {
                commands::settlement_stats(&ctx).await?;
            }
        },

        Commands::Alerts(cmd) => match cmd {
            AlertsCommand::List { status, user } => {
                commands::alerts_list(&ctx, status, user.as_deref()).await?;
            }
            AlertsCommand::Review {
                id,
                reviewer,
                outcome,
            } => {
                commands::alerts_review(&ctx, &id, &reviewer, outcome).await?;
            }
        },

        Commands::Report(cmd) => match cmd {
            ReportCommand::Statements { from, to } => {
                commands::report_statements(&ctx, from, to).await?;
            }
            ReportCommand::Revenue { from, to } => {
                commands::report_revenue(&ctx, from, to).await?;
            }
            ReportCommand::Balance { account, as_of } => {
                commands::report_balance(&ctx, &account, as_of).await?;
            }
            ReportCommand::Str { user, from, to } => {
                commands::report_str(&ctx, &user, from, to).await?;
            }
        },
    }

    // Let the notifier drain what this command published.
    tokio::task::yield_now().await;
    notifications.abort();
    ctx.store.close().await;
    Ok(())
}
