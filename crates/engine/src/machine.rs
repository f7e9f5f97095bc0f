//! Transaction state machine
//!
//! ```text
//!             ┌──────────► completed
//!             │               ▲
//!  pending ───┼──► approved ──┤
//!             │               ▼
//!             ├──────────► rejected
//!             └──────────► expired   (swept, never requested)
//! ```
//!
//! Creation limit-checks a `completed` request, screens it, then writes the transaction, its wallet effects,
//! its journal entry and its alerts in one database transaction. Events go
//! out on the bus only after commit.

use crate::book::{LedgerBook, Posting};
use crate::config::TransactionConfig;
use crate::error::{EngineError, EngineResult};
use crate::request::{NewTransaction, TransactionOutcome};
use chrono::{DateTime, Utc};
use lus_bus::{EventBus, LifecycleEvent};
use lus_compliance::{record_alerts, ScreeningCandidate, ScreeningGate};
use lus_core::{
    Actor, Amount, Clock, Priority, ScreeningDecision, SystemClock, Transaction, TransactionId,
    TransactionStatus, User,
};
use lus_ledger::{FeeConfig, PostingStrategy};
use lus_store::{OrganizationRepo, Store, StoreError, TransactionRepo, TransitionUpdate, UserRepo};
use lus_wallet::{LimitConfig, WalletError, WalletManager};
use sqlx::SqliteConnection;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Rejection reason recorded when screening blocks a transaction
pub const COMPLIANCE_BLOCK: &str = "compliance_block";

#[derive(Clone)]
pub struct TransactionEngine {
    store: Store,
    wallets: WalletManager,
    gate: Arc<ScreeningGate>,
    book: LedgerBook,
    config: TransactionConfig,
    bus: EventBus,
    clock: Arc<dyn Clock>,
}

impl TransactionEngine {
    pub fn builder(store: Store, gate: Arc<ScreeningGate>) -> EngineBuilder {
        EngineBuilder::new(store, gate)
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn wallets(&self) -> &WalletManager {
        &self.wallets
    }

    pub fn gate(&self) -> &Arc<ScreeningGate> {
        &self.gate
    }

    pub fn book(&self) -> &LedgerBook {
        &self.book
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn config(&self) -> &TransactionConfig {
        &self.config
    }

    /// Create a transaction.
    ///
    /// The screening decision overrides the requested status: a block lands
    /// as `rejected`, a hold as a high-priority `pending` without expiry. A
    /// `completed` request is limit-checked before screening, so a violation
    /// is returned without anything being persisted.
    pub async fn create_transaction(&self, request: NewTransaction) -> EngineResult<TransactionOutcome> {
        let amount = Amount::positive(request.amount)?;
        if !matches!(
            request.requested_status,
            TransactionStatus::Pending | TransactionStatus::Completed
        ) {
            return Err(EngineError::InvalidRequestedStatus(request.requested_status));
        }
        let strategy = PostingStrategy::for_type(request.transaction_type);
        if strategy == PostingStrategy::FeeOnly && request.to_user_id.is_none() {
            return Err(EngineError::CounterpartyRequired(request.transaction_type));
        }

        self.sweep_expired().await?;

        let (originator, counterparty) = {
            let mut conn = self.store.acquire().await?;
            let originator = load_user(&mut conn, &request.from_user_id).await?;
            let counterparty = match &request.to_user_id {
                Some(id) => Some(load_user(&mut conn, id).await?),
                None => None,
            };
            if request.requested_status == TransactionStatus::Completed {
                self.check_debit(&mut conn, &originator, strategy, amount).await?;
            }
            (originator, counterparty)
        };

        let now = self.clock.now();
        let transaction_id = TransactionId::generate(request.vmf_number.as_deref());
        let candidate = ScreeningCandidate::new(originator.clone(), amount, request.transaction_type, now)
            .with_counterparty(counterparty.clone())
            .with_transaction_id(transaction_id.as_str());
        let screening = self.gate.screen(&candidate).await?;

        let (status, priority, rejection_reason) = match screening.decision() {
            ScreeningDecision::Block => (
                TransactionStatus::Rejected,
                request.priority,
                Some(COMPLIANCE_BLOCK.to_string()),
            ),
            ScreeningDecision::HoldForReview => (TransactionStatus::Pending, Priority::High, None),
            ScreeningDecision::Approve => (request.requested_status, request.priority, None),
        };
        let expires_at = (status == TransactionStatus::Pending
            && screening.approved
            && self.config.expires(request.transaction_type))
        .then(|| now + self.config.pending_validity());

        let transaction = Transaction {
            transaction_id,
            from_user_id: originator.id.clone(),
            to_user_id: counterparty.as_ref().map(|u| u.id.clone()),
            amount,
            transaction_type: request.transaction_type,
            status,
            priority,
            vmf_number: request.vmf_number.clone(),
            expires_at,
            rejection_reason,
            processed_by: request.processed_by.clone(),
            created_at: now,
            updated_at: now,
            completed_at: (status == TransactionStatus::Completed).then_some(now),
        };

        let mut db = self.store.begin().await?;
        TransactionRepo::insert(&mut db, &transaction)
            .await
            .map_err(|e| pending_conflict(e, &transaction))?;
        if status == TransactionStatus::Completed {
            self.finalize_effects(&mut db, &transaction, &originator, counterparty.as_ref(), now)
                .await?;
        }
        record_alerts(&mut db, &screening).await?;
        db.commit().await?;

        match screening.decision() {
            ScreeningDecision::Block => warn!(
                tx_id = %transaction.transaction_id,
                risk_score = screening.risk_score,
                "transaction blocked by compliance"
            ),
            ScreeningDecision::HoldForReview => warn!(
                tx_id = %transaction.transaction_id,
                risk_score = screening.risk_score,
                "transaction held for compliance review"
            ),
            ScreeningDecision::Approve => info!(
                tx_id = %transaction.transaction_id,
                tx_type = %transaction.transaction_type,
                amount = %transaction.amount,
                status = %transaction.status,
                "transaction created"
            ),
        }
        self.notify(&transaction);

        Ok(TransactionOutcome {
            transaction,
            screening,
        })
    }

    /// Move a transaction to `approved`, `completed` or `rejected`.
    ///
    /// Re-submitting the state a transaction is already in returns it
    /// unchanged. Finalizing applies wallet effects and posts the journal
    /// entry in the same database transaction as the status change.
    pub async fn update_transaction_status(
        &self,
        transaction_id: &str,
        target: TransactionStatus,
        actor: &Actor,
        reason: Option<&str>,
    ) -> EngineResult<Transaction> {
        let reason = reason.map(str::trim).filter(|r| !r.is_empty());
        if target == TransactionStatus::Rejected && reason.is_none() {
            return Err(EngineError::ReasonRequired);
        }

        let now = self.clock.now();
        let current = self.get_transaction(transaction_id).await?;
        if current.status == target && target != TransactionStatus::Expired {
            debug!(tx_id = %transaction_id, status = %target, "status already applied");
            return Ok(current);
        }
        if current.is_expired_at(now) {
            self.sweep_expired().await?;
            return Err(EngineError::TransactionExpired(transaction_id.to_string()));
        }
        if matches!(target, TransactionStatus::Pending | TransactionStatus::Expired)
            || !current.status.can_transition_to(target)
        {
            return Err(EngineError::InvalidTransition {
                id: transaction_id.to_string(),
                from: current.status,
                to: target,
            });
        }

        let from: &[TransactionStatus] = match target {
            TransactionStatus::Approved => &[TransactionStatus::Pending],
            _ => &[TransactionStatus::Pending, TransactionStatus::Approved],
        };
        let update = TransitionUpdate {
            processed_by: Some(actor.user_id.as_str()),
            rejection_reason: reason.filter(|_| target == TransactionStatus::Rejected),
            completed_at: (target == TransactionStatus::Completed).then_some(now),
        };

        let mut db = self.store.begin().await?;
        if !TransactionRepo::transition(&mut db, transaction_id, from, target, update, now).await? {
            drop(db);
            return self.resolve_lost_race(transaction_id, target).await;
        }
        let updated = TransactionRepo::require(&mut db, transaction_id).await?;
        if target == TransactionStatus::Completed {
            let originator = load_user(&mut db, &updated.from_user_id).await?;
            let counterparty = match &updated.to_user_id {
                Some(id) => Some(load_user(&mut db, id).await?),
                None => None,
            };
            self.finalize_effects(&mut db, &updated, &originator, counterparty.as_ref(), now)
                .await?;
        }
        db.commit().await?;

        info!(
            tx_id = %transaction_id,
            from = %current.status,
            to = %target,
            actor = %actor.user_id,
            "transaction status updated"
        );
        self.notify(&updated);
        Ok(updated)
    }

    /// Another caller moved the transaction first. Same target: idempotent.
    async fn resolve_lost_race(&self, transaction_id: &str, target: TransactionStatus) -> EngineResult<Transaction> {
        let current = self.get_transaction(transaction_id).await?;
        if current.status == target {
            return Ok(current);
        }
        Err(EngineError::InvalidTransition {
            id: transaction_id.to_string(),
            from: current.status,
            to: target,
        })
    }

    /// Limit check on the wallet a finalized movement would debit.
    ///
    /// Cash deposits only draw on an allocation-based originator's float.
    async fn check_debit(
        &self,
        conn: &mut SqliteConnection,
        originator: &User,
        strategy: PostingStrategy,
        amount: Amount,
    ) -> EngineResult<()> {
        let allocation_based = self.wallets.policy_for(originator).allocation_based;
        if strategy == PostingStrategy::CashDeposit && !allocation_based {
            return Ok(());
        }
        let check = if allocation_based {
            self.wallets.check_cashier_balance(conn, &originator.id, amount).await?
        } else {
            self.wallets.check_transfer_limits(conn, &originator.id, amount).await?
        };
        if let Err(violation) = check.into_result() {
            debug!(user_id = %originator.id, %amount, code = violation.code(), "limit check refused");
            return Err(WalletError::from(violation).into());
        }
        Ok(())
    }

    /// Wallet effects plus journal posting of a movement being finalized.
    ///
    /// Runs on the caller's open database transaction; any error must roll
    /// that transaction back.
    pub async fn finalize_effects(
        &self,
        conn: &mut SqliteConnection,
        tx: &Transaction,
        originator: &User,
        counterparty: Option<&User>,
        now: DateTime<Utc>,
    ) -> EngineResult<Posting> {
        let strategy = PostingStrategy::for_type(tx.transaction_type);
        let net = self.book.calculate_revenue(tx.amount, tx.transaction_type)?.net_amount();

        let organization_id = match strategy {
            PostingStrategy::CashDeposit => {
                let beneficiary = counterparty.unwrap_or(originator);
                if self.wallets.policy_for(originator).allocation_based {
                    self.wallets.apply_debit(conn, originator, tx.amount).await?;
                }
                self.credit(conn, beneficiary, net, now).await?;
                beneficiary.organization_id.clone()
            }
            PostingStrategy::CashWithdrawal => {
                self.wallets.apply_debit(conn, originator, tx.amount).await?;
                originator.organization_id.clone()
            }
            PostingStrategy::FeeOnly => {
                let beneficiary =
                    counterparty.ok_or(EngineError::CounterpartyRequired(tx.transaction_type))?;
                self.wallets.apply_debit(conn, originator, tx.amount).await?;
                self.credit(conn, beneficiary, net, now).await?;
                beneficiary
                    .organization_id
                    .clone()
                    .or_else(|| originator.organization_id.clone())
            }
        };

        self.book
            .process_transaction(conn, tx, organization_id.as_deref(), now)
            .await
    }

    async fn credit(
        &self,
        conn: &mut SqliteConnection,
        beneficiary: &User,
        amount: Amount,
        now: DateTime<Utc>,
    ) -> EngineResult<()> {
        if amount.is_zero() {
            return Ok(());
        }
        self.wallets.apply_credit(conn, beneficiary, amount).await?;
        if self.wallets.policy_for(beneficiary).tracks_collections {
            if let Some(org) = &beneficiary.organization_id {
                OrganizationRepo::add_collected(conn, org, amount, now.date_naive()).await?;
            }
        }
        Ok(())
    }

    /// Expire every pending transaction past its window. Runs before each creation.
    pub async fn sweep_expired(&self) -> EngineResult<Vec<String>> {
        let now = self.clock.now();
        let expired = {
            let mut conn = self.store.acquire().await?;
            TransactionRepo::expire_stale(&mut conn, now).await?
        };
        for id in &expired {
            info!(tx_id = %id, "pending transaction expired");
            self.bus.publish(LifecycleEvent::transaction_expired(id.clone(), now));
        }
        Ok(expired)
    }

    pub async fn get_transaction(&self, transaction_id: &str) -> EngineResult<Transaction> {
        let mut conn = self.store.acquire().await?;
        TransactionRepo::get(&mut conn, transaction_id)
            .await?
            .ok_or_else(|| EngineError::TransactionNotFound(transaction_id.to_string()))
    }

    /// Pending transactions still inside their validity window
    pub async fn list_active_pending(&self, user_id: Option<&str>) -> EngineResult<Vec<Transaction>> {
        let mut conn = self.store.acquire().await?;
        Ok(TransactionRepo::list_active_pending(&mut conn, user_id, self.clock.now()).await?)
    }

    pub async fn list_transactions(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> EngineResult<Vec<Transaction>> {
        if from > to {
            return Err(EngineError::InvalidPeriod(format!("{from} is after {to}")));
        }
        let mut conn = self.store.acquire().await?;
        Ok(TransactionRepo::list_for_user(&mut conn, user_id, from, to).await?)
    }

    fn notify(&self, tx: &Transaction) {
        if let Some(event) = LifecycleEvent::for_transaction(tx, self.clock.now()) {
            self.bus.publish(event);
        }
    }
}

async fn load_user(conn: &mut SqliteConnection, user_id: &str) -> EngineResult<User> {
    UserRepo::get(conn, user_id)
        .await?
        .ok_or_else(|| EngineError::UserNotFound(user_id.to_string()))
}

fn pending_conflict(err: StoreError, tx: &Transaction) -> EngineError {
    if err.is_unique_violation() {
        EngineError::PendingTransactionExists {
            user_id: tx.from_user_id.clone(),
            transaction_type: tx.transaction_type,
        }
    } else {
        err.into()
    }
}

/// Builder for [`TransactionEngine`]
pub struct EngineBuilder {
    store: Store,
    gate: Arc<ScreeningGate>,
    limits: LimitConfig,
    fees: FeeConfig,
    config: TransactionConfig,
    bus: EventBus,
    clock: Arc<dyn Clock>,
}

impl EngineBuilder {
    pub fn new(store: Store, gate: Arc<ScreeningGate>) -> Self {
        Self {
            store,
            gate,
            limits: LimitConfig::default(),
            fees: FeeConfig::default(),
            config: TransactionConfig::default(),
            bus: EventBus::new(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_limits(mut self, limits: LimitConfig) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_fees(mut self, fees: FeeConfig) -> Self {
        self.fees = fees;
        self
    }

    pub fn with_config(mut self, config: TransactionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = bus;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> EngineResult<TransactionEngine> {
        Ok(TransactionEngine {
            wallets: WalletManager::new(self.limits, self.clock.clone()),
            book: LedgerBook::new(self.fees)?,
            store: self.store,
            gate: self.gate,
            config: self.config,
            bus: self.bus,
            clock: self.clock,
        })
    }
}
