//! Settlement maker-checker workflow
//!
//! ```text
//!  pending ──┬──► approved ──► completed   (gateway paid out)
//!            │        │
//!            │        └──────► rejected    (payout failed, reversed)
//!            ├──► hold ──┬──► approved
//!            │           └──► rejected
//!            └──► rejected
//! ```
//!
//! Makers (merchant, finance) create requests against their organization's
//! settlement capacity; checkers (admin) review them. Every transition
//! appends a row to the review history.

use crate::config::SettlementConfig;
use crate::error::{SettlementError, SettlementResult};
use crate::review::{ensure_reviewer, ReviewNote};
use chrono::{DateTime, Utc};
use lus_bus::LifecycleEvent;
use lus_compliance::{record_alerts, ScreeningCandidate, ScreeningResult};
use lus_core::{
    Actor, Amount, Priority, ScreeningDecision, SettlementReason, SettlementRequest,
    SettlementReview, SettlementStatus, Transaction, TransactionId, TransactionStatus,
    TransactionType, User,
};
use lus_engine::TransactionEngine;
use lus_store::{
    JournalRepo, OrganizationCounters, OrganizationRepo, SettlementRepo, SettlementStats,
    TransactionRepo, UserRepo, WalletRepo,
};
use rust_decimal::Decimal;
use sqlx::SqliteConnection;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A created request and the screening that ran on it
#[derive(Debug, Clone)]
pub struct SettlementOutcome {
    pub request: SettlementRequest,
    pub screening: ScreeningResult,
}

impl SettlementOutcome {
    pub fn decision(&self) -> ScreeningDecision {
        self.screening.decision()
    }
}

/// Settlement workflow on top of the transaction engine
#[derive(Clone)]
pub struct SettlementWorkflow {
    engine: TransactionEngine,
    config: SettlementConfig,
}

impl SettlementWorkflow {
    pub fn new(engine: TransactionEngine, config: SettlementConfig) -> Self {
        Self { engine, config }
    }

    pub fn config(&self) -> &SettlementConfig {
        &self.config
    }

    pub fn engine(&self) -> &TransactionEngine {
        &self.engine
    }

    /// Raise a settlement request for the requester's organization.
    ///
    /// The amount is reserved against today's capacity (collections minus
    /// amounts already requested) by one conditional update at commit, so
    /// concurrent requests from the same organization cannot overdraw it.
    pub async fn create_settlement_request(
        &self,
        requester_id: &str,
        amount: Decimal,
        bank_name: &str,
        account_number: &str,
    ) -> SettlementResult<SettlementOutcome> {
        let amount = Amount::positive(amount)?;
        let (bank_name, account_number) = (bank_name.trim(), account_number.trim());
        if bank_name.is_empty() || account_number.is_empty() {
            return Err(SettlementError::BankDetailsRequired);
        }

        let requester = {
            let mut conn = self.engine.store().acquire().await?;
            load_user(&mut conn, requester_id).await?
        };
        if !requester.role.can_request_settlement() {
            return Err(SettlementError::NotRequester {
                user_id: requester.id,
                role: requester.role,
            });
        }
        let organization_id = requester
            .organization_id
            .clone()
            .ok_or_else(|| SettlementError::NoOrganization(requester.id.clone()))?;

        let now = self.engine.clock().now();
        let id = new_settlement_id();
        let candidate = ScreeningCandidate::new(requester.clone(), amount, TransactionType::Settlement, now)
            .with_settlement_id(id.as_str());
        let screening = self.engine.gate().screen(&candidate).await?;
        let priority = match screening.decision() {
            ScreeningDecision::Approve => Priority::Medium,
            _ => self.config.manual_review_priority,
        };

        let request = SettlementRequest {
            id,
            organization_id,
            user_id: requester.id.clone(),
            amount,
            bank_name: bank_name.to_string(),
            account_number: account_number.to_string(),
            status: SettlementStatus::Pending,
            priority,
            hold_reason: None,
            reject_reason: None,
            reason_comment: None,
            reviewed_by: None,
            reviewed_at: None,
            transaction_id: None,
            payout_reference: None,
            created_at: now,
            updated_at: now,
        };

        let today = now.date_naive();
        let mut db = self.engine.store().begin().await?;
        OrganizationRepo::reset_counters_if_stale(&mut db, &request.organization_id, today).await?;
        if !OrganizationRepo::reserve_capacity(&mut db, &request.organization_id, amount, today).await? {
            let counters = OrganizationRepo::counters(&mut db, &request.organization_id, today).await?;
            return Err(capacity_exceeded(counters, amount));
        }
        SettlementRepo::insert(&mut db, &request, today).await?;
        record_alerts(&mut db, &screening).await?;
        db.commit().await?;

        if screening.decision() == ScreeningDecision::Approve {
            info!(
                settlement_id = %request.id,
                organization_id = %request.organization_id,
                amount = %request.amount,
                "settlement requested"
            );
        } else {
            warn!(
                settlement_id = %request.id,
                risk_score = screening.risk_score,
                "settlement requested, flagged for manual review"
            );
        }
        Ok(SettlementOutcome { request, screening })
    }

    /// Approve a pending request or release a held one.
    ///
    /// Debits the organization's collecting wallet, posts the settlement
    /// journal entry and its revenue, and records a completed `settlement`
    /// transaction linked to the request, all in one database transaction.
    /// Re-approving is a no-op.
    pub async fn approve(&self, settlement_id: &str, actor: &Actor) -> SettlementResult<SettlementRequest> {
        let current = self.get_settlement(settlement_id).await?;
        ensure_reviewer(actor, &current.user_id)?;
        if current.status == SettlementStatus::Approved {
            debug!(settlement_id, "settlement already approved");
            return Ok(current);
        }
        if !current.status.can_transition_to(SettlementStatus::Approved) {
            return Err(invalid_transition(&current, SettlementStatus::Approved));
        }

        let now = self.engine.clock().now();
        let mut db = self.engine.store().begin().await?;
        let requester = load_user(&mut db, &current.user_id).await?;
        let funder = self.funding_wallet_owner(&mut db, &requester, &current.organization_id).await?;
        if !SettlementRepo::review(
            &mut db,
            settlement_id,
            current.status,
            SettlementStatus::Approved,
            &actor.user_id,
            None,
            None,
            now,
        )
        .await?
        {
            drop(db);
            return self.resolve_lost_race(settlement_id, SettlementStatus::Approved).await;
        }

        let transaction = Transaction {
            transaction_id: TransactionId::generate(None),
            from_user_id: funder.id.clone(),
            to_user_id: None,
            amount: current.amount,
            transaction_type: TransactionType::Settlement,
            status: TransactionStatus::Completed,
            priority: current.priority,
            vmf_number: None,
            expires_at: None,
            rejection_reason: None,
            processed_by: Some(actor.user_id.clone()),
            created_at: now,
            updated_at: now,
            completed_at: Some(now),
        };
        TransactionRepo::insert(&mut db, &transaction).await?;
        self.engine
            .finalize_effects(&mut db, &transaction, &funder, None, now)
            .await?;
        SettlementRepo::link_transaction(&mut db, settlement_id, transaction.transaction_id.as_str()).await?;
        append_review(&mut db, &current, SettlementStatus::Approved, &actor.user_id, None, now).await?;
        let updated = SettlementRepo::require(&mut db, settlement_id).await?;
        db.commit().await?;

        info!(
            settlement_id,
            from = %current.status,
            reviewer = %actor.user_id,
            funded_by = %funder.id,
            tx_id = %transaction.transaction_id,
            "settlement approved"
        );
        self.engine.bus().publish(LifecycleEvent::SettlementApproved {
            settlement_id: updated.id.clone(),
            user_id: updated.user_id.clone(),
            amount: updated.amount,
            reviewer_id: actor.user_id.clone(),
            timestamp: now,
        });
        Ok(updated)
    }

    /// Put a pending request on hold.
    pub async fn hold(
        &self,
        settlement_id: &str,
        actor: &Actor,
        reason: SettlementReason,
        comment: Option<&str>,
    ) -> SettlementResult<SettlementRequest> {
        self.review_with_reason(settlement_id, actor, SettlementStatus::Hold, reason, comment)
            .await
    }

    /// Reject a pending or held request, giving its capacity back.
    pub async fn reject(
        &self,
        settlement_id: &str,
        actor: &Actor,
        reason: SettlementReason,
        comment: Option<&str>,
    ) -> SettlementResult<SettlementRequest> {
        self.review_with_reason(settlement_id, actor, SettlementStatus::Rejected, reason, comment)
            .await
    }

    async fn review_with_reason(
        &self,
        settlement_id: &str,
        actor: &Actor,
        target: SettlementStatus,
        reason: SettlementReason,
        comment: Option<&str>,
    ) -> SettlementResult<SettlementRequest> {
        let note = ReviewNote::new(reason, comment, self.config.max_comment_len)?;
        let current = self.get_settlement(settlement_id).await?;
        ensure_reviewer(actor, &current.user_id)?;
        if current.status == target {
            debug!(settlement_id, status = %target, "settlement already in requested state");
            return Ok(current);
        }
        // Rejecting after approval is reserved for the payout callback.
        if !matches!(current.status, SettlementStatus::Pending | SettlementStatus::Hold)
            || !current.status.can_transition_to(target)
        {
            return Err(invalid_transition(&current, target));
        }

        let now = self.engine.clock().now();
        let mut db = self.engine.store().begin().await?;
        if !SettlementRepo::review(
            &mut db,
            settlement_id,
            current.status,
            target,
            &actor.user_id,
            Some(note.reason),
            note.comment.as_deref(),
            now,
        )
        .await?
        {
            drop(db);
            return self.resolve_lost_race(settlement_id, target).await;
        }
        if target == SettlementStatus::Rejected {
            release_reserved(&mut db, &current).await?;
        }
        append_review(&mut db, &current, target, &actor.user_id, Some(&note), now).await?;
        let updated = SettlementRepo::require(&mut db, settlement_id).await?;
        db.commit().await?;

        info!(
            settlement_id,
            from = %current.status,
            to = %target,
            reason = %note.reason,
            reviewer = %actor.user_id,
            "settlement reviewed"
        );
        let event = match target {
            SettlementStatus::Hold => LifecycleEvent::SettlementHeld {
                settlement_id: updated.id.clone(),
                user_id: updated.user_id.clone(),
                reason: note.reason,
                timestamp: now,
            },
            _ => LifecycleEvent::SettlementRejected {
                settlement_id: updated.id.clone(),
                user_id: updated.user_id.clone(),
                reason: note.reason,
                timestamp: now,
            },
        };
        self.engine.bus().publish(event);
        Ok(updated)
    }

    /// Apply the settlement gateway's final status for an approved request.
    ///
    /// A failed payout reverses the settlement journal entry, re-credits the
    /// wallet that funded it and rejects the request with `payout_failed`. Repeating the
    /// same callback returns the request unchanged.
    pub async fn record_payout_result(
        &self,
        settlement_id: &str,
        success: bool,
        payout_reference: Option<&str>,
    ) -> SettlementResult<SettlementRequest> {
        let target = if success {
            SettlementStatus::Completed
        } else {
            SettlementStatus::Rejected
        };
        let current = self.get_settlement(settlement_id).await?;
        if current.status == target
            && (success || current.reject_reason == Some(SettlementReason::PayoutFailed))
        {
            debug!(settlement_id, status = %target, "payout result already recorded");
            return Ok(current);
        }
        if current.status != SettlementStatus::Approved {
            return Err(invalid_transition(&current, target));
        }
        let transaction_id = current
            .transaction_id
            .clone()
            .ok_or_else(|| SettlementError::NotPosted(settlement_id.to_string()))?;

        let now = self.engine.clock().now();
        let reviewer = self.config.gateway_reviewer.as_str();
        let reject_reason = (!success).then_some(SettlementReason::PayoutFailed);
        let mut db = self.engine.store().begin().await?;
        if !SettlementRepo::record_payout(&mut db, settlement_id, target, reject_reason, payout_reference, now)
            .await?
        {
            drop(db);
            return self.resolve_lost_race(settlement_id, target).await;
        }

        if !success {
            let posted = JournalRepo::for_transaction(&mut db, &transaction_id)
                .await?
                .into_iter()
                .find(|entry| entry.reverses_entry_id.is_none())
                .ok_or_else(|| SettlementError::NotPosted(settlement_id.to_string()))?;
            self.engine.book().reverse_entry(&mut db, &posted.id, now).await?;
            let settled = TransactionRepo::require(&mut db, &transaction_id).await?;
            let funder = load_user(&mut db, &settled.from_user_id).await?;
            self.engine.wallets().refund(&mut db, &funder, current.amount).await?;
            release_reserved(&mut db, &current).await?;
        }
        let note = reject_reason.map(|reason| ReviewNote {
            reason,
            comment: payout_reference.map(str::to_string),
        });
        append_review(&mut db, &current, target, reviewer, note.as_ref(), now).await?;
        let updated = SettlementRepo::require(&mut db, settlement_id).await?;
        db.commit().await?;

        let event = if success {
            info!(settlement_id, payout_reference, "settlement paid out");
            LifecycleEvent::SettlementCompleted {
                settlement_id: updated.id.clone(),
                user_id: updated.user_id.clone(),
                payout_reference: updated.payout_reference.clone(),
                timestamp: now,
            }
        } else {
            warn!(settlement_id, payout_reference, "settlement payout failed, reversed");
            LifecycleEvent::SettlementRejected {
                settlement_id: updated.id.clone(),
                user_id: updated.user_id.clone(),
                reason: SettlementReason::PayoutFailed,
                timestamp: now,
            }
        };
        self.engine.bus().publish(event);
        Ok(updated)
    }

    /// Wallet that holds the organization's collections.
    ///
    /// A collecting requester (merchant till) funds its own request; anyone
    /// else draws on the active collecting member with the largest balance.
    async fn funding_wallet_owner(
        &self,
        conn: &mut SqliteConnection,
        requester: &User,
        organization_id: &str,
    ) -> SettlementResult<User> {
        let wallets = self.engine.wallets();
        if wallets.policy_for(requester).tracks_collections {
            return Ok(requester.clone());
        }
        let mut best: Option<(Amount, User)> = None;
        for member in UserRepo::list_by_organization(conn, organization_id).await? {
            if !wallets.policy_for(&member).tracks_collections {
                continue;
            }
            let Some(wallet) = WalletRepo::get(conn, &member.id).await? else {
                continue;
            };
            if wallet.is_active && best.as_ref().map_or(true, |(balance, _)| wallet.balance > *balance) {
                best = Some((wallet.balance, member));
            }
        }
        Ok(best.map(|(_, member)| member).unwrap_or_else(|| requester.clone()))
    }

    /// Another reviewer moved the request first. Same target: idempotent.
    async fn resolve_lost_race(
        &self,
        settlement_id: &str,
        target: SettlementStatus,
    ) -> SettlementResult<SettlementRequest> {
        let current = self.get_settlement(settlement_id).await?;
        if current.status == target {
            return Ok(current);
        }
        Err(invalid_transition(&current, target))
    }

    pub async fn get_settlement(&self, settlement_id: &str) -> SettlementResult<SettlementRequest> {
        let mut conn = self.engine.store().acquire().await?;
        SettlementRepo::get(&mut conn, settlement_id)
            .await?
            .ok_or_else(|| SettlementError::NotFound(settlement_id.to_string()))
    }

    /// Review queue for one status, highest priority first
    pub async fn list_by_status(&self, status: SettlementStatus) -> SettlementResult<Vec<SettlementRequest>> {
        let mut conn = self.engine.store().acquire().await?;
        Ok(SettlementRepo::list_by_status(&mut conn, status).await?)
    }

    pub async fn list_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> SettlementResult<Vec<SettlementRequest>> {
        let mut conn = self.engine.store().acquire().await?;
        Ok(SettlementRepo::list_between(&mut conn, from, to).await?)
    }

    pub async fn reviews(&self, settlement_id: &str) -> SettlementResult<Vec<SettlementReview>> {
        let mut conn = self.engine.store().acquire().await?;
        Ok(SettlementRepo::reviews(&mut conn, settlement_id).await?)
    }

    pub async fn settlement_stats(&self) -> SettlementResult<SettlementStats> {
        let mut conn = self.engine.store().acquire().await?;
        Ok(SettlementRepo::stats(&mut conn).await?)
    }

    /// Today's counters of an organization
    pub async fn capacity(&self, organization_id: &str) -> SettlementResult<OrganizationCounters> {
        let today = self.engine.clock().today();
        let mut conn = self.engine.store().acquire().await?;
        Ok(OrganizationRepo::counters(&mut conn, organization_id, today).await?)
    }
}

fn new_settlement_id() -> String {
    let simple = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("STL-{}", &simple[..12])
}

async fn load_user(conn: &mut SqliteConnection, user_id: &str) -> SettlementResult<User> {
    UserRepo::get(conn, user_id)
        .await?
        .ok_or_else(|| SettlementError::UserNotFound(user_id.to_string()))
}

/// Give back the capacity a request reserved, if its day is still current.
async fn release_reserved(conn: &mut SqliteConnection, request: &SettlementRequest) -> SettlementResult<()> {
    let reserved_on = SettlementRepo::counters_date(conn, &request.id).await?;
    let released =
        OrganizationRepo::release_capacity(conn, &request.organization_id, request.amount, reserved_on).await?;
    if !released {
        debug!(settlement_id = %request.id, %reserved_on, "capacity day already closed");
    }
    Ok(())
}

async fn append_review(
    conn: &mut SqliteConnection,
    current: &SettlementRequest,
    to_status: SettlementStatus,
    reviewer_id: &str,
    note: Option<&ReviewNote>,
    reviewed_at: DateTime<Utc>,
) -> SettlementResult<()> {
    let review = SettlementReview {
        settlement_id: current.id.clone(),
        from_status: current.status,
        to_status,
        reviewer_id: reviewer_id.to_string(),
        reason: note.map(|n| n.reason),
        comment: note.and_then(|n| n.comment.clone()),
        reviewed_at,
    };
    Ok(SettlementRepo::insert_review(conn, &review).await?)
}

fn capacity_exceeded(counters: OrganizationCounters, requested: Amount) -> SettlementError {
    let available = counters.capacity();
    SettlementError::CapacityExceeded {
        shortfall: requested.saturating_sub(&available),
        organization_id: counters.organization_id,
        collected: counters.daily_collected,
        used: counters.daily_settlement_used,
        available,
        requested,
    }
}

fn invalid_transition(current: &SettlementRequest, to: SettlementStatus) -> SettlementError {
    SettlementError::InvalidTransition {
        id: current.id.clone(),
        from: current.status,
        to,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settlement_id_format() {
        let id = new_settlement_id();
        assert!(id.starts_with("STL-"));
        assert_eq!(id.len(), 16);
        assert_ne!(id, new_settlement_id());
    }
}
