//! Reviewer input checks for hold and reject

use crate::error::{SettlementError, SettlementResult};
use lus_core::{Actor, SettlementReason};

/// Checked reason and comment of a hold or reject
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewNote {
    pub reason: SettlementReason,
    pub comment: Option<String>,
}

impl ReviewNote {
    /// Validate a reviewer-supplied reason.
    ///
    /// The comment is trimmed; blank counts as absent. `other` needs one.
    pub fn new(
        reason: SettlementReason,
        comment: Option<&str>,
        max_comment_len: usize,
    ) -> SettlementResult<Self> {
        if !reason.is_reviewer_selectable() {
            return Err(SettlementError::ReasonNotSelectable(reason));
        }
        let comment = comment.map(str::trim).filter(|c| !c.is_empty());
        if let Some(text) = comment {
            let len = text.chars().count();
            if len > max_comment_len {
                return Err(SettlementError::CommentTooLong {
                    len,
                    max: max_comment_len,
                });
            }
        }
        if reason.requires_comment() && comment.is_none() {
            return Err(SettlementError::CommentRequired(reason));
        }
        Ok(Self {
            reason,
            comment: comment.map(str::to_string),
        })
    }
}

/// Only checker roles review, and never their own request.
pub(crate) fn ensure_reviewer(actor: &Actor, requester_id: &str) -> SettlementResult<()> {
    if !actor.role.can_review_settlement() {
        return Err(SettlementError::NotReviewer {
            user_id: actor.user_id.clone(),
            role: actor.role,
        });
    }
    if actor.user_id == requester_id {
        return Err(SettlementError::SelfReview(actor.user_id.clone()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lus_core::UserRole;

    #[test]
    fn test_other_needs_comment() {
        let err = ReviewNote::new(SettlementReason::Other, Some("   "), 125).unwrap_err();
        assert!(matches!(err, SettlementError::CommentRequired(SettlementReason::Other)));

        let note = ReviewNote::new(SettlementReason::Other, Some(" bank asked for ID "), 125).unwrap();
        assert_eq!(note.comment.as_deref(), Some("bank asked for ID"));
    }

    #[test]
    fn test_comment_bound_counts_characters() {
        let at_limit = "é".repeat(125);
        assert!(ReviewNote::new(SettlementReason::SuspectedFraud, Some(&at_limit), 125).is_ok());

        let over = "x".repeat(126);
        let err = ReviewNote::new(SettlementReason::SuspectedFraud, Some(&over), 125).unwrap_err();
        assert_eq!(err.code(), "COMMENT_TOO_LONG");
    }

    #[test]
    fn test_payout_failed_is_not_selectable() {
        let err = ReviewNote::new(SettlementReason::PayoutFailed, None, 125).unwrap_err();
        assert_eq!(err.code(), "INVALID_REASON");
    }

    #[test]
    fn test_maker_checker() {
        assert!(ensure_reviewer(&Actor::new("ops-1", UserRole::Admin), "shop").is_ok());
        assert_eq!(
            ensure_reviewer(&Actor::new("fin", UserRole::Finance), "shop").unwrap_err().code(),
            "NOT_SETTLEMENT_REVIEWER"
        );
        assert_eq!(
            ensure_reviewer(&Actor::new("shop", UserRole::Admin), "shop").unwrap_err().code(),
            "SELF_REVIEW"
        );
    }
}
