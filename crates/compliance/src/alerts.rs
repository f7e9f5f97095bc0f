//! Alert persistence and human review

use crate::error::{ComplianceError, ComplianceResult};
use crate::gate::ScreeningResult;
use chrono::{DateTime, Utc};
use lus_core::{AlertStatus, ComplianceAlert};
use lus_store::{AlertFilter, AlertRepo};
use sqlx::SqliteConnection;
use tracing::info;

/// Persist every alert a screening raised.
///
/// Alerts reference their transaction or settlement, so call this after that
/// row exists, inside the same database transaction.
pub async fn record_alerts(conn: &mut SqliteConnection, result: &ScreeningResult) -> ComplianceResult<usize> {
    for alert in &result.alerts {
        AlertRepo::insert(conn, alert).await?;
    }
    Ok(result.alerts.len())
}

/// Close an open alert as cleared or escalated.
///
/// Everything but status and reviewer stays immutable; a second review of the
/// same alert is refused.
pub async fn review_alert(
    conn: &mut SqliteConnection,
    alert_id: &str,
    reviewer_id: &str,
    outcome: AlertStatus,
    at: DateTime<Utc>,
) -> ComplianceResult<ComplianceAlert> {
    if outcome == AlertStatus::Open {
        return Err(ComplianceError::InvalidReviewOutcome);
    }
    if !AlertRepo::review(conn, alert_id, outcome, reviewer_id, at).await? {
        return match AlertRepo::get(conn, alert_id).await? {
            Some(_) => Err(ComplianceError::AlertAlreadyReviewed(alert_id.to_string())),
            None => Err(ComplianceError::AlertNotFound(alert_id.to_string())),
        };
    }
    info!(alert_id, reviewer_id, %outcome, "alert reviewed");
    Ok(AlertRepo::require(conn, alert_id).await?)
}

pub async fn list_alerts(conn: &mut SqliteConnection, filter: &AlertFilter) -> ComplianceResult<Vec<ComplianceAlert>> {
    Ok(AlertRepo::list(conn, filter).await?)
}
