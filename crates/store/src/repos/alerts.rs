//! Compliance alerts

use crate::codec::ts;
use crate::error::{StoreError, StoreResult};
use crate::rows::AlertRow;
use chrono::{DateTime, Utc};
use lus_core::{AlertStatus, ComplianceAlert};
use sqlx::SqliteConnection;

/// Optional filters for listing alerts
#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    pub status: Option<AlertStatus>,
    pub user_id: Option<String>,
}

pub struct AlertRepo;

impl AlertRepo {
    pub async fn insert(conn: &mut SqliteConnection, alert: &ComplianceAlert) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO compliance_alerts (
                id, alert_type, severity, risk_score, triggered_rules, description, user_id,
                transaction_id, settlement_id, decision, status, reviewed_by, reviewed_at, created_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&alert.id)
        .bind(alert.alert_type.to_string())
        .bind(alert.severity.to_string())
        .bind(i64::from(alert.risk_score))
        .bind(serde_json::to_string(&alert.triggered_rules)?)
        .bind(&alert.description)
        .bind(&alert.user_id)
        .bind(&alert.transaction_id)
        .bind(&alert.settlement_id)
        .bind(alert.decision.to_string())
        .bind(alert.status.to_string())
        .bind(&alert.reviewed_by)
        .bind(alert.reviewed_at.as_ref().map(ts))
        .bind(ts(&alert.created_at))
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub async fn get(conn: &mut SqliteConnection, id: &str) -> StoreResult<Option<ComplianceAlert>> {
        sqlx::query_as::<_, AlertRow>("SELECT * FROM compliance_alerts WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .map(ComplianceAlert::try_from)
            .transpose()
    }

    pub async fn require(conn: &mut SqliteConnection, id: &str) -> StoreResult<ComplianceAlert> {
        Self::get(conn, id)
            .await?
            .ok_or_else(|| StoreError::not_found("ComplianceAlert", id))
    }

    pub async fn list(conn: &mut SqliteConnection, filter: &AlertFilter) -> StoreResult<Vec<ComplianceAlert>> {
        sqlx::query_as::<_, AlertRow>(
            "SELECT * FROM compliance_alerts
             WHERE (?1 IS NULL OR status = ?1) AND (?2 IS NULL OR user_id = ?2)
             ORDER BY created_at DESC",
        )
        .bind(filter.status.map(|s| s.to_string()))
        .bind(&filter.user_id)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(ComplianceAlert::try_from)
        .collect()
    }

    /// Close an open alert. Returns `false` when it was already reviewed.
    pub async fn review(
        conn: &mut SqliteConnection,
        id: &str,
        status: AlertStatus,
        reviewer_id: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE compliance_alerts SET status = ?2, reviewed_by = ?3, reviewed_at = ?4
             WHERE id = ?1 AND status = 'open'",
        )
        .bind(id)
        .bind(status.to_string())
        .bind(reviewer_id)
        .bind(ts(&at))
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Alerts raised against a user within `[from, to]`, oldest first.
    pub async fn for_user_between(
        conn: &mut SqliteConnection,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<ComplianceAlert>> {
        sqlx::query_as::<_, AlertRow>(
            "SELECT * FROM compliance_alerts
             WHERE user_id = ? AND created_at >= ? AND created_at <= ?
             ORDER BY created_at",
        )
        .bind(user_id)
        .bind(ts(&from))
        .bind(ts(&to))
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(ComplianceAlert::try_from)
        .collect()
    }
}
