//! Compliance alert persistence.
//!
//! Alerts are inserted once and never deleted. The only update is
//! resolution, which overwrites the resolution columns.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tce_compliance::ComplianceAlert;
use uuid::Uuid;

use super::decode_name;

const COLUMNS: &str = "id, dossier_id, rule_id, severity, context, rule_trigger, message, details,
     is_resolved, resolved_by, resolved_at, resolution, created_at";

/// Append an alert.
pub async fn insert(pool: &PgPool, alert: &ComplianceAlert) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO compliance_alerts (id, dossier_id, rule_id, severity, context, rule_trigger,
         message, details, is_resolved, resolved_by, resolved_at, resolution, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
    )
    .bind(alert.id)
    .bind(&alert.dossier_id)
    .bind(&alert.rule_id)
    .bind(alert.severity.as_str())
    .bind(alert.context.as_str())
    .bind(&alert.trigger)
    .bind(&alert.message)
    .bind(&alert.details)
    .bind(alert.is_resolved)
    .bind(&alert.resolved_by)
    .bind(alert.resolved_at)
    .bind(&alert.resolution)
    .bind(alert.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Mark an alert resolved. Returns `None` if the id is unknown.
pub async fn resolve(
    pool: &PgPool,
    id: Uuid,
    resolved_by: &str,
    resolution: &str,
    at: DateTime<Utc>,
) -> Result<Option<ComplianceAlert>, sqlx::Error> {
    let row = sqlx::query_as::<_, AlertRow>(&format!(
        "UPDATE compliance_alerts
         SET is_resolved = TRUE, resolved_by = $2, resolution = $3, resolved_at = $4
         WHERE id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(resolved_by)
    .bind(resolution)
    .bind(at)
    .fetch_optional(pool)
    .await?;
    row.map(AlertRow::into_alert).transpose()
}

/// Unresolved alerts of a dossier, newest first. Ties keep reverse
/// insertion order.
pub async fn unresolved_for(pool: &PgPool, dossier_id: &str) -> Result<Vec<ComplianceAlert>, sqlx::Error> {
    let rows = sqlx::query_as::<_, AlertRow>(&format!(
        "SELECT {COLUMNS} FROM compliance_alerts
         WHERE dossier_id = $1 AND NOT is_resolved
         ORDER BY created_at DESC, seq DESC"
    ))
    .bind(dossier_id)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(AlertRow::into_alert).collect()
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct AlertRow {
    id: Uuid,
    dossier_id: String,
    rule_id: String,
    severity: String,
    context: String,
    rule_trigger: String,
    message: String,
    details: serde_json::Value,
    is_resolved: bool,
    resolved_by: Option<String>,
    resolved_at: Option<DateTime<Utc>>,
    resolution: Option<String>,
    created_at: DateTime<Utc>,
}

impl AlertRow {
    fn into_alert(self) -> Result<ComplianceAlert, sqlx::Error> {
        Ok(ComplianceAlert {
            id: self.id,
            dossier_id: self.dossier_id,
            rule_id: self.rule_id,
            severity: decode_name("severity", &self.severity)?,
            context: decode_name("context", &self.context)?,
            trigger: self.rule_trigger,
            message: self.message,
            details: self.details,
            is_resolved: self.is_resolved,
            resolved_by: self.resolved_by,
            resolved_at: self.resolved_at,
            resolution: self.resolution,
            created_at: self.created_at,
        })
    }
}
