//! # Compliance Alerts API
//!
//! Alerts are opened by transition validation and closed by a compliance
//! officer. They are never deleted.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tce_compliance::ComplianceAlert;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;
use crate::extractors::{extract_path, extract_validated_json, require_non_blank, Validate};
use crate::state::AppState;

/// Wire form of a compliance alert.
#[derive(Debug, Serialize, ToSchema)]
pub struct AlertResponse {
    pub id: Uuid,
    pub dossier_id: String,
    pub rule_id: String,
    /// `BLOCKING` or `WARNING`.
    pub severity: String,
    /// `TENANT_COMPLIANCE` or `STATE_CHANGE`.
    pub context: String,
    /// `TO_<STATUS>` of the transition that raised the alert.
    pub trigger: String,
    pub message: String,
    #[schema(value_type = Object)]
    pub details: serde_json::Value,
    pub is_resolved: bool,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ComplianceAlert> for AlertResponse {
    fn from(alert: ComplianceAlert) -> Self {
        Self {
            id: alert.id,
            dossier_id: alert.dossier_id,
            rule_id: alert.rule_id,
            severity: alert.severity.to_string(),
            context: alert.context.as_str().to_string(),
            trigger: alert.trigger,
            message: alert.message,
            details: alert.details,
            is_resolved: alert.is_resolved,
            resolved_by: alert.resolved_by,
            resolved_at: alert.resolved_at,
            resolution: alert.resolution,
            created_at: alert.created_at,
        }
    }
}

/// Open alerts of one dossier.
#[derive(Debug, Serialize, ToSchema)]
pub struct AlertListResponse {
    pub dossier_id: String,
    pub count: usize,
    /// Newest first.
    pub alerts: Vec<AlertResponse>,
}

/// Resolve request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ResolveAlertRequest {
    pub resolved_by: String,
    pub resolution: String,
}

impl Validate for ResolveAlertRequest {
    fn validate(&self) -> Result<(), String> {
        require_non_blank("resolved_by", &self.resolved_by)?;
        require_non_blank("resolution", &self.resolution)
    }
}

/// Build the alerts router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/dossiers/{id}/alerts", get(list_unresolved_alerts))
        .route("/v1/alerts/{id}/resolve", post(resolve_alert))
}

/// GET /v1/dossiers/{id}/alerts: Unresolved alerts, newest first.
#[utoipa::path(
    get,
    path = "/v1/dossiers/{id}/alerts",
    params(("id" = String, Path, description = "Dossier ID")),
    responses(
        (status = 200, description = "Unresolved alerts", body = AlertListResponse),
    ),
    tag = "alerts"
)]
pub(crate) async fn list_unresolved_alerts(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AlertListResponse>, AppError> {
    let alerts: Vec<AlertResponse> = state
        .engine
        .list_unresolved_alerts(&id)
        .await?
        .into_iter()
        .map(AlertResponse::from)
        .collect();
    Ok(Json(AlertListResponse {
        dossier_id: id,
        count: alerts.len(),
        alerts,
    }))
}

/// POST /v1/alerts/{id}/resolve: Resolve an alert.
///
/// Resolving an already resolved alert overwrites its resolution.
#[utoipa::path(
    post,
    path = "/v1/alerts/{id}/resolve",
    params(("id" = Uuid, Path, description = "Alert ID")),
    request_body = ResolveAlertRequest,
    responses(
        (status = 200, description = "Alert resolved", body = AlertResponse),
        (status = 400, description = "Alert ID is not a UUID or body is malformed", body = crate::error::ErrorBody),
        (status = 404, description = "Alert not found", body = crate::error::ErrorBody),
        (status = 422, description = "Blank resolver or resolution", body = crate::error::ErrorBody),
    ),
    tag = "alerts"
)]
pub(crate) async fn resolve_alert(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<ResolveAlertRequest>, JsonRejection>,
) -> Result<Json<AlertResponse>, AppError> {
    let id = extract_path(path)?;
    let req = extract_validated_json(body)?;
    let alert = state
        .engine
        .resolve_alert(id, req.resolved_by.trim(), req.resolution.trim())
        .await?;
    Ok(Json(alert.into()))
}
