//! # Transition Validation API
//!
//! Asks the engine whether a dossier may move to a target status. The
//! endpoint never changes the dossier status itself: the caller applies
//! the transition only when `success` is `true`.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tce_compliance::{Actor, TransitionReport};
use tce_core::DossierStatus;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;
use crate::extractors::{extract_validated_json, require_non_blank, Validate};
use crate::state::AppState;

/// Request to validate a status change.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ValidateTransitionRequest {
    /// Target status, e.g. `CLOSED`.
    pub target_status: String,
    /// Who is asking. Without it no audit entry is written.
    #[serde(default)]
    pub actor_id: Option<String>,
    #[serde(default)]
    pub actor_role: Option<String>,
}

impl ValidateTransitionRequest {
    fn target(&self) -> Result<DossierStatus, tce_core::ValidationError> {
        self.target_status.trim().parse()
    }

    fn actor(&self) -> Option<Actor> {
        let id = self.actor_id.as_deref()?.trim();
        let actor = Actor::new(id);
        Some(match self.actor_role.as_deref().map(str::trim) {
            Some(role) if !role.is_empty() => actor.with_role(role),
            _ => actor,
        })
    }
}

impl Validate for ValidateTransitionRequest {
    fn validate(&self) -> Result<(), String> {
        self.target().map_err(|e| e.to_string())?;
        if let Some(id) = &self.actor_id {
            require_non_blank("actor_id", id)?;
        }
        if self.actor_role.is_some() && self.actor_id.is_none() {
            return Err("actor_role requires actor_id".to_string());
        }
        Ok(())
    }
}

/// Verdict plus what the engine persisted.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransitionResponse {
    pub dossier_id: String,
    pub target_status: String,
    pub success: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Alerts opened by this call, in evaluation order.
    pub alert_ids: Vec<Uuid>,
    pub audit_entry_id: Option<Uuid>,
    /// `false` when an alert or audit write failed. The verdict stands.
    pub fully_persisted: bool,
}

impl TransitionResponse {
    fn new(dossier_id: String, target: DossierStatus, report: TransitionReport) -> Self {
        let fully_persisted = report.is_fully_persisted();
        Self {
            dossier_id,
            target_status: target.to_string(),
            success: report.result.success(),
            errors: report.result.errors().to_vec(),
            warnings: report.result.warnings().to_vec(),
            alert_ids: report.alert_ids,
            audit_entry_id: report.audit_entry_id,
            fully_persisted,
        }
    }
}

/// Build the transitions router.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/v1/dossiers/{id}/transitions/validate",
        post(validate_transition),
    )
}

/// POST /v1/dossiers/{id}/transitions/validate: Validate a status change.
#[utoipa::path(
    post,
    path = "/v1/dossiers/{id}/transitions/validate",
    params(("id" = String, Path, description = "Dossier ID")),
    request_body = ValidateTransitionRequest,
    responses(
        (status = 200, description = "Verdict (blocked transitions are still 200)", body = TransitionResponse),
        (status = 404, description = "Dossier not found", body = crate::error::ErrorBody),
        (status = 422, description = "Unknown target status", body = crate::error::ErrorBody),
    ),
    tag = "transitions"
)]
pub(crate) async fn validate_transition(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ValidateTransitionRequest>, JsonRejection>,
) -> Result<Json<TransitionResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let target = req.target()?;
    let actor = req.actor();

    let report = state
        .engine
        .validate_transition_report(&id, target, actor.as_ref())
        .await?;

    if !report.is_fully_persisted() {
        tracing::warn!(
            dossier_id = %id,
            failures = report.persistence_failures.len(),
            "verdict returned with unpersisted records"
        );
    }

    Ok(Json(TransitionResponse::new(id, target, report)))
}
