//! # Audit Trail API
//!
//! Read-only access to the hash-chained audit log written by transition
//! validation, plus an integrity check over the chain.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tce_compliance::{AuditLogEntry, ChainIntegrity};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::AppError;
use crate::extractors::extract_query;
use crate::state::AppState;

/// Entries checked when no limit is given.
const DEFAULT_VERIFY_LIMIT: usize = 10_000;

/// Wire form of an audit entry.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuditEntryResponse {
    pub id: Uuid,
    pub tenant_id: String,
    pub actor_id: String,
    pub actor_role: Option<String>,
    /// `TRANSITION_BLOCKED` or `TRANSITION_ALLOWED_WITH_WARNINGS`.
    pub action: String,
    pub phase: String,
    pub is_forced: bool,
    pub previous_state: String,
    pub new_state: String,
    #[schema(value_type = Object)]
    pub details: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    pub previous_hash: String,
    pub entry_hash: String,
}

impl From<AuditLogEntry> for AuditEntryResponse {
    fn from(entry: AuditLogEntry) -> Self {
        Self {
            id: entry.id,
            tenant_id: entry.tenant_id,
            actor_id: entry.actor_id,
            actor_role: entry.actor_role,
            action: entry.action.as_str().to_string(),
            phase: entry.phase.as_str().to_string(),
            is_forced: entry.is_forced,
            previous_state: entry.previous_state.as_str().to_string(),
            new_state: entry.new_state.as_str().to_string(),
            details: entry.details,
            timestamp: entry.timestamp,
            previous_hash: entry.previous_hash,
            entry_hash: entry.entry_hash,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuditTrailResponse {
    pub dossier_id: String,
    pub count: usize,
    /// Oldest first.
    pub entries: Vec<AuditEntryResponse>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct VerifyQuery {
    /// Number of entries to check from the start of the chain.
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChainIntegrityResponse {
    pub valid: bool,
    pub total_entries: usize,
    pub broken_links: usize,
}

impl From<ChainIntegrity> for ChainIntegrityResponse {
    fn from(integrity: ChainIntegrity) -> Self {
        Self {
            valid: integrity.is_valid(),
            total_entries: integrity.total_entries,
            broken_links: integrity.broken_links,
        }
    }
}

/// Build the audit router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/dossiers/{id}/audit", get(audit_trail))
        .route("/v1/audit/verify", get(verify_chain))
}

/// GET /v1/dossiers/{id}/audit: Audit entries of a dossier, oldest first.
#[utoipa::path(
    get,
    path = "/v1/dossiers/{id}/audit",
    params(("id" = String, Path, description = "Dossier ID")),
    responses(
        (status = 200, description = "Audit trail", body = AuditTrailResponse),
    ),
    tag = "audit"
)]
pub(crate) async fn audit_trail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AuditTrailResponse>, AppError> {
    let entries: Vec<AuditEntryResponse> = state
        .engine
        .audit_trail(&id)
        .await?
        .into_iter()
        .map(AuditEntryResponse::from)
        .collect();
    Ok(Json(AuditTrailResponse {
        dossier_id: id,
        count: entries.len(),
        entries,
    }))
}

/// GET /v1/audit/verify: Walk the chain and count broken links.
#[utoipa::path(
    get,
    path = "/v1/audit/verify",
    params(VerifyQuery),
    responses(
        (status = 200, description = "Integrity report", body = ChainIntegrityResponse),
        (status = 400, description = "Limit is not a number", body = crate::error::ErrorBody),
        (status = 422, description = "Zero limit", body = crate::error::ErrorBody),
    ),
    tag = "audit"
)]
pub(crate) async fn verify_chain(
    State(state): State<AppState>,
    query: Result<Query<VerifyQuery>, QueryRejection>,
) -> Result<Json<ChainIntegrityResponse>, AppError> {
    let query = extract_query(query)?;
    let limit = query.limit.unwrap_or(DEFAULT_VERIFY_LIMIT);
    if limit == 0 {
        return Err(AppError::Validation("limit must be at least 1".into()));
    }
    let integrity = state.engine.verify_audit_chain(limit).await?;
    Ok(Json(integrity.into()))
}
