//! # Onboarding Checks API
//!
//! Pre-creation checks for tenant organizations and their training sites.
//! Nothing is created or persisted here: the CRM calls these before its
//! own insert and refuses the insert when `success` is `false`.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use tce_compliance::{OrganizationDraft, SiteDraft, SiteKind};
use tce_core::OrganizationKind;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::extractors::{extract_validated_json, require_non_blank, Validate};
use crate::routes::ValidationResponse;
use crate::state::AppState;

/// A site about to be created under a tenant.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ValidateSiteRequest {
    pub name: String,
    /// `STANDARD`, `REGIONAL` or `APPRENTICESHIP`.
    #[schema(value_type = String, example = "REGIONAL")]
    pub kind: SiteKind,
    #[serde(default)]
    pub uai_code: Option<String>,
}

impl Validate for ValidateSiteRequest {
    fn validate(&self) -> Result<(), String> {
        require_non_blank("name", &self.name)
    }
}

impl From<ValidateSiteRequest> for SiteDraft {
    fn from(req: ValidateSiteRequest) -> Self {
        Self {
            name: req.name,
            kind: req.kind,
            uai_code: req.uai_code,
        }
    }
}

/// An organization about to be onboarded.
///
/// Regulatory identity problems (bad SIRET, missing NDA) are reported in the
/// verdict rather than rejected as a malformed request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ValidateOrganizationRequest {
    pub name: String,
    /// `TRAINING_PROVIDER` or `APPRENTICESHIP_CENTER`.
    #[schema(value_type = String, example = "TRAINING_PROVIDER")]
    pub kind: OrganizationKind,
    #[serde(default)]
    pub siret: Option<String>,
    #[serde(default)]
    pub nda_number: Option<String>,
    #[serde(default)]
    pub qualiopi_certified: Option<bool>,
}

impl Validate for ValidateOrganizationRequest {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

impl From<ValidateOrganizationRequest> for OrganizationDraft {
    fn from(req: ValidateOrganizationRequest) -> Self {
        Self {
            name: req.name,
            kind: req.kind,
            siret: req.siret,
            nda_number: req.nda_number,
            qualiopi_certified: req.qualiopi_certified,
        }
    }
}

/// Build the onboarding router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/tenants/{id}/sites/validate", post(validate_site))
        .route("/v1/organizations/validate", post(validate_organization))
}

/// POST /v1/tenants/{id}/sites/validate: Check a site before creation.
#[utoipa::path(
    post,
    path = "/v1/tenants/{id}/sites/validate",
    params(("id" = String, Path, description = "Tenant organization ID")),
    request_body = ValidateSiteRequest,
    responses(
        (status = 200, description = "Verdict", body = ValidationResponse),
        (status = 404, description = "Tenant not found", body = crate::error::ErrorBody),
    ),
    tag = "onboarding"
)]
pub(crate) async fn validate_site(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    body: Result<Json<ValidateSiteRequest>, JsonRejection>,
) -> Result<Json<ValidationResponse>, AppError> {
    let site: SiteDraft = extract_validated_json(body)?.into();
    let result = state.engine.validate_site_creation(&tenant_id, &site).await?;
    Ok(Json((&result).into()))
}

/// POST /v1/organizations/validate: Check an organization before onboarding.
#[utoipa::path(
    post,
    path = "/v1/organizations/validate",
    request_body = ValidateOrganizationRequest,
    responses(
        (status = 200, description = "Verdict", body = ValidationResponse),
    ),
    tag = "onboarding"
)]
pub(crate) async fn validate_organization(
    State(state): State<AppState>,
    body: Result<Json<ValidateOrganizationRequest>, JsonRejection>,
) -> Result<Json<ValidationResponse>, AppError> {
    let draft: OrganizationDraft = extract_validated_json(body)?.into();
    let result = state.engine.validate_organization_creation(&draft);
    Ok(Json((&result).into()))
}
