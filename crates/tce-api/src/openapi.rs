//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI document
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Training Compliance Engine API",
        version = "0.1.0",
        description = "Transition validation, compliance alerts and onboarding checks for vocational-training dossiers.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        // Transitions
        crate::routes::transitions::validate_transition,
        // Alerts
        crate::routes::alerts::list_unresolved_alerts,
        crate::routes::alerts::resolve_alert,
        // Audit
        crate::routes::audit::audit_trail,
        crate::routes::audit::verify_chain,
        // Onboarding
        crate::routes::onboarding::validate_site,
        crate::routes::onboarding::validate_organization,
        // Rules
        crate::routes::rules::list_rules,
    ),
    components(schemas(
        // Error types
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        // Shared
        crate::routes::ValidationResponse,
        // Transition DTOs
        crate::routes::transitions::ValidateTransitionRequest,
        crate::routes::transitions::TransitionResponse,
        // Alert DTOs
        crate::routes::alerts::AlertResponse,
        crate::routes::alerts::AlertListResponse,
        crate::routes::alerts::ResolveAlertRequest,
        // Audit DTOs
        crate::routes::audit::AuditEntryResponse,
        crate::routes::audit::AuditTrailResponse,
        crate::routes::audit::ChainIntegrityResponse,
        // Onboarding DTOs
        crate::routes::onboarding::ValidateSiteRequest,
        crate::routes::onboarding::ValidateOrganizationRequest,
        // Rule DTOs
        crate::routes::rules::RuleSummary,
        crate::routes::rules::RuleListResponse,
    )),
    tags(
        (name = "transitions", description = "Dossier status transition validation"),
        (name = "alerts", description = "Compliance alerts"),
        (name = "audit", description = "Hash-chained audit trail"),
        (name = "onboarding", description = "Tenant and site pre-creation checks"),
        (name = "rules", description = "Loaded declarative rules"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json: Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/v1/dossiers/{id}/transitions/validate",
            "/v1/dossiers/{id}/alerts",
            "/v1/alerts/{id}/resolve",
            "/v1/dossiers/{id}/audit",
            "/v1/audit/verify",
            "/v1/tenants/{id}/sites/validate",
            "/v1/organizations/validate",
            "/v1/rules",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
