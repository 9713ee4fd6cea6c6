//! # tce-api: HTTP Service for the Training Compliance Engine
//!
//! Thin Axum layer over [`tce_compliance::ComplianceEngine`]. Handlers
//! parse and validate the request, call one engine operation and map the
//! result. No compliance logic lives here.
//!
//! ## API Surface
//!
//! | Route | Module | Operation |
//! |---|---|---|
//! | `POST /v1/dossiers/{id}/transitions/validate` | [`routes::transitions`] | validate a status change |
//! | `GET /v1/dossiers/{id}/alerts` | [`routes::alerts`] | unresolved alerts |
//! | `POST /v1/alerts/{id}/resolve` | [`routes::alerts`] | resolve an alert |
//! | `GET /v1/dossiers/{id}/audit` | [`routes::audit`] | audit trail |
//! | `GET /v1/audit/verify` | [`routes::audit`] | audit chain integrity |
//! | `POST /v1/tenants/{id}/sites/validate` | [`routes::onboarding`] | site pre-creation check |
//! | `POST /v1/organizations/validate` | [`routes::onboarding`] | organization pre-creation check |
//! | `GET /v1/rules` | [`routes::rules`] | loaded rules |
//!
//! ## Storage
//!
//! In-memory by default. With `DATABASE_URL` set, alerts, audit entries and
//! the dossier read model live in Postgres ([`db`]).
//!
//! ## OpenAPI
//!
//! Generated with utoipa derive macros, served at `/openapi.json`.

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::http::StatusCode;
use axum::extract::State;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::transitions::router())
        .merge(routes::alerts::router())
        .merge(routes::audit::router())
        .merge(routes::onboarding::router())
        .merge(routes::rules::router())
        .merge(openapi::router())
        .layer(TraceLayer::new_for_http());

    let health = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness));

    Router::new().merge(health).merge(api).with_state(state)
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 503 while a configured database is unreachable.
async fn readiness(State(state): State<AppState>) -> Result<&'static str, (StatusCode, &'static str)> {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!(error = %e, "readiness check failed: database unreachable");
            return Err((StatusCode::SERVICE_UNAVAILABLE, "database unavailable"));
        }
    }
    Ok("ready")
}
