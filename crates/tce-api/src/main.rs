//! # tce-api: Binary Entry Point
//!
//! Reads configuration from the environment, loads the rule document once,
//! connects to Postgres when `DATABASE_URL` is set, and serves the API.

use std::sync::Arc;

use tce_api::config::ApiConfig;
use tce_api::state::AppState;
use tce_compliance::{InMemoryComplianceStore, ValidatorOptions};
use tce_rules::RuleDocument;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ApiConfig::from_env()?;

    // Initialize structured tracing.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    tracing::info!(?config, "configuration loaded");

    // A bad rule document is fatal: never serve with a partial rule set.
    let rules = match &config.rules_path {
        Some(path) => RuleDocument::load(path),
        None => RuleDocument::standard(),
    }
    .map_err(|e| {
        tracing::error!("Rule document rejected: {e}");
        e
    })?;
    let rules = Arc::new(rules);

    let options = ValidatorOptions {
        record_warning_alerts: config.record_warning_alerts,
    };

    let state = match &config.database_url {
        Some(url) => {
            let pool = tce_api::db::init_pool(url).await.map_err(|e| {
                tracing::error!("Database initialization failed: {e}");
                e
            })?;
            AppState::with_pool(rules, pool, options)
        }
        None => {
            tracing::warn!(
                "DATABASE_URL not set, running in-memory only mode. \
                 The dossier read model is empty and alerts will not survive restarts."
            );
            AppState::in_memory(rules, Arc::new(InMemoryComplianceStore::new()), options)
        }
    };

    let app = tce_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("TCE API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
