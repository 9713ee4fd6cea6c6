//! # Database Persistence Layer
//!
//! Postgres persistence via SQLx. The database is optional: without
//! `DATABASE_URL` the service runs on the in-memory store.
//!
//! ## What is persisted
//!
//! - Compliance alerts, with their resolution
//! - The audit log (immutable hash chain)
//!
//! ## What is read
//!
//! The dossier and organization read model. It is a JSONB projection of
//! CRM data written by the CRM, not by this service.
//!
//! All query functions take a `&PgPool` and return `sqlx::Error`.
//! [`PgComplianceStore`] adapts them to the engine's ports.

pub mod alerts;
pub mod audit;
pub mod dossiers;
pub mod store;

pub use store::PgComplianceStore;

use serde::de::DeserializeOwned;
use sqlx::postgres::{PgPool, PgPoolOptions};

/// Connect to Postgres and run embedded migrations.
///
/// # Errors
///
/// Returns `Err` if the connection or a migration fails.
pub async fn init_pool(url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(pool)
}

/// Decode a text column holding a SCREAMING_SNAKE_CASE enum name.
pub(crate) fn decode_name<T: DeserializeOwned>(column: &str, raw: &str) -> Result<T, sqlx::Error> {
    serde_json::from_value(serde_json::Value::String(raw.to_string())).map_err(|e| {
        tracing::error!(column, value = raw, error = %e, "unrecognised enum value in database");
        sqlx::Error::Decode(Box::new(e))
    })
}

/// Decode a JSONB document column.
pub(crate) fn decode_document<T: DeserializeOwned>(
    table: &str,
    document: serde_json::Value,
) -> Result<T, sqlx::Error> {
    serde_json::from_value(document).map_err(|e| {
        tracing::error!(table, error = %e, "stored document does not match the read model");
        sqlx::Error::Decode(Box::new(e))
    })
}
