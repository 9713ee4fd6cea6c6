//! Dossier and organization read model.
//!
//! Both tables hold one JSONB document per row in the shape of
//! [`Dossier`] and [`Organization`]. A dossier document embeds its
//! organization, contracts, session, proofs and attendance, so loading a
//! dossier "with relations" is a single row fetch.

use sqlx::PgPool;
use tce_compliance::{Dossier, Organization};

use super::decode_document;

/// Load a dossier with all its relations.
pub async fn load(pool: &PgPool, id: &str) -> Result<Option<Dossier>, sqlx::Error> {
    let document: Option<serde_json::Value> =
        sqlx::query_scalar("SELECT document FROM dossier_read_model WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    document
        .map(|doc| decode_document("dossier_read_model", doc))
        .transpose()
}

/// Load a tenant organization.
pub async fn organization(pool: &PgPool, id: &str) -> Result<Option<Organization>, sqlx::Error> {
    let document: Option<serde_json::Value> =
        sqlx::query_scalar("SELECT document FROM organizations WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    document
        .map(|doc| decode_document("organizations", doc))
        .transpose()
}
