//! Postgres implementation of the engine's persistence ports.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tce_compliance::{
    AlertStore, AuditLogEntry, AuditStore, ChainIntegrity, ComplianceAlert, Dossier,
    DossierRepository, NewAuditEntry, Organization, PersistenceError,
};
use uuid::Uuid;

use super::{alerts, audit, dossiers};

#[derive(Debug, Clone)]
pub struct PgComplianceStore {
    pool: PgPool,
}

impl PgComplianceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Decode failures mean a stored row no longer matches the model.
fn persistence_error(err: sqlx::Error) -> PersistenceError {
    match err {
        sqlx::Error::Decode(e) | sqlx::Error::ColumnDecode { source: e, .. } => {
            PersistenceError::Corrupt(e.to_string())
        }
        other => PersistenceError::Backend(other.to_string()),
    }
}

#[async_trait]
impl DossierRepository for PgComplianceStore {
    async fn dossier_with_relations(&self, id: &str) -> Result<Option<Dossier>, PersistenceError> {
        dossiers::load(&self.pool, id).await.map_err(persistence_error)
    }

    async fn organization(&self, tenant_id: &str) -> Result<Option<Organization>, PersistenceError> {
        dossiers::organization(&self.pool, tenant_id)
            .await
            .map_err(persistence_error)
    }
}

#[async_trait]
impl AlertStore for PgComplianceStore {
    async fn record_alert(&self, alert: ComplianceAlert) -> Result<(), PersistenceError> {
        alerts::insert(&self.pool, &alert)
            .await
            .map_err(persistence_error)
    }

    async fn resolve_alert(
        &self,
        id: Uuid,
        resolved_by: &str,
        resolution: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<ComplianceAlert>, PersistenceError> {
        alerts::resolve(&self.pool, id, resolved_by, resolution, at)
            .await
            .map_err(persistence_error)
    }

    async fn unresolved_for(&self, dossier_id: &str) -> Result<Vec<ComplianceAlert>, PersistenceError> {
        alerts::unresolved_for(&self.pool, dossier_id)
            .await
            .map_err(persistence_error)
    }
}

#[async_trait]
impl AuditStore for PgComplianceStore {
    async fn record_audit(&self, entry: NewAuditEntry) -> Result<AuditLogEntry, PersistenceError> {
        audit::append(&self.pool, entry)
            .await
            .map_err(persistence_error)
    }

    async fn entries_for(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> Result<Vec<AuditLogEntry>, PersistenceError> {
        audit::entries_for_entity(&self.pool, entity_type, entity_id)
            .await
            .map_err(persistence_error)
    }

    async fn verify_integrity(&self, limit: usize) -> Result<ChainIntegrity, PersistenceError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        audit::verify_chain_integrity(&self.pool, limit)
            .await
            .map_err(persistence_error)
    }
}
