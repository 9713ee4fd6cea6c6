//! # Persistence Ports
//!
//! The engine reads dossiers and writes alerts and audit entries through
//! these traits. Implementations are injected as `Arc<dyn ...>` at
//! construction time: [`InMemoryComplianceStore`](crate::InMemoryComplianceStore)
//! for tests and development, a Postgres store in the API service.
//!
//! All ports are `Send + Sync` and object-safe.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::alert::ComplianceAlert;
use crate::audit::{AuditLogEntry, ChainIntegrity, NewAuditEntry};
use crate::error::PersistenceError;
use crate::model::{Dossier, Organization};

/// Read model for dossiers and their tenants.
#[async_trait]
pub trait DossierRepository: Send + Sync {
    /// Load a dossier with organization, contracts and financers, session,
    /// proofs and attendance. `None` if the dossier does not exist.
    async fn dossier_with_relations(&self, id: &str) -> Result<Option<Dossier>, PersistenceError>;

    /// Load a tenant organization.
    async fn organization(&self, tenant_id: &str) -> Result<Option<Organization>, PersistenceError>;
}

/// Append-only alert storage with resolution.
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Append an alert. Never updates an existing one.
    async fn record_alert(&self, alert: ComplianceAlert) -> Result<(), PersistenceError>;

    /// Mark an alert resolved, overwriting any previous resolution.
    /// `None` if the id is unknown.
    async fn resolve_alert(
        &self,
        id: Uuid,
        resolved_by: &str,
        resolution: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<ComplianceAlert>, PersistenceError>;

    /// Unresolved alerts for a dossier, newest first.
    async fn unresolved_for(&self, dossier_id: &str) -> Result<Vec<ComplianceAlert>, PersistenceError>;
}

/// Append-only, hash-chained audit storage.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Chain `entry` after the latest stored entry and append it.
    async fn record_audit(&self, entry: NewAuditEntry) -> Result<AuditLogEntry, PersistenceError>;

    /// Entries recorded against one entity, oldest first.
    async fn entries_for(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> Result<Vec<AuditLogEntry>, PersistenceError>;

    /// Walk the first `limit` entries in append order and check every link.
    async fn verify_integrity(&self, limit: usize) -> Result<ChainIntegrity, PersistenceError>;
}
