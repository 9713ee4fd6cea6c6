//! # In-Memory Store
//!
//! Implements every port over `parking_lot` locks. Used by tests, the CLI
//! dry-run and the API when no database is configured.
//!
//! Locks are never held across an `.await`: each port method takes the
//! lock, does its work and releases it before returning.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::alert::ComplianceAlert;
use crate::audit::{verify_chain, AuditLogEntry, ChainIntegrity, NewAuditEntry, GENESIS_HASH};
use crate::error::PersistenceError;
use crate::model::{Dossier, Organization};
use crate::ports::{AlertStore, AuditStore, DossierRepository};

#[derive(Debug, Default)]
pub struct InMemoryComplianceStore {
    dossiers: RwLock<HashMap<String, Dossier>>,
    organizations: RwLock<HashMap<String, Organization>>,
    /// Append order.
    alerts: RwLock<Vec<ComplianceAlert>>,
    /// Append order.
    audit: RwLock<Vec<AuditLogEntry>>,
}

impl InMemoryComplianceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a dossier. Its organization is registered too.
    pub fn upsert_dossier(&self, dossier: Dossier) {
        self.upsert_organization(dossier.organization.clone());
        self.dossiers.write().insert(dossier.id.clone(), dossier);
    }

    pub fn upsert_organization(&self, organization: Organization) {
        self.organizations
            .write()
            .insert(organization.id.clone(), organization);
    }

    /// Every alert in append order, resolved or not.
    pub fn alerts(&self) -> Vec<ComplianceAlert> {
        self.alerts.read().clone()
    }

    /// Every audit entry in append order.
    pub fn audit_entries(&self) -> Vec<AuditLogEntry> {
        self.audit.read().clone()
    }

    pub fn verify_audit_chain(&self) -> ChainIntegrity {
        verify_chain(self.audit.read().iter())
    }
}

#[async_trait]
impl DossierRepository for InMemoryComplianceStore {
    async fn dossier_with_relations(&self, id: &str) -> Result<Option<Dossier>, PersistenceError> {
        Ok(self.dossiers.read().get(id).cloned())
    }

    async fn organization(&self, tenant_id: &str) -> Result<Option<Organization>, PersistenceError> {
        Ok(self.organizations.read().get(tenant_id).cloned())
    }
}

#[async_trait]
impl AlertStore for InMemoryComplianceStore {
    async fn record_alert(&self, alert: ComplianceAlert) -> Result<(), PersistenceError> {
        self.alerts.write().push(alert);
        Ok(())
    }

    async fn resolve_alert(
        &self,
        id: Uuid,
        resolved_by: &str,
        resolution: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<ComplianceAlert>, PersistenceError> {
        let mut alerts = self.alerts.write();
        Ok(alerts.iter_mut().find(|a| a.id == id).map(|alert| {
            alert.resolve(resolved_by, resolution, at);
            alert.clone()
        }))
    }

    async fn unresolved_for(&self, dossier_id: &str) -> Result<Vec<ComplianceAlert>, PersistenceError> {
        let alerts = self.alerts.read();
        let mut open: Vec<ComplianceAlert> = alerts
            .iter()
            .rev()
            .filter(|a| a.dossier_id == dossier_id && !a.is_resolved)
            .cloned()
            .collect();
        // Stable: equal timestamps keep reverse append order.
        open.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(open)
    }
}

#[async_trait]
impl AuditStore for InMemoryComplianceStore {
    async fn record_audit(&self, entry: NewAuditEntry) -> Result<AuditLogEntry, PersistenceError> {
        let mut audit = self.audit.write();
        let previous = audit
            .last()
            .map_or(GENESIS_HASH, |last| last.entry_hash.as_str());
        let chained = entry.chain(previous);
        audit.push(chained.clone());
        Ok(chained)
    }

    async fn entries_for(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> Result<Vec<AuditLogEntry>, PersistenceError> {
        Ok(self
            .audit
            .read()
            .iter()
            .filter(|e| e.entity_type == entity_type && e.entity_id == entity_id)
            .cloned()
            .collect())
    }

    async fn verify_integrity(&self, limit: usize) -> Result<ChainIntegrity, PersistenceError> {
        Ok(verify_chain(self.audit.read().iter().take(limit)))
    }
}
