//! # Compliance Alerts
//!
//! A [`Violation`] is what a rule layer produces: pure data, no identity.
//! A [`ComplianceAlert`] is the persisted record of one violation against
//! one dossier. Alerts are append-only. The only mutation is resolution,
//! which may be repeated and overwrites the resolution metadata.
//!
//! ```text
//! OPEN ──resolve()──> RESOLVED ──resolve()──> RESOLVED
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tce_rules::{Severity, Trigger};
use uuid::Uuid;

/// Which rule layer raised an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertContext {
    /// Hard-coded regulatory check.
    TenantCompliance,
    /// Declarative rule bound to a status change.
    StateChange,
}

impl AlertContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TenantCompliance => "TENANT_COMPLIANCE",
            Self::StateChange => "STATE_CHANGE",
        }
    }
}

impl std::str::FromStr for AlertContext {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TENANT_COMPLIANCE" => Ok(Self::TenantCompliance),
            "STATE_CHANGE" => Ok(Self::StateChange),
            other => Err(format!("unknown alert context: {other}")),
        }
    }
}

/// One violated rule, before persistence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub rule_id: String,
    pub severity: Severity,
    pub context: AlertContext,
    pub message: String,
    /// Structured payload stored on the alert.
    pub details: serde_json::Value,
}

impl Violation {
    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Blocking
    }
}

/// Persisted record of a violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceAlert {
    pub id: Uuid,
    pub dossier_id: String,
    pub rule_id: String,
    pub severity: Severity,
    pub context: AlertContext,
    /// `TO_<STATUS>` of the transition that raised the alert.
    pub trigger: String,
    pub message: String,
    pub details: serde_json::Value,
    pub is_resolved: bool,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ComplianceAlert {
    /// A new, unresolved alert for `violation`.
    pub fn open(
        dossier_id: &str,
        trigger: Trigger,
        violation: &Violation,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            dossier_id: dossier_id.to_string(),
            rule_id: violation.rule_id.clone(),
            severity: violation.severity,
            context: violation.context,
            trigger: trigger.to_string(),
            message: violation.message.clone(),
            details: violation.details.clone(),
            is_resolved: false,
            resolved_by: None,
            resolved_at: None,
            resolution: None,
            created_at,
        }
    }

    /// Mark resolved, overwriting any previous resolution.
    pub fn resolve(&mut self, resolved_by: &str, resolution: &str, at: DateTime<Utc>) {
        self.is_resolved = true;
        self.resolved_by = Some(resolved_by.to_string());
        self.resolution = Some(resolution.to_string());
        self.resolved_at = Some(at);
    }
}
