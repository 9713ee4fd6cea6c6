//! # API Route Modules
//!
//! - `transitions`: validate a requested dossier status change.
//! - `alerts`: list open compliance alerts, resolve an alert.
//! - `audit`: audit trail of a dossier and chain integrity check.
//! - `onboarding`: pre-creation checks for tenants and their sites.
//! - `rules`: read-only view of the loaded rule document.

pub mod alerts;
pub mod audit;
pub mod onboarding;
pub mod rules;
pub mod transitions;

use serde::Serialize;
use tce_compliance::ValidationResult;
use utoipa::ToSchema;

/// Verdict of a validation call.
#[derive(Debug, Serialize, ToSchema)]
pub struct ValidationResponse {
    /// `true` when no blocking error was found.
    pub success: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl From<&ValidationResult> for ValidationResponse {
    fn from(result: &ValidationResult) -> Self {
        Self {
            success: result.success(),
            errors: result.errors().to_vec(),
            warnings: result.warnings().to_vec(),
        }
    }
}
