//! # Onboarding Checks
//!
//! Narrow checks run before a tenant or one of its sites is created. They
//! share [`ValidationResult`] with transition validation but persist
//! nothing: there is no dossier to attach an alert to yet.

use serde::{Deserialize, Serialize};
use tce_core::{NdaNumber, OrganizationKind, Siret, UaiCode};

use crate::error::{ComplianceError, NotFoundError};
use crate::validator::{ComplianceEngine, ValidationResult};

/// Rule id reported when a site lacks a valid UAI code.
pub const RULE_UAI_REQUIRED: &str = "RULE_UAI_REQUIRED";

/// Category of a training site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SiteKind {
    /// Ordinary premises.
    Standard,
    /// Site operated under a regional training programme.
    Regional,
    /// Apprenticeship training site.
    Apprenticeship,
}

/// A site about to be created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteDraft {
    pub name: String,
    pub kind: SiteKind,
    #[serde(default)]
    pub uai_code: Option<String>,
}

/// An organization about to be onboarded as a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationDraft {
    pub name: String,
    pub kind: OrganizationKind,
    #[serde(default)]
    pub siret: Option<String>,
    #[serde(default)]
    pub nda_number: Option<String>,
    /// Must be stated explicitly. `None` is an error.
    #[serde(default)]
    pub qualiopi_certified: Option<bool>,
}

impl ComplianceEngine {
    /// Check that a new site carries the registration its category needs.
    ///
    /// Regional and apprenticeship sites, and every site of an
    /// apprenticeship-center tenant, need a UAI code (`NNNNNNNL`).
    ///
    /// # Errors
    ///
    /// [`NotFoundError::Organization`] if the tenant does not exist.
    pub async fn validate_site_creation(
        &self,
        tenant_id: &str,
        site: &SiteDraft,
    ) -> Result<ValidationResult, ComplianceError> {
        let organization = self
            .dossiers
            .organization(tenant_id)
            .await?
            .ok_or_else(|| NotFoundError::Organization(tenant_id.to_string()))?;

        let needs_uai = matches!(site.kind, SiteKind::Regional | SiteKind::Apprenticeship)
            || organization.kind == OrganizationKind::ApprenticeshipCenter;

        let mut errors = Vec::new();
        if needs_uai {
            match site.uai_code.as_deref().map(str::trim) {
                None | Some("") => errors.push(format!(
                    "{RULE_UAI_REQUIRED}: site \"{}\" requires a UAI code.",
                    site.name
                )),
                Some(code) => {
                    if UaiCode::new(code).is_err() {
                        errors.push(format!(
                            "{RULE_UAI_REQUIRED}: UAI code \"{code}\" is invalid, expected 7 digits \
                             followed by an uppercase letter."
                        ));
                    }
                }
            }
        }

        let result = ValidationResult::new(errors, Vec::new());
        tracing::info!(
            tenant_id,
            site = %site.name,
            success = result.success(),
            "site creation validated"
        );
        Ok(result)
    }

    /// Check the regulatory identity of an organization before onboarding.
    pub fn validate_organization_creation(&self, draft: &OrganizationDraft) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if draft.name.trim().is_empty() {
            errors.push("Organization name is required.".to_string());
        }

        match draft.siret.as_deref() {
            None => errors.push("SIRET is required.".to_string()),
            Some(siret) => {
                if Siret::new(siret).is_err() {
                    errors.push(format!("SIRET \"{siret}\" is invalid, expected 14 digits."));
                }
            }
        }

        match draft.nda_number.as_deref() {
            None => errors.push("Activity declaration number (NDA) is required.".to_string()),
            Some(nda) => {
                if NdaNumber::new(nda).is_err() {
                    errors.push(format!(
                        "Activity declaration number (NDA) \"{nda}\" is invalid, expected 11 digits."
                    ));
                }
            }
        }

        match draft.qualiopi_certified {
            None => errors.push("Qualiopi certification status must be stated.".to_string()),
            Some(false) => warnings.push(
                "Without Qualiopi certification the organization cannot receive CPF, OPCO, \
                 France Travail or regional funding."
                    .to_string(),
            ),
            Some(true) => {}
        }

        let result = ValidationResult::new(errors, warnings);
        tracing::info!(
            organization = %draft.name,
            success = result.success(),
            "organization creation validated"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::organization;
    use crate::store::InMemoryComplianceStore;
    use std::sync::Arc;
    use tce_rules::RuleDocument;

    fn engine_with(kind: OrganizationKind) -> ComplianceEngine {
        let store = Arc::new(InMemoryComplianceStore::new());
        let mut org = organization();
        org.kind = kind;
        store.upsert_organization(org);
        let rules = Arc::new(RuleDocument::standard().unwrap());
        ComplianceEngine::with_store(rules, store)
    }

    fn site(kind: SiteKind, uai: Option<&str>) -> SiteDraft {
        SiteDraft {
            name: "Lyon Part-Dieu".into(),
            kind,
            uai_code: uai.map(str::to_string),
        }
    }

    fn draft() -> OrganizationDraft {
        OrganizationDraft {
            name: "Formations Horizon".into(),
            kind: OrganizationKind::TrainingProvider,
            siret: Some("552 100 554 00013".into()),
            nda_number: Some("11755432175".into()),
            qualiopi_certified: Some(true),
        }
    }

    // ---- Sites ----

    #[tokio::test]
    async fn standard_site_needs_no_uai() {
        let engine = engine_with(OrganizationKind::TrainingProvider);
        let result = engine
            .validate_site_creation("org-1", &site(SiteKind::Standard, None))
            .await
            .unwrap();
        assert!(result.success());
    }

    #[tokio::test]
    async fn regional_site_without_uai_fails() {
        let engine = engine_with(OrganizationKind::TrainingProvider);
        let result = engine
            .validate_site_creation("org-1", &site(SiteKind::Regional, Some(" ")))
            .await
            .unwrap();
        assert!(!result.success());
        assert!(result.errors()[0].starts_with(RULE_UAI_REQUIRED));
    }

    #[tokio::test]
    async fn cfa_tenant_sites_need_valid_uai() {
        let engine = engine_with(OrganizationKind::ApprenticeshipCenter);
        let bad = engine
            .validate_site_creation("org-1", &site(SiteKind::Standard, Some("0751234a")))
            .await
            .unwrap();
        assert!(!bad.success());
        let good = engine
            .validate_site_creation("org-1", &site(SiteKind::Standard, Some("0751234A")))
            .await
            .unwrap();
        assert!(good.success());
    }

    #[tokio::test]
    async fn unknown_tenant_is_not_found() {
        let engine = engine_with(OrganizationKind::TrainingProvider);
        let err = engine
            .validate_site_creation("org-404", &site(SiteKind::Standard, None))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ComplianceError::NotFound(NotFoundError::Organization("org-404".into()))
        );
    }

    // ---- Organizations ----

    #[test]
    fn complete_organization_passes() {
        let engine = engine_with(OrganizationKind::TrainingProvider);
        assert!(engine.validate_organization_creation(&draft()).is_clean());
    }

    #[test]
    fn qualiopi_must_be_stated() {
        let engine = engine_with(OrganizationKind::TrainingProvider);
        let mut d = draft();
        d.qualiopi_certified = None;
        assert!(!engine.validate_organization_creation(&d).success());
        d.qualiopi_certified = Some(false);
        let result = engine.validate_organization_creation(&d);
        assert!(result.success());
        assert_eq!(result.warnings().len(), 1);
    }

    #[test]
    fn every_identity_error_is_reported() {
        let engine = engine_with(OrganizationKind::TrainingProvider);
        let d = OrganizationDraft {
            name: " ".into(),
            kind: OrganizationKind::TrainingProvider,
            siret: Some("123".into()),
            nda_number: None,
            qualiopi_certified: Some(true),
        };
        let result = engine.validate_organization_creation(&d);
        assert_eq!(result.errors().len(), 3);
    }
}
