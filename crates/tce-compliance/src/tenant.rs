//! # Regulatory Rule Set
//!
//! Hard-coded invariants evaluated on every transition, before any
//! declarative rule. They encode legal prerequisites of French vocational
//! training, so they cannot be disabled by editing a rule document and are
//! always blocking.
//!
//! | rule id | applies when | requires |
//! |---|---|---|
//! | `RULE_NDA_REQUIRED` | target is INVOICED or CLOSED | an 11-digit NDA on the organization |
//! | `RULE_QUALIOPI_REQUIRED` | a contract is financed through CPF, OPCO, France Travail or a region; target is not CANCELLED | Qualiopi certification in force |
//! | `RULE_CFA_TUTOR_REQUIRED` | tenant is an apprenticeship center; target is CONTRACTED or IN_TRAINING | employer reference and supervisor name |
//!
//! Checks are independent. The orchestrator runs all of them in the order
//! of [`standard_checks`], so a blocked caller sees every reason.

use chrono::NaiveDate;
use serde_json::json;
use tce_core::{DossierStatus, NdaNumber, OrganizationKind};
use tce_rules::{RuleEvaluationError, Severity};

use crate::alert::{AlertContext, Violation};
use crate::model::{Dossier, Organization};

pub const RULE_NDA_REQUIRED: &str = "RULE_NDA_REQUIRED";
pub const RULE_QUALIOPI_REQUIRED: &str = "RULE_QUALIOPI_REQUIRED";
pub const RULE_CFA_TUTOR_REQUIRED: &str = "RULE_CFA_TUTOR_REQUIRED";

/// Everything a regulatory check may look at.
#[derive(Debug, Clone, Copy)]
pub struct CheckInput<'a> {
    pub dossier: &'a Dossier,
    pub target: DossierStatus,
    /// Date certifications are checked against.
    pub today: NaiveDate,
}

impl<'a> CheckInput<'a> {
    pub fn organization(&self) -> &'a Organization {
        &self.dossier.organization
    }
}

/// A regulatory invariant.
pub trait TenantCheck: Send + Sync {
    /// Permanent identifier, distinct from declarative rule ids.
    fn rule_id(&self) -> &'static str;

    /// `Some` when the invariant is violated.
    fn check(&self, input: &CheckInput<'_>) -> Result<Option<Violation>, RuleEvaluationError>;
}

/// The regulatory rule set, in evaluation order.
pub fn standard_checks() -> Vec<Box<dyn TenantCheck>> {
    vec![
        Box::new(NdaRequired),
        Box::new(QualiopiRequired),
        Box::new(ApprenticeshipTutorRequired),
    ]
}

fn blocking(rule_id: &str, message: String, details: serde_json::Value) -> Violation {
    Violation {
        rule_id: rule_id.to_string(),
        severity: Severity::Blocking,
        context: AlertContext::TenantCompliance,
        message,
        details,
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// No invoicing without a training-provider activity declaration.
#[derive(Debug, Clone, Copy, Default)]
pub struct NdaRequired;

impl TenantCheck for NdaRequired {
    fn rule_id(&self) -> &'static str {
        RULE_NDA_REQUIRED
    }

    fn check(&self, input: &CheckInput<'_>) -> Result<Option<Violation>, RuleEvaluationError> {
        if !input.target.is_invoicing() {
            return Ok(None);
        }
        let stored = input.organization().nda_number.as_deref();
        let message = match stored.map(NdaNumber::new) {
            Some(Ok(_)) => return Ok(None),
            Some(Err(_)) => format!(
                "The organization's activity declaration number (NDA) is not 11 digits: \
                 the dossier cannot move to {}.",
                input.target
            ),
            None => format!(
                "The organization has no activity declaration number (NDA): \
                 the dossier cannot move to {}.",
                input.target
            ),
        };
        Ok(Some(blocking(
            RULE_NDA_REQUIRED,
            message,
            json!({
                "organization_id": input.organization().id,
                "nda_number": stored,
                "target_status": input.target,
            }),
        )))
    }
}

/// Regulated public funding requires an active Qualiopi certification.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualiopiRequired;

impl TenantCheck for QualiopiRequired {
    fn rule_id(&self) -> &'static str {
        RULE_QUALIOPI_REQUIRED
    }

    fn check(&self, input: &CheckInput<'_>) -> Result<Option<Violation>, RuleEvaluationError> {
        if input.target == DossierStatus::Cancelled {
            return Ok(None);
        }
        let regulated: Vec<&str> = input
            .dossier
            .funding_channels()
            .into_iter()
            .filter(|c| c.is_regulated())
            .map(|c| c.as_str())
            .collect();
        if regulated.is_empty() || input.organization().qualiopi_active_on(input.today) {
            return Ok(None);
        }
        let org = input.organization();
        Ok(Some(blocking(
            RULE_QUALIOPI_REQUIRED,
            format!(
                "An active Qualiopi certification is required for dossiers funded through {}.",
                regulated.join(", ")
            ),
            json!({
                "organization_id": org.id,
                "funding_channels": regulated,
                "qualiopi_certified": org.qualiopi_certified,
                "qualiopi_valid_until": org.qualiopi_valid_until,
                "checked_on": input.today,
            }),
        )))
    }
}

/// Apprenticeship contracts need an employer and a named on-site supervisor.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApprenticeshipTutorRequired;

impl TenantCheck for ApprenticeshipTutorRequired {
    fn rule_id(&self) -> &'static str {
        RULE_CFA_TUTOR_REQUIRED
    }

    fn check(&self, input: &CheckInput<'_>) -> Result<Option<Violation>, RuleEvaluationError> {
        if input.organization().kind != OrganizationKind::ApprenticeshipCenter
            || !input.target.is_active()
        {
            return Ok(None);
        }
        let dossier = input.dossier;
        let missing: Vec<&str> = [
            ("employer_reference", dossier.employer_reference.as_deref()),
            ("supervisor_name", dossier.supervisor_name.as_deref()),
        ]
        .into_iter()
        .filter(|(_, value)| is_blank(*value))
        .map(|(field, _)| field)
        .collect();
        if missing.is_empty() {
            return Ok(None);
        }
        Ok(Some(blocking(
            RULE_CFA_TUTOR_REQUIRED,
            format!(
                "Apprenticeship dossier is missing required fields: {}.",
                missing.join(", ")
            ),
            json!({ "missing_fields": missing, "target_status": input.target }),
        )))
    }
}
