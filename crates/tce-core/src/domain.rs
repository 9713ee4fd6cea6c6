//! # Dossier Lifecycle: Single Source of Truth
//!
//! Defines [`DossierStatus`], the lifecycle of a training dossier, together
//! with the classifications the regulatory checks key on (active, invoicing,
//! closure) and the audit [`Phase`] derived from a target status.
//!
//! Wire names are `SCREAMING_SNAKE_CASE` (`IN_TRAINING`), which is also the
//! suffix of a declarative rule trigger (`TO_IN_TRAINING`).

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Prefix every declarative rule trigger carries.
pub const TRIGGER_PREFIX: &str = "TO_";

/// Lifecycle status of a training dossier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DossierStatus {
    /// Lead qualified, dossier opened but not yet submitted.
    Draft,
    /// Learner enrolled on a session.
    Enrolled,
    /// Training agreement or apprenticeship contract in force.
    Contracted,
    /// Training in progress.
    InTraining,
    /// Training finished, attendance consolidated.
    Completed,
    /// Invoice issued to the financer.
    Invoiced,
    /// Dossier archived after payment. Terminal.
    Closed,
    /// Dossier abandoned. Terminal.
    Cancelled,
}

impl DossierStatus {
    /// Return all statuses in lifecycle order.
    pub fn all() -> &'static [DossierStatus] {
        &[
            Self::Draft,
            Self::Enrolled,
            Self::Contracted,
            Self::InTraining,
            Self::Completed,
            Self::Invoiced,
            Self::Closed,
            Self::Cancelled,
        ]
    }

    /// Return the wire name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Enrolled => "ENROLLED",
            Self::Contracted => "CONTRACTED",
            Self::InTraining => "IN_TRAINING",
            Self::Completed => "COMPLETED",
            Self::Invoiced => "INVOICED",
            Self::Closed => "CLOSED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// The declarative trigger name for a transition into this status.
    pub fn trigger_name(&self) -> String {
        format!("{TRIGGER_PREFIX}{}", self.as_str())
    }

    /// Parse a `TO_<STATUS>` trigger string.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTrigger`] if the prefix is missing
    /// or the suffix is not a known status.
    pub fn from_trigger(trigger: &str) -> Result<Self, ValidationError> {
        trigger
            .strip_prefix(TRIGGER_PREFIX)
            .and_then(|suffix| suffix.parse().ok())
            .ok_or_else(|| ValidationError::InvalidTrigger(trigger.to_string()))
    }

    /// Statuses in which the learner is under contract.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Contracted | Self::InTraining)
    }

    /// Statuses that engage billing of a financer.
    pub fn is_invoicing(&self) -> bool {
        matches!(self, Self::Invoiced | Self::Closed)
    }

    /// Statuses that end the training itself.
    pub fn is_closure(&self) -> bool {
        matches!(self, Self::Completed | Self::Closed)
    }

    /// The audit phase a transition into this status belongs to.
    pub fn phase(&self) -> Phase {
        match self {
            Self::Draft | Self::Enrolled => Phase::Admission,
            Self::Contracted => Phase::Contracting,
            Self::InTraining => Phase::Training,
            Self::Completed => Phase::Completion,
            Self::Invoiced | Self::Closed => Phase::Billing,
            Self::Cancelled => Phase::Cancellation,
        }
    }
}

impl FromStr for DossierStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownStatus(s.to_string()))
    }
}

impl std::fmt::Display for DossierStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle phase recorded on audit entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Lead intake and enrolment.
    Admission,
    /// Contract signature.
    Contracting,
    /// Training delivery.
    Training,
    /// End of training.
    Completion,
    /// Invoicing and archival.
    Billing,
    /// Abandonment.
    Cancellation,
}

impl Phase {
    /// Return the wire name of this phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admission => "ADMISSION",
            Self::Contracting => "CONTRACTING",
            Self::Training => "TRAINING",
            Self::Completion => "COMPLETION",
            Self::Billing => "BILLING",
            Self::Cancellation => "CANCELLATION",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Channel through which a training contract is financed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FundingChannel {
    /// Compte Personnel de Formation (Caisse des Dépôts).
    Cpf,
    /// Opérateur de compétences (mutualised employer funds).
    Opco,
    /// France Travail (public employment service).
    FranceTravail,
    /// Regional council programmes.
    Region,
    /// Employer paying directly from its own budget.
    Employer,
    /// Learner paying personally.
    Personal,
}

impl FundingChannel {
    /// Return the wire name of this channel.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cpf => "CPF",
            Self::Opco => "OPCO",
            Self::FranceTravail => "FRANCE_TRAVAIL",
            Self::Region => "REGION",
            Self::Employer => "EMPLOYER",
            Self::Personal => "PERSONAL",
        }
    }

    /// Public or mutualised funds, which require a Qualiopi-certified provider.
    pub fn is_regulated(&self) -> bool {
        match self {
            Self::Cpf | Self::Opco | Self::FranceTravail | Self::Region => true,
            Self::Employer | Self::Personal => false,
        }
    }
}

impl std::fmt::Display for FundingChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Regulatory category of a tenant organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrganizationKind {
    /// Organisme de formation.
    TrainingProvider,
    /// Centre de formation d'apprentis (CFA).
    ApprenticeshipCenter,
}

impl OrganizationKind {
    /// Return the wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TrainingProvider => "TRAINING_PROVIDER",
            Self::ApprenticeshipCenter => "APPRENTICESHIP_CENTER",
        }
    }
}

impl std::fmt::Display for OrganizationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_names_round_trip_through_from_str() {
        for status in DossierStatus::all() {
            let parsed: DossierStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, *status);
        }
    }

    #[test]
    fn serde_uses_screaming_snake_case() {
        let json = serde_json::to_string(&DossierStatus::InTraining).unwrap();
        assert_eq!(json, "\"IN_TRAINING\"");
        let back: DossierStatus = serde_json::from_str("\"CLOSED\"").unwrap();
        assert_eq!(back, DossierStatus::Closed);
    }

    #[test]
    fn trigger_parsing() {
        assert_eq!(
            DossierStatus::from_trigger("TO_IN_TRAINING").unwrap(),
            DossierStatus::InTraining
        );
        assert_eq!(DossierStatus::Invoiced.trigger_name(), "TO_INVOICED");
        assert!(matches!(
            DossierStatus::from_trigger("IN_TRAINING"),
            Err(ValidationError::InvalidTrigger(_))
        ));
        assert!(matches!(
            DossierStatus::from_trigger("TO_FINISHED"),
            Err(ValidationError::InvalidTrigger(_))
        ));
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = "archived".parse::<DossierStatus>().unwrap_err();
        assert_eq!(err, ValidationError::UnknownStatus("archived".into()));
    }

    #[test]
    fn status_classes() {
        assert!(DossierStatus::Contracted.is_active());
        assert!(DossierStatus::InTraining.is_active());
        assert!(!DossierStatus::Completed.is_active());

        assert!(DossierStatus::Invoiced.is_invoicing());
        assert!(DossierStatus::Closed.is_invoicing());
        assert!(!DossierStatus::Completed.is_invoicing());

        assert!(DossierStatus::Completed.is_closure());
        assert!(DossierStatus::Closed.is_closure());
    }

    #[test]
    fn phase_derivation() {
        assert_eq!(DossierStatus::Enrolled.phase(), Phase::Admission);
        assert_eq!(DossierStatus::Closed.phase(), Phase::Billing);
        assert_eq!(DossierStatus::Cancelled.phase(), Phase::Cancellation);
    }

    #[test]
    fn regulated_channels() {
        assert!(FundingChannel::Cpf.is_regulated());
        assert!(FundingChannel::Opco.is_regulated());
        assert!(FundingChannel::FranceTravail.is_regulated());
        assert!(FundingChannel::Region.is_regulated());
        assert!(!FundingChannel::Employer.is_regulated());
        assert!(!FundingChannel::Personal.is_regulated());
    }
}
