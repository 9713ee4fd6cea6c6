//! # Dossier Read Model
//!
//! The shape the engine expects from the persistence layer: a dossier with
//! every relation both rule layers read, loaded in one call.
//!
//! These types are owned by the persistence layer. The engine only reads
//! them, and derives the aggregate figures (hours, attendance rate, signed
//! contract) through the methods below so the tenant checks and the snapshot
//! builder agree on one definition.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tce_core::{DossierStatus, FundingChannel, OrganizationKind};

/// Tenant organization owning a dossier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    /// Activity declaration number, as stored. Validity is checked by the
    /// regulatory rule set, not at read time.
    #[serde(default)]
    pub nda_number: Option<String>,
    #[serde(default)]
    pub qualiopi_certified: bool,
    /// Expiry of the Qualiopi certificate. `None` means no known expiry.
    #[serde(default)]
    pub qualiopi_valid_until: Option<NaiveDate>,
    pub kind: OrganizationKind,
    #[serde(default)]
    pub siret: Option<String>,
}

impl Organization {
    /// Whether the Qualiopi certification is in force on `today`.
    pub fn qualiopi_active_on(&self, today: NaiveDate) -> bool {
        self.qualiopi_certified && self.qualiopi_valid_until.map_or(true, |until| until >= today)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Learner {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Contract signature state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractStatus {
    Draft,
    Sent,
    Signed,
    Terminated,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Sent => "SENT",
            Self::Signed => "SIGNED",
            Self::Terminated => "TERMINATED",
        }
    }
}

/// Party paying for the training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Financer {
    pub id: String,
    pub name: String,
    pub channel: FundingChannel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: String,
    pub status: ContractStatus,
    #[serde(default)]
    pub signed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub amount_cents: i64,
    #[serde(default)]
    pub financer: Option<Financer>,
}

/// Certification a programme leads to (RNCP or RS registration).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    pub code: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Programme {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub duration_hours: f64,
    #[serde(default)]
    pub certification: Option<Certification>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub programme: Programme,
}

/// Category of an uploaded supporting document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProofKind {
    AttendanceSheet,
    AbsenceJustification,
    CompletionCertificate,
    Invoice,
    Other,
}

impl ProofKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AttendanceSheet => "ATTENDANCE_SHEET",
            Self::AbsenceJustification => "ABSENCE_JUSTIFICATION",
            Self::CompletionCertificate => "COMPLETION_CERTIFICATE",
            Self::Invoice => "INVOICE",
            Self::Other => "OTHER",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proof {
    pub id: String,
    pub kind: ProofKind,
    pub uploaded_at: DateTime<Utc>,
}

/// One day of attendance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub date: NaiveDate,
    pub hours_scheduled: f64,
    pub hours_attended: f64,
    #[serde(default)]
    pub absence_justified: bool,
}

/// A training dossier with all relations the rule layers read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dossier {
    pub id: String,
    pub tenant_id: String,
    pub status: DossierStatus,
    pub learner: Learner,
    pub organization: Organization,
    #[serde(default)]
    pub contracts: Vec<Contract>,
    #[serde(default)]
    pub session: Option<Session>,
    #[serde(default)]
    pub proofs: Vec<Proof>,
    #[serde(default)]
    pub attendance: Vec<AttendanceRecord>,
    #[serde(default)]
    pub certificate_generated: bool,
    #[serde(default)]
    pub employer_reference: Option<String>,
    #[serde(default)]
    pub supervisor_name: Option<String>,
}

impl Dossier {
    /// Total scheduled hours across attendance records.
    pub fn hours_scheduled(&self) -> f64 {
        self.attendance.iter().map(|a| a.hours_scheduled).sum()
    }

    /// Total attended hours across attendance records.
    pub fn hours_attended(&self) -> f64 {
        self.attendance.iter().map(|a| a.hours_attended).sum()
    }

    /// Attended hours as a percentage of scheduled hours, 0 to 100.
    ///
    /// Zero when nothing is scheduled. Not rounded: rule thresholds compare
    /// against the exact ratio, so 79.996 stays below 80.
    pub fn attendance_rate(&self) -> f64 {
        let scheduled = self.hours_scheduled();
        if scheduled <= 0.0 {
            return 0.0;
        }
        (self.hours_attended() / scheduled * 100.0).clamp(0.0, 100.0)
    }

    /// Whether any contract is signed.
    pub fn has_signed_contract(&self) -> bool {
        self.contracts
            .iter()
            .any(|c| c.status == ContractStatus::Signed)
    }

    /// Financer of the first financed contract.
    pub fn financer(&self) -> Option<&Financer> {
        self.contracts.iter().find_map(|c| c.financer.as_ref())
    }

    /// Every funding channel across the dossier's contracts, deduplicated,
    /// in contract order.
    pub fn funding_channels(&self) -> Vec<FundingChannel> {
        let mut channels = Vec::new();
        for channel in self
            .contracts
            .iter()
            .filter_map(|c| c.financer.as_ref().map(|f| f.channel))
        {
            if !channels.contains(&channel) {
                channels.push(channel);
            }
        }
        channels
    }

    /// Whether an absence justification has been uploaded.
    pub fn has_justified_absence_proof(&self) -> bool {
        self.proofs
            .iter()
            .any(|p| p.kind == ProofKind::AbsenceJustification)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn attendance_rate_is_zero_when_nothing_scheduled() {
        let mut d = dossier();
        d.attendance.clear();
        assert_eq!(d.attendance_rate(), 0.0);
    }

    #[test]
    fn attendance_rate_is_not_rounded() {
        let mut d = dossier();
        d.attendance = vec![day(2, 3.0, 2.0)];
        assert!((d.attendance_rate() - 200.0 / 3.0).abs() < 1e-9);
        d.attendance = vec![day(2, 10_000.0, 7_999.6)];
        assert!(d.attendance_rate() < 80.0);
    }

    #[test]
    fn attendance_rate_is_capped() {
        let mut d = dossier();
        d.attendance = vec![day(2, 7.0, 8.0)];
        assert_eq!(d.attendance_rate(), 100.0);
    }

    #[test]
    fn financer_skips_unfinanced_contracts() {
        let mut d = dossier();
        d.contracts.insert(
            0,
            Contract {
                id: "ctr-0".into(),
                status: ContractStatus::Draft,
                signed_at: None,
                amount_cents: 0,
                financer: None,
            },
        );
        assert_eq!(d.financer().map(|f| f.channel), Some(FundingChannel::Cpf));
    }

    #[test]
    fn qualiopi_expiry_is_inclusive() {
        let mut org = organization();
        let today = NaiveDate::from_ymd_opt(2026, 6, 30).unwrap();
        org.qualiopi_valid_until = Some(today);
        assert!(org.qualiopi_active_on(today));
        assert!(!org.qualiopi_active_on(today.succ_opt().unwrap()));
        org.qualiopi_certified = false;
        org.qualiopi_valid_until = None;
        assert!(!org.qualiopi_active_on(today));
    }

    #[test]
    fn read_model_deserializes_with_defaults() {
        let d: Dossier = serde_json::from_value(serde_json::json!({
            "id": "d",
            "tenant_id": "t",
            "status": "DRAFT",
            "learner": {"first_name": "A", "last_name": "B"},
            "organization": {"id": "t", "name": "Org", "kind": "APPRENTICESHIP_CENTER"}
        }))
        .unwrap();
        assert!(d.contracts.is_empty());
        assert!(!d.organization.qualiopi_certified);
        assert!(!d.has_signed_contract());
    }
}
