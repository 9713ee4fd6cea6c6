//! End-to-end transition scenarios against the bundled rule set and the
//! in-memory store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tce_compliance::{
    Actor, AlertContext, AlertStore, AttendanceRecord, ComplianceAlert, ComplianceEngine,
    ComplianceError, Contract, ContractStatus, Dossier, Financer, InMemoryComplianceStore, Learner,
    NotFoundError, Organization, PersistedRecord, PersistenceError, RULE_CFA_TUTOR_REQUIRED,
    RULE_NDA_REQUIRED,
};
use tce_core::{DossierStatus, FundingChannel, OrganizationKind};
use tce_rules::{RuleDocument, Severity};
use uuid::Uuid;

// ---- Fixtures ----

fn organization(kind: OrganizationKind) -> Organization {
    Organization {
        id: "org-lyon".into(),
        name: "Institut Rhône Formation".into(),
        nda_number: Some("84691234569".into()),
        qualiopi_certified: true,
        qualiopi_valid_until: None,
        kind,
        siret: Some("55210055400013".into()),
    }
}

fn attendance(hours_attended_per_day: f64) -> Vec<AttendanceRecord> {
    (2..=6)
        .map(|day| AttendanceRecord {
            date: NaiveDate::from_ymd_opt(2026, 3, day).unwrap(),
            hours_scheduled: 7.0,
            hours_attended: hours_attended_per_day,
            absence_justified: false,
        })
        .collect()
}

/// A completed, fully compliant dossier funded through OPCO.
fn completed_dossier() -> Dossier {
    Dossier {
        id: "dos-100".into(),
        tenant_id: "org-lyon".into(),
        status: DossierStatus::Completed,
        learner: Learner {
            first_name: "Inès".into(),
            last_name: "Moreau".into(),
            email: Some("ines.moreau@example.org".into()),
        },
        organization: organization(OrganizationKind::TrainingProvider),
        contracts: vec![Contract {
            id: "ctr-100".into(),
            status: ContractStatus::Signed,
            signed_at: Some(Utc::now()),
            amount_cents: 245_000,
            financer: Some(Financer {
                id: "opco-ep".into(),
                name: "OPCO EP".into(),
                channel: FundingChannel::Opco,
            }),
        }],
        session: None,
        proofs: Vec::new(),
        attendance: attendance(7.0),
        certificate_generated: true,
        employer_reference: None,
        supervisor_name: None,
    }
}

fn engine_for(dossier: Dossier) -> (ComplianceEngine, Arc<InMemoryComplianceStore>) {
    let store = Arc::new(InMemoryComplianceStore::new());
    store.upsert_dossier(dossier);
    let rules = Arc::new(RuleDocument::standard().unwrap());
    (ComplianceEngine::with_store(rules, store.clone()), store)
}

const LOW_ATTENDANCE_MESSAGE: &str =
    "Attendance rate is below the 80% required to close the dossier.";

// ---- Scenario A: happy path ----

#[tokio::test]
async fn scenario_a_compliant_dossier_closes() {
    let (engine, store) = engine_for(completed_dossier());
    let result = engine
        .validate_transition("dos-100", DossierStatus::Closed, Some(&Actor::new("user-1")))
        .await
        .unwrap();
    assert!(result.success());
    assert!(result.errors().is_empty());
    assert!(store.alerts().is_empty());
    // Nothing to report, so nothing to audit.
    assert!(store.audit_entries().is_empty());
}

// ---- Scenario B: low attendance ----

#[tokio::test]
async fn scenario_b_low_attendance_blocks_closure() {
    let mut dossier = completed_dossier();
    dossier.attendance = attendance(4.0);
    let (engine, store) = engine_for(dossier);

    let result = engine
        .validate_transition("dos-100", DossierStatus::Closed, None)
        .await
        .unwrap();
    assert!(!result.success());
    assert_eq!(result.errors(), [LOW_ATTENDANCE_MESSAGE]);

    let alerts = store.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].rule_id, "CLOSURE_ATTENDANCE_MINIMUM");
    assert_eq!(alerts[0].severity, Severity::Blocking);
    assert_eq!(alerts[0].context, AlertContext::StateChange);
    assert_eq!(alerts[0].trigger, "TO_CLOSED");
}

fn hours(scheduled: f64, attended: f64) -> Vec<AttendanceRecord> {
    vec![AttendanceRecord {
        date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        hours_scheduled: scheduled,
        hours_attended: attended,
        absence_justified: false,
    }]
}

#[tokio::test]
async fn attendance_exactly_at_threshold_closes() {
    let mut dossier = completed_dossier();
    dossier.attendance = hours(10_000.0, 8_000.0);
    let (engine, _store) = engine_for(dossier);
    let result = engine
        .validate_transition("dos-100", DossierStatus::Closed, None)
        .await
        .unwrap();
    assert!(result.success());
}

#[tokio::test]
async fn attendance_just_below_threshold_blocks_closure() {
    let mut dossier = completed_dossier();
    dossier.attendance = hours(10_000.0, 7_999.6);
    let (engine, store) = engine_for(dossier);
    let result = engine
        .validate_transition("dos-100", DossierStatus::Closed, None)
        .await
        .unwrap();
    assert!(!result.success());
    assert_eq!(result.errors(), [LOW_ATTENDANCE_MESSAGE]);
    assert_eq!(store.alerts()[0].rule_id, "CLOSURE_ATTENDANCE_MINIMUM");
}

// ---- Scenario C: missing registration number ----

#[tokio::test]
async fn scenario_c_missing_nda_blocks_invoicing() {
    let mut dossier = completed_dossier();
    dossier.organization.nda_number = None;
    let (engine, store) = engine_for(dossier);

    let result = engine
        .validate_transition("dos-100", DossierStatus::Invoiced, None)
        .await
        .unwrap();
    assert!(!result.success());
    assert_eq!(result.errors().len(), 1);
    assert!(result.errors()[0].contains("NDA"));

    let alerts = store.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].rule_id, RULE_NDA_REQUIRED);
    assert_eq!(alerts[0].context, AlertContext::TenantCompliance);
}

// ---- Scenario D: apprenticeship missing supervisor ----

#[tokio::test]
async fn scenario_d_apprenticeship_without_supervisor_is_blocked() {
    let mut dossier = completed_dossier();
    dossier.status = DossierStatus::Enrolled;
    dossier.organization = organization(OrganizationKind::ApprenticeshipCenter);
    dossier.employer_reference = Some("EMP-2026-17".into());
    dossier.supervisor_name = None;
    let (engine, store) = engine_for(dossier);

    let result = engine
        .validate_transition("dos-100", DossierStatus::Contracted, None)
        .await
        .unwrap();
    assert!(!result.success());
    assert!(result.errors()[0].contains("supervisor_name"));
    assert!(!result.errors()[0].contains("employer_reference"));
    assert_eq!(store.alerts()[0].rule_id, RULE_CFA_TUTOR_REQUIRED);
}

// ---- Properties ----

#[tokio::test]
async fn every_blocking_reason_is_reported_in_order() {
    let mut dossier = completed_dossier();
    dossier.organization.nda_number = None;
    dossier.organization.qualiopi_certified = false;
    dossier.attendance = attendance(4.0);
    dossier.certificate_generated = false;
    let (engine, store) = engine_for(dossier);

    let result = engine
        .validate_transition("dos-100", DossierStatus::Closed, None)
        .await
        .unwrap();
    let rule_ids: Vec<String> = store.alerts().into_iter().map(|a| a.rule_id).collect();
    assert_eq!(
        rule_ids,
        [
            "RULE_NDA_REQUIRED",
            "RULE_QUALIOPI_REQUIRED",
            "CLOSURE_ATTENDANCE_MINIMUM",
            "CLOSURE_CERTIFICATE",
        ]
    );
    assert_eq!(result.errors().len(), 4);
}

#[tokio::test]
async fn warning_only_violation_allows_transition() {
    let mut dossier = completed_dossier();
    dossier.status = DossierStatus::Invoiced;
    let (engine, store) = engine_for(dossier);

    let result = engine
        .validate_transition("dos-100", DossierStatus::Cancelled, None)
        .await
        .unwrap();
    assert!(result.success());
    assert!(result.errors().is_empty());
    assert_eq!(result.warnings().len(), 1);
    assert!(store.alerts().is_empty());
}

#[tokio::test]
async fn validation_is_idempotent() {
    let mut dossier = completed_dossier();
    dossier.attendance = attendance(5.0);
    dossier.organization.nda_number = None;
    let (engine, _) = engine_for(dossier);

    let first = engine
        .validate_transition("dos-100", DossierStatus::Closed, None)
        .await
        .unwrap();
    let second = engine
        .validate_transition("dos-100", DossierStatus::Closed, None)
        .await
        .unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn blocked_transition_with_actor_is_audited() {
    let mut dossier = completed_dossier();
    dossier.attendance = attendance(4.0);
    let (engine, store) = engine_for(dossier);
    let actor = Actor::new("user-9").with_role("COORDINATOR");

    let report = engine
        .validate_transition_report("dos-100", DossierStatus::Closed, Some(&actor))
        .await
        .unwrap();
    assert!(report.is_fully_persisted());
    assert_eq!(report.alert_ids.len(), 1);

    let entries = store.audit_entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(Some(entries[0].id), report.audit_entry_id);
    assert_eq!(entries[0].new_state, DossierStatus::Closed);
    assert_eq!(entries[0].details["blocked"], serde_json::json!(true));
    assert!(store.verify_audit_chain().is_valid());

    let trail = engine.audit_trail("dos-100").await.unwrap();
    assert_eq!(trail, entries);
    assert!(engine.audit_trail("dos-404").await.unwrap().is_empty());
    let integrity = engine.verify_audit_chain(100).await.unwrap();
    assert_eq!(integrity.total_entries, 1);
    assert!(integrity.is_valid());
}

// ---- Alerts ----

#[tokio::test]
async fn resolve_alert_lifecycle() {
    let mut dossier = completed_dossier();
    dossier.attendance = attendance(4.0);
    let (engine, _) = engine_for(dossier);
    engine
        .validate_transition("dos-100", DossierStatus::Closed, None)
        .await
        .unwrap();

    let open = engine.list_unresolved_alerts("dos-100").await.unwrap();
    assert_eq!(open.len(), 1);
    let id = open[0].id;

    let resolved = engine
        .resolve_alert(id, "compliance-officer", "Attendance sheets re-imported")
        .await
        .unwrap();
    assert!(resolved.is_resolved);
    assert!(engine.list_unresolved_alerts("dos-100").await.unwrap().is_empty());

    let again = engine
        .resolve_alert(id, "auditor", "Checked against signed sheets")
        .await
        .unwrap();
    assert_eq!(again.resolved_by.as_deref(), Some("auditor"));
}

#[tokio::test]
async fn resolving_unknown_alert_is_not_found() {
    let (engine, _) = engine_for(completed_dossier());
    let id = Uuid::new_v4();
    let err = engine.resolve_alert(id, "x", "y").await.unwrap_err();
    assert_eq!(err, ComplianceError::NotFound(NotFoundError::Alert(id)));
}

// ---- Persistence failures ----

struct FailingAlerts;

#[async_trait]
impl AlertStore for FailingAlerts {
    async fn record_alert(&self, _alert: ComplianceAlert) -> Result<(), PersistenceError> {
        Err(PersistenceError::Backend("disk full".into()))
    }

    async fn resolve_alert(
        &self,
        _id: Uuid,
        _resolved_by: &str,
        _resolution: &str,
        _at: DateTime<Utc>,
    ) -> Result<Option<ComplianceAlert>, PersistenceError> {
        Err(PersistenceError::Backend("disk full".into()))
    }

    async fn unresolved_for(&self, _dossier_id: &str) -> Result<Vec<ComplianceAlert>, PersistenceError> {
        Err(PersistenceError::Backend("disk full".into()))
    }
}

#[tokio::test]
async fn failed_alert_write_keeps_blocked_verdict() {
    let mut dossier = completed_dossier();
    dossier.attendance = attendance(4.0);
    let store = Arc::new(InMemoryComplianceStore::new());
    store.upsert_dossier(dossier);
    let engine = ComplianceEngine::new(
        Arc::new(RuleDocument::standard().unwrap()),
        store.clone(),
        Arc::new(FailingAlerts),
        store.clone(),
    );

    let report = engine
        .validate_transition_report("dos-100", DossierStatus::Closed, Some(&Actor::new("u")))
        .await
        .unwrap();
    assert!(!report.result.success());
    assert!(report.alert_ids.is_empty());
    assert_eq!(report.persistence_failures.len(), 1);
    assert_eq!(report.persistence_failures[0].record, PersistedRecord::Alert);
    assert_eq!(
        report.persistence_failures[0].rule_id.as_deref(),
        Some("CLOSURE_ATTENDANCE_MINIMUM")
    );
    // The audit entry is still written.
    assert!(report.audit_entry_id.is_some());
}
