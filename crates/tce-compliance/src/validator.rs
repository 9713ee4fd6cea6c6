//! # State Transition Validator
//!
//! Decides whether a dossier may move to a target status.
//!
//! ## Evaluation Order
//!
//! 1. Load the dossier with its relations. A missing dossier is fatal.
//! 2. Run every regulatory check ([`crate::tenant`]) in fixed order.
//! 3. Build the evaluation snapshot ([`crate::snapshot`]).
//! 4. Run every declarative rule whose trigger is `TO_<target>`, in
//!    document order.
//! 5. Persist one alert per blocking violation, then one audit entry if an
//!    actor is known and anything was reported.
//!
//! Steps 2 to 4 are [`ComplianceEngine::assess`], which is pure. Step 5 is
//! [`ComplianceEngine::apply`]. The verdict is fixed before anything is
//! written, so a failed write can never turn a blocked transition into an
//! allowed one. Write failures are logged at error level and returned in
//! [`TransitionReport::persistence_failures`].
//!
//! A rule whose field path is malformed does not abort the call: it becomes
//! a warning naming the rule id and the remaining rules still run.
//!
//! ## Concurrency Boundary
//!
//! The engine advises on the snapshot it read. Two concurrent calls for the
//! same dossier may both see the old status and both be allowed. Applying
//! the transition with a compare-and-swap on the status is the persistence
//! layer's job, not the engine's.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde_json::json;
use tce_core::DossierStatus;
use tce_rules::{evaluate, explain, RuleDocument, RuleEvaluationError, Trigger};
use uuid::Uuid;

use crate::alert::{AlertContext, ComplianceAlert, Violation};
use crate::audit::{Actor, AuditAction, AuditLogEntry, ChainIntegrity, NewAuditEntry, DOSSIER_ENTITY};
use crate::error::{ComplianceError, NotFoundError, PersistenceError};
use crate::model::Dossier;
use crate::ports::{AlertStore, AuditStore, DossierRepository};
use crate::snapshot::build_snapshot;
use crate::tenant::{standard_checks, CheckInput, TenantCheck};

/// Engine behaviour switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidatorOptions {
    /// Also persist an alert (severity WARNING) for violated warning rules.
    pub record_warning_alerts: bool,
}

/// Verdict returned to callers.
///
/// `success` is derived from `errors` at construction and cannot disagree
/// with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    success: bool,
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            success: errors.is_empty(),
            errors,
            warnings,
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// No errors and no warnings.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

/// One outcome of the pure evaluation phase.
#[derive(Debug, Clone, PartialEq)]
pub enum Finding {
    /// A rule or check was violated.
    Violation(Violation),
    /// A rule could not be evaluated. Reported as a warning.
    EvaluationFailed {
        rule_id: String,
        error: RuleEvaluationError,
    },
}

impl Finding {
    fn is_blocking(&self) -> bool {
        match self {
            Self::Violation(v) => v.is_blocking(),
            Self::EvaluationFailed { .. } => false,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Violation(v) => v.message.clone(),
            Self::EvaluationFailed { rule_id, error } => {
                format!("Rule {rule_id} could not be evaluated: {error}")
            }
        }
    }
}

/// Result of [`ComplianceEngine::assess`]: findings in evaluation order,
/// regulatory checks first.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub target: DossierStatus,
    pub findings: Vec<Finding>,
}

impl Assessment {
    /// The verdict these findings produce.
    pub fn result(&self) -> ValidationResult {
        let (errors, warnings): (Vec<&Finding>, Vec<&Finding>) =
            self.findings.iter().partition(|f| f.is_blocking());
        ValidationResult::new(
            errors.into_iter().map(Finding::message).collect(),
            warnings.into_iter().map(Finding::message).collect(),
        )
    }

    pub fn violations(&self) -> impl Iterator<Item = &Violation> {
        self.findings.iter().filter_map(|f| match f {
            Finding::Violation(v) => Some(v),
            Finding::EvaluationFailed { .. } => None,
        })
    }
}

/// Kind of record a failed write was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PersistedRecord {
    Alert,
    Audit,
}

/// A side-effect write that failed after the verdict was computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistenceFailure {
    pub record: PersistedRecord,
    /// Rule the alert was for. `None` for audit entries.
    pub rule_id: Option<String>,
    pub message: String,
}

/// Verdict plus what was written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionReport {
    pub result: ValidationResult,
    /// Ids of the alerts persisted by this call, in evaluation order.
    pub alert_ids: Vec<Uuid>,
    pub audit_entry_id: Option<Uuid>,
    pub persistence_failures: Vec<PersistenceFailure>,
}

impl TransitionReport {
    pub fn is_fully_persisted(&self) -> bool {
        self.persistence_failures.is_empty()
    }
}

/// The compliance engine.
///
/// Holds the immutable rule document and the injected ports. Cheap to share
/// behind an `Arc`; every call keeps its state on its own stack.
pub struct ComplianceEngine {
    pub(crate) rules: Arc<RuleDocument>,
    tenant_checks: Vec<Box<dyn TenantCheck>>,
    pub(crate) dossiers: Arc<dyn DossierRepository>,
    alerts: Arc<dyn AlertStore>,
    audit: Arc<dyn AuditStore>,
    options: ValidatorOptions,
}

impl std::fmt::Debug for ComplianceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComplianceEngine")
            .field("rules", &self.rules.len())
            .field("tenant_checks", &self.tenant_checks.len())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ComplianceEngine {
    /// Engine with the standard regulatory checks and default options.
    pub fn new(
        rules: Arc<RuleDocument>,
        dossiers: Arc<dyn DossierRepository>,
        alerts: Arc<dyn AlertStore>,
        audit: Arc<dyn AuditStore>,
    ) -> Self {
        Self {
            rules,
            tenant_checks: standard_checks(),
            dossiers,
            alerts,
            audit,
            options: ValidatorOptions::default(),
        }
    }

    /// Engine whose three ports are backed by one store.
    pub fn with_store<S>(rules: Arc<RuleDocument>, store: Arc<S>) -> Self
    where
        S: DossierRepository + AlertStore + AuditStore + 'static,
    {
        Self::new(rules, store.clone(), store.clone(), store)
    }

    pub fn with_options(mut self, options: ValidatorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn rules(&self) -> &RuleDocument {
        &self.rules
    }

    pub fn options(&self) -> ValidatorOptions {
        self.options
    }

    /// Evaluate both rule layers. No I/O.
    pub fn assess(&self, dossier: &Dossier, target: DossierStatus, today: NaiveDate) -> Assessment {
        let mut findings = Vec::new();

        let input = CheckInput {
            dossier,
            target,
            today,
        };
        for check in &self.tenant_checks {
            match check.check(&input) {
                Ok(Some(violation)) => findings.push(Finding::Violation(violation)),
                Ok(None) => {}
                Err(error) => findings.push(evaluation_failed(check.rule_id(), &dossier.id, error)),
            }
        }

        let snapshot = build_snapshot(dossier);
        for rule in self.rules.rules_for(target) {
            match evaluate(&snapshot, &rule.logic) {
                Ok(true) => findings.push(Finding::Violation(Violation {
                    rule_id: rule.id.clone(),
                    severity: rule.severity,
                    context: AlertContext::StateChange,
                    message: rule.message.clone(),
                    details: json!({
                        "description": rule.description,
                        "conditions": explain(&snapshot, &rule.logic),
                    }),
                })),
                Ok(false) => {}
                Err(error) => findings.push(evaluation_failed(&rule.id, &dossier.id, error)),
            }
        }

        Assessment { target, findings }
    }

    /// Persist alerts and the audit entry for an assessment.
    ///
    /// Never fails: every write error is logged and collected in the report.
    pub async fn apply(
        &self,
        dossier: &Dossier,
        assessment: &Assessment,
        actor: Option<&Actor>,
    ) -> TransitionReport {
        let trigger = Trigger::to(assessment.target);
        let now = Utc::now();
        let mut report = TransitionReport {
            result: assessment.result(),
            alert_ids: Vec::new(),
            audit_entry_id: None,
            persistence_failures: Vec::new(),
        };

        for violation in assessment.violations() {
            if !violation.is_blocking() && !self.options.record_warning_alerts {
                continue;
            }
            let alert = ComplianceAlert::open(&dossier.id, trigger, violation, now);
            let alert_id = alert.id;
            match self.alerts.record_alert(alert).await {
                Ok(()) => report.alert_ids.push(alert_id),
                Err(error) => {
                    tracing::error!(
                        dossier_id = %dossier.id,
                        rule_id = %violation.rule_id,
                        error = %error,
                        "failed to persist compliance alert"
                    );
                    report
                        .persistence_failures
                        .push(failure(PersistedRecord::Alert, Some(&violation.rule_id), &error));
                }
            }
        }

        if let Some(actor) = actor.filter(|_| !report.result.is_clean()) {
            let entry = audit_entry(dossier, assessment, &report.result, actor, now);
            match self.audit.record_audit(entry).await {
                Ok(stored) => report.audit_entry_id = Some(stored.id),
                Err(error) => {
                    tracing::error!(
                        dossier_id = %dossier.id,
                        actor_id = %actor.id,
                        error = %error,
                        "failed to persist audit entry"
                    );
                    report
                        .persistence_failures
                        .push(failure(PersistedRecord::Audit, None, &error));
                }
            }
        }

        report
    }

    /// Validate a transition and report what was persisted.
    ///
    /// # Errors
    ///
    /// [`ComplianceError::NotFound`] if the dossier does not exist, and
    /// [`ComplianceError::Persistence`] if it cannot be read. Nothing is
    /// written in either case.
    pub async fn validate_transition_report(
        &self,
        dossier_id: &str,
        target: DossierStatus,
        actor: Option<&Actor>,
    ) -> Result<TransitionReport, ComplianceError> {
        let dossier = self
            .dossiers
            .dossier_with_relations(dossier_id)
            .await?
            .ok_or_else(|| NotFoundError::Dossier(dossier_id.to_string()))?;

        let assessment = self.assess(&dossier, target, Utc::now().date_naive());
        let report = self.apply(&dossier, &assessment, actor).await;

        tracing::info!(
            dossier_id,
            from = %dossier.status,
            to = %target,
            success = report.result.success(),
            errors = report.result.errors().len(),
            warnings = report.result.warnings().len(),
            alerts = report.alert_ids.len(),
            "transition validated"
        );
        Ok(report)
    }

    /// Validate a transition. See [`Self::validate_transition_report`].
    pub async fn validate_transition(
        &self,
        dossier_id: &str,
        target: DossierStatus,
        actor: Option<&Actor>,
    ) -> Result<ValidationResult, ComplianceError> {
        self.validate_transition_report(dossier_id, target, actor)
            .await
            .map(|report| report.result)
    }

    /// Mark an alert resolved. Resolving twice overwrites the metadata.
    pub async fn resolve_alert(
        &self,
        alert_id: Uuid,
        resolved_by: &str,
        resolution: &str,
    ) -> Result<ComplianceAlert, ComplianceError> {
        let alert = self
            .alerts
            .resolve_alert(alert_id, resolved_by, resolution, Utc::now())
            .await?
            .ok_or(NotFoundError::Alert(alert_id))?;
        tracing::info!(%alert_id, resolved_by, rule_id = %alert.rule_id, "alert resolved");
        Ok(alert)
    }

    /// Unresolved alerts for a dossier, newest first.
    pub async fn list_unresolved_alerts(
        &self,
        dossier_id: &str,
    ) -> Result<Vec<ComplianceAlert>, ComplianceError> {
        Ok(self.alerts.unresolved_for(dossier_id).await?)
    }

    /// Audit entries recorded for a dossier, oldest first.
    pub async fn audit_trail(&self, dossier_id: &str) -> Result<Vec<AuditLogEntry>, ComplianceError> {
        Ok(self.audit.entries_for(DOSSIER_ENTITY, dossier_id).await?)
    }

    /// Check the first `limit` entries of the audit chain.
    pub async fn verify_audit_chain(&self, limit: usize) -> Result<ChainIntegrity, ComplianceError> {
        let integrity = self.audit.verify_integrity(limit).await?;
        if !integrity.is_valid() {
            tracing::error!(
                total_entries = integrity.total_entries,
                broken_links = integrity.broken_links,
                "audit chain integrity check failed"
            );
        }
        Ok(integrity)
    }
}

fn evaluation_failed(rule_id: &str, dossier_id: &str, error: RuleEvaluationError) -> Finding {
    tracing::warn!(rule_id, dossier_id, error = %error, "rule could not be evaluated");
    Finding::EvaluationFailed {
        rule_id: rule_id.to_string(),
        error,
    }
}

fn failure(record: PersistedRecord, rule_id: Option<&str>, error: &PersistenceError) -> PersistenceFailure {
    PersistenceFailure {
        record,
        rule_id: rule_id.map(str::to_string),
        message: error.to_string(),
    }
}

fn audit_entry(
    dossier: &Dossier,
    assessment: &Assessment,
    result: &ValidationResult,
    actor: &Actor,
    now: chrono::DateTime<Utc>,
) -> NewAuditEntry {
    let action = if result.success() {
        AuditAction::TransitionAllowedWithWarnings
    } else {
        AuditAction::TransitionBlocked
    };
    let rule_ids: Vec<&str> = assessment
        .findings
        .iter()
        .map(|f| match f {
            Finding::Violation(v) => v.rule_id.as_str(),
            Finding::EvaluationFailed { rule_id, .. } => rule_id.as_str(),
        })
        .collect();
    NewAuditEntry {
        tenant_id: dossier.tenant_id.clone(),
        actor: actor.clone(),
        action,
        entity_type: DOSSIER_ENTITY.to_string(),
        entity_id: dossier.id.clone(),
        phase: assessment.target.phase(),
        is_forced: false,
        previous_state: dossier.status,
        new_state: assessment.target,
        details: json!({
            "blocked": !result.success(),
            "errors": result.errors(),
            "warnings": result.warnings(),
            "rule_ids": rule_ids,
        }),
        timestamp: now,
    }
}
