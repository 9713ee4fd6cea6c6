//! # Dry-Run Subcommand
//!
//! Runs the full transition pipeline (regulatory checks, declarative
//! rules, alert and audit writes) for a dossier fixture against a private
//! in-memory store, then prints what the engine decided and what it would
//! have persisted. Nothing outside the process is touched.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tce_compliance::{
    Actor, AuditLogEntry, ComplianceAlert, ComplianceEngine, Dossier, InMemoryComplianceStore,
    TransitionReport,
};
use tce_core::DossierStatus;

/// Arguments for the `tce dry-run` subcommand.
#[derive(Args, Debug)]
pub struct DryRunArgs {
    /// Dossier read model as JSON.
    #[arg(long, value_name = "FILE")]
    pub dossier: PathBuf,

    /// Target status, e.g. CLOSED.
    #[arg(long, value_name = "STATUS")]
    pub target: String,

    /// Rule document. Defaults to the bundled standard rules.
    #[arg(long, value_name = "FILE")]
    pub rules: Option<PathBuf>,

    /// Actor id. With an actor, an audit entry is written when anything is reported.
    #[arg(long, value_name = "ID")]
    pub actor: Option<String>,

    /// Actor role, recorded on the audit entry.
    #[arg(long, requires = "actor")]
    pub role: Option<String>,

    /// Print the full report as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Everything a dry run produced.
#[derive(Debug, Serialize)]
pub struct DryRunOutcome {
    pub dossier_id: String,
    pub from: DossierStatus,
    pub target: DossierStatus,
    pub report: TransitionReport,
    pub alerts: Vec<ComplianceAlert>,
    pub audit: Vec<AuditLogEntry>,
}

/// Execute the dry-run subcommand.
///
/// Returns exit code: 0 if the transition is allowed, 1 if it is blocked.
pub fn run_dry_run(args: &DryRunArgs) -> Result<u8> {
    let target: DossierStatus = args
        .target
        .trim()
        .parse()
        .context("invalid --target")?;
    let dossier = read_dossier(&args.dossier)?;
    let actor = args.actor.as_deref().map(|id| match args.role.as_deref() {
        Some(role) => Actor::new(id).with_role(role),
        None => Actor::new(id),
    });

    let outcome = dry_run(dossier, target, args.rules.as_deref(), actor.as_ref())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }

    Ok(if outcome.report.result.success() { 0 } else { 1 })
}

/// Validate `target` for `dossier` on a fresh in-memory store.
pub fn dry_run(
    dossier: Dossier,
    target: DossierStatus,
    rules: Option<&Path>,
    actor: Option<&Actor>,
) -> Result<DryRunOutcome> {
    let rules = Arc::new(crate::load_rule_document(rules)?);
    let store = Arc::new(InMemoryComplianceStore::new());
    let dossier_id = dossier.id.clone();
    let from = dossier.status;
    store.upsert_dossier(dossier);
    let engine = ComplianceEngine::with_store(rules, store.clone());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .context("failed to start async runtime")?;
    let report = runtime.block_on(engine.validate_transition_report(&dossier_id, target, actor))?;

    tracing::debug!(dossier_id = %dossier_id, alerts = report.alert_ids.len(), "dry run finished");

    Ok(DryRunOutcome {
        dossier_id,
        from,
        target,
        report,
        alerts: store.alerts(),
        audit: store.audit_entries(),
    })
}

fn read_dossier(path: &Path) -> Result<Dossier> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read dossier {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("{} is not a valid dossier read model", path.display()))
}

fn print_outcome(outcome: &DryRunOutcome) {
    let result = &outcome.report.result;
    let verdict = if result.success() { "ALLOWED" } else { "BLOCKED" };
    println!(
        "{verdict}: {} {} -> {}",
        outcome.dossier_id, outcome.from, outcome.target
    );
    for error in result.errors() {
        println!("  ERROR: {error}");
    }
    for warning in result.warnings() {
        println!("  WARN:  {warning}");
    }
    for alert in &outcome.alerts {
        println!(
            "  alert {} [{} {}] {}",
            alert.id,
            alert.context.as_str(),
            alert.severity,
            alert.rule_id
        );
    }
    for entry in &outcome.audit {
        println!(
            "  audit {} {} by {} ({})",
            entry.id,
            entry.action.as_str(),
            entry.actor_id,
            entry.entry_hash.get(..12).unwrap_or(entry.entry_hash.as_str())
        );
    }
}
