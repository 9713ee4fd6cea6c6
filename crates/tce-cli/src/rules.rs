//! # Rules Subcommand
//!
//! Lints and lists declarative rule documents.
//!
//! `check` is meant for CI: a document that fails here would stop the API
//! service at startup.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tce_core::Value;
use tce_rules::{RuleDocument, SchemaError, Trigger};

/// Arguments for the `tce rules` subcommand.
#[derive(Args, Debug)]
pub struct RulesArgs {
    #[command(subcommand)]
    pub command: RulesCommand,
}

/// Rules subcommands.
#[derive(Subcommand, Debug)]
pub enum RulesCommand {
    /// Load a rule document and report every problem.
    Check {
        /// Rule document (.json, .yaml or .yml).
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },

    /// List rules, optionally only those bound to one trigger.
    List {
        /// Rule document. Defaults to the bundled standard rules.
        #[arg(long, value_name = "FILE")]
        rules: Option<PathBuf>,

        /// Only rules with this trigger, e.g. TO_CLOSED.
        #[arg(long)]
        trigger: Option<String>,
    },
}

/// Execute the rules subcommand.
///
/// Returns exit code: 0 on success, 1 on validation failure, 2 on operational error.
pub fn run_rules(args: &RulesArgs) -> Result<u8> {
    match &args.command {
        RulesCommand::Check { path } => check(path),
        RulesCommand::List { rules, trigger } => list(rules.as_deref(), trigger.as_deref()),
    }
}

/// Load `path` and print a report. Schema problems are exit code 1; a
/// missing or unreadable file is an error.
pub fn check(path: &Path) -> Result<u8> {
    let document = match RuleDocument::load(path) {
        Ok(document) => document,
        Err(e @ (SchemaError::FileNotFound { .. } | SchemaError::Io(_))) => {
            return Err(e).with_context(|| format!("cannot read {}", path.display()));
        }
        Err(e) => {
            println!("FAIL: {}", path.display());
            println!("  {e}");
            return Ok(1);
        }
    };

    println!(
        "OK: {} ({} rule(s), version {})",
        path.display(),
        document.len(),
        document.version().unwrap_or("unversioned")
    );

    for (rule, logic) in document.inert_conditions() {
        let operand = logic.value.as_ref().unwrap_or(&Value::Null);
        println!(
            "  WARN: rule {}: {} {} compared with a {} never matches",
            rule.id,
            logic.field,
            logic.operator,
            operand.kind()
        );
    }

    Ok(0)
}

/// Print one line per rule.
pub fn list(rules: Option<&Path>, trigger: Option<&str>) -> Result<u8> {
    let document = crate::load_rule_document(rules)?;
    let trigger: Option<Trigger> = trigger
        .map(|t| t.trim().parse::<Trigger>())
        .transpose()
        .context("invalid --trigger")?;

    let selected: Vec<_> = document
        .rules()
        .iter()
        .filter(|rule| trigger.map_or(true, |t| rule.trigger == t))
        .collect();

    for rule in &selected {
        println!(
            "{:<40} {:<14} {:<8} {}",
            rule.id,
            rule.trigger.to_string(),
            rule.severity.as_str(),
            rule.message
        );
    }
    println!("\n{} rule(s)", selected.len());
    Ok(0)
}
