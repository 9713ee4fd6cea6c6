//! # tce-cli: Admin CLI for the Training Compliance Engine
//!
//! ## Subcommands
//!
//! - `tce rules check <FILE>`: Load a rule document and report schema
//!   errors and conditions that can never match.
//! - `tce rules list [--rules FILE] [--trigger TO_X]`: List loaded rules.
//! - `tce dry-run --dossier FILE --target STATUS`: Validate a transition
//!   of a dossier fixture against the rules, without touching any database.
//!
//! ## Exit Codes
//!
//! `0` success or transition allowed, `1` validation failure or transition
//! blocked, `2` operational error (unreadable file, bad arguments).
//!
//! ```bash
//! tce rules check rules/standard.json
//! tce rules list --trigger TO_CLOSED
//! tce dry-run --dossier fixtures/dossier.json --target CLOSED --actor user-1
//! ```

pub mod dry_run;
pub mod rules;

use std::path::Path;

use anyhow::{Context, Result};
use tce_rules::RuleDocument;

/// Load the rule document at `path`, or the bundled standard rules.
pub fn load_rule_document(path: Option<&Path>) -> Result<RuleDocument> {
    match path {
        Some(path) => RuleDocument::load(path)
            .with_context(|| format!("failed to load rule document {}", path.display())),
        None => RuleDocument::standard().context("bundled standard rules failed to load"),
    }
}
