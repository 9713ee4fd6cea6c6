//! # Rule Document Loader
//!
//! Turns an unstructured document into a [`RuleDocument`], or fails.
//!
//! Loading happens in two passes. Serde enforces the shape (required keys,
//! closed enums, no unknown keys, recursive `additionalCheck`). A semantic
//! pass then rejects blank identifiers and duplicate rule ids. Either pass
//! failing discards the whole document: the engine never sees a partially
//! loaded rule set.
//!
//! Operand/operator combinations that can never match (an `LT` compared
//! with a string, a `CONTAINS` with a number) are accepted but logged at
//! warn level. Such a rule loads and silently never fires, which is almost
//! always a typo in the document.

use std::collections::HashSet;
use std::path::Path;

use tce_core::Value;

use crate::error::SchemaError;
use crate::schema::{RawDocument, Rule, RuleDocument};

/// Bundled default rule set.
const STANDARD_RULES: &str = include_str!("../rules/standard.json");

/// Load a rule document from an already-parsed JSON value.
///
/// # Errors
///
/// Returns [`SchemaError`] if the document does not match the rule schema or
/// fails a semantic check.
pub fn load_rules(raw: serde_json::Value) -> Result<RuleDocument, SchemaError> {
    let raw: RawDocument = serde_json::from_value(raw)?;
    finish(raw)
}

impl RuleDocument {
    /// Parse and validate a JSON rule document.
    pub fn from_json_str(input: &str) -> Result<Self, SchemaError> {
        let raw: RawDocument = serde_json::from_str(input)?;
        finish(raw)
    }

    /// Parse and validate a YAML rule document.
    pub fn from_yaml_str(input: &str) -> Result<Self, SchemaError> {
        let raw: RawDocument = serde_yaml::from_str(input)?;
        finish(raw)
    }

    /// Load a rule document from disk. The format is chosen by extension:
    /// `.json`, `.yaml` or `.yml`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::FileNotFound`] if the path does not exist,
    /// [`SchemaError::UnsupportedFormat`] for any other extension, and the
    /// parse or semantic error otherwise.
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        if !path.exists() {
            return Err(SchemaError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let raw: RawDocument = match ext.as_deref() {
            Some("json") => {
                let content = std::fs::read_to_string(path)?;
                serde_json::from_str(&content).map_err(|source| SchemaError::JsonParse {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            Some("yaml") | Some("yml") => {
                let content = std::fs::read_to_string(path)?;
                serde_yaml::from_str(&content).map_err(|source| SchemaError::YamlParse {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            _ => {
                return Err(SchemaError::UnsupportedFormat {
                    path: path.to_path_buf(),
                })
            }
        };

        let document = finish(raw)?;
        tracing::info!(
            path = %path.display(),
            version = document.version().unwrap_or("-"),
            "rule document loaded from file"
        );
        Ok(document)
    }

    /// The rule set bundled with this crate.
    pub fn standard() -> Result<Self, SchemaError> {
        Self::from_json_str(STANDARD_RULES)
    }
}

fn finish(raw: RawDocument) -> Result<RuleDocument, SchemaError> {
    let mut seen = HashSet::with_capacity(raw.rules.len());
    for rule in &raw.rules {
        check_rule(rule)?;
        if !seen.insert(rule.id.as_str()) {
            return Err(SchemaError::DuplicateRuleId(rule.id.clone()));
        }
    }

    let document = RuleDocument {
        version: raw.version,
        rules: raw.rules,
    };
    for (rule, logic) in document.inert_conditions() {
        let operand = logic.value.as_ref().unwrap_or(&Value::Null);
        tracing::warn!(
            rule_id = %rule.id,
            field = %logic.field,
            operator = %logic.operator,
            operand_kind = operand.kind(),
            "operand can never match operator; rule will not fire on this condition"
        );
    }

    tracing::info!(count = document.len(), "compliance rules loaded");
    Ok(document)
}

fn check_rule(rule: &Rule) -> Result<(), SchemaError> {
    let empty = |field: &'static str| SchemaError::EmptyField {
        rule_id: rule.id.clone(),
        field,
    };
    if rule.id.trim().is_empty() {
        return Err(empty("id"));
    }
    if rule.message.trim().is_empty() {
        return Err(empty("message"));
    }
    if rule.logic.chain().any(|l| l.field.trim().is_empty()) {
        return Err(empty("logic.field"));
    }
    Ok(())
}
