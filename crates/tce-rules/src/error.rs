//! Rule-specific error types.
//!
//! [`SchemaError`] is fatal and raised at load time: an engine that cannot
//! parse its own rules must refuse to start. [`RuleEvaluationError`] is
//! raised per rule at evaluation time and is recoverable: the caller turns
//! it into a warning and moves on to the next rule.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that prevent a rule document from loading.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Document does not match the rule schema (JSON input).
    #[error("malformed rule document: {0}")]
    Json(#[from] serde_json::Error),

    /// Document does not match the rule schema (YAML input).
    #[error("malformed rule document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON file failed to parse against the schema.
    #[error("failed to parse rule document {path}: {source}")]
    JsonParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// YAML file failed to parse against the schema.
    #[error("failed to parse rule document {path}: {source}")]
    YamlParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// The rule document file does not exist.
    #[error("rule document not found: {path}")]
    FileNotFound { path: PathBuf },

    /// File extension is neither JSON nor YAML.
    #[error("unsupported rule document format: {path} (expected .json, .yaml or .yml)")]
    UnsupportedFormat { path: PathBuf },

    /// Two rules share the same id.
    #[error("duplicate rule id: {0}")]
    DuplicateRuleId(String),

    /// A required text field is present but blank.
    #[error("rule {rule_id:?}: {field} must not be empty")]
    EmptyField {
        rule_id: String,
        field: &'static str,
    },

    /// I/O error other than a missing file.
    #[error("I/O error reading rule document: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while evaluating a single rule against a snapshot.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuleEvaluationError {
    /// Field path is empty or contains an empty segment (`a..b`, `.a`).
    #[error("malformed field path {path:?}")]
    MalformedPath { path: String },
}
