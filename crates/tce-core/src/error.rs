//! # Error Hierarchy
//!
//! Validation errors for domain primitives, built with `thiserror`.
//! Each variant carries the rejected input and the expected format so that
//! operators can diagnose a bad record or a bad rule file without guesswork.

use thiserror::Error;

/// Validation errors for domain primitive newtypes and lifecycle names.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// NDA (numéro de déclaration d'activité) is not 11 digits.
    #[error("invalid NDA number: \"{0}\" (expected 11 digits)")]
    InvalidNda(String),

    /// UAI establishment code does not match 7 digits followed by a letter.
    #[error("invalid UAI code: \"{0}\" (expected 7 digits followed by an uppercase letter, e.g. 0751234A)")]
    InvalidUai(String),

    /// SIRET is not 14 digits.
    #[error("invalid SIRET: \"{0}\" (expected 14 digits)")]
    InvalidSiret(String),

    /// Status name does not belong to the dossier lifecycle.
    #[error("unknown dossier status: \"{0}\"")]
    UnknownStatus(String),

    /// Trigger string is not of the form `TO_<STATUS>`.
    #[error("invalid trigger: \"{0}\" (expected TO_<STATUS>)")]
    InvalidTrigger(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_nda_display_names_expected_format() {
        let err = ValidationError::InvalidNda("123".into());
        let msg = format!("{err}");
        assert!(msg.contains("123"));
        assert!(msg.contains("11 digits"));
    }

    #[test]
    fn invalid_trigger_display() {
        let err = ValidationError::InvalidTrigger("FOO".into());
        assert_eq!(
            err.to_string(),
            "invalid trigger: \"FOO\" (expected TO_<STATUS>)"
        );
    }
}
