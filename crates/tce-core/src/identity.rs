//! # Regulatory Identifier Newtypes
//!
//! Domain-primitive newtypes for the identifiers French training regulation
//! attaches to organizations and sites. Each validates its format at
//! construction time, so a value of the type is always well-formed.
//!
//! - NDA: numéro de déclaration d'activité, issued by the regional labour
//!   administration to training providers (11 digits).
//! - UAI: unité administrative immatriculée, identifies an apprenticeship
//!   or regional training site (7 digits and a check letter).
//! - SIRET: establishment identifier in the national business register
//!   (14 digits).

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

fn is_digits(s: &str, len: usize) -> bool {
    s.len() == len && s.chars().all(|c| c.is_ascii_digit())
}

/// Training-provider activity declaration number.
///
/// Spaces are accepted on input (`"11 75 54321 75"`) and stripped; the
/// stored form is exactly 11 digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NdaNumber(String);

impl NdaNumber {
    /// Create an NDA number, validating the 11-digit format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidNda`] if the value is not 11 digits
    /// once spaces are removed.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = value.into();
        let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        if !is_digits(&compact, 11) {
            return Err(ValidationError::InvalidNda(raw));
        }
        Ok(Self(compact))
    }

    /// Access the NDA string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NdaNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Site registration code (UAI).
///
/// # Validation
///
/// - Exactly 8 characters
/// - First 7 are digits, the last is an uppercase ASCII letter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UaiCode(String);

impl UaiCode {
    /// Create a UAI code, validating the `NNNNNNNL` format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidUai`] on any format mismatch.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        let chars: Vec<char> = s.chars().collect();
        let valid = chars.len() == 8
            && chars[..7].iter().all(char::is_ascii_digit)
            && chars[7].is_ascii_uppercase();
        if !valid {
            return Err(ValidationError::InvalidUai(s));
        }
        Ok(Self(s))
    }

    /// Access the UAI string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UaiCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Establishment identifier (SIRET), 14 digits, spaces stripped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Siret(String);

impl Siret {
    /// Create a SIRET, validating the 14-digit format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidSiret`] if the value is not 14
    /// digits once spaces are removed.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = value.into();
        let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        if !is_digits(&compact, 14) {
            return Err(ValidationError::InvalidSiret(raw));
        }
        Ok(Self(compact))
    }

    /// Access the SIRET string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The SIREN (legal-unit number) prefix.
    pub fn siren(&self) -> &str {
        &self.0[..9]
    }
}

impl std::fmt::Display for Siret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
