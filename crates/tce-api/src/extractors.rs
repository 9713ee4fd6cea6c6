//! # Request Extraction
//!
//! Handlers take axum extractors as `Result<_, Rejection>` and unwrap them
//! here, so a malformed body, path or query string still answers with the
//! `{"error": {...}}` envelope instead of axum's plain-text rejection.
//!
//! | rejection | response |
//! |---|---|
//! | unparseable JSON body, path segment or query string | 400 `BAD_REQUEST` |
//! | well-formed body failing [`Validate`] | 422 `VALIDATION_ERROR` |

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::Json;

use crate::error::AppError;

/// Checks on a deserialized request DTO that serde cannot express, such as
/// non-blank strings or fields that only make sense together.
pub trait Validate {
    /// The first problem found, as a message for the client.
    fn validate(&self) -> Result<(), String>;
}

fn extract_json<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    let Json(value) = body.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    Ok(value)
}

/// Unwrap a JSON body, then run [`Validate::validate`].
pub fn extract_validated_json<T: Validate>(
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(body)?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}

pub fn extract_path<T>(path: Result<Path<T>, PathRejection>) -> Result<T, AppError> {
    let Path(value) = path.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    Ok(value)
}

pub fn extract_query<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    let Query(value) = query.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    Ok(value)
}

/// `Err` naming `field` when `value` is empty or whitespace.
pub(crate) fn require_non_blank(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} must not be empty"));
    }
    Ok(())
}
