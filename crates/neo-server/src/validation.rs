//! Request body validation.
//!
//! Request types derive [`validator::Validate`]; failures are reported as
//! `422 Unprocessable Entity` with per-field details.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use neo_auth::MAX_USERNAME_LENGTH;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use validator::{ValidationError, ValidationErrors};

/// Usernames start with a letter or digit and contain letters, digits, `_`, `-` and `.`.
pub static USERNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_.-]*$").expect("Invalid regex"));

/// Validation error response.
#[derive(Debug, Serialize)]
pub struct ValidationErrorResponse {
    /// Error type.
    pub error: String,
    /// Human-readable message.
    pub message: String,
    /// Field-level error details.
    pub details: Vec<FieldError>,
}

/// Field-level validation error.
#[derive(Debug, Serialize)]
pub struct FieldError {
    /// Field name.
    pub field: String,
    /// Error code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

impl IntoResponse for ValidationErrorResponse {
    fn into_response(self) -> Response {
        (StatusCode::UNPROCESSABLE_ENTITY, Json(self)).into_response()
    }
}

impl From<ValidationErrors> for ValidationErrorResponse {
    fn from(errors: ValidationErrors) -> Self {
        let mut details: Vec<FieldError> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| FieldError {
                    field: field.to_string(),
                    code: e.code.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Validation failed for field '{}'", field)),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        ValidationErrorResponse {
            error: "validation_error".to_string(),
            message: "Validation failed".to_string(),
            details,
        }
    }
}

/// Validate a username.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        let mut err = ValidationError::new("length");
        err.message = Some("Username cannot be empty".into());
        return Err(err);
    }

    if username.len() > MAX_USERNAME_LENGTH {
        let mut err = ValidationError::new("length");
        err.message = Some(
            format!("Username must be at most {} characters", MAX_USERNAME_LENGTH).into(),
        );
        return Err(err);
    }

    if !USERNAME_REGEX.is_match(username) {
        let mut err = ValidationError::new("pattern");
        err.message = Some(
            concat!(
                "Username must start with a letter or number and contain only ",
                "letters, numbers, '_', '-' and '.'"
            )
            .into(),
        );
        return Err(err);
    }

    Ok(())
}
