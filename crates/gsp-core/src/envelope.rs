//! # Action Response Envelope
//!
//! Every persistence operation resolves to the uniform envelope
//! `{success: true, data} | {success: false, error: {code, message}}`,
//! so callers branch on the machine-readable `ErrorCode` instead of
//! inspecting message text.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine-readable error codes for action failures.
///
/// The set is closed on purpose: every failure a handler can produce is
/// one of these four, and clients are expected to match exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Schema or field-level validation failure.
    ValidationError,
    /// Uniqueness violation (duplicate CPF/CNPJ, duplicate proposal code).
    Conflict,
    /// Missing, soft-deleted, or type-mismatched record.
    NotFound,
    /// Persistence or runtime failure; logged server-side, surfaced with
    /// a generic message.
    UnexpectedError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::Conflict => "CONFLICT",
            Self::NotFound => "NOT_FOUND",
            Self::UnexpectedError => "UNEXPECTED_ERROR",
        };
        f.write_str(s)
    }
}

/// A validation failure scoped to a single input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Input field name, in the API's wire casing (e.g., `govbrIdentifier`).
    pub field: String,
    /// Human-readable message for that field.
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A failed action, carrying the error code callers branch on.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct ActionError {
    pub code: ErrorCode,
    pub message: String,
    /// Field-scoped details, present only for validation failures.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

impl ActionError {
    /// Validation failure from accumulated field errors.
    pub fn validation(fields: Vec<FieldError>) -> Self {
        let message = fields
            .iter()
            .map(|f| format!("{}: {}", f.field, f.message))
            .collect::<Vec<_>>()
            .join("; ");
        Self {
            code: ErrorCode::ValidationError,
            message,
            fields,
        }
    }

    /// Validation failure with a single free-form message.
    pub fn validation_msg(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::ValidationError,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Conflict,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::NotFound,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::UnexpectedError,
            message: message.into(),
            fields: Vec::new(),
        }
    }
}

/// The uniform success/error envelope returned by every action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionResponse<T> {
    Success { success: bool, data: T },
    Failure { success: bool, error: ActionError },
}

impl<T> ActionResponse<T> {
    pub fn ok(data: T) -> Self {
        Self::Success {
            success: true,
            data,
        }
    }

    pub fn err(error: ActionError) -> Self {
        Self::Failure {
            success: false,
            error,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

impl<T> From<Result<T, ActionError>> for ActionResponse<T> {
    fn from(result: Result<T, ActionError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(error) => Self::err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_shape() {
        let resp = ActionResponse::ok(serde_json::json!({"id": 1}));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["id"], 1);
    }

    #[test]
    fn test_failure_envelope_shape() {
        let resp: ActionResponse<()> =
            ActionResponse::err(ActionError::conflict("CPF ja cadastrado"));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "CONFLICT");
        assert_eq!(json["error"]["message"], "CPF ja cadastrado");
    }

    #[test]
    fn test_validation_joins_field_messages() {
        let err = ActionError::validation(vec![
            FieldError::new("name", "muito curto"),
            FieldError::new("cpf", "invalido"),
        ]);
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "name: muito curto; cpf: invalido");
        assert_eq!(err.fields.len(), 2);
    }

    #[test]
    fn test_error_code_display_matches_wire_form() {
        assert_eq!(ErrorCode::NotFound.to_string(), "NOT_FOUND");
        assert_eq!(ErrorCode::UnexpectedError.to_string(), "UNEXPECTED_ERROR");
    }

    #[test]
    fn test_fields_omitted_when_empty() {
        let err = ActionError::not_found("assinatura nao encontrada");
        let json = serde_json::to_string(&err).unwrap();
        assert!(!json.contains("fields"));
    }
}
