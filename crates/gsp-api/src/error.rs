//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Every failure resolves to the four-code taxonomy of
//! [`gsp_core::ErrorCode`] and renders as the uniform
//! `{"success":false,"error":{...}}` envelope. Internal error details
//! are logged server-side and never reach the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use gsp_core::{ActionError, ActionResponse, ErrorCode, FieldError};
use gsp_state::SignatureError;

/// Application-level error type mapped to HTTP statuses.
#[derive(Error, Debug)]
pub enum AppError {
    /// Request validation failed (422). Carries field-scoped details.
    #[error("validation error: {0}")]
    Validation(ActionError),

    /// Uniqueness violation (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Missing, soft-deleted, or type-mismatched record (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Persistence or runtime failure (500). Logged, never surfaced.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Validation failure from accumulated field errors.
    pub fn validation(fields: Vec<FieldError>) -> Self {
        Self::Validation(ActionError::validation(fields))
    }

    /// Validation failure with a single free-form message.
    pub fn validation_msg(msg: impl Into<String>) -> Self {
        Self::Validation(ActionError::validation_msg(msg))
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// HTTP status and wire error code for this error.
    fn status_and_code(&self) -> (StatusCode, ErrorCode) {
        match self {
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::ValidationError),
            Self::Conflict(_) => (StatusCode::CONFLICT, ErrorCode::Conflict),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NotFound),
            Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::UnexpectedError,
            ),
        }
    }

    /// The envelope error body sent to the client.
    fn to_action_error(&self) -> ActionError {
        match self {
            Self::Validation(err) => err.clone(),
            Self::Conflict(msg) => ActionError::conflict(msg.clone()),
            Self::NotFound(msg) => ActionError::not_found(msg.clone()),
            // Internal details never leak.
            Self::Internal(_) => ActionError::unexpected("Ocorreu um erro inesperado"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, _code) = self.status_and_code();

        if let Self::Internal(_) = &self {
            tracing::error!(error = %self, "internal server error");
        }

        let body: ActionResponse<()> = ActionResponse::err(self.to_action_error());
        (status, Json(body)).into_response()
    }
}

impl From<ActionError> for AppError {
    fn from(err: ActionError) -> Self {
        match err.code {
            ErrorCode::ValidationError => Self::Validation(err),
            ErrorCode::Conflict => Self::Conflict(err.message),
            ErrorCode::NotFound => Self::NotFound(err.message),
            ErrorCode::UnexpectedError => Self::Internal(err.message),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Internal(format!("database error: {err}"))
    }
}

/// Transition errors surface as not-found, matching the persistence
/// queries that filter on id AND type AND `deleted_at IS NULL`.
impl From<SignatureError> for AppError {
    fn from(err: SignatureError) -> Self {
        match err {
            SignatureError::Revoked { .. } | SignatureError::NotGovbr => {
                Self::NotFound("assinatura não encontrada".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn response_parts(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::validation_msg("x").status_and_code().0,
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::conflict("x").status_and_code().0,
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::not_found("x").status_and_code().0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Internal("x".into()).status_and_code().0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_envelope_shape_on_conflict() {
        let (status, body) = response_parts(AppError::conflict("CPF já cadastrado")).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "CONFLICT");
        assert_eq!(body["error"]["message"], "CPF já cadastrado");
    }

    #[tokio::test]
    async fn test_validation_carries_fields() {
        let err = AppError::validation(vec![
            FieldError::new("name", "muito curto"),
            FieldError::new("cpf", "inválido"),
        ]);
        let (status, body) = response_parts(err).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["fields"][0]["field"], "name");
        assert_eq!(body["error"]["fields"][1]["field"], "cpf");
    }

    #[tokio::test]
    async fn test_internal_hides_details() {
        let (status, body) =
            response_parts(AppError::Internal("db connection refused".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "UNEXPECTED_ERROR");
        let message = body["error"]["message"].as_str().unwrap();
        assert!(
            !message.contains("db connection"),
            "internal details must not leak: {message}"
        );
    }

    #[test]
    fn test_signature_errors_map_to_not_found() {
        let err: AppError = SignatureError::NotGovbr.into();
        assert!(matches!(err, AppError::NotFound(_)));
        let err: AppError = SignatureError::Revoked {
            signature_id: "signature:x".into(),
        }
        .into();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_action_error_roundtrip() {
        let err: AppError = ActionError::conflict("duplicado").into();
        assert!(matches!(err, AppError::Conflict(_)));
        let err: AppError = ActionError::not_found("sumiu").into();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
