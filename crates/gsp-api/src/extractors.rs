//! # Request Extraction Helpers
//!
//! Handlers take `Result<Json<T>, JsonRejection>` and call
//! [`extract_validated_json`], so both malformed JSON and field-level
//! validation failures resolve to the same 422 envelope instead of
//! axum's default plaintext rejection.

use axum::extract::rejection::JsonRejection;
use axum::Json;

use gsp_core::FieldError;

use crate::error::AppError;

/// Field-scoped request body validation.
///
/// Implementations walk every field and accumulate failures rather
/// than returning on the first offense.
pub trait Validate {
    fn validate(&self) -> Result<(), Vec<FieldError>>;
}

/// Unwrap a JSON body and run its validation.
///
/// # Errors
///
/// Returns a validation error when the body failed to deserialize or
/// the payload violates field constraints.
pub fn extract_validated_json<T: Validate>(
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let Json(value) =
        body.map_err(|rejection| AppError::validation_msg(rejection.body_text()))?;
    value.validate().map_err(AppError::validation)?;
    Ok(value)
}

/// Unwrap a JSON body without running trait validation.
///
/// For payloads whose validation yields a value the handler consumes
/// (the signature input produces a normalized draft), so the field walk
/// runs once in the handler instead of twice.
///
/// # Errors
///
/// Returns a validation error when the body failed to deserialize.
pub fn extract_json<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    let Json(value) =
        body.map_err(|rejection| AppError::validation_msg(rejection.body_text()))?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Payload {
        name: String,
    }

    impl Validate for Payload {
        fn validate(&self) -> Result<(), Vec<FieldError>> {
            if self.name.is_empty() {
                return Err(vec![FieldError::new("name", "obrigatório")]);
            }
            Ok(())
        }
    }

    #[test]
    fn test_valid_payload_passes() {
        let body = Ok(Json(Payload {
            name: "ok".to_string(),
        }));
        assert!(extract_validated_json(body).is_ok());
    }

    #[test]
    fn test_extract_json_skips_field_validation() {
        // A payload that would fail Validate still passes through; the
        // handler owns the single validation pass.
        let body = Ok(Json(Payload {
            name: String::new(),
        }));
        assert!(extract_json(body).is_ok());
    }

    #[test]
    fn test_invalid_payload_maps_to_validation_error() {
        let body = Ok(Json(Payload {
            name: String::new(),
        }));
        match extract_validated_json(body) {
            Err(AppError::Validation(err)) => {
                assert_eq!(err.fields.len(), 1);
                assert_eq!(err.fields[0].field, "name");
            }
            Err(other) => panic!("expected validation error, got {other:?}"),
            Ok(_) => panic!("expected validation error"),
        }
    }
}
