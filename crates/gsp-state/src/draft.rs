//! # Field-Scoped Signature Input Validation
//!
//! The API payload for create/update is flat: the Gov.br identifier and
//! the image fields coexist as optionals, and which one is required
//! depends on `type`. Validation walks every field and accumulates one
//! [`FieldError`] per offense, so the client receives the full list in
//! a single round trip rather than failing on the first bad field.
//!
//! A successful validation yields a [`SignatureDraft`] with normalized
//! values (digits-only CPF and phone, lowercased e-mail) and the
//! method narrowed into the [`SignatureMethod`] union.

use serde::{Deserialize, Serialize};

use gsp_core::{br, FieldError};

use crate::image::SignatureImage;
use crate::signature::{SignatureMethod, SignatureType};

/// Field limits for the signature payload.
const NAME_MIN: usize = 2;
const NAME_MAX: usize = 120;
const CPF_RAW_MIN: usize = 11;
const CPF_RAW_MAX: usize = 14;
const EMAIL_MIN: usize = 5;
const EMAIL_MAX: usize = 160;
const PHONE_RAW_MAX: usize = 20;
const PHONE_DIGITS_MIN: usize = 10;
const IDENTIFIER_MIN: usize = 5;
const IDENTIFIER_MAX: usize = 160;

/// The flat create/update payload, as received on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignatureInput {
    pub name: String,
    pub cpf: String,
    pub email: String,
    pub phone: String,
    #[serde(rename = "type")]
    #[schema(value_type = String)]
    pub signature_type: SignatureType,
    /// Required when `type` is `govbr`.
    #[serde(default)]
    pub govbr_identifier: Option<String>,
    /// Required when `type` is `custom`; a PNG/JPEG base64 data URL.
    #[serde(default)]
    pub signature_image: Option<String>,
    #[serde(default)]
    pub image_width: Option<i64>,
    #[serde(default)]
    pub image_height: Option<i64>,
}

/// A validated, normalized signature payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureDraft {
    /// Trimmed name.
    pub name: String,
    /// Digits-only CPF, checksum-valid.
    pub cpf: String,
    /// Lowercased e-mail.
    pub email: String,
    /// Digits-only phone.
    pub phone: String,
    /// The narrowed method payload.
    pub method: SignatureMethod,
}

impl SignatureInput {
    /// Validate every field, accumulating all failures.
    ///
    /// # Errors
    ///
    /// Returns one [`FieldError`] per offending field, using the wire
    /// field names (`govbrIdentifier`, `signatureImage`).
    pub fn validate(&self) -> Result<SignatureDraft, Vec<FieldError>> {
        let mut errors = Vec::new();

        let name = self.name.trim().to_string();
        let name_len = name.chars().count();
        if !(NAME_MIN..=NAME_MAX).contains(&name_len) {
            errors.push(FieldError::new(
                "name",
                format!("deve ter entre {NAME_MIN} e {NAME_MAX} caracteres"),
            ));
        }

        let cpf_raw = self.cpf.trim();
        let cpf = br::normalize_digits(cpf_raw);
        if !(CPF_RAW_MIN..=CPF_RAW_MAX).contains(&cpf_raw.chars().count()) {
            errors.push(FieldError::new(
                "cpf",
                format!("deve ter entre {CPF_RAW_MIN} e {CPF_RAW_MAX} caracteres"),
            ));
        } else if !br::validate_cpf(cpf_raw) {
            errors.push(FieldError::new("cpf", "CPF invalido"));
        }

        let email = self.email.trim().to_lowercase();
        if !(EMAIL_MIN..=EMAIL_MAX).contains(&email.chars().count()) {
            errors.push(FieldError::new(
                "email",
                format!("deve ter entre {EMAIL_MIN} e {EMAIL_MAX} caracteres"),
            ));
        } else if !is_plausible_email(&email) {
            errors.push(FieldError::new("email", "e-mail invalido"));
        }

        let phone_raw = self.phone.trim();
        let phone = br::normalize_digits(phone_raw);
        if phone_raw.chars().count() > PHONE_RAW_MAX || phone.len() < PHONE_DIGITS_MIN {
            errors.push(FieldError::new(
                "phone",
                format!("deve ter ao menos {PHONE_DIGITS_MIN} digitos"),
            ));
        }

        let method = match self.signature_type {
            SignatureType::Govbr => self.validate_govbr(&mut errors),
            SignatureType::Custom => self.validate_custom(&mut errors),
        };

        match method {
            Some(method) if errors.is_empty() => Ok(SignatureDraft {
                name,
                cpf,
                email,
                phone,
                method,
            }),
            _ => Err(errors),
        }
    }

    fn validate_govbr(&self, errors: &mut Vec<FieldError>) -> Option<SignatureMethod> {
        let identifier = self
            .govbr_identifier
            .as_deref()
            .map(str::trim)
            .unwrap_or_default();
        let len = identifier.chars().count();
        if !(IDENTIFIER_MIN..=IDENTIFIER_MAX).contains(&len) {
            errors.push(FieldError::new(
                "govbrIdentifier",
                format!("obrigatorio para assinatura gov.br ({IDENTIFIER_MIN}-{IDENTIFIER_MAX} caracteres)"),
            ));
            return None;
        }
        Some(SignatureMethod::Govbr {
            identifier: identifier.to_string(),
        })
    }

    fn validate_custom(&self, errors: &mut Vec<FieldError>) -> Option<SignatureMethod> {
        let Some(data_url) = self.signature_image.as_deref() else {
            errors.push(FieldError::new(
                "signatureImage",
                "obrigatorio para assinatura personalizada",
            ));
            return None;
        };
        match SignatureImage::parse(data_url, self.image_width, self.image_height) {
            Ok(image) => Some(SignatureMethod::Custom { image }),
            Err(e) => {
                errors.push(FieldError::new("signatureImage", e.to_string()));
                None
            }
        }
    }
}

/// Minimal e-mail shape check: non-empty local part, a dot somewhere in
/// the domain.
fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::SignatureType;

    fn govbr_input() -> SignatureInput {
        SignatureInput {
            name: "Ana Souza".to_string(),
            cpf: "529.982.247-25".to_string(),
            email: "Ana@Example.com".to_string(),
            phone: "(21) 99999-9999".to_string(),
            signature_type: SignatureType::Govbr,
            govbr_identifier: Some("ana@gov.example".to_string()),
            signature_image: None,
            image_width: None,
            image_height: None,
        }
    }

    fn custom_input() -> SignatureInput {
        SignatureInput {
            signature_type: SignatureType::Custom,
            govbr_identifier: None,
            signature_image: Some("data:image/png;base64,aGVsbG8=".to_string()),
            image_width: Some(640),
            image_height: Some(200),
            ..govbr_input()
        }
    }

    fn field_names(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn test_valid_govbr_input_normalizes() {
        let draft = govbr_input().validate().unwrap();
        assert_eq!(draft.cpf, "52998224725");
        assert_eq!(draft.email, "ana@example.com");
        assert_eq!(draft.phone, "21999999999");
        assert!(matches!(draft.method, SignatureMethod::Govbr { .. }));
    }

    #[test]
    fn test_valid_custom_input() {
        let draft = custom_input().validate().unwrap();
        assert!(matches!(draft.method, SignatureMethod::Custom { .. }));
    }

    #[test]
    fn test_all_failures_accumulate() {
        let input = SignatureInput {
            name: "A".to_string(),
            cpf: "123".to_string(),
            email: "x".to_string(),
            phone: "123".to_string(),
            govbr_identifier: None,
            ..govbr_input()
        };
        let errors = input.validate().unwrap_err();
        assert_eq!(
            field_names(&errors),
            vec!["name", "cpf", "email", "phone", "govbrIdentifier"]
        );
    }

    #[test]
    fn test_cpf_checksum_rejected_with_field_name() {
        let input = SignatureInput {
            cpf: "529.982.247-26".to_string(),
            ..govbr_input()
        };
        let errors = input.validate().unwrap_err();
        assert_eq!(field_names(&errors), vec!["cpf"]);
    }

    #[test]
    fn test_email_shape() {
        for bad in ["plainaddress", "a@b", "@domain.com", "a@.com"] {
            let input = SignatureInput {
                email: bad.to_string(),
                ..govbr_input()
            };
            assert!(input.validate().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_phone_raw_length_cap() {
        let input = SignatureInput {
            phone: "+55 (21) 9 9999-99999".to_string(), // 21 chars raw
            ..govbr_input()
        };
        let errors = input.validate().unwrap_err();
        assert_eq!(field_names(&errors), vec!["phone"]);
    }

    #[test]
    fn test_custom_requires_image() {
        let input = SignatureInput {
            signature_image: None,
            ..custom_input()
        };
        let errors = input.validate().unwrap_err();
        assert_eq!(field_names(&errors), vec!["signatureImage"]);
    }

    #[test]
    fn test_custom_rejects_bad_image() {
        let input = SignatureInput {
            signature_image: Some("data:image/gif;base64,aGVsbG8=".to_string()),
            ..custom_input()
        };
        let errors = input.validate().unwrap_err();
        assert_eq!(field_names(&errors), vec!["signatureImage"]);
    }

    #[test]
    fn test_wire_field_names_are_camel_case() {
        let json = serde_json::to_value(govbr_input()).unwrap();
        assert!(json.get("govbrIdentifier").is_some());
        assert_eq!(json["type"], "govbr");
    }
}
