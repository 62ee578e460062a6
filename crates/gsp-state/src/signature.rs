//! # Signature Verification State Machine
//!
//! Models the verification lifecycle of a proposal signature.
//!
//! ## States
//!
//! ```text
//!   gov.br ──▶ Pending ◀──▶ Verified        custom ──▶ Verified
//!                 │             │                          │
//!                 └──────┬──────┘                          │
//!                        ▼                                 ▼
//!                     Revoked (terminal) ◀─────────────────┘
//! ```
//!
//! A custom (drawn/uploaded) signature is trusted the moment it is
//! stored, so it starts `verified`. A Gov.br signature starts `pending`
//! and moves to `verified` only when the external confirmation is
//! recorded; confirmation can be re-requested, which moves it back to
//! `pending` and clears the validation timestamp. Revocation doubles as
//! the soft delete and survives any later re-edit of the record.
//!
//! Validation transitions apply only to Gov.br signatures. The enum
//! approach with transition methods returning `Result` mirrors how the
//! persistence layer reports type mismatches: a transition attempted
//! against a custom or revoked signature is a structured error, never a
//! silent status change.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use gsp_core::{SignatureId, Timestamp};

use crate::image::SignatureImage;

// ─── Signature Type and Status ───────────────────────────────────────

/// How the signer authenticates: Gov.br identifier or captured image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureType {
    /// External confirmation through the Gov.br portal.
    Govbr,
    /// Drawn or uploaded signature image.
    Custom,
}

impl SignatureType {
    /// The wire string stored in the database (`govbr` / `custom`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Govbr => "govbr",
            Self::Custom => "custom",
        }
    }

    /// Parse the wire string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "govbr" => Some(Self::Govbr),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

impl std::fmt::Display for SignatureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The verification status of a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureStatus {
    /// Awaiting external Gov.br confirmation.
    Pending,
    /// Confirmed (immediately for custom, after confirmation for Gov.br).
    Verified,
    /// Soft-deleted; terminal.
    Revoked,
}

impl SignatureStatus {
    /// The status a signature takes on create or re-edit.
    ///
    /// A prior revocation is preserved; otherwise custom signatures are
    /// trusted immediately and Gov.br signatures await confirmation.
    pub fn initial_for(signature_type: SignatureType, prior: Option<SignatureStatus>) -> Self {
        if prior == Some(Self::Revoked) {
            return Self::Revoked;
        }
        match signature_type {
            SignatureType::Custom => Self::Verified,
            SignatureType::Govbr => Self::Pending,
        }
    }

    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Revoked)
    }

    /// The wire string stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Revoked => "revoked",
        }
    }

    /// Parse the wire string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "verified" => Some(Self::Verified),
            "revoked" => Some(Self::Revoked),
            _ => None,
        }
    }
}

impl std::fmt::Display for SignatureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Signature Method ────────────────────────────────────────────────

/// The method-specific payload of a signature.
///
/// Exactly one variant holds its payload, so a Gov.br signature can
/// never carry an image and a custom signature can never carry an
/// identifier. The flat API payload is narrowed into this union by
/// [`crate::draft::SignatureInput::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SignatureMethod {
    /// Gov.br portal identifier (CPF or registered e-mail).
    Govbr {
        /// The portal identifier, 5-160 characters.
        identifier: String,
    },
    /// Captured signature image.
    Custom {
        /// The validated image payload.
        image: SignatureImage,
    },
}

impl SignatureMethod {
    /// The type tag of this method.
    pub fn signature_type(&self) -> SignatureType {
        match self {
            Self::Govbr { .. } => SignatureType::Govbr,
            Self::Custom { .. } => SignatureType::Custom,
        }
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors rejecting a signature status transition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    /// The signature is revoked; no further transitions are allowed.
    #[error("signature {signature_id} is revoked and cannot transition")]
    Revoked {
        /// The signature identifier.
        signature_id: String,
    },

    /// A validation transition was attempted on a custom signature.
    #[error("validation transitions apply only to gov.br signatures")]
    NotGovbr,
}

// ─── Signature Record ────────────────────────────────────────────────

/// A signer record with normalized contact data and verification state.
///
/// `cpf` and `phone` hold digits only and `email` is lowercased; the
/// normalization happens in [`crate::draft`] before a `Signature` is
/// constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signature {
    /// Unique identifier.
    pub id: SignatureId,
    /// Signer's full name, trimmed.
    pub name: String,
    /// CPF, digits only.
    pub cpf: String,
    /// E-mail, lowercased.
    pub email: String,
    /// Phone, digits only.
    pub phone: String,
    /// Method-specific payload.
    pub method: SignatureMethod,
    /// Current verification status.
    pub status: SignatureStatus,
    /// When Gov.br confirmation was last recorded.
    pub govbr_last_validated_at: Option<Timestamp>,
    /// When the record was created.
    pub created_at: Timestamp,
    /// When the record was last modified.
    pub updated_at: Timestamp,
    /// Soft-delete marker; set when the signature is revoked.
    pub deleted_at: Option<Timestamp>,
}

impl Signature {
    /// The type tag of this signature's method.
    pub fn signature_type(&self) -> SignatureType {
        self.method.signature_type()
    }

    /// Whether the signature has been revoked.
    pub fn is_revoked(&self) -> bool {
        self.status.is_terminal()
    }

    /// Record Gov.br confirmation: any non-revoked status → `verified`,
    /// stamping `govbr_last_validated_at`.
    ///
    /// # Errors
    ///
    /// Rejects custom signatures and revoked records.
    pub fn complete_validation(&mut self) -> Result<(), SignatureError> {
        self.require_govbr_live()?;
        let now = Timestamp::now();
        self.status = SignatureStatus::Verified;
        self.govbr_last_validated_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Request a fresh Gov.br confirmation: any non-revoked status →
    /// `pending`, clearing `govbr_last_validated_at`.
    ///
    /// # Errors
    ///
    /// Rejects custom signatures and revoked records.
    pub fn request_validation(&mut self) -> Result<(), SignatureError> {
        self.require_govbr_live()?;
        self.status = SignatureStatus::Pending;
        self.govbr_last_validated_at = None;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Revoke the signature. Doubles as the soft delete; terminal.
    pub fn revoke(&mut self) {
        let now = Timestamp::now();
        self.status = SignatureStatus::Revoked;
        self.deleted_at = Some(now);
        self.updated_at = now;
    }

    fn require_govbr_live(&self) -> Result<(), SignatureError> {
        if self.is_revoked() {
            return Err(SignatureError::Revoked {
                signature_id: self.id.to_string(),
            });
        }
        if self.signature_type() != SignatureType::Govbr {
            return Err(SignatureError::NotGovbr);
        }
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::SignatureImage;

    fn govbr_signature() -> Signature {
        let now = Timestamp::now();
        Signature {
            id: SignatureId::new(),
            name: "Ana Souza".to_string(),
            cpf: "52998224725".to_string(),
            email: "ana@example.com".to_string(),
            phone: "21999999999".to_string(),
            method: SignatureMethod::Govbr {
                identifier: "ana@gov.example".to_string(),
            },
            status: SignatureStatus::initial_for(SignatureType::Govbr, None),
            govbr_last_validated_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    fn custom_signature() -> Signature {
        let image =
            SignatureImage::parse("data:image/png;base64,aGVsbG8=", Some(640), Some(200))
                .unwrap();
        let mut sig = govbr_signature();
        sig.method = SignatureMethod::Custom { image };
        sig.status = SignatureStatus::initial_for(SignatureType::Custom, None);
        sig
    }

    // ── Initial status ───────────────────────────────────────────────

    #[test]
    fn test_govbr_starts_pending() {
        assert_eq!(govbr_signature().status, SignatureStatus::Pending);
    }

    #[test]
    fn test_custom_starts_verified() {
        assert_eq!(custom_signature().status, SignatureStatus::Verified);
    }

    #[test]
    fn test_prior_revocation_survives_reedit() {
        assert_eq!(
            SignatureStatus::initial_for(SignatureType::Custom, Some(SignatureStatus::Revoked)),
            SignatureStatus::Revoked
        );
        assert_eq!(
            SignatureStatus::initial_for(SignatureType::Govbr, Some(SignatureStatus::Revoked)),
            SignatureStatus::Revoked
        );
        assert_eq!(
            SignatureStatus::initial_for(SignatureType::Govbr, Some(SignatureStatus::Verified)),
            SignatureStatus::Pending
        );
    }

    // ── Validation transitions ───────────────────────────────────────

    #[test]
    fn test_complete_validation_verifies_and_stamps() {
        let mut sig = govbr_signature();
        sig.complete_validation().unwrap();
        assert_eq!(sig.status, SignatureStatus::Verified);
        assert!(sig.govbr_last_validated_at.is_some());
    }

    #[test]
    fn test_request_validation_returns_to_pending_and_clears_stamp() {
        let mut sig = govbr_signature();
        sig.complete_validation().unwrap();
        sig.request_validation().unwrap();
        assert_eq!(sig.status, SignatureStatus::Pending);
        assert!(sig.govbr_last_validated_at.is_none());
    }

    #[test]
    fn test_validation_rejected_for_custom() {
        let mut sig = custom_signature();
        assert_eq!(sig.complete_validation(), Err(SignatureError::NotGovbr));
        assert_eq!(sig.request_validation(), Err(SignatureError::NotGovbr));
    }

    // ── Revocation ───────────────────────────────────────────────────

    #[test]
    fn test_revoke_is_terminal() {
        let mut sig = govbr_signature();
        sig.revoke();
        assert!(sig.is_revoked());
        assert!(sig.deleted_at.is_some());
        assert!(matches!(
            sig.complete_validation(),
            Err(SignatureError::Revoked { .. })
        ));
        assert!(matches!(
            sig.request_validation(),
            Err(SignatureError::Revoked { .. })
        ));
    }

    #[test]
    fn test_revoke_applies_to_any_status() {
        let mut sig = custom_signature();
        assert_eq!(sig.status, SignatureStatus::Verified);
        sig.revoke();
        assert_eq!(sig.status, SignatureStatus::Revoked);
    }

    // ── Wire strings ─────────────────────────────────────────────────

    #[test]
    fn test_wire_strings_are_lowercase() {
        assert_eq!(SignatureType::Govbr.as_str(), "govbr");
        assert_eq!(SignatureStatus::Pending.as_str(), "pending");
        assert_eq!(SignatureStatus::parse("revoked"), Some(SignatureStatus::Revoked));
        assert_eq!(SignatureStatus::parse("REVOKED"), None);
        assert_eq!(SignatureType::parse("custom"), Some(SignatureType::Custom));
    }

    #[test]
    fn test_method_serializes_tagged() {
        let method = SignatureMethod::Govbr {
            identifier: "ana@gov.example".to_string(),
        };
        let json = serde_json::to_value(&method).unwrap();
        assert_eq!(json["type"], "govbr");
        assert_eq!(json["identifier"], "ana@gov.example");
    }

    #[test]
    fn test_signature_serde_roundtrip() {
        let sig = custom_signature();
        let json = serde_json::to_string(&sig).unwrap();
        let parsed: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.status, sig.status);
        assert_eq!(parsed.method, sig.method);
    }
}
