//! # gsp-state — Signature Domain
//!
//! The signature lifecycle for commercial proposals: a signer registers
//! with either a Gov.br identifier (verified externally, starts
//! `pending`) or a drawn/uploaded signature image (trusted immediately,
//! starts `verified`). Revocation is the soft-delete path and is
//! terminal.
//!
//! Modules:
//!
//! - [`signature`] — `Signature` record, `SignatureMethod` union, and
//!   the `pending`/`verified`/`revoked` status machine.
//! - [`image`] — base64 data-URL signature image validation.
//! - [`draft`] — field-scoped validation of the flat API payload into a
//!   well-formed [`draft::SignatureDraft`].

pub mod draft;
pub mod image;
pub mod signature;

pub use draft::{SignatureDraft, SignatureInput};
pub use image::{ImageError, SignatureImage, MAX_IMAGE_BYTES};
pub use signature::{Signature, SignatureError, SignatureMethod, SignatureStatus, SignatureType};
