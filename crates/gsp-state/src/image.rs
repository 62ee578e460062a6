//! # Signature Image Validation
//!
//! Custom signatures arrive as base64 data URLs captured from a canvas
//! or file upload. The image is stored as text, so the size check works
//! on the encoded payload without decoding it: the decoded byte count of
//! a base64 string of length `n` with `p` padding characters is
//! `ceil(n * 3 / 4) - p`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum decoded image size in bytes (500 KB).
pub const MAX_IMAGE_BYTES: usize = 512_000;

/// Maximum accepted width/height in pixels. Values outside `[1, 2000]`
/// are clamped.
pub const MAX_DIMENSION: i64 = 2000;

const ACCEPTED_PREFIXES: [(&str, &str); 3] = [
    ("data:image/png;base64,", "image/png"),
    ("data:image/jpeg;base64,", "image/jpeg"),
    ("data:image/jpg;base64,", "image/jpeg"),
];

/// Errors rejecting a signature image payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    /// Not a PNG/JPEG base64 data URL.
    #[error("signature image must be a base64 data URL of type image/png or image/jpeg")]
    UnsupportedFormat,

    /// The base64 payload is empty.
    #[error("signature image is empty")]
    Empty,

    /// The decoded image exceeds [`MAX_IMAGE_BYTES`].
    #[error("signature image is {size} bytes, above the {MAX_IMAGE_BYTES} byte limit")]
    TooLarge {
        /// Decoded size in bytes.
        size: usize,
    },
}

/// A validated signature image.
///
/// Constructed only through [`SignatureImage::parse`], so a held value
/// is always a supported format within the size limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureImage {
    /// The full data URL, stored as-is.
    pub data_url: String,
    /// MIME type extracted from the data URL prefix.
    pub mime: String,
    /// Display width in pixels, when the client reported one.
    pub width: Option<u32>,
    /// Display height in pixels, when the client reported one.
    pub height: Option<u32>,
}

impl SignatureImage {
    /// Validate a data URL and optional client-reported dimensions.
    ///
    /// # Errors
    ///
    /// Rejects payloads that are not PNG/JPEG data URLs, have an empty
    /// base64 body, or decode to more than [`MAX_IMAGE_BYTES`] bytes.
    pub fn parse(
        data_url: &str,
        width: Option<i64>,
        height: Option<i64>,
    ) -> Result<Self, ImageError> {
        let (mime, payload) = ACCEPTED_PREFIXES
            .iter()
            .find_map(|(prefix, mime)| data_url.strip_prefix(prefix).map(|rest| (*mime, rest)))
            .ok_or(ImageError::UnsupportedFormat)?;

        let size = decoded_size(payload);
        if size == 0 {
            return Err(ImageError::Empty);
        }
        if size > MAX_IMAGE_BYTES {
            return Err(ImageError::TooLarge { size });
        }

        Ok(Self {
            data_url: data_url.to_string(),
            mime: mime.to_string(),
            width: width.map(clamp_dimension),
            height: height.map(clamp_dimension),
        })
    }

    /// Decoded size of the stored payload in bytes.
    pub fn size_bytes(&self) -> usize {
        let payload = self
            .data_url
            .split_once(',')
            .map(|(_, p)| p)
            .unwrap_or_default();
        decoded_size(payload)
    }
}

/// Decoded byte count of a base64 payload, without decoding it.
///
/// Degenerate bodies with more padding than content floor to zero,
/// which [`SignatureImage::parse`] rejects as [`ImageError::Empty`].
fn decoded_size(payload: &str) -> usize {
    let padding = payload.chars().rev().take_while(|c| *c == '=').count();
    (payload.len() * 3).div_ceil(4).saturating_sub(padding)
}

fn clamp_dimension(value: i64) -> u32 {
    value.clamp(1, MAX_DIMENSION) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_data_url(payload: &str) -> String {
        format!("data:image/png;base64,{payload}")
    }

    #[test]
    fn test_accepts_png_and_jpeg() {
        let png = SignatureImage::parse(&png_data_url("aGVsbG8="), None, None).unwrap();
        assert_eq!(png.mime, "image/png");

        let jpeg =
            SignatureImage::parse("data:image/jpeg;base64,aGVsbG8=", None, None).unwrap();
        assert_eq!(jpeg.mime, "image/jpeg");

        // jpg alias normalizes to image/jpeg
        let jpg = SignatureImage::parse("data:image/jpg;base64,aGVsbG8=", None, None).unwrap();
        assert_eq!(jpg.mime, "image/jpeg");
    }

    #[test]
    fn test_rejects_other_formats() {
        assert_eq!(
            SignatureImage::parse("data:image/gif;base64,aGVsbG8=", None, None),
            Err(ImageError::UnsupportedFormat)
        );
        assert_eq!(
            SignatureImage::parse("aGVsbG8=", None, None),
            Err(ImageError::UnsupportedFormat)
        );
        assert_eq!(
            SignatureImage::parse("data:text/plain;base64,aGVsbG8=", None, None),
            Err(ImageError::UnsupportedFormat)
        );
    }

    #[test]
    fn test_rejects_empty_payload() {
        assert_eq!(
            SignatureImage::parse(&png_data_url(""), None, None),
            Err(ImageError::Empty)
        );
    }

    #[test]
    fn test_all_padding_payload_is_rejected_as_empty() {
        assert_eq!(decoded_size("===="), 0);
        assert_eq!(
            SignatureImage::parse(&png_data_url("===="), None, None),
            Err(ImageError::Empty)
        );
        assert_eq!(
            SignatureImage::parse(&png_data_url("="), None, None),
            Err(ImageError::Empty)
        );
    }

    #[test]
    fn test_decoded_size_accounts_for_padding() {
        // "hello" → "aGVsbG8=" (8 chars, 1 padding) → 5 bytes
        assert_eq!(decoded_size("aGVsbG8="), 5);
        // "hell" → "aGVsbA==" (8 chars, 2 padding) → 4 bytes
        assert_eq!(decoded_size("aGVsbA=="), 4);
        // "helloo" → "aGVsbG9v" (8 chars, no padding) → 6 bytes
        assert_eq!(decoded_size("aGVsbG9v"), 6);
    }

    #[test]
    fn test_rejects_oversized_payload() {
        // 682_668 base64 chars decode to 512_001 bytes, one over the cap.
        let over = "A".repeat(682_668);
        match SignatureImage::parse(&png_data_url(&over), None, None) {
            Err(ImageError::TooLarge { size }) => assert!(size > MAX_IMAGE_BYTES),
            other => panic!("expected TooLarge, got {other:?}"),
        }
    }

    #[test]
    fn test_accepts_payload_at_limit() {
        // ceil(682_666 * 3 / 4) = 512_000, exactly at the cap.
        let at_limit = "A".repeat(682_666);
        let image = SignatureImage::parse(&png_data_url(&at_limit), None, None).unwrap();
        assert_eq!(image.size_bytes(), MAX_IMAGE_BYTES);
    }

    #[test]
    fn test_dimensions_are_clamped() {
        let image =
            SignatureImage::parse(&png_data_url("aGVsbG8="), Some(0), Some(9_999)).unwrap();
        assert_eq!(image.width, Some(1));
        assert_eq!(image.height, Some(2000));

        let image = SignatureImage::parse(&png_data_url("aGVsbG8="), Some(640), None).unwrap();
        assert_eq!(image.width, Some(640));
        assert_eq!(image.height, None);
    }
}
