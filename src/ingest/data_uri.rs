//! Decoding and validation of `data:` image references.

use super::mime::{detect_image_mime, is_supported};
use crate::IngestError;
use base64::Engine as _;

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub bytes: Vec<u8>,
    pub mime: String,
}

/// Decode a base64 data URI, enforcing the supported type set and `max_size`.
///
/// The sniffed type wins over the declared one when the magic bytes are recognised.
pub fn decode_image(reference: &str, max_size: usize) -> Result<DecodedImage, IngestError> {
    let rest = reference
        .strip_prefix("data:")
        .ok_or_else(|| IngestError::InvalidReference("only data URIs are supported".to_string()))?;

    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| IngestError::InvalidReference("data URI has no payload".to_string()))?;

    let mut params = header.split(';');
    let declared = params.next().unwrap_or_default().trim().to_ascii_lowercase();
    if !params.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
        return Err(IngestError::InvalidReference(
            "data URI is not base64 encoded".to_string(),
        ));
    }

    let payload: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    // Lower bound of the decoded size; lets oversize payloads skip decoding entirely.
    let min_decoded = (payload.len() / 4 * 3).saturating_sub(2);
    if min_decoded > max_size {
        return Err(IngestError::TooLarge {
            size: min_decoded,
            limit: max_size,
        });
    }

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.as_bytes())
        .or_else(|_| base64::engine::general_purpose::STANDARD_NO_PAD.decode(payload.as_bytes()))
        .map_err(|e| IngestError::InvalidReference(format!("invalid base64 payload: {}", e)))?;

    if bytes.len() > max_size {
        return Err(IngestError::TooLarge {
            size: bytes.len(),
            limit: max_size,
        });
    }

    let mime = match detect_image_mime(&bytes) {
        Some(sniffed) => sniffed.to_string(),
        None => declared,
    };
    if !is_supported(&mime) {
        return Err(IngestError::UnsupportedMimeType(mime));
    }

    Ok(DecodedImage { bytes, mime })
}
