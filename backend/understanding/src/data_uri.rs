//! Data-URI decoding for inline images.

use base64::{engine::general_purpose::STANDARD, Engine};
use once_cell::sync::Lazy;
use regex::Regex;

use receiptforge_core::{ImagePayload, ReceiptError, DEFAULT_IMAGE_MIME_TYPE};

static DATA_URI_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^data:(.+);base64,(.+)$").unwrap());

/// Split an image string into MIME type and base64 payload.
///
/// `data:<mime>;base64,<payload>` yields its parts; anything else is taken
/// as a bare payload of type `image/jpeg`. The payload itself is not checked.
pub fn decode_image(image: &str) -> ImagePayload {
    match DATA_URI_PATTERN.captures(image) {
        Some(caps) => ImagePayload::new(&caps[1], &caps[2]),
        None => ImagePayload::new(DEFAULT_IMAGE_MIME_TYPE, image),
    }
}

/// Decode the payload and reject it if it is not base64 or exceeds `limit` bytes.
///
/// Whitespace inside the payload (line-wrapped base64) is ignored.
pub fn check_image_size(payload: &ImagePayload, limit: usize) -> Result<usize, ReceiptError> {
    let compact: Vec<u8> = payload
        .data
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    // Cheap bound before decoding: 4 base64 chars carry at most 3 bytes.
    if compact.len() / 4 * 3 > limit.saturating_add(2) {
        return Err(ReceiptError::ImageTooLarge { limit });
    }

    let decoded = STANDARD
        .decode(&compact)
        .map_err(|e| ReceiptError::InvalidImage(e.to_string()))?;
    if decoded.len() > limit {
        return Err(ReceiptError::ImageTooLarge { limit });
    }
    Ok(decoded.len())
}
