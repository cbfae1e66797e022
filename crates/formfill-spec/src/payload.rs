use std::borrow::Cow;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

/// Prefix every stored image payload is expected to carry.
pub const IMAGE_URI_PREFIX: &str = "data:image";

/// Fallback prefix applied when a stored payload lost its header.
const DEFAULT_PNG_PREFIX: &str = "data:image/png;base64,";

/// Encodes raw image bytes as a `data:` URI with the given MIME type.
pub fn encode_image(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Splits a `data:` URI into its MIME type and decoded bytes.
///
/// Returns `None` for values that are not base64 data-URIs or whose payload
/// fails to decode.
pub fn decode_image(uri: &str) -> Option<(String, Vec<u8>)> {
    let rest = uri.strip_prefix("data:")?;
    let (mime, encoded) = rest.split_once(";base64,")?;
    let bytes = STANDARD.decode(encoded.trim()).ok()?;
    Some((mime.to_string(), bytes))
}

/// Normalizes a stored payload so callers always see an image data-URI.
pub fn ensure_image_prefix(payload: &str) -> Cow<'_, str> {
    if payload.starts_with(IMAGE_URI_PREFIX) {
        Cow::Borrowed(payload)
    } else {
        Cow::Owned(format!("{DEFAULT_PNG_PREFIX}{payload}"))
    }
}
