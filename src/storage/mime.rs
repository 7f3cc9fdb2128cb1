use crate::models::ImagePayload;
use image::ImageFormat;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Content type to store the payload under.
///
/// A declared `image/*` type wins; otherwise the bytes are sniffed.
pub fn content_type_for(payload: &ImagePayload) -> String {
    if let Some(declared) = payload
        .content_type
        .as_deref()
        .filter(|ct| ct.starts_with("image/"))
    {
        return declared.to_string();
    }

    match image::guess_format(&payload.data) {
        Ok(format) => format.to_mime_type().to_string(),
        Err(_) => {
            tracing::warn!(
                "Unrecognized image format (first 4 bytes: {:02X?}), storing as {}",
                &payload.data[..payload.data.len().min(4)],
                FALLBACK_CONTENT_TYPE
            );
            FALLBACK_CONTENT_TYPE.to_string()
        }
    }
}

/// File extension (without the dot) matching a content type, if known.
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    ImageFormat::from_mime_type(content_type)
        .and_then(|format| format.extensions_str().first().copied())
}
