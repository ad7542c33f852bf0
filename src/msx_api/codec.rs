//! JSON payload codec
//!
//! Request bodies are encoded to UTF-8 JSON bytes before they are handed to the
//! transport, and response bodies are decoded from raw bytes so the envelope
//! classifier sees exactly what the server sent.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::msx_api::types::MsxError;

/// Encode a payload as UTF-8 JSON bytes
///
/// Accepts anything serializable: a `serde_json::Map`, a `json!` value or a
/// record struct such as [`Credentials`](crate::Credentials).
pub fn encode<T: Serialize + ?Sized>(payload: &T) -> Result<Vec<u8>, MsxError> {
    serde_json::to_vec(payload)
        .map_err(|e| MsxError::Request(format!("Failed to encode payload: {}", e)))
}

/// Decode a response body into a generic JSON value
pub fn decode(raw: &[u8]) -> Result<serde_json::Value, MsxError> {
    decode_as(raw)
}

/// Decode a response body straight into a typed record
pub fn decode_as<T: DeserializeOwned>(raw: &[u8]) -> Result<T, MsxError> {
    serde_json::from_slice(raw).map_err(|e| {
        tracing::error!("Failed to decode response body: {}", e);
        MsxError::MalformedResponse(format!(
            "{} - Body: {}",
            e,
            truncate_body(&String::from_utf8_lossy(raw))
        ))
    })
}

/// Maximum length for response bodies echoed in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
}
