//! Response envelope classification
//!
//! Every endpoint answers with one of three shapes: the endpoint's success
//! record, a failure envelope `{"error": "..."}`, or something unrecognized.
//! Keys are checked in a fixed order:
//!
//! 1. a `message` key with a body matching the success record: success
//! 2. a string `error` key: failure
//! 3. any other body matching the success record: success
//! 4. anything else: unrecognized
//!
//! So `message` beats `error`, and `error` beats every other success record.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::msx_api::codec;
use crate::msx_api::types::{ApiError, ApiMessage, MsxError, UNAUTHORIZED_PHRASE};

/// A decoded response body
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope<T> {
    /// The endpoint's success record
    Success(T),
    /// A recognized failure envelope
    Failure(ApiError),
    /// Valid JSON of any other shape
    Unrecognized(serde_json::Value),
}

impl<T: DeserializeOwned> Envelope<T> {
    /// Decode a raw body. Only invalid JSON fails here; any valid JSON
    /// lands in one of the three variants.
    pub fn from_slice(raw: &[u8]) -> Result<Self, MsxError> {
        Ok(Self::from_value(codec::decode(raw)?))
    }

    /// Classify an already parsed JSON value
    pub fn from_value(value: serde_json::Value) -> Self {
        let Some(object) = value.as_object() else {
            return Envelope::Unrecognized(value);
        };

        let success = || T::deserialize(&value).ok();

        if object.contains_key("message") {
            if let Some(record) = success() {
                return Envelope::Success(record);
            }
        }

        if let Ok(error) = ApiError::deserialize(&value) {
            return Envelope::Failure(error);
        }

        match success() {
            Some(record) => Envelope::Success(record),
            None => Envelope::Unrecognized(value),
        }
    }

    /// Turn the envelope into the caller's result
    ///
    /// `context` is appended to the "Unknown response" message when the
    /// body matched neither the success record nor the failure envelope.
    pub fn into_result(self, context: Option<&str>) -> Result<T, MsxError> {
        match self {
            Envelope::Success(value) => Ok(value),
            Envelope::Failure(error) => Err(classify_error(error)),
            Envelope::Unrecognized(body) => {
                tracing::error!("Unrecognized response body: {}", body);
                Err(MsxError::ApiResponse(ApiError::unknown_response(context)))
            }
        }
    }
}

/// Map a failure envelope onto the error taxonomy
///
/// Authorization denials become [`MsxError::InvalidToken`] so callers can
/// re-authenticate instead of retrying; anything else is an API response error.
pub fn classify_error(error: ApiError) -> MsxError {
    if error.error.contains(UNAUTHORIZED_PHRASE) {
        tracing::error!("Request rejected as unauthorized: {}", error.error);
        MsxError::InvalidToken
    } else {
        tracing::error!("API returned error: {}", error.error);
        MsxError::ApiResponse(error)
    }
}

/// Decode and classify a raw body in one step
pub fn classify<T: DeserializeOwned>(raw: &[u8], context: Option<&str>) -> Result<T, MsxError> {
    Envelope::<T>::from_slice(raw)?.into_result(context)
}

/// Classify a body against the generic `{"message": ...}` success envelope
pub fn classify_message(raw: &[u8]) -> Result<ApiMessage, MsxError> {
    classify(raw, None)
}
