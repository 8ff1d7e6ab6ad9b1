//! Snapshot decoders.

use crate::error::{CodecError, CodecResult};
use serde::de::DeserializeOwned;

/// Decode a value from JSON text.
///
/// # Errors
///
/// Returns an error carrying the line and column of the first problem.
pub fn from_json<T: DeserializeOwned>(text: &str) -> CodecResult<T> {
    serde_json::from_str(text).map_err(|e| CodecError::json_decode(&e))
}

/// Decode a value from JSON bytes (UTF-8).
///
/// # Errors
///
/// Returns an error if the bytes are not valid JSON for `T`.
pub fn from_json_slice<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<T> {
    serde_json::from_slice(bytes).map_err(|e| CodecError::json_decode(&e))
}

/// Decode a value from CBOR bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not valid CBOR for `T`.
pub fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<T> {
    ciborium::from_reader(bytes).map_err(|e| CodecError::cbor_decode(e.to_string()))
}
