//! Snapshot encoders.

use crate::error::{CodecError, CodecResult};
use serde::Serialize;

/// Encode a value as compact JSON text.
///
/// # Errors
///
/// Returns an error if the value cannot be represented in JSON
/// (for example a map with non-string keys).
pub fn to_json<T>(value: &T) -> CodecResult<String>
where
    T: Serialize + ?Sized,
{
    serde_json::to_string(value).map_err(|e| CodecError::json_encode(e.to_string()))
}

/// Encode a value as indented JSON text.
///
/// # Errors
///
/// Returns an error if the value cannot be represented in JSON.
pub fn to_json_pretty<T>(value: &T) -> CodecResult<String>
where
    T: Serialize + ?Sized,
{
    serde_json::to_string_pretty(value).map_err(|e| CodecError::json_encode(e.to_string()))
}

/// Encode a value as CBOR bytes.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_cbor<T>(value: &T) -> CodecResult<Vec<u8>>
where
    T: Serialize + ?Sized,
{
    let mut buffer = Vec::new();
    ciborium::into_writer(value, &mut buffer).map_err(|e| CodecError::cbor_encode(e.to_string()))?;
    Ok(buffer)
}
