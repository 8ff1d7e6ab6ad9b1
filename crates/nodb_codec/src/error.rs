//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur during encoding or decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Failed to encode a value to JSON.
    #[error("JSON encoding failed: {message}")]
    JsonEncode {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to decode JSON text.
    #[error("JSON decoding failed at line {line}, column {column}: {message}")]
    JsonDecode {
        /// Description of the decoding error.
        message: String,
        /// Line of the offending input (1-based, 0 when unknown).
        line: usize,
        /// Column of the offending input (1-based, 0 when unknown).
        column: usize,
    },

    /// Failed to encode a value to CBOR.
    #[error("CBOR encoding failed: {message}")]
    CborEncode {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to decode CBOR bytes.
    #[error("CBOR decoding failed: {message}")]
    CborDecode {
        /// Description of the decoding error.
        message: String,
    },

    /// A record identifier is not a non-negative integer.
    #[error("invalid record id: {value}")]
    InvalidId {
        /// The offending value, as JSON text.
        value: String,
    },
}

impl CodecError {
    /// Create a JSON encoding error.
    pub fn json_encode(message: impl Into<String>) -> Self {
        Self::JsonEncode {
            message: message.into(),
        }
    }

    /// Create a CBOR encoding error.
    pub fn cbor_encode(message: impl Into<String>) -> Self {
        Self::CborEncode {
            message: message.into(),
        }
    }

    /// Create a CBOR decoding error.
    pub fn cbor_decode(message: impl Into<String>) -> Self {
        Self::CborDecode {
            message: message.into(),
        }
    }

    /// Create an invalid identifier error.
    pub fn invalid_id(value: &serde_json::Value) -> Self {
        Self::InvalidId {
            value: value.to_string(),
        }
    }

    /// Returns true if the error happened while reading input.
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            Self::JsonDecode { .. } | Self::CborDecode { .. } | Self::InvalidId { .. }
        )
    }

    /// Create a JSON decoding error, keeping the parser's position.
    pub fn json_decode(err: &serde_json::Error) -> Self {
        Self::JsonDecode {
            message: err.to_string(),
            line: err.line(),
            column: err.column(),
        }
    }
}
