//! Error types for storage operations.

use nodb_codec::CodecError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Encoding or decoding a snapshot failed.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// The backing file holds no snapshot.
    #[error("no snapshot stored at {}", path.display())]
    Empty {
        /// The file that was read.
        path: PathBuf,
    },

    /// The adapter refused the request.
    #[error("adapter rejected request: {reason}")]
    Rejected {
        /// Why the request was refused.
        reason: String,
    },
}

impl StorageError {
    /// Creates an empty-medium error.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self::Empty { path: path.into() }
    }

    /// Creates a rejection error.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }
}
