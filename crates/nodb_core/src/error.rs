//! Error types for NoDB core.

use nodb_codec::{CodecError, RecordId};
use nodb_storage::StorageError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in record store operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No record with this identifier exists.
    #[error("record not found: {id}")]
    NotFound {
        /// The identifier that was looked up.
        id: RecordId,
    },

    /// The operation needs an identifier and the input carried none.
    #[error("{operation} requires a record id")]
    MissingId {
        /// Name of the operation.
        operation: &'static str,
    },

    /// An adapter failed to initialize and was not attached.
    #[error("invalid adapter '{adapter}': {source}")]
    InvalidAdapter {
        /// Name reported by the adapter.
        adapter: String,
        /// Why initialization failed.
        #[source]
        source: StorageError,
    },

    /// A snapshot being loaded contains the same identifier twice.
    #[error("duplicate record id {id} in snapshot")]
    DuplicateId {
        /// The repeated identifier.
        id: RecordId,
    },

    /// No identifier is left to allocate after `id`.
    ///
    /// Returned by an insert once the counter reaches the top of the
    /// identifier range, and by a load whose records hold that identifier.
    #[error("record id space exhausted after {id}")]
    IdSpaceExhausted {
        /// The largest identifier that was reached.
        id: RecordId,
    },

    /// An adapter failed to persist.
    ///
    /// Only returned under [`crate::PersistFailurePolicy::Propagate`]. The
    /// in-memory change that triggered the notification has been applied.
    #[error("adapter '{adapter}' failed to persist: {source}")]
    Persist {
        /// Name reported by the adapter.
        adapter: String,
        /// The adapter's error.
        #[source]
        source: StorageError,
    },

    /// Storage error outside the persist path (import, export, load).
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Encoding or decoding error.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

impl CoreError {
    /// Creates a not-found error.
    pub fn not_found(id: RecordId) -> Self {
        Self::NotFound { id }
    }

    /// Creates a missing-id error.
    pub fn missing_id(operation: &'static str) -> Self {
        Self::MissingId { operation }
    }

    /// Returns true for [`CoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
