//! Storage adapter trait definition.

use crate::error::StorageResult;
use nodb_codec::{Snapshot, SnapshotRef};

/// A persistence target for a record store.
///
/// Adapters receive the store's full state as a borrowed [`SnapshotRef`];
/// they do not see which operation caused the notification. The store
/// owns all record semantics - adapters only move snapshots to and from
/// their medium.
///
/// # Call Protocol
///
/// - `initialize` is called exactly once, when the adapter is attached.
///   An error refuses the attachment and the adapter is dropped.
/// - `persist` is called after every mutating store operation, in
///   attachment order.
/// - `retrieve` is called only when a caller explicitly loads the store
///   from this adapter. It is never called as a side effect of a mutation.
///
/// # Implementors
///
/// - [`super::InMemoryAdapter`] - For testing
/// - [`super::FileAdapter`] - For persistent storage
pub trait StorageAdapter: Send {
    /// Returns a short label used in logs and errors.
    fn name(&self) -> &str;

    /// Prepares the adapter for use with a store.
    ///
    /// `snapshot` is the store's state at attach time.
    ///
    /// # Errors
    ///
    /// Returns an error if the adapter cannot serve the store (for example
    /// its target directory does not exist).
    fn initialize(&mut self, snapshot: SnapshotRef<'_>) -> StorageResult<()> {
        let _ = snapshot;
        Ok(())
    }

    /// Writes the store's current state to the backing medium.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the write fails.
    fn persist(&mut self, snapshot: SnapshotRef<'_>) -> StorageResult<()>;

    /// Reads a previously persisted state from the backing medium.
    ///
    /// Returns `None` if the medium holds nothing yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or the stored bytes are malformed.
    fn retrieve(&mut self) -> StorageResult<Option<Snapshot>>;
}

impl<A: StorageAdapter + ?Sized> StorageAdapter for Box<A> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn initialize(&mut self, snapshot: SnapshotRef<'_>) -> StorageResult<()> {
        (**self).initialize(snapshot)
    }

    fn persist(&mut self, snapshot: SnapshotRef<'_>) -> StorageResult<()> {
        (**self).persist(snapshot)
    }

    fn retrieve(&mut self) -> StorageResult<Option<Snapshot>> {
        (**self).retrieve()
    }
}
