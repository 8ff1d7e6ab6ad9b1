//! In-memory storage adapter for testing.

use crate::adapter::StorageAdapter;
use crate::error::StorageResult;
use nodb_codec::{Format, Snapshot, SnapshotRef};
use parking_lot::RwLock;
use std::sync::Arc;

/// An in-memory storage adapter.
///
/// Persisted snapshots are encoded and kept as bytes, so a retrieve goes
/// through the same decode path as a file would. Suitable for:
/// - Unit tests
/// - Integration tests
/// - Stores that only need a copy to restore from within a process
///
/// # Shared State
///
/// Clones share the same buffer. Keep a clone before attaching the
/// adapter to a store to observe what the store persisted.
///
/// # Example
///
/// ```rust
/// use nodb_codec::{Snapshot, StoreConf};
/// use nodb_storage::{InMemoryAdapter, StorageAdapter};
///
/// let observer = InMemoryAdapter::new();
/// let mut attached = observer.clone();
/// attached.persist(Snapshot::new(StoreConf::new(1), Vec::new()).view()).unwrap();
/// assert_eq!(observer.persist_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryAdapter {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    format: Format,
    bytes: Option<Vec<u8>>,
    initialized: bool,
    persist_count: u64,
}

impl InMemoryAdapter {
    /// Creates an empty adapter that encodes as compact JSON.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty adapter using the given encoding.
    #[must_use]
    pub fn with_format(format: Format) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                format,
                ..Inner::default()
            })),
        }
    }

    /// Creates an adapter preloaded with a snapshot.
    ///
    /// Useful for testing restore paths.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be encoded.
    pub fn with_snapshot(snapshot: &Snapshot) -> StorageResult<Self> {
        let adapter = Self::new();
        adapter.store(snapshot.view())?;
        Ok(adapter)
    }

    /// Returns a copy of the last persisted bytes.
    #[must_use]
    pub fn bytes(&self) -> Option<Vec<u8>> {
        self.inner.read().bytes.clone()
    }

    /// Decodes the last persisted snapshot without counting as a retrieve.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored bytes do not decode.
    pub fn snapshot(&self) -> StorageResult<Option<Snapshot>> {
        let inner = self.inner.read();
        match &inner.bytes {
            Some(bytes) => Ok(Some(inner.format.decode(bytes)?)),
            None => Ok(None),
        }
    }

    /// Returns how many times `persist` succeeded.
    #[must_use]
    pub fn persist_count(&self) -> u64 {
        self.inner.read().persist_count
    }

    /// Returns true once `initialize` has been called.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.inner.read().initialized
    }

    /// Drops the stored bytes.
    pub fn clear(&self) {
        self.inner.write().bytes = None;
    }

    fn store(&self, snapshot: SnapshotRef<'_>) -> StorageResult<()> {
        let mut inner = self.inner.write();
        let bytes = inner.format.encode(&snapshot)?;
        inner.bytes = Some(bytes);
        Ok(())
    }
}

impl StorageAdapter for InMemoryAdapter {
    fn name(&self) -> &str {
        "memory"
    }

    fn initialize(&mut self, _snapshot: SnapshotRef<'_>) -> StorageResult<()> {
        self.inner.write().initialized = true;
        Ok(())
    }

    fn persist(&mut self, snapshot: SnapshotRef<'_>) -> StorageResult<()> {
        self.store(snapshot)?;
        self.inner.write().persist_count += 1;
        Ok(())
    }

    fn retrieve(&mut self) -> StorageResult<Option<Snapshot>> {
        self.snapshot()
    }
}
