//! # NoDB Core
//!
//! In-memory record store for NoDB.
//!
//! This crate provides:
//! - [`RecordStore`] - schema-less records in insertion order with an
//!   identifier lookup, monotonic identifiers, merge/overwrite updates and
//!   soft or hard deletes
//! - Linear scan queries that return position-annotated copies
//! - Snapshot import and export (JSON, CBOR, files)
//! - Fan-out persistence to attached [`StorageAdapter`]s after every
//!   mutation
//!
//! ## Example
//!
//! ```rust
//! use nodb_core::{InMemoryAdapter, RecordData, RecordStore};
//!
//! let backup = InMemoryAdapter::new();
//! let mut store = RecordStore::new();
//! store.attach(backup.clone()).unwrap();
//!
//! let a = store.put(RecordData::new().field("name", "a")).unwrap();
//! store.put(RecordData::new().field("name", "b")).unwrap();
//! store.remove(a.id()).unwrap();
//!
//! let mut restored = RecordStore::new();
//! restored.load_from(&mut backup.clone()).unwrap();
//! assert_eq!(restored.len(), 1);
//! assert_eq!(restored.last_id().as_u64(), 2);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod stats;
mod store;
mod table;

pub use config::{Config, PersistFailurePolicy};
pub use error::{CoreError, CoreResult};
pub use stats::{StatsSnapshot, StoreStats};
pub use store::{AdapterId, RecordStore};
pub use table::RecordMut;

pub use nodb_codec::{
    Fields, Format, IndexedRecord, Record, RecordData, RecordId, Snapshot, SnapshotRef,
    StoreConf, Timestamp, Value,
};
pub use nodb_storage::{FileAdapter, InMemoryAdapter, StorageAdapter, StorageError};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
