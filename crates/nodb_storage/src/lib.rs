//! # NoDB Storage
//!
//! Storage adapter contract and implementations for NoDB.
//!
//! The record store keeps everything in memory and never performs I/O
//! itself. Durability is delegated to adapters attached to the store:
//! after every mutation the store hands each adapter a borrowed view of
//! its whole state, and the adapter decides what to do with it.
//!
//! ## Design Principles
//!
//! - Adapters see whole snapshots, never individual operations
//! - Adapters never hold a reference to the store
//! - `retrieve` is only called when a caller asks for it
//! - Adapters must be `Send` so a store can move across threads
//!
//! ## Available Adapters
//!
//! - [`InMemoryAdapter`] - For testing and ephemeral stores
//! - [`FileAdapter`] - Rewrites one file (JSON or CBOR) on every persist
//!
//! ## Example
//!
//! ```rust
//! use nodb_codec::{Snapshot, StoreConf};
//! use nodb_storage::{InMemoryAdapter, StorageAdapter};
//!
//! let mut adapter = InMemoryAdapter::new();
//! let snapshot = Snapshot::new(StoreConf::new(4), Vec::new());
//! adapter.persist(snapshot.view()).unwrap();
//!
//! let restored = adapter.retrieve().unwrap().unwrap();
//! assert_eq!(restored.conf.last_id, 4);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod adapter;
mod error;
mod file;
mod memory;

pub use adapter::StorageAdapter;
pub use error::{StorageError, StorageResult};
pub use file::FileAdapter;
pub use memory::InMemoryAdapter;
