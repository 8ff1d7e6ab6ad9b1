//! Store statistics.
//!
//! Counters for monitoring how a store is used and how its adapters
//! behave.
//!
//! # Usage
//!
//! ```rust
//! use nodb_core::{RecordData, RecordStore};
//!
//! let mut store = RecordStore::new();
//! store.put(RecordData::new().field("name", "a")).unwrap();
//!
//! let stats = store.stats().snapshot();
//! assert_eq!(stats.inserts, 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Store statistics.
///
/// Counters are atomic so they can be read through a shared reference
/// while the store is borrowed elsewhere. Values only increase.
#[derive(Debug, Default)]
pub struct StoreStats {
    // Mutation counters
    /// Records created by `put`.
    inserts: AtomicU64,
    /// Field merges by `put`.
    updates: AtomicU64,
    /// Full replacements by `overwrite`.
    overwrites: AtomicU64,
    /// Records physically removed.
    hard_removes: AtomicU64,
    /// Records stamped as removed in place.
    soft_removes: AtomicU64,

    // Read counters
    /// Point lookups by identifier.
    lookups: AtomicU64,
    /// Linear scans (`find`, `find_one`, `for_each`).
    scans: AtomicU64,

    // Persistence counters
    /// Successful adapter persists.
    persists: AtomicU64,
    /// Failed adapter persists.
    persist_failures: AtomicU64,
    /// Snapshots loaded.
    loads: AtomicU64,
}

impl StoreStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_update(&self) {
        self.updates.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_overwrite(&self) {
        self.overwrites.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_remove(&self, soft: bool) {
        if soft {
            self.soft_removes.fetch_add(1, Ordering::Relaxed);
        } else {
            self.hard_removes.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_lookup(&self) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_scan(&self) {
        self.scans.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_persist(&self) {
        self.persists.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_persist_failure(&self) {
        self.persist_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_load(&self) {
        self.loads.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of records created.
    pub fn inserts(&self) -> u64 {
        self.inserts.load(Ordering::Relaxed)
    }

    /// Returns the number of field merges.
    pub fn updates(&self) -> u64 {
        self.updates.load(Ordering::Relaxed)
    }

    /// Returns the number of full replacements.
    pub fn overwrites(&self) -> u64 {
        self.overwrites.load(Ordering::Relaxed)
    }

    /// Returns the number of hard removes.
    pub fn hard_removes(&self) -> u64 {
        self.hard_removes.load(Ordering::Relaxed)
    }

    /// Returns the number of soft removes.
    pub fn soft_removes(&self) -> u64 {
        self.soft_removes.load(Ordering::Relaxed)
    }

    /// Returns the number of point lookups.
    pub fn lookups(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }

    /// Returns the number of linear scans.
    ///
    /// Every scan visits records in order until it is done; there is no
    /// secondary index.
    pub fn scans(&self) -> u64 {
        self.scans.load(Ordering::Relaxed)
    }

    /// Returns the number of successful adapter persists.
    pub fn persists(&self) -> u64 {
        self.persists.load(Ordering::Relaxed)
    }

    /// Returns the number of failed adapter persists.
    pub fn persist_failures(&self) -> u64 {
        self.persist_failures.load(Ordering::Relaxed)
    }

    /// Returns the number of snapshot loads.
    pub fn loads(&self) -> u64 {
        self.loads.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all stats.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            inserts: self.inserts(),
            updates: self.updates(),
            overwrites: self.overwrites(),
            hard_removes: self.hard_removes(),
            soft_removes: self.soft_removes(),
            lookups: self.lookups(),
            scans: self.scans(),
            persists: self.persists(),
            persist_failures: self.persist_failures(),
            loads: self.loads(),
        }
    }
}

/// A point-in-time copy of [`StoreStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Records created.
    pub inserts: u64,
    /// Field merges.
    pub updates: u64,
    /// Full replacements.
    pub overwrites: u64,
    /// Hard removes.
    pub hard_removes: u64,
    /// Soft removes.
    pub soft_removes: u64,
    /// Point lookups.
    pub lookups: u64,
    /// Linear scans.
    pub scans: u64,
    /// Successful adapter persists.
    pub persists: u64,
    /// Failed adapter persists.
    pub persist_failures: u64,
    /// Snapshot loads.
    pub loads: u64,
}
