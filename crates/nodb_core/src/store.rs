//! Record store for CRUD operations.

use crate::config::{Config, PersistFailurePolicy};
use crate::error::{CoreError, CoreResult};
use crate::stats::StoreStats;
use crate::table::{RecordMut, RecordTable};
use nodb_codec::{
    from_cbor, from_json, to_cbor, to_json, to_json_pretty, IndexedRecord, Record, RecordData,
    RecordId, Snapshot, SnapshotRef, StoreConf, Timestamp,
};
use nodb_storage::{FileAdapter, StorageAdapter, StorageError};
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

/// Handle for an attached adapter, used to detach it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AdapterId(u64);

struct Attached {
    id: AdapterId,
    adapter: Box<dyn StorageAdapter>,
}

/// An in-memory record store with pluggable persistence.
///
/// `RecordStore` keeps records in insertion order together with an
/// identifier lookup, allocates identifiers, and notifies every attached
/// [`StorageAdapter`] after each mutation. It never performs I/O itself.
///
/// # Reads
///
/// - [`get`](Self::get) and [`get_mut`](Self::get_mut) return live
///   references into the store. Edits through `get_mut` are not persisted
///   until [`write`](Self::write) or the next mutation.
/// - [`find`](Self::find) and [`find_one`](Self::find_one) return copies
///   annotated with their position; editing them never affects the store.
///
/// # Concurrency
///
/// Mutating methods take `&mut self`. A store shared between threads needs
/// an outer lock.
///
/// # Example
///
/// ```rust
/// use nodb_core::{RecordData, RecordStore};
///
/// let mut store = RecordStore::new();
/// let alice = store.put(RecordData::new().field("name", "alice")).unwrap();
///
/// store.put(RecordData::with_id(alice.id()).field("age", 30)).unwrap();
///
/// let found = store.find_one(|r, _| r.get("age").is_some(), false).unwrap();
/// assert_eq!(found.index, 0);
/// assert_eq!(found.get("name").unwrap(), "alice");
/// ```
pub struct RecordStore {
    /// Configuration.
    config: Config,
    /// Persisted configuration (next identifier).
    conf: StoreConf,
    /// Records and identifier lookup.
    table: RecordTable,
    /// Adapters in notification order.
    adapters: Vec<Attached>,
    /// Next adapter handle.
    next_adapter: u64,
    /// Usage counters.
    stats: StoreStats,
}

impl RecordStore {
    /// Creates an empty store with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates an empty store with the given configuration.
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            conf: StoreConf::default(),
            table: RecordTable::new(),
            adapters: Vec::new(),
            next_adapter: 0,
            stats: StoreStats::new(),
        }
    }

    /// Returns usage counters.
    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }

    /// Returns the identifier the next insert will receive.
    pub fn last_id(&self) -> RecordId {
        self.conf.next_id()
    }

    // === Adapters ===

    /// Attaches an adapter.
    ///
    /// The adapter is initialized with the current state. Adapters are
    /// notified in attachment order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidAdapter`] if initialization fails. The
    /// adapter is dropped and the store is unchanged.
    pub fn attach<A>(&mut self, adapter: A) -> CoreResult<AdapterId>
    where
        A: StorageAdapter + 'static,
    {
        let mut adapter: Box<dyn StorageAdapter> = Box::new(adapter);
        if let Err(source) = adapter.initialize(self.view()) {
            warn!(adapter = adapter.name(), error = %source, "adapter refused");
            return Err(CoreError::InvalidAdapter {
                adapter: adapter.name().to_string(),
                source,
            });
        }

        let id = AdapterId(self.next_adapter);
        self.next_adapter += 1;
        info!(adapter = adapter.name(), position = self.adapters.len(), "adapter attached");
        self.adapters.push(Attached { id, adapter });
        Ok(id)
    }

    /// Detaches an adapter, returning it.
    pub fn detach(&mut self, id: AdapterId) -> Option<Box<dyn StorageAdapter>> {
        let position = self.adapters.iter().position(|a| a.id == id)?;
        let attached = self.adapters.remove(position);
        info!(adapter = attached.adapter.name(), "adapter detached");
        Some(attached.adapter)
    }

    /// Returns the number of attached adapters.
    pub fn adapter_count(&self) -> usize {
        self.adapters.len()
    }

    /// Notifies every adapter to persist the current state.
    ///
    /// Mutating operations call this themselves; call it directly after
    /// editing records through [`get_mut`](Self::get_mut).
    ///
    /// # Errors
    ///
    /// Under [`PersistFailurePolicy::Propagate`], returns the first adapter
    /// failure after all adapters have been notified.
    pub fn write(&mut self) -> CoreResult<()> {
        self.notify("write")
    }

    fn notify(&mut self, operation: &'static str) -> CoreResult<()> {
        let snapshot = SnapshotRef::new(&self.conf, self.table.as_slice());
        let mut first_error = None;

        for attached in &mut self.adapters {
            let adapter = &mut attached.adapter;
            match adapter.persist(snapshot) {
                Ok(()) => {
                    self.stats.record_persist();
                    debug!(adapter = adapter.name(), operation, "persisted");
                }
                Err(source) => {
                    self.stats.record_persist_failure();
                    warn!(adapter = adapter.name(), operation, error = %source, "persist failed");
                    if self.config.persist_failures == PersistFailurePolicy::Propagate
                        && first_error.is_none()
                    {
                        first_error = Some(CoreError::Persist {
                            adapter: adapter.name().to_string(),
                            source,
                        });
                    }
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    // === Mutations ===

    /// Inserts a new record or merges fields into an existing one.
    ///
    /// - Without an identifier, the record gets the next identifier and a
    ///   creation stamp, and is appended.
    /// - With an identifier, every input field overwrites the stored field
    ///   of the same name; other stored fields are kept. The update stamp
    ///   is set.
    ///
    /// Returns the stored record after the change.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the identifier does not exist, or
    /// [`CoreError::IdSpaceExhausted`] if no identifier is left to allocate;
    /// nothing is changed.
    pub fn put(&mut self, data: impl Into<RecordData>) -> CoreResult<Record> {
        let (id, fields) = data.into().into_parts();
        let stored = match id {
            None => {
                let id = self.conf.next_id();
                self.conf.last_id = id
                    .as_u64()
                    .checked_add(1)
                    .ok_or(CoreError::IdSpaceExhausted { id })?;
                let record = Record::new(id, Timestamp::now(), fields);
                self.table.push(record.clone());
                self.stats.record_insert();
                debug!(%id, "record inserted");
                record
            }
            Some(id) => {
                let mut record = self.table.get_mut(id).ok_or(CoreError::not_found(id))?;
                record.merge(fields);
                record.stamp_updated(Timestamp::now());
                let record = (*record).clone();
                self.stats.record_update();
                debug!(%id, "record updated");
                record
            }
        };
        self.notify("put")?;
        Ok(stored)
    }

    /// Replaces a stored record with the input.
    ///
    /// Fields absent from the input are dropped. The original creation
    /// stamp is kept, the update stamp is set, and any removal stamp is
    /// cleared. The record keeps its position.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingId`] if the input has no identifier and
    /// [`CoreError::NotFound`] if it does not exist; nothing is changed.
    pub fn overwrite(&mut self, data: impl Into<RecordData>) -> CoreResult<Record> {
        let (id, fields) = data.into().into_parts();
        let id = id.ok_or(CoreError::missing_id("overwrite"))?;
        let mut record = self.table.get_mut(id).ok_or(CoreError::not_found(id))?;
        record.replace_fields(fields);
        record.clear_removed();
        record.stamp_updated(Timestamp::now());
        let record = (*record).clone();
        self.stats.record_overwrite();
        debug!(%id, "record overwritten");

        self.notify("overwrite")?;
        Ok(record)
    }

    /// Removes a record from the store.
    ///
    /// Returns the detached record with its removal stamp set.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the identifier does not exist.
    pub fn remove(&mut self, id: RecordId) -> CoreResult<Record> {
        self.remove_with(id, false)
    }

    /// Marks a record as removed without taking it out of the store.
    ///
    /// The record stays visible to `get`, `exists` and queries; callers
    /// filter on [`Record::is_removed`] when they need to.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the identifier does not exist.
    pub fn remove_soft(&mut self, id: RecordId) -> CoreResult<Record> {
        self.remove_with(id, true)
    }

    /// Removes a record, softly or not.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the identifier does not exist.
    pub fn remove_with(&mut self, id: RecordId, soft: bool) -> CoreResult<Record> {
        let removed_at = Timestamp::now();
        let record = if soft {
            let mut record = self.table.get_mut(id).ok_or(CoreError::not_found(id))?;
            record.stamp_removed(removed_at);
            (*record).clone()
        } else {
            let mut record = self.table.remove(id).ok_or(CoreError::not_found(id))?;
            record.stamp_removed(removed_at);
            record
        };
        self.stats.record_remove(soft);
        debug!(%id, soft, "record removed");

        self.notify("remove")?;
        Ok(record)
    }

    // === Point lookups ===

    /// Returns the stored record with this identifier.
    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.stats.record_lookup();
        self.table.get(id)
    }

    /// Returns a live handle to the stored record with this identifier.
    ///
    /// Edits are visible immediately but only persisted by
    /// [`write`](Self::write) or the next mutation.
    pub fn get_mut(&mut self, id: RecordId) -> Option<RecordMut<'_>> {
        self.stats.record_lookup();
        self.table.get_mut(id)
    }

    /// Returns true if a record with this identifier is stored.
    ///
    /// Soft-removed records exist.
    pub fn exists(&self, id: RecordId) -> bool {
        self.stats.record_lookup();
        self.table.contains(id)
    }

    /// Returns the position of a record in insertion order.
    pub fn index_of(&self, id: RecordId) -> Option<usize> {
        self.table.position(id)
    }

    /// Returns the number of stored records, soft-removed ones included.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns true if no records are stored.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the stored records in insertion order.
    pub fn records(&self) -> &[Record] {
        self.table.as_slice()
    }

    /// Iterates the stored records in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.table.as_slice().iter()
    }

    // === Queries ===

    /// Returns copies of every record matching `predicate`, in order.
    ///
    /// The predicate receives each record and its position. Each result
    /// carries the position it had when the scan ran.
    pub fn find<F>(&self, mut predicate: F) -> Vec<IndexedRecord>
    where
        F: FnMut(&Record, usize) -> bool,
    {
        self.stats.record_scan();
        self.iter()
            .enumerate()
            .filter(|(index, record)| predicate(*record, *index))
            .map(|(index, record)| IndexedRecord::new(index, record.clone()))
            .collect()
    }

    /// Returns a copy of the first record matching `predicate`.
    ///
    /// With `from_end`, the scan runs from the last record to the first,
    /// the first record included.
    pub fn find_one<F>(&self, mut predicate: F, from_end: bool) -> Option<IndexedRecord>
    where
        F: FnMut(&Record, usize) -> bool,
    {
        self.stats.record_scan();
        let records = self.table.as_slice();
        let found = if from_end {
            records
                .iter()
                .enumerate()
                .rev()
                .find(|(index, record)| predicate(*record, *index))
        } else {
            records
                .iter()
                .enumerate()
                .find(|(index, record)| predicate(*record, *index))
        };
        found.map(|(index, record)| IndexedRecord::new(index, record.clone()))
    }

    /// Returns copies of all records, in order.
    pub fn all(&self) -> Vec<IndexedRecord> {
        self.find(|_, _| true)
    }

    /// Runs `action` on every live record in order, then persists once.
    ///
    /// Adapters are notified even if nothing was changed.
    ///
    /// # Errors
    ///
    /// Returns a persist error under [`PersistFailurePolicy::Propagate`].
    pub fn for_each<F>(&mut self, action: F) -> CoreResult<()>
    where
        F: FnMut(RecordMut<'_>, usize),
    {
        self.stats.record_scan();
        self.table.for_each_mut(action);
        self.notify("for_each")
    }

    // === Snapshots ===

    /// Borrows the whole state as a snapshot.
    pub fn view(&self) -> SnapshotRef<'_> {
        SnapshotRef::new(&self.conf, self.table.as_slice())
    }

    /// Copies the whole state into an owned snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.view().to_snapshot()
    }

    /// Encodes the whole state as compact JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn to_json(&self) -> CoreResult<String> {
        Ok(to_json(&self.view())?)
    }

    /// Encodes the whole state as indented JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn to_json_pretty(&self) -> CoreResult<String> {
        Ok(to_json_pretty(&self.view())?)
    }

    /// Encodes the whole state as CBOR.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn to_cbor(&self) -> CoreResult<Vec<u8>> {
        Ok(to_cbor(&self.view())?)
    }

    /// Replaces the whole state with a snapshot.
    ///
    /// The lookup is rebuilt from the snapshot's records. If the snapshot's
    /// next identifier is not above every stored identifier it is raised,
    /// so identifiers are never handed out twice.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateId`] if two records share an
    /// identifier, or [`CoreError::IdSpaceExhausted`] if a record holds the
    /// largest possible identifier; the store is unchanged.
    pub fn load_snapshot(&mut self, snapshot: Snapshot) -> CoreResult<()> {
        let Snapshot { mut conf, data } = snapshot;
        let table = RecordTable::from_records(data).map_err(|id| CoreError::DuplicateId { id })?;

        if let Some(max_id) = table.max_id() {
            if conf.last_id <= max_id.as_u64() {
                let raised = max_id
                    .as_u64()
                    .checked_add(1)
                    .ok_or(CoreError::IdSpaceExhausted { id: max_id })?;
                warn!(
                    last_id = conf.last_id,
                    %max_id,
                    "snapshot lastId not above stored ids, raising"
                );
                conf.last_id = raised;
            }
        }

        self.conf = conf;
        self.table = table;
        self.stats.record_load();
        info!(records = self.table.len(), last_id = self.conf.last_id, "snapshot loaded");

        if self.config.persist_on_load {
            self.notify("load")?;
        }
        Ok(())
    }

    /// Replaces the whole state with a JSON-encoded snapshot.
    ///
    /// # Errors
    ///
    /// Returns a codec error for malformed input, or the errors of
    /// [`load_snapshot`](Self::load_snapshot).
    pub fn load_json(&mut self, text: &str) -> CoreResult<()> {
        let snapshot: Snapshot = from_json(text)?;
        self.load_snapshot(snapshot)
    }

    /// Replaces the whole state with a CBOR-encoded snapshot.
    ///
    /// # Errors
    ///
    /// Returns a codec error for malformed input, or the errors of
    /// [`load_snapshot`](Self::load_snapshot).
    pub fn load_cbor(&mut self, bytes: &[u8]) -> CoreResult<()> {
        let snapshot: Snapshot = from_cbor(bytes)?;
        self.load_snapshot(snapshot)
    }

    /// Loads the state an adapter retrieves from its medium.
    ///
    /// Returns `false` and leaves the store unchanged if the adapter has
    /// nothing stored.
    ///
    /// # Errors
    ///
    /// Returns the adapter's error, or the errors of
    /// [`load_snapshot`](Self::load_snapshot).
    pub fn load_from<A>(&mut self, adapter: &mut A) -> CoreResult<bool>
    where
        A: StorageAdapter + ?Sized,
    {
        match adapter.retrieve()? {
            Some(snapshot) => {
                debug!(adapter = adapter.name(), "retrieved snapshot");
                self.load_snapshot(snapshot)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Replaces the whole state with the snapshot stored in a file.
    ///
    /// The encoding is chosen from the extension (`.cbor` or JSON).
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Empty`] (wrapped) if the file is missing or
    /// empty, or an I/O, codec or load error.
    pub fn import(&mut self, path: impl AsRef<Path>) -> CoreResult<()> {
        let path = path.as_ref();
        let mut adapter = FileAdapter::open(path);
        if !self.load_from(&mut adapter)? {
            return Err(StorageError::empty(path).into());
        }
        info!(path = %path.display(), "imported");
        Ok(())
    }

    /// Writes the whole state to a file.
    ///
    /// The encoding is chosen from the extension (`.cbor` or JSON).
    ///
    /// # Errors
    ///
    /// Returns an I/O or codec error.
    pub fn export(&self, path: impl AsRef<Path>) -> CoreResult<()> {
        let path = path.as_ref();
        let mut adapter = FileAdapter::open(path);
        adapter.persist(self.view())?;
        info!(path = %path.display(), records = self.len(), "exported");
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        self.table.is_consistent()
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordStore")
            .field("records", &self.len())
            .field("last_id", &self.conf.last_id)
            .field("adapters", &self.adapters.len())
            .finish_non_exhaustive()
    }
}

impl<'a> IntoIterator for &'a RecordStore {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
