//! Dual-indexed record table.

use nodb_codec::{Fields, Record, RecordId, Timestamp, Value};
use std::collections::HashMap;
use std::ops::Deref;

/// Records in insertion order plus an identifier lookup.
///
/// The lookup maps each identifier to the record's slot in the ordered
/// sequence. Every mutating method updates both before returning, and no
/// method hands out something that could change a record's identifier or
/// move it between slots.
///
/// # Invariants
///
/// - `positions.len() == records.len()`
/// - `positions[records[i].id()] == i` for every slot `i`
#[derive(Debug, Default)]
pub(crate) struct RecordTable {
    /// Records in insertion order.
    records: Vec<Record>,
    /// Identifier to slot mapping.
    positions: HashMap<RecordId, usize>,
}

impl RecordTable {
    /// Creates an empty table.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Builds a table from records in order, indexing each by identifier.
    ///
    /// Fails with the first identifier that appears twice.
    pub(crate) fn from_records(records: Vec<Record>) -> Result<Self, RecordId> {
        let mut positions = HashMap::with_capacity(records.len());
        for (slot, record) in records.iter().enumerate() {
            if positions.insert(record.id(), slot).is_some() {
                return Err(record.id());
            }
        }
        Ok(Self { records, positions })
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub(crate) fn contains(&self, id: RecordId) -> bool {
        self.positions.contains_key(&id)
    }

    pub(crate) fn position(&self, id: RecordId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    pub(crate) fn get(&self, id: RecordId) -> Option<&Record> {
        self.position(id).map(|slot| &self.records[slot])
    }

    pub(crate) fn get_mut(&mut self, id: RecordId) -> Option<RecordMut<'_>> {
        let slot = self.position(id)?;
        Some(RecordMut::new(&mut self.records[slot]))
    }

    pub(crate) fn as_slice(&self) -> &[Record] {
        &self.records
    }

    /// Highest identifier held, if any.
    pub(crate) fn max_id(&self) -> Option<RecordId> {
        self.positions.keys().copied().max()
    }

    /// Appends a record whose identifier is not in the table.
    pub(crate) fn push(&mut self, record: Record) {
        debug_assert!(!self.contains(record.id()), "duplicate id {}", record.id());
        self.positions.insert(record.id(), self.records.len());
        self.records.push(record);
    }

    /// Detaches a record, shifting later records down one slot.
    pub(crate) fn remove(&mut self, id: RecordId) -> Option<Record> {
        let slot = self.positions.remove(&id)?;
        let record = self.records.remove(slot);
        for later in &self.records[slot..] {
            if let Some(position) = self.positions.get_mut(&later.id()) {
                *position -= 1;
            }
        }
        Some(record)
    }

    /// Visits every record in order with a live handle.
    pub(crate) fn for_each_mut<F>(&mut self, mut action: F)
    where
        F: FnMut(RecordMut<'_>, usize),
    {
        for (slot, record) in self.records.iter_mut().enumerate() {
            action(RecordMut::new(record), slot);
        }
    }

    /// Checks both invariants. Used by tests.
    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        self.positions.len() == self.records.len()
            && self
                .records
                .iter()
                .enumerate()
                .all(|(slot, record)| self.positions.get(&record.id()) == Some(&slot))
    }
}

/// A live, mutable handle to a stored record.
///
/// Derefs to [`Record`] for reading. Writes reach the payload and the
/// timestamps, never the identifier. Payload writes skip reserved names,
/// so the envelope cannot be shadowed through a handle. Changes made through a handle are not
/// persisted until the store's `write` (or another mutation) notifies the
/// adapters.
#[derive(Debug)]
pub struct RecordMut<'a> {
    record: &'a mut Record,
}

impl<'a> RecordMut<'a> {
    fn new(record: &'a mut Record) -> Self {
        Self { record }
    }

    /// Sets a caller field, returning the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.record.set(name, value)
    }

    /// Removes a caller field, returning its value.
    pub fn unset(&mut self, name: &str) -> Option<Value> {
        self.record.unset(name)
    }

    /// Copies every entry of `fields` over the record's fields.
    pub fn merge(&mut self, fields: Fields) {
        self.record.merge(fields);
    }

    pub(crate) fn replace_fields(&mut self, fields: Fields) {
        self.record.replace_fields(fields);
    }

    /// Sets the update stamp.
    pub fn stamp_updated(&mut self, at: Timestamp) {
        self.record.stamp_updated(at);
    }

    /// Sets the removal stamp.
    pub fn stamp_removed(&mut self, at: Timestamp) {
        self.record.stamp_removed(at);
    }

    /// Clears the removal stamp, making a soft-deleted record live again.
    pub fn clear_removed(&mut self) {
        self.record.clear_removed();
    }
}

impl Deref for RecordMut<'_> {
    type Target = Record;

    fn deref(&self) -> &Self::Target {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64) -> Record {
        Record::new(RecordId::new(id), Timestamp::from_millis(0), Fields::new())
    }

    fn table(ids: &[u64]) -> RecordTable {
        let mut table = RecordTable::new();
        for id in ids {
            table.push(record(*id));
        }
        table
    }

    fn ids(table: &RecordTable) -> Vec<u64> {
        table.as_slice().iter().map(|r| r.id().as_u64()).collect()
    }

    #[test]
    fn push_indexes_slot() {
        let table = table(&[3, 5, 9]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.position(RecordId::new(5)), Some(1));
        assert!(table.is_consistent());
    }

    #[test]
    fn remove_shifts_later_slots() {
        let mut table = table(&[0, 1, 2, 3]);
        let removed = table.remove(RecordId::new(1)).unwrap();
        assert_eq!(removed.id(), RecordId::new(1));
        assert_eq!(ids(&table), vec![0, 2, 3]);
        assert_eq!(table.position(RecordId::new(3)), Some(2));
        assert!(!table.contains(RecordId::new(1)));
        assert!(table.is_consistent());
    }

    #[test]
    fn remove_missing_is_none() {
        let mut table = table(&[0]);
        assert!(table.remove(RecordId::new(7)).is_none());
        assert!(table.is_consistent());
    }

    #[test]
    fn from_records_rejects_duplicates() {
        let result = RecordTable::from_records(vec![record(0), record(1), record(0)]);
        assert_eq!(result.unwrap_err(), RecordId::new(0));
    }

    #[test]
    fn from_records_indexes_in_order() {
        let table = RecordTable::from_records(vec![record(4), record(2)]).unwrap();
        assert_eq!(table.position(RecordId::new(2)), Some(1));
        assert_eq!(table.max_id(), Some(RecordId::new(4)));
        assert!(table.is_consistent());
    }

    #[test]
    fn handle_edits_are_live() {
        let mut table = table(&[0]);
        table.get_mut(RecordId::new(0)).unwrap().set("k", "v");
        assert_eq!(table.get(RecordId::new(0)).unwrap().get("k"), Some(&Value::from("v")));
    }

    #[test]
    fn handle_cannot_write_reserved_names() {
        let mut table = table(&[0]);
        {
            let mut handle = table.get_mut(RecordId::new(0)).unwrap();
            handle.set("_id", 9);
            let mut patch = Fields::new();
            patch.insert("_index".into(), Value::from(4));
            handle.merge(patch);
        }
        let record = table.get(RecordId::new(0)).unwrap();
        assert!(record.get("_id").is_none());
        assert!(record.get("_index").is_none());
        assert_eq!(record.id(), RecordId::new(0));
    }

    #[test]
    fn for_each_mut_visits_in_order() {
        let mut table = table(&[2, 0, 1]);
        let mut seen = Vec::new();
        table.for_each_mut(|mut record, slot| {
            seen.push((record.id().as_u64(), slot));
            record.set("visited", true);
        });
        assert_eq!(seen, vec![(2, 0), (0, 1), (1, 2)]);
        assert!(table.as_slice().iter().all(|r| r.get("visited").is_some()));
    }
}
