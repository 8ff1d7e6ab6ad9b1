//! Whole-store snapshot types.

use crate::record::{Record, RecordId};
use serde::{Deserialize, Serialize};

/// Persisted store configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConf {
    /// Next identifier to allocate.
    #[serde(rename = "lastId")]
    pub last_id: u64,
}

impl StoreConf {
    /// Creates a configuration whose next identifier is `last_id`.
    #[must_use]
    pub const fn new(last_id: u64) -> Self {
        Self { last_id }
    }

    /// Returns the next identifier to allocate.
    #[must_use]
    pub const fn next_id(&self) -> RecordId {
        RecordId::new(self.last_id)
    }
}

/// An owned snapshot of a store: configuration plus records in order.
///
/// This is what adapters hand back from `retrieve` and what bulk
/// imports decode into.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Store configuration.
    pub conf: StoreConf,
    /// Records in insertion order.
    pub data: Vec<Record>,
}

impl Snapshot {
    /// Creates a snapshot.
    #[must_use]
    pub fn new(conf: StoreConf, data: Vec<Record>) -> Self {
        Self { conf, data }
    }

    /// Borrows the snapshot for encoding.
    #[must_use]
    pub fn view(&self) -> SnapshotRef<'_> {
        SnapshotRef {
            conf: &self.conf,
            data: &self.data,
        }
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the snapshot holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A borrowed view of a store's state.
///
/// The store passes this to adapters on every notification, so encoding
/// never requires cloning the records.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SnapshotRef<'a> {
    /// Store configuration.
    pub conf: &'a StoreConf,
    /// Records in insertion order.
    pub data: &'a [Record],
}

impl<'a> SnapshotRef<'a> {
    /// Creates a borrowed snapshot.
    #[must_use]
    pub fn new(conf: &'a StoreConf, data: &'a [Record]) -> Self {
        Self { conf, data }
    }

    /// Clones the view into an owned snapshot.
    #[must_use]
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            conf: *self.conf,
            data: self.data.to_vec(),
        }
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the view holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Fields, Timestamp};
    use serde_json::json;

    #[test]
    fn conf_uses_camel_case_key() {
        let value = serde_json::to_value(StoreConf::new(5)).unwrap();
        assert_eq!(value, json!({"lastId": 5}));
        assert_eq!(StoreConf::new(5).next_id(), RecordId::new(5));
    }

    #[test]
    fn decodes_hand_written_document() {
        let snapshot: Snapshot = serde_json::from_value(json!({
            "conf": {"lastId": 2},
            "data": [
                {"_id": 0, "_createdAt": 1, "name": "a"},
                {"_id": 1, "_createdAt": 2, "_updatedAt": 3, "name": "b"}
            ]
        }))
        .unwrap();
        assert_eq!(snapshot.conf.last_id, 2);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.data[1].updated_at(), Some(Timestamp::from_millis(3)));
    }

    #[test]
    fn to_snapshot_copies_view() {
        let conf = StoreConf::new(1);
        let records = vec![Record::new(
            RecordId::new(0),
            Timestamp::from_millis(1),
            Fields::new(),
        )];
        let view = SnapshotRef::new(&conf, &records);
        let owned = view.to_snapshot();
        assert_eq!(owned.conf, conf);
        assert_eq!(owned.data, records);
        assert!(!view.is_empty());
    }
}
