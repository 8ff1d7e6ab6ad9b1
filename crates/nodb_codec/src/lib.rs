//! # NoDB Codec
//!
//! Record model and snapshot encoding for NoDB.
//!
//! This crate owns the shape of the data that moves between the record store
//! and its storage adapters:
//! - [`Record`] - a metadata envelope (`_id`, `_createdAt`, `_updatedAt`,
//!   `_removedAt`) around an open-ended map of caller fields
//! - [`RecordData`] - caller input for inserts and updates
//! - [`Snapshot`] / [`SnapshotRef`] - the `{conf, data}` export of a store
//!
//! ## Encodings
//!
//! - JSON text (the interchange format, compatible with hand-written files)
//! - CBOR binary (compact, for file adapters that do not need readability)
//!
//! Both encodings preserve record order. Field order inside a record is not
//! significant.
//!
//! ## Usage
//!
//! ```
//! use nodb_codec::{from_json, to_json, Snapshot, StoreConf};
//!
//! let snapshot = Snapshot::new(StoreConf::new(3), Vec::new());
//! let json = to_json(&snapshot).unwrap();
//! assert_eq!(json, r#"{"conf":{"lastId":3},"data":[]}"#);
//!
//! let decoded: Snapshot = from_json(&json).unwrap();
//! assert_eq!(decoded, snapshot);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
mod format;
mod record;
mod snapshot;

pub use decoder::{from_cbor, from_json, from_json_slice};
pub use encoder::{to_cbor, to_json, to_json_pretty};
pub use error::{CodecError, CodecResult};
pub use format::Format;
pub use record::{
    is_reserved, Fields, IndexedRecord, Record, RecordData, RecordId, Timestamp, RESERVED_KEYS,
};
pub use snapshot::{Snapshot, SnapshotRef, StoreConf};

/// Re-export of the dynamic value type used for record fields.
pub use serde_json::Value;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_snapshot() -> Snapshot {
        let mut first = Record::new(RecordId::new(0), Timestamp::from_millis(10), Fields::new());
        first.set("name", json!("alpha"));
        let mut second = Record::new(RecordId::new(1), Timestamp::from_millis(20), Fields::new());
        second.set("tags", json!(["x", "y"]));
        second.stamp_updated(Timestamp::from_millis(30));
        Snapshot::new(StoreConf::new(2), vec![first, second])
    }

    #[test]
    fn json_roundtrip_preserves_order() {
        let snapshot = sample_snapshot();
        let json = to_json(&snapshot).unwrap();
        let decoded: Snapshot = from_json(&json).unwrap();
        assert_eq!(decoded, snapshot);
        assert_eq!(decoded.data[0].id(), RecordId::new(0));
        assert_eq!(decoded.data[1].id(), RecordId::new(1));
    }

    #[test]
    fn cbor_roundtrip() {
        let snapshot = sample_snapshot();
        let bytes = to_cbor(&snapshot).unwrap();
        let decoded: Snapshot = from_cbor(&bytes).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn borrowed_and_owned_encode_identically() {
        let snapshot = sample_snapshot();
        let owned = to_json(&snapshot).unwrap();
        let borrowed = to_json(&snapshot.view()).unwrap();
        assert_eq!(owned, borrowed);
    }
}
