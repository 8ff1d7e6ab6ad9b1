//! Record envelope and caller input types.

use crate::error::CodecError;
use chrono::{DateTime, TimeZone, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::ops::{Deref, DerefMut};

/// Caller-defined fields of a record.
pub type Fields = Map<String, Value>;

const ID_KEY: &str = "_id";
const CREATED_KEY: &str = "_createdAt";
const UPDATED_KEY: &str = "_updatedAt";
const REMOVED_KEY: &str = "_removedAt";
const INDEX_KEY: &str = "_index";

/// Field names owned by the record envelope.
///
/// Payload fields with these names are never stored or encoded; the
/// envelope value always wins.
pub const RESERVED_KEYS: [&str; 5] = [ID_KEY, CREATED_KEY, UPDATED_KEY, REMOVED_KEY, INDEX_KEY];

/// Returns true if `name` is one of [`RESERVED_KEYS`].
#[inline]
#[must_use]
pub fn is_reserved(name: &str) -> bool {
    RESERVED_KEYS.contains(&name)
}

/// Identifier of a record within a store.
///
/// Identifiers are allocated by the store from a monotonic counter:
/// - Unique within a store
/// - Immutable once assigned
/// - Never reused, even after the record is deleted
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    /// Creates a record ID from its numeric value.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the numeric value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the identifier that follows this one.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<RecordId> for u64 {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

/// A point in time, stored as milliseconds since the Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Returns the current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    /// Creates a timestamp from milliseconds since the Unix epoch.
    #[inline]
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns milliseconds since the Unix epoch.
    #[inline]
    #[must_use]
    pub const fn as_millis(self) -> i64 {
        self.0
    }

    /// Converts to a UTC date-time, if the value is in chrono's range.
    #[must_use]
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.0).single()
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339()),
            None => write!(f, "{}ms", self.0),
        }
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp_millis())
    }
}

/// A stored record: metadata envelope plus caller fields.
///
/// The envelope is managed by the store. The identifier has no setter;
/// timestamps are stamped by store operations and exposed for adapters
/// and callers that edit records in place.
///
/// # Encoding
///
/// A record encodes as a single flat map. Envelope entries use the
/// reserved keys `_id`, `_createdAt`, `_updatedAt` and `_removedAt`; the
/// optional stamps are omitted while unset.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawRecord")]
pub struct Record {
    id: RecordId,
    created_at: Timestamp,
    updated_at: Option<Timestamp>,
    removed_at: Option<Timestamp>,
    fields: Fields,
}

impl Record {
    /// Creates a record with the given envelope and fields.
    ///
    /// Reserved keys are stripped from `fields`.
    #[must_use]
    pub fn new(id: RecordId, created_at: Timestamp, fields: Fields) -> Self {
        Self {
            id,
            created_at,
            updated_at: None,
            removed_at: None,
            fields: sanitize(fields),
        }
    }

    /// Returns the record identifier.
    #[inline]
    #[must_use]
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Returns when the record was created.
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Returns when the record was last updated, if ever.
    #[inline]
    #[must_use]
    pub fn updated_at(&self) -> Option<Timestamp> {
        self.updated_at
    }

    /// Returns when the record was removed, if it was.
    #[inline]
    #[must_use]
    pub fn removed_at(&self) -> Option<Timestamp> {
        self.removed_at
    }

    /// Returns true if the record carries a removal stamp.
    #[inline]
    #[must_use]
    pub fn is_removed(&self) -> bool {
        self.removed_at.is_some()
    }

    /// Returns the caller fields.
    #[must_use]
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Returns the value of a caller field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Sets a caller field, returning the previous value.
    ///
    /// Reserved names are ignored and return `None`.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        if is_reserved(&name) {
            return None;
        }
        self.fields.insert(name, value.into())
    }

    /// Removes a caller field, returning its value.
    pub fn unset(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    /// Copies every entry of `fields` over this record's fields.
    ///
    /// Fields not present in `fields` are left untouched.
    pub fn merge(&mut self, fields: Fields) {
        for (name, value) in fields {
            if !is_reserved(&name) {
                self.fields.insert(name, value);
            }
        }
    }

    /// Replaces all caller fields with `fields`.
    pub fn replace_fields(&mut self, fields: Fields) {
        self.fields = sanitize(fields);
    }

    /// Sets the update stamp.
    pub fn stamp_updated(&mut self, at: Timestamp) {
        self.updated_at = Some(at);
    }

    /// Sets the removal stamp.
    pub fn stamp_removed(&mut self, at: Timestamp) {
        self.removed_at = Some(at);
    }

    /// Clears the removal stamp.
    pub fn clear_removed(&mut self) {
        self.removed_at = None;
    }

    fn serialize_with_index<S>(&self, serializer: S, index: Option<usize>) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let payload_len = self.fields.keys().filter(|k| !is_reserved(k)).count();
        let len = 2
            + usize::from(self.updated_at.is_some())
            + usize::from(self.removed_at.is_some())
            + usize::from(index.is_some())
            + payload_len;

        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry(ID_KEY, &self.id)?;
        map.serialize_entry(CREATED_KEY, &self.created_at)?;
        if let Some(at) = &self.updated_at {
            map.serialize_entry(UPDATED_KEY, at)?;
        }
        if let Some(at) = &self.removed_at {
            map.serialize_entry(REMOVED_KEY, at)?;
        }
        if let Some(index) = &index {
            map.serialize_entry(INDEX_KEY, index)?;
        }
        for (name, value) in &self.fields {
            if !is_reserved(name) {
                map.serialize_entry(name, value)?;
            }
        }
        map.end()
    }
}

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.serialize_with_index(serializer, None)
    }
}

#[derive(Deserialize)]
struct RawRecord {
    #[serde(rename = "_id")]
    id: RecordId,
    #[serde(rename = "_createdAt")]
    created_at: Timestamp,
    #[serde(rename = "_updatedAt", default)]
    updated_at: Option<Timestamp>,
    #[serde(rename = "_removedAt", default)]
    removed_at: Option<Timestamp>,
    #[serde(flatten)]
    fields: Fields,
}

impl From<RawRecord> for Record {
    fn from(raw: RawRecord) -> Self {
        Self {
            id: raw.id,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
            removed_at: raw.removed_at,
            // `_index` from a query export lands here
            fields: sanitize(raw.fields),
        }
    }
}

fn sanitize(mut fields: Fields) -> Fields {
    fields.retain(|name, _| !is_reserved(name));
    fields
}

/// A copy of a record returned by a query, with its position at query time.
///
/// The position is not part of the record and is never written back.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedRecord {
    /// Position in the store's ordered sequence when the query ran.
    pub index: usize,
    /// Copy of the stored record.
    pub record: Record,
}

impl IndexedRecord {
    /// Creates an indexed copy.
    #[must_use]
    pub fn new(index: usize, record: Record) -> Self {
        Self { index, record }
    }
}

impl Deref for IndexedRecord {
    type Target = Record;

    fn deref(&self) -> &Self::Target {
        &self.record
    }
}

impl DerefMut for IndexedRecord {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.record
    }
}

impl Serialize for IndexedRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.record.serialize_with_index(serializer, Some(self.index))
    }
}

/// Caller input for inserting or updating a record.
///
/// Without an identifier the input describes a new record; with one it
/// targets an existing record.
///
/// # Example
///
/// ```
/// use nodb_codec::{RecordData, RecordId};
///
/// let insert = RecordData::new().field("name", "alice").field("age", 30);
/// assert!(insert.id().is_none());
///
/// let update = RecordData::with_id(4u64).field("age", 31);
/// assert_eq!(update.id(), Some(RecordId::new(4)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Fields")]
pub struct RecordData {
    id: Option<RecordId>,
    fields: Fields,
}

impl RecordData {
    /// Creates empty input for a new record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates empty input targeting an existing record.
    #[must_use]
    pub fn with_id(id: impl Into<RecordId>) -> Self {
        Self {
            id: Some(id.into()),
            fields: Fields::new(),
        }
    }

    /// Adds a field (builder style). Reserved names are ignored.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Sets a field. Reserved names are ignored.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        if !is_reserved(&name) {
            self.fields.insert(name, value.into());
        }
    }

    /// Returns the target identifier, if any.
    #[must_use]
    pub fn id(&self) -> Option<RecordId> {
        self.id
    }

    /// Returns the fields.
    #[must_use]
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Splits the input into identifier and fields.
    #[must_use]
    pub fn into_parts(self) -> (Option<RecordId>, Fields) {
        (self.id, self.fields)
    }
}

/// Reads `_id` as the target identifier and drops every other reserved key.
///
/// A missing or `null` `_id` makes an insert. Any other `_id` must be a
/// non-negative integer; integral floats such as `1.0` are accepted.
impl TryFrom<Fields> for RecordData {
    type Error = CodecError;

    fn try_from(mut fields: Fields) -> Result<Self, Self::Error> {
        let id = match fields.get(ID_KEY) {
            None | Some(Value::Null) => None,
            Some(value) => Some(id_from_value(value).ok_or_else(|| CodecError::invalid_id(value))?),
        };
        fields.retain(|name, _| !is_reserved(name));
        Ok(Self { id, fields })
    }
}

// 2^64, the first float past the u64 range.
const ID_FLOAT_LIMIT: f64 = 18_446_744_073_709_551_616.0;

fn id_from_value(value: &Value) -> Option<RecordId> {
    let Value::Number(number) = value else {
        return None;
    };
    if let Some(id) = number.as_u64() {
        return Some(RecordId::new(id));
    }
    let float = number.as_f64()?;
    if (0.0..ID_FLOAT_LIMIT).contains(&float) && float.fract() == 0.0 {
        return Some(RecordId::new(float as u64));
    }
    None
}

impl From<Record> for RecordData {
    fn from(record: Record) -> Self {
        Self {
            id: Some(record.id),
            fields: record.fields,
        }
    }
}

impl From<IndexedRecord> for RecordData {
    fn from(indexed: IndexedRecord) -> Self {
        indexed.record.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> Record {
        let mut fields = Fields::new();
        fields.insert("name".into(), json!("alice"));
        fields.insert("age".into(), json!(30));
        Record::new(RecordId::new(7), Timestamp::from_millis(1_000), fields)
    }

    #[test]
    fn record_id_next() {
        assert_eq!(RecordId::new(0).next(), RecordId::new(1));
        assert!(RecordId::new(1) < RecordId::new(2));
    }

    #[test]
    fn timestamp_display_is_rfc3339() {
        let ts = Timestamp::from_millis(0);
        assert_eq!(ts.to_string(), "1970-01-01T00:00:00+00:00");
    }

    #[test]
    fn timestamp_now_is_recent() {
        let ts = Timestamp::now();
        // 2020-01-01T00:00:00Z
        assert!(ts.as_millis() > 1_577_836_800_000);
    }

    #[test]
    fn new_record_strips_reserved_fields() {
        let mut fields = Fields::new();
        fields.insert("_id".into(), json!(99));
        fields.insert("_index".into(), json!(3));
        fields.insert("ok".into(), json!(true));
        let record = Record::new(RecordId::new(1), Timestamp::from_millis(1), fields);
        assert_eq!(record.id(), RecordId::new(1));
        assert_eq!(record.fields().len(), 1);
    }

    #[test]
    fn set_ignores_reserved_names() {
        let mut record = record();
        assert_eq!(record.set("_createdAt", 5), None);
        assert!(record.get("_createdAt").is_none());
        assert_eq!(record.set("age", 31), Some(json!(30)));
    }

    #[test]
    fn merge_keeps_absent_fields() {
        let mut record = record();
        let mut patch = Fields::new();
        patch.insert("age".into(), json!(31));
        record.merge(patch);
        assert_eq!(record.get("age"), Some(&json!(31)));
        assert_eq!(record.get("name"), Some(&json!("alice")));
    }

    #[test]
    fn replace_drops_absent_fields() {
        let mut record = record();
        let mut fields = Fields::new();
        fields.insert("age".into(), json!(31));
        fields.insert("_id".into(), json!(100));
        record.replace_fields(fields);
        assert!(record.get("name").is_none());
        assert!(record.get("_id").is_none());
        assert_eq!(record.fields().len(), 1);
    }

    #[test]
    fn encodes_flat_with_reserved_keys() {
        let mut record = record();
        record.stamp_updated(Timestamp::from_millis(2_000));
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({"_id": 7, "_createdAt": 1000, "_updatedAt": 2000, "name": "alice", "age": 30})
        );
    }

    #[test]
    fn reserved_keys_never_reach_fields() {
        let mut record = record();
        let mut patch = Fields::new();
        patch.insert("_id".into(), json!(100));
        patch.insert("_index".into(), json!(1));
        record.merge(patch);
        record.set("_id", 101);

        assert!(record.get("_id").is_none());
        assert!(record.get("_index").is_none());
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["_id"], json!(7));
    }

    #[test]
    fn decodes_from_flat_map() {
        let record: Record = serde_json::from_value(json!({
            "_id": 3,
            "_createdAt": 10,
            "_removedAt": 20,
            "_index": 0,
            "title": "x"
        }))
        .unwrap();
        assert_eq!(record.id(), RecordId::new(3));
        assert_eq!(record.created_at(), Timestamp::from_millis(10));
        assert_eq!(record.updated_at(), None);
        assert_eq!(record.removed_at(), Some(Timestamp::from_millis(20)));
        assert!(record.get("_index").is_none());
        assert_eq!(record.get("title"), Some(&json!("x")));
    }

    #[test]
    fn decode_requires_id() {
        let result: Result<Record, _> = serde_json::from_value(json!({"_createdAt": 1}));
        assert!(result.is_err());
    }

    #[test]
    fn indexed_record_encodes_index() {
        let indexed = IndexedRecord::new(2, record());
        let value = serde_json::to_value(&indexed).unwrap();
        assert_eq!(value["_index"], json!(2));
        assert_eq!(indexed.id(), RecordId::new(7));
    }

    #[test]
    fn record_data_from_fields_reads_id() {
        let data: RecordData = serde_json::from_value(json!({"_id": 4, "_createdAt": 1, "a": 9})).unwrap();
        assert_eq!(data.id(), Some(RecordId::new(4)));
        assert_eq!(data.fields().len(), 1);

        let data: RecordData = serde_json::from_value(json!({"a": 9})).unwrap();
        assert_eq!(data.id(), None);
    }

    #[test]
    fn record_data_accepts_integral_float_id() {
        let data: RecordData = serde_json::from_value(json!({"_id": 1.0, "name": "b"})).unwrap();
        assert_eq!(data.id(), Some(RecordId::new(1)));
        assert_eq!(data.fields().len(), 1);
    }

    #[test]
    fn record_data_null_id_is_insert() {
        let data: RecordData = serde_json::from_value(json!({"_id": null, "a": 1})).unwrap();
        assert_eq!(data.id(), None);
    }

    #[test]
    fn record_data_rejects_string_id() {
        let mut fields = Fields::new();
        fields.insert("_id".into(), json!("1"));
        let err = RecordData::try_from(fields).unwrap_err();
        assert_eq!(err, CodecError::InvalidId { value: r#""1""#.into() });
    }

    #[test]
    fn record_data_rejects_negative_id() {
        let mut fields = Fields::new();
        fields.insert("_id".into(), json!(-1));
        assert!(RecordData::try_from(fields).unwrap_err().is_decode());
    }

    #[test]
    fn record_data_rejects_fractional_and_out_of_range_ids() {
        for id in [json!(1.5), json!(-1.0), json!(1.0e20), json!(true), json!([1])] {
            let mut fields = Fields::new();
            fields.insert("_id".into(), id.clone());
            assert!(RecordData::try_from(fields).is_err(), "accepted {id}");
        }
    }

    #[test]
    fn record_data_decode_fails_on_bad_id() {
        let result: Result<RecordData, _> = serde_json::from_str(r#"{"_id": "1", "name": "b"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn record_data_from_record_keeps_id_and_payload() {
        let data = RecordData::from(record());
        let (id, fields) = data.into_parts();
        assert_eq!(id, Some(RecordId::new(7)));
        assert_eq!(fields.get("name"), Some(&json!("alice")));
    }
}
