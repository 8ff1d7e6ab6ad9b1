//! On-disk encoding selection.

use crate::decoder::{from_cbor, from_json_slice};
use crate::encoder::{to_cbor, to_json, to_json_pretty};
use crate::error::CodecResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Encoding used by byte-oriented adapters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Format {
    /// Compact JSON text.
    #[default]
    Json,
    /// Indented JSON text, for files meant to be read by people.
    JsonPretty,
    /// CBOR binary.
    Cbor,
}

impl Format {
    /// Picks a format from a file extension: `.cbor` selects CBOR,
    /// anything else JSON.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("cbor") => Self::Cbor,
            _ => Self::Json,
        }
    }

    /// Encodes a value in this format.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented.
    pub fn encode<T>(self, value: &T) -> CodecResult<Vec<u8>>
    where
        T: Serialize + ?Sized,
    {
        match self {
            Self::Json => to_json(value).map(String::into_bytes),
            Self::JsonPretty => to_json_pretty(value).map(String::into_bytes),
            Self::Cbor => to_cbor(value),
        }
    }

    /// Decodes a value in this format.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are malformed for `T`.
    pub fn decode<T: DeserializeOwned>(self, bytes: &[u8]) -> CodecResult<T> {
        match self {
            Self::Json | Self::JsonPretty => from_json_slice(bytes),
            Self::Cbor => from_cbor(bytes),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Json => "json",
            Self::JsonPretty => "json-pretty",
            Self::Cbor => "cbor",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{Snapshot, StoreConf};

    #[test]
    fn format_from_extension() {
        assert_eq!(Format::from_path(Path::new("db.cbor")), Format::Cbor);
        assert_eq!(Format::from_path(Path::new("db.CBOR")), Format::Cbor);
        assert_eq!(Format::from_path(Path::new("db.json")), Format::Json);
        assert_eq!(Format::from_path(Path::new("db")), Format::Json);
    }

    #[test]
    fn pretty_decodes_like_compact() {
        let snapshot = Snapshot::new(StoreConf::new(9), Vec::new());
        let bytes = Format::JsonPretty.encode(&snapshot).unwrap();
        let decoded: Snapshot = Format::Json.decode(&bytes).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn cbor_is_not_json() {
        let snapshot = Snapshot::new(StoreConf::new(1), Vec::new());
        let bytes = Format::Cbor.encode(&snapshot).unwrap();
        assert!(Format::Json.decode::<Snapshot>(&bytes).is_err());
        assert_eq!(Format::Cbor.decode::<Snapshot>(&bytes).unwrap(), snapshot);
    }
}
