//! File-based storage adapter for persistent storage.

use crate::adapter::StorageAdapter;
use crate::error::{StorageError, StorageResult};
use nodb_codec::{Format, Snapshot, SnapshotRef};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// A file-based storage adapter.
///
/// Every persist rewrites the whole file with the encoded snapshot. The
/// new contents are written to a sibling temporary file and renamed over
/// the target, so a crash mid-write leaves the previous snapshot intact.
///
/// # Durability
///
/// - With `sync` enabled (the default), the temporary file is synced with
///   `File::sync_all()` before the rename
/// - Without it, the data may sit in OS buffers after `persist` returns
///
/// # Example
///
/// ```no_run
/// use nodb_storage::{FileAdapter, StorageAdapter};
/// use std::path::Path;
///
/// let mut adapter = FileAdapter::open(Path::new("data/store.json")).create_dirs(true);
/// if let Some(snapshot) = adapter.retrieve().unwrap() {
///     println!("{} records on disk", snapshot.len());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileAdapter {
    path: PathBuf,
    format: Format,
    create_dirs: bool,
    sync: bool,
}

impl FileAdapter {
    /// Creates an adapter for `path`, choosing the format from its
    /// extension (`.cbor` for CBOR, JSON otherwise).
    ///
    /// Nothing is touched on disk until the adapter is initialized or used.
    #[must_use]
    pub fn open(path: &Path) -> Self {
        Self::with_format(path, Format::from_path(path))
    }

    /// Creates an adapter for `path` with an explicit format.
    #[must_use]
    pub fn with_format(path: &Path, format: Format) -> Self {
        Self {
            path: path.to_path_buf(),
            format,
            create_dirs: false,
            sync: true,
        }
    }

    /// Sets whether missing parent directories are created on initialize.
    #[must_use]
    pub fn create_dirs(mut self, value: bool) -> Self {
        self.create_dirs = value;
        self
    }

    /// Sets whether every persist is synced to disk.
    #[must_use]
    pub fn sync(mut self, value: bool) -> Self {
        self.sync = value;
        self
    }

    /// Returns the path to the target file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the encoding used for the file.
    #[must_use]
    pub fn format(&self) -> Format {
        self.format
    }

    /// Reads the stored snapshot, failing if there is none.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Empty`] if the file is missing or empty,
    /// or an I/O or codec error.
    pub fn load(&self) -> StorageResult<Snapshot> {
        self.read()?
            .ok_or_else(|| StorageError::empty(self.path.clone()))
    }

    fn read(&self) -> StorageResult<Option<Snapshot>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.format.decode(&bytes)?))
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_temp(&self, temp: &Path, bytes: &[u8]) -> io::Result<()> {
        let mut file = File::create(temp)?;
        file.write_all(bytes)?;
        if self.sync {
            file.sync_all()?;
        }
        Ok(())
    }

    fn parent(&self) -> Option<&Path> {
        self.path.parent().filter(|p| !p.as_os_str().is_empty())
    }
}

impl StorageAdapter for FileAdapter {
    fn name(&self) -> &str {
        "file"
    }

    fn initialize(&mut self, _snapshot: SnapshotRef<'_>) -> StorageResult<()> {
        if self.path.is_dir() {
            return Err(StorageError::rejected(format!(
                "{} is a directory",
                self.path.display()
            )));
        }
        if let Some(parent) = self.parent() {
            if self.create_dirs {
                fs::create_dir_all(parent)?;
            } else if !parent.is_dir() {
                return Err(StorageError::rejected(format!(
                    "directory {} does not exist",
                    parent.display()
                )));
            }
        }
        Ok(())
    }

    fn persist(&mut self, snapshot: SnapshotRef<'_>) -> StorageResult<()> {
        let bytes = self.format.encode(&snapshot)?;
        let temp = self.temp_path();
        let written = self
            .write_temp(&temp, &bytes)
            .and_then(|()| fs::rename(&temp, &self.path));
        if let Err(e) = written {
            // The previous snapshot is untouched; only the partial copy goes.
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }
        Ok(())
    }

    fn retrieve(&mut self) -> StorageResult<Option<Snapshot>> {
        self.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodb_codec::{Fields, Record, RecordId, StoreConf, Timestamp};
    use tempfile::tempdir;

    fn snapshot() -> Snapshot {
        let mut record = Record::new(RecordId::new(0), Timestamp::from_millis(5), Fields::new());
        record.set("name", "a");
        Snapshot::new(StoreConf::new(1), vec![record])
    }

    #[test]
    fn file_missing_retrieves_none() {
        let dir = tempdir().unwrap();
        let mut adapter = FileAdapter::open(&dir.path().join("store.json"));
        assert!(adapter.retrieve().unwrap().is_none());
    }

    #[test]
    fn file_persist_and_retrieve() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");

        let mut adapter = FileAdapter::open(&path);
        adapter.initialize(snapshot().view()).unwrap();
        adapter.persist(snapshot().view()).unwrap();

        assert!(path.exists());
        assert!(!adapter.temp_path().exists());
        assert_eq!(adapter.retrieve().unwrap(), Some(snapshot()));
    }

    #[test]
    fn failed_persist_removes_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), b"x").unwrap();

        let mut adapter = FileAdapter::open(&path);
        assert!(adapter.persist(snapshot().view()).is_err());

        assert!(!adapter.temp_path().exists());
        assert!(path.join("keep").exists());
    }

    #[test]
    fn file_is_readable_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");

        let mut adapter = FileAdapter::open(&path);
        adapter.persist(snapshot().view()).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["conf"]["lastId"], 1);
        assert_eq!(value["data"][0]["name"], "a");
    }

    #[test]
    fn file_persistence_across_instances() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.cbor");

        {
            let mut adapter = FileAdapter::open(&path);
            assert_eq!(adapter.format(), Format::Cbor);
            adapter.persist(snapshot().view()).unwrap();
        }

        {
            let mut adapter = FileAdapter::open(&path);
            assert_eq!(adapter.retrieve().unwrap(), Some(snapshot()));
        }
    }

    #[test]
    fn file_empty_file_retrieves_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        File::create(&path).unwrap();

        let adapter = FileAdapter::open(&path);
        assert!(matches!(adapter.load(), Err(StorageError::Empty { .. })));
    }

    #[test]
    fn file_corrupt_contents_fail() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, b"{not json").unwrap();

        let mut adapter = FileAdapter::open(&path);
        assert!(matches!(adapter.retrieve(), Err(StorageError::Codec(_))));
    }

    #[test]
    fn file_initialize_rejects_missing_dir() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let mut adapter = FileAdapter::open(&path);
        let result = adapter.initialize(snapshot().view());
        assert!(matches!(result, Err(StorageError::Rejected { .. })));
    }

    #[test]
    fn file_initialize_creates_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("path").join("store.json");

        let mut adapter = FileAdapter::open(&path).create_dirs(true);
        adapter.initialize(snapshot().view()).unwrap();
        assert!(path.parent().unwrap().is_dir());
    }

    #[test]
    fn file_initialize_rejects_directory_target() {
        let dir = tempdir().unwrap();
        let mut adapter = FileAdapter::open(dir.path());
        assert!(adapter.initialize(snapshot().view()).is_err());
    }

    #[test]
    fn file_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");

        let adapter = FileAdapter::open(&path).sync(false);
        assert_eq!(adapter.path(), path);
    }
}
