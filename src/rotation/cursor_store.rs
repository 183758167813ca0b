//! Cursor Store
//!
//! Durable storage for the rotation cursor. The `CursorStore` trait is the port
//! `RotationState` persists through; `FileCursorStore` is the production backend
//! and `MemoryCursorStore` backs tests.

use crate::error_handling::types::StorageError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

/// Storage port for the rotation cursor.
pub trait CursorStore: Send + Sync {
    /// Returns the stored cursor, `None` if nothing has been stored yet.
    ///
    /// A record that exists but cannot be parsed yields `StorageError::Corrupt`.
    fn load(&self) -> Result<Option<u64>, StorageError>;

    /// Durably stores `value`; the write is complete when this returns `Ok`.
    fn save(&self, value: u64) -> Result<(), StorageError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct CursorRecord {
    current_index: u64,
}

/// JSON file holding `{"current_index": n}`.
///
/// Writes go to a temporary file in the same directory which is synced and then
/// renamed over the record, so readers never observe a partial write.
pub struct FileCursorStore {
    path: PathBuf,
}

impl FileCursorStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

impl CursorStore for FileCursorStore {
    fn load(&self) -> Result<Option<u64>, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::IoError(e)),
        };
        let record: CursorRecord = serde_json::from_str(&content)
            .map_err(|e| StorageError::Corrupt(format!("{}: {}", self.path.display(), e)))?;
        Ok(Some(record.current_index))
    }

    fn save(&self, value: u64) -> Result<(), StorageError> {
        let dir = self.parent_dir();
        fs::create_dir_all(&dir)?;

        let body = serde_json::to_vec(&CursorRecord {
            current_index: value,
        })
        .map_err(|e| StorageError::WriteFailed(e.to_string()))?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(&body)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .map_err(|e| StorageError::WriteFailed(format!("{}: {}", self.path.display(), e)))?;

        debug!("Persisted cursor {} to {}", value, self.path.display());
        Ok(())
    }
}

/// In-process cursor store.
#[derive(Default)]
pub struct MemoryCursorStore {
    value: Mutex<Option<u64>>,
}

impl MemoryCursorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: u64) -> Self {
        Self {
            value: Mutex::new(Some(value)),
        }
    }
}

impl CursorStore for MemoryCursorStore {
    fn load(&self) -> Result<Option<u64>, StorageError> {
        self.value
            .lock()
            .map(|v| *v)
            .map_err(|e| StorageError::ReadFailed(e.to_string()))
    }

    fn save(&self, value: u64) -> Result<(), StorageError> {
        let mut guard = self
            .value
            .lock()
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        *guard = Some(value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_loads_none() {
        let dir = TempDir::new().unwrap();
        let store = FileCursorStore::new(dir.path().join("state.json"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let store = FileCursorStore::new(&path);
        store.save(4).unwrap();
        assert_eq!(store.load().unwrap(), Some(4));

        let on_disk = fs::read_to_string(&path).unwrap();
        assert_eq!(on_disk, r#"{"current_index":4}"#);

        // a fresh handle sees the same value, as after a restart
        assert_eq!(FileCursorStore::new(&path).load().unwrap(), Some(4));
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{not json").unwrap();
        let store = FileCursorStore::new(&path);
        assert!(matches!(store.load(), Err(StorageError::Corrupt(_))));
    }

    #[test]
    fn test_save_creates_parent_dir() {
        let dir = TempDir::new().unwrap();
        let store = FileCursorStore::new(dir.path().join("nested/state/state.json"));
        store.save(1).unwrap();
        assert_eq!(store.load().unwrap(), Some(1));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryCursorStore::new();
        assert_eq!(store.load().unwrap(), None);
        store.save(9).unwrap();
        assert_eq!(store.load().unwrap(), Some(9));
    }
}
