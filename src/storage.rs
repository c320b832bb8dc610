//! File-backed object store.
//!
//! Holds every live record keyed by `"<Class>.<id>"` and rewrites the whole
//! set to a single JSON file on each `save`. The map is ordered, so listing
//! and persistence are deterministic.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

use crate::model::Record;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
    #[error("malformed storage file {path}: {source}")]
    Malformed {
        path: String,
        source: serde_json::Error,
    },
    #[error("failed to serialize store: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The process-wide record store and its backing file.
pub struct FileStorage {
    path: PathBuf,
    objects: BTreeMap<String, Record>,
}

impl FileStorage {
    /// Create an empty store backed by `path`. Nothing is read until
    /// [`FileStorage::reload`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            objects: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every live record, keyed by identity key.
    pub fn all(&self) -> &BTreeMap<String, Record> {
        &self.objects
    }

    pub fn get(&self, key: &str) -> Option<&Record> {
        self.objects.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Record> {
        self.objects.get_mut(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.contains_key(key)
    }

    /// Register a record under its computed identity key.
    pub fn add(&mut self, record: Record) {
        let key = record.key();
        debug!("event=store_add key={}", key);
        self.objects.insert(key, record);
    }

    /// Remove one entry. Returns whether the key was present.
    pub fn delete(&mut self, key: &str) -> bool {
        let removed = self.objects.remove(key).is_some();
        debug!("event=store_delete key={} removed={}", key, removed);
        removed
    }

    /// Records of one class, in store iteration order.
    pub fn class_records<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a Record> {
        self.objects.values().filter(move |r| r.class() == class)
    }

    pub fn count_class(&self, class: &str) -> usize {
        self.class_records(class).count()
    }

    /// Flush the full record set to the backing file.
    pub fn save(&self) -> Result<(), StorageError> {
        let payload = serde_json::to_string(&self.objects)?;
        fs::write(&self.path, payload).map_err(|source| StorageError::Write {
            path: self.path.display().to_string(),
            source,
        })?;
        debug!(
            "event=store_save path={} records={}",
            self.path.display(),
            self.objects.len()
        );
        Ok(())
    }

    /// Load the record set from the backing file. A missing file is not an
    /// error; the store just starts empty.
    pub fn reload(&mut self) -> Result<(), StorageError> {
        if !self.path.exists() {
            debug!("event=store_reload path={} missing", self.path.display());
            return Ok(());
        }
        let payload = fs::read_to_string(&self.path).map_err(|source| StorageError::Read {
            path: self.path.display().to_string(),
            source,
        })?;
        self.objects =
            serde_json::from_str(&payload).map_err(|source| StorageError::Malformed {
                path: self.path.display().to_string(),
                source,
            })?;
        debug!(
            "event=store_reload path={} records={}",
            self.path.display(),
            self.objects.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::FileStorage;
    use crate::model::{AttrValue, Record};
    use tempfile::TempDir;

    fn storage_in(dir: &TempDir) -> FileStorage {
        FileStorage::new(dir.path().join("file.json"))
    }

    #[test]
    fn test_add_and_get_by_identity_key() {
        let dir = TempDir::new().expect("temp dir");
        let mut storage = storage_in(&dir);
        let record = Record::new("User");
        let key = record.key();

        storage.add(record);

        assert!(storage.contains(&key));
        assert_eq!(storage.get(&key).map(Record::class), Some("User"));
    }

    #[test]
    fn test_save_then_reload_round_trips() {
        let dir = TempDir::new().expect("temp dir");
        let mut storage = storage_in(&dir);
        let mut record = Record::new("Place");
        record.set("number_rooms", AttrValue::Int(3));
        record.set("latitude", AttrValue::Float(48.85));
        record.set("name", AttrValue::Str("loft".to_string()));
        let key = record.key();
        storage.add(record.clone());
        storage.save().expect("save");

        let mut reloaded = storage_in(&dir);
        reloaded.reload().expect("reload");

        assert_eq!(reloaded.all().len(), 1);
        assert_eq!(reloaded.get(&key), Some(&record));
    }

    #[test]
    fn test_reload_missing_file_leaves_store_empty() {
        let dir = TempDir::new().expect("temp dir");
        let mut storage = storage_in(&dir);
        storage.reload().expect("missing file is fine");
        assert!(storage.all().is_empty());
    }

    #[test]
    fn test_reload_rejects_malformed_file() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("file.json");
        std::fs::write(&path, "not json at all").expect("write");
        let mut storage = FileStorage::new(path);
        assert!(storage.reload().is_err());
    }

    #[test]
    fn test_delete_removes_entry() {
        let dir = TempDir::new().expect("temp dir");
        let mut storage = storage_in(&dir);
        let record = Record::new("State");
        let key = record.key();
        storage.add(record);

        assert!(storage.delete(&key));
        assert!(!storage.delete(&key));
        assert!(!storage.contains(&key));
    }

    #[test]
    fn test_count_class_only_counts_matching_records() {
        let dir = TempDir::new().expect("temp dir");
        let mut storage = storage_in(&dir);
        storage.add(Record::new("User"));
        storage.add(Record::new("User"));
        storage.add(Record::new("City"));

        assert_eq!(storage.count_class("User"), 2);
        assert_eq!(storage.count_class("City"), 1);
        assert_eq!(storage.count_class("Review"), 0);
    }
}
