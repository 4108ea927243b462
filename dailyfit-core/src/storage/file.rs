use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use super::{Change, KeyValueStore, StorageError};

const STORE_FILENAME: &str = "store.json";

/// Store backed by a single JSON file in the data directory.
///
/// The whole file is read once on open and rewritten on every change, once
/// per [`KeyValueStore::apply`] batch. Writes go to a temporary file that is
/// then renamed over the old one.
#[derive(Debug)]
pub struct FileStore {
    data_dir: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Opens the store in `data_dir`, starting empty when no file exists yet.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let data_dir = data_dir.into();
        let path = data_dir.join(STORE_FILENAME);

        let entries = match fs::read_to_string(&path) {
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|e| StorageError::Corrupt(path, e))?
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(StorageError::IoError(path, e)),
        };

        Ok(Self {
            data_dir,
            entries: Mutex::new(entries),
        })
    }

    /// Returns the full path of the store file.
    pub fn path(&self) -> PathBuf {
        self.data_dir.join(STORE_FILENAME)
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        fs::create_dir_all(&self.data_dir)
            .map_err(|e| StorageError::IoError(self.data_dir.clone(), e))?;

        let path = self.path();
        let tmp = self.data_dir.join(format!("{}.tmp", STORE_FILENAME));
        let bytes = serde_json::to_vec_pretty(entries)
            .map_err(|e| StorageError::Corrupt(path.clone(), e))?;

        fs::write(&tmp, bytes).map_err(|e| StorageError::IoError(tmp.clone(), e))?;
        fs::rename(&tmp, &path).map_err(|e| StorageError::IoError(path, e))?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }

    fn apply(&self, changes: &[Change]) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut changed = false;
        for change in changes {
            changed |= match change {
                Change::Set(key, value) => {
                    entries.insert(key.clone(), value.clone()).as_ref() != Some(value)
                }
                Change::Remove(key) => entries.remove(key).is_some(),
            };
        }
        if changed {
            self.flush(&entries)?;
        }
        Ok(())
    }
}
