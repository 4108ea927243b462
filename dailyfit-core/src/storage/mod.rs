//! Durable key-value persistence for ledger, goal and rollover state.
//!
//! Values are JSON strings. Two stores are provided: [`FileStore`], which
//! keeps every key in one JSON file under the data directory, and
//! [`MemoryStore`] for tests and throwaway sessions.

mod file;
mod memory;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
use std::path::PathBuf;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Keys shared by the ledger, the goal store and the rollover manager.
pub mod keys {
    use chrono::NaiveDate;

    use crate::logical_day::day_key;

    pub const WATER_INTAKE: &str = "@waterIntake";
    pub const STEPS_INTAKE: &str = "@stepsIntake";
    pub const CALORIES: &str = "@calories";
    pub const REMAINING_WATER: &str = "@remainingWater";
    pub const REMAINING_STEPS: &str = "@remainingSteps";
    pub const GOALS: &str = "@goals";
    pub const LAST_RESET_DATE: &str = "lastResetDate";
    pub const LAST_SUBMITTED_DATE: &str = "lastSubmittedDate";

    /// Key holding the four meal slots of `day`.
    pub fn meals(day: NaiveDate) -> String {
        format!("@meals:{}", day_key(day))
    }

    /// Water logged on `day`, kept even while its rollover is pending.
    pub fn water_intake_on(day: NaiveDate) -> String {
        format!("{}:{}", WATER_INTAKE, day_key(day))
    }

    /// Steps logged on `day`, kept even while its rollover is pending.
    pub fn steps_intake_on(day: NaiveDate) -> String {
        format!("{}:{}", STEPS_INTAKE, day_key(day))
    }
}

/// A string-keyed store. Implementations must be safe to share.
pub trait KeyValueStore: Send + Sync {
    /// Returns `Ok(None)` when the key has never been written.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Applies several changes in order. Stores that can write them as one
    /// update should override this.
    fn apply(&self, changes: &[Change]) -> Result<(), StorageError> {
        for change in changes {
            match change {
                Change::Set(key, value) => self.set(key, value)?,
                Change::Remove(key) => self.remove(key)?,
            }
        }
        Ok(())
    }
}

/// One write in a [`Batch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Set(String, String),
    Remove(String),
}

/// JSON writes collected for a single [`KeyValueStore::apply`] call.
#[derive(Debug, Default)]
pub struct Batch {
    changes: Vec<Change>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put<T: Serialize + ?Sized>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> Result<(), StorageError> {
        let key = key.into();
        let raw = serde_json::to_string(value).map_err(|e| StorageError::Json(key.clone(), e))?;
        self.changes.push(Change::Set(key, raw));
        Ok(())
    }

    pub fn remove(&mut self, key: impl Into<String>) {
        self.changes.push(Change::Remove(key.into()));
    }

    pub fn commit(self, store: &dyn KeyValueStore) -> Result<(), StorageError> {
        if self.changes.is_empty() {
            return Ok(());
        }
        store.apply(&self.changes)
    }
}

/// Reads and decodes a JSON value.
pub fn read_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match store.get(key)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StorageError::Json(key.to_string(), e)),
        None => Ok(None),
    }
}

/// Encodes and writes a JSON value.
pub fn write_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|e| StorageError::Json(key.to_string(), e))?;
    store.set(key, &raw)
}

/// Errors that can occur during storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// I/O error reading or writing the store file.
    IoError(PathBuf, io::Error),
    /// The store file is not a JSON object of strings.
    Corrupt(PathBuf, serde_json::Error),
    /// A value could not be encoded or decoded.
    Json(String, serde_json::Error),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::IoError(path, e) => {
                write!(f, "I/O error for {}: {}", path.display(), e)
            }
            StorageError::Corrupt(path, e) => {
                write!(f, "Store file {} is corrupt: {}", path.display(), e)
            }
            StorageError::Json(key, e) => write!(f, "Invalid JSON for key '{}': {}", key, e),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::IoError(_, e) => Some(e),
            StorageError::Corrupt(_, e) => Some(e),
            StorageError::Json(_, e) => Some(e),
        }
    }
}
