use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::StoreError;

/// Object-safe key/value persistence seam.
///
/// `load` returns `None` for missing or unreadable entries; typed fallback
/// behavior lives in [`KeyValueStoreExt::load_or`].
pub trait KeyValueStore: Send + Sync {
    fn load(&self, key: &str) -> Option<Value>;
    fn save(&self, key: &str, value: &Value) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Typed helpers layered over the raw JSON interface.
pub trait KeyValueStoreExt: KeyValueStore {
    /// Load and decode a value, falling back to `default` on any failure.
    /// Corrupt entries never raise; they are logged and replaced by the
    /// default.
    fn load_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let Some(value) = self.load(key) else {
            return default;
        };

        match serde_json::from_value(value) {
            Ok(decoded) => decoded,
            Err(error) => {
                log::warn!("ignoring corrupt entry for key '{key}': {error}");
                default
            }
        }
    }

    fn save_value<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let encoded =
            serde_json::to_value(value).map_err(|source| StoreError::serialize(key, source))?;
        self.save(key, &encoded)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStoreExt for S {}

/// One JSON file per key under a root directory.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|source| StoreError::io("creating store directory", &root, source))?;
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", sanitize_key(key)))
    }
}

impl KeyValueStore for FileStore {
    fn load(&self, key: &str) -> Option<Value> {
        let path = self.entry_path(key);
        let raw = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(error) => {
                log::warn!("unreadable store entry at {}: {error}", path.display());
                None
            }
        }
    }

    fn save(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let path = self.entry_path(key);
        let encoded = serde_json::to_string(value)
            .map_err(|source| StoreError::serialize(key, source))?;
        fs::write(&path, encoded)
            .map_err(|source| StoreError::io("writing store entry", &path, source))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.entry_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::io("removing store entry", &path, source)),
        }
    }
}

/// In-memory store for tests and demos.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Option<Value> {
        lock_unpoisoned(&self.entries).get(key).cloned()
    }

    fn save(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        lock_unpoisoned(&self.entries).insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        lock_unpoisoned(&self.entries).remove(key);
        Ok(())
    }
}

fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            ':' | '/' | '\\' | ' ' => '-',
            _ => c,
        })
        .collect()
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
