use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store i/o failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("store value could not be (de)serialized: {0}")]
    Json(#[from] serde_json::Error),
    #[error("store is read-only")]
    ReadOnly,
}

/// Best-effort key-value persistence.
///
/// Implementors provide raw JSON access; the provided `get_or`/`put` helpers
/// swallow failures, log them, and fall back to the caller's default.
pub trait KeyValueStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError>;
    fn store(&mut self, key: &str, value: Value) -> Result<(), StoreError>;
    fn remove_all(&mut self) -> Result<(), StoreError>;

    fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T
    where
        Self: Sized,
    {
        match self.load(key) {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!("stored value for '{}' is malformed: {}", key, e);
                    default
                }
            },
            Ok(None) => default,
            Err(e) => {
                tracing::warn!("error reading '{}' from store: {}", key, e);
                default
            }
        }
    }

    /// Returns whether the value reached the store.
    fn put<T: Serialize>(&mut self, key: &str, value: &T) -> bool
    where
        Self: Sized,
    {
        let result = serde_json::to_value(value)
            .map_err(StoreError::from)
            .and_then(|v| self.store(key, v));

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("error saving '{}' to store: {}", key, e);
                false
            }
        }
    }

    fn clear(&mut self) -> bool
    where
        Self: Sized,
    {
        match self.remove_all() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("error clearing store: {}", e);
                false
            }
        }
    }
}

/// All keys kept in a single JSON object on disk.
///
/// Every write rewrites the whole file through a temporary sibling and a
/// rename, so a crash never leaves a half written document behind.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl JsonFileStore {
    /// Opens the store at `path`. A missing file yields an empty store; an
    /// unreadable one is moved to `<name>.json.bak` first so that later writes
    /// cannot replace its contents.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match Self::read_entries(&path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("starting with empty store: {}", e);
                Self::set_aside(&path);
                Map::new()
            }
        };
        tracing::debug!("opened store at {} with {} keys", path.display(), entries.len());
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where an unreadable store file is kept
    pub fn backup_path(&self) -> PathBuf {
        Self::backup_for(&self.path)
    }

    fn backup_for(path: &Path) -> PathBuf {
        path.with_extension("json.bak")
    }

    fn set_aside(path: &Path) {
        let backup = Self::backup_for(path);
        match fs::rename(path, &backup) {
            Ok(()) => tracing::warn!(
                "unreadable store moved to {}",
                backup.display()
            ),
            Err(e) => tracing::warn!(
                "could not move unreadable store {}: {}",
                path.display(),
                e
            ),
        }
    }

    fn read_entries(path: &Path) -> Result<Map<String, Value>, StoreError> {
        if !path.exists() {
            return Ok(Map::new());
        }
        let bytes = fs::read(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn flush(&self, entries: &Map<String, Value>) -> Result<(), StoreError> {
        let io_err = |source: std::io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let data = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)
    }
}

impl KeyValueStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn store(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut next = self.entries.clone();
        next.insert(key.to_string(), value);
        self.flush(&next)?;
        self.entries = next;
        Ok(())
    }

    fn remove_all(&mut self) -> Result<(), StoreError> {
        let empty = Map::new();
        self.flush(&empty)?;
        self.entries = empty;
        Ok(())
    }
}

/// In-process store, used by tests and when no store file is wanted.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, Value>,
    read_only: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects every write, for exercising the skip-save path.
    pub fn read_only() -> Self {
        Self {
            entries: BTreeMap::new(),
            read_only: true,
        }
    }

    pub fn with_entry<T: Serialize>(mut self, key: &str, value: &T) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.entries.insert(key.to_string(), v);
        }
        self
    }

    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn store(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove_all(&mut self) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        self.entries.clear();
        Ok(())
    }
}
