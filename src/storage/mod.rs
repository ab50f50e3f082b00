use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::{ConfigPaths, StorageOptions};
use crate::error::StorageError;
use crate::journal::Entry;

pub mod bootstrap;

pub use bootstrap::{BundledDataset, DefaultDataset, FileDataset, NoDataset};

pub const DEFAULT_STORAGE_KEY: &str = "journalEntries";

const VALUE_EXTENSION: &str = "json";
const TMP_EXTENSION: &str = "json.tmp";

/// String-valued key-value persistence, the shape of a browser's local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Persistence for the entry list as a whole.
pub trait EntryStorage {
    /// `None` when nothing has been stored yet.
    fn load(&self) -> Result<Option<Vec<Entry>>, StorageError>;
    fn save(&self, entries: &[Entry]) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
}

/// One file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: Arc<PathBuf>,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir: Arc::new(dir) })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn value_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{VALUE_EXTENSION}"))
    }

    fn tmp_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{TMP_EXTENSION}"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.value_path(key);
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let tmp = self.tmp_path(key);
        let path = self.value_path(key);
        let write = || -> io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp, &path)
        };
        write().map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.value_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }
}

/// In-memory store; clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.lock().contains_key(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values.lock().remove(key);
        Ok(())
    }
}

/// The entry list stored as one JSON array under a fixed key.
#[derive(Debug, Clone)]
pub struct KeyedStorage<K> {
    backend: K,
    key: String,
}

impl<K: KeyValueStore> KeyedStorage<K> {
    pub fn new(backend: K, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub fn backend(&self) -> &K {
        &self.backend
    }
}

impl<K: KeyValueStore> EntryStorage for KeyedStorage<K> {
    fn load(&self) -> Result<Option<Vec<Entry>>, StorageError> {
        let Some(raw) = self.backend.get(&self.key)? else {
            return Ok(None);
        };
        let entries = serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt {
            key: self.key.clone(),
            source,
        })?;
        Ok(Some(entries))
    }

    fn save(&self, entries: &[Entry]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(entries).map_err(StorageError::Encode)?;
        self.backend.set(&self.key, &raw)
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.backend.remove(&self.key)
    }
}

pub type FileEntryStorage = KeyedStorage<FileStore>;

pub fn init(paths: &ConfigPaths, options: &StorageOptions) -> Result<FileEntryStorage, StorageError> {
    let backend = FileStore::open(&paths.storage_dir)?;
    tracing::debug!(dir = %backend.dir().display(), key = %options.key, "opened entry storage");
    Ok(KeyedStorage::new(backend, options.key.clone()))
}
