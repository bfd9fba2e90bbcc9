//! Storage Backend Module
//!
//! Persistent key-value namespaces the bounded store writes through to.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::error::StorageError;
use crate::lock::mutex_lock;

const SOURCE: &str = "store::backend";

// == Storage Backend ==
/// A flat string-to-string namespace, the host's per-origin persistent storage.
///
/// Implementations report failures instead of panicking; the bounded store
/// decides how to degrade.
pub trait StorageBackend: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Every key currently present, in no particular order.
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

fn footprint(items: &HashMap<String, String>) -> usize {
    items.iter().map(|(k, v)| k.len() + v.len()).sum()
}

// == Memory Backend ==
/// In-process namespace with an optional byte quota on keys + values.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    items: Mutex<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend that rejects writes pushing usage past `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            items: Mutex::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Bytes used by keys and values.
    pub fn used_bytes(&self) -> usize {
        footprint(&mutex_lock(&self.items, SOURCE, "used_bytes"))
    }
}

impl StorageBackend for MemoryBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(mutex_lock(&self.items, SOURCE, "get_item").get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = mutex_lock(&self.items, SOURCE, "set_item");
        if let Some(quota) = self.quota_bytes {
            let replaced = items.get(key).map(|v| key.len() + v.len()).unwrap_or(0);
            let projected = footprint(&items) - replaced + key.len() + value.len();
            if projected > quota {
                return Err(StorageError::QuotaExceeded(key.to_string()));
            }
        }
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        mutex_lock(&self.items, SOURCE, "remove_item").remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(mutex_lock(&self.items, SOURCE, "keys").keys().cloned().collect())
    }
}

// == File Backend ==
/// Namespace persisted as a single JSON object on disk.
///
/// Every mutation rewrites the file through a sibling temp file and a rename,
/// so a crash leaves either the old or the new contents.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    items: Mutex<HashMap<String, String>>,
}

impl FileBackend {
    /// Opens (or starts) the namespace stored at `path`.
    ///
    /// A missing file is an empty namespace. A corrupt file is logged and
    /// replaced on the next write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let items = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                warn!(path = %path.display(), error = %err, "Discarding unreadable storage file");
                HashMap::new()
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => return Err(err.into()),
        };
        debug!(path = %path.display(), keys = items.len(), "Opened file storage");

        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, items: &HashMap<String, String>) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(items)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, encoded)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl StorageBackend for FileBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(mutex_lock(&self.items, SOURCE, "get_item").get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = mutex_lock(&self.items, SOURCE, "set_item");
        let previous = items.insert(key.to_string(), value.to_string());
        if let Err(err) = self.flush(&items) {
            // Keep memory consistent with what is on disk
            match previous {
                Some(old) => items.insert(key.to_string(), old),
                None => items.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = mutex_lock(&self.items, SOURCE, "remove_item");
        if items.remove(key).is_some() {
            self.flush(&items)?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(mutex_lock(&self.items, SOURCE, "keys").keys().cloned().collect())
    }
}
