//! Local durable cache
//!
//! A small key/value store for JSON snapshots. Access is synchronous: the
//! job store writes through it while holding its lock.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use cp_core::PlanError;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, instrument};

/// Cache errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid cache key: {0}")]
    InvalidKey(String),
    #[error("Corrupt cache entry {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

impl From<CacheError> for PlanError {
    fn from(err: CacheError) -> Self {
        PlanError::Cache(err.to_string())
    }
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Cache trait - unified interface for local cache backends
pub trait LocalCache: Send + Sync {
    /// Read the value stored under `key`; `None` when absent
    fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn put(&self, key: &str, value: &str) -> CacheResult<()>;

    /// Remove `key`; absent keys are not an error
    fn remove(&self, key: &str) -> CacheResult<()>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Keys become file names, so only a conservative alphabet is allowed
fn validate_key(key: &str) -> CacheResult<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(CacheError::InvalidKey(key.to_string()))
    }
}

/// One JSON file per key under a directory
#[derive(Debug, Clone)]
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Create the cache directory if needed
    pub fn open(root: impl AsRef<Path>) -> CacheResult<Self> {
        let cache = Self::new(root);
        fs::create_dir_all(&cache.root)?;
        Ok(cache)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve_path(&self, key: &str) -> CacheResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(format!("{}.json", key)))
    }
}

impl LocalCache for FileCache {
    #[instrument(skip(self), fields(cache = "file"))]
    fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let path = self.resolve_path(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    #[instrument(skip(self, value), fields(cache = "file", bytes = value.len()))]
    fn put(&self, key: &str, value: &str) -> CacheResult<()> {
        let path = self.resolve_path(key)?;
        fs::create_dir_all(&self.root)?;

        // write-then-rename so readers never see a half-written snapshot
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;

        debug!(path = ?path, "Cache entry written");
        Ok(())
    }

    #[instrument(skip(self), fields(cache = "file"))]
    fn remove(&self, key: &str) -> CacheResult<()> {
        let path = self.resolve_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn name(&self) -> &str {
        "file"
    }
}

/// Process-local cache, used in tests and as a fallback
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl LocalCache for MemoryCache {
    fn get(&self, key: &str) -> CacheResult<Option<String>> {
        validate_key(key)?;
        Ok(self.entries.lock().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> CacheResult<()> {
        validate_key(key)?;
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> CacheResult<()> {
        validate_key(key)?;
        self.entries.lock().remove(key);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::open(dir.path().join("nested")).unwrap();

        assert_eq!(cache.get("jobs").unwrap(), None);
        cache.put("jobs", "[]").unwrap();
        assert_eq!(cache.get("jobs").unwrap().as_deref(), Some("[]"));
        assert!(dir.path().join("nested/jobs.json").exists());

        cache.put("jobs", "[1]").unwrap();
        assert_eq!(cache.get("jobs").unwrap().as_deref(), Some("[1]"));

        cache.remove("jobs").unwrap();
        cache.remove("jobs").unwrap();
        assert_eq!(cache.get("jobs").unwrap(), None);
    }

    #[test]
    fn test_file_cache_creates_directory_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().join("later"));
        cache.put("jobs", "[]").unwrap();
        assert_eq!(cache.get("jobs").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());
        assert!(matches!(
            cache.put("../escape", "x"),
            Err(CacheError::InvalidKey(_))
        ));
        assert!(MemoryCache::new().get("").is_err());
    }

    #[test]
    fn test_memory_cache() {
        let cache = MemoryCache::new();
        cache.put("jobs", "[]").unwrap();
        assert_eq!(cache.len(), 1);
        cache.remove("jobs").unwrap();
        assert!(cache.is_empty());
    }
}
