//! Local submission storage
//!
//! Contact submissions made while the backend is unavailable are kept in a
//! key-value store under a single key, as a JSON array in insertion order.
//! Every append reads the whole log, pushes one record and writes the whole
//! log back. Two processes appending at the same moment race and the last
//! writer wins; appends through one `SubmissionLog` are serialized within a
//! process, but nothing here locks across processes.

use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tempfile::NamedTempFile;

use crate::contact::ContactSubmission;
use crate::error::{ClientError, Result};

/// Minimal durable key-value storage
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStore: Send + Sync {
    /// Read the value under `key`, `None` when it was never written
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value under `key`
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`. Deleting a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Stores each key as `<dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
            && !key.starts_with('.');
        if !valid {
            return Err(ClientError::storage(format!("invalid storage key: {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ClientError::storage(format!(
                "failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).map_err(|e| {
            ClientError::storage(format!("failed to create {}: {}", self.dir.display(), e))
        })?;

        // Readers see the old log or the new one, never half of either
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|e| {
            ClientError::storage(format!("failed to create temp file in {}: {}", self.dir.display(), e))
        })?;
        tmp.write_all(value.as_bytes()).map_err(|e| {
            ClientError::storage(format!("failed to write {}: {}", tmp.path().display(), e))
        })?;
        tmp.persist(&path).map_err(|e| {
            ClientError::storage(format!("failed to replace {}: {}", path.display(), e.error))
        })?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::storage(format!(
                "failed to remove {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

/// In-process store, lost when the process exits
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| ClientError::storage("memory store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| ClientError::storage("memory store lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| ClientError::storage("memory store lock poisoned"))?;
        entries.remove(key);
        Ok(())
    }
}

/// Append-only log of offline contact submissions.
///
/// Appends and clears through one log (or its clones) are serialized, so
/// concurrent submissions in a process never overwrite each other.
#[derive(Clone)]
pub struct SubmissionLog {
    store: Arc<dyn KeyValueStore>,
    key: String,
    write_lock: Arc<Mutex<()>>,
}

impl std::fmt::Debug for SubmissionLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionLog").field("key", &self.key).finish()
    }
}

impl SubmissionLog {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// All stored submissions in insertion order.
    ///
    /// A missing key or content that does not parse as a submission list
    /// reads as an empty log.
    pub fn entries(&self) -> Result<Vec<ContactSubmission>> {
        self.load().map_err(|e| {
            ClientError::storage(format!("Failed to read offline submissions: {}", e))
        })
    }

    /// Append one submission and return the new log length
    pub fn append(&self, submission: ContactSubmission) -> Result<usize> {
        let _guard = self.lock()?;

        let mut entries = self.load().map_err(save_failed)?;
        entries.push(submission);

        let encoded = serde_json::to_string(&entries).map_err(|e| {
            ClientError::storage(format!("Failed to save offline submission: {}", e))
        })?;
        self.store.set(&self.key, &encoded).map_err(save_failed)?;

        tracing::debug!(key = %self.key, entries = entries.len(), "offline submission stored");
        Ok(entries.len())
    }

    /// Drop every stored submission and return how many there were
    pub fn clear(&self) -> Result<usize> {
        let _guard = self.lock()?;
        let count = self.entries()?.len();
        self.store.remove(&self.key)?;
        Ok(count)
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| ClientError::storage("submission log lock poisoned"))
    }

    fn load(&self) -> Result<Vec<ContactSubmission>> {
        let Some(raw) = self.store.get(&self.key)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&raw) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                tracing::warn!(
                    key = %self.key,
                    error = %e,
                    "stored submissions are not readable, starting a new log"
                );
                Ok(Vec::new())
            }
        }
    }
}

fn save_failed(err: ClientError) -> ClientError {
    ClientError::storage(format!("Failed to save offline submission: {}", err))
}
