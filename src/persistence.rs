//! Key/value persistence backends.
//!
//! The stores keep one JSON document per key on top of a device-level
//! asynchronous string key/value API. This module defines that seam as a
//! trait and ships two implementations:
//!
//! - [`MemoryPersistence`]: in-process map with fault injection, for tests
//!   and previews
//! - [`FilePersistence`]: one file per key inside a data directory

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::PersistenceError;

/// Asynchronous string key/value storage.
///
/// A missing key reads as `Ok(None)`. Implementations must be safe to share
/// between the stores of one application.
pub trait KeyValuePersistence: Send + Sync {
    /// Read the value stored under `key`.
    fn get_item(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>, PersistenceError>> + Send;

    /// Store `value` under `key`, replacing any previous value.
    fn set_item(
        &self,
        key: &str,
        value: &str,
    ) -> impl std::future::Future<Output = Result<(), PersistenceError>> + Send;

    /// Delete `key`. Deleting a missing key succeeds.
    fn remove_item(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<(), PersistenceError>> + Send;

    /// Name of the stored document `key` resolves to. Keys with the same
    /// document name share one value.
    fn document_name(&self, key: &str) -> String {
        key.to_string()
    }
}

/// File stem for `key`: characters outside `[A-Za-z0-9_-]` become `_`.
pub fn file_stem_for(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Result of loading a collection.
///
/// A read fault is never an error for callers, but it stays visible here so
/// "empty because there is no data" and "empty because the read failed" can
/// be told apart.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome<T> {
    /// The key was read (a missing key loads as an empty collection)
    Loaded(Vec<T>),
    /// The read failed or the stored value was unparsable
    Recovered { reason: String },
}

impl<T> LoadOutcome<T> {
    /// Collapse to the public contract: items, or empty on a fault.
    pub fn into_items(self) -> Vec<T> {
        match self {
            LoadOutcome::Loaded(items) => items,
            LoadOutcome::Recovered { .. } => Vec::new(),
        }
    }

    pub fn is_recovered(&self) -> bool {
        matches!(self, LoadOutcome::Recovered { .. })
    }
}

/// In-memory backend.
///
/// Counts writes and can be told to fail reads or writes, which is how the
/// fault paths of the stores are exercised.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    items: Mutex<HashMap<String, String>>,
    writes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `set_item`/`remove_item` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Raw value under `key`, bypassing fault injection.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.items.lock().ok()?.get(key).cloned()
    }

    /// Store a raw value without counting it as a write.
    pub fn insert_raw(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.map()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn map(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, PersistenceError> {
        self.items
            .lock()
            .map_err(|_| PersistenceError::Unavailable("memory store lock poisoned".to_string()))
    }

    fn check_writable(&self) -> Result<(), PersistenceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable(
                "writes disabled".to_string(),
            ));
        }
        Ok(())
    }
}

impl KeyValuePersistence for MemoryPersistence {
    async fn get_item(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable("reads disabled".to_string()));
        }
        Ok(self.map()?.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.check_writable()?;
        self.map()?.insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), PersistenceError> {
        self.check_writable()?;
        self.map()?.remove(key);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// File-backed store: each key is a `<key>.json` file under `dir`.
#[derive(Debug, Clone)]
pub struct FilePersistence {
    dir: PathBuf,
}

impl FilePersistence {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`. Characters outside `[A-Za-z0-9_-]`
    /// are replaced so any key maps to a single file name.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem_for(key)))
    }
}

fn map_io(err: std::io::Error) -> PersistenceError {
    match err.kind() {
        ErrorKind::PermissionDenied => PersistenceError::Denied(err.to_string()),
        _ => PersistenceError::Io(err),
    }
}

impl KeyValuePersistence for FilePersistence {
    async fn get_item(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(map_io(e)),
        }
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(map_io)?;

        // Write beside the target then rename, so a crash never leaves half a document.
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await.map_err(map_io)?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
                tracing::warn!(path = %tmp.display(), error = %cleanup, "Failed to remove temporary file");
            }
            return Err(map_io(e));
        }
        Ok(())
    }

    fn document_name(&self, key: &str) -> String {
        file_stem_for(key)
    }

    async fn remove_item(&self, key: &str) -> Result<(), PersistenceError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(map_io(e)),
        }
    }
}
