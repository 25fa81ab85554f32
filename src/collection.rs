//! A JSON array stored under a single key.
//!
//! Both stores follow the same pattern: load the whole array, change it in
//! memory, write the whole array back. [`JsonCollection`] owns that cycle and
//! a per-key write lock so only one read-modify-write is in flight at a time.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};

use crate::error::{DialerError, DialerResult};
use crate::persistence::{KeyValuePersistence, LoadOutcome};

pub struct JsonCollection<P, T> {
    persistence: Arc<P>,
    key: String,
    write_lock: Mutex<()>,
    _items: PhantomData<fn() -> T>,
}

impl<P, T> JsonCollection<P, T>
where
    P: KeyValuePersistence,
    T: Serialize + DeserializeOwned,
{
    pub fn new(persistence: Arc<P>, key: impl Into<String>) -> Self {
        Self {
            persistence,
            key: key.into(),
            write_lock: Mutex::new(()),
            _items: PhantomData,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn persistence(&self) -> &Arc<P> {
        &self.persistence
    }

    /// Acquire the write lock. Hold the guard across a whole
    /// load/modify/store cycle.
    pub async fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    /// Load the collection for display. Never fails.
    pub async fn load(&self) -> LoadOutcome<T> {
        match self.persistence.get_item(&self.key).await {
            Ok(None) => LoadOutcome::Loaded(Vec::new()),
            Ok(Some(raw)) => match serde_json::from_str::<Vec<T>>(&raw) {
                Ok(items) => LoadOutcome::Loaded(items),
                Err(e) => {
                    tracing::warn!(key = %self.key, error = %e, "Stored collection is unparsable, treating as empty");
                    LoadOutcome::Recovered {
                        reason: format!("unparsable value: {}", e),
                    }
                }
            },
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Failed to read collection, treating as empty");
                LoadOutcome::Recovered {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Load the collection as the base of a mutation.
    ///
    /// An unparsable value starts over from empty, but a backend that cannot
    /// be read fails the mutation so stored data is not overwritten blind.
    pub async fn load_for_update(&self) -> DialerResult<Vec<T>> {
        match self.persistence.get_item(&self.key).await? {
            None => Ok(Vec::new()),
            Some(raw) => match serde_json::from_str::<Vec<T>>(&raw) {
                Ok(items) => Ok(items),
                Err(e) => {
                    tracing::warn!(key = %self.key, error = %e, "Replacing unparsable collection");
                    Ok(Vec::new())
                }
            },
        }
    }

    /// Serialize and write the whole collection.
    pub async fn store(&self, items: &[T]) -> DialerResult<()> {
        let json = serde_json::to_string(items)?;
        self.persistence
            .set_item(&self.key, &json)
            .await
            .map_err(DialerError::from)?;
        tracing::debug!(key = %self.key, count = items.len(), "Collection stored");
        Ok(())
    }

    /// Delete the key entirely.
    pub async fn remove(&self) -> DialerResult<()> {
        self.persistence.remove_item(&self.key).await?;
        tracing::info!(key = %self.key, "Collection cleared");
        Ok(())
    }
}
