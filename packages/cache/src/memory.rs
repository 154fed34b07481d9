//! In-process key/value store with per-entry expiry.

use std::collections::BTreeMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::{CacheError, KeyValueStore};

#[derive(Debug, Clone)]
struct StoredValue {
    value: String,
    expires_at: Option<Instant>,
}

impl StoredValue {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// A [`KeyValueStore`] backed by a `RwLock<BTreeMap>`.
///
/// Expired entries are dropped lazily on read, or in bulk with
/// [`MemoryStore::purge_expired`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, StoredValue>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes every expired entry and returns how many were dropped.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Poisoned`] if the lock is poisoned.
    pub fn purge_expired(&self) -> Result<usize, CacheError> {
        let now = Instant::now();
        let mut entries = self.entries.write().map_err(|_| CacheError::Poisoned)?;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        Ok(before - entries.len())
    }

    /// Number of entries currently held, including expired ones not yet
    /// purged.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Poisoned`] if the lock is poisoned.
    pub fn len(&self) -> Result<usize, CacheError> {
        Ok(self
            .entries
            .read()
            .map_err(|_| CacheError::Poisoned)?
            .len())
    }

    /// Whether the store holds no entries.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Poisoned`] if the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len()? == 0)
    }
}

#[async_trait::async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        {
            let entries = self.entries.read().map_err(|_| CacheError::Poisoned)?;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().map_err(|_| CacheError::Poisoned)?;
        // Re-check under the write lock: another writer may have refreshed it.
        if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            entries.remove(key);
            log::trace!("evicted expired cache entry {key}");
        }
        Ok(entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), CacheError> {
        let expires_at = ttl.and_then(|ttl| Instant::now().checked_add(ttl));
        let mut entries = self.entries.write().map_err(|_| CacheError::Poisoned)?;
        entries.insert(key.to_string(), StoredValue { value, expires_at });
        Ok(())
    }
}
