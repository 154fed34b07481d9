//! Persistent key/value store backed by a single JSON file.
//!
//! The whole map is loaded on open and rewritten (via a temp file and
//! rename) on every `set`. Meant for small, slowly growing tables such as
//! geocode lookups, not for hot search results.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{CacheError, KeyValueStore};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FileEntry {
    value: String,
    /// Unix timestamp (seconds) after which the entry is stale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<i64>,
}

impl FileEntry {
    fn is_expired(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// A [`KeyValueStore`] persisted to a JSON file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, FileEntry>>,
}

impl JsonFileStore {
    /// Opens the store at `path`, creating parent directories as needed.
    /// A missing file starts an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the directory cannot be created or an
    /// existing file cannot be read or parsed.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        log::info!(
            "Opened key/value store at {} ({} entries)",
            path.display(),
            entries.len()
        );

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    async fn persist(&self, entries: &BTreeMap<String, FileEntry>) -> Result<(), CacheError> {
        let json = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Utc::now().timestamp();
        let entries = self.entries.lock().await;
        Ok(entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), CacheError> {
        let expires_at = ttl.map(|ttl| {
            Utc::now()
                .timestamp()
                .saturating_add(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX))
        });

        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), FileEntry { value, expires_at });
        self.persist(&entries).await
    }
}
