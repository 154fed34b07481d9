#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Key/value storage and the segment search result cache.
//!
//! Everything that needs shared mutable state goes through the
//! [`KeyValueStore`] trait so the search pipeline never depends on a
//! concrete backend:
//!
//! - [`MemoryStore`] keeps entries in process with per-entry expiry.
//! - [`JsonFileStore`] persists entries to a JSON file (used for geocode
//!   lookups that should survive restarts).
//!
//! [`SegmentCache`] layers the typed, 24-hour search result cache on top
//! of any store. It treats the cache as an optimization only: backend and
//! serialization failures are logged and read as a miss.

pub mod file;
pub mod memory;
pub mod segment_cache;

use std::time::Duration;

use thiserror::Error;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use segment_cache::{SEGMENT_CACHE_TTL, SegmentCache};

/// Errors from cache and store operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The store's lock was poisoned by a panicking writer.
    #[error("Cache lock poisoned")]
    Poisoned,

    /// Reading or writing the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Any other backend failure.
    #[error("Cache backend error: {message}")]
    Backend {
        /// Description of the failure.
        message: String,
    },
}

/// String-keyed storage with optional per-entry expiry.
///
/// Single `get`/`set` calls are atomic; concurrent writers to the same
/// key race and the last write wins.
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, or `None` if it was never set
    /// or has expired.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the backend is unavailable.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Stores `value` under `key`. With `ttl` of `None` the entry never
    /// expires.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the backend is unavailable.
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), CacheError>;
}
