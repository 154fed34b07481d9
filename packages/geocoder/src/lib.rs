#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geocoding for free-text search locations.
//!
//! [`Geocoder::resolve`] turns a user's location string ("San Jose, CA")
//! into a [`Coordinate`]:
//!
//! 1. The query is normalized ([`normalize::normalize_query`]).
//! 2. The normalized form is looked up in a persistent [`KeyValueStore`].
//! 3. On a miss, the configured provider (Nominatim, see
//!    [`service_registry`]) is called with a bounded timeout and any hit
//!    is written back to the store.
//!
//! Provider errors, timeouts and store failures are logged and resolve to
//! `None`; they never reach the caller.

pub mod nominatim;
pub mod normalize;
pub mod service_registry;

use std::sync::Arc;
use std::time::Duration;

use nextclimb_cache::KeyValueStore;
use nextclimb_segment_models::{Coordinate, InvalidCoordinateError};
use thiserror::Error;

pub use normalize::normalize_query;

/// Default upper bound on a single provider lookup.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from geocoding providers.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// The provider returned coordinates outside the WGS84 range.
    #[error(transparent)]
    InvalidCoordinate(#[from] InvalidCoordinateError),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// The provider did not answer in time.
    #[error("Geocoding timed out after {0:?}")]
    Timeout(Duration),
}

/// A service that resolves a free-text query to a single coordinate.
#[async_trait::async_trait]
pub trait GeocodeProvider: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Looks up `query`. `Ok(None)` means the provider found no match.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the request fails or the response is
    /// malformed.
    async fn geocode(&self, query: &str) -> Result<Option<Coordinate>, GeocodeError>;
}

/// Cached location resolver.
#[derive(Clone)]
pub struct Geocoder {
    provider: Arc<dyn GeocodeProvider>,
    store: Arc<dyn KeyValueStore>,
    timeout: Duration,
}

impl Geocoder {
    /// Creates a resolver over `provider` that caches hits in `store`.
    #[must_use]
    pub fn new(provider: Arc<dyn GeocodeProvider>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            provider,
            store,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Overrides the per-lookup timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolves a free-text location to coordinates.
    ///
    /// Returns `None` when the location is unknown or the provider is
    /// unavailable.
    pub async fn resolve(&self, query: &str) -> Option<Coordinate> {
        let normalized = normalize_query(query);
        if normalized.is_empty() {
            log::debug!("Empty location query {query:?}");
            return None;
        }

        if let Some(coordinate) = self.lookup_cached(&normalized).await {
            log::info!("Returning cached coordinates for {normalized:?}");
            return Some(coordinate);
        }

        let coordinate = match self.lookup_provider(&normalized).await {
            Ok(Some(coordinate)) => coordinate,
            Ok(None) => {
                log::info!("{} found no match for {normalized:?}", self.provider.name());
                return None;
            }
            Err(e) => {
                log::error!(
                    "{} lookup for {normalized:?} failed: {e}",
                    self.provider.name()
                );
                return None;
            }
        };

        log::info!(
            "Geocoded {normalized:?} to ({}, {})",
            coordinate.latitude,
            coordinate.longitude
        );
        self.store_cached(&normalized, coordinate).await;

        Some(coordinate)
    }

    async fn lookup_provider(&self, normalized: &str) -> Result<Option<Coordinate>, GeocodeError> {
        tokio::time::timeout(self.timeout, self.provider.geocode(normalized))
            .await
            .map_err(|_| GeocodeError::Timeout(self.timeout))?
    }

    async fn lookup_cached(&self, normalized: &str) -> Option<Coordinate> {
        let raw = match self.store.get(normalized).await {
            Ok(raw) => raw?,
            Err(e) => {
                log::warn!("Geocode cache read failed for {normalized:?}: {e}");
                return None;
            }
        };

        serde_json::from_str(&raw)
            .map_err(|e| log::warn!("Ignoring undecodable geocode cache entry {normalized:?}: {e}"))
            .ok()
    }

    async fn store_cached(&self, normalized: &str, coordinate: Coordinate) {
        let json = match serde_json::to_string(&coordinate) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Failed to serialize coordinates for {normalized:?}: {e}");
                return;
            }
        };

        if let Err(e) = self.store.set(normalized, json, None).await {
            log::warn!("Geocode cache write failed for {normalized:?}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use nextclimb_cache::MemoryStore;

    use super::*;

    /// Provider double that records the queries it receives.
    struct FakeProvider {
        result: fn() -> Result<Option<Coordinate>, GeocodeError>,
        delay: Duration,
        calls: AtomicUsize,
        queries: Mutex<Vec<String>>,
    }

    impl FakeProvider {
        fn new(result: fn() -> Result<Option<Coordinate>, GeocodeError>) -> Self {
            Self {
                result,
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
                queries: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl GeocodeProvider for FakeProvider {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn geocode(&self, query: &str) -> Result<Option<Coordinate>, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.queries.lock().unwrap().push(query.to_string());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            (self.result)()
        }
    }

    fn san_jose() -> Result<Option<Coordinate>, GeocodeError> {
        Ok(Some(Coordinate::new(37.336_166_3, -121.890_591).unwrap()))
    }

    fn nowhere() -> Result<Option<Coordinate>, GeocodeError> {
        Ok(None)
    }

    fn unavailable() -> Result<Option<Coordinate>, GeocodeError> {
        Err(GeocodeError::Parse {
            message: "Nominatim returned status 503 Service Unavailable".to_string(),
        })
    }

    #[tokio::test]
    async fn caches_hits_under_normalized_query() {
        let provider = Arc::new(FakeProvider::new(san_jose));
        let store = Arc::new(MemoryStore::new());
        let geocoder = Geocoder::new(provider.clone(), store.clone());

        let first = geocoder.resolve("San Jose, CA.").await;
        let second = geocoder.resolve("  san   jose ca ").await;

        assert_eq!(first, second);
        assert!(first.is_some());
        assert_eq!(provider.calls(), 1);
        assert_eq!(*provider.queries.lock().unwrap(), vec!["san jose ca"]);
        assert!(store.get("san jose ca").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn unknown_location_is_absent_and_not_cached() {
        let provider = Arc::new(FakeProvider::new(nowhere));
        let store = Arc::new(MemoryStore::new());
        let geocoder = Geocoder::new(provider.clone(), store.clone());

        assert!(geocoder.resolve("Atlantis").await.is_none());
        assert!(geocoder.resolve("atlantis").await.is_none());
        assert_eq!(provider.calls(), 2);
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn provider_errors_resolve_to_none() {
        let geocoder = Geocoder::new(
            Arc::new(FakeProvider::new(unavailable)),
            Arc::new(MemoryStore::new()),
        );
        assert!(geocoder.resolve("San Jose").await.is_none());
    }

    #[tokio::test]
    async fn provider_timeout_resolves_to_none() {
        let mut provider = FakeProvider::new(san_jose);
        provider.delay = Duration::from_millis(200);
        let store = Arc::new(MemoryStore::new());
        let geocoder = Geocoder::new(Arc::new(provider), store.clone())
            .with_timeout(Duration::from_millis(20));

        assert!(geocoder.resolve("San Jose").await.is_none());
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn blank_query_skips_provider() {
        let provider = Arc::new(FakeProvider::new(san_jose));
        let geocoder = Geocoder::new(provider.clone(), Arc::new(MemoryStore::new()));

        assert!(geocoder.resolve(" ., ").await.is_none());
        assert_eq!(provider.calls(), 0);
    }
}
