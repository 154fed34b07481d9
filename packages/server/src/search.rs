//! Segment search orchestration.
//!
//! A search runs the credential pre-flight, geocodes the location, derives
//! the search box and its cache key, and either serves the cached result
//! or asks the segment provider, scores every candidate and caches the
//! non-empty list.

use std::sync::Arc;
use std::time::Duration;

use nextclimb_cache::SegmentCache;
use nextclimb_geocoder::Geocoder;
use nextclimb_scoring::score_segment;
use nextclimb_segment_models::{BoundingBox, Coordinate, InvalidCoordinateError, ScoredSegment};
use nextclimb_server_models::SearchSource;
use nextclimb_spatial::{
    BoundsError, DEFAULT_PRECISION, check_radius, compute_bounds, normalize_default,
    normalized_bounds,
};
use nextclimb_strava::{
    CredentialError, CredentialStore, ExploreQuery, REFRESH_BUFFER, SegmentProvider, StravaError,
};
use thiserror::Error;

/// Upper bound on a single segment provider call.
pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors surfaced to API clients.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The radius or location produced no usable search box.
    #[error(transparent)]
    Bounds(#[from] BoundsError),

    /// A corner of a requested box is outside the WGS84 range.
    #[error(transparent)]
    InvalidCoordinate(#[from] InvalidCoordinateError),

    /// The southwest corner is not south-west of the northeast corner.
    #[error("southwest corner ({sw_lat}, {sw_lng}) must not be north or east of northeast corner ({ne_lat}, {ne_lng})")]
    InvertedBounds {
        /// Southwest latitude.
        sw_lat: f64,
        /// Southwest longitude.
        sw_lng: f64,
        /// Northeast latitude.
        ne_lat: f64,
        /// Northeast longitude.
        ne_lng: f64,
    },

    /// The geocoder could not resolve the location.
    #[error("location not found: {location}")]
    LocationNotFound {
        /// The location as the client sent it.
        location: String,
    },

    /// The delegated credential could not be loaded or refreshed.
    #[error("Strava credentials unavailable: {0}")]
    Credentials(#[from] CredentialError),

    /// The segment provider failed.
    #[error("segment provider failed: {0}")]
    Provider(#[from] StravaError),

    /// The segment provider did not answer in time.
    #[error("segment provider timed out after {0:?}")]
    ProviderTimeout(Duration),
}

/// The segments for one search and where they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Cache hit or fresh fetch.
    pub source: SearchSource,
    /// Scored segments in provider order.
    pub segments: Vec<ScoredSegment>,
}

/// Builds a box from two client-supplied corners.
///
/// # Errors
///
/// Returns [`SearchError::InvalidCoordinate`] for out-of-range corners and
/// [`SearchError::InvertedBounds`] when the corners are swapped.
pub fn bounds_from_corners(
    sw_lat: f64,
    sw_lng: f64,
    ne_lat: f64,
    ne_lng: f64,
) -> Result<BoundingBox, SearchError> {
    let sw = Coordinate::new(sw_lat, sw_lng)?;
    let ne = Coordinate::new(ne_lat, ne_lng)?;

    if sw.latitude > ne.latitude || sw.longitude > ne.longitude {
        return Err(SearchError::InvertedBounds {
            sw_lat,
            sw_lng,
            ne_lat,
            ne_lng,
        });
    }

    Ok(BoundingBox::new(
        sw.latitude,
        sw.longitude,
        ne.latitude,
        ne.longitude,
    ))
}

/// Runs segment searches against the injected collaborators.
#[derive(Clone)]
pub struct SearchService {
    geocoder: Geocoder,
    cache: SegmentCache,
    credentials: Arc<dyn CredentialStore>,
    provider: Arc<dyn SegmentProvider>,
    query: ExploreQuery,
    timeout: Duration,
}

impl SearchService {
    /// Creates a service querying riding climbs of category 1 to 4.
    #[must_use]
    pub fn new(
        geocoder: Geocoder,
        cache: SegmentCache,
        credentials: Arc<dyn CredentialStore>,
        provider: Arc<dyn SegmentProvider>,
    ) -> Self {
        Self {
            geocoder,
            cache,
            credentials,
            provider,
            query: ExploreQuery::default(),
            timeout: PROVIDER_TIMEOUT,
        }
    }

    /// Overrides the segment provider timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Finds scored climbs within `radius_miles` of `location`.
    ///
    /// # Errors
    ///
    /// See [`SearchError`]. Cache failures are not errors; they read as a
    /// miss.
    pub async fn search(
        &self,
        location: &str,
        radius_miles: f64,
    ) -> Result<SearchOutcome, SearchError> {
        check_radius(radius_miles)?;
        self.preflight().await?;

        let center = self
            .geocoder
            .resolve(location)
            .await
            .ok_or_else(|| SearchError::LocationNotFound {
                location: location.to_string(),
            })?;

        let bounds = compute_bounds(center, radius_miles)?;
        let key = normalize_default(&bounds);

        if let Some(segments) = self.cache.get(&key).await {
            log::info!("Cache hit for {key} ({} segments)", segments.len());
            return Ok(SearchOutcome {
                source: SearchSource::Cached,
                segments,
            });
        }

        log::info!("Cache miss for {key}, querying segment provider");
        // Query the grid-aligned box so the cached list covers every search
        // that shares this key.
        let segments = self
            .fetch(&normalized_bounds(&bounds, DEFAULT_PRECISION))
            .await?;

        if segments.is_empty() {
            log::info!("No segments found for {key}, not caching");
        } else {
            self.cache.set(&key, &segments).await;
        }

        Ok(SearchOutcome {
            source: SearchSource::Fresh,
            segments,
        })
    }

    /// Scores the climbs inside a client-supplied box, bypassing the cache.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] if credentials or the provider fail.
    pub async fn explore(&self, bounds: &BoundingBox) -> Result<SearchOutcome, SearchError> {
        self.preflight().await?;

        Ok(SearchOutcome {
            source: SearchSource::Fresh,
            segments: self.fetch(bounds).await?,
        })
    }

    async fn preflight(&self) -> Result<(), SearchError> {
        if self.credentials.refresh_if_needed(REFRESH_BUFFER).await? {
            log::info!("Refreshed Strava access token");
        }
        Ok(())
    }

    async fn fetch(&self, bounds: &BoundingBox) -> Result<Vec<ScoredSegment>, SearchError> {
        let credential = self.credentials.current().await?;

        let candidates = tokio::time::timeout(
            self.timeout,
            self.provider
                .explore(&credential.access_token, bounds, &self.query),
        )
        .await
        .map_err(|_| SearchError::ProviderTimeout(self.timeout))??;

        Ok(candidates.into_iter().map(score_segment).collect())
    }
}
