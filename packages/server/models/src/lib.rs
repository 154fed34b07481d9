#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the NextClimb server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the segment types so the API contract can evolve independently of
//! what gets cached.

use nextclimb_segment_models::{DifficultyLabel, ScoredSegment};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Query parameters for `GET /api/segments/search`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    /// Free-text location, e.g. `"San Jose, CA"`.
    pub location: String,
    /// Search radius in miles.
    pub radius: i32,
}

/// Body of `POST /api/segments/explore`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ExploreBoundsRequest {
    /// Southwest corner latitude.
    pub sw_lat: f64,
    /// Southwest corner longitude.
    pub sw_lng: f64,
    /// Northeast corner latitude.
    pub ne_lat: f64,
    /// Northeast corner longitude.
    pub ne_lng: f64,
}

/// Where a search result came from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SearchSource {
    /// Served from the result cache.
    Cached,
    /// Fetched from the segment provider for this request.
    Fresh,
}

/// A scored climb as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSegment {
    /// Provider segment ID.
    pub id: i64,
    /// Segment name.
    pub name: String,
    /// Difficulty bucket.
    pub difficulty: DifficultyLabel,
    /// Length in miles, two decimals.
    pub distance_miles: f64,
    /// Average grade in percent.
    pub avg_grade: f64,
    /// Start point as `[lat, lng]`.
    pub start_latlng: [f64; 2],
    /// End point as `[lat, lng]`.
    pub end_latlng: [f64; 2],
}

impl From<ScoredSegment> for ApiSegment {
    fn from(scored: ScoredSegment) -> Self {
        Self {
            id: scored.segment.id,
            name: scored.segment.name,
            difficulty: scored.difficulty,
            distance_miles: scored.distance_miles,
            avg_grade: scored.segment.avg_grade,
            start_latlng: scored.segment.start_latlng,
            end_latlng: scored.segment.end_latlng,
        }
    }
}

/// Response of the segment search and explore endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSearchResponse {
    /// Whether the segments came from the cache.
    pub source: SearchSource,
    /// Scored segments in provider order.
    pub segments: Vec<ApiSegment>,
}

impl ApiSearchResponse {
    /// Builds a response from scored segments.
    #[must_use]
    pub fn new(source: SearchSource, segments: Vec<ScoredSegment>) -> Self {
        Self {
            source,
            segments: segments.into_iter().map(ApiSegment::from).collect(),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// Error body returned with every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable message.
    pub error: String,
}
