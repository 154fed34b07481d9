#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Coordinate, bounding box, and climb segment types.
//!
//! These are the shapes shared by every stage of a segment search: the
//! geocoder produces a [`Coordinate`], the spatial package turns it into a
//! [`BoundingBox`], the segment provider returns [`SegmentCandidate`]s and
//! the scorer turns those into [`ScoredSegment`]s, which is what gets
//! cached. API response types live separately in
//! `nextclimb_server_models`.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Meters in one international mile.
pub const METERS_PER_MILE: f64 = 1609.344;

/// Error returned when a latitude/longitude pair is outside the WGS84 range.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("invalid coordinate ({latitude}, {longitude}): expected latitude in [-90, 90] and longitude in [-180, 180]")]
pub struct InvalidCoordinateError {
    /// The rejected latitude.
    pub latitude: f64,
    /// The rejected longitude.
    pub longitude: f64,
}

/// A WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees, `[-90, 90]`.
    pub latitude: f64,
    /// Longitude in degrees, `[-180, 180]`.
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate, validating both axes.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCoordinateError`] if either value is non-finite or
    /// out of range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, InvalidCoordinateError> {
        if latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude)
        {
            Ok(Self {
                latitude,
                longitude,
            })
        } else {
            Err(InvalidCoordinateError {
                latitude,
                longitude,
            })
        }
    }
}

/// A geographic bounding box defined by its southwest and northeast corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Southern latitude boundary.
    pub sw_lat: f64,
    /// Western longitude boundary.
    pub sw_lon: f64,
    /// Northern latitude boundary.
    pub ne_lat: f64,
    /// Eastern longitude boundary.
    pub ne_lon: f64,
}

impl BoundingBox {
    /// Creates a new bounding box from its corners.
    #[must_use]
    pub const fn new(sw_lat: f64, sw_lon: f64, ne_lat: f64, ne_lon: f64) -> Self {
        Self {
            sw_lat,
            sw_lon,
            ne_lat,
            ne_lon,
        }
    }

    /// Whether `point` lies inside the box or on its boundary.
    #[must_use]
    pub fn contains(&self, point: Coordinate) -> bool {
        (self.sw_lat..=self.ne_lat).contains(&point.latitude)
            && (self.sw_lon..=self.ne_lon).contains(&point.longitude)
    }

    /// Renders the box as `"sw_lat,sw_lon,ne_lat,ne_lon"`, the format the
    /// segment explorer expects for its `bounds` parameter.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        format!(
            "{},{},{},{}",
            self.sw_lat, self.sw_lon, self.ne_lat, self.ne_lon
        )
    }
}

/// Discrete climb difficulty derived from the effort score.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum DifficultyLabel {
    /// Effort score below 150.
    Easy,
    /// Effort score in `[150, 400)`.
    Moderate,
    /// Effort score in `[400, 800)`.
    Hard,
    /// Effort score of 800 or more.
    Brutal,
}

impl DifficultyLabel {
    /// Returns all variants of this enum, easiest first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Easy, Self::Moderate, Self::Hard, Self::Brutal]
    }
}

/// A climb segment as returned by the segment explorer, before scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentCandidate {
    /// Provider segment ID.
    pub id: i64,
    /// Segment name.
    pub name: String,
    /// Provider climb category (0 = uncategorized, 5 = hors catégorie).
    pub climb_category: i32,
    /// Human-readable climb category (e.g. `"3"`, `"HC"`).
    pub climb_category_desc: String,
    /// Average grade in percent.
    pub avg_grade: f64,
    /// Total length in meters.
    pub distance: f64,
    /// Elevation difference between start and end in meters.
    pub elev_difference: f64,
    /// Start point as `[lat, lng]`.
    pub start_latlng: [f64; 2],
    /// End point as `[lat, lng]`.
    pub end_latlng: [f64; 2],
}

/// A segment with its effort score, difficulty and display distance.
///
/// Only lists of these are ever persisted (as a cached search result).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredSegment {
    /// The raw provider attributes.
    pub segment: SegmentCandidate,
    /// Continuous effort score.
    pub score: f64,
    /// Difficulty bucket for `score`.
    pub difficulty: DifficultyLabel,
    /// Distance in miles, rounded to two decimals.
    pub distance_miles: f64,
}
