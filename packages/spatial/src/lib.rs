#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Search-area geometry for segment searches.
//!
//! [`bounds`] projects a square bounding box around a center point on the
//! WGS84 ellipsoid so that a circle of the requested radius fits inside
//! it. [`cache_key`] snaps a bounding box outward onto a fixed decimal
//! grid and derives the string key search results are cached under, so
//! that nearby searches share an entry.
//!
//! Everything here is pure and allocation-light; it is called once per
//! search request.

pub mod bounds;
pub mod cache_key;

pub use bounds::{BoundsError, check_radius, compute_bounds};
pub use cache_key::{
    DEFAULT_PRECISION, NormalizedCacheKey, normalize, normalize_default, normalized_bounds,
};
