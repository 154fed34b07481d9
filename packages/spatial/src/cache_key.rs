//! Grid-normalized cache keys for bounding-box searches.
//!
//! A bounding box is snapped outward onto a decimal grid (southwest corner
//! floored, northeast corner ceiled) so the cached area always covers the
//! requested one. Boxes that land in the same grid cells share a key, which
//! lets nearby searches reuse a single cached result.
//!
//! Rounding is done on integer grid indices and keys are rendered from
//! those indices with a fixed number of decimals, so the key is stable
//! across processes and never contains float artifacts like `-0.00` or
//! `37.299999999`.

use std::fmt;

use nextclimb_segment_models::BoundingBox;

/// Default number of decimal places (≈ 1.1 km at the equator).
pub const DEFAULT_PRECISION: u32 = 2;

/// Largest supported precision; higher values are clamped.
pub const MAX_PRECISION: u32 = 9;

/// Namespace prefix of every segment search key.
pub const KEY_NAMESPACE: &str = "strava";

/// Deterministic cache key for a bounding-box search.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NormalizedCacheKey(String);

impl NormalizedCacheKey {
    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for NormalizedCacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A bounding box expressed as integer indices on a `10^-precision` grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GridBox {
    sw_lat: i64,
    sw_lon: i64,
    ne_lat: i64,
    ne_lon: i64,
    precision: u32,
}

impl GridBox {
    fn snap(bbox: &BoundingBox, precision: u32) -> Self {
        let precision = precision.min(MAX_PRECISION);
        let factor = grid_factor(precision);

        Self {
            sw_lat: grid_floor(bbox.sw_lat, factor),
            sw_lon: grid_floor(bbox.sw_lon, factor),
            ne_lat: grid_ceil(bbox.ne_lat, factor),
            ne_lon: grid_ceil(bbox.ne_lon, factor),
            precision,
        }
    }

    fn value(&self, index: i64) -> f64 {
        grid_value(index, grid_factor(self.precision))
    }

    fn to_bounding_box(self) -> BoundingBox {
        BoundingBox::new(
            self.value(self.sw_lat),
            self.value(self.sw_lon),
            self.value(self.ne_lat),
            self.value(self.ne_lon),
        )
    }

    fn to_key(self) -> NormalizedCacheKey {
        let digits = self.precision as usize;
        NormalizedCacheKey(format!(
            "{KEY_NAMESPACE}:{:.digits$}:{:.digits$}:{:.digits$}:{:.digits$}",
            self.value(self.sw_lat),
            self.value(self.sw_lon),
            self.value(self.ne_lat),
            self.value(self.ne_lon),
        ))
    }
}

/// Derives the cache key for `bbox` at `precision` decimal places.
///
/// The southwest corner is rounded down and the northeast corner up, so
/// the key's area always contains `bbox`. Applying it to an already
/// normalized box yields the same key.
#[must_use]
pub fn normalize(bbox: &BoundingBox, precision: u32) -> NormalizedCacheKey {
    GridBox::snap(bbox, precision).to_key()
}

/// [`normalize`] at [`DEFAULT_PRECISION`].
#[must_use]
pub fn normalize_default(bbox: &BoundingBox) -> NormalizedCacheKey {
    normalize(bbox, DEFAULT_PRECISION)
}

/// Returns the outward-rounded box that [`normalize`] keys on.
#[must_use]
pub fn normalized_bounds(bbox: &BoundingBox, precision: u32) -> BoundingBox {
    GridBox::snap(bbox, precision).to_bounding_box()
}

#[allow(clippy::cast_possible_wrap)]
fn grid_factor(precision: u32) -> f64 {
    10_f64.powi(precision as i32)
}

#[allow(clippy::cast_precision_loss)]
fn grid_value(index: i64, factor: f64) -> f64 {
    index as f64 / factor
}

fn grid_floor(value: f64, factor: f64) -> i64 {
    on_grid(value, factor).unwrap_or_else(|| to_index((value * factor).floor()))
}

fn grid_ceil(value: f64, factor: f64) -> i64 {
    on_grid(value, factor).unwrap_or_else(|| to_index((value * factor).ceil()))
}

/// Returns the grid index of `value` if it is exactly the value rendered
/// for that index. `value * factor` can land an ulp off an integer even
/// for grid values, so plain floor/ceil would move them by a whole cell.
#[allow(clippy::float_cmp)]
fn on_grid(value: f64, factor: f64) -> Option<i64> {
    let index = to_index((value * factor).round());
    (grid_value(index, factor) == value).then_some(index)
}

#[allow(clippy::cast_possible_truncation)]
fn to_index(whole: f64) -> i64 {
    whole as i64
}
