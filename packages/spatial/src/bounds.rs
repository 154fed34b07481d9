//! Geodesic bounding box around a search center.
//!
//! The box is square in bearing space: its northeast and southwest
//! corners sit `radius * sqrt(2)` away from the center at bearings 45°
//! and 225°, which keeps a circle of `radius` fully inscribed.
//!
//! Boxes that would wrap the ±180° meridian or reach over a pole are
//! rejected instead of being silently mangled.

use geo::{Destination as _, Geodesic, Point};
use nextclimb_segment_models::{BoundingBox, Coordinate, METERS_PER_MILE};
use thiserror::Error;

/// Tolerance (degrees) when comparing a meridian projection's longitude
/// to the center's.
const MERIDIAN_TOLERANCE_DEG: f64 = 1e-6;

/// Errors from [`compute_bounds`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum BoundsError {
    /// The radius was zero, negative, or not finite.
    #[error("invalid radius {radius_miles}: must be a positive number of miles")]
    InvalidRadius {
        /// The rejected radius.
        radius_miles: f64,
    },

    /// The box corners would reach over the north or south pole.
    #[error("search area around ({latitude}, {longitude}) reaches over a pole")]
    PolarRegion {
        /// Center latitude.
        latitude: f64,
        /// Center longitude.
        longitude: f64,
    },

    /// The box would straddle the ±180° meridian.
    #[error("search area around ({latitude}, {longitude}) crosses the antimeridian")]
    CrossesAntimeridian {
        /// Center latitude.
        latitude: f64,
        /// Center longitude.
        longitude: f64,
    },
}

/// Computes the bounding box whose inscribed circle around `center` has a
/// radius of `radius_miles`.
///
/// Distances are geodesic on the WGS84 ellipsoid. The returned box always
/// satisfies `sw_lat <= center.latitude <= ne_lat` and
/// `sw_lon <= center.longitude <= ne_lon`.
///
/// # Errors
///
/// * [`BoundsError::InvalidRadius`] if `radius_miles` is not a positive,
///   finite number. Checked before any projection.
/// * [`BoundsError::PolarRegion`] if the corners would pass over a pole.
/// * [`BoundsError::CrossesAntimeridian`] if the box would wrap at ±180°.
pub fn compute_bounds(center: Coordinate, radius_miles: f64) -> Result<BoundingBox, BoundsError> {
    check_radius(radius_miles)?;

    let origin = Point::new(center.longitude, center.latitude);
    let corner_meters = radius_miles * std::f64::consts::SQRT_2 * METERS_PER_MILE;

    if reaches_over_pole(origin, corner_meters) {
        return Err(BoundsError::PolarRegion {
            latitude: center.latitude,
            longitude: center.longitude,
        });
    }

    let ne = Geodesic.destination(origin, 45.0, corner_meters);
    let sw = Geodesic.destination(origin, 225.0, corner_meters);

    log::debug!(
        "bounds for ({}, {}) r={radius_miles}mi: sw=({}, {}) ne=({}, {})",
        center.latitude,
        center.longitude,
        sw.y(),
        sw.x(),
        ne.y(),
        ne.x()
    );

    // An eastward projection that lands west of the center wrapped at 180°.
    if ne.x() < center.longitude || sw.x() > center.longitude {
        return Err(BoundsError::CrossesAntimeridian {
            latitude: center.latitude,
            longitude: center.longitude,
        });
    }

    Ok(BoundingBox::new(sw.y(), sw.x(), ne.y(), ne.x()))
}

/// Rejects a radius that is not a positive, finite number of miles.
///
/// # Errors
///
/// Returns [`BoundsError::InvalidRadius`] for zero, negative, or non-finite
/// radii.
pub fn check_radius(radius_miles: f64) -> Result<(), BoundsError> {
    if radius_miles.is_finite() && radius_miles > 0.0 {
        Ok(())
    } else {
        Err(BoundsError::InvalidRadius { radius_miles })
    }
}

/// Whether travelling `meters` due north or due south of `origin` passes
/// over a pole.
///
/// A meridian geodesic keeps its longitude unless it crosses a pole, at
/// which point it continues on the opposite meridian.
fn reaches_over_pole(origin: Point<f64>, meters: f64) -> bool {
    if origin.y().abs() >= 90.0 {
        return true;
    }

    [0.0, 180.0].into_iter().any(|bearing| {
        let dest = Geodesic.destination(origin, bearing, meters);
        longitude_delta(dest.x(), origin.x()) > MERIDIAN_TOLERANCE_DEG
    })
}

/// Absolute difference between two longitudes, accounting for wraparound.
fn longitude_delta(a: f64, b: f64) -> f64 {
    let delta = (a - b).rem_euclid(360.0);
    delta.min(360.0 - delta)
}

#[cfg(test)]
mod tests {
    use geo::Distance as _;

    use super::*;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn box_contains_center_for_many_inputs() {
        let centers = [
            (37.3382, -121.8863),
            (0.0, 0.0),
            (-33.8688, 151.2093),
            (64.1466, -21.9426),
            (-54.8019, -68.3030),
            (45.0, 178.0),
            (-45.0, -178.0),
        ];
        let radii = [0.1, 1.0, 5.0, 25.0, 50.0];

        for (lat, lon) in centers {
            for radius in radii {
                let center = coord(lat, lon);
                let bbox = compute_bounds(center, radius).unwrap();
                assert!(bbox.sw_lat <= bbox.ne_lat, "{bbox:?}");
                assert!(bbox.sw_lon <= bbox.ne_lon, "{bbox:?}");
                assert!(bbox.contains(center), "{center:?} not in {bbox:?}");
            }
        }
    }

    #[test]
    fn corners_are_radius_times_sqrt2_away() {
        let center = coord(37.3382, -121.8863);
        let bbox = compute_bounds(center, 10.0).unwrap();
        let origin = Point::new(center.longitude, center.latitude);
        let expected = 10.0 * std::f64::consts::SQRT_2 * METERS_PER_MILE;

        let ne = Geodesic.distance(origin, Point::new(bbox.ne_lon, bbox.ne_lat));
        let sw = Geodesic.distance(origin, Point::new(bbox.sw_lon, bbox.sw_lat));

        assert!((ne - expected).abs() < 0.01, "ne distance {ne}");
        assert!((sw - expected).abs() < 0.01, "sw distance {sw}");
    }

    #[test]
    fn rejects_non_positive_radius() {
        let center = coord(37.3382, -121.8863);
        for radius in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                compute_bounds(center, radius),
                Err(BoundsError::InvalidRadius { .. })
            ));
        }
    }

    #[test]
    fn rejects_boxes_over_a_pole() {
        assert!(matches!(
            compute_bounds(coord(89.99, 10.0), 25.0),
            Err(BoundsError::PolarRegion { .. })
        ));
        assert!(matches!(
            compute_bounds(coord(-90.0, 0.0), 1.0),
            Err(BoundsError::PolarRegion { .. })
        ));
    }

    #[test]
    fn rejects_boxes_across_the_antimeridian() {
        assert!(matches!(
            compute_bounds(coord(-17.7134, 179.99), 10.0),
            Err(BoundsError::CrossesAntimeridian { .. })
        ));
        assert!(matches!(
            compute_bounds(coord(65.0, -179.95), 10.0),
            Err(BoundsError::CrossesAntimeridian { .. })
        ));
    }

    #[test]
    fn longitude_delta_wraps() {
        assert!((longitude_delta(179.0, -179.0) - 2.0).abs() < 1e-9);
        assert!((longitude_delta(10.0, -170.0) - 180.0).abs() < 1e-9);
        assert!(longitude_delta(-180.0, 180.0) < 1e-9);
    }
}
