#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Climb difficulty scoring.
//!
//! Turns a segment's distance, average grade and elevation gain into a
//! continuous effort score, then buckets the score into a
//! [`DifficultyLabel`]. The score is built from four additive parts:
//!
//! 1. **Base**: elevation gain in meters.
//! 2. **Steepness**: linear up to 8% (`grade * 15`), quadratic above it
//!    (`grade² * 2`).
//! 3. **Sustained effort**: `distance_km * 25`, capped at 300.
//! 4. **Overrides**: +300 for walls (`grade >= 15`), +200 for big
//!    mountains (`gain > 500`). Both may apply.
//!
//! Distance, grade and gain are taken as absolute values; descending
//! segments score like their climbing counterpart.

use nextclimb_segment_models::{DifficultyLabel, METERS_PER_MILE, ScoredSegment, SegmentCandidate};

/// Grade (%) above which the steepness term turns quadratic.
pub const STEEP_GRADE_PCT: f64 = 8.0;

/// Grade (%) at which the wall penalty applies.
pub const WALL_GRADE_PCT: f64 = 15.0;

/// Elevation gain (m) above which the big-mountain penalty applies.
pub const BIG_MOUNTAIN_GAIN_M: f64 = 500.0;

/// Upper bound of the sustained-effort term.
pub const MAX_SUSTAINED_SCORE: f64 = 300.0;

const WALL_PENALTY: f64 = 300.0;
const BIG_MOUNTAIN_PENALTY: f64 = 200.0;

const MODERATE_THRESHOLD: f64 = 150.0;
const HARD_THRESHOLD: f64 = 400.0;
const BRUTAL_THRESHOLD: f64 = 800.0;

/// Computes the effort score and difficulty label for a climb.
///
/// Negative distance, grade and gain are absorbed via `abs()`, so no term
/// contributes below zero. No input is rejected.
#[must_use]
pub fn score(
    distance_m: f64,
    avg_grade_pct: f64,
    elevation_gain_m: f64,
) -> (f64, DifficultyLabel) {
    if distance_m < 0.0 || avg_grade_pct < 0.0 || elevation_gain_m < 0.0 {
        log::debug!(
            "scoring negative input: distance={distance_m} grade={avg_grade_pct} gain={elevation_gain_m}"
        );
    }

    let gain = elevation_gain_m.abs();
    let grade = avg_grade_pct.abs();
    let distance_km = distance_m.abs() / 1000.0;

    let mut total = gain * 1.0;

    total += if grade > STEEP_GRADE_PCT {
        grade.powi(2) * 2.0
    } else {
        grade * 15.0
    };

    total += (distance_km * 25.0).min(MAX_SUSTAINED_SCORE);

    if grade >= WALL_GRADE_PCT {
        total += WALL_PENALTY;
    }
    if gain > BIG_MOUNTAIN_GAIN_M {
        total += BIG_MOUNTAIN_PENALTY;
    }

    (total, label_for(total))
}

/// Maps an effort score to its difficulty bucket.
///
/// Buckets are closed below and open above: exactly 150 is `Moderate`.
#[must_use]
pub fn label_for(score: f64) -> DifficultyLabel {
    if score < MODERATE_THRESHOLD {
        DifficultyLabel::Easy
    } else if score < HARD_THRESHOLD {
        DifficultyLabel::Moderate
    } else if score < BRUTAL_THRESHOLD {
        DifficultyLabel::Hard
    } else {
        DifficultyLabel::Brutal
    }
}

/// Scores a provider segment and converts its distance to miles.
#[must_use]
pub fn score_segment(segment: SegmentCandidate) -> ScoredSegment {
    let (score, difficulty) = score(segment.distance, segment.avg_grade, segment.elev_difference);
    let distance_miles = (segment.distance / METERS_PER_MILE * 100.0).round() / 100.0;

    ScoredSegment {
        segment,
        score,
        difficulty,
        distance_miles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_score(actual: (f64, DifficultyLabel), expected: f64, label: DifficultyLabel) {
        assert!(
            (actual.0 - expected).abs() < 1e-9,
            "expected {expected}, got {}",
            actual.0
        );
        assert_eq!(actual.1, label);
    }

    #[test]
    fn steep_grade_uses_quadratic_term() {
        // 410 + 8.1² * 2 + min(5 * 25, 300)
        assert_score(score(5000.0, 8.1, 410.0), 666.22, DifficultyLabel::Hard);
    }

    #[test]
    fn moderate_grade_uses_linear_term() {
        // 150 + 5 * 15 + min(3.2 * 25, 300)
        assert_score(score(3200.0, 5.0, 150.0), 305.0, DifficultyLabel::Moderate);
    }

    #[test]
    fn grade_of_exactly_eight_stays_linear() {
        assert_score(score(0.0, 8.0, 0.0), 120.0, DifficultyLabel::Easy);
        assert_score(score(0.0, 8.5, 0.0), 144.5, DifficultyLabel::Easy);
    }

    #[test]
    fn sustained_term_is_capped() {
        assert_score(score(12_000.0, 0.0, 0.0), 300.0, DifficultyLabel::Moderate);
        assert_score(score(80_000.0, 0.0, 0.0), 300.0, DifficultyLabel::Moderate);
    }

    #[test]
    fn wall_and_big_mountain_penalties_stack() {
        // 0 + 15² * 2 + 0 + 300
        assert_score(score(0.0, 15.0, 0.0), 750.0, DifficultyLabel::Hard);
        // 501 + 0 + 0 + 200
        assert_score(score(0.0, 0.0, 501.0), 701.0, DifficultyLabel::Hard);
        // 600 + 16² * 2 + 50 + 300 + 200
        assert_score(score(2000.0, 16.0, 600.0), 1662.0, DifficultyLabel::Brutal);
        // exactly 500 m of gain is not a big mountain
        assert_score(score(0.0, 0.0, 500.0), 500.0, DifficultyLabel::Hard);
    }

    #[test]
    fn negative_grade_and_gain_are_absorbed() {
        assert_eq!(score(5000.0, -8.1, -410.0), score(5000.0, 8.1, 410.0));
    }

    #[test]
    fn negative_distance_never_lowers_the_score() {
        assert_score(score(-5000.0, 0.0, 0.0), 125.0, DifficultyLabel::Easy);
        assert_eq!(score(-5000.0, 8.1, 410.0), score(5000.0, 8.1, 410.0));
    }

    #[test]
    fn scoring_is_deterministic() {
        let first = score(4321.0, 7.3, 287.0);
        for _ in 0..10 {
            assert_eq!(score(4321.0, 7.3, 287.0), first);
        }
    }

    #[test]
    fn label_boundaries() {
        assert_eq!(label_for(149.999), DifficultyLabel::Easy);
        assert_eq!(label_for(150.0), DifficultyLabel::Moderate);
        assert_eq!(label_for(399.999), DifficultyLabel::Moderate);
        assert_eq!(label_for(400.0), DifficultyLabel::Hard);
        assert_eq!(label_for(799.999), DifficultyLabel::Hard);
        assert_eq!(label_for(800.0), DifficultyLabel::Brutal);
    }

    #[test]
    fn score_segment_converts_to_miles() {
        let scored = score_segment(SegmentCandidate {
            id: 627_158,
            name: "Montebello".to_string(),
            climb_category: 3,
            climb_category_desc: "3".to_string(),
            avg_grade: 8.1,
            distance: 5000.0,
            elev_difference: 410.0,
            start_latlng: [37.325, -122.096],
            end_latlng: [37.301, -122.134],
        });

        assert_eq!(scored.difficulty, DifficultyLabel::Hard);
        assert!((scored.score - 666.22).abs() < 1e-9);
        assert!((scored.distance_miles - 3.11).abs() < 1e-9);
        assert_eq!(scored.segment.id, 627_158);
    }
}
