//! Coordinate ranges, engagement decisions and angle unwrapping.

use std::f64::consts::{PI, TAU};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Engagement;

/// Physical kind of a joint coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CoordinateKind {
    /// Distance units.
    Linear,
    /// Radians; unwrapped against the previous value.
    Rotary,
}

/// Allowed interval for one joint coordinate.
///
/// Linear coordinates are limited when either bound is finite. Rotary
/// coordinates are limited only when the range is narrower than a full
/// turn about zero, i.e. `min > -π` or `max < π`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CoordinateRange {
    /// Lower bound.
    min: f64,
    /// Upper bound.
    max: f64,
}

impl CoordinateRange {
    /// Create a new range.
    ///
    /// Bounds given in the wrong order are swapped.
    #[must_use]
    pub fn new(min: f64, max: f64) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self { min, max }
    }

    /// Create a range from bounds in degrees.
    #[must_use]
    pub fn from_degrees(min: f64, max: f64) -> Self {
        Self::new(min.to_radians(), max.to_radians())
    }

    /// Create symmetric range around zero.
    #[must_use]
    pub fn symmetric(bound: f64) -> Self {
        Self::new(-bound.abs(), bound.abs())
    }

    /// Unbounded range.
    #[must_use]
    pub fn unlimited() -> Self {
        Self::new(f64::NEG_INFINITY, f64::INFINITY)
    }

    /// `[-π, π]`, the default for an unlimited revolute angle.
    #[must_use]
    pub fn full_turn() -> Self {
        Self::new(-PI, PI)
    }

    /// Get the lower bound.
    #[must_use]
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Get the upper bound.
    #[must_use]
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Check if a value lies within the range.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clip a value into the range.
    #[must_use]
    pub fn clip(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Turn a requested setting into one the range accepts.
    #[must_use]
    pub fn make_valid(&self, value: f64) -> f64 {
        self.clip(value)
    }

    /// Whether the range imposes a limit on a coordinate of `kind`.
    #[must_use]
    pub fn is_bounded(&self, kind: CoordinateKind) -> bool {
        match kind {
            CoordinateKind::Linear => self.min.is_finite() || self.max.is_finite(),
            CoordinateKind::Rotary => self.min > -PI || self.max < PI,
        }
    }

    /// Decide which bound should be enforced for `value`.
    ///
    /// A bound engages once the value is within `contact_distance` of it,
    /// or past it.
    #[must_use]
    pub fn engagement(&self, value: f64, contact_distance: f64) -> Engagement {
        if value > self.max - contact_distance {
            Engagement::Upper
        } else if value < self.min + contact_distance {
            Engagement::Lower
        } else {
            Engagement::Inactive
        }
    }

    /// Penetration of `value` past the bound selected by `engaged`.
    ///
    /// Positive past the bound, negative inside it, zero when inactive.
    #[must_use]
    pub fn penetration(&self, value: f64, engaged: Engagement) -> f64 {
        match engaged {
            Engagement::Upper => value - self.max,
            Engagement::Lower => self.min - value,
            Engagement::Inactive => 0.0,
        }
    }
}

impl Default for CoordinateRange {
    fn default() -> Self {
        Self::unlimited()
    }
}

/// Return the representative of `angle + 2πk` closest to `previous`.
///
/// Keeps angular coordinates continuous across the `±π` cut of `atan2`.
#[must_use]
pub fn nearest_angle(previous: f64, angle: f64) -> f64 {
    if !previous.is_finite() || !angle.is_finite() {
        return angle;
    }
    angle + TAU * ((previous - angle) / TAU).round()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_range_swapped_order() {
        let range = CoordinateRange::new(1.0, -1.0);
        assert_relative_eq!(range.min(), -1.0, epsilon = 1e-12);
        assert_relative_eq!(range.max(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_clip_and_contains() {
        let range = CoordinateRange::symmetric(0.5);
        assert!(range.contains(0.5));
        assert!(!range.contains(0.6));
        assert_relative_eq!(range.clip(0.6), 0.5, epsilon = 1e-12);
        assert_relative_eq!(range.make_valid(-2.0), -0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_is_bounded() {
        assert!(!CoordinateRange::unlimited().is_bounded(CoordinateKind::Linear));
        assert!(CoordinateRange::new(f64::NEG_INFINITY, 1.0).is_bounded(CoordinateKind::Linear));
        assert!(!CoordinateRange::full_turn().is_bounded(CoordinateKind::Rotary));
        assert!(!CoordinateRange::from_degrees(-360.0, 360.0).is_bounded(CoordinateKind::Rotary));
        assert!(CoordinateRange::from_degrees(-90.0, 90.0).is_bounded(CoordinateKind::Rotary));
    }

    #[test]
    fn test_engagement_band() {
        let range = CoordinateRange::symmetric(0.5);
        let d = 0.01;
        assert_eq!(range.engagement(0.3, d), Engagement::Inactive);
        assert_eq!(range.engagement(0.489, d), Engagement::Inactive);
        assert_eq!(range.engagement(0.495, d), Engagement::Upper);
        assert_eq!(range.engagement(0.6, d), Engagement::Upper);
        assert_eq!(range.engagement(-0.495, d), Engagement::Lower);
    }

    #[test]
    fn test_penetration_sign() {
        let range = CoordinateRange::symmetric(0.5);
        assert_relative_eq!(range.penetration(0.6, Engagement::Upper), 0.1, epsilon = 1e-12);
        assert_relative_eq!(range.penetration(0.49, Engagement::Upper), -0.01, epsilon = 1e-12);
        assert_relative_eq!(range.penetration(-0.7, Engagement::Lower), 0.2, epsilon = 1e-12);
        assert_relative_eq!(range.penetration(0.0, Engagement::Inactive), 0.0);
    }

    #[test]
    fn test_nearest_angle() {
        let raw = (-10.0_f64).to_radians();
        assert_relative_eq!(nearest_angle(349.0_f64.to_radians(), raw), 350.0_f64.to_radians(), epsilon = 1e-12);
        assert_relative_eq!(nearest_angle(0.0, raw), raw, epsilon = 1e-12);
        assert_relative_eq!(nearest_angle(-3.0, 3.0), 3.0 - TAU, epsilon = 1e-12);
        assert_relative_eq!(nearest_angle(4.0 * TAU, 0.1), 4.0 * TAU + 0.1, epsilon = 1e-12);
    }
}
