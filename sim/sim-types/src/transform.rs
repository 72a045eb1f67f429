//! Rigid transforms between coordinate frames.
//!
//! A [`RigidTransform`] `T_XY` maps coordinates in frame X to coordinates in
//! frame Y: `p_Y = R * p_X + t`. Couplings use the naming convention of the
//! joint frames, so `TCD` is the pose of the child attachment frame C
//! expressed in the parent attachment frame D.

use std::ops::Mul;

use nalgebra::{Matrix3, Point3, Rotation3, Unit, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Pose, Twist};

/// Rotation plus translation describing one frame relative to another.
///
/// # Example
///
/// ```
/// use sim_types::RigidTransform;
/// use nalgebra::{Rotation3, Vector3};
///
/// let t = RigidTransform::new(
///     Rotation3::from_axis_angle(&Vector3::z_axis(), 0.5),
///     Vector3::new(1.0, 2.0, 0.0),
/// );
/// let round_trip = t * t.inverse();
/// assert!(round_trip.approx_eq(&RigidTransform::identity(), 1e-12));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RigidTransform {
    /// Rotation part.
    pub rotation: Rotation3<f64>,
    /// Translation part.
    pub translation: Vector3<f64>,
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl RigidTransform {
    /// The identity transform.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            rotation: Rotation3::identity(),
            translation: Vector3::zeros(),
        }
    }

    /// Create a transform from a rotation and a translation.
    #[must_use]
    pub const fn new(rotation: Rotation3<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Pure translation.
    #[must_use]
    pub fn from_translation(translation: Vector3<f64>) -> Self {
        Self {
            rotation: Rotation3::identity(),
            translation,
        }
    }

    /// Pure rotation.
    #[must_use]
    pub fn from_rotation(rotation: Rotation3<f64>) -> Self {
        Self {
            rotation,
            translation: Vector3::zeros(),
        }
    }

    /// Pure rotation of `angle` radians about `axis`.
    #[must_use]
    pub fn from_axis_angle(axis: &Unit<Vector3<f64>>, angle: f64) -> Self {
        Self::from_rotation(Rotation3::from_axis_angle(axis, angle))
    }

    /// Rotation matrix as a plain 3x3 matrix.
    #[must_use]
    pub fn matrix(&self) -> &Matrix3<f64> {
        self.rotation.matrix()
    }

    /// Compute the inverse transform.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let rotation = self.rotation.inverse();
        Self {
            rotation,
            translation: -(rotation * self.translation),
        }
    }

    /// Compose two transforms: `self * other`.
    #[must_use]
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            rotation: self.rotation * other.rotation,
            translation: self.rotation * other.translation + self.translation,
        }
    }

    /// Compute `self⁻¹ * other` without forming the inverse explicitly.
    #[must_use]
    pub fn inverse_compose(&self, other: &Self) -> Self {
        let inv = self.rotation.inverse();
        Self {
            rotation: inv * other.rotation,
            translation: inv * (other.translation - self.translation),
        }
    }

    /// Transform a point.
    #[must_use]
    pub fn transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation * point.coords + self.translation)
    }

    /// Transform a vector (rotation only).
    #[must_use]
    pub fn transform_vector(&self, vector: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * vector
    }

    /// Transform a vector by the inverse rotation.
    #[must_use]
    pub fn inverse_transform_vector(&self, vector: &Vector3<f64>) -> Vector3<f64> {
        self.rotation.inverse() * vector
    }

    /// Small-motion twist equivalent of this transform.
    ///
    /// Linear part is the translation, angular part is the rotation vector.
    /// Used to express the error between a pose and its projection.
    #[must_use]
    pub fn error_twist(&self) -> Twist {
        Twist::new(self.translation, self.rotation.scaled_axis())
    }

    /// Move the frame along a twist expressed in its own coordinates.
    ///
    /// Returns `self * exp(h * twist)` using the first-order translation
    /// update, which is what finite-difference checks need.
    #[must_use]
    pub fn integrate(&self, twist: &Twist, h: f64) -> Self {
        let delta = Self {
            rotation: Rotation3::new(twist.angular * h),
            translation: twist.linear * h,
        };
        self.compose(&delta)
    }

    /// Check whether two transforms agree to within `tol` in every entry.
    #[must_use]
    pub fn approx_eq(&self, other: &Self, tol: f64) -> bool {
        let dr = (self.rotation.matrix() - other.rotation.matrix()).amax();
        let dp = (self.translation - other.translation).amax();
        dr <= tol && dp <= tol
    }
}

impl Mul for RigidTransform {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        self.compose(&rhs)
    }
}

impl Mul<&RigidTransform> for &RigidTransform {
    type Output = RigidTransform;

    fn mul(self, rhs: &RigidTransform) -> RigidTransform {
        self.compose(rhs)
    }
}

impl From<Pose> for RigidTransform {
    fn from(pose: Pose) -> Self {
        Self {
            rotation: pose.rotation.to_rotation_matrix(),
            translation: pose.position.coords,
        }
    }
}

impl From<RigidTransform> for Pose {
    fn from(t: RigidTransform) -> Self {
        Self::from_position_rotation(Point3::from(t.translation), t.rotation.into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn sample() -> RigidTransform {
        RigidTransform::new(
            Rotation3::from_euler_angles(0.3, -0.2, 1.1),
            Vector3::new(0.5, -1.0, 2.0),
        )
    }

    #[test]
    fn test_inverse_composes_to_identity() {
        let t = sample();
        assert!((t * t.inverse()).approx_eq(&RigidTransform::identity(), 1e-12));
        assert!((t.inverse() * t).approx_eq(&RigidTransform::identity(), 1e-12));
    }

    #[test]
    fn test_inverse_compose_matches_explicit_inverse() {
        let a = sample();
        let b = RigidTransform::from_axis_angle(&Vector3::x_axis(), 0.7);
        let explicit = a.inverse() * b;
        assert!(a.inverse_compose(&b).approx_eq(&explicit, 1e-12));
    }

    #[test]
    fn test_transform_point() {
        let t = RigidTransform::new(
            Rotation3::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2),
            Vector3::new(1.0, 0.0, 0.0),
        );
        let p = t.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_pose_round_trip() {
        let t = sample();
        let pose: Pose = t.into();
        let back = RigidTransform::from(pose);
        assert!(back.approx_eq(&t, 1e-12));
    }

    #[test]
    fn test_error_twist_of_small_rotation() {
        let t = RigidTransform::new(
            Rotation3::from_axis_angle(&Vector3::y_axis(), 1e-3),
            Vector3::new(0.0, 0.0, 2e-3),
        );
        let e = t.error_twist();
        assert_relative_eq!(e.angular.y, 1e-3, epsilon = 1e-15);
        assert_relative_eq!(e.linear.z, 2e-3, epsilon = 1e-15);
    }

    #[test]
    fn test_integrate_pure_rotation() {
        let t = RigidTransform::identity().integrate(&Twist::angular(Vector3::z()), 0.25);
        let expected = RigidTransform::from_axis_angle(&Vector3::z_axis(), 0.25);
        assert!(t.approx_eq(&expected, 1e-12));
    }
}
