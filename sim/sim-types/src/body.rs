//! Body handles, world poses and relative velocities.

use nalgebra::{Point3, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Handle of a body taking part in a joint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyId(pub u64);

impl BodyId {
    /// Wrap a raw handle.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for BodyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Body({})", self.0)
    }
}

/// Pose of a body in world coordinates.
///
/// Joints convert it to a [`RigidTransform`](crate::RigidTransform) and
/// chain it with their attachment frames to obtain `TCD`.
///
/// # Example
///
/// ```
/// use sim_types::{Pose, RigidTransform};
/// use nalgebra::Point3;
///
/// let pose = Pose::from_position(Point3::new(1.0, 2.0, 3.0));
/// let frame = RigidTransform::from(pose);
/// assert_eq!(frame.transform_point(&Point3::origin()), Point3::new(1.0, 2.0, 3.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    /// Origin of the body frame.
    pub position: Point3<f64>,
    /// Orientation of the body frame.
    pub rotation: UnitQuaternion<f64>,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    /// Body frame coincident with world.
    #[must_use]
    pub fn identity() -> Self {
        Self::from_position(Point3::origin())
    }

    /// Translated body frame with world orientation.
    #[must_use]
    pub fn from_position(position: Point3<f64>) -> Self {
        Self::from_position_rotation(position, UnitQuaternion::identity())
    }

    /// Body frame at `position` with orientation `rotation`.
    #[must_use]
    pub const fn from_position_rotation(
        position: Point3<f64>,
        rotation: UnitQuaternion<f64>,
    ) -> Self {
        Self { position, rotation }
    }
}

/// Relative spatial velocity of frame C with respect to frame D.
///
/// Both parts are expressed in C, and `linear` is the velocity of C's
/// origin.
///
/// # Example
///
/// ```
/// use sim_types::Twist;
/// use nalgebra::Vector3;
///
/// let twist = Twist::linear(Vector3::new(1.0, 0.0, 0.0));
/// assert_eq!(twist.linear.x, 1.0);
/// assert_eq!(twist.angular.norm(), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Twist {
    /// Velocity of C's origin.
    pub linear: Vector3<f64>,
    /// Angular velocity of C.
    pub angular: Vector3<f64>,
}

impl Default for Twist {
    fn default() -> Self {
        Self::zero()
    }
}

impl Twist {
    /// Twist from its two parts.
    #[must_use]
    pub const fn new(linear: Vector3<f64>, angular: Vector3<f64>) -> Self {
        Self { linear, angular }
    }

    /// No relative motion.
    #[must_use]
    pub fn zero() -> Self {
        Self::new(Vector3::zeros(), Vector3::zeros())
    }

    /// Pure sliding.
    #[must_use]
    pub fn linear(v: Vector3<f64>) -> Self {
        Self::new(v, Vector3::zeros())
    }

    /// Pure spin about C's origin.
    #[must_use]
    pub fn angular(omega: Vector3<f64>) -> Self {
        Self::new(Vector3::zeros(), omega)
    }

    /// Both parts multiplied by `factor`.
    #[must_use]
    pub fn scale(&self, factor: f64) -> Self {
        Self::new(self.linear * factor, self.angular * factor)
    }
}
