//! Spatial force directions.

use std::ops::{Add, Mul, Neg, Sub};

use nalgebra::{Vector3, Vector6};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Twist;

/// A 6-component force/moment pair.
///
/// Constraint rows use wrenches as directions: the row constrains the
/// scalar `wrench · twist` of the relative velocity.
///
/// # Example
///
/// ```
/// use sim_types::{Twist, Wrench};
/// use nalgebra::Vector3;
///
/// let w = Wrench::new(1.0, 0.0, 0.0, 0.0, 0.0, 2.0);
/// let t = Twist::new(Vector3::new(3.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 0.5));
/// assert_eq!(w.dot(&t), 4.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Wrench {
    /// Force component.
    pub force: Vector3<f64>,
    /// Moment component.
    pub moment: Vector3<f64>,
}

impl Wrench {
    /// Create a wrench from its six components.
    #[must_use]
    pub fn new(fx: f64, fy: f64, fz: f64, mx: f64, my: f64, mz: f64) -> Self {
        Self {
            force: Vector3::new(fx, fy, fz),
            moment: Vector3::new(mx, my, mz),
        }
    }

    /// Create a wrench from force and moment vectors.
    #[must_use]
    pub const fn from_parts(force: Vector3<f64>, moment: Vector3<f64>) -> Self {
        Self { force, moment }
    }

    /// The zero wrench.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            force: Vector3::zeros(),
            moment: Vector3::zeros(),
        }
    }

    /// Pure moment.
    #[must_use]
    pub fn moment(moment: Vector3<f64>) -> Self {
        Self::from_parts(Vector3::zeros(), moment)
    }

    /// Power pairing with a twist.
    #[must_use]
    pub fn dot(&self, twist: &Twist) -> f64 {
        self.force.dot(&twist.linear) + self.moment.dot(&twist.angular)
    }

    /// Euclidean inner product with another wrench (all six components).
    #[must_use]
    pub fn inner(&self, other: &Self) -> f64 {
        self.force.dot(&other.force) + self.moment.dot(&other.moment)
    }

    /// Euclidean norm of the six components.
    #[must_use]
    pub fn norm(&self) -> f64 {
        self.inner(self).sqrt()
    }

    /// Set all components to zero.
    pub fn set_zero(&mut self) {
        self.force.fill(0.0);
        self.moment.fill(0.0);
    }

    /// Stack as `[force; moment]`.
    #[must_use]
    pub fn to_vector(&self) -> Vector6<f64> {
        Vector6::new(
            self.force.x,
            self.force.y,
            self.force.z,
            self.moment.x,
            self.moment.y,
            self.moment.z,
        )
    }

    /// Build from a stacked `[force; moment]` vector.
    #[must_use]
    pub fn from_vector(v: &Vector6<f64>) -> Self {
        Self::new(v[0], v[1], v[2], v[3], v[4], v[5])
    }
}

impl Neg for Wrench {
    type Output = Self;

    fn neg(self) -> Self {
        Self::from_parts(-self.force, -self.moment)
    }
}

impl Add for Wrench {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::from_parts(self.force + rhs.force, self.moment + rhs.moment)
    }
}

impl Sub for Wrench {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::from_parts(self.force - rhs.force, self.moment - rhs.moment)
    }
}

impl Mul<f64> for Wrench {
    type Output = Self;

    fn mul(self, s: f64) -> Self {
        Self::from_parts(self.force * s, self.moment * s)
    }
}
