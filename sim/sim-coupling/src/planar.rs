//! Planar coupling: translation in the xy plane plus rotation about z.
//!
//! Coordinates are read from C's side of the joint. With `TCD = (R, p)`
//! on the manifold and `R = Rz(-θ)`,
//!
//! ```text
//! (x, y, 0) = -Rᵀ p
//! ```
//!
//! so `(x, y)` is the position of D's origin expressed in C, and θ is the
//! rotation of D relative to C. Because `x` and `y` live in C,
//! their gradients pick up a moment arm about z.

use nalgebra::{Rotation3, Vector3};
use sim_types::{CouplingConfig, RigidTransform, Twist, Wrench};

use crate::coupling::{check_coordinate_count, closest_axis_angle};
use crate::{
    ConstraintBasis, ConstraintFlags, CoordinateRange, CouplingCore, CouplingType,
    RigidBodyCoupling,
};

/// Coupling that keeps frame C in the xy plane of frame D.
///
/// Coordinates are `[x, y, θ]`. Rows 0-2 constrain z translation and tilt
/// about x and y.
///
/// # Example
///
/// ```
/// use sim_coupling::{PlanarCoupling, RigidBodyCoupling, CoordinateRange};
/// use sim_types::RigidTransform;
/// use nalgebra::Vector3;
///
/// let mut planar = PlanarCoupling::new().with_x_range(CoordinateRange::symmetric(0.5));
/// // D's origin sits at x = 0.3 in C
/// let tcd = RigidTransform::from_translation(Vector3::new(-0.3, 0.2, 0.05));
/// let tgd = planar.project_to_constraint(&tcd);
/// assert!(tgd.translation.z.abs() < 1e-12);
/// assert!((planar.coordinate(PlanarCoupling::X, Some(&tcd)).unwrap() - 0.3).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PlanarCoupling {
    core: CouplingCore,
}

impl PlanarCoupling {
    /// Index of the x coordinate.
    pub const X: usize = 0;
    /// Index of the y coordinate.
    pub const Y: usize = 1;
    /// Index of the rotation angle.
    pub const THETA: usize = 2;

    /// Create a planar coupling with unlimited x and y and `θ ∈ [-π, π]`.
    #[must_use]
    pub fn new() -> Self {
        let mut coupling = Self {
            core: CouplingCore::new(
                [
                    ConstraintFlags::BILATERAL_LINEAR,
                    ConstraintFlags::BILATERAL_ROTARY,
                    ConstraintFlags::BILATERAL_ROTARY,
                    ConstraintFlags::LINEAR,
                    ConstraintFlags::LINEAR,
                    ConstraintFlags::ROTARY,
                ],
                vec![
                    CoordinateRange::unlimited(),
                    CoordinateRange::unlimited(),
                    CoordinateRange::full_turn(),
                ],
            ),
        };
        coupling.reset_constraint_info();
        coupling
    }

    /// Set the range of x.
    #[must_use]
    pub fn with_x_range(mut self, range: CoordinateRange) -> Self {
        self.core.set_range(Self::X, range);
        self
    }

    /// Set the range of y.
    #[must_use]
    pub fn with_y_range(mut self, range: CoordinateRange) -> Self {
        self.core.set_range(Self::Y, range);
        self
    }

    /// Set the range of θ.
    #[must_use]
    pub fn with_theta_range(mut self, range: CoordinateRange) -> Self {
        self.core.set_range(Self::THETA, range);
        self
    }

    /// Set the tolerances.
    #[must_use]
    pub fn with_config(mut self, config: CouplingConfig) -> Self {
        self.core.set_config(config);
        self
    }
}

impl Default for PlanarCoupling {
    fn default() -> Self {
        Self::new()
    }
}

impl RigidBodyCoupling for PlanarCoupling {
    fn coupling_type(&self) -> CouplingType {
        CouplingType::Planar
    }

    fn core(&self) -> &CouplingCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut CouplingCore {
        &mut self.core
    }

    fn project_to_constraint(&self, tcd: &RigidTransform) -> RigidTransform {
        let angle = closest_axis_angle(tcd.matrix(), &Vector3::x(), &Vector3::y())
            .unwrap_or_else(|| -self.core.stored_coordinate(Self::THETA));
        RigidTransform::new(
            Rotation3::from_axis_angle(&Vector3::z_axis(), angle),
            Vector3::new(tcd.translation.x, tcd.translation.y, 0.0),
        )
    }

    fn transform_to_coordinates(
        &self,
        tgd: &RigidTransform,
        coords: &mut [f64],
    ) -> sim_types::Result<()> {
        check_coordinate_count(coords.len(), 3)?;
        let offset = -tgd.inverse_transform_vector(&tgd.translation);
        let m = tgd.matrix();
        coords[Self::X] = offset.x;
        coords[Self::Y] = offset.y;
        coords[Self::THETA] = m[(0, 1)].atan2(m[(0, 0)]);
        Ok(())
    }

    fn coordinates_to_transform(&self, coords: &[f64]) -> sim_types::Result<RigidTransform> {
        check_coordinate_count(coords.len(), 3)?;
        let rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), -coords[Self::THETA]);
        let translation = -(rotation * Vector3::new(coords[Self::X], coords[Self::Y], 0.0));
        Ok(RigidTransform::new(rotation, translation))
    }

    fn constraint_basis(
        &self,
        coords: &[f64],
        velocity: &Twist,
    ) -> sim_types::Result<ConstraintBasis> {
        check_coordinate_count(coords.len(), 3)?;
        let (x, y) = (coords[Self::X], coords[Self::Y]);
        let spin = velocity.angular.z;
        let x_dot = -velocity.linear.x + spin * y;
        let y_dot = -velocity.linear.y - spin * x;

        Ok(ConstraintBasis {
            rows: [
                Wrench::new(0.0, 0.0, 1.0, 0.0, 0.0, 0.0),
                Wrench::new(0.0, 0.0, 0.0, 1.0, 0.0, 0.0),
                Wrench::new(0.0, 0.0, 0.0, 0.0, 1.0, 0.0),
                Wrench::new(-1.0, 0.0, 0.0, 0.0, 0.0, y),
                Wrench::new(0.0, -1.0, 0.0, 0.0, 0.0, -x),
                Wrench::new(0.0, 0.0, 0.0, 0.0, 0.0, -1.0),
            ],
            dot_rows: [
                Wrench::zero(),
                Wrench::zero(),
                Wrench::zero(),
                Wrench::moment(Vector3::new(0.0, 0.0, y_dot)),
                Wrench::moment(Vector3::new(0.0, 0.0, -x_dot)),
                Wrench::zero(),
            ],
        })
    }
}
