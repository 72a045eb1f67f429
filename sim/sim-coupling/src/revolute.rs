//! Revolute coupling: rotation about the shared z axis.

use nalgebra::{Rotation3, Vector3};
use sim_types::{CouplingConfig, RigidTransform, Twist, Wrench};

use crate::coupling::{check_coordinate_count, closest_axis_angle};
use crate::{
    ConstraintBasis, ConstraintFlags, CoordinateRange, CouplingCore, CouplingType,
    RigidBodyCoupling,
};

/// Single-axis hinge. C's origin coincides with D's and C rotates about z.
#[derive(Debug, Clone, PartialEq)]
pub struct RevoluteCoupling {
    core: CouplingCore,
}

impl RevoluteCoupling {
    /// Index of the hinge angle.
    pub const THETA: usize = 0;

    /// Create a revolute coupling with `θ ∈ [-π, π]` (no limit).
    #[must_use]
    pub fn new() -> Self {
        let mut coupling = Self {
            core: CouplingCore::new(
                [
                    ConstraintFlags::BILATERAL_LINEAR,
                    ConstraintFlags::BILATERAL_LINEAR,
                    ConstraintFlags::BILATERAL_LINEAR,
                    ConstraintFlags::BILATERAL_ROTARY,
                    ConstraintFlags::BILATERAL_ROTARY,
                    ConstraintFlags::ROTARY,
                ],
                vec![CoordinateRange::full_turn()],
            ),
        };
        coupling.reset_constraint_info();
        coupling
    }

    /// Set the range of θ.
    #[must_use]
    pub fn with_range(mut self, range: CoordinateRange) -> Self {
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

impl Default for RevoluteCoupling {
    fn default() -> Self {
        Self::new()
    }
}

impl RigidBodyCoupling for RevoluteCoupling {
    fn coupling_type(&self) -> CouplingType {
        CouplingType::Revolute
    }

    fn core(&self) -> &CouplingCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut CouplingCore {
        &mut self.core
    }

    fn project_to_constraint(&self, tcd: &RigidTransform) -> RigidTransform {
        let theta = closest_axis_angle(tcd.matrix(), &Vector3::x(), &Vector3::y())
            .unwrap_or_else(|| self.core.stored_coordinate(Self::THETA));
        RigidTransform::from_rotation(Rotation3::from_axis_angle(&Vector3::z_axis(), theta))
    }

    fn transform_to_coordinates(
        &self,
        tgd: &RigidTransform,
        coords: &mut [f64],
    ) -> sim_types::Result<()> {
        check_coordinate_count(coords.len(), 1)?;
        let m = tgd.matrix();
        coords[Self::THETA] = m[(1, 0)].atan2(m[(0, 0)]);
        Ok(())
    }

    fn coordinates_to_transform(&self, coords: &[f64]) -> sim_types::Result<RigidTransform> {
        check_coordinate_count(coords.len(), 1)?;
        Ok(RigidTransform::from_rotation(Rotation3::from_axis_angle(
            &Vector3::z_axis(),
            coords[Self::THETA],
        )))
    }

    fn constraint_basis(
        &self,
        coords: &[f64],
        _velocity: &Twist,
    ) -> sim_types::Result<ConstraintBasis> {
        check_coordinate_count(coords.len(), 1)?;
        Ok(ConstraintBasis {
            rows: [
                Wrench::new(1.0, 0.0, 0.0, 0.0, 0.0, 0.0),
                Wrench::new(0.0, 1.0, 0.0, 0.0, 0.0, 0.0),
                Wrench::new(0.0, 0.0, 1.0, 0.0, 0.0, 0.0),
                Wrench::new(0.0, 0.0, 0.0, 1.0, 0.0, 0.0),
                Wrench::new(0.0, 0.0, 0.0, 0.0, 1.0, 0.0),
                Wrench::new(0.0, 0.0, 0.0, 0.0, 0.0, 1.0),
            ],
            dot_rows: [Wrench::zero(); 6],
        })
    }
}
