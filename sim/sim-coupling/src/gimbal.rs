//! Two-axis rotary couplings.
//!
//! Both couplings here pin C's origin to D's and allow the rotation
//! `R = R_a(φ) · R_b(ψ)`: first about a fixed axis `a` of D, then about the
//! axis `b` carried along by the first rotation. The remaining rotation
//! about `a × b` is constrained.
//!
//! | Coupling | `a` | `b` |
//! |----------|-----|-----|
//! | [`RollPitchCoupling`] | z | y |
//! | [`UniversalCoupling`] | x | y |

use nalgebra::{Rotation3, Unit, Vector3};
use sim_types::{CouplingConfig, RigidTransform, Twist, Wrench};

use crate::coupling::{check_coordinate_count, closest_axis_angle};
use crate::{
    ConstraintBasis, ConstraintFlags, CoordinateRange, CouplingCore, CouplingType,
    RigidBodyCoupling,
};

const FLAGS: [ConstraintFlags; 6] = [
    ConstraintFlags::BILATERAL_LINEAR,
    ConstraintFlags::BILATERAL_LINEAR,
    ConstraintFlags::BILATERAL_LINEAR,
    ConstraintFlags::BILATERAL_ROTARY,
    ConstraintFlags::ROTARY,
    ConstraintFlags::ROTARY,
];

/// Ordered pair of orthogonal rotation axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct AxisPair {
    first: Unit<Vector3<f64>>,
    second: Unit<Vector3<f64>>,
}

impl AxisPair {
    pub(crate) fn new(first: Unit<Vector3<f64>>, second: Unit<Vector3<f64>>) -> Self {
        Self { first, second }
    }

    fn normal(&self) -> Vector3<f64> {
        self.first.cross(&self.second.into_inner())
    }

    fn rotation(&self, first: f64, second: f64) -> Rotation3<f64> {
        Rotation3::from_axis_angle(&self.first, first)
            * Rotation3::from_axis_angle(&self.second, second)
    }

    /// Angles of the manifold rotation closest to `tcd`.
    ///
    /// `stored` supplies the value of an angle that is undefined at the
    /// current pose (gimbal lock).
    pub(crate) fn angles(&self, tcd: &RigidTransform, stored: (f64, f64)) -> (f64, f64) {
        let b = self.second.into_inner();
        let c = self.normal();
        let mb = tcd.rotation * b;
        let (sin_first, cos_first) = (mb.dot(&c), mb.dot(&b));
        let first = if sin_first.abs() + cos_first.abs() < 1e-12 {
            stored.0
        } else {
            sin_first.atan2(cos_first)
        };

        let residual = Rotation3::from_axis_angle(&self.first, -first) * tcd.rotation;
        let second = closest_axis_angle(residual.matrix(), &c, &self.first.into_inner())
            .unwrap_or(stored.1);
        (first, second)
    }

    fn basis(&self, second: f64, velocity: &Twist) -> ConstraintBasis {
        let b = self.second.into_inner();
        // first axis seen from C
        let a_c = Rotation3::from_axis_angle(&self.second, -second) * self.first.into_inner();
        let second_dot = b.dot(&velocity.angular);
        let dot_a_c = -second_dot * b.cross(&a_c);

        ConstraintBasis {
            rows: [
                Wrench::new(1.0, 0.0, 0.0, 0.0, 0.0, 0.0),
                Wrench::new(0.0, 1.0, 0.0, 0.0, 0.0, 0.0),
                Wrench::new(0.0, 0.0, 1.0, 0.0, 0.0, 0.0),
                Wrench::moment(a_c.cross(&b)),
                Wrench::moment(a_c),
                Wrench::moment(b),
            ],
            dot_rows: [
                Wrench::zero(),
                Wrench::zero(),
                Wrench::zero(),
                Wrench::moment(dot_a_c.cross(&b)),
                Wrench::moment(dot_a_c),
                Wrench::zero(),
            ],
        }
    }
}

macro_rules! two_axis_coupling {
    (
        $(#[$meta:meta])*
        $name:ident, $ty:expr, $first:expr, $second:expr,
        $first_const:ident, $second_const:ident,
        $first_range:ident, $second_range:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            core: CouplingCore,
            axes: AxisPair,
        }

        impl $name {
            /// Index of the angle about the fixed axis.
            pub const $first_const: usize = 0;
            /// Index of the angle about the carried axis.
            pub const $second_const: usize = 1;

            /// Create the coupling with both angles unlimited.
            #[must_use]
            pub fn new() -> Self {
                let mut coupling = Self {
                    core: CouplingCore::new(
                        FLAGS,
                        vec![CoordinateRange::unlimited(), CoordinateRange::unlimited()],
                    ),
                    axes: AxisPair::new($first, $second),
                };
                coupling.reset_constraint_info();
                coupling
            }

            /// Set the range of the first angle.
            #[must_use]
            pub fn $first_range(mut self, range: CoordinateRange) -> Self {
                self.core.set_range(Self::$first_const, range);
                self
            }

            /// Set the range of the second angle.
            #[must_use]
            pub fn $second_range(mut self, range: CoordinateRange) -> Self {
                self.core.set_range(Self::$second_const, range);
                self
            }

            /// Set the tolerances.
            #[must_use]
            pub fn with_config(mut self, config: CouplingConfig) -> Self {
                self.core.set_config(config);
                self
            }

            fn stored_angles(&self) -> (f64, f64) {
                (
                    self.core.stored_coordinate(Self::$first_const),
                    self.core.stored_coordinate(Self::$second_const),
                )
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl RigidBodyCoupling for $name {
            fn coupling_type(&self) -> CouplingType {
                $ty
            }

            fn core(&self) -> &CouplingCore {
                &self.core
            }

            fn core_mut(&mut self) -> &mut CouplingCore {
                &mut self.core
            }

            fn project_to_constraint(&self, tcd: &RigidTransform) -> RigidTransform {
                let (first, second) = self.axes.angles(tcd, self.stored_angles());
                RigidTransform::from_rotation(self.axes.rotation(first, second))
            }

            fn transform_to_coordinates(
                &self,
                tgd: &RigidTransform,
                coords: &mut [f64],
            ) -> sim_types::Result<()> {
                check_coordinate_count(coords.len(), 2)?;
                let (first, second) = self.axes.angles(tgd, self.stored_angles());
                coords[Self::$first_const] = first;
                coords[Self::$second_const] = second;
                Ok(())
            }

            fn coordinates_to_transform(
                &self,
                coords: &[f64],
            ) -> sim_types::Result<RigidTransform> {
                check_coordinate_count(coords.len(), 2)?;
                Ok(RigidTransform::from_rotation(self.axes.rotation(
                    coords[Self::$first_const],
                    coords[Self::$second_const],
                )))
            }

            fn constraint_basis(
                &self,
                coords: &[f64],
                velocity: &Twist,
            ) -> sim_types::Result<ConstraintBasis> {
                check_coordinate_count(coords.len(), 2)?;
                Ok(self.axes.basis(coords[Self::$second_const], velocity))
            }
        }
    };
}

two_axis_coupling!(
    /// Roll about z followed by pitch about the rotated y axis.
    ///
    /// Coordinates are `[roll, pitch]`. Rows 0-2 pin the origin, row 3
    /// blocks rotation about the axis orthogonal to both joint axes.
    RollPitchCoupling,
    CouplingType::RollPitch,
    Vector3::z_axis(),
    Vector3::y_axis(),
    ROLL,
    PITCH,
    with_roll_range,
    with_pitch_range
);

two_axis_coupling!(
    /// Cardan joint: rotation about x followed by rotation about the
    /// rotated y axis.
    ///
    /// Coordinates are `[roll, pitch]`. Roll is undefined when C's y axis
    /// lines up with D's x axis; the stored roll is kept there.
    UniversalCoupling,
    CouplingType::Universal,
    Vector3::x_axis(),
    Vector3::y_axis(),
    ROLL,
    PITCH,
    with_roll_range,
    with_pitch_range
);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Engagement;
    use approx::assert_relative_eq;

    #[test]
    fn test_roll_pitch_counts() {
        let joint = RollPitchCoupling::new();
        assert_eq!(joint.num_bilaterals(), 4);
        assert_eq!(joint.num_coordinates(), 2);
        assert_eq!(joint.coupling_type(), CouplingType::RollPitch);
    }

    #[test]
    fn test_roll_pitch_round_trip() {
        let joint = RollPitchCoupling::new();
        let tgd = joint.coordinates_to_transform(&[0.4, -0.3]).unwrap();
        let mut coords = [0.0; 2];
        joint.transform_to_coordinates(&tgd, &mut coords).unwrap();
        assert_relative_eq!(coords[0], 0.4, epsilon = 1e-12);
        assert_relative_eq!(coords[1], -0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_universal_projection_removes_twist() {
        let joint = UniversalCoupling::new();
        let on = joint.coordinates_to_transform(&[0.2, 0.5]).unwrap();
        let off = RigidTransform::new(
            on.rotation * Rotation3::from_axis_angle(&Vector3::z_axis(), 0.01),
            Vector3::new(0.0, 0.0, 0.02),
        );
        let tgd = joint.project_to_constraint(&off);
        assert_relative_eq!(tgd.translation.norm(), 0.0);
        let again = joint.project_to_constraint(&tgd);
        assert!(again.approx_eq(&tgd, 1e-12));
    }

    #[test]
    fn test_constrained_axis_orthogonal_to_gradients() {
        let joint = UniversalCoupling::new();
        let basis = joint.constraint_basis(&[0.3, 0.7], &Twist::zero()).unwrap();
        let n = basis.rows[3].moment;
        assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(n.dot(&basis.rows[4].moment), 0.0, epsilon = 1e-12);
        assert_relative_eq!(n.dot(&basis.rows[5].moment), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_singular_pose_keeps_stored_roll() {
        let mut joint = UniversalCoupling::new();
        joint.set_coordinate_value(UniversalCoupling::ROLL, 0.25).unwrap();
        // maps C's y axis onto D's x axis
        let singular = RigidTransform::from_axis_angle(&Vector3::z_axis(), -std::f64::consts::FRAC_PI_2);
        let tgd = joint.project_to_constraint(&singular);
        let mut coords = [0.0; 2];
        joint.transform_to_coordinates(&tgd, &mut coords).unwrap();
        assert_relative_eq!(coords[0], 0.25, epsilon = 1e-12);
        assert!(joint.project_to_constraint(&tgd).approx_eq(&tgd, 1e-12));
    }

    #[test]
    fn test_pitch_limit_engages() {
        let mut joint = RollPitchCoupling::new()
            .with_pitch_range(CoordinateRange::from_degrees(-45.0, 45.0))
            .with_config(CouplingConfig::default().with_contact_distance(0.01));
        let tcd = joint.coordinates_to_transform(&[0.1, 50.0_f64.to_radians()]).unwrap();
        let tgd = joint.project_to_constraint(&tcd);
        let info = joint.get_constraint_info(&tgd, &tcd, &Twist::zero(), true).unwrap();
        assert_eq!(info[4].engaged, Engagement::Inactive);
        assert_eq!(info[5].engaged, Engagement::Upper);
        assert_relative_eq!(info[5].distance, 5.0_f64.to_radians(), epsilon = 1e-9);
        assert_relative_eq!(info[5].wrench_c.moment.y, -1.0, epsilon = 1e-12);
    }
}
