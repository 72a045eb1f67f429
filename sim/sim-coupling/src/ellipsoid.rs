//! Ellipsoid coupling: frame C slides on the surface of an ellipsoid fixed
//! in D and twists about the surface normal.
//!
//! The surface is parametrized by longitude `x` and latitude `y`:
//!
//! ```text
//! p(x, y) = (a sin x cos y,  b sin y,  -c cos x cos y)
//! ```
//!
//! so `x = y = 0` is the bottom of the ellipsoid. The surface frame `R0`
//! has z along the inward normal and x along `∂p/∂x`; C is `R0 · Rz(θ)`.
//!
//! The tilting variant adds a fourth coordinate `φ` about C's own x axis,
//! giving `R0 · Rz(θ) · Rx(φ)` and leaving two bilateral rows. The OpenSim
//! approximation builds `R0` as if the ellipsoid were a unit sphere: the
//! frame follows the spherical angles while C's origin stays on the
//! ellipsoid.

use nalgebra::{DMatrix, DVector, Matrix3, Matrix6, Rotation3, Vector3, Vector6};
use sim_types::{CouplingConfig, RigidTransform, SimError, Twist, Wrench};
use tracing::warn;

use crate::coupling::{check_coordinate_count, closest_axis_angle};
use crate::gimbal::AxisPair;
use crate::{
    ConstraintBasis, ConstraintFlags, CoordinateRange, CouplingCore, CouplingType,
    RigidBodyCoupling,
};

/// Singular values below this, relative to the largest semi-axis, are
/// treated as zero when inverting the coordinate Jacobian.
const PINV_EPS: f64 = 1e-9;

/// Candidate wrench directions for the bilateral rows, in preference order:
/// normal force, then the two tilt moments.
const BILATERAL_CANDIDATES: [usize; 6] = [2, 3, 4, 0, 1, 5];

/// Ellipsoidal sliding coupling.
///
/// Coordinates are `[x, y, θ]` (longitude, latitude, twist), plus `φ` for
/// the tilting variant. Row 0 holds C on the surface. The other bilateral
/// rows keep C's z axis on the inward normal, or only stop rotation about
/// C's y axis when the coupling tilts.
#[derive(Debug, Clone, PartialEq)]
pub struct EllipsoidCoupling {
    core: CouplingCore,
    axes: Vector3<f64>,
    tilting: bool,
    open_sim: bool,
}

/// Orthonormal surface frame and the unnormalized vectors it came from.
struct SurfaceFrame {
    ex: Vector3<f64>,
    ey: Vector3<f64>,
    ez: Vector3<f64>,
    nx: Vector3<f64>,
    nz: Vector3<f64>,
}

impl SurfaceFrame {
    fn rotation(&self) -> Rotation3<f64> {
        Rotation3::from_matrix_unchecked(Matrix3::from_columns(&[self.ex, self.ey, self.ez]))
    }
}

/// Derivative of `n / |n|` given `dn`.
fn unit_derivative(n: &Vector3<f64>, unit: &Vector3<f64>, dn: &Vector3<f64>) -> Vector3<f64> {
    (dn - unit * unit.dot(dn)) / n.norm()
}

fn stack(linear: &Vector3<f64>, angular: &Vector3<f64>) -> Vector6<f64> {
    Vector6::new(
        linear.x, linear.y, linear.z, angular.x, angular.y, angular.z,
    )
}

fn checked_axes(a: f64, b: f64, c: f64) -> sim_types::Result<Vector3<f64>> {
    let axes = Vector3::new(a, b, c);
    if axes.iter().any(|v| !v.is_finite() || *v <= 0.0) {
        return Err(SimError::invalid_config(
            "ellipsoid semi-axes must be positive and finite",
        ));
    }
    Ok(axes)
}

impl EllipsoidCoupling {
    /// Index of the longitude.
    pub const X: usize = 0;
    /// Index of the latitude.
    pub const Y: usize = 1;
    /// Index of the twist about the normal.
    pub const THETA: usize = 2;
    /// Index of the tilt about C's x axis, tilting variant only.
    pub const PHI: usize = 3;

    /// Create an ellipsoid coupling with semi-axes `a`, `b`, `c` along x, y
    /// and z of frame D.
    ///
    /// Latitude is limited to `[-π/2, π/2]`; longitude and twist are
    /// unlimited.
    pub fn new(a: f64, b: f64, c: f64) -> sim_types::Result<Self> {
        let mut coupling = Self {
            core: CouplingCore::new(
                [
                    ConstraintFlags::BILATERAL_LINEAR,
                    ConstraintFlags::BILATERAL_ROTARY,
                    ConstraintFlags::BILATERAL_ROTARY,
                    ConstraintFlags::ROTARY,
                    ConstraintFlags::ROTARY,
                    ConstraintFlags::ROTARY,
                ],
                vec![
                    CoordinateRange::unlimited(),
                    CoordinateRange::symmetric(std::f64::consts::FRAC_PI_2),
                    CoordinateRange::unlimited(),
                ],
            ),
            axes: checked_axes(a, b, c)?,
            tilting: false,
            open_sim: false,
        };
        coupling.reset_constraint_info();
        Ok(coupling)
    }

    /// Create the tilting variant, with coordinates `[x, y, θ, φ]` and `φ`
    /// unlimited.
    pub fn new_tilting(a: f64, b: f64, c: f64) -> sim_types::Result<Self> {
        let mut coupling = Self {
            core: CouplingCore::new(
                [
                    ConstraintFlags::BILATERAL_LINEAR,
                    ConstraintFlags::BILATERAL_ROTARY,
                    ConstraintFlags::ROTARY,
                    ConstraintFlags::ROTARY,
                    ConstraintFlags::ROTARY,
                    ConstraintFlags::ROTARY,
                ],
                vec![
                    CoordinateRange::unlimited(),
                    CoordinateRange::symmetric(std::f64::consts::FRAC_PI_2),
                    CoordinateRange::unlimited(),
                    CoordinateRange::unlimited(),
                ],
            ),
            axes: checked_axes(a, b, c)?,
            tilting: true,
            open_sim: false,
        };
        coupling.reset_constraint_info();
        Ok(coupling)
    }

    /// Build the surface frame as for a unit sphere, the way OpenSim's
    /// ellipsoid joint does.
    #[must_use]
    pub fn with_open_sim_approximation(mut self, enabled: bool) -> Self {
        self.open_sim = enabled;
        self.reset_constraint_info();
        self
    }

    /// Semi-axes `(a, b, c)`.
    #[must_use]
    pub fn semi_axes(&self) -> Vector3<f64> {
        self.axes
    }

    /// Whether the coupling carries the `φ` coordinate.
    #[must_use]
    pub fn is_tilting(&self) -> bool {
        self.tilting
    }

    /// Whether the surface frame uses the OpenSim approximation.
    #[must_use]
    pub fn uses_open_sim_approximation(&self) -> bool {
        self.open_sim
    }

    /// Set the longitude range.
    #[must_use]
    pub fn with_x_range(mut self, range: CoordinateRange) -> Self {
        self.core.set_range(Self::X, range);
        self
    }

    /// Set the latitude range.
    #[must_use]
    pub fn with_y_range(mut self, range: CoordinateRange) -> Self {
        self.core.set_range(Self::Y, range);
        self
    }

    /// Set the twist range.
    #[must_use]
    pub fn with_theta_range(mut self, range: CoordinateRange) -> Self {
        self.core.set_range(Self::THETA, range);
        self
    }

    /// Set the tilt range. Has no effect unless the coupling tilts.
    #[must_use]
    pub fn with_phi_range(mut self, range: CoordinateRange) -> Self {
        self.core.set_range(Self::PHI, range);
        self
    }

    /// Set the tolerances.
    #[must_use]
    pub fn with_config(mut self, config: CouplingConfig) -> Self {
        self.core.set_config(config);
        self
    }

    /// Surface point at longitude `x`, latitude `y`.
    #[must_use]
    pub fn surface_point(&self, x: f64, y: f64) -> Vector3<f64> {
        let (sx, cx) = x.sin_cos();
        let (sy, cy) = y.sin_cos();
        Vector3::new(
            self.axes.x * sx * cy,
            self.axes.y * sy,
            -self.axes.z * cx * cy,
        )
    }

    fn frame_axes(&self) -> Vector3<f64> {
        if self.open_sim {
            Vector3::repeat(1.0)
        } else {
            self.axes
        }
    }

    fn frame(&self, x: f64, y: f64) -> SurfaceFrame {
        let axes = self.frame_axes();
        let (a, b, c) = (axes.x, axes.y, axes.z);
        let (sx, cx) = x.sin_cos();
        let (sy, cy) = y.sin_cos();
        let nz = Vector3::new(-sx * cy / a, -sy / b, cx * cy / c);
        let nx = Vector3::new(a * cx, 0.0, c * sx);
        let ez = nz.normalize();
        let ex = nx.normalize();
        SurfaceFrame {
            ex,
            ey: ez.cross(&ex),
            ez,
            nx,
            nz,
        }
    }

    fn phi(&self, coords: &[f64]) -> f64 {
        if self.tilting {
            coords[Self::PHI]
        } else {
            0.0
        }
    }

    fn transform_at(&self, x: f64, y: f64, theta: f64, phi: f64) -> RigidTransform {
        let rotation = self.frame(x, y).rotation()
            * Rotation3::from_axis_angle(&Vector3::z_axis(), theta)
            * Rotation3::from_axis_angle(&Vector3::x_axis(), phi);
        RigidTransform::new(rotation, self.surface_point(x, y))
    }

    /// Closest point on the surface to `p`.
    ///
    /// Solves for the Lagrange parameter `t` of the closest-point problem
    /// with Newton steps, falling back to bisection whenever a step leaves
    /// the current bracket.
    fn nearest_surface_point(&self, p: &Vector3<f64>) -> Vector3<f64> {
        if let Some(foot) = self.off_plane_foot(p) {
            return foot;
        }

        let config = self.core.config();
        let sq = self.axes.component_mul(&self.axes);
        let weighted = self.axes.component_mul(p);

        let value_and_slope = |t: f64| {
            let mut f = -1.0;
            let mut df = 0.0;
            for (s, w) in sq.iter().zip(weighted.iter()) {
                let d = s + t;
                let r = w / d;
                f += r * r;
                df -= 2.0 * r * r / d;
            }
            (f, df)
        };

        let mut lo = -sq.min();
        let mut hi = self.axes.max() * p.norm();
        let mut t = 0.0;
        let mut converged = false;
        let mut best = (f64::INFINITY, t);

        for _ in 0..config.max_projection_iterations {
            let (f, df) = value_and_slope(t);
            if f.abs() < best.0 {
                best = (f.abs(), t);
            }
            if f.abs() <= config.projection_tolerance {
                converged = true;
                break;
            }
            if f > 0.0 {
                lo = t;
            } else {
                hi = t;
            }
            let newton = t - f / df;
            let next = if newton > lo && newton < hi && newton.is_finite() {
                newton
            } else {
                0.5 * (lo + hi)
            };
            if (next - t).abs() <= config.projection_tolerance * (1.0 + t.abs()) {
                t = next;
                best.1 = t;
                converged = true;
                break;
            }
            t = next;
        }

        if !converged {
            warn!(
                iterations = config.max_projection_iterations,
                residual = best.0,
                "ellipsoid projection did not converge, using best iterate"
            );
            t = best.1;
        }

        let foot = Vector3::from_fn(|i, _| sq[i] * p[i] / (sq[i] + t));
        let scale = foot.component_div(&self.axes).norm();
        if scale > 0.0 && scale.is_finite() {
            foot / scale
        } else {
            self.surface_point(0.0, 0.0)
        }
    }

    /// Foot point of an interior `p` lying on the symmetry plane of the
    /// shortest axis, when the closest point is off that plane.
    ///
    /// The Lagrange parameter is then pinned at `-min(a²)` and the
    /// shortest-axis component comes from the surface equation. The side of
    /// the plane follows the stored coordinates.
    fn off_plane_foot(&self, p: &Vector3<f64>) -> Option<Vector3<f64>> {
        let sq = self.axes.component_mul(&self.axes);
        let i = sq.imin();
        if p[i].abs() > f64::EPSILON * self.axes[i] {
            return None;
        }

        let t = -sq[i];
        let mut foot = Vector3::zeros();
        let mut sum = 0.0;
        for j in (0..3).filter(|&j| j != i && p[j] != 0.0) {
            let d = sq[j] + t;
            if d <= 0.0 {
                return None;
            }
            foot[j] = sq[j] * p[j] / d;
            sum += (foot[j] / self.axes[j]).powi(2);
        }
        if sum >= 1.0 {
            return None;
        }

        let stored = self.surface_point(
            self.core.stored_coordinate(Self::X),
            self.core.stored_coordinate(Self::Y),
        );
        let side = if stored[i] < 0.0 { -1.0 } else { 1.0 };
        foot[i] = side * self.axes[i] * (1.0 - sum).sqrt();
        Some(foot)
    }

    /// Longitude and latitude of a point on the surface.
    fn surface_angles(&self, point: &Vector3<f64>) -> (f64, f64) {
        let u = point.component_div(&self.axes);
        let ring = u.x.hypot(u.z);
        let y = u.y.atan2(ring);
        let x = if ring < 1e-12 {
            // pole: longitude is carried by the frame only
            self.core.stored_coordinate(Self::X)
        } else {
            u.x.atan2(-u.z)
        };
        (x, y)
    }

    /// `(θ, φ)` of `rotation` relative to the surface frame at `(x, y)`.
    fn frame_angles(&self, x: f64, y: f64, rotation: &Rotation3<f64>) -> (f64, f64) {
        let residual = self.frame(x, y).rotation().transpose() * rotation;
        let stored_theta = self.core.stored_coordinate(Self::THETA);
        if self.tilting {
            let stored = (stored_theta, self.core.stored_coordinate(Self::PHI));
            AxisPair::new(Vector3::z_axis(), Vector3::x_axis())
                .angles(&RigidTransform::from_rotation(residual), stored)
        } else {
            let theta = closest_axis_angle(residual.matrix(), &Vector3::x(), &Vector3::y())
                .unwrap_or(stored_theta);
            (theta, 0.0)
        }
    }

    /// Twist of C per unit rate of each coordinate, expressed in C.
    fn jacobian(&self, coords: &[f64]) -> Vec<Vector6<f64>> {
        let (x, y, theta) = (coords[Self::X], coords[Self::Y], coords[Self::THETA]);
        let frame_axes = self.frame_axes();
        let (a, b, c) = (frame_axes.x, frame_axes.y, frame_axes.z);
        let (sx, cx) = x.sin_cos();
        let (sy, cy) = y.sin_cos();
        let f = self.frame(x, y);

        let dz_dx = unit_derivative(&f.nz, &f.ez, &Vector3::new(-cx * cy / a, 0.0, -sx * cy / c));
        let dx_dx = unit_derivative(&f.nx, &f.ex, &Vector3::new(-a * sx, 0.0, c * cx));
        let dy_dx = dz_dx.cross(&f.ex) + f.ez.cross(&dx_dx);

        let dz_dy = unit_derivative(&f.nz, &f.ez, &Vector3::new(sx * sy / a, -cy / b, -cx * sy / c));
        let dy_dy = dz_dy.cross(&f.ex);

        let spin_x = 0.5 * (f.ex.cross(&dx_dx) + f.ey.cross(&dy_dx) + f.ez.cross(&dz_dx));
        let spin_y = 0.5 * (f.ey.cross(&dy_dy) + f.ez.cross(&dz_dy));

        let (a, b, c) = (self.axes.x, self.axes.y, self.axes.z);
        let dp_dx = Vector3::new(a * cx * cy, 0.0, c * sx * cy);
        let dp_dy = Vector3::new(-a * sx * sy, b * cy, c * cx * sy);

        let tilt = Rotation3::from_axis_angle(&Vector3::x_axis(), self.phi(coords));
        let rt = (f.rotation() * Rotation3::from_axis_angle(&Vector3::z_axis(), theta) * tilt)
            .transpose();
        let mut columns = vec![
            stack(&(rt * dp_dx), &(rt * spin_x)),
            stack(&(rt * dp_dy), &(rt * spin_y)),
            stack(&Vector3::zeros(), &(tilt.transpose() * Vector3::z())),
        ];
        if self.tilting {
            columns.push(stack(&Vector3::zeros(), &Vector3::x()));
        }
        columns
    }

    /// Row directions at `coords` and the coordinate-rate map.
    fn rows_at(&self, coords: &[f64]) -> ([Vector6<f64>; 6], DMatrix<f64>) {
        let columns = self.jacobian(coords);
        let n = columns.len();
        let jac = DMatrix::from_fn(6, n, |r, k| columns[k][r]);
        let eps = PINV_EPS * self.axes.max().max(1.0);
        let pinv = jac
            .clone()
            .pseudo_inverse(eps)
            .unwrap_or_else(|_| DMatrix::zeros(n, 6));
        let image = &jac * &pinv;
        let complement = Matrix6::from_fn(|r, k| -image[(r, k)]) + Matrix6::identity();

        let nb = 6 - n;
        let mut rows = [Vector6::zeros(); 6];
        let mut count = 0;
        for &axis in &BILATERAL_CANDIDATES {
            if count == nb {
                break;
            }
            let mut v: Vector6<f64> = complement.column(axis).into_owned();
            for prev in &rows[..count] {
                v -= prev * prev.dot(&v);
            }
            let norm = v.norm();
            if norm > 1e-6 {
                rows[count] = v / norm;
                count += 1;
            }
        }
        for (k, row) in rows[nb..].iter_mut().enumerate() {
            *row = Vector6::from_fn(|i, _| pinv[(k, i)]);
        }
        (rows, pinv)
    }
}

impl RigidBodyCoupling for EllipsoidCoupling {
    fn coupling_type(&self) -> CouplingType {
        if self.tilting {
            CouplingType::EllipsoidTilt
        } else {
            CouplingType::Ellipsoid
        }
    }

    fn core(&self) -> &CouplingCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut CouplingCore {
        &mut self.core
    }

    fn project_to_constraint(&self, tcd: &RigidTransform) -> RigidTransform {
        let p = tcd.translation;
        let (x, y) = if p.norm() <= f64::EPSILON * self.axes.max() {
            (0.0, 0.0)
        } else {
            self.surface_angles(&self.nearest_surface_point(&p))
        };
        let (theta, phi) = self.frame_angles(x, y, &tcd.rotation);
        self.transform_at(x, y, theta, phi)
    }

    fn transform_to_coordinates(
        &self,
        tgd: &RigidTransform,
        coords: &mut [f64],
    ) -> sim_types::Result<()> {
        check_coordinate_count(coords.len(), self.num_coordinates())?;
        let (x, y) = self.surface_angles(&tgd.translation);
        let (theta, phi) = self.frame_angles(x, y, &tgd.rotation);
        coords[Self::X] = x;
        coords[Self::Y] = y;
        coords[Self::THETA] = theta;
        if self.tilting {
            coords[Self::PHI] = phi;
        }
        Ok(())
    }

    fn coordinates_to_transform(&self, coords: &[f64]) -> sim_types::Result<RigidTransform> {
        check_coordinate_count(coords.len(), self.num_coordinates())?;
        Ok(self.transform_at(
            coords[Self::X],
            coords[Self::Y],
            coords[Self::THETA],
            self.phi(coords),
        ))
    }

    fn constraint_basis(
        &self,
        coords: &[f64],
        velocity: &Twist,
    ) -> sim_types::Result<ConstraintBasis> {
        check_coordinate_count(coords.len(), self.num_coordinates())?;
        let (rows, pinv) = self.rows_at(coords);
        let twist = stack(&velocity.linear, &velocity.angular);
        let rates = &pinv * DVector::from_column_slice(twist.as_slice());

        let mut dot_rows = [Vector6::zeros(); 6];
        let speed = rates.norm();
        if speed > 1e-14 {
            let h = 1e-7 / speed;
            let ahead: Vec<f64> = coords.iter().zip(rates.iter()).map(|(q, r)| q + h * r).collect();
            let (rows_ahead, _) = self.rows_at(&ahead);
            for (dot, (next, now)) in dot_rows.iter_mut().zip(rows_ahead.iter().zip(&rows)) {
                *dot = (next - now) / h;
            }
        }

        Ok(ConstraintBasis {
            rows: rows.map(|r| Wrench::from_vector(&r)),
            dot_rows: dot_rows.map(|r| Wrench::from_vector(&r)),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{ConstraintInfo, Engagement};
    use approx::assert_relative_eq;

    fn coupling() -> EllipsoidCoupling {
        EllipsoidCoupling::new(0.3, 0.2, 0.4).unwrap()
    }

    fn tilting() -> EllipsoidCoupling {
        EllipsoidCoupling::new_tilting(0.3, 0.2, 0.4).unwrap()
    }

    /// Row for coordinate `idx` after moving to `coords`.
    fn limit_row(e: &mut EllipsoidCoupling, coords: &[f64], idx: usize) -> ConstraintInfo {
        let tcd = e.coordinates_to_transform(coords).unwrap();
        let tgd = e.project_to_constraint(&tcd);
        let row = e.num_bilaterals() + idx;
        e.get_constraint_info(&tgd, &tcd, &Twist::zero(), true).unwrap()[row]
    }

    /// Bilaterals annihilate every coordinate direction and the gradients
    /// are dual to them.
    fn assert_rows_split_motion(e: &EllipsoidCoupling, coords: &[f64]) {
        let basis = e.constraint_basis(coords, &Twist::zero()).unwrap();
        let jac = e.jacobian(coords);
        let nb = e.num_bilaterals();
        assert_eq!(nb + jac.len(), 6);
        for row in &basis.rows[..nb] {
            let n = row.to_vector();
            assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-9);
            for col in &jac {
                assert_relative_eq!(n.dot(col), 0.0, epsilon = 1e-9);
            }
        }
        for (k, g) in basis.rows[nb..].iter().enumerate() {
            for (j, col) in jac.iter().enumerate() {
                let expected = if k == j { 1.0 } else { 0.0 };
                assert_relative_eq!(g.to_vector().dot(col), expected, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_rejects_bad_axes() {
        assert!(EllipsoidCoupling::new(0.0, 1.0, 1.0).is_err());
        assert!(EllipsoidCoupling::new(1.0, -1.0, 1.0).is_err());
        assert!(EllipsoidCoupling::new(1.0, 1.0, f64::NAN).is_err());
        assert!(EllipsoidCoupling::new_tilting(1.0, 0.0, 1.0).is_err());
    }

    #[test]
    fn test_rest_pose_at_bottom() {
        let e = coupling();
        let t = e.coordinates_to_transform(&[0.0, 0.0, 0.0]).unwrap();
        assert_relative_eq!(t.translation, Vector3::new(0.0, 0.0, -0.4), epsilon = 1e-12);
        assert!(t.approx_eq(&RigidTransform::from_translation(Vector3::new(0.0, 0.0, -0.4)), 1e-12));
    }

    #[test]
    fn test_frame_z_is_inward_normal() {
        let e = coupling();
        let t = e.coordinates_to_transform(&[0.7, -0.4, 0.2]).unwrap();
        let p = t.translation;
        let outward = p.component_div(&e.axes.component_mul(&e.axes)).normalize();
        let z = t.transform_vector(&Vector3::z());
        assert_relative_eq!(z, -outward, epsilon = 1e-12);
    }

    #[test]
    fn test_nearest_point_of_outside_point() {
        let e = EllipsoidCoupling::new(1.0, 1.0, 1.0).unwrap();
        let foot = e.nearest_surface_point(&Vector3::new(0.0, 2.0, 0.0));
        assert_relative_eq!(foot, Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-9);

        let foot = e.nearest_surface_point(&Vector3::new(0.3, 0.0, -0.4));
        assert_relative_eq!(foot, Vector3::new(0.6, 0.0, -0.8), epsilon = 1e-9);
    }

    #[test]
    fn test_interior_point_on_short_axis_plane() {
        // y is the shortest axis, so the foot leaves the y = 0 plane
        let e = coupling();
        let p = Vector3::new(0.1, 0.0, 0.05);
        let foot = e.nearest_surface_point(&p);

        let y = 0.2 * (1.0 - 0.36 - (1.0_f64 / 6.0).powi(2)).sqrt();
        assert_relative_eq!(foot, Vector3::new(0.18, y, 0.05 / 0.75), epsilon = 1e-12);
        assert_relative_eq!(foot.component_div(&e.axes).norm(), 1.0, epsilon = 1e-12);

        // p - foot runs along the surface normal at foot
        let normal = foot.component_div(&e.axes.component_mul(&e.axes));
        assert_relative_eq!((p - foot).cross(&normal).norm(), 0.0, epsilon = 1e-12);

        let in_plane = Vector3::new(0.18, 0.0, 0.05 / 0.75);
        let in_plane = in_plane / in_plane.component_div(&e.axes).norm();
        assert!((p - foot).norm() < (p - in_plane).norm());
    }

    #[test]
    fn test_projection_of_lifted_pose() {
        let e = coupling();
        let on = e.coordinates_to_transform(&[0.5, 0.3, -0.2]).unwrap();
        // move along the outward normal
        let lifted = RigidTransform::new(on.rotation, on.translation - 0.05 * on.transform_vector(&Vector3::z()));
        let tgd = e.project_to_constraint(&lifted);
        assert!(tgd.approx_eq(&on, 1e-8));
    }

    #[test]
    fn test_iteration_cap_still_lands_on_surface() {
        let e = coupling().with_config(CouplingConfig::default().with_projection(1e-14, 1));
        let tcd = RigidTransform::from_translation(Vector3::new(0.9, -0.7, 0.3));
        let tgd = e.project_to_constraint(&tcd);
        assert!(tgd.translation.iter().all(|v| v.is_finite()));
        assert_relative_eq!(
            tgd.translation.component_div(&e.axes).norm(),
            1.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_centre_projects_to_rest_point() {
        let e = coupling();
        let tgd = e.project_to_constraint(&RigidTransform::identity());
        assert_relative_eq!(tgd.translation, e.surface_point(0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_bilaterals_orthogonal_to_motion() {
        assert_rows_split_motion(&coupling(), &[0.4, 0.6, 1.1]);
    }

    #[test]
    fn test_rest_normal_row_is_force_along_z() {
        let e = coupling();
        let info = e.constraint_info();
        assert_relative_eq!(info[0].wrench_c.force.z.abs(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_pole_keeps_stored_longitude() {
        let mut e = coupling();
        e.set_coordinate_value(EllipsoidCoupling::X, 0.3).unwrap();
        let pole = e
            .coordinates_to_transform(&[0.3, std::f64::consts::FRAC_PI_2, 0.1])
            .unwrap();
        let mut coords = [0.0; 3];
        e.transform_to_coordinates(&pole, &mut coords).unwrap();
        assert_relative_eq!(coords[0], 0.3, epsilon = 1e-12);
        assert_relative_eq!(coords[2], 0.1, epsilon = 1e-9);
    }

    #[test]
    fn test_latitude_limit_engages() {
        let mut e = coupling()
            .with_y_range(CoordinateRange::symmetric(0.5))
            .with_config(CouplingConfig::default().with_contact_distance(0.02));
        let coords = [0.2, 0.55, 0.0];
        let row = limit_row(&mut e, &coords, EllipsoidCoupling::Y);
        assert_eq!(row.engaged, Engagement::Upper);
        assert_relative_eq!(row.distance, 0.05, epsilon = 1e-9);
        assert_relative_eq!(row.coordinate, 0.55, epsilon = 1e-9);

        // the limit wrench opposes increasing latitude
        let jac = e.jacobian(&coords);
        assert_relative_eq!(
            row.wrench_c.to_vector().dot(&jac[EllipsoidCoupling::Y]),
            -1.0,
            epsilon = 1e-9
        );

        let row = limit_row(&mut e, &[0.2, 0.3, 0.0], EllipsoidCoupling::Y);
        assert_eq!(row.engaged, Engagement::Inactive);
    }

    #[test]
    fn test_tilting_variant_counts() {
        let e = tilting();
        assert!(e.is_tilting());
        assert_eq!(e.coupling_type(), CouplingType::EllipsoidTilt);
        assert_eq!(e.num_bilaterals(), 2);
        assert_eq!(e.num_coordinates(), 4);
        assert!(e.coordinates_to_transform(&[0.0; 3]).is_err());
    }

    #[test]
    fn test_tilting_round_trip() {
        let e = tilting();
        let coords = [0.4, -0.3, 0.7, 0.25];
        let tgd = e.coordinates_to_transform(&coords).unwrap();
        let mut back = [0.0; 4];
        e.transform_to_coordinates(&tgd, &mut back).unwrap();
        for (a, b) in coords.iter().zip(&back) {
            assert_relative_eq!(*a, *b, epsilon = 1e-9);
        }
        assert!(e.project_to_constraint(&tgd).approx_eq(&tgd, 1e-9));
    }

    #[test]
    fn test_tilting_rows_split_motion() {
        assert_rows_split_motion(&tilting(), &[0.4, 0.6, 1.1, -0.3]);
    }

    #[test]
    fn test_tilting_projection_is_idempotent() {
        let e = tilting();
        let on = e.coordinates_to_transform(&[0.1, 0.2, 0.3, 0.4]).unwrap();
        let bent = RigidTransform::new(
            on.rotation * Rotation3::from_axis_angle(&Vector3::y_axis(), 0.05),
            on.translation,
        );
        let tgd = e.project_to_constraint(&bent);
        assert_relative_eq!(tgd.translation, on.translation, epsilon = 1e-9);
        assert!(e.project_to_constraint(&tgd).approx_eq(&tgd, 1e-9));
    }

    #[test]
    fn test_phi_limit_engages() {
        let mut e = tilting().with_phi_range(CoordinateRange::symmetric(0.3));
        let coords = [0.0, 0.0, 0.0, -0.35];
        let row = limit_row(&mut e, &coords, EllipsoidCoupling::PHI);
        assert_eq!(row.engaged, Engagement::Lower);
        assert_relative_eq!(row.distance, 0.05, epsilon = 1e-9);

        // pushes φ back up
        let jac = e.jacobian(&coords);
        assert_relative_eq!(
            row.wrench_c.to_vector().dot(&jac[EllipsoidCoupling::PHI]),
            1.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_open_sim_frame_follows_sphere_angles() {
        let e = coupling().with_open_sim_approximation(true);
        assert!(e.uses_open_sim_approximation());
        let (x, y) = (0.7_f64, -0.4_f64);
        let t = e.coordinates_to_transform(&[x, y, 0.0]).unwrap();
        assert_relative_eq!(t.translation, e.surface_point(x, y), epsilon = 1e-12);

        let z = t.transform_vector(&Vector3::z());
        let sphere = Vector3::new(-x.sin() * y.cos(), -y.sin(), x.cos() * y.cos());
        assert_relative_eq!(z, sphere, epsilon = 1e-12);

        // differs from the true normal away from the axes
        let exact = coupling().coordinates_to_transform(&[x, y, 0.0]).unwrap();
        assert!((exact.transform_vector(&Vector3::z()) - z).norm() > 1e-3);
        assert_rows_split_motion(&e, &[x, y, 0.3]);
    }
}
