//! The coupling protocol shared by all joint types.
//!
//! A coupling describes the manifold of relative poses a joint allows
//! between its child frame C and its parent frame D. Given the current
//! relative transform `TCD` it
//!
//! 1. projects it onto the manifold (`TGD`),
//! 2. reads the joint coordinates off `TGD`,
//! 3. fills [`ConstraintInfo`] rows for the solver.
//!
//! Rows `0..num_bilaterals()` are bilateral. The remaining rows are the
//! per-coordinate range limits; coordinate `k` lives in row
//! `num_bilaterals() + k`.

use nalgebra::{Matrix3, Vector3};
use sim_types::{CouplingConfig, RigidTransform, Twist, Wrench};
use tracing::debug;

use crate::limits::nearest_angle;
use crate::{
    ConstraintFlags, ConstraintInfo, CoordinateKind, CoordinateRange, Engagement,
    NUM_CONSTRAINT_ROWS,
};

/// Joint variant implemented by a coupling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CouplingType {
    /// Planar translation plus rotation about the plane normal.
    Planar,
    /// Rotation about a single axis.
    Revolute,
    /// Rotation about z followed by rotation about the new y.
    RollPitch,
    /// Rotation about x followed by rotation about the new y.
    Universal,
    /// Frame sliding on an ellipsoid surface with twist about the normal.
    Ellipsoid,
    /// Ellipsoid sliding with an extra tilt about C's x axis.
    EllipsoidTilt,
}

impl CouplingType {
    /// Number of always-active constraint rows.
    #[must_use]
    pub const fn num_bilaterals(self) -> usize {
        match self {
            Self::Planar | Self::Ellipsoid => 3,
            Self::Revolute => 5,
            Self::RollPitch | Self::Universal => 4,
            Self::EllipsoidTilt => 2,
        }
    }

    /// Number of coordinates, each with a potential range limit.
    #[must_use]
    pub const fn max_unilaterals(self) -> usize {
        NUM_CONSTRAINT_ROWS - self.num_bilaterals()
    }
}

/// Row directions of a coupling at a given configuration.
///
/// `rows[..num_bilaterals]` are the bilateral wrenches. The rest are the
/// coordinate gradients: `rows[num_bilaterals + k] · twist` is the rate of
/// coordinate `k` for a relative twist expressed in frame C.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConstraintBasis {
    /// Wrench or gradient per row.
    pub rows: [Wrench; NUM_CONSTRAINT_ROWS],
    /// Time derivative of each row.
    pub dot_rows: [Wrench; NUM_CONSTRAINT_ROWS],
}

/// State shared by every coupling: the row array, ranges and tolerances.
#[derive(Debug, Clone, PartialEq)]
pub struct CouplingCore {
    info: [ConstraintInfo; NUM_CONSTRAINT_ROWS],
    ranges: Vec<CoordinateRange>,
    num_bilaterals: usize,
    config: CouplingConfig,
}

impl CouplingCore {
    /// Create the core from row flags and coordinate ranges.
    ///
    /// Bilateral rows must come first; `ranges` has one entry per
    /// unilateral row.
    #[must_use]
    pub fn new(flags: [ConstraintFlags; NUM_CONSTRAINT_ROWS], ranges: Vec<CoordinateRange>) -> Self {
        let num_bilaterals = flags
            .iter()
            .take_while(|f| f.contains(ConstraintFlags::BILATERAL))
            .count();
        debug_assert_eq!(ranges.len(), NUM_CONSTRAINT_ROWS - num_bilaterals);

        let mut info = [ConstraintInfo::default(); NUM_CONSTRAINT_ROWS];
        for (row, f) in info.iter_mut().zip(flags) {
            row.flags = f;
        }

        Self {
            info,
            ranges,
            num_bilaterals,
            config: CouplingConfig::default(),
        }
    }

    /// Number of bilateral rows.
    #[must_use]
    pub fn num_bilaterals(&self) -> usize {
        self.num_bilaterals
    }

    /// The persisted row array.
    #[must_use]
    pub fn info(&self) -> &[ConstraintInfo; NUM_CONSTRAINT_ROWS] {
        &self.info
    }

    /// Mutable access to the persisted row array.
    pub fn info_mut(&mut self) -> &mut [ConstraintInfo; NUM_CONSTRAINT_ROWS] {
        &mut self.info
    }

    /// Tolerances.
    #[must_use]
    pub fn config(&self) -> &CouplingConfig {
        &self.config
    }

    pub(crate) fn set_range(&mut self, idx: usize, range: CoordinateRange) {
        if let Some(slot) = self.ranges.get_mut(idx) {
            *slot = range;
        }
    }

    /// Builder-time config assignment; validation happens in
    /// [`RigidBodyCoupling::set_config`].
    pub(crate) fn set_config(&mut self, config: CouplingConfig) {
        self.config = config;
    }

    /// Stored value of coordinate `idx` (no bounds check).
    #[must_use]
    pub fn stored_coordinate(&self, idx: usize) -> f64 {
        self.info[self.num_bilaterals + idx].coordinate
    }
}

fn check_index(idx: usize, count: usize) -> sim_types::Result<()> {
    if idx < count {
        Ok(())
    } else {
        Err(sim_types::SimError::InvalidCoordinate { index: idx, count })
    }
}

/// Fails unless a coordinate buffer holds exactly `expected` entries.
pub(crate) fn check_coordinate_count(len: usize, expected: usize) -> sim_types::Result<()> {
    if len == expected {
        Ok(())
    } else {
        Err(sim_types::SimError::CoordinateCount {
            expected,
            actual: len,
        })
    }
}

fn check_storage(len: usize) -> sim_types::Result<()> {
    if len == NUM_CONSTRAINT_ROWS {
        Ok(())
    } else {
        Err(sim_types::SimError::ConstraintStorage {
            expected: NUM_CONSTRAINT_ROWS,
            actual: len,
        })
    }
}

/// Angle of the rotation about the axis `u × w` closest to `m`.
///
/// Maximizes `tr(R(θ)ᵀ m)` over rotations `R(θ)` mapping `u` to
/// `cos θ u + sin θ w`. Returns `None` when every angle fits equally well.
pub(crate) fn closest_axis_angle(
    m: &Matrix3<f64>,
    u: &Vector3<f64>,
    w: &Vector3<f64>,
) -> Option<f64> {
    let mu = m * u;
    let mw = m * w;
    let s = w.dot(&mu) - u.dot(&mw);
    let c = u.dot(&mu) + w.dot(&mw);
    if s.abs() + c.abs() < 1e-12 {
        None
    } else {
        Some(s.atan2(c))
    }
}

/// Capability interface of a joint coupling.
///
/// Implementors supply the manifold geometry; range limiting, angle
/// unwrapping and row bookkeeping are provided.
pub trait RigidBodyCoupling: std::fmt::Debug {
    /// Joint variant.
    fn coupling_type(&self) -> CouplingType;

    /// Shared state.
    fn core(&self) -> &CouplingCore;

    /// Mutable shared state.
    fn core_mut(&mut self) -> &mut CouplingCore;

    /// Nearest transform to `tcd` lying on the joint manifold.
    ///
    /// Idempotent. Reads the stored coordinates to stay continuous where
    /// the manifold parametrization is singular.
    fn project_to_constraint(&self, tcd: &RigidTransform) -> RigidTransform;

    /// Read raw coordinates off a transform on the manifold.
    ///
    /// Angles come back in `(-π, π]`; unwrapping is done by the caller.
    /// `coords` must hold [`num_coordinates`](Self::num_coordinates) entries.
    fn transform_to_coordinates(
        &self,
        tgd: &RigidTransform,
        coords: &mut [f64],
    ) -> sim_types::Result<()>;

    /// Build the manifold transform for the given coordinates.
    fn coordinates_to_transform(&self, coords: &[f64]) -> sim_types::Result<RigidTransform>;

    /// Bilateral wrenches and coordinate gradients at `coords`.
    ///
    /// `velocity` is the relative twist of C with respect to D, in C, and
    /// is only used for the derivative rows.
    fn constraint_basis(
        &self,
        coords: &[f64],
        velocity: &Twist,
    ) -> sim_types::Result<ConstraintBasis>;

    /// Number of always-active rows.
    fn num_bilaterals(&self) -> usize {
        self.core().num_bilaterals()
    }

    /// Number of range-limited rows, equal to the number of coordinates.
    fn max_unilaterals(&self) -> usize {
        NUM_CONSTRAINT_ROWS - self.num_bilaterals()
    }

    /// Number of joint coordinates.
    fn num_coordinates(&self) -> usize {
        self.max_unilaterals()
    }

    /// Kind of coordinate `idx`.
    fn coordinate_kind(&self, idx: usize) -> sim_types::Result<CoordinateKind> {
        check_index(idx, self.num_coordinates())?;
        let row = &self.core().info()[self.num_bilaterals() + idx];
        Ok(if row.is_rotary() {
            CoordinateKind::Rotary
        } else {
            CoordinateKind::Linear
        })
    }

    /// Range of coordinate `idx`.
    fn range(&self, idx: usize) -> sim_types::Result<CoordinateRange> {
        check_index(idx, self.num_coordinates())?;
        Ok(self.core().ranges[idx])
    }

    /// Replace the range of coordinate `idx`.
    ///
    /// Does not move the joint; [`CouplingJoint::set_range`](crate::CouplingJoint::set_range)
    /// re-clips an attached joint.
    fn set_range(&mut self, idx: usize, range: CoordinateRange) -> sim_types::Result<()> {
        check_index(idx, self.num_coordinates())?;
        self.core_mut().ranges[idx] = range;
        Ok(())
    }

    /// Tolerances.
    fn config(&self) -> &CouplingConfig {
        self.core().config()
    }

    /// Replace the tolerances.
    fn set_config(&mut self, config: CouplingConfig) -> sim_types::Result<()> {
        config.validate()?;
        self.core_mut().config = config;
        Ok(())
    }

    /// The persisted constraint rows.
    fn constraint_info(&self) -> &[ConstraintInfo] {
        self.core().info()
    }

    /// Assign static flags and rest-pose bilateral wrenches to `info`.
    fn initialize_constraint_info(&self, info: &mut [ConstraintInfo]) -> sim_types::Result<()> {
        check_storage(info.len())?;
        let rest = [0.0; NUM_CONSTRAINT_ROWS];
        let basis = self.constraint_basis(&rest[..self.num_coordinates()], &Twist::zero())?;
        let nb = self.num_bilaterals();
        for (i, row) in info.iter_mut().enumerate() {
            *row = ConstraintInfo {
                flags: self.core().info()[i].flags,
                ..ConstraintInfo::default()
            };
            if i < nb {
                row.wrench_c = basis.rows[i];
            }
        }
        Ok(())
    }

    /// Reset the owned rows to their initial state.
    fn reset_constraint_info(&mut self) {
        let mut info = *self.core().info();
        if self.initialize_constraint_info(&mut info).is_ok() {
            *self.core_mut().info_mut() = info;
        }
    }

    /// Copy the owned rows into solver storage.
    fn copy_constraint_info(&self, out: &mut [ConstraintInfo]) -> sim_types::Result<()> {
        check_storage(out.len())?;
        out.copy_from_slice(self.core().info());
        Ok(())
    }

    /// Read coordinates off an on-manifold transform, unwrap and store them.
    fn update_coordinates(
        &mut self,
        tgd: &RigidTransform,
        coords: &mut [f64],
    ) -> sim_types::Result<()> {
        let nb = self.num_bilaterals();
        check_coordinate_count(coords.len(), self.num_coordinates())?;
        self.transform_to_coordinates(tgd, coords)?;
        let info = self.core_mut().info_mut();
        for (value, row) in coords.iter_mut().zip(&mut info[nb..]) {
            if row.is_rotary() {
                *value = nearest_angle(row.coordinate, *value);
            }
            row.coordinate = *value;
        }
        Ok(())
    }

    /// All coordinates.
    ///
    /// With a transform, it is projected first and the result stored.
    /// Without one, the stored values are returned.
    fn coordinates(
        &mut self,
        tcd: Option<&RigidTransform>,
        coords: &mut [f64],
    ) -> sim_types::Result<()> {
        check_coordinate_count(coords.len(), self.num_coordinates())?;
        match tcd {
            Some(tcd) => {
                let tgd = self.project_to_constraint(tcd);
                self.update_coordinates(&tgd, coords)?;
            }
            None => {
                for (k, value) in coords.iter_mut().enumerate() {
                    *value = self.core().stored_coordinate(k);
                }
            }
        }
        Ok(())
    }

    /// Coordinate `idx`, read from `tcd` when given.
    fn coordinate(&mut self, idx: usize, tcd: Option<&RigidTransform>) -> sim_types::Result<f64> {
        let n = self.num_coordinates();
        check_index(idx, n)?;
        let mut coords = [0.0; NUM_CONSTRAINT_ROWS];
        self.coordinates(tcd, &mut coords[..n])?;
        Ok(coords[idx])
    }

    /// Set coordinate `idx` on `tgd`, holding the others fixed.
    ///
    /// `tgd` is projected first and replaced by the resulting manifold
    /// transform.
    fn set_coordinate(
        &mut self,
        idx: usize,
        tgd: &mut RigidTransform,
        value: f64,
    ) -> sim_types::Result<()> {
        let n = self.num_coordinates();
        check_index(idx, n)?;
        let mut coords = [0.0; NUM_CONSTRAINT_ROWS];
        let projected = self.project_to_constraint(tgd);
        self.update_coordinates(&projected, &mut coords[..n])?;
        coords[idx] = value;
        *tgd = self.coordinates_to_transform(&coords[..n])?;
        self.set_coordinate_value(idx, value)
    }

    /// Store a coordinate value without touching any transform.
    fn set_coordinate_value(&mut self, idx: usize, value: f64) -> sim_types::Result<()> {
        check_index(idx, self.num_coordinates())?;
        let nb = self.num_bilaterals();
        self.core_mut().info_mut()[nb + idx].coordinate = value;
        Ok(())
    }

    /// Update all rows for the current step.
    ///
    /// `tgd` is the projection of `tcd`; the bilateral distances are the
    /// error `TGD⁻¹·TCD` measured along each wrench. With `set_engaged`,
    /// range limits are re-evaluated against the contact distance.
    fn get_constraint_info(
        &mut self,
        tgd: &RigidTransform,
        tcd: &RigidTransform,
        velocity: &Twist,
        set_engaged: bool,
    ) -> sim_types::Result<&[ConstraintInfo]> {
        let n = self.num_coordinates();
        let nb = self.num_bilaterals();
        let err = tgd.inverse_compose(tcd).error_twist();

        let mut coords = [0.0; NUM_CONSTRAINT_ROWS];
        self.update_coordinates(tgd, &mut coords[..n])?;
        let basis = self.constraint_basis(&coords[..n], velocity)?;

        let core = self.core_mut();
        let contact_distance = core.config.contact_distance;

        for i in 0..nb {
            let row = &mut core.info[i];
            row.wrench_c = basis.rows[i];
            row.dot_wrench_c = basis.dot_rows[i];
            row.distance = row.wrench_c.dot(&err);
        }

        for (k, &value) in coords.iter().take(n).enumerate() {
            let range = core.ranges[k];
            let row = &mut core.info[nb + k];
            let kind = if row.is_rotary() {
                CoordinateKind::Rotary
            } else {
                CoordinateKind::Linear
            };
            if !range.is_bounded(kind) {
                row.clear_limit();
                continue;
            }
            if set_engaged {
                let engaged = range.engagement(value, contact_distance);
                if engaged != row.engaged {
                    debug!(
                        coordinate = k,
                        value,
                        from = row.engaged.value(),
                        to = engaged.value(),
                        "limit engagement changed"
                    );
                }
                row.engaged = engaged;
            }
            let (grad, dot_grad) = (basis.rows[nb + k], basis.dot_rows[nb + k]);
            match row.engaged {
                Engagement::Inactive => row.clear_limit(),
                Engagement::Upper => {
                    row.distance = range.penetration(value, Engagement::Upper);
                    row.wrench_c = -grad;
                    row.dot_wrench_c = -dot_grad;
                }
                Engagement::Lower => {
                    row.distance = range.penetration(value, Engagement::Lower);
                    row.wrench_c = grad;
                    row.dot_wrench_c = dot_grad;
                }
            }
        }

        Ok(core.info())
    }

    /// Same as [`get_constraint_info`](Self::get_constraint_info), writing into solver storage.
    fn get_constraint_info_into(
        &mut self,
        info: &mut [ConstraintInfo],
        tgd: &RigidTransform,
        tcd: &RigidTransform,
        velocity: &Twist,
        set_engaged: bool,
    ) -> sim_types::Result<()> {
        check_storage(info.len())?;
        let rows = self.get_constraint_info(tgd, tcd, velocity, set_engaged)?;
        info.copy_from_slice(rows);
        Ok(())
    }

    /// Release engaged limits that are inside their range and separating.
    ///
    /// A row is released when its distance is not positive and the
    /// relative velocity along its wrench exceeds the break speed.
    /// Returns the number of rows released.
    fn update_engagement(&mut self, velocity: &Twist) -> usize {
        let nb = self.num_bilaterals();
        let core = self.core_mut();
        let break_speed = core.config.break_speed;
        let mut released = 0;
        for (k, row) in core.info.iter_mut().enumerate().skip(nb) {
            if !row.engaged.is_engaged() {
                continue;
            }
            let speed = row.wrench_c.dot(velocity);
            if row.distance <= 0.0 && speed > break_speed {
                debug!(coordinate = k - nb, speed, "limit released");
                row.clear_limit();
                released += 1;
            }
        }
        released
    }

    /// Number of currently engaged limits.
    fn num_engaged(&self) -> usize {
        self.core()
            .info()
            .iter()
            .skip(self.num_bilaterals())
            .filter(|row| row.engaged.is_engaged())
            .count()
    }
}

impl<T: RigidBodyCoupling + ?Sized> RigidBodyCoupling for Box<T> {
    fn coupling_type(&self) -> CouplingType {
        (**self).coupling_type()
    }

    fn core(&self) -> &CouplingCore {
        (**self).core()
    }

    fn core_mut(&mut self) -> &mut CouplingCore {
        (**self).core_mut()
    }

    fn project_to_constraint(&self, tcd: &RigidTransform) -> RigidTransform {
        (**self).project_to_constraint(tcd)
    }

    fn transform_to_coordinates(
        &self,
        tgd: &RigidTransform,
        coords: &mut [f64],
    ) -> sim_types::Result<()> {
        (**self).transform_to_coordinates(tgd, coords)
    }

    fn coordinates_to_transform(&self, coords: &[f64]) -> sim_types::Result<RigidTransform> {
        (**self).coordinates_to_transform(coords)
    }

    fn constraint_basis(
        &self,
        coords: &[f64],
        velocity: &Twist,
    ) -> sim_types::Result<ConstraintBasis> {
        (**self).constraint_basis(coords, velocity)
    }
}
