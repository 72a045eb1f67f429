//! Joints owning a coupling and the frames that attach it to two bodies.
//!
//! Frame C is fixed in the child body A (`TCA`), frame D in the parent body
//! B or in world (`TDB`). The joint tracks `TCD`, the pose of C in D, and
//! routes coordinate edits through the coupling so the pose stays on the
//! joint manifold.

use sim_types::{BodyId, Pose, RigidTransform, SimError, Twist};
use tracing::debug;

use crate::{
    ConstraintInfo, CoordinateRange, EllipsoidCoupling, PlanarCoupling, RevoluteCoupling,
    RigidBodyCoupling, RollPitchCoupling, UniversalCoupling,
};

/// Joint connecting a child body to a parent body (or world).
#[derive(Debug, Clone)]
pub struct CouplingJoint<C> {
    child: BodyId,
    parent: Option<BodyId>,
    child_attachment: RigidTransform,
    parent_attachment: RigidTransform,
    coupling: C,
    tcd: Option<RigidTransform>,
}

/// Planar joint.
pub type PlanarJoint = CouplingJoint<PlanarCoupling>;
/// Revolute joint.
pub type RevoluteJoint = CouplingJoint<RevoluteCoupling>;
/// Roll-pitch joint.
pub type RollPitchJoint = CouplingJoint<RollPitchCoupling>;
/// Universal joint.
pub type UniversalJoint = CouplingJoint<UniversalCoupling>;
/// Ellipsoid joint.
pub type EllipsoidJoint = CouplingJoint<EllipsoidCoupling>;

impl<C: RigidBodyCoupling> CouplingJoint<C> {
    /// Create a joint. `parent = None` attaches D to world.
    ///
    /// Both attachment frames default to identity.
    #[must_use]
    pub fn new(child: BodyId, parent: Option<BodyId>, coupling: C) -> Self {
        Self {
            child,
            parent,
            child_attachment: RigidTransform::identity(),
            parent_attachment: RigidTransform::identity(),
            coupling,
            tcd: None,
        }
    }

    /// Set `TCA`, the pose of C in the child body.
    #[must_use]
    pub fn with_child_attachment(mut self, tca: RigidTransform) -> Self {
        self.child_attachment = tca;
        self
    }

    /// Set `TDB`, the pose of D in the parent body (or world).
    #[must_use]
    pub fn with_parent_attachment(mut self, tdb: RigidTransform) -> Self {
        self.parent_attachment = tdb;
        self
    }

    /// Get the child body ID.
    #[must_use]
    pub fn child(&self) -> BodyId {
        self.child
    }

    /// Get the parent body ID, `None` for world.
    #[must_use]
    pub fn parent(&self) -> Option<BodyId> {
        self.parent
    }

    /// Get `TCA`.
    #[must_use]
    pub fn child_attachment(&self) -> &RigidTransform {
        &self.child_attachment
    }

    /// Get `TDB`.
    #[must_use]
    pub fn parent_attachment(&self) -> &RigidTransform {
        &self.parent_attachment
    }

    /// Get the coupling.
    #[must_use]
    pub fn coupling(&self) -> &C {
        &self.coupling
    }

    /// Get the coupling mutably.
    pub fn coupling_mut(&mut self) -> &mut C {
        &mut self.coupling
    }

    /// Current `TCD`, once attached.
    #[must_use]
    pub fn relative_transform(&self) -> Option<&RigidTransform> {
        self.tcd.as_ref()
    }

    /// Whether a relative pose is known.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.tcd.is_some()
    }

    /// Recompute `TCD` from body poses in world.
    pub fn update_poses(&mut self, child_pose: &Pose, parent_pose: Option<&Pose>) {
        let tcw = RigidTransform::from(*child_pose).compose(&self.child_attachment);
        let tdw = self.parent_frame(parent_pose);
        self.tcd = Some(tdw.inverse_compose(&tcw));
    }

    /// Set `TCD` directly.
    pub fn set_relative_transform(&mut self, tcd: RigidTransform) {
        self.tcd = Some(tcd);
    }

    /// Forget the relative pose.
    pub fn detach(&mut self) {
        self.tcd = None;
    }

    fn parent_frame(&self, parent_pose: Option<&Pose>) -> RigidTransform {
        match parent_pose {
            Some(pose) => RigidTransform::from(*pose).compose(&self.parent_attachment),
            None => self.parent_attachment,
        }
    }

    /// Coordinate `idx`, read from the current pose when attached.
    pub fn coordinate(&mut self, idx: usize) -> sim_types::Result<f64> {
        self.coupling.coordinate(idx, self.tcd.as_ref())
    }

    /// All coordinates.
    pub fn coordinates(&mut self) -> sim_types::Result<Vec<f64>> {
        let mut coords = vec![0.0; self.coupling.num_coordinates()];
        self.coupling.coordinates(self.tcd.as_ref(), &mut coords)?;
        Ok(coords)
    }

    /// Set coordinate `idx`, clipped into its range.
    ///
    /// When attached, the pose is moved accordingly and the new `TCD` is
    /// returned.
    pub fn set_coordinate(
        &mut self,
        idx: usize,
        value: f64,
    ) -> sim_types::Result<Option<RigidTransform>> {
        let value = self.coupling.range(idx)?.make_valid(value);
        match self.tcd {
            Some(mut tcd) => {
                self.coupling.set_coordinate(idx, &mut tcd, value)?;
                self.tcd = Some(tcd);
                Ok(Some(tcd))
            }
            None => {
                self.coupling.set_coordinate_value(idx, value)?;
                Ok(None)
            }
        }
    }

    /// Range of coordinate `idx`.
    pub fn range(&self, idx: usize) -> sim_types::Result<CoordinateRange> {
        self.coupling.range(idx)
    }

    /// Replace the range of coordinate `idx`, moving an attached joint back
    /// inside it if needed.
    pub fn set_range(&mut self, idx: usize, range: CoordinateRange) -> sim_types::Result<()> {
        self.coupling.set_range(idx, range)?;
        if self.tcd.is_some() {
            let current = self.coordinate(idx)?;
            if !range.contains(current) {
                debug!(coordinate = idx, value = current, "clipping coordinate into new range");
                self.set_coordinate(idx, current)?;
            }
        }
        Ok(())
    }

    /// Update and return the constraint rows for the current pose.
    pub fn constraint_info(
        &mut self,
        velocity: &Twist,
        set_engaged: bool,
    ) -> sim_types::Result<&[ConstraintInfo]> {
        let tcd = self.tcd.ok_or(SimError::NotAttached)?;
        let tgd = self.coupling.project_to_constraint(&tcd);
        self.coupling
            .get_constraint_info(&tgd, &tcd, velocity, set_engaged)
    }

    /// Release separating limits. See [`RigidBodyCoupling::update_engagement`].
    pub fn update_engagement(&mut self, velocity: &Twist) -> usize {
        self.coupling.update_engagement(velocity)
    }

    /// World pose of the child body that realizes the current `TCD`.
    pub fn child_pose_for(&self, parent_pose: Option<&Pose>) -> sim_types::Result<Pose> {
        let tcd = self.tcd.ok_or(SimError::NotAttached)?;
        let tcw = self.parent_frame(parent_pose).compose(&tcd);
        Ok(tcw.compose(&self.child_attachment.inverse()).into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, UnitQuaternion, Vector3};

    #[test]
    fn test_update_poses_with_attachments() {
        let mut joint = RevoluteJoint::new(BodyId::new(1), Some(BodyId::new(0)), RevoluteCoupling::new())
            .with_child_attachment(RigidTransform::from_translation(Vector3::new(0.0, 0.0, -0.5)));

        let parent = Pose::from_position(Point3::new(1.0, 0.0, 0.0));
        let child = Pose::from_position_rotation(
            Point3::new(1.0, 0.0, 0.5),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.4),
        );
        joint.update_poses(&child, Some(&parent));

        let tcd = joint.relative_transform().unwrap();
        assert_relative_eq!(tcd.translation.norm(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(joint.coordinate(0).unwrap(), 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_child_pose_round_trip() {
        let mut joint = PlanarJoint::new(BodyId::new(2), None, PlanarCoupling::new())
            .with_child_attachment(RigidTransform::from_translation(Vector3::new(0.1, 0.0, 0.0)))
            .with_parent_attachment(RigidTransform::from_translation(Vector3::new(0.0, 0.0, 1.0)));
        let child = Pose::from_position(Point3::new(0.5, 0.2, 1.0));
        joint.update_poses(&child, None);
        let back = joint.child_pose_for(None).unwrap();
        assert_relative_eq!(back.position, child.position, epsilon = 1e-12);
    }

    #[test]
    fn test_not_attached() {
        let mut joint = PlanarJoint::new(BodyId::new(1), None, PlanarCoupling::new());
        assert_eq!(
            joint.constraint_info(&Twist::zero(), true).unwrap_err(),
            SimError::NotAttached
        );
        assert!(joint.child_pose_for(None).is_err());
        // coordinates can still be edited before attachment
        assert!(joint.set_coordinate(PlanarCoupling::X, 0.2).unwrap().is_none());
        assert_relative_eq!(joint.coordinate(PlanarCoupling::X).unwrap(), 0.2);
    }

    #[test]
    fn test_set_coordinate_clips_and_moves() {
        let mut joint = PlanarJoint::new(
            BodyId::new(1),
            None,
            PlanarCoupling::new().with_x_range(CoordinateRange::symmetric(0.5)),
        );
        joint.set_relative_transform(RigidTransform::identity());
        let tcd = joint.set_coordinate(PlanarCoupling::X, 0.8).unwrap().unwrap();
        assert_relative_eq!(tcd.translation.x, -0.5, epsilon = 1e-12);
        assert_relative_eq!(joint.coordinate(PlanarCoupling::X).unwrap(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_set_range_reclips() {
        let mut joint = RevoluteJoint::new(BodyId::new(1), None, RevoluteCoupling::new());
        joint.set_relative_transform(RigidTransform::identity());
        joint.set_coordinate(0, 40.0_f64.to_radians()).unwrap();
        joint
            .set_range(0, CoordinateRange::from_degrees(-30.0, 30.0))
            .unwrap();
        assert_relative_eq!(
            joint.coordinate(0).unwrap(),
            30.0_f64.to_radians(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_boxed_coupling() {
        let coupling: Box<dyn RigidBodyCoupling> = Box::new(UniversalCoupling::new());
        let mut joint = CouplingJoint::new(BodyId::new(1), None, coupling);
        joint.set_relative_transform(RigidTransform::from_axis_angle(&Vector3::x_axis(), 0.3));
        assert_eq!(joint.coupling().num_coordinates(), 2);
        assert_relative_eq!(joint.coordinate(0).unwrap(), 0.3, epsilon = 1e-12);
        assert_eq!(joint.constraint_info(&Twist::zero(), true).unwrap().len(), 6);
    }
}
