//! Core types for rigid-body couplings.
//!
//! This crate provides the data vocabulary shared by the coupling engine and
//! its collaborators:
//!
//! - [`RigidTransform`] - Rotation + translation between two frames
//! - [`Pose`] - World pose of a body
//! - [`Twist`] / [`Wrench`] - Spatial velocity and force directions
//! - [`CouplingConfig`] - Engagement and projection tolerances
//! - [`SimError`] - Errors reported by couplings and block matrices
//!
//! # Design Philosophy
//!
//! These types are **pure data**. They carry no joint semantics; couplings
//! in `sim-coupling` give them meaning.
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.
//!
//! # Frame Convention
//!
//! Twists and wrenches attached to a coupling are expressed in the joint
//! frame C, using C's origin as reference point.
//!
//! # Example
//!
//! ```
//! use sim_types::{RigidTransform, Twist, Wrench};
//! use nalgebra::Vector3;
//!
//! let tcd = RigidTransform::from_translation(Vector3::new(0.0, 0.0, 1.0));
//! let moved = tcd.integrate(&Twist::linear(Vector3::x()), 0.5);
//! assert!((moved.translation.x - 0.5).abs() < 1e-12);
//!
//! let row = Wrench::new(1.0, 0.0, 0.0, 0.0, 0.0, 0.0);
//! assert!((row.dot(&Twist::linear(Vector3::x())) - 1.0).abs() < 1e-12);
//! ```

#![doc(html_root_url = "https://docs.rs/sim-types/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,          // mul_add style changes aren't always clearer
    clippy::missing_errors_doc,        // Error docs added where non-obvious
    clippy::many_single_char_names,    // Math notation
)]

mod body;
mod config;
mod error;
mod transform;
mod wrench;

pub use body::{BodyId, Pose, Twist};
pub use config::CouplingConfig;
pub use error::SimError;
pub use transform::RigidTransform;
pub use wrench::Wrench;

// Re-export math types for convenience
pub use nalgebra::{Point3, Rotation3, UnitQuaternion, Vector3};

/// Result type for coupling operations.
pub type Result<T> = std::result::Result<T, SimError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_pose_to_transform() {
        let pose = Pose::from_position_rotation(
            Point3::new(1.0, 0.0, 0.0),
            UnitQuaternion::from_euler_angles(0.0, 0.0, std::f64::consts::FRAC_PI_2),
        );
        let t = RigidTransform::from(pose);

        let world = t.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert!((world.x - 1.0).abs() < 1e-10);
        assert!((world.y - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_config_validate() {
        assert!(CouplingConfig::default().validate().is_ok());
    }
}
