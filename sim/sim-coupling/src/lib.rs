//! Joint couplings and numbered block storage for constrained rigid bodies.
//!
//! A coupling describes which relative poses a joint allows between a
//! child frame C and a parent frame D. It turns the current relative
//! transform `TCD` into a fixed set of six [`ConstraintInfo`] rows that a
//! velocity-level solver consumes.
//!
//! # Couplings
//!
//! - [`PlanarCoupling`]: translation in a plane plus rotation about its normal
//! - [`RevoluteCoupling`]: single-axis hinge
//! - [`RollPitchCoupling`]: roll about z, then pitch about the rotated y
//! - [`UniversalCoupling`]: Cardan joint about x then the rotated y
//! - [`EllipsoidCoupling`]: sliding on an ellipsoid with twist about the normal,
//!   optionally tilting about C's x axis
//!
//! # Constraint Rows
//!
//! Every coupling owns six rows. The first `num_bilaterals()` are always
//! active; the rest are range limits on the joint coordinates, engaged
//! only near a bound:
//!
//! ```text
//! bilateral:   wrench · twist = 0
//! unilateral:  wrench · twist >= 0   (while engaged)
//! ```
//!
//! Wrenches and twists are expressed in frame C with C's origin as the
//! reference point.
//!
//! # Example
//!
//! ```
//! use sim_coupling::{CoordinateRange, Engagement, PlanarCoupling, RigidBodyCoupling};
//! use sim_types::{CouplingConfig, RigidTransform, Twist};
//! use nalgebra::Vector3;
//!
//! let mut planar = PlanarCoupling::new()
//!     .with_x_range(CoordinateRange::symmetric(0.5))
//!     .with_config(CouplingConfig::default().with_contact_distance(0.01));
//!
//! // D's origin sits at x = 0.6 in C, past the upper x bound
//! let tcd = RigidTransform::from_translation(Vector3::new(-0.6, 0.0, 0.0));
//! let tgd = planar.project_to_constraint(&tcd);
//! let rows = planar.get_constraint_info(&tgd, &tcd, &Twist::zero(), true)?;
//!
//! let x_limit = &rows[planar.num_bilaterals() + PlanarCoupling::X];
//! assert_eq!(x_limit.engaged, Engagement::Upper);
//! assert!((x_limit.distance - 0.1).abs() < 1e-12);
//! # Ok::<(), sim_types::SimError>(())
//! ```
//!
//! # Block Matrices
//!
//! [`SparseNumberedBlockMatrix`] stores the solver's block-sparse system
//! with a stable number per block, recycled through a free list.
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.

#![doc(html_root_url = "https://docs.rs/sim-coupling/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::many_single_char_names, // Math notation
    clippy::similar_names,          // dx_dx / dz_dx style partials
    clippy::float_cmp,              // Exact zero checks when dropping entries
)]

mod coupling;
mod ellipsoid;
mod gimbal;
mod info;
mod joint;
mod limits;
mod planar;
mod revolute;
mod sparse;

pub use coupling::{ConstraintBasis, CouplingCore, CouplingType, RigidBodyCoupling};
pub use ellipsoid::EllipsoidCoupling;
pub use gimbal::{RollPitchCoupling, UniversalCoupling};
pub use info::{ConstraintFlags, ConstraintInfo, Engagement, NUM_CONSTRAINT_ROWS};
pub use joint::{
    CouplingJoint, EllipsoidJoint, PlanarJoint, RevoluteJoint, RollPitchJoint, UniversalJoint,
};
pub use limits::{nearest_angle, CoordinateKind, CoordinateRange};
pub use planar::PlanarCoupling;
pub use revolute::RevoluteCoupling;
pub use sparse::{MatrixBlock, SparseNumberedBlockMatrix};

// Re-export types needed to drive a coupling
pub use sim_types::{BodyId, CouplingConfig, Pose, RigidTransform, SimError, Twist, Wrench};
