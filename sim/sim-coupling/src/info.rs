//! Per-DOF constraint rows handed to the solver.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use sim_types::Wrench;

/// Number of constraint rows every coupling carries (one per spatial DOF).
pub const NUM_CONSTRAINT_ROWS: usize = 6;

bitflags::bitflags! {
    /// Classification of a constraint row.
    ///
    /// A row without [`ConstraintFlags::BILATERAL`] is unilateral: it only
    /// contributes to the solver while engaged.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct ConstraintFlags: u8 {
        /// Always-active equality constraint.
        const BILATERAL = 0b0000_0001;
        /// Row constrains a translation.
        const LINEAR = 0b0000_0010;
        /// Row constrains a rotation.
        const ROTARY = 0b0000_0100;
    }
}

impl ConstraintFlags {
    /// Bilateral translational row.
    pub const BILATERAL_LINEAR: Self = Self::BILATERAL.union(Self::LINEAR);
    /// Bilateral rotational row.
    pub const BILATERAL_ROTARY: Self = Self::BILATERAL.union(Self::ROTARY);
}

/// Which side of a coordinate range is currently enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Engagement {
    /// The lower bound is active (`-1`).
    Lower,
    /// No bound is active (`0`).
    #[default]
    Inactive,
    /// The upper bound is active (`+1`).
    Upper,
}

impl Engagement {
    /// Tri-state integer value: `-1`, `0` or `+1`.
    #[must_use]
    pub const fn value(self) -> i8 {
        match self {
            Self::Lower => -1,
            Self::Inactive => 0,
            Self::Upper => 1,
        }
    }

    /// Whether a bound is active.
    #[must_use]
    pub const fn is_engaged(self) -> bool {
        !matches!(self, Self::Inactive)
    }
}

/// State of one constraint row.
///
/// Couplings own an array of [`NUM_CONSTRAINT_ROWS`] of these and keep them
/// across steps: `coordinate` carries angle continuity and `engaged`
/// carries limit state from one call to the next.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConstraintInfo {
    /// Row classification.
    pub flags: ConstraintFlags,
    /// Constraint direction in the joint frame C.
    pub wrench_c: Wrench,
    /// Time derivative of `wrench_c`.
    pub dot_wrench_c: Wrench,
    /// Bilateral rows: constraint error along the wrench.
    /// Engaged unilateral rows: penetration past the active bound
    /// (negative while still inside the contact band).
    pub distance: f64,
    /// Current joint coordinate for unilateral rows.
    pub coordinate: f64,
    /// Limit state for unilateral rows.
    pub engaged: Engagement,
}

impl ConstraintInfo {
    /// Whether the row is always active.
    #[must_use]
    pub fn is_bilateral(&self) -> bool {
        self.flags.contains(ConstraintFlags::BILATERAL)
    }

    /// Whether the row is a range limit.
    #[must_use]
    pub fn is_unilateral(&self) -> bool {
        !self.is_bilateral()
    }

    /// Whether the row constrains a rotation.
    #[must_use]
    pub fn is_rotary(&self) -> bool {
        self.flags.contains(ConstraintFlags::ROTARY)
    }

    /// Whether the row contributes to the solver this step.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_bilateral() || self.engaged.is_engaged()
    }

    /// Drop any limit contribution, keeping flags and coordinate.
    pub fn clear_limit(&mut self) {
        self.engaged = Engagement::Inactive;
        self.distance = 0.0;
        self.wrench_c.set_zero();
        self.dot_wrench_c.set_zero();
    }
}
