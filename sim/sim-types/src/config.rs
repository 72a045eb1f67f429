//! Configuration for couplings.
//!
//! These values are normally supplied by the property layer of the owning
//! model; this crate only defines their shape and defaults.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tolerances governing unilateral engagement and iterative projection.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CouplingConfig {
    /// Separation speed above which an engaged limit is released.
    pub break_speed: f64,
    /// Separation acceleration threshold. Stored for the solver; the
    /// engagement decision itself is distance based.
    pub break_accel: f64,
    /// Distance from a bound at which a limit becomes engaged.
    pub contact_distance: f64,
    /// Relative tolerance for iterative projections.
    pub projection_tolerance: f64,
    /// Iteration cap for iterative projections.
    pub max_projection_iterations: usize,
}

impl Default for CouplingConfig {
    fn default() -> Self {
        Self {
            break_speed: 1e-8,
            break_accel: 1e-8,
            contact_distance: 1e-8,
            projection_tolerance: 1e-10,
            max_projection_iterations: 64,
        }
    }
}

impl CouplingConfig {
    /// Set the break speed.
    #[must_use]
    pub fn with_break_speed(mut self, break_speed: f64) -> Self {
        self.break_speed = break_speed;
        self
    }

    /// Set the break acceleration.
    #[must_use]
    pub fn with_break_accel(mut self, break_accel: f64) -> Self {
        self.break_accel = break_accel;
        self
    }

    /// Set the contact distance.
    #[must_use]
    pub fn with_contact_distance(mut self, contact_distance: f64) -> Self {
        self.contact_distance = contact_distance;
        self
    }

    /// Set the projection tolerance and iteration cap.
    #[must_use]
    pub fn with_projection(mut self, tolerance: f64, max_iterations: usize) -> Self {
        self.projection_tolerance = tolerance;
        self.max_projection_iterations = max_iterations;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> crate::Result<()> {
        if self.contact_distance.is_nan() || self.contact_distance < 0.0 {
            return Err(crate::SimError::invalid_config(
                "contact_distance must be non-negative",
            ));
        }

        if self.break_speed.is_nan()
            || self.break_speed < 0.0
            || self.break_accel.is_nan()
            || self.break_accel < 0.0
        {
            return Err(crate::SimError::invalid_config(
                "break_speed and break_accel must be non-negative",
            ));
        }

        if self.projection_tolerance.is_nan() || self.projection_tolerance <= 0.0 {
            return Err(crate::SimError::invalid_config(
                "projection_tolerance must be positive",
            ));
        }

        if self.max_projection_iterations == 0 {
            return Err(crate::SimError::invalid_config(
                "max_projection_iterations must be at least 1",
            ));
        }

        Ok(())
    }
}
