//! # Approach controllers module
//!
//! This module provides the scaled proportional laws used by the approach routine, including
//! their error calculations.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;
use util::maths::{get_ang_dist_deg, lin_map_clamped, signum};

use super::{ApproachParams, ScaledLawParams};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A proportional law with a deadzone and a bounded output.
#[derive(Debug, Serialize, Clone, Copy)]
pub struct ScaledLaw {
    deadzone: f64,
    min_error: f64,
    max_error: f64,
    min_speed: f64,
    max_speed: f64,
}

/// The three approach laws.
#[derive(Debug, Serialize, Clone, Copy)]
pub struct Laws {
    /// Heading error to rotation demand.
    pub rotation: ScaledLaw,

    /// Distance error to forward demand.
    pub approach: ScaledLaw,

    /// Vision offset error to lateral demand.
    pub lateral: ScaledLaw,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ScaledLaw {
    pub fn new(params: &ScaledLawParams) -> Self {
        Self {
            deadzone: params.deadzone,
            min_error: params.min_error,
            max_error: params.max_error,
            min_speed: params.min_speed,
            max_speed: params.max_speed,
        }
    }

    /// Get the demand for the given error.
    ///
    /// The output has the sign of the error and a magnitude of either zero
    /// (inside the deadzone) or between the minimum and maximum speeds.
    pub fn get(&self, error: f64) -> f64 {
        let magn = error.abs();

        if magn < self.deadzone {
            return 0.0
        }

        lin_map_clamped(
            (self.min_error, self.max_error),
            (self.min_speed, self.max_speed),
            magn
        ) * signum(error)
    }

    pub fn deadzone(&self) -> f64 {
        self.deadzone
    }
}

impl Laws {
    /// Create the laws from the parameters
    pub fn new(params: &ApproachParams) -> Self {
        Self {
            rotation: ScaledLaw::new(&params.rotation),
            approach: ScaledLaw::new(&params.approach),
            lateral: ScaledLaw::new(&params.lateral),
        }
    }

    /// Rotation demand to turn from `heading_deg` onto `target_deg` by the shortest path.
    pub fn rotation(&self, heading_deg: f64, target_deg: f64) -> f64 {
        self.rotation.get(get_ang_dist_deg(heading_deg, target_deg))
    }

    /// Forward demand to close from `dist` to `target_dist`.
    pub fn approach(&self, dist: f64, target_dist: f64) -> f64 {
        self.approach.get(dist - target_dist)
    }

    /// Lateral demand to move the vision offset from `offset` to `target_offset`.
    pub fn lateral(&self, offset: f64, target_offset: f64) -> f64 {
        self.lateral.get(offset - target_offset)
    }
}
