//! # Approach control module
//!
//! Drives the robot onto one of a small set of fixed placement targets and releases the payload.
//! The routine is a five stage sequence:
//!
//! - `SeekHeading` - rotate on the spot until facing the target heading.
//! - `CentreLateral` - strafe until the vision sensor sees the target in the centre of the image.
//! - `Approach` - drive towards the target until the distance sensor reads the placing distance.
//! - `Retreat` - back away until clear of the target.
//! - `Release` - operate the placement mechanism.
//!
//! [`Stage::advance`] is the pure transition function, [`ApproachCtrl`] wraps it into a module
//! stepped once per control cycle.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod controllers;
mod params;
mod stage;
mod state;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use controllers::{Laws, ScaledLaw};
pub use params::{ApproachParams, ScaledLawParams};
pub use stage::{ApproachStyle, SensorFrame, Stage, StageCmd, StageEvent, Transition};
pub use state::{nearest_target, ApproachCtrl, InputData, StatusReport};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// The number of placement targets.
pub const NUM_TARGETS: usize = 3;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors that can occur during the approach routine.
#[derive(Debug, thiserror::Error)]
pub enum ApproachError {
    #[error("Target index {0} is invalid, expected 0 (left), 1 (middle) or 2 (right)")]
    InvalidTarget(usize),

    #[error("The vision sensor cannot see the target, routine aborted")]
    VisionUnavailable,
}
