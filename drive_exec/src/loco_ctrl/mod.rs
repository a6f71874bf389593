//! Locomotion control module
//!
//! Converts an [`Intent`] (lateral, forward and rotational velocity fractions) into a demand for
//! each of the four mecanum wheels. When the command is field-oriented the translational part of
//! the intent is first counter-rotated by the chassis heading so that "forward" always means the
//! same direction on the field.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod cmd;
mod params;
mod state;
mod calc_field_oriented;
mod calc_mecanum;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use cmd::*;
pub use params::*;
pub use state::*;
pub use calc_field_oriented::{compensate_heading, suppress_twist};
pub use calc_mecanum::{mix, normalise};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during LocoCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum LocoCtrlError {
    #[error("Recieved a command with a non-finite component: {0:?}")]
    NonFiniteCmd(DriveCmd),

    #[error("A field-oriented command was recieved but no heading was provided")]
    NoHeading,

    #[error("The heading provided is not finite: {0}")]
    NonFiniteHeading(f64),
}
