//! # Drive train
//!
//! The facade over the chassis. [`DriveTrain`] owns the four wheel actuators and the gyro, runs
//! [`LocoCtrl`](crate::loco_ctrl::LocoCtrl) to turn drive commands into wheel demands, and owns
//! the [`ApproachCtrl`](crate::approach_ctrl::ApproachCtrl) whose progress it exposes.
//!
//! Equipment used only by the approach routine is passed in per call as an
//! [`ApproachEqpt`](crate::eqpt::ApproachEqpt).

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod facade;
mod params;

#[cfg(test)]
pub(crate) mod fakes;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use facade::DriveTrain;
pub use params::DriveTrainParams;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DriveTrainError {
    #[error("Could not drive the wheels: {0}")]
    LocoCtrl(#[from] crate::loco_ctrl::LocoCtrlError),

    #[error("Approach routine failed: {0}")]
    Approach(#[from] crate::approach_ctrl::ApproachError),

    #[error("Blocking loop stopped by the watchdog: {0}")]
    Watchdog(#[from] crate::watchdog::WatchdogError),
}
