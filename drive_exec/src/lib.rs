//! # Drive library.
//!
//! This library holds the mecanum drive control modules so that the executable, benchmarks and
//! tests can all use them.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Approach control module - aligns the robot to a placement target and performs the placement
pub mod approach_ctrl;

/// Drive train facade - owns the wheel and gyro handles and exposes the driving entry points
pub mod drive_train;

/// Equipment interfaces - the capabilities the control modules need from the hardware
pub mod eqpt;

/// Locomotion control module - converts intent vectors into individual wheel demands
pub mod loco_ctrl;

/// Simulation - a kinematic chassis standing in for the hardware
pub mod sim;

/// Watchdog for the blocking control loops
pub mod watchdog;
