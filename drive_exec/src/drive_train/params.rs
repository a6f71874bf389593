//! Drive train parameters

use serde::Deserialize;

/// Parameters of the drive train facade.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DriveTrainParams {
    /// Encoder counts per unit of distance.
    pub dist_to_enc: f64,

    /// Negate the joystick y axis in the teleop entry points, set for sticks which read negative
    /// when pushed forward.
    pub invert_joystick_y: bool,

    /// Sleep between iterations of the distance drive, zero to busy-poll.
    ///
    /// Units: seconds
    pub move_poll_period_s: f64,
}

impl Default for DriveTrainParams {
    fn default() -> Self {
        Self {
            dist_to_enc: 77.066,
            invert_joystick_y: true,
            move_poll_period_s: 0.0,
        }
    }
}
