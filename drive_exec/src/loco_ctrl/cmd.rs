//! Commands passed into LocoCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The desired motion of the chassis for one control cycle.
///
/// Each component is a fraction of full speed between -1 and +1.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Intent {
    /// Lateral velocity, positive to the right.
    pub x: f64,

    /// Forward velocity, positive forwards.
    pub y: f64,

    /// Rotational velocity, positive clockwise.
    pub rotation: f64,
}

/// A command to drive the chassis with a particular intent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DriveCmd {
    /// The motion to perform.
    pub intent: Intent,

    /// The frame the translational part of the intent is expressed in.
    pub frame: DriveFrame,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Reference frames a drive command can be expressed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DriveFrame {
    /// Relative to the chassis, forward is the way the robot is facing.
    Robot,

    /// Relative to the field, forward is the way the robot faced when the gyro was zeroed.
    Field,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Intent {
    pub fn new(x: f64, y: f64, rotation: f64) -> Self {
        Self { x, y, rotation }
    }

    /// Rotation only, no translation.
    pub fn rotation(rotation: f64) -> Self {
        Self::new(0.0, 0.0, rotation)
    }

    /// Returns true if every component is a finite number.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.rotation.is_finite()
    }
}

impl DriveCmd {
    /// A command in the robot frame.
    pub fn robot(intent: Intent) -> Self {
        Self { intent, frame: DriveFrame::Robot }
    }

    /// A command in the field frame.
    pub fn field(intent: Intent) -> Self {
        Self { intent, frame: DriveFrame::Field }
    }

    /// The all-zero command.
    pub fn stop() -> Self {
        Self::robot(Intent::default())
    }
}
