//! Parameters structure for LocoCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Locomotion control.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LocoCtrlParams {
    /// Rotation demands with a magnitude at or below this value are zeroed,
    /// suppressing unintended joystick twist.
    pub twist_threshold: f64,
}

impl Default for LocoCtrlParams {
    fn default() -> Self {
        Self {
            twist_threshold: 0.15,
        }
    }
}
