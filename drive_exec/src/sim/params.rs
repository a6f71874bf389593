//! Simulation parameters

use serde::Deserialize;

/// Parameters of the simulated chassis and its surroundings.
///
/// Positions are in the field frame, x to the right and y forward of the start orientation.
/// Headings are clockwise from the y axis.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimParams {
    /// Time the world advances each time a full wheel set is written.
    ///
    /// Units: seconds
    pub step_s: f64,

    /// Chassis speed when a translational intent component is 1.
    ///
    /// Units: distance units per second
    pub max_speed: f64,

    /// Turn rate when the rotation intent is 1.
    ///
    /// Units: degrees per second
    pub max_turn_rate_deg_s: f64,

    /// Encoder counts per unit of wheel travel.
    pub enc_per_dist: f64,

    /// Full horizontal field of view of the vision sensor.
    ///
    /// Units: degrees
    pub vision_fov_deg: f64,

    /// Vision offset units per unit of lateral distance.
    pub vision_scale: f64,

    /// Reading of the distance sensor when nothing is in front of it.
    pub max_range: f64,

    pub start_x: f64,
    pub start_y: f64,
    pub start_heading_deg: f64,

    pub peg_x: f64,
    pub peg_y: f64,

    /// The payload counts as placed if the gate opens within this distance of the peg.
    pub place_tolerance: f64,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            step_s: 0.02,
            max_speed: 40.0,
            max_turn_rate_deg_s: 180.0,
            enc_per_dist: 77.066,
            vision_fov_deg: 75.0,
            vision_scale: 1.0,
            max_range: 255.0,
            start_x: 0.0,
            start_y: 0.0,
            start_heading_deg: 0.0,
            // 36 units out along 330 degrees and 3 units to the right of that line
            peg_x: -15.4,
            peg_y: 32.7,
            place_tolerance: 10.0,
        }
    }
}
