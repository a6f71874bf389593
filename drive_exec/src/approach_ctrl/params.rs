//! # Approach control parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use super::NUM_TARGETS;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of a single scaled control law.
///
/// Errors with a magnitude below `deadzone` give no output. Otherwise the
/// magnitude of the error is mapped linearly from `[min_error, max_error]`
/// onto `[min_speed, max_speed]`, saturating at both ends.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct ScaledLawParams {
    pub deadzone: f64,
    pub min_error: f64,
    pub max_error: f64,
    pub min_speed: f64,
    pub max_speed: f64,
}

/// Parameters for the approach routine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApproachParams {
    /// Absolute headings of the targets, left, middle, right.
    ///
    /// Units: degrees
    pub target_headings_deg: [f64; NUM_TARGETS],

    /// Heading law. Its deadzone is also the tolerance of the `SeekHeading` stage.
    ///
    /// Error units: degrees
    pub rotation: ScaledLawParams,

    /// Approach axis law, used by the blocking routine.
    ///
    /// Error units: distance sensor units
    pub approach: ScaledLawParams,

    /// Lateral law. Its deadzone is also the tolerance of the `CentreLateral` stage.
    ///
    /// Error units: vision offset units
    pub lateral: ScaledLawParams,

    /// The vision offset at which the placement mechanism is centred on the target.
    pub vision_target_offset: f64,

    /// Distance at which the approach stops and the payload is placed.
    pub placing_dist: f64,

    /// Distance the robot retreats to after placing.
    pub retreat_clear_dist: f64,

    /// Fixed forward speed used while approaching in the cyclic routine.
    pub approach_speed: f64,

    /// Fixed forward speed used while retreating, negative to back away.
    pub retreat_speed: f64,

    /// Lateral demand substituted while approaching if the vision sensor loses the target.
    ///
    /// This counters a drift seen on the robot, it needs validating against any new chassis.
    pub drift_compensation: f64,

    /// Time to wait after opening the gate before retreating, in the blocking routine.
    ///
    /// Units: seconds
    pub release_dwell_s: f64,

    /// Sleep between iterations of the blocking routine, zero to busy-poll.
    ///
    /// Units: seconds
    pub blocking_poll_period_s: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for ApproachParams {
    fn default() -> Self {
        Self {
            target_headings_deg: [330.0, 270.0, 210.0],
            rotation: ScaledLawParams {
                deadzone: 5.0,
                min_error: 5.0,
                max_error: 180.0,
                min_speed: 0.2,
                max_speed: 0.5,
            },
            approach: ScaledLawParams {
                deadzone: 0.0,
                min_error: 0.0,
                max_error: 40.0,
                min_speed: 0.3,
                max_speed: 0.5,
            },
            lateral: ScaledLawParams {
                deadzone: 1.0,
                min_error: 0.0,
                max_error: 36.0,
                min_speed: 0.1,
                max_speed: 0.25,
            },
            vision_target_offset: 0.0,
            placing_dist: 8.0,
            retreat_clear_dist: 20.0,
            approach_speed: 0.5,
            retreat_speed: -0.5,
            drift_compensation: -0.017,
            release_dwell_s: 0.5,
            blocking_poll_period_s: 0.0,
        }
    }
}
