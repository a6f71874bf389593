//! # Approach stages
//!
//! The stage transition function. Each call attempts exactly one step of the routine: either the
//! stage's convergence condition is not yet met and a drive demand is issued while staying in the
//! stage, or it is met and the robot is stopped while moving on to the next stage.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;
use std::fmt::Display;
use util::maths::get_ang_dist_deg;

use super::{ApproachParams, Laws};
use crate::loco_ctrl::Intent;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A snapshot of the sensors for one step.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SensorFrame {
    /// Chassis heading, normalised into [0, 360).
    ///
    /// Units: degrees
    pub heading_deg: f64,

    /// Range along the approach axis.
    pub distance: f64,

    /// Horizontal offset of the target, `None` if the target is not in view.
    pub vision_offset: Option<f64>,
}

/// The result of one step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transition {
    /// Demand to apply this step.
    pub cmd: StageCmd,

    /// Stage for the next step.
    pub next: Stage,

    /// Anything worth reporting which happened this step.
    pub event: Option<StageEvent>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Stages of the approach routine, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Stage {
    SeekHeading,
    CentreLateral,
    Approach,
    Retreat,
    Release,
    Done,
}

/// How the `Approach` stage sets its forward demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ApproachStyle {
    /// Drive at the fixed approach speed.
    FixedSpeed,

    /// Scale the speed with the remaining distance using the approach law.
    Scaled,
}

/// Demands that a stage can issue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum StageCmd {
    /// Drive the chassis in the robot frame.
    Drive(Intent),

    /// Stop all wheels.
    Stop,

    /// Stop all wheels and release the payload.
    Release,

    /// Do nothing.
    Idle,
}

/// Notable events during a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StageEvent {
    /// The vision sensor could not see the target.
    VisionLost,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Stage {
    /// The progress number of this stage, 0 to 5.
    pub fn index(self) -> u8 {
        match self {
            Stage::SeekHeading => 0,
            Stage::CentreLateral => 1,
            Stage::Approach => 2,
            Stage::Retreat => 3,
            Stage::Release => 4,
            Stage::Done => 5,
        }
    }

    /// The stage with the given progress number, anything past the last stage is `Done`.
    pub fn from_index(index: u8) -> Self {
        match index {
            0 => Stage::SeekHeading,
            1 => Stage::CentreLateral,
            2 => Stage::Approach,
            3 => Stage::Retreat,
            4 => Stage::Release,
            _ => Stage::Done,
        }
    }

    /// The stage which follows this one.
    pub fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    pub fn is_done(self) -> bool {
        self == Stage::Done
    }

    /// Perform one step of this stage.
    pub fn advance(
        self,
        frame: &SensorFrame,
        params: &ApproachParams,
        laws: &Laws,
        target_heading_deg: f64,
        style: ApproachStyle,
    ) -> Transition {
        let heading_err_deg = get_ang_dist_deg(frame.heading_deg, target_heading_deg);
        let rotation = laws.rotation.get(heading_err_deg);

        match self {
            Stage::SeekHeading => {
                if heading_err_deg.abs() > laws.rotation.deadzone() {
                    return self.stay(StageCmd::Drive(Intent::rotation(rotation)))
                }
            }
            Stage::CentreLateral => {
                let offset = match frame.vision_offset {
                    Some(o) => o,
                    None => {
                        return Transition {
                            cmd: StageCmd::Stop,
                            next: self,
                            event: Some(StageEvent::VisionLost),
                        }
                    }
                };

                if (offset - params.vision_target_offset).abs() >= laws.lateral.deadzone() {
                    let x = laws.lateral(offset, params.vision_target_offset);
                    return self.stay(StageCmd::Drive(Intent::new(x, 0.0, rotation)))
                }
            }
            Stage::Approach => {
                if frame.distance >= params.placing_dist {
                    let (x, event) = match frame.vision_offset {
                        Some(o) => (laws.lateral(o, params.vision_target_offset), None),
                        None => (params.drift_compensation, Some(StageEvent::VisionLost)),
                    };
                    let y = match style {
                        ApproachStyle::FixedSpeed => params.approach_speed,
                        ApproachStyle::Scaled => laws.approach(frame.distance, params.placing_dist),
                    };

                    return Transition {
                        cmd: StageCmd::Drive(Intent::new(x, y, rotation)),
                        next: self,
                        event,
                    }
                }
            }
            Stage::Retreat => {
                if frame.distance <= params.retreat_clear_dist {
                    return self.stay(StageCmd::Drive(Intent::new(0.0, params.retreat_speed, rotation)))
                }
            }
            Stage::Release => {
                return Transition {
                    cmd: StageCmd::Release,
                    next: self.next(),
                    event: None,
                }
            }
            Stage::Done => return self.stay(StageCmd::Idle),
        }

        // Converged, stop and move on
        Transition {
            cmd: StageCmd::Stop,
            next: self.next(),
            event: None,
        }
    }

    fn stay(self, cmd: StageCmd) -> Transition {
        Transition {
            cmd,
            next: self,
            event: None,
        }
    }
}

impl Default for Stage {
    fn default() -> Self {
        Stage::SeekHeading
    }
}

impl Default for StageCmd {
    fn default() -> Self {
        StageCmd::Idle
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::SeekHeading => write!(f, "Stage::SeekHeading"),
            Stage::CentreLateral => write!(f, "Stage::CentreLateral"),
            Stage::Approach => write!(f, "Stage::Approach"),
            Stage::Retreat => write!(f, "Stage::Retreat"),
            Stage::Release => write!(f, "Stage::Release"),
            Stage::Done => write!(f, "Stage::Done"),
        }
    }
}
