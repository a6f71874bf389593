//! Implementations for the LocoCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;

// Internal
use super::{
    LocoCtrlParams, LocoCtrlError,
    DriveCmd, DriveFrame,
    calc_field_oriented::{compensate_heading, suppress_twist},
    calc_mecanum::{normalise, raw_dems}};
use crate::eqpt::NUM_WHEELS;
use util::{
    module::State,
    archive::{Archived, Archiver, ArchiveError},
    session::{self, Session}};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Locomotion control module state
#[derive(Default)]
pub struct LocoCtrl {

    pub(crate) params: LocoCtrlParams,

    pub(crate) report: StatusReport,

    pub(crate) current_cmd: Option<DriveCmd>,

    pub(crate) output: Option<WheelDems>,
    arch_output: Archiver
}

/// Input data to Locomotion Control.
#[derive(Default, Debug, Clone, Copy)]
pub struct InputData {
    /// The drive command to be executed, or `None` to stop the wheels.
    pub cmd: Option<DriveCmd>,

    /// The current raw heading in degrees. Only required for field-oriented
    /// commands.
    pub heading_deg: Option<f64>
}

/// Wheel demands that the drive train must send to the actuators.
///
/// Units: normalised, between -1 and +1.
#[derive(Clone, Copy, Default, Serialize, Debug, PartialEq)]
pub struct WheelDems {
    pub front_left: f64,
    pub front_right: f64,
    pub back_left: f64,
    pub back_right: f64,
}

/// Status report for LocoCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// True if the rotation demand was under the twist threshold and zeroed.
    pub twist_suppressed: bool,

    /// True if the mixed demands had to be scaled down.
    pub saturated: bool,

    /// Largest wheel demand magnitude before scaling.
    pub max_raw_dem: f64,
}

/// Row of the LocoCtrl output archive.
#[derive(Serialize)]
struct OutputRecord {
    time_s: f64,
    front_left: f64,
    front_right: f64,
    back_left: f64,
    back_right: f64,
    saturated: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for LocoCtrl {
    type InitData = LocoCtrlParams;
    type InitError = std::convert::Infallible;
    
    type InputData = InputData;
    type OutputData = WheelDems;
    type StatusReport = StatusReport;
    type ProcError = LocoCtrlError;

    /// Initialise the LocoCtrl module with its parameters.
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        self.params = init_data;
        self.current_cmd = None;
        self.output = None;

        Ok(())
    }

    /// Perform cyclic processing of Locomotion Control.
    ///
    /// On error no output is produced and the previous output is kept, the
    /// caller shall not drive the wheels.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> 
    {
        // Clear the status report
        self.report = StatusReport::default();

        let cmd = input_data.cmd.unwrap_or_else(DriveCmd::stop);

        if !cmd.intent.is_finite() {
            return Err(LocoCtrlError::NonFiniteCmd(cmd))
        }

        // Drop any unintended twist
        let mut intent = suppress_twist(&cmd.intent, self.params.twist_threshold);
        self.report.twist_suppressed = intent.rotation != cmd.intent.rotation;

        // Rotate into the robot frame if needed
        if cmd.frame == DriveFrame::Field {
            let heading_deg = input_data.heading_deg.ok_or(LocoCtrlError::NoHeading)?;
            if !heading_deg.is_finite() {
                return Err(LocoCtrlError::NonFiniteHeading(heading_deg))
            }
            intent = compensate_heading(&intent, heading_deg);
        }

        let mut dems = raw_dems(&intent);
        self.report.max_raw_dem = normalise(&mut dems);
        self.report.saturated = self.report.max_raw_dem > 1.0;

        let output = WheelDems::from_array(dems);

        trace!("LocoCtrl output: {:?}", output);

        self.current_cmd = Some(cmd);
        self.output = Some(output);

        Ok((output, self.report))
    }
}

impl Archived for LocoCtrl {
    fn arch_init(&mut self, session: &Session) -> Result<(), ArchiveError> {
        self.arch_output = Archiver::from_path(session, "loco_ctrl/output.csv")?;
        Ok(())
    }

    fn write(&mut self) -> Result<(), ArchiveError> {
        let o = self.output.unwrap_or_default();
        self.arch_output.serialise(OutputRecord {
            time_s: session::get_elapsed_seconds(),
            front_left: o.front_left,
            front_right: o.front_right,
            back_left: o.back_left,
            back_right: o.back_right,
            saturated: self.report.saturated,
        })
    }
}

impl LocoCtrl {
    /// Create a new LocoCtrl with the given parameters.
    pub fn new(params: LocoCtrlParams) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    /// The most recent output, if any command has been processed.
    pub fn output(&self) -> Option<WheelDems> {
        self.output
    }

    /// The most recent successfully processed command.
    pub fn current_cmd(&self) -> Option<DriveCmd> {
        self.current_cmd
    }
}

impl WheelDems {
    /// Build from an array in [`crate::eqpt::WHEEL_IDS`] order.
    pub fn from_array(dems: [f64; NUM_WHEELS]) -> Self {
        Self {
            front_left: dems[0],
            front_right: dems[1],
            back_left: dems[2],
            back_right: dems[3],
        }
    }

    /// Convert to an array in [`crate::eqpt::WHEEL_IDS`] order.
    pub fn as_array(&self) -> [f64; NUM_WHEELS] {
        [self.front_left, self.front_right, self.back_left, self.back_right]
    }
}
