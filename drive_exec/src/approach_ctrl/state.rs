//! # Approach control state

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, error, info, warn};
use serde::Serialize;
use util::{
    archive::{ArchiveError, Archived, Archiver},
    maths::{get_ang_dist_deg, norm_ang_deg},
    module::State,
    session::{self, Session},
};

use super::{
    ApproachError, ApproachParams, ApproachStyle, Laws, SensorFrame, Stage, StageCmd, StageEvent,
    NUM_TARGETS,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Approach control module state.
///
/// Owns the routine progress. The progress only changes through [`State::proc`] (or
/// [`ApproachCtrl::step`]) and [`ApproachCtrl::reset`].
pub struct ApproachCtrl {
    params: ApproachParams,

    laws: Laws,

    stage: Stage,

    report: StatusReport,

    arch_report: Archiver,
}

/// Input data to the approach routine.
#[derive(Debug, Clone, Copy)]
pub struct InputData {
    /// Index of the target to place on, 0 (left), 1 (middle) or 2 (right).
    pub target: usize,

    /// Current sensor readings.
    pub frame: SensorFrame,
}

/// Status report for one step of the approach routine.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatusReport {
    pub stage_before: Stage,
    pub stage_after: Stage,

    /// Units: degrees
    pub target_heading_deg: f64,

    /// Shortest signed distance from the current to the target heading.
    ///
    /// Units: degrees
    pub heading_err_deg: f64,

    /// True if the vision sensor saw the target this step.
    pub vision_seen: bool,

    /// The demand issued this step.
    pub cmd: StageCmd,
}

#[derive(Serialize)]
struct ReportRecord {
    time_s: f64,
    stage_before: u8,
    stage_after: u8,
    target_heading_deg: f64,
    heading_err_deg: f64,
    vision_seen: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl State for ApproachCtrl {
    type InitData = ApproachParams;
    type InitError = std::convert::Infallible;

    type InputData = InputData;
    type OutputData = StageCmd;
    type StatusReport = StatusReport;
    type ProcError = ApproachError;

    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        self.laws = Laws::new(&init_data);
        self.params = init_data;
        self.stage = Stage::SeekHeading;

        Ok(())
    }

    /// Perform one tick of the cyclic routine.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        self.step(input_data, ApproachStyle::FixedSpeed)
    }
}

impl Archived for ApproachCtrl {
    fn arch_init(&mut self, session: &Session) -> Result<(), ArchiveError> {
        self.arch_report = Archiver::from_path(session, "approach_ctrl/status_report.csv")?;
        Ok(())
    }

    fn write(&mut self) -> Result<(), ArchiveError> {
        self.arch_report.serialise(ReportRecord {
            time_s: session::get_elapsed_seconds(),
            stage_before: self.report.stage_before.index(),
            stage_after: self.report.stage_after.index(),
            target_heading_deg: self.report.target_heading_deg,
            heading_err_deg: self.report.heading_err_deg,
            vision_seen: self.report.vision_seen,
        })
    }
}

impl ApproachCtrl {
    pub fn new(params: ApproachParams) -> Self {
        Self {
            laws: Laws::new(&params),
            params,
            stage: Stage::SeekHeading,
            report: StatusReport::default(),
            arch_report: Archiver::default(),
        }
    }

    /// Perform one step of the routine with the given approach style.
    ///
    /// An invalid target index is rejected before anything is changed.
    pub fn step(
        &mut self,
        input: &InputData,
        style: ApproachStyle,
    ) -> Result<(StageCmd, StatusReport), ApproachError> {
        let target_heading_deg = self.target_heading(input.target)?;

        let transition = self.stage.advance(
            &input.frame,
            &self.params,
            &self.laws,
            target_heading_deg,
            style,
        );

        self.report = StatusReport {
            stage_before: self.stage,
            stage_after: transition.next,
            target_heading_deg,
            heading_err_deg: get_ang_dist_deg(input.frame.heading_deg, target_heading_deg),
            vision_seen: input.frame.vision_offset.is_some(),
            cmd: transition.cmd,
        };

        debug!("Approach step: {:?}", self.report);

        if let Some(StageEvent::VisionLost) = transition.event {
            warn!("Target not visible in {}", self.stage);
        }

        if transition.next != self.stage {
            info!("Approach routine: {} -> {}", self.stage, transition.next);
        }

        self.stage = transition.next;

        Ok((transition.cmd, self.report))
    }

    /// Return the routine to its first stage.
    pub fn reset(&mut self) {
        if self.stage != Stage::SeekHeading {
            info!("Approach routine reset from {}", self.stage);
        }
        self.stage = Stage::SeekHeading;
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The routine progress number, 0 to 5.
    pub fn progress(&self) -> u8 {
        self.stage.index()
    }

    /// Heading of the target with the given index.
    pub fn target_heading(&self, target: usize) -> Result<f64, ApproachError> {
        match self.params.target_headings_deg.get(target) {
            Some(h) => Ok(*h),
            None => {
                error!("Invalid approach target index {}", target);
                Err(ApproachError::InvalidTarget(target))
            }
        }
    }

    pub fn params(&self) -> &ApproachParams {
        &self.params
    }

    pub fn laws(&self) -> &Laws {
        &self.laws
    }

    pub fn report(&self) -> StatusReport {
        self.report
    }
}

/// Index of the target heading closest to `heading_deg`.
///
/// Ties go to the lower index.
pub fn nearest_target(heading_deg: f64, targets_deg: &[f64; NUM_TARGETS]) -> usize {
    let heading_deg = norm_ang_deg(heading_deg);
    let mut best = 0;
    let mut best_dist = std::f64::INFINITY;

    for (i, t) in targets_deg.iter().enumerate() {
        let dist = get_ang_dist_deg(heading_deg, *t).abs();
        if dist < best_dist {
            best = i;
            best_dist = dist;
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(target: usize, heading_deg: f64, distance: f64, vision_offset: Option<f64>) -> InputData {
        InputData {
            target,
            frame: SensorFrame {
                heading_deg,
                distance,
                vision_offset,
            },
        }
    }

    #[test]
    fn test_heading_stage_ticks() {
        let mut ctrl = ApproachCtrl::new(ApproachParams::default());

        // 10 degrees off: rotate, stay
        let (cmd, report) = ctrl.proc(&input(0, 320.0, 50.0, None)).unwrap();
        match cmd {
            StageCmd::Drive(i) => {
                assert!(i.rotation != 0.0);
                assert_eq!((i.x, i.y), (0.0, 0.0));
            }
            c => panic!("Unexpected {:?}", c),
        }
        assert_eq!(ctrl.progress(), 0);
        assert_eq!(report.heading_err_deg, 10.0);

        // Within tolerance: stop, advance
        let (cmd, report) = ctrl.proc(&input(0, 327.0, 50.0, None)).unwrap();
        assert_eq!(cmd, StageCmd::Stop);
        assert_eq!(ctrl.progress(), 1);
        assert_eq!(report.stage_before, Stage::SeekHeading);
        assert_eq!(report.stage_after, Stage::CentreLateral);
    }

    #[test]
    fn test_end_to_end_rotation_sign() {
        let mut ctrl = ApproachCtrl::new(ApproachParams::default());

        // Heading 0, target 2 at 210 (150 anticlockwise)
        let (cmd, _) = ctrl.proc(&input(2, 0.0, 50.0, None)).unwrap();
        match cmd {
            StageCmd::Drive(i) => assert!(i.rotation >= -0.5 && i.rotation <= -0.2),
            c => panic!("Unexpected {:?}", c),
        }
    }

    #[test]
    fn test_invalid_target_changes_nothing() {
        let mut ctrl = ApproachCtrl::new(ApproachParams::default());
        ctrl.proc(&input(0, 330.0, 50.0, None)).unwrap();
        assert_eq!(ctrl.progress(), 1);

        let r = ctrl.proc(&input(5, 330.0, 50.0, Some(0.0)));
        assert!(matches!(r, Err(ApproachError::InvalidTarget(5))));
        assert_eq!(ctrl.progress(), 1);
    }

    #[test]
    fn test_full_sequence() {
        let mut ctrl = ApproachCtrl::new(ApproachParams::default());
        let t = 1;

        ctrl.proc(&input(t, 270.0, 50.0, None)).unwrap();
        assert_eq!(ctrl.stage(), Stage::CentreLateral);

        // Vision lost holds the stage
        let (cmd, report) = ctrl.proc(&input(t, 270.0, 50.0, None)).unwrap();
        assert_eq!(cmd, StageCmd::Stop);
        assert!(!report.vision_seen);
        assert_eq!(ctrl.stage(), Stage::CentreLateral);

        ctrl.proc(&input(t, 270.0, 50.0, Some(0.2))).unwrap();
        assert_eq!(ctrl.stage(), Stage::Approach);

        ctrl.proc(&input(t, 270.0, 30.0, None)).unwrap();
        assert_eq!(ctrl.stage(), Stage::Approach);
        ctrl.proc(&input(t, 270.0, 7.0, None)).unwrap();
        assert_eq!(ctrl.stage(), Stage::Retreat);

        ctrl.proc(&input(t, 270.0, 21.0, None)).unwrap();
        assert_eq!(ctrl.stage(), Stage::Release);

        let (cmd, _) = ctrl.proc(&input(t, 270.0, 21.0, None)).unwrap();
        assert_eq!(cmd, StageCmd::Release);
        assert_eq!(ctrl.progress(), 5);

        let (cmd, _) = ctrl.proc(&input(t, 270.0, 21.0, None)).unwrap();
        assert_eq!(cmd, StageCmd::Idle);
        assert_eq!(ctrl.progress(), 5);

        ctrl.reset();
        assert_eq!(ctrl.progress(), 0);
    }

    #[test]
    fn test_nearest_target() {
        let targets = ApproachParams::default().target_headings_deg;

        assert_eq!(nearest_target(0.0, &targets), 0);
        assert_eq!(nearest_target(-30.0, &targets), 0);
        assert_eq!(nearest_target(275.0, &targets), 1);
        assert_eq!(nearest_target(100.0, &targets), 2);
        assert_eq!(nearest_target(180.0 + 720.0, &targets), 2);
    }
}
