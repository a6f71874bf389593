//! # Drive train facade

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, error, info, warn};
use std::{thread, time::Duration};
use util::{
    archive::{ArchiveError, Archived},
    maths::{norm_ang_deg, signum},
    module::State,
    session::Session,
};

use super::{DriveTrainError, DriveTrainParams};
use crate::{
    approach_ctrl::{
        self, nearest_target, ApproachCtrl, ApproachError, ApproachParams, ApproachStyle,
        SensorFrame, Stage, StageCmd, StageEvent,
    },
    eqpt::{
        Actuator, ApproachEqpt, DistanceSensor, HeadingSensor, PlacementActuator, VisionSensor,
        NUM_WHEELS, WHEEL_IDS,
    },
    loco_ctrl::{self, DriveCmd, Intent, LocoCtrl, LocoCtrlParams, WheelDems},
    watchdog::Watchdog,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The mecanum drive train.
///
/// Wheel handles are held in [`WHEEL_IDS`] order.
pub struct DriveTrain<A, H> {
    wheels: [A; NUM_WHEELS],
    heading: H,

    params: DriveTrainParams,

    loco_ctrl: LocoCtrl,
    approach: ApproachCtrl,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<A, H> DriveTrain<A, H>
where
    A: Actuator,
    H: HeadingSensor,
{
    pub fn new(
        wheels: [A; NUM_WHEELS],
        heading: H,
        params: DriveTrainParams,
        loco_ctrl_params: LocoCtrlParams,
        approach_params: ApproachParams,
    ) -> Self {
        Self {
            wheels,
            heading,
            params,
            loco_ctrl: LocoCtrl::new(loco_ctrl_params),
            approach: ApproachCtrl::new(approach_params),
        }
    }

    // ---- DRIVING ----

    /// Field-oriented teleop drive from joystick axes.
    pub fn mecanum_drive(&mut self, x: f64, y: f64, rotation: f64) -> Result<WheelDems, DriveTrainError> {
        let intent = self.joystick_intent(x, y, rotation);
        self.drive(DriveCmd::field(intent))
    }

    /// Robot-relative teleop drive from joystick axes.
    pub fn mecanum_drive_absolute(
        &mut self,
        x: f64,
        y: f64,
        rotation: f64,
    ) -> Result<WheelDems, DriveTrainError> {
        let intent = self.joystick_intent(x, y, rotation);
        self.drive(DriveCmd::robot(intent))
    }

    /// Execute a drive command and send the demands to the wheels.
    ///
    /// The gyro is only read for field-oriented commands. If the command is rejected the wheels
    /// are not driven.
    pub fn drive(&mut self, cmd: DriveCmd) -> Result<WheelDems, DriveTrainError> {
        let heading_deg = match cmd.frame {
            loco_ctrl::DriveFrame::Field => Some(self.heading.heading_deg()),
            loco_ctrl::DriveFrame::Robot => None,
        };

        let (dems, _) = self
            .loco_ctrl
            .proc(&loco_ctrl::InputData {
                cmd: Some(cmd),
                heading_deg,
            })
            .map_err(|e| {
                error!("Drive command rejected: {}", e);
                e
            })?;

        self.set_wheels(dems.as_array());

        Ok(dems)
    }

    /// Drive straight forward or backward until the front left encoder has travelled `dist`.
    ///
    /// The sign of `dist` gives the direction, `speed` is taken as a magnitude. All wheels are
    /// stopped on return, including when the watchdog expires.
    pub fn move_distance(
        &mut self,
        dist: f64,
        speed: f64,
        watchdog: &Watchdog,
    ) -> Result<(), DriveTrainError> {
        self.zero_encoders();

        let threshold = self.dist_to_enc(dist.abs());
        let intent = Intent::new(0.0, speed.abs() * signum(dist), 0.0);

        debug!("Moving {} units ({} counts) at {}", dist, threshold, intent.y);

        while self.wheels[0].position().abs() < threshold {
            if let Err(e) = watchdog.check() {
                self.brake();
                warn!("Distance drive stopped: {}", e);
                return Err(e.into())
            }

            if let Err(e) = self.drive(DriveCmd::robot(intent)) {
                self.brake();
                return Err(e)
            }

            sleep_s(self.params.move_poll_period_s);
        }

        self.brake();

        Ok(())
    }

    /// Set each wheel directly, bypassing the mixer.
    pub fn test_motors(&mut self, fl: f64, fr: f64, bl: f64, br: f64) {
        self.set_wheels([fl, fr, bl, br]);
    }

    /// Stop all wheels.
    pub fn brake(&mut self) {
        self.set_wheels([0.0; NUM_WHEELS]);
    }

    // ---- APPROACH ROUTINE ----

    /// Perform one tick of the approach routine on the given target.
    ///
    /// An invalid target index is rejected before any equipment is touched.
    pub fn place_target<D, V, P>(
        &mut self,
        target: usize,
        eqpt: &mut ApproachEqpt<D, V, P>,
    ) -> Result<approach_ctrl::StatusReport, DriveTrainError>
    where
        D: DistanceSensor,
        V: VisionSensor,
        P: PlacementActuator,
    {
        self.approach.target_heading(target)?;

        let frame = self.read_frame(eqpt);
        let (cmd, report) = self.approach.proc(&approach_ctrl::InputData { target, frame })?;

        match cmd {
            StageCmd::Drive(intent) => {
                self.drive(DriveCmd::robot(intent))?;
            }
            StageCmd::Stop => self.brake(),
            StageCmd::Release => {
                self.brake();
                eqpt.placement.open();
                eqpt.placement.push();
                info!("Payload released");
            }
            StageCmd::Idle => (),
        }

        Ok(report)
    }

    /// Perform one tick of the approach routine on the target nearest the current heading.
    pub fn place_target_nearest<D, V, P>(
        &mut self,
        eqpt: &mut ApproachEqpt<D, V, P>,
    ) -> Result<approach_ctrl::StatusReport, DriveTrainError>
    where
        D: DistanceSensor,
        V: VisionSensor,
        P: PlacementActuator,
    {
        let target = nearest_target(
            self.heading_deg(),
            &self.approach.params().target_headings_deg,
        );
        self.place_target(target, eqpt)
    }

    /// Run the whole approach routine on the given target, returning once the payload is placed.
    ///
    /// The routine steps its own stage, the progress of the cyclic routine is not touched. If the
    /// target is not visible once the heading has been reached the routine is abandoned without
    /// placing. On any error the wheels are stopped and the gate is closed.
    pub fn place_target_blocking<D, V, P>(
        &mut self,
        target: usize,
        eqpt: &mut ApproachEqpt<D, V, P>,
        watchdog: &Watchdog,
    ) -> Result<(), DriveTrainError>
    where
        D: DistanceSensor,
        V: VisionSensor,
        P: PlacementActuator,
    {
        let target_heading_deg = self.approach.target_heading(target)?;

        info!("Blocking approach on target {} started", target);

        let result = self.run_blocking(target_heading_deg, eqpt, watchdog);

        match result {
            Ok(()) => info!("Blocking approach on target {} finished", target),
            Err(_) => {
                self.brake();
                eqpt.placement.close();
            }
        }

        result
    }

    fn run_blocking<D, V, P>(
        &mut self,
        target_heading_deg: f64,
        eqpt: &mut ApproachEqpt<D, V, P>,
        watchdog: &Watchdog,
    ) -> Result<(), DriveTrainError>
    where
        D: DistanceSensor,
        V: VisionSensor,
        P: PlacementActuator,
    {
        let params = self.approach.params().clone();
        let laws = *self.approach.laws();
        let mut stage = Stage::SeekHeading;
        let mut vision_checked = false;

        loop {
            if let Err(e) = watchdog.check() {
                warn!("Blocking approach stopped in {}: {}", stage, e);
                return Err(e.into())
            }

            let frame = self.read_frame(eqpt);

            if stage == Stage::CentreLateral && !vision_checked {
                vision_checked = true;
                if frame.vision_offset.is_none() {
                    error!("Vision does not see the target, blocking approach abandoned");
                    return Err(ApproachError::VisionUnavailable.into())
                }
            }

            let transition = stage.advance(
                &frame,
                &params,
                &laws,
                target_heading_deg,
                ApproachStyle::Scaled,
            );

            if let Some(StageEvent::VisionLost) = transition.event {
                warn!("Target not visible in {}", stage);
            }

            match transition.cmd {
                StageCmd::Drive(intent) => {
                    self.drive(DriveCmd::robot(intent))?;
                }
                _ => self.brake(),
            }

            if transition.next != stage {
                info!("Blocking approach: {} -> {}", stage, transition.next);
            }

            match (stage, transition.next) {
                (Stage::Approach, Stage::Retreat) => {
                    eqpt.placement.open();
                    sleep_s(params.release_dwell_s);
                }
                (Stage::Retreat, Stage::Release) => {
                    eqpt.placement.close();
                    return Ok(())
                }
                _ => (),
            }

            stage = transition.next;

            sleep_s(params.blocking_poll_period_s);
        }
    }

    /// Retract and close the placement mechanism and return the routine to its first stage.
    pub fn reset_routine<P: PlacementActuator>(&mut self, placement: &mut P) {
        placement.retract();
        placement.close();
        self.approach.reset();
    }

    /// The routine progress number, 0 to 5.
    pub fn progress(&self) -> u8 {
        self.approach.progress()
    }

    // ---- SENSORS ----

    /// Zero the gyro at the current orientation.
    pub fn reset_heading(&mut self) {
        self.heading.reset();
    }

    /// Zero all four wheel position counters.
    pub fn zero_encoders(&mut self) {
        for w in self.wheels.iter_mut() {
            w.set_position(0.0);
        }
    }

    /// Position counters in [`WHEEL_IDS`] order.
    pub fn encoder_positions(&mut self) -> [f64; NUM_WHEELS] {
        let mut pos = [0.0; NUM_WHEELS];
        for (p, w) in pos.iter_mut().zip(self.wheels.iter_mut()) {
            *p = w.position();
        }
        pos
    }

    pub fn debug_encoders(&mut self) {
        let pos = self.encoder_positions();
        for (id, p) in WHEEL_IDS.iter().zip(pos.iter()) {
            info!("{:?} encoder: {}", id, p);
        }
    }

    /// Heading normalised into [0, 360).
    pub fn heading_deg(&mut self) -> f64 {
        norm_ang_deg(self.heading.heading_deg())
    }

    /// Heading as reported by the gyro.
    pub fn raw_heading_deg(&mut self) -> f64 {
        self.heading.heading_deg()
    }

    pub fn debug_heading(&mut self) {
        let h = self.heading_deg();
        info!("Heading: {:.2} deg", h);
    }

    pub fn dist_to_enc(&self, dist: f64) -> f64 {
        dist * self.params.dist_to_enc
    }

    pub fn enc_to_dist(&self, enc: f64) -> f64 {
        enc / self.params.dist_to_enc
    }

    // ---- MODULES ----

    pub fn loco_ctrl(&self) -> &LocoCtrl {
        &self.loco_ctrl
    }

    pub fn approach(&self) -> &ApproachCtrl {
        &self.approach
    }

    // ---- INTERNAL ----

    fn joystick_intent(&self, x: f64, y: f64, rotation: f64) -> Intent {
        match self.params.invert_joystick_y {
            true => Intent::new(x, -y, rotation),
            false => Intent::new(x, y, rotation),
        }
    }

    /// Write to the wheels, back right last.
    fn set_wheels(&mut self, dems: [f64; NUM_WHEELS]) {
        for (w, d) in self.wheels.iter_mut().zip(dems.iter()) {
            w.set_command(*d);
        }
    }

    fn read_frame<D, V, P>(&mut self, eqpt: &mut ApproachEqpt<D, V, P>) -> SensorFrame
    where
        D: DistanceSensor,
        V: VisionSensor,
        P: PlacementActuator,
    {
        let frame = SensorFrame {
            heading_deg: self.heading_deg(),
            distance: eqpt.distance.distance(),
            vision_offset: eqpt.vision_offset(),
        };
        debug!("Sensor frame: {:?}", frame);
        frame
    }
}

impl<A, H> Archived for DriveTrain<A, H> {
    fn arch_init(&mut self, session: &Session) -> Result<(), ArchiveError> {
        self.loco_ctrl.arch_init(session)?;
        self.approach.arch_init(session)
    }

    fn write(&mut self) -> Result<(), ArchiveError> {
        self.loco_ctrl.write()?;
        self.approach.write()
    }
}

/// Longest poll or dwell period accepted by [`sleep_s`].
const MAX_SLEEP_S: f64 = 60.0;

/// Sleep for `period_s` seconds. Zero or negative periods return at once, periods which are not
/// finite or longer than [`MAX_SLEEP_S`] are ignored with a warning.
fn sleep_s(period_s: f64) {
    if period_s.is_nan() || period_s <= 0.0 {
        return
    }

    if !period_s.is_finite() || period_s > MAX_SLEEP_S {
        warn!("Sleep period of {} s is out of range, not sleeping", period_s);
        return
    }

    thread::sleep(Duration::from_secs_f64(period_s));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        drive_train::fakes::{Call, FakeGyro, FakeWheel, Rig},
        watchdog::{CancelFlag, WatchdogError},
    };

    fn drive_train(wheels: [FakeWheel; 4], gyro: FakeGyro) -> DriveTrain<FakeWheel, FakeGyro> {
        DriveTrain::new(
            wheels,
            gyro,
            DriveTrainParams::default(),
            LocoCtrlParams::default(),
            ApproachParams::default(),
        )
    }

    fn commands(rig: &Rig) -> Vec<f64> {
        rig.calls()
            .iter()
            .filter_map(|c| match c {
                Call::Command(_, v) => Some(*v),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_teleop_inverts_joystick() {
        let (rig, wheels, gyro, _) = Rig::build();
        let mut dt = drive_train(wheels, gyro);

        // Stick pushed forward reads negative
        let dems = dt.mecanum_drive_absolute(0.0, -0.5, 0.0).unwrap();
        assert_eq!(dems.as_array(), [0.5; 4]);
        assert_eq!(rig.last_commands(), [Some(0.5); 4]);

        assert_eq!(
            dt.loco_ctrl().current_cmd(),
            Some(DriveCmd::robot(Intent::new(0.0, 0.5, 0.0)))
        );

        // Twist below the threshold is dropped
        dt.mecanum_drive_absolute(0.0, 0.0, 0.1).unwrap();
        assert_eq!(rig.last_commands(), [Some(0.0); 4]);
    }

    #[test]
    fn test_field_oriented_uses_heading() {
        let (rig, wheels, gyro, _) = Rig::build();
        let mut dt = drive_train(wheels, gyro);

        rig.heading.set(90.0);
        let dems = dt.mecanum_drive(0.0, -0.5, 0.0).unwrap();
        let expected = [-0.5, 0.5, 0.5, -0.5];
        for (a, b) in dems.as_array().iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_non_finite_not_driven() {
        let (rig, wheels, gyro, _) = Rig::build();
        let mut dt = drive_train(wheels, gyro);

        let r = dt.mecanum_drive_absolute(std::f64::NAN, 0.0, 0.0);
        assert!(matches!(r, Err(DriveTrainError::LocoCtrl(_))));
        assert!(commands(&rig).is_empty());
    }

    #[test]
    fn test_invalid_target_touches_nothing() {
        let (rig, wheels, gyro, mut eqpt) = Rig::build();
        let mut dt = drive_train(wheels, gyro);

        let r = dt.place_target(5, &mut eqpt);
        assert!(matches!(
            r,
            Err(DriveTrainError::Approach(ApproachError::InvalidTarget(5)))
        ));
        assert!(rig.calls().is_empty());
        assert_eq!(dt.progress(), 0);

        let r = dt.place_target_blocking(3, &mut eqpt, &Watchdog::unlimited());
        assert!(r.is_err());
        assert!(rig.calls().is_empty());
    }

    #[test]
    fn test_place_target_first_tick() {
        let (rig, wheels, gyro, mut eqpt) = Rig::build();
        let mut dt = drive_train(wheels, gyro);

        // Heading 0, target 2 at 210 is 150 degrees anticlockwise
        rig.heading.set(0.0);
        let report = dt.place_target(2, &mut eqpt).unwrap();
        match report.cmd {
            StageCmd::Drive(i) => assert!(i.rotation >= -0.5 && i.rotation <= -0.2),
            c => panic!("Unexpected {:?}", c),
        }
        assert_eq!(dt.progress(), 0);

        // Left wheels back, right wheels forward
        let cmds = rig.last_commands();
        assert!(cmds[0].unwrap() < 0.0 && cmds[1].unwrap() > 0.0);
    }

    #[test]
    fn test_place_target_nearest() {
        let (rig, wheels, gyro, mut eqpt) = Rig::build();
        let mut dt = drive_train(wheels, gyro);

        rig.heading.set(-88.0);
        let report = dt.place_target_nearest(&mut eqpt).unwrap();
        assert_eq!(report.target_heading_deg, 270.0);
        assert_eq!(report.cmd, StageCmd::Stop);
        assert_eq!(dt.progress(), 1);
    }

    #[test]
    fn test_release_and_reset() {
        let (rig, wheels, gyro, mut eqpt) = Rig::build();
        let mut dt = drive_train(wheels, gyro);

        rig.heading.set(330.0);
        rig.vision.set(Some(0.0));
        rig.distance.set(5.0);

        // Heading, centre, approach, then the retreat needs to be clear
        dt.place_target(0, &mut eqpt).unwrap();
        dt.place_target(0, &mut eqpt).unwrap();
        dt.place_target(0, &mut eqpt).unwrap();
        assert_eq!(dt.progress(), 3);
        rig.distance.set(25.0);
        dt.place_target(0, &mut eqpt).unwrap();
        assert_eq!(dt.progress(), 4);

        rig.clear();
        dt.place_target(0, &mut eqpt).unwrap();
        assert_eq!(dt.progress(), 5);
        let calls = rig.calls();
        assert!(calls.contains(&Call::Open));
        assert!(calls.contains(&Call::Push));
        assert_eq!(rig.last_commands(), [Some(0.0); 4]);

        rig.clear();
        dt.reset_routine(&mut eqpt.placement);
        assert_eq!(rig.calls(), vec![Call::Retract, Call::Close]);
        assert_eq!(dt.progress(), 0);
    }

    #[test]
    fn test_blocking_without_vision_aborts() {
        let (rig, wheels, gyro, mut eqpt) = Rig::build();
        let mut dt = drive_train(wheels, gyro);

        rig.heading.set(270.0);
        rig.vision.set(None);

        let r = dt.place_target_blocking(1, &mut eqpt, &Watchdog::unlimited());
        assert!(matches!(
            r,
            Err(DriveTrainError::Approach(ApproachError::VisionUnavailable))
        ));
        assert!(!rig.calls().contains(&Call::Open));
        assert_eq!(rig.last_commands(), [Some(0.0); 4]);
        assert_eq!(dt.progress(), 0);
    }

    #[test]
    fn test_blocking_leaves_tick_progress() {
        let (rig, wheels, gyro, mut eqpt) = Rig::build();
        let mut dt = drive_train(wheels, gyro);

        rig.heading.set(330.0);
        rig.vision.set(Some(0.0));
        rig.distance.set(5.0);

        for _ in 0..3 {
            dt.place_target(0, &mut eqpt).unwrap();
        }
        assert_eq!(dt.progress(), 3);
        assert_eq!(dt.approach().report().stage_after, Stage::Retreat);

        // Aborted blocking run
        rig.vision.set(None);
        let r = dt.place_target_blocking(0, &mut eqpt, &Watchdog::unlimited());
        assert!(matches!(
            r,
            Err(DriveTrainError::Approach(ApproachError::VisionUnavailable))
        ));
        assert_eq!(dt.progress(), 3);
        assert_eq!(dt.approach().report().stage_after, Stage::Retreat);

        // The cyclic routine carries on from where it was
        rig.distance.set(25.0);
        dt.place_target(0, &mut eqpt).unwrap();
        assert_eq!(dt.progress(), 4);
    }

    #[test]
    fn test_blocking_timeout_closes_gate() {
        let (rig, wheels, gyro, mut eqpt) = Rig::build();
        let mut dt = DriveTrain::new(
            wheels,
            gyro,
            DriveTrainParams::default(),
            LocoCtrlParams::default(),
            ApproachParams {
                release_dwell_s: 0.0,
                ..ApproachParams::default()
            },
        );

        // Gate opens on reaching the target, then the retreat never clears
        rig.heading.set(330.0);
        rig.vision.set(Some(0.0));
        rig.distance.set(5.0);

        let r = dt.place_target_blocking(
            0,
            &mut eqpt,
            &Watchdog::with_timeout(Duration::from_millis(20)),
        );
        assert!(matches!(
            r,
            Err(DriveTrainError::Watchdog(WatchdogError::TimedOut(_)))
        ));

        let calls = rig.calls();
        assert!(calls.contains(&Call::Open));
        let last_placement = calls
            .iter()
            .rev()
            .find(|c| matches!(c, Call::Open | Call::Close))
            .copied();
        assert_eq!(last_placement, Some(Call::Close));
        assert_eq!(rig.last_commands(), [Some(0.0); 4]);
        assert_eq!(dt.progress(), 0);
    }

    #[test]
    fn test_sleep_out_of_range_returns() {
        sleep_s(std::f64::INFINITY);
        sleep_s(std::f64::NAN);
        sleep_s(1e300);
        sleep_s(-1.0);
    }

    #[test]
    fn test_move_distance_jammed_encoder() {
        let (rig, wheels, gyro, _) = Rig::build();
        let mut dt = drive_train(wheels, gyro);

        let r = dt.move_distance(10.0, 0.5, &Watchdog::with_timeout(Duration::from_millis(20)));
        assert!(matches!(
            r,
            Err(DriveTrainError::Watchdog(WatchdogError::TimedOut(_)))
        ));
        assert!(commands(&rig).contains(&0.5));
        assert_eq!(rig.last_commands(), [Some(0.0); 4]);
    }

    #[test]
    fn test_move_distance_cancelled() {
        let (rig, wheels, gyro, _) = Rig::build();
        let mut dt = drive_train(wheels, gyro);

        let flag = CancelFlag::new();
        flag.cancel();
        let r = dt.move_distance(-10.0, 0.5, &Watchdog::new(None, Some(flag)));
        assert!(matches!(
            r,
            Err(DriveTrainError::Watchdog(WatchdogError::Cancelled))
        ));
        assert_eq!(commands(&rig), vec![0.0; 4]);
    }

    #[test]
    fn test_move_distance_already_there() {
        let (rig, wheels, gyro, _) = Rig::build();
        let mut dt = drive_train(wheels, gyro);

        // Zero distance needs no travel
        dt.move_distance(0.0, 0.5, &Watchdog::unlimited()).unwrap();
        assert_eq!(commands(&rig), vec![0.0; 4]);
        assert_eq!(rig.positions[0].get(), 0.0);
    }

    #[test]
    fn test_sensor_helpers() {
        let (rig, wheels, gyro, _) = Rig::build();
        let mut dt = drive_train(wheels, gyro);

        rig.heading.set(-10.0);
        assert_eq!(dt.heading_deg(), 350.0);
        assert_eq!(dt.raw_heading_deg(), -10.0);
        dt.reset_heading();
        assert_eq!(dt.heading_deg(), 0.0);

        rig.positions[2].set(154.132);
        assert_eq!(dt.encoder_positions()[2], 154.132);
        dt.zero_encoders();
        assert_eq!(dt.encoder_positions(), [0.0; 4]);

        assert!((dt.enc_to_dist(dt.dist_to_enc(12.5)) - 12.5).abs() < 1e-9);
        assert_eq!(dt.dist_to_enc(1.0), 77.066);

        rig.clear();
        dt.test_motors(1.0, -1.0, 0.5, -0.5);
        assert_eq!(
            rig.last_commands(),
            [Some(1.0), Some(-1.0), Some(0.5), Some(-0.5)]
        );
    }
}
