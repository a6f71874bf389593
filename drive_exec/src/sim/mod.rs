//! # Simulation
//!
//! A kinematic mecanum chassis driving towards a single placement peg. Every equipment trait is
//! implemented by a handle onto a shared [`SimWorld`], so a [`DriveTrain`](crate::drive_train::DriveTrain)
//! can be built on the simulation exactly as it would be on hardware.
//!
//! The world is stepped once each time the back right wheel is commanded, which the drive train
//! always writes last, so one full wheel set is one step.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;
mod world;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{cell::RefCell, rc::Rc};

pub use params::SimParams;
pub use world::{SimPose, SimWorld};

use crate::eqpt::{
    Actuator, ApproachEqpt, DistanceSensor, HeadingSensor, PlacementActuator, VisionSensor,
    WheelId, WHEEL_IDS,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub type SharedWorld = Rc<RefCell<SimWorld>>;

pub struct SimWheel {
    world: SharedWorld,
    id: WheelId,
}

pub struct SimGyro(SharedWorld);

pub struct SimDistance(SharedWorld);

pub struct SimVision(SharedWorld);

pub struct SimPlacement(SharedWorld);

/// A simulated world together with all the equipment handles onto it.
pub struct Sim {
    pub world: SharedWorld,
    pub wheels: [SimWheel; 4],
    pub gyro: SimGyro,
    pub eqpt: ApproachEqpt<SimDistance, SimVision, SimPlacement>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Sim {
    pub fn new(params: SimParams) -> Self {
        let world = Rc::new(RefCell::new(SimWorld::new(params)));

        let wheel = |id: WheelId| SimWheel {
            world: world.clone(),
            id,
        };

        Self {
            wheels: [
                wheel(WHEEL_IDS[0]),
                wheel(WHEEL_IDS[1]),
                wheel(WHEEL_IDS[2]),
                wheel(WHEEL_IDS[3]),
            ],
            gyro: SimGyro(world.clone()),
            eqpt: ApproachEqpt::new(
                SimDistance(world.clone()),
                SimVision(world.clone()),
                SimPlacement(world.clone()),
            ),
            world,
        }
    }
}

impl Actuator for SimWheel {
    fn set_command(&mut self, value: f64) {
        let mut world = self.world.borrow_mut();
        world.set_wheel_dem(self.id.index(), value);

        if self.id == WheelId::BackRight {
            world.step();
        }
    }

    fn position(&mut self) -> f64 {
        self.world.borrow().encoder(self.id.index())
    }

    fn set_position(&mut self, origin: f64) {
        self.world.borrow_mut().set_encoder(self.id.index(), origin);
    }
}

impl HeadingSensor for SimGyro {
    fn heading_deg(&mut self) -> f64 {
        self.0.borrow().gyro_heading_deg()
    }

    fn reset(&mut self) {
        self.0.borrow_mut().zero_gyro();
    }
}

impl DistanceSensor for SimDistance {
    fn distance(&mut self) -> f64 {
        self.0.borrow().range()
    }
}

impl VisionSensor for SimVision {
    fn target_visible(&mut self) -> bool {
        self.0.borrow().vision_offset().is_some()
    }

    fn horizontal_offset(&mut self) -> f64 {
        self.0.borrow().vision_offset().unwrap_or(0.0)
    }
}

impl PlacementActuator for SimPlacement {
    fn open(&mut self) {
        self.0.borrow_mut().open_gate();
    }

    fn close(&mut self) {
        self.0.borrow_mut().close_gate();
    }

    fn push(&mut self) {
        self.0.borrow_mut().set_pusher(true);
    }

    fn retract(&mut self) {
        self.0.borrow_mut().set_pusher(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        approach_ctrl::ApproachParams,
        drive_train::{DriveTrain, DriveTrainParams},
        loco_ctrl::LocoCtrlParams,
        watchdog::Watchdog,
    };
    use std::time::Duration;

    type SimEqpt = ApproachEqpt<SimDistance, SimVision, SimPlacement>;

    fn build(sim_params: SimParams) -> (SharedWorld, DriveTrain<SimWheel, SimGyro>, SimEqpt) {
        let Sim { world, wheels, gyro, eqpt } = Sim::new(sim_params);
        let approach_params = ApproachParams {
            release_dwell_s: 0.0,
            ..Default::default()
        };
        let dt = DriveTrain::new(
            wheels,
            gyro,
            DriveTrainParams::default(),
            LocoCtrlParams::default(),
            approach_params,
        );
        (world, dt, eqpt)
    }

    #[test]
    fn test_move_distance_converges() {
        let (world, mut dt, _) = build(SimParams::default());

        dt.move_distance(10.0, 0.5, &Watchdog::with_timeout(Duration::from_secs(5))).unwrap();
        let y_0 = world.borrow().pose().y;
        assert!(y_0 >= 10.0 - 1e-6 && y_0 < 10.5);
        assert!(world.borrow().pose().x.abs() < 1e-6);
        let fl_counts = dt.encoder_positions()[0];
        assert!(dt.enc_to_dist(fl_counts) >= 10.0 - 1e-6);

        // Backwards
        dt.move_distance(-4.0, 0.5, &Watchdog::with_timeout(Duration::from_secs(5))).unwrap();
        let travelled = y_0 - world.borrow().pose().y;
        assert!(travelled >= 4.0 - 1e-6 && travelled < 4.5);
    }

    #[test]
    fn test_cyclic_routine_completes() {
        let (world, mut dt, mut eqpt) = build(SimParams::default());

        let mut ticks = 0;
        while dt.progress() < 5 {
            dt.place_target(0, &mut eqpt).unwrap();
            ticks += 1;
            assert!(ticks < 5000, "Routine did not finish, stuck at {}", dt.progress());
        }

        // Released once clear of the peg
        assert!(world.borrow().gate_open() && world.borrow().pusher_extended());
        assert!(eqpt.distance.distance() > 20.0);

        dt.reset_routine(&mut eqpt.placement);
        let w = world.borrow();
        assert!(!w.gate_open() && !w.pusher_extended());
        assert_eq!(dt.progress(), 0);
    }

    #[test]
    fn test_blocking_routine_places() {
        let (world, mut dt, mut eqpt) = build(SimParams::default());

        dt.place_target_blocking(0, &mut eqpt, &Watchdog::with_timeout(Duration::from_secs(10)))
            .unwrap();

        let w = world.borrow();
        assert!(w.payload_placed());
        assert!(!w.gate_open());
        assert_eq!(dt.progress(), 0);
    }

    #[test]
    fn test_blocking_routine_without_target() {
        // Peg directly behind the start, turning to 330 never brings it into view
        let (world, mut dt, mut eqpt) = build(SimParams {
            peg_x: 0.0,
            peg_y: -40.0,
            ..Default::default()
        });

        let r = dt.place_target_blocking(
            0,
            &mut eqpt,
            &Watchdog::with_timeout(Duration::from_secs(10)),
        );
        assert!(r.is_err());
        assert!(!world.borrow().payload_placed());
        assert!(!world.borrow().gate_open());
    }
}
