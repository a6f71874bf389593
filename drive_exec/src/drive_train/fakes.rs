//! Recording fakes of the equipment traits for the drive train tests.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use crate::eqpt::{
    Actuator, ApproachEqpt, DistanceSensor, HeadingSensor, PlacementActuator, VisionSensor,
    WheelId, WHEEL_IDS,
};

/// A call made on an equipment fake.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Call {
    Command(WheelId, f64),
    SetPosition(WheelId, f64),
    HeadingReset,
    Open,
    Close,
    Push,
    Retract,
}

pub type CallLog = Rc<RefCell<Vec<Call>>>;

pub struct FakeWheel {
    id: WheelId,
    log: CallLog,
    pub position: Rc<Cell<f64>>,
}

pub struct FakeGyro {
    log: CallLog,
    pub heading: Rc<Cell<f64>>,
}

pub struct FakeDistance(pub Rc<Cell<f64>>);

pub struct FakeVision(pub Rc<Cell<Option<f64>>>);

pub struct FakePlacement(CallLog);

/// Handles onto the values read by the fakes, and the shared log of calls made on them.
pub struct Rig {
    pub log: CallLog,
    pub positions: [Rc<Cell<f64>>; 4],
    pub heading: Rc<Cell<f64>>,
    pub distance: Rc<Cell<f64>>,
    pub vision: Rc<Cell<Option<f64>>>,
}

impl Actuator for FakeWheel {
    fn set_command(&mut self, value: f64) {
        self.log.borrow_mut().push(Call::Command(self.id, value));
    }

    fn position(&mut self) -> f64 {
        self.position.get()
    }

    fn set_position(&mut self, origin: f64) {
        self.log.borrow_mut().push(Call::SetPosition(self.id, origin));
        self.position.set(origin);
    }
}

impl HeadingSensor for FakeGyro {
    fn heading_deg(&mut self) -> f64 {
        self.heading.get()
    }

    fn reset(&mut self) {
        self.log.borrow_mut().push(Call::HeadingReset);
        self.heading.set(0.0);
    }
}

impl DistanceSensor for FakeDistance {
    fn distance(&mut self) -> f64 {
        self.0.get()
    }
}

impl VisionSensor for FakeVision {
    fn target_visible(&mut self) -> bool {
        self.0.get().is_some()
    }

    fn horizontal_offset(&mut self) -> f64 {
        self.0.get().unwrap_or(0.0)
    }
}

impl PlacementActuator for FakePlacement {
    fn open(&mut self) {
        self.0.borrow_mut().push(Call::Open);
    }

    fn close(&mut self) {
        self.0.borrow_mut().push(Call::Close);
    }

    fn push(&mut self) {
        self.0.borrow_mut().push(Call::Push);
    }

    fn retract(&mut self) {
        self.0.borrow_mut().push(Call::Retract);
    }
}

impl Rig {
    /// Build a full set of fakes sharing one call log.
    pub fn build() -> (
        Self,
        [FakeWheel; 4],
        FakeGyro,
        ApproachEqpt<FakeDistance, FakeVision, FakePlacement>,
    ) {
        let log: CallLog = Rc::new(RefCell::new(Vec::new()));
        let positions = [
            Rc::new(Cell::new(0.0)),
            Rc::new(Cell::new(0.0)),
            Rc::new(Cell::new(0.0)),
            Rc::new(Cell::new(0.0)),
        ];
        let heading = Rc::new(Cell::new(0.0));
        let distance = Rc::new(Cell::new(100.0));
        let vision = Rc::new(Cell::new(None));

        let mk_wheel = |i: usize| FakeWheel {
            id: WHEEL_IDS[i],
            log: log.clone(),
            position: positions[i].clone(),
        };
        let wheels = [mk_wheel(0), mk_wheel(1), mk_wheel(2), mk_wheel(3)];

        let gyro = FakeGyro {
            log: log.clone(),
            heading: heading.clone(),
        };

        let eqpt = ApproachEqpt::new(
            FakeDistance(distance.clone()),
            FakeVision(vision.clone()),
            FakePlacement(log.clone()),
        );

        (
            Self {
                log,
                positions,
                heading,
                distance,
                vision,
            },
            wheels,
            gyro,
            eqpt,
        )
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.borrow().clone()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }

    /// The most recent command sent to each wheel.
    pub fn last_commands(&self) -> [Option<f64>; 4] {
        let mut cmds = [None; 4];
        for c in self.log.borrow().iter() {
            if let Call::Command(id, v) = c {
                cmds[id.index()] = Some(*v);
            }
        }
        cmds
    }
}
