//! # Simulated world
//!
//! Forward kinematics of the mecanum chassis plus the geometry the sensors see.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;
use nalgebra::{Rotation2, Vector2};
use serde::Serialize;

use super::SimParams;
use crate::eqpt::NUM_WHEELS;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// State of the simulated chassis and its surroundings.
pub struct SimWorld {
    params: SimParams,

    /// Field frame position of the chassis centre.
    position: Vector2<f64>,

    /// True heading, clockwise, not wrapped.
    heading_deg: f64,

    /// Heading at which the gyro was last zeroed.
    gyro_zero_deg: f64,

    wheel_dems: [f64; NUM_WHEELS],
    encoders: [f64; NUM_WHEELS],

    gate_open: bool,
    pusher_extended: bool,
    payload_placed: bool,

    time_s: f64,
}

/// Snapshot of the world for logging and archiving.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SimPose {
    pub time_s: f64,
    pub x: f64,
    pub y: f64,
    pub heading_deg: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimWorld {
    pub fn new(params: SimParams) -> Self {
        Self {
            position: Vector2::new(params.start_x, params.start_y),
            heading_deg: params.start_heading_deg,
            gyro_zero_deg: 0.0,
            wheel_dems: [0.0; NUM_WHEELS],
            encoders: [0.0; NUM_WHEELS],
            gate_open: false,
            pusher_extended: false,
            payload_placed: false,
            time_s: 0.0,
            params,
        }
    }

    /// Advance the world by one step using the current wheel demands.
    pub fn step(&mut self) {
        let [fl, fr, bl, br] = self.wheel_dems;
        let dt = self.params.step_s;

        // Inverse of the mixer
        let x = (fl - fr - bl + br) / 4.0;
        let y = (fl + fr + bl + br) / 4.0;
        let r = (fl - fr + bl - br) / 4.0;

        let vel_body = Vector2::new(x, y) * self.params.max_speed;
        let vel_field = Rotation2::new(-self.heading_deg.to_radians()) * vel_body;

        self.position += vel_field * dt;
        self.heading_deg += r * self.params.max_turn_rate_deg_s * dt;

        for (e, d) in self.encoders.iter_mut().zip(self.wheel_dems.iter()) {
            *e += d * self.params.max_speed * dt * self.params.enc_per_dist;
        }

        self.time_s += dt;

        trace!("Sim pose: {:?}", self.pose());
    }

    /// The peg relative to the chassis, x to the right and y forward.
    fn peg_in_body(&self) -> Vector2<f64> {
        let rel = Vector2::new(self.params.peg_x, self.params.peg_y) - self.position;
        Rotation2::new(self.heading_deg.to_radians()) * rel
    }

    pub(crate) fn set_wheel_dem(&mut self, index: usize, dem: f64) {
        self.wheel_dems[index] = dem;
    }

    pub(crate) fn encoder(&self, index: usize) -> f64 {
        self.encoders[index]
    }

    pub(crate) fn set_encoder(&mut self, index: usize, value: f64) {
        self.encoders[index] = value;
    }

    pub(crate) fn gyro_heading_deg(&self) -> f64 {
        self.heading_deg - self.gyro_zero_deg
    }

    pub(crate) fn zero_gyro(&mut self) {
        self.gyro_zero_deg = self.heading_deg;
    }

    pub(crate) fn range(&self) -> f64 {
        let peg = self.peg_in_body();
        match peg.y > 0.0 {
            true => peg.y.min(self.params.max_range),
            false => self.params.max_range,
        }
    }

    pub(crate) fn vision_offset(&self) -> Option<f64> {
        let peg = self.peg_in_body();
        let half_fov = (self.params.vision_fov_deg / 2.0).to_radians();

        if peg.y > 0.0 && peg.x.abs() <= peg.y * half_fov.tan() {
            Some(peg.x * self.params.vision_scale)
        }
        else {
            None
        }
    }

    pub(crate) fn open_gate(&mut self) {
        if !self.gate_open {
            let dist = (Vector2::new(self.params.peg_x, self.params.peg_y) - self.position).norm();
            if dist <= self.params.place_tolerance {
                self.payload_placed = true;
            }
        }
        self.gate_open = true;
    }

    pub(crate) fn close_gate(&mut self) {
        self.gate_open = false;
    }

    pub(crate) fn set_pusher(&mut self, extended: bool) {
        self.pusher_extended = extended;
    }

    pub fn pose(&self) -> SimPose {
        SimPose {
            time_s: self.time_s,
            x: self.position.x,
            y: self.position.y,
            heading_deg: self.heading_deg,
        }
    }

    pub fn gate_open(&self) -> bool {
        self.gate_open
    }

    pub fn pusher_extended(&self) -> bool {
        self.pusher_extended
    }

    /// True if the gate has been opened while close to the peg.
    pub fn payload_placed(&self) -> bool {
        self.payload_placed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loco_ctrl::{mix, Intent};

    const EPS: f64 = 1e-9;

    fn run(world: &mut SimWorld, intent: Intent, steps: usize) {
        let dems = mix(&intent).as_array();
        for (i, d) in dems.iter().enumerate() {
            world.set_wheel_dem(i, *d);
        }
        for _ in 0..steps {
            world.step();
        }
    }

    #[test]
    fn test_forward_along_heading() {
        let mut world = SimWorld::new(SimParams {
            start_heading_deg: 90.0,
            ..Default::default()
        });

        // Half speed for one second
        run(&mut world, Intent::new(0.0, 0.5, 0.0), 50);
        let pose = world.pose();
        assert!((pose.x - 20.0).abs() < 1e-6);
        assert!(pose.y.abs() < 1e-6);
        assert!((pose.time_s - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_strafe_and_turn() {
        let mut world = SimWorld::new(SimParams::default());

        run(&mut world, Intent::new(0.5, 0.0, 0.0), 50);
        assert!((world.pose().x - 20.0).abs() < 1e-6);
        assert!(world.pose().y.abs() < 1e-6);

        // Clockwise turn at a quarter of the maximum rate for one second
        run(&mut world, Intent::rotation(0.25), 50);
        assert!((world.pose().heading_deg - 45.0).abs() < 1e-6);
        assert!((world.gyro_heading_deg() - 45.0).abs() < 1e-6);
        world.zero_gyro();
        assert!(world.gyro_heading_deg().abs() < EPS);
    }

    #[test]
    fn test_encoders_integrate() {
        let mut world = SimWorld::new(SimParams::default());
        run(&mut world, Intent::new(0.0, -0.5, 0.0), 50);

        for i in 0..NUM_WHEELS {
            assert!((world.encoder(i) + 20.0 * 77.066).abs() < 1e-6);
        }
    }

    #[test]
    fn test_sensors_see_peg() {
        let world = SimWorld::new(SimParams {
            start_heading_deg: 0.0,
            peg_x: 2.0,
            peg_y: 30.0,
            ..Default::default()
        });

        assert!((world.range() - 30.0).abs() < EPS);
        assert!((world.vision_offset().unwrap() - 2.0).abs() < EPS);

        // Facing away, nothing seen
        let world = SimWorld::new(SimParams {
            start_heading_deg: 180.0,
            peg_x: 2.0,
            peg_y: 30.0,
            ..Default::default()
        });
        assert_eq!(world.range(), 255.0);
        assert_eq!(world.vision_offset(), None);
    }

    #[test]
    fn test_placement() {
        let mut world = SimWorld::new(SimParams {
            peg_x: 0.0,
            peg_y: 50.0,
            ..Default::default()
        });

        world.open_gate();
        assert!(world.gate_open() && !world.payload_placed());
        world.close_gate();

        run(&mut world, Intent::new(0.0, 1.0, 0.0), 55);
        world.open_gate();
        assert!(world.payload_placed());
    }
}
