//! # Equipment interfaces
//!
//! The control modules never talk to hardware directly. Each piece of equipment is reduced to the
//! narrow capability trait defined here, which a hardware driver (or the [`crate::sim`] chassis)
//! implements.
//!
//! Reads are expected to be fast and to always return a usable value: a driver which loses its
//! device shall report its last known value, or for the vision sensor that no target is visible,
//! rather than failing.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// The number of driven wheels on the chassis.
pub const NUM_WHEELS: usize = 4;

/// Wheel order used by every `[_; NUM_WHEELS]` array in the crate.
pub const WHEEL_IDS: [WheelId; NUM_WHEELS] = [
    WheelId::FrontLeft,
    WheelId::FrontRight,
    WheelId::BackLeft,
    WheelId::BackRight,
];

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A wheel motor controller with an integrated position counter.
pub trait Actuator {
    /// Set the normalised output of the motor.
    ///
    /// ## Arguments
    /// - `value` - The demand, between -1.0 and +1.0.
    fn set_command(&mut self, value: f64);

    /// Get the current value of the position counter, in encoder counts.
    fn position(&mut self) -> f64;

    /// Set the position counter to the given origin.
    fn set_position(&mut self, origin: f64);
}

/// A gyro providing the chassis heading.
pub trait HeadingSensor {
    /// Get the heading in degrees, clockwise positive.
    ///
    /// The value is not wrapped, callers shall normalise it with
    /// [`util::maths::norm_ang_deg`].
    fn heading_deg(&mut self) -> f64;

    /// Zero the heading at the current chassis orientation.
    fn reset(&mut self);
}

/// A range finder pointing along the approach axis.
pub trait DistanceSensor {
    /// Get the distance to the nearest object, in the units of the approach parameters.
    fn distance(&mut self) -> f64;
}

/// A camera tracking the placement target.
pub trait VisionSensor {
    /// Returns true if the target is currently in view.
    fn target_visible(&mut self) -> bool;

    /// Signed horizontal offset of the target from the image centre, positive to the right.
    ///
    /// Only meaningful while [`VisionSensor::target_visible`] is true.
    fn horizontal_offset(&mut self) -> f64;
}

/// The placement mechanism: a binary gate plus a pusher.
pub trait PlacementActuator {
    /// Open the gate, releasing the payload.
    fn open(&mut self);

    /// Close the gate.
    fn close(&mut self);

    /// Extend the pusher.
    fn push(&mut self);

    /// Retract the pusher.
    fn retract(&mut self);
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The equipment used only by the approach routine.
///
/// This is passed into the drive train's approach entry points as an explicit context, the drive
/// train itself only owns the wheels and the gyro.
pub struct ApproachEqpt<D, V, P> {
    pub distance: D,
    pub vision: V,
    pub placement: P,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// IDs of the driven wheels.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum WheelId {
    FrontLeft,
    FrontRight,
    BackLeft,
    BackRight,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl WheelId {
    /// Index of this wheel in a `[_; NUM_WHEELS]` array.
    pub fn index(self) -> usize {
        match self {
            WheelId::FrontLeft => 0,
            WheelId::FrontRight => 1,
            WheelId::BackLeft => 2,
            WheelId::BackRight => 3,
        }
    }
}

impl<D, V, P> ApproachEqpt<D, V, P>
where
    D: DistanceSensor,
    V: VisionSensor,
    P: PlacementActuator,
{
    pub fn new(distance: D, vision: V, placement: P) -> Self {
        Self {
            distance,
            vision,
            placement,
        }
    }

    /// Read the vision offset, or `None` if the target is not in view.
    pub fn vision_offset(&mut self) -> Option<f64> {
        match self.vision.target_visible() {
            true => Some(self.vision.horizontal_offset()),
            false => None,
        }
    }
}
