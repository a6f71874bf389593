//! Mecanum mixing calculations

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::{Intent, WheelDems};
use crate::eqpt::NUM_WHEELS;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Mix an intent into wheel demands using the mecanum inverse kinematics.
///
/// ```text
/// fl =  x + y + r      fr = -x + y - r
/// bl = -x + y + r      br =  x + y - r
/// ```
///
/// The result is normalised so no demand exceeds unity in magnitude.
pub fn mix(intent: &Intent) -> WheelDems {
    let mut dems = raw_dems(intent);

    normalise(&mut dems);

    WheelDems::from_array(dems)
}

/// The un-normalised wheel demands for an intent, in wheel order.
pub(crate) fn raw_dems(intent: &Intent) -> [f64; NUM_WHEELS] {
    let Intent { x, y, rotation: r } = *intent;

    [
        x + y + r,
        -x + y - r,
        -x + y + r,
        x + y - r,
    ]
}

/// Scale the demands so the largest magnitude is at most 1.
///
/// If any magnitude exceeds 1 all demands are divided by the largest one,
/// preserving the ratios between wheels. Returns the largest magnitude seen
/// before scaling.
pub fn normalise(dems: &mut [f64; NUM_WHEELS]) -> f64 {
    let max_magn = dems.iter().fold(0f64, |m, d| m.max(d.abs()));

    if max_magn > 1.0 {
        for d in dems.iter_mut() {
            *d /= max_magn;
        }
    }

    max_magn
}
