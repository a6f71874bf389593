//! Utility maths functions
//!
//! Angles handled here are headings in degrees, as produced by the gyro. Any
//! comparison between two headings shall go through [`get_ang_dist_deg`] so
//! the 0/360 wrap is handled in exactly one place.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Degrees in a full revolution.
pub const FULL_TURN_DEG: f64 = 360.0;

/// Degrees in a half revolution.
pub const HALF_TURN_DEG: f64 = 180.0;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where 
    T: Float 
{
    target_range.0 
        + ((value - source_range.0) 
        * (target_range.1 - target_range.0) 
        / (source_range.1 - source_range.0))
}

/// Map a value from one range into another, saturating at the ends of the
/// target range rather than extrapolating.
///
/// A degenerate source range (both ends equal) acts as a step: values at or
/// above it map to the end of the target range, values below it to the start.
pub fn lin_map_clamped<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float
{
    if source_range.0 == source_range.1 {
        return match value >= source_range.1 {
            true => target_range.1,
            false => target_range.0
        }
    }

    let (lo, hi) = match target_range.0 <= target_range.1 {
        true => (target_range.0, target_range.1),
        false => (target_range.1, target_range.0)
    };

    clamp(&lin_map(source_range, target_range, value), &lo, &hi)
}

/// Clamp a value into `[min, max]`.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T 
where
    T: Float
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Sign of a value which, unlike `f64::signum`, is zero for zero.
pub fn signum<T>(value: T) -> T
where
    T: Float
{
    if value == T::zero() {
        T::zero()
    }
    else {
        value.signum()
    }
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
/// 
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()` if `lhs` is much smaller than `rhs.abs()` in
/// magnitude and `lhs < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

/// Normalise a heading into `[0, 360)` degrees.
///
/// Multiple wraps and negative headings are folded into a single revolution,
/// and negative zero is returned as positive zero.
pub fn norm_ang_deg(angle_deg: f64) -> f64 {
    // Adding positive zero turns -0.0 into 0.0
    let r = rem_euclid(angle_deg, FULL_TURN_DEG) + 0.0;

    // Round-off on tiny negative inputs can land exactly on 360
    if r >= FULL_TURN_DEG {
        0.0
    }
    else {
        r
    }
}

/// Get the signed shortest angular distance from `current_deg` to `target_deg`.
///
/// The result is in `[-180, 180)`. A positive value means the target lies
/// clockwise of (ahead of) the current heading.
pub fn get_ang_dist_deg(current_deg: f64, target_deg: f64) -> f64 {
    norm_ang_deg(norm_ang_deg(target_deg) - norm_ang_deg(current_deg) + HALF_TURN_DEG) 
        - HALF_TURN_DEG
}
