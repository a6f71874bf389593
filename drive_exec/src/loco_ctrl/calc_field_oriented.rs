//! Field-oriented compensation calculations

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Rotation2, Vector2};

use super::Intent;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Zero the rotation of an intent if its magnitude is at or below `threshold`.
pub fn suppress_twist(intent: &Intent, threshold: f64) -> Intent {
    let mut out = *intent;

    if out.rotation.abs() <= threshold {
        out.rotation = 0.0;
    }

    out
}

/// Express a field-frame intent in the robot frame.
///
/// The heading is clockwise positive, so the translation is rotated by the
/// negative of the heading in the clockwise sense, which is the standard
/// counter-clockwise rotation matrix applied with `+heading`:
///
/// ```text
/// x' = x cos(h) - y sin(h)
/// y' = x sin(h) + y cos(h)
/// ```
///
/// The rotation component passes through untouched.
pub fn compensate_heading(intent: &Intent, heading_deg: f64) -> Intent {
    let rot = Rotation2::new(heading_deg.to_radians());
    let xy = rot * Vector2::new(intent.x, intent.y);

    Intent {
        x: xy[0],
        y: xy[1],
        rotation: intent.rotation,
    }
}
