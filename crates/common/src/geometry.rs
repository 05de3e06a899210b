//! Geometric predicates used by the rule gates.
//!
//! All functions are pure. Degenerate input (zero-length vectors) yields a
//! defined but meaningless answer rather than a panic.

use crate::Side;
use glam::Vec3;

/// Euclidean distance between two points.
pub fn distance(a: Vec3, b: Vec3) -> f32 {
    a.distance(b)
}

/// Unit vector pointing from `from` to `to`. Zero when the points coincide.
pub fn direction(from: Vec3, to: Vec3) -> Vec3 {
    (to - from).normalize_or_zero()
}

/// The face whose axis dominates `v`.
///
/// X wins only when strictly larger than both other components, then Y when
/// strictly larger than Z, otherwise Z. A zero vector resolves to `Front`.
pub fn side_facing(v: Vec3) -> Side {
    let a = v.abs();
    if a.x > a.y && a.x > a.z {
        if v.x > 0.0 { Side::Right } else { Side::Left }
    } else if a.y > a.z {
        if v.y > 0.0 { Side::Top } else { Side::Bottom }
    } else if v.z > 0.0 {
        Side::Back
    } else {
        Side::Front
    }
}

/// Angle between two vectors in radians, in `[0, PI]`.
pub fn angle_between(a: Vec3, b: Vec3) -> f32 {
    let denom = a.length() * b.length();
    if denom == 0.0 {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos()
}

/// True iff `direction` lies within `fov` radians of `face`.
pub fn is_within_fov(direction: Vec3, face: Vec3, fov: f32) -> bool {
    angle_between(direction, face) <= fov
}
