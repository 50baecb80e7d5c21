//! Geometry, kinematics and unit-conversion helpers.

use cgmath::prelude::*;
use cgmath::{Point2, Vector2};

/// A 2D point
pub type Point2d = Point2<f64>;

/// A 2D vector
pub type Vector2d = Vector2<f64>;

/// The heading a vehicle rotates from: straight up in screen coordinates (y grows downward).
pub fn forward() -> Vector2d {
    Vector2d::new(0.0, -1.0)
}

/// Euclidean distance between two points in m.
pub fn distance(a: Point2d, b: Point2d) -> f64 {
    (b - a).magnitude()
}

/// Rotates a vector clockwise by the given angle in degrees (screen coordinates).
pub fn rotate_deg(v: Vector2d, deg: f64) -> Vector2d {
    let (sin, cos) = deg.to_radians().sin_cos();
    Vector2d::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Rotates a vector a quarter turn.
pub fn rot90(v: Vector2d) -> Vector2d {
    Vector2d::new(-v.y, v.x)
}

/// The heading in degrees, in `[0, 360)`, of a direction vector.
/// The zero heading points straight up.
pub fn heading_of(v: Vector2d) -> f64 {
    v.x.atan2(-v.y).to_degrees().rem_euclid(360.0)
}

/// Wraps an angle in degrees into `(-180, 180]`.
pub fn normalize_angle(deg: f64) -> f64 {
    let a = deg.rem_euclid(360.0);
    if a > 180.0 {
        a - 360.0
    } else {
        a
    }
}

/// Distance needed to come to a full stop from `speed` while braking at
/// `min_acceleration` (a negative number), in m.
pub fn braking_distance(speed: f64, min_acceleration: f64) -> f64 {
    debug_assert!(min_acceleration < 0.0);
    -(speed * speed) / (2.0 * min_acceleration)
}

/// Constant angular velocity, in degrees per metre travelled, that turns a
/// vehicle through `angle_deg` (the signed heading difference between the
/// source and target lanes) along a circular arc whose chord is `chord` m.
///
/// A near-zero angle means the vehicle crosses straight through and no
/// rotation is applied.
pub fn turn_rate(chord: f64, angle_deg: f64) -> f64 {
    let angle = normalize_angle(angle_deg);
    if angle.abs() < 1e-6 || chord < 1e-9 {
        return 0.0;
    }
    let half = (angle.abs() / 2.0).to_radians();
    let radius = (chord / 2.0) / half.sin();
    let arc = radius * angle.abs().to_radians();
    -angle / arc
}

/// Converts a velocity in m/s to km/h.
pub fn mps_to_kmh(v: f64) -> f64 {
    v * 3.6
}

/// Converts a velocity in km/h to m/s.
pub fn kmh_to_mps(v: f64) -> f64 {
    v / 3.6
}
