//! Miscellaneous utility structs and functions.

use crate::math::Point2d;
use std::fmt::Debug;

/// An interval on the real number line.
#[derive(Copy, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interval<T> {
    pub min: T,
    pub max: T,
}

impl<T> Interval<T> {
    /// Creates a new interval.
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

impl<T: std::cmp::PartialOrd> Interval<T> {
    /// Returns true if this interval contains the value.
    pub fn contains(&self, value: T) -> bool {
        value >= self.min && value <= self.max
    }
}

impl<T: std::ops::Sub<T, Output = T> + Copy> Interval<T> {
    /// Gets the magnitude of the interval.
    pub fn length(&self) -> T {
        self.max - self.min
    }
}

impl<T: Debug> Debug for Interval<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Interval({:?}, {:?})", &self.min, &self.max)
    }
}

/// An axis-aligned rectangle used for footprint containment tests.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    pub x: Interval<f64>,
    pub y: Interval<f64>,
}

impl Bounds {
    /// Creates the bounds of a rectangle centred on `centre`.
    pub fn from_centre(centre: Point2d, width: f64, height: f64) -> Self {
        Self {
            x: Interval::new(centre.x - 0.5 * width, centre.x + 0.5 * width),
            y: Interval::new(centre.y - 0.5 * height, centre.y + 0.5 * height),
        }
    }

    /// Creates the bounds of a line segment inflated by `pad` on every side.
    pub fn from_segment(a: Point2d, b: Point2d, pad: f64) -> Self {
        Self {
            x: Interval::new(a.x.min(b.x) - pad, a.x.max(b.x) + pad),
            y: Interval::new(a.y.min(b.y) - pad, a.y.max(b.y) + pad),
        }
    }

    /// Returns true if the point lies inside the bounds.
    pub fn contains(&self, point: Point2d) -> bool {
        self.x.contains(point.x) && self.y.contains(point.y)
    }
}
