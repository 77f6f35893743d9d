//! Heading math in screen coordinates
//!
//! The operator's map has its origin top-left with `y` growing downward.
//! Headings and turns are in degrees, counter-clockwise positive as seen on
//! screen, with heading 0 pointing along `+x`.

use serde::{Deserialize, Serialize};

/// A point on the operator's map, in centimetres
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Rightward
    pub x: f64,
    /// Downward
    pub y: f64,
}

impl Position {
    /// Point at (`x`, `y`)
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Straight-line distance to `other`
    pub fn distance_to(&self, other: &Position) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Screen angle of the vector to `other`, counter-clockwise from `+x`
    pub fn bearing_to(&self, other: &Position) -> f64 {
        // Screen y points down, so flip it for a counter-clockwise angle
        (-(other.y - self.y)).atan2(other.x - self.x).to_degrees()
    }

    /// Point `distance` away along `heading_deg`
    pub fn advance(&self, heading_deg: f64, distance: f64) -> Position {
        let radians = heading_deg.to_radians();
        Position {
            x: self.x + distance * radians.cos(),
            y: self.y - distance * radians.sin(),
        }
    }
}

/// Fold any angle into `[-180, 180]`.
pub fn normalize_turn(degrees: f64) -> f64 {
    let folded = degrees.rem_euclid(360.0);
    if folded > 180.0 {
        folded - 360.0
    } else {
        folded
    }
}

/// Fold any heading into `[0, 360)`.
pub fn normalize_heading(degrees: f64) -> f64 {
    let folded = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if folded >= 360.0 {
        0.0
    } else {
        folded
    }
}

/// Signed turn that points a unit at `from` with heading `heading_deg`
/// toward `to`. Positive is counter-clockwise.
pub fn bearing_delta(from: Position, to: Position, heading_deg: f64) -> f64 {
    normalize_turn(from.bearing_to(&to) - heading_deg)
}
