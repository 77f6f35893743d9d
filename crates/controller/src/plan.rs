//! Move planning: operator intent to wire maneuver

use piconet_mesh::{Maneuver, TurnDirection};
use serde::{Deserialize, Serialize};

use crate::heading::{bearing_delta, Position};

/// A move the controller intends a unit to make
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovePlan {
    maneuver: Maneuver,
}

impl MovePlan {
    /// Plan from a signed turn (counter-clockwise positive) and a distance.
    ///
    /// The turn magnitude is rounded to whole degrees and clamped to the
    /// single byte the wire carries.
    pub fn from_turn(turn_deg: f64, distance_cm: u32) -> Self {
        let turn = if turn_deg > 0.0 {
            TurnDirection::Left
        } else {
            TurnDirection::Right
        };
        let degrees = turn_deg.abs().round().min(f64::from(u8::MAX)) as u8;
        Self {
            maneuver: Maneuver {
                turn,
                degrees,
                distance_cm,
            },
        }
    }

    /// Plan that takes a unit at `from`, facing `heading_deg`, to `to`.
    pub fn toward(from: Position, heading_deg: f64, to: Position) -> Self {
        let distance = from.distance_to(&to).round();
        // Float to int casts saturate
        Self::from_turn(bearing_delta(from, to, heading_deg), distance as u32)
    }

    /// Wire maneuver for this plan
    pub fn maneuver(&self) -> &Maneuver {
        &self.maneuver
    }

    /// Turn as it will be executed, counter-clockwise positive
    pub fn signed_degrees(&self) -> i16 {
        self.maneuver.signed_degrees()
    }

    /// Distance to drive after the turn
    pub fn distance_cm(&self) -> u32 {
        self.maneuver.distance_cm
    }
}

impl From<Maneuver> for MovePlan {
    fn from(maneuver: Maneuver) -> Self {
        Self { maneuver }
    }
}
