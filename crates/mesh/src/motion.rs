//! Motion Adapter - the narrow seam to the drivetrain
//!
//! The router only ever asks for a turn followed by a straight move.

use crate::packet::Maneuver;

/// Drivetrain operations a node can perform.
pub trait MotionAdapter {
    /// Turn in place; positive degrees are counter-clockwise.
    fn turn(&mut self, degrees: i16);

    /// Drive straight for `distance_cm` centimetres.
    fn straight(&mut self, distance_cm: u32);
}

impl<M: MotionAdapter + ?Sized> MotionAdapter for Box<M> {
    fn turn(&mut self, degrees: i16) {
        (**self).turn(degrees)
    }

    fn straight(&mut self, distance_cm: u32) {
        (**self).straight(distance_cm)
    }
}

/// Run `maneuver` on `motion`: always turn first, then drive.
pub fn perform<M: MotionAdapter + ?Sized>(motion: &mut M, maneuver: &Maneuver) {
    motion.turn(maneuver.signed_degrees());
    motion.straight(maneuver.distance_cm);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::TurnDirection;

    #[derive(Default)]
    struct Trace(Vec<String>);

    impl MotionAdapter for Trace {
        fn turn(&mut self, degrees: i16) {
            self.0.push(format!("turn({degrees})"));
        }

        fn straight(&mut self, distance_cm: u32) {
            self.0.push(format!("straight({distance_cm})"));
        }
    }

    #[test]
    fn test_turn_precedes_straight() {
        let mut trace = Trace::default();
        perform(
            &mut trace,
            &Maneuver {
                turn: TurnDirection::Right,
                degrees: 90,
                distance_cm: 300,
            },
        );
        assert_eq!(trace.0, vec!["turn(-90)", "straight(300)"]);
    }

    #[test]
    fn test_boxed_adapter_delegates() {
        let mut boxed: Box<Trace> = Box::default();
        perform(
            &mut boxed,
            &Maneuver {
                turn: TurnDirection::Left,
                degrees: 30,
                distance_cm: 0,
            },
        );
        assert_eq!(boxed.0, vec!["turn(30)", "straight(0)"]);
    }
}
