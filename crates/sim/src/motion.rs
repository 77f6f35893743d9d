//! Drivetrain stand-in that records what it was asked to do

use piconet_mesh::MotionAdapter;

/// One drivetrain call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionCall {
    /// `turn(degrees)`
    Turn(i16),
    /// `straight(distance_cm)`
    Straight(u32),
}

/// Motion adapter that only records calls
#[derive(Debug, Clone, Default)]
pub struct RecordingMotion {
    calls: Vec<MotionCall>,
}

impl RecordingMotion {
    /// Every call so far, in order
    pub fn calls(&self) -> &[MotionCall] {
        &self.calls
    }

    /// Number of complete turn-then-straight moves
    pub fn moves(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, MotionCall::Straight(_)))
            .count()
    }

    /// Forget recorded calls
    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl MotionAdapter for RecordingMotion {
    fn turn(&mut self, degrees: i16) {
        self.calls.push(MotionCall::Turn(degrees));
    }

    fn straight(&mut self, distance_cm: u32) {
        self.calls.push(MotionCall::Straight(distance_cm));
    }
}
