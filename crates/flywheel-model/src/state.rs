//! Mutable state of one experiment run.

use serde::{Deserialize, Serialize};

/// Lifecycle phase of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    /// No run in flight.
    #[default]
    Idle,
    /// The cord is still wound; the falling weight drives the axle.
    Winding,
    /// The cord has fully unwound and the weight has separated.
    Detached,
    /// The flywheel spins freely under friction only.
    Decelerating,
    /// The flywheel has stopped; results are available.
    Finished,
}

/// Mutable run state, created at session start and reinitialized on reset.
///
/// Mutated only by the animation chains and the session controller; every
/// other component sees it read-only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunState {
    pub phase: Phase,
    /// Completed full rotations so far (0..schedule length).
    pub rotation_index: usize,
    /// Sub-rotation counter, hundredths of a turn (0–99). Drives the
    /// tracking line and the digit display.
    pub sub_rotation: u32,
    /// Set once the run has entered its final, partial rotation.
    pub final_rotation: bool,
    /// Deceleration after detach (deg/s²); informational.
    pub decel_accel_deg: Option<f64>,
    /// Lap time captured by the stopwatch (s), once measured.
    pub lap_seconds: Option<f64>,
    /// Observed moment of inertia (kg·m²), once computed.
    pub observed_inertia: Option<f64>,
}

impl RunState {
    pub fn new() -> Self {
        RunState::default()
    }

    /// Total rotations at the current instant, counting the sub-rotation
    /// counter as hundredths of a turn.
    pub fn total_rotations(&self) -> f64 {
        self.rotation_index as f64 + f64::from(self.sub_rotation) / 100.0
    }

    /// Cord height still wound on the axle (cm), as shown by the scale.
    /// Each winding stands for 2 cm of cord.
    pub fn remaining_height_cm(&self, winding_count: u32) -> f64 {
        let wound = winding_count.saturating_sub(self.rotation_index as u32);
        f64::from(wound) * 2.0 - f64::from(self.sub_rotation) / 50.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_rotations_counts_hundredths() {
        let state = RunState {
            rotation_index: 3,
            sub_rotation: 42,
            ..RunState::default()
        };
        assert!((state.total_rotations() - 3.42).abs() < 1e-12);
    }

    #[test]
    fn height_reaches_zero_at_detach() {
        let mut state = RunState::new();
        state.rotation_index = 2;
        state.sub_rotation = 0;
        assert_eq!(state.remaining_height_cm(2), 0.0);

        state.rotation_index = 0;
        state.sub_rotation = 50;
        assert_eq!(state.remaining_height_cm(2), 3.0);
    }
}
