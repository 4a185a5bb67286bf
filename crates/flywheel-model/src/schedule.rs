//! The per-rotation time-slot schedule produced by the rotation scheduler.

use serde::{Deserialize, Serialize};

/// Ordered per-rotation durations for one run.
///
/// Entry `i` is the duration (ms) of full rotation `i`; the trailing entry
/// is the deceleration tail after the last counted rotation.
/// `final_rotation_fraction` describes the incomplete final rotation in
/// hundredths (37 means 0.37 of a turn).
///
/// A schedule is fully determined by the parameters and the fixed
/// integration step: equal inputs yield identical schedules.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RotationSchedule {
    slots_ms: Vec<u64>,
    final_rotation_fraction: u32,
}

impl RotationSchedule {
    /// Build a schedule from per-rotation durations and the final fraction.
    pub fn new(slots_ms: Vec<u64>, final_rotation_fraction: u32) -> Self {
        debug_assert!(final_rotation_fraction <= 100);
        RotationSchedule {
            slots_ms,
            final_rotation_fraction,
        }
    }

    /// The empty schedule of a run with no driving torque.
    pub fn degenerate() -> Self {
        RotationSchedule::default()
    }

    pub fn len(&self) -> usize {
        self.slots_ms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots_ms.is_empty()
    }

    /// Duration of time slot `index` in ms.
    pub fn slot(&self, index: usize) -> u64 {
        self.slots_ms[index]
    }

    pub fn slots(&self) -> &[u64] {
        &self.slots_ms
    }

    /// The last *full* rotation slot, i.e. the entry before the
    /// deceleration tail. Used by the wrap case of the final rotation.
    pub fn last_full_slot(&self) -> Option<u64> {
        self.len().checked_sub(2).map(|i| self.slots_ms[i])
    }

    /// Hundredths of the incomplete final rotation (0–100).
    pub fn final_rotation_fraction(&self) -> u32 {
        self.final_rotation_fraction
    }

    /// The final partial rotation expressed in degrees.
    pub fn final_angle_deg(&self) -> f64 {
        f64::from(self.final_rotation_fraction) * 3.6
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_accessors() {
        let schedule = RotationSchedule::new(vec![6200, 2600, 2000], 37);
        assert_eq!(schedule.len(), 3);
        assert_eq!(schedule.slot(0), 6200);
        assert_eq!(schedule.last_full_slot(), Some(2600));
        assert_eq!(schedule.final_rotation_fraction(), 37);
        assert!((schedule.final_angle_deg() - 133.2).abs() < 1e-9);
    }

    #[test]
    fn degenerate_schedule_is_empty() {
        let schedule = RotationSchedule::degenerate();
        assert!(schedule.is_empty());
        assert_eq!(schedule.last_full_slot(), None);
        assert_eq!(schedule.final_rotation_fraction(), 0);
    }
}
