//! Run recording for later inspection or export.

use serde::{Deserialize, Serialize};

/// One completed rotation and the simulated time it finished at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotationSample {
    pub rotation: usize,
    pub elapsed_ms: f64,
}

/// Final figures of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_rotations: f64,
    pub lap_seconds: Option<f64>,
    pub observed_inertia: Option<f64>,
}

/// Records rotation checkpoints and the closing summary of a run.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RunRecorder {
    samples: Vec<RotationSample>,
    summary: Option<RunSummary>,
}

impl RunRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_rotation(&mut self, rotation: usize, elapsed_ms: f64) {
        self.samples.push(RotationSample {
            rotation,
            elapsed_ms,
        });
    }

    pub fn record_summary(&mut self, summary: RunSummary) {
        self.summary = Some(summary);
    }

    pub fn samples(&self) -> &[RotationSample] {
        &self.samples
    }

    pub fn summary(&self) -> Option<&RunSummary> {
        self.summary.as_ref()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.summary = None;
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_samples_in_order() {
        let mut recorder = RunRecorder::new();
        recorder.record_rotation(1, 2200.0);
        recorder.record_rotation(2, 3500.0);
        assert_eq!(recorder.len(), 2);
        assert_eq!(recorder.samples()[0].rotation, 1);
        assert_eq!(recorder.samples()[1].elapsed_ms, 3500.0);
    }

    #[test]
    fn json_round_trip_preserves_the_run() {
        let mut recorder = RunRecorder::new();
        recorder.record_rotation(1, 2200.0);
        recorder.record_summary(RunSummary {
            total_rotations: 1.25,
            lap_seconds: Some(38.4),
            observed_inertia: Some(0.0061),
        });
        let json = recorder.to_json().unwrap();
        let restored = RunRecorder::from_json(&json).unwrap();
        assert_eq!(restored.samples(), recorder.samples());
        assert_eq!(restored.summary(), recorder.summary());
    }

    #[test]
    fn clear_drops_everything() {
        let mut recorder = RunRecorder::new();
        recorder.record_rotation(1, 2200.0);
        recorder.record_summary(RunSummary {
            total_rotations: 1.0,
            lap_seconds: None,
            observed_inertia: None,
        });
        recorder.clear();
        assert!(recorder.is_empty());
        assert!(recorder.summary().is_none());
    }
}
