//! Lap stopwatch with a configurable rate divisor.

use std::rc::Rc;

use crate::clock::Clock;

/// Accumulating lap stopwatch.
///
/// Elapsed time is divided by a rate factor so a run can be timed against a
/// slowed-down rendition of the experiment. The rate is clamped to
/// `[0.1, 1.0]`; a rate of `1.0` measures real elapsed time.
pub struct Stopwatch {
    clock: Rc<dyn Clock>,
    rate: f64,
    lap_ms: f64,
    started_at_ms: Option<f64>,
}

impl Stopwatch {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self::with_rate(clock, 1.0)
    }

    pub fn with_rate(clock: Rc<dyn Clock>, rate: f64) -> Self {
        Stopwatch {
            clock,
            rate: clamp_rate(rate),
            lap_ms: 0.0,
            started_at_ms: None,
        }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn set_rate(&mut self, rate: f64) {
        self.rate = clamp_rate(rate);
    }

    pub fn is_running(&self) -> bool {
        self.started_at_ms.is_some()
    }

    /// Starts timing. Has no effect while already running.
    pub fn start(&mut self) {
        if self.started_at_ms.is_none() {
            self.started_at_ms = Some(self.clock.now_ms());
        }
    }

    /// Stops timing and folds the segment into the accumulated lap.
    pub fn pause(&mut self) {
        if let Some(started_at) = self.started_at_ms.take() {
            self.lap_ms += (self.clock.now_ms() - started_at) / self.rate;
        }
    }

    /// Stops timing and clears the accumulated lap.
    pub fn reset(&mut self) {
        self.started_at_ms = None;
        self.lap_ms = 0.0;
    }

    /// Accumulated lap plus the running segment, in milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        match self.started_at_ms {
            Some(started_at) => self.lap_ms + (self.clock.now_ms() - started_at) / self.rate,
            None => self.lap_ms,
        }
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_ms() / 1000.0
    }
}

fn clamp_rate(rate: f64) -> f64 {
    if !(rate > 0.1) {
        0.1
    } else if rate > 1.0 {
        1.0
    } else {
        rate
    }
}
