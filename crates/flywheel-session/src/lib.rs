//! Cooperative animation runtime and session controller for the flywheel
//! moment-of-inertia experiment.
//!
//! Everything here is single-threaded: the session schedules callbacks on
//! a [`TaskScheduler`] and the animation chains hand control to each other
//! through it. [`VirtualScheduler`] runs those chains against simulated
//! time, so a forty-second run completes in microseconds and behaves
//! identically on every machine.

pub mod clock;
pub mod recorder;
pub mod session;
mod stages;
pub mod stopwatch;
pub mod timer;
pub mod view;

pub use clock::{Clock, ManualClock, SystemClock};
pub use recorder::{RotationSample, RunRecorder, RunSummary};
pub use session::Session;
pub use stopwatch::Stopwatch;
pub use timer::{CancelToken, TaskId, TaskScheduler, VirtualClock, VirtualScheduler};
pub use view::{ExperimentView, NullView, RecordingView, ViewCall, ViewElement};
