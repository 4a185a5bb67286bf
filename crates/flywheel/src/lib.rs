//! Flywheel moment-of-inertia experiment.
//!
//! A virtual rendition of the classic lab setup: a cord wound around the
//! axle of a flywheel carries a ring mass; the falling mass spins the
//! wheel up, the cord detaches, and the wheel coasts to a stop under
//! friction. Timing the coast-down and counting rotations yields an
//! observed moment of inertia to compare against the solid-disc value.
//!
//! The workspace splits into three layers, re-exported here:
//!
//! * [`flywheel_model`]: parameters, derived quantities, schedule and run
//!   state types.
//! * [`flywheel_engine`]: the fixed-step integrator that turns parameters
//!   into a per-rotation time schedule, and the inertia formulas.
//! * [`flywheel_session`]: the cooperative runtime that plays a schedule
//!   back through animation chains, plus the stopwatch and the session
//!   controller.
//!
//! ```
//! use std::rc::Rc;
//! use flywheel::{NullView, Session, VirtualScheduler};
//!
//! let scheduler = VirtualScheduler::new();
//! let mut session = Session::new(
//!     Rc::new(scheduler.clone()),
//!     Rc::new(scheduler.clock()),
//!     Rc::new(NullView),
//! );
//! session.start().unwrap();
//! scheduler.run_until_idle();
//! let observed = session.observed_inertia().unwrap();
//! assert!(observed > 0.0);
//! ```

pub use flywheel_engine::{
    compute_schedule, observed_inertia, theoretical_inertia, INTEGRATION_STEP_S,
};
pub use flywheel_model::{
    Environment, ExperimentError, ExperimentParameters, ParametersBuilder, Phase, PhysicsDerived,
    Result, RotationSchedule, RunState,
};
pub use flywheel_session::{
    CancelToken, Clock, ExperimentView, ManualClock, NullView, RecordingView, RotationSample,
    RunRecorder, RunSummary, Session, Stopwatch, SystemClock, TaskId, TaskScheduler, ViewCall,
    ViewElement, VirtualClock, VirtualScheduler,
};
