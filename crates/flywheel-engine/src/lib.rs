//! Pure compute for the flywheel experiment: the rotation scheduler and the
//! moment-of-inertia calculators.
//!
//! Nothing here touches timers or views; everything is a deterministic
//! function of [`flywheel_model::ExperimentParameters`].

pub mod inertia;
pub mod schedule;

pub use inertia::{observed_inertia, theoretical_inertia};
pub use schedule::{compute_schedule, INTEGRATION_STEP_S};
