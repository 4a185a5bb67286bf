//! Parameter and state types for the flywheel experiment engine.
//!
//! `ExperimentParameters` is the static description of one experiment run
//! (masses, diameters, winding count, gravity). `RunState` is the mutable
//! state the animation chains drive. `PhysicsDerived` and `RotationSchedule`
//! are recomputed from the parameters whenever they change.

pub mod error;
pub mod params;
pub mod schedule;
pub mod state;

pub use error::{ExperimentError, Result};
pub use params::{Environment, ExperimentParameters, ParametersBuilder};
pub use schedule::RotationSchedule;
pub use state::{Phase, RunState};

/// Derived physical quantities, recomputed whenever parameters change.
///
/// `moment_of_inertia` is the theoretical value for a solid disc,
/// `I = m (d/2)^2 / 2` with the diameter converted from cm to m.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PhysicsDerived {
    /// Theoretical moment of inertia of the flywheel (kg·m²).
    pub moment_of_inertia: f64,
    /// Angular acceleration while the cord drives the axle (deg/s²).
    pub angular_accel_deg: f64,
    /// Total angle the cord windings span (deg).
    pub total_rotation_deg: f64,
}

impl PhysicsDerived {
    /// Recompute derived quantities from the given parameters.
    ///
    /// The degree conversion uses 3.14 rather than `PI`: the apparatus
    /// timing tables were produced with that constant, and the schedule
    /// must reproduce them exactly.
    pub fn from_params(params: &ExperimentParameters) -> Self {
        let axle_radius_m = params.axle_diameter_cm / 200.0;
        let ring_mass_kg = params.ring_mass_g / 1000.0;
        let moment_of_inertia =
            params.flywheel_mass_kg * (params.flywheel_diameter_cm / 200.0).powi(2) / 2.0;
        let alpha = (axle_radius_m * ring_mass_kg * params.gravity) / moment_of_inertia;
        PhysicsDerived {
            moment_of_inertia,
            angular_accel_deg: alpha * 180.0 / 3.14,
            total_rotation_deg: f64::from(params.winding_count) * 360.0,
        }
    }
}
