//! Experiment parameters, gravity environments, and the builder.

use serde::{Deserialize, Serialize};

use crate::error::{ExperimentError, Result};

/// Simulated environment, selecting the gravitational acceleration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Environment {
    #[default]
    Earth,
    Moon,
    Uranus,
    Saturn,
    Jupiter,
}

impl Environment {
    /// Gravitational acceleration at the surface (m/s²).
    pub fn gravity(self) -> f64 {
        match self {
            Environment::Earth => 9.8,
            Environment::Moon => 1.63,
            Environment::Uranus => 10.5,
            Environment::Saturn => 11.08,
            Environment::Jupiter => 25.95,
        }
    }
}

/// Static description of one experiment run. Immutable once the run starts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExperimentParameters {
    /// Mass of the flywheel disc (kg).
    pub flywheel_mass_kg: f64,
    /// Diameter of the flywheel disc (cm).
    pub flywheel_diameter_cm: f64,
    /// Diameter of the axle the cord winds around (cm).
    pub axle_diameter_cm: f64,
    /// Mass of the slotted rings hanging on the cord (g). May be 0.
    pub ring_mass_g: f64,
    /// Number of cord windings around the axle.
    pub winding_count: u32,
    /// Gravitational acceleration (m/s²).
    pub gravity: f64,
}

impl Default for ExperimentParameters {
    /// The apparatus defaults presented before the user touches anything.
    fn default() -> Self {
        ExperimentParameters {
            flywheel_mass_kg: 5.0,
            flywheel_diameter_cm: 10.0,
            axle_diameter_cm: 2.0,
            ring_mass_g: 200.0,
            winding_count: 1,
            gravity: Environment::Earth.gravity(),
        }
    }
}

impl ExperimentParameters {
    /// Check the run invariants: everything strictly positive except the
    /// ring mass, which may be zero (no driving torque).
    pub fn validate(&self) -> Result<()> {
        fn positive(name: &str, value: f64) -> Result<()> {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(ExperimentError::InvalidParameters(format!(
                    "{name} must be > 0, got {value}"
                )))
            }
        }

        positive("flywheel mass", self.flywheel_mass_kg)?;
        positive("flywheel diameter", self.flywheel_diameter_cm)?;
        positive("axle diameter", self.axle_diameter_cm)?;
        positive("gravity", self.gravity)?;
        if !(self.ring_mass_g >= 0.0 && self.ring_mass_g.is_finite()) {
            return Err(ExperimentError::InvalidParameters(format!(
                "ring mass must be >= 0, got {}",
                self.ring_mass_g
            )));
        }
        if self.winding_count < 1 {
            return Err(ExperimentError::InvalidParameters(
                "winding count must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Axle radius in meters.
    pub fn axle_radius_m(&self) -> f64 {
        self.axle_diameter_cm / 200.0
    }
}

/// Builder for [`ExperimentParameters`], starting from the defaults.
#[derive(Debug, Clone, Default)]
pub struct ParametersBuilder {
    params: ExperimentParameters,
}

impl ParametersBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flywheel_mass_kg(mut self, mass: f64) -> Self {
        self.params.flywheel_mass_kg = mass;
        self
    }

    pub fn flywheel_diameter_cm(mut self, diameter: f64) -> Self {
        self.params.flywheel_diameter_cm = diameter;
        self
    }

    pub fn axle_diameter_cm(mut self, diameter: f64) -> Self {
        self.params.axle_diameter_cm = diameter;
        self
    }

    pub fn ring_mass_g(mut self, mass: f64) -> Self {
        self.params.ring_mass_g = mass;
        self
    }

    pub fn winding_count(mut self, count: u32) -> Self {
        self.params.winding_count = count;
        self
    }

    pub fn environment(mut self, env: Environment) -> Self {
        self.params.gravity = env.gravity();
        self
    }

    pub fn gravity(mut self, gravity: f64) -> Self {
        self.params.gravity = gravity;
        self
    }

    /// Validate and return the parameters.
    pub fn build(self) -> Result<ExperimentParameters> {
        self.params.validate()?;
        Ok(self.params)
    }
}
