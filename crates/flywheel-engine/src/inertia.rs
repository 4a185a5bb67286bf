//! Theoretical and observed moment-of-inertia calculations.

use std::f64::consts::PI;

use flywheel_model::{ExperimentError, ExperimentParameters, Result};

/// Theoretical moment of inertia of the flywheel as a solid disc,
/// `I = m r^2 / 2` with the radius in meters.
pub fn theoretical_inertia(params: &ExperimentParameters) -> f64 {
    let radius_m = params.flywheel_diameter_cm / 200.0;
    params.flywheel_mass_kg * radius_m * radius_m / 2.0
}

/// Moment of inertia derived from the timed measurement.
///
/// `total_rotations` is the rotation counter at standstill including the
/// fractional display digits; `lap_seconds` is the stopwatch lap between
/// detach and standstill. With `n1` windings, `n2 = total - n1` free
/// rotations, fall height `h = 2 pi r n1` and angular velocity at detach
/// `omega = 4 pi n2 / t`:
///
/// `I = m (2 g h / omega - r^2) / (1 + n1 / n2)`
///
/// Fails with [`ExperimentError::MeasurementUnavailable`] rather than
/// producing a NaN when the lap is missing or the wheel never outran its
/// windings.
pub fn observed_inertia(
    params: &ExperimentParameters,
    total_rotations: f64,
    lap_seconds: f64,
) -> Result<f64> {
    if !(lap_seconds > 0.0) {
        return Err(ExperimentError::MeasurementUnavailable(
            "no valid lap time recorded".into(),
        ));
    }

    let n1 = f64::from(params.winding_count);
    let n2 = total_rotations - n1;
    if n2 <= 0.0 {
        return Err(ExperimentError::MeasurementUnavailable(
            "no free rotations after detach".into(),
        ));
    }

    let m = params.flywheel_mass_kg;
    let g = params.gravity;
    let r = params.axle_radius_m();
    let h = 2.0 * PI * r * n1;
    let omega = 4.0 * PI * n2 / lap_seconds;

    Ok(m * (2.0 * g * h / omega - r * r) / (1.0 + n1 / n2))
}
