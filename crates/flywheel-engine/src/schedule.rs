//! Fixed-step kinematic integration producing the per-rotation schedule.

use flywheel_model::{
    ExperimentError, ExperimentParameters, PhysicsDerived, Result, RotationSchedule,
};

/// Integration step (s). The schedule is quantized to this grid.
pub const INTEGRATION_STEP_S: f64 = 0.2;

/// Deceleration once the cord has detached (deg/s²).
const FRICTION_DECEL_DEG: f64 = -10.0;

/// Bound on integration steps. Any physical parameter set terminates far
/// below this; hitting it means the inputs produced no decaying motion.
const MAX_STEPS: usize = 1_000_000;

/// Integrate the angular motion of the flywheel and derive the schedule of
/// per-rotation durations.
///
/// The model accelerates uniformly while the cord drives the axle. The
/// first step at which the total winding angle is covered is a grace step
/// (the cord is slack but still attached); from the next step on the wheel
/// decelerates at a fixed friction rate until it stops. A checkpoint is
/// recorded at every completed rotation and at standstill; the schedule
/// entries are the successive differences, rounded to the 0.1 s grid the
/// apparatus displays.
pub fn compute_schedule(
    params: &ExperimentParameters,
) -> Result<(RotationSchedule, PhysicsDerived)> {
    params.validate()?;
    let derived = PhysicsDerived::from_params(params);

    // No driving torque: the wheel never starts moving. Short-circuit to
    // the trivial schedule instead of integrating forever.
    if derived.angular_accel_deg <= 0.0 {
        return Ok((RotationSchedule::degenerate(), derived));
    }

    let dt = INTEGRATION_STEP_S;
    let mut accel = derived.angular_accel_deg;
    let mut time = 0.0_f64;
    let mut angular_distance = 0.0_f64;
    let mut angular_velocity = 0.0_f64;
    let mut rotations_prev = 0u64;
    let mut grace_pending = true;
    let mut checkpoints_ms: Vec<u64> = Vec::new();
    let mut final_fraction = 0u32;

    for _ in 0..MAX_STEPS {
        time += dt;
        angular_distance += angular_velocity * dt + 0.5 * accel * dt * dt;
        let rotations = angular_distance / 360.0;

        if angular_distance >= derived.total_rotation_deg {
            if grace_pending {
                // The cord comes taut-to-slack within this step; keep the
                // driving acceleration for one more update.
                grace_pending = false;
            } else {
                accel = FRICTION_DECEL_DEG;
            }
        }

        // Velocity cannot reverse; the wheel stops instead.
        angular_velocity = (angular_velocity + accel * dt).max(0.0);

        let rotations_now = rotations.floor() as u64;
        if rotations_now > rotations_prev {
            checkpoints_ms.push(grid_ms(time));
        }
        rotations_prev = rotations_now;

        if angular_velocity == 0.0 {
            checkpoints_ms.push(grid_ms(time));
            final_fraction = ((rotations.fract() * 100.0).round() as u32).min(100);
            break;
        }
    }

    if angular_velocity != 0.0 {
        return Err(ExperimentError::ScheduleDegenerate);
    }

    let mut slots = Vec::with_capacity(checkpoints_ms.len());
    let mut prev = 0u64;
    for &cp in &checkpoints_ms {
        slots.push(cp - prev);
        prev = cp;
    }

    Ok((RotationSchedule::new(slots, final_fraction), derived))
}

/// Round a cumulative time to the nearest 0.1 s and encode as integer ms.
fn grid_ms(time_s: f64) -> u64 {
    (time_s * 10.0).round() as u64 * 100
}
