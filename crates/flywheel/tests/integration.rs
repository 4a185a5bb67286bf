//! End-to-end runs of the experiment through the public API.

use std::rc::Rc;

use approx::assert_relative_eq;
use flywheel::{
    compute_schedule, observed_inertia, Environment, ExperimentError, ExperimentParameters,
    NullView, ParametersBuilder, Phase, RecordingView, RunRecorder, Session, VirtualScheduler,
};

fn session_with_view(
    view: Rc<dyn flywheel::ExperimentView>,
) -> (VirtualScheduler, Session) {
    let scheduler = VirtualScheduler::new();
    let session = Session::new(
        Rc::new(scheduler.clone()),
        Rc::new(scheduler.clock()),
        view,
    );
    (scheduler, session)
}

fn headless_session() -> (VirtualScheduler, Session) {
    session_with_view(Rc::new(NullView))
}

/// Steps simulated time in small increments, recording each phase change.
fn run_collecting_phases(scheduler: &VirtualScheduler, session: &Session) -> Vec<Phase> {
    let mut phases = vec![session.phase()];
    for _ in 0..200_000 {
        scheduler.advance(10.0);
        let phase = session.phase();
        if phase != *phases.last().unwrap() {
            phases.push(phase);
        }
        if phase == Phase::Finished {
            break;
        }
    }
    phases
}

#[test]
fn default_run_walks_the_full_lifecycle() {
    let (scheduler, mut session) = headless_session();
    assert_eq!(session.phase(), Phase::Idle);
    session.start().unwrap();
    let phases = run_collecting_phases(&scheduler, &session);
    assert_eq!(
        phases,
        vec![
            Phase::Winding,
            Phase::Detached,
            Phase::Decelerating,
            Phase::Finished,
        ]
    );
}

#[test]
fn results_are_reproducible_across_runs() {
    let (scheduler_a, mut session_a) = headless_session();
    session_a.start().unwrap();
    scheduler_a.run_until_idle();

    let (scheduler_b, mut session_b) = headless_session();
    session_b.start().unwrap();
    scheduler_b.run_until_idle();

    assert_relative_eq!(
        session_a.lap_seconds().unwrap(),
        session_b.lap_seconds().unwrap()
    );
    assert_relative_eq!(
        session_a.observed_inertia().unwrap(),
        session_b.observed_inertia().unwrap()
    );
}

#[test]
fn lap_spans_detach_to_standstill() {
    let (scheduler, mut session) = headless_session();
    session.start().unwrap();
    scheduler.run_until_idle();

    let schedule = session.schedule().unwrap().clone();
    let total_s: f64 = schedule.slots().iter().sum::<u64>() as f64 / 1000.0;
    let wound_s = schedule.slot(0) as f64 / 1000.0;
    let lap = session.lap_seconds().unwrap();
    assert!(lap > 0.0);
    assert!(lap <= total_s - wound_s + 0.1);
    // The wrapped final rotation may shave up to a quarter slot.
    assert!(lap >= total_s - wound_s - 0.5);
}

#[test]
fn observed_inertia_matches_its_inputs() {
    let (scheduler, mut session) = headless_session();
    session.start().unwrap();
    scheduler.run_until_idle();

    let run = session.run_state();
    let expected = observed_inertia(
        session.params(),
        run.total_rotations(),
        run.lap_seconds.unwrap(),
    )
    .unwrap();
    assert_relative_eq!(session.observed_inertia().unwrap(), expected);
    assert!(expected.is_finite() && expected > 0.0);
}

#[test]
fn heavier_rings_spin_the_wheel_up_faster() {
    let light = ParametersBuilder::new().ring_mass_g(200.0).build().unwrap();
    let heavy = ParametersBuilder::new().ring_mass_g(600.0).build().unwrap();
    let (light_schedule, _) = compute_schedule(&light).unwrap();
    let (heavy_schedule, _) = compute_schedule(&heavy).unwrap();
    assert!(heavy_schedule.slot(0) < light_schedule.slot(0));
}

#[test]
fn low_gravity_slows_the_first_rotation() {
    let earth = ParametersBuilder::new()
        .environment(Environment::Earth)
        .build()
        .unwrap();
    let moon = ParametersBuilder::new()
        .environment(Environment::Moon)
        .build()
        .unwrap();
    let (earth_schedule, _) = compute_schedule(&earth).unwrap();
    let (moon_schedule, _) = compute_schedule(&moon).unwrap();
    assert!(moon_schedule.slot(0) > earth_schedule.slot(0));
}

#[test]
fn multiple_windings_extend_the_driven_phase() {
    let params = ParametersBuilder::new().winding_count(3).build().unwrap();
    let (scheduler, mut session) = headless_session();
    session.set_params(params).unwrap();
    session.start().unwrap();
    scheduler.run_until_idle();
    assert_eq!(session.phase(), Phase::Finished);
    assert!(session.run_state().rotation_index >= 3);
    assert!(session.lap_seconds().unwrap() > 0.0);
}

#[test]
fn reset_mid_run_leaves_a_clean_session() {
    let (scheduler, mut session) = headless_session();
    session.start().unwrap();
    scheduler.advance(1500.0);
    assert_eq!(session.phase(), Phase::Winding);
    session.soft_reset();
    scheduler.run_until_idle();
    assert_eq!(session.phase(), Phase::Idle);
    assert!(session.lap_seconds().is_none());

    session.start().unwrap();
    scheduler.run_until_idle();
    assert_eq!(session.phase(), Phase::Finished);
}

#[test]
fn zero_ring_mass_never_moves_the_wheel() {
    let params = ParametersBuilder::new().ring_mass_g(0.0).build().unwrap();
    let (scheduler, mut session) = headless_session();
    session.set_params(params).unwrap();
    session.start().unwrap();
    assert_eq!(session.phase(), Phase::Finished);
    scheduler.run_until_idle();
    assert!(matches!(
        session.observed_inertia(),
        Err(ExperimentError::MeasurementUnavailable(_))
    ));
}

#[test]
fn manual_timing_without_stopwatch_presses_yields_no_observation() {
    let (scheduler, mut session) = headless_session();
    assert!(!session.toggle_auto_lap_timing());
    session.start().unwrap();
    scheduler.run_until_idle();
    assert_eq!(session.phase(), Phase::Finished);
    assert!(session.lap_seconds().is_none());
    assert!(session.observed_inertia().is_err());
}

#[test]
fn controls_lock_for_the_run_and_release_at_the_end() {
    let view = Rc::new(RecordingView::new());
    let (scheduler, mut session) = session_with_view(view.clone());
    session.start().unwrap();
    scheduler.run_until_idle();
    let calls = view.calls();
    let first_toggle = calls
        .iter()
        .find_map(|call| match call {
            flywheel::ViewCall::ControlsEnabled(enabled) => Some(*enabled),
            _ => None,
        })
        .unwrap();
    let last_toggle = calls
        .iter()
        .rev()
        .find_map(|call| match call {
            flywheel::ViewCall::ControlsEnabled(enabled) => Some(*enabled),
            _ => None,
        })
        .unwrap();
    assert!(!first_toggle);
    assert!(last_toggle);
}

#[test]
fn exported_run_has_one_sample_per_slot() {
    let (scheduler, mut session) = headless_session();
    session.start().unwrap();
    scheduler.run_until_idle();

    let json = session.export_run_json().unwrap();
    let recorder = RunRecorder::from_json(&json).unwrap();
    let schedule = session.schedule().unwrap();
    assert_eq!(recorder.samples().len(), schedule.len() - 1);
    let summary = recorder.summary().unwrap();
    assert_relative_eq!(
        summary.total_rotations,
        session.run_state().total_rotations()
    );
}

#[test]
fn parameter_validation_errors_are_reported() {
    let (_, mut session) = headless_session();
    let mut params = ExperimentParameters::default();
    params.flywheel_mass_kg = 0.0;
    assert!(matches!(
        session.set_params(params),
        Err(ExperimentError::InvalidParameters(_))
    ));
}
