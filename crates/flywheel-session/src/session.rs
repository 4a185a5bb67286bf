//! Session controller tying parameters, scheduler, chains and view together.

use std::cell::RefCell;
use std::rc::Rc;

use flywheel_engine::{compute_schedule, observed_inertia, theoretical_inertia};
use flywheel_model::{
    ExperimentError, ExperimentParameters, Phase, PhysicsDerived, Result, RotationSchedule,
    RunState,
};

use crate::clock::Clock;
use crate::recorder::RunRecorder;
use crate::stages::{self, RunContext};
use crate::stopwatch::Stopwatch;
use crate::timer::TaskScheduler;
use crate::view::{ExperimentView, ViewElement};

/// One experiment session.
///
/// Owns the parameters, the run state and the stopwatch, and drives runs
/// through the animation chains. Single-threaded by construction: the
/// session, the scheduler and the chains all live on one thread and hand
/// control to each other through scheduled callbacks.
pub struct Session {
    params: ExperimentParameters,
    derived: PhysicsDerived,
    schedule: Option<Rc<RotationSchedule>>,
    run: Rc<RefCell<RunState>>,
    stopwatch: Rc<RefCell<Stopwatch>>,
    scheduler: Rc<dyn TaskScheduler>,
    clock: Rc<dyn Clock>,
    view: Rc<dyn ExperimentView>,
    recorder: Rc<RefCell<RunRecorder>>,
    active: Option<Rc<RunContext>>,
    auto_lap_timing: bool,
}

impl Session {
    /// Creates a session with factory-default parameters.
    pub fn new(
        scheduler: Rc<dyn TaskScheduler>,
        clock: Rc<dyn Clock>,
        view: Rc<dyn ExperimentView>,
    ) -> Self {
        let params = ExperimentParameters::default();
        let derived = PhysicsDerived::from_params(&params);
        let stopwatch = Stopwatch::new(Rc::clone(&clock));
        Session {
            params,
            derived,
            schedule: None,
            run: Rc::new(RefCell::new(RunState::new())),
            stopwatch: Rc::new(RefCell::new(stopwatch)),
            scheduler,
            clock,
            view,
            recorder: Rc::new(RefCell::new(RunRecorder::new())),
            active: None,
            auto_lap_timing: true,
        }
    }

    pub fn params(&self) -> &ExperimentParameters {
        &self.params
    }

    pub fn derived(&self) -> &PhysicsDerived {
        &self.derived
    }

    pub fn phase(&self) -> Phase {
        self.run.borrow().phase
    }

    pub fn is_running(&self) -> bool {
        matches!(
            self.phase(),
            Phase::Winding | Phase::Detached | Phase::Decelerating
        )
    }

    pub fn run_state(&self) -> RunState {
        self.run.borrow().clone()
    }

    pub fn schedule(&self) -> Option<&RotationSchedule> {
        self.schedule.as_deref()
    }

    pub fn auto_lap_timing(&self) -> bool {
        self.auto_lap_timing
    }

    /// Replaces the experiment parameters. Rejected while a run is in
    /// flight; the apparatus controls are locked then.
    pub fn set_params(&mut self, params: ExperimentParameters) -> Result<()> {
        if self.is_running() {
            return Err(ExperimentError::InvalidParameters(
                "parameters are locked while a run is in progress".into(),
            ));
        }
        params.validate()?;
        self.derived = PhysicsDerived::from_params(&params);
        self.params = params;
        Ok(())
    }

    /// Computes the schedule for the current parameters and starts the
    /// animation chains.
    ///
    /// With no driving torque the wheel never moves: the run completes
    /// immediately with no lap and no observed inertia.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Err(ExperimentError::InvalidParameters(
                "a run is already in progress".into(),
            ));
        }
        let (schedule, derived) = compute_schedule(&self.params)?;
        self.derived = derived;
        *self.run.borrow_mut() = RunState::new();
        self.recorder.borrow_mut().clear();
        if self.auto_lap_timing {
            self.stopwatch.borrow_mut().reset();
        }

        let schedule = Rc::new(schedule);
        self.schedule = Some(Rc::clone(&schedule));
        if schedule.is_empty() {
            self.active = None;
            self.run.borrow_mut().phase = Phase::Finished;
            log::warn!("no driving torque; the wheel never starts");
            return Ok(());
        }

        self.run.borrow_mut().phase = Phase::Winding;
        let ctx = Rc::new(RunContext::new(
            self.params,
            self.derived,
            schedule,
            Rc::clone(&self.run),
            Rc::clone(&self.stopwatch),
            Rc::clone(&self.scheduler),
            Rc::clone(&self.clock),
            Rc::clone(&self.view),
            Rc::clone(&self.recorder),
            self.auto_lap_timing,
        ));
        stages::start_run(&ctx);
        self.active = Some(ctx);
        Ok(())
    }

    /// Aborts any run in flight and restores the idle state, keeping the
    /// current parameters.
    pub fn soft_reset(&mut self) {
        if let Some(ctx) = self.active.take() {
            ctx.abort();
        }
        *self.run.borrow_mut() = RunState::new();
        self.stopwatch.borrow_mut().reset();
        self.recorder.borrow_mut().clear();
        self.schedule = None;
        self.restore_baseline();
        log::debug!("session reset");
    }

    /// Aborts any run in flight and restores factory-default parameters.
    pub fn hard_reset(&mut self) {
        self.params = ExperimentParameters::default();
        self.derived = PhysicsDerived::from_params(&self.params);
        self.soft_reset();
    }

    /// Flips automatic lap timing. Disabled while a run is in flight;
    /// toggling resets the stopwatch so modes never mix measurements.
    pub fn toggle_auto_lap_timing(&mut self) -> bool {
        if !self.is_running() {
            self.auto_lap_timing = !self.auto_lap_timing;
            self.stopwatch.borrow_mut().reset();
        }
        self.auto_lap_timing
    }

    /// Manual stopwatch control; ignored while automatic lap timing is on.
    pub fn start_stopwatch(&mut self) {
        if !self.auto_lap_timing {
            self.stopwatch.borrow_mut().start();
        }
    }

    pub fn pause_stopwatch(&mut self) {
        if !self.auto_lap_timing {
            self.stopwatch.borrow_mut().pause();
        }
    }

    pub fn reset_stopwatch(&mut self) {
        if !self.auto_lap_timing {
            self.stopwatch.borrow_mut().reset();
        }
    }

    pub fn stopwatch_elapsed_seconds(&self) -> f64 {
        self.stopwatch.borrow().elapsed_seconds()
    }

    pub fn theoretical_inertia(&self) -> f64 {
        theoretical_inertia(&self.params)
    }

    /// The observed moment of inertia of the finished run.
    pub fn observed_inertia(&self) -> Result<f64> {
        let run = self.run.borrow();
        if run.phase != Phase::Finished {
            return Err(ExperimentError::MeasurementUnavailable(
                "the run has not finished".into(),
            ));
        }
        match run.observed_inertia {
            Some(value) => Ok(value),
            // Recompute to surface the reason the value is missing.
            None => observed_inertia(
                &self.params,
                run.total_rotations(),
                run.lap_seconds.unwrap_or(0.0),
            ),
        }
    }

    pub fn lap_seconds(&self) -> Option<f64> {
        self.run.borrow().lap_seconds
    }

    /// JSON export of the recorded run.
    pub fn export_run_json(&self) -> serde_json::Result<String> {
        self.recorder.borrow().to_json()
    }

    fn restore_baseline(&self) {
        let view = &self.view;
        view.set_display_text(ViewElement::DigitCounter, "000");
        view.set_display_text(ViewElement::DecimalCounter, "00");
        view.set_display_text(
            ViewElement::HeightLabel,
            &format!("{:02}cm", self.params.winding_count * 2),
        );
        view.redraw_line(ViewElement::TrackingLine, -90.0);
        view.redraw_line(ViewElement::WoundMarks, f64::from(self.params.winding_count));
        view.set_element_position(ViewElement::WeightAssembly, 0.0, 0.0);
        view.set_visible(ViewElement::CordString, true);
        view.set_visible(ViewElement::WeightContainer, true);
        view.set_visible(ViewElement::FallingThread, false);
        view.set_controls_enabled(true);
    }
}
