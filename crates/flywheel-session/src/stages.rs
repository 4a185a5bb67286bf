//! Animation stage chains driving one experiment run.
//!
//! A run is a web of short scheduled callbacks rather than a loop: the
//! rotation chain advances the wheel one rotation per callback pair, and
//! the digit, string-release and thread-fall sub-chains tick alongside
//! it. All chains share one [`RunContext`] and one [`CancelToken`];
//! cancelling the token makes every stale callback a silent no-op.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use flywheel_engine::observed_inertia;
use flywheel_model::{ExperimentParameters, Phase, PhysicsDerived, RotationSchedule, RunState};

use crate::clock::Clock;
use crate::recorder::{RunRecorder, RunSummary};
use crate::stopwatch::Stopwatch;
use crate::timer::{CancelToken, TaskId, TaskScheduler};
use crate::view::{ExperimentView, ViewElement};

/// Thread-fall animation cadence (ms per frame).
const THREAD_FALL_INTERVAL_MS: f64 = 30.0;
/// Thread-fall frame count before the wheel is declared freewheeling.
const THREAD_FALL_TICKS: u32 = 21;
/// Horizontal shift per thread-fall frame (px).
const THREAD_FRAME_WIDTH_PX: f64 = 199.869;
/// String-release iterations per winding.
const STRING_RELEASE_ITERATIONS: u32 = 100;
/// String drift per release iteration (px).
const STRING_X_STEP: f64 = 0.03;
/// Weight assembly drop per released winding (px).
const WEIGHT_DROP_STEP_Y: f64 = 30.0;
const WEIGHT_DROP_STEP_X: f64 = -3.0;
/// Tracking line sweep extent and rest position (deg).
const LINE_SWEEP_DEG: f64 = 270.0;
const LINE_RESET_DEG: f64 = -90.0;
/// Sub-rotation ticks per full rotation.
const DIGIT_DIVISOR: f64 = 100.0;
/// Friction-only deceleration assumed when no ring mass is loaded (deg/s²).
const FALLBACK_DECEL_DEG: f64 = -10.0;

/// Everything the chains of one run share.
///
/// Created by the session at start and dropped when the run ends or is
/// reset; `Cell` fields are chain-local scratch the run state does not
/// need to expose.
pub(crate) struct RunContext {
    pub params: ExperimentParameters,
    pub derived: PhysicsDerived,
    pub schedule: Rc<RotationSchedule>,
    pub run: Rc<RefCell<RunState>>,
    pub stopwatch: Rc<RefCell<Stopwatch>>,
    pub scheduler: Rc<dyn TaskScheduler>,
    pub clock: Rc<dyn Clock>,
    pub view: Rc<dyn ExperimentView>,
    pub recorder: Rc<RefCell<RunRecorder>>,
    pub cancel: CancelToken,
    pub auto_lap: bool,
    rotation_speed_ms: Cell<f64>,
    string_interval_ms: Cell<f64>,
    string_iteration: Cell<u32>,
    string_x_offset: Cell<f64>,
    string_task: Cell<Option<TaskId>>,
    thread_task: Cell<Option<TaskId>>,
    thread_ticks: Cell<u32>,
    stopwatch_armed: Cell<bool>,
}

impl RunContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        params: ExperimentParameters,
        derived: PhysicsDerived,
        schedule: Rc<RotationSchedule>,
        run: Rc<RefCell<RunState>>,
        stopwatch: Rc<RefCell<Stopwatch>>,
        scheduler: Rc<dyn TaskScheduler>,
        clock: Rc<dyn Clock>,
        view: Rc<dyn ExperimentView>,
        recorder: Rc<RefCell<RunRecorder>>,
        auto_lap: bool,
    ) -> Self {
        RunContext {
            params,
            derived,
            schedule,
            run,
            stopwatch,
            scheduler,
            clock,
            view,
            recorder,
            cancel: CancelToken::new(),
            auto_lap,
            rotation_speed_ms: Cell::new(0.0),
            string_interval_ms: Cell::new(0.0),
            string_iteration: Cell::new(0),
            string_x_offset: Cell::new(0.0),
            string_task: Cell::new(None),
            thread_task: Cell::new(None),
            thread_ticks: Cell::new(0),
            stopwatch_armed: Cell::new(false),
        }
    }

    /// Cancels the token and any repeating or pending tagged tasks.
    pub fn abort(&self) {
        self.cancel.cancel();
        if let Some(id) = self.thread_task.take() {
            self.scheduler.cancel(id);
        }
        if let Some(id) = self.string_task.take() {
            self.scheduler.cancel(id);
        }
    }
}

/// Completion events of the rotation chain.
#[derive(Clone, Copy)]
enum SpinStage {
    /// Three-quarter sweep of the tracking line finished.
    SweepDone,
    /// Quarter-turn reset finished; one full rotation is complete.
    RotationDone,
    /// Sweep of the final partial rotation finished (angle beyond 270°).
    FinalSweepDone,
    /// Remainder of the wrapped final rotation finished.
    FinalTailDone { final_offset_deg: f64 },
    /// Direct final rotation (angle at most 270°) finished.
    FinalDirectDone,
}

/// Kicks off all chains for a freshly scheduled run.
pub(crate) fn start_run(ctx: &Rc<RunContext>) {
    let slot0 = ctx.schedule.slot(0) as f64;
    ctx.rotation_speed_ms.set(slot0 / 4.0);
    ctx.string_interval_ms.set(slot0 / 200.0);
    ctx.view.set_controls_enabled(false);
    ctx.view
        .redraw_line(ViewElement::WoundMarks, f64::from(ctx.params.winding_count));
    ctx.view.set_visible(ViewElement::CordString, true);
    schedule_spin(ctx, SpinStage::SweepDone, ctx.rotation_speed_ms.get() * 3.0);
    digit_tick(ctx);
    schedule_string_tick(ctx);
    log::debug!(
        "run started: {} slots, first rotation {} ms",
        ctx.schedule.len(),
        ctx.schedule.slot(0)
    );
}

fn schedule_spin(ctx: &Rc<RunContext>, stage: SpinStage, delay_ms: f64) {
    let ctx2 = Rc::clone(ctx);
    ctx.scheduler.schedule_once(
        delay_ms,
        Box::new(move || {
            if ctx2.cancel.is_cancelled() {
                return;
            }
            dispatch_spin(&ctx2, stage);
        }),
    );
}

fn dispatch_spin(ctx: &Rc<RunContext>, stage: SpinStage) {
    match stage {
        SpinStage::SweepDone => {
            ctx.view.redraw_line(ViewElement::TrackingLine, LINE_SWEEP_DEG);
            ctx.view.redraw_line(ViewElement::TrackingLine, LINE_RESET_DEG);
            schedule_spin(ctx, SpinStage::RotationDone, ctx.rotation_speed_ms.get());
        }
        SpinStage::RotationDone => rotation_done(ctx),
        SpinStage::FinalSweepDone => {
            ctx.view.redraw_line(ViewElement::TrackingLine, LINE_RESET_DEG);
            let final_offset_deg = ctx.schedule.final_angle_deg() - LINE_SWEEP_DEG;
            let tail_ms = final_offset_deg * ctx.rotation_speed_ms.get() / 90.0;
            schedule_spin(ctx, SpinStage::FinalTailDone { final_offset_deg }, tail_ms);
        }
        SpinStage::FinalTailDone { final_offset_deg } => {
            ctx.view
                .redraw_line(ViewElement::TrackingLine, LINE_RESET_DEG + final_offset_deg);
            finish_run(ctx);
        }
        SpinStage::FinalDirectDone => {
            ctx.view.redraw_line(
                ViewElement::TrackingLine,
                LINE_RESET_DEG + ctx.schedule.final_angle_deg(),
            );
            finish_run(ctx);
        }
    }
}

/// One full rotation has completed.
fn rotation_done(ctx: &Rc<RunContext>) {
    let winding = ctx.params.winding_count as usize;
    let rotation = {
        let mut run = ctx.run.borrow_mut();
        run.rotation_index += 1;
        run.sub_rotation = 0;
        run.rotation_index
    };
    ctx.recorder
        .borrow_mut()
        .record_rotation(rotation, ctx.clock.now_ms());
    ctx.view
        .set_display_text(ViewElement::DigitCounter, &format!("{rotation:03}"));

    if rotation < winding {
        // another winding leaves the axle
        ctx.view
            .redraw_line(ViewElement::WoundMarks, (winding - rotation) as f64);
        ctx.view.set_element_position(
            ViewElement::WeightAssembly,
            WEIGHT_DROP_STEP_X * rotation as f64,
            WEIGHT_DROP_STEP_Y * rotation as f64,
        );
        restart_string_chain(ctx, rotation);
    } else if rotation == winding {
        detach(ctx);
    }

    if rotation < ctx.schedule.len() - 1 {
        let speed = ctx.schedule.slot(rotation) as f64 / 4.0;
        ctx.rotation_speed_ms.set(speed);
        schedule_spin(ctx, SpinStage::SweepDone, speed * 3.0);
    } else {
        begin_final_rotation(ctx, rotation);
    }
}

/// The deceleration tail has been reached; route to the fraction-sized
/// final rotation, or straight to finish when the wheel stops on a grid
/// point.
fn begin_final_rotation(ctx: &Rc<RunContext>, rotation: usize) {
    ctx.run.borrow_mut().final_rotation = true;
    if ctx.schedule.final_rotation_fraction() == 0 {
        finish_run(ctx);
        return;
    }
    let slot = ctx.schedule.slot(rotation) as f64;
    let speed = slot / 4.0;
    ctx.rotation_speed_ms.set(speed);
    if ctx.schedule.final_angle_deg() > LINE_SWEEP_DEG {
        schedule_spin(ctx, SpinStage::FinalSweepDone, speed * 3.0);
    } else {
        schedule_spin(ctx, SpinStage::FinalDirectDone, slot);
    }
}

/// The cord has fully unwound; the weight assembly separates.
fn detach(ctx: &Rc<RunContext>) {
    ctx.run.borrow_mut().phase = Phase::Detached;
    if let Some(id) = ctx.string_task.take() {
        ctx.scheduler.cancel(id);
    }
    ctx.view.redraw_line(ViewElement::WoundMarks, 0.0);
    ctx.view.set_visible(ViewElement::CordString, false);
    ctx.view.set_visible(ViewElement::WeightContainer, false);
    ctx.view.set_visible(ViewElement::FallingThread, true);
    start_thread_fall(ctx);
    log::debug!("weight detached after {} rotations", ctx.params.winding_count);
}

/// Sub-rotation counter tick. Reschedules itself; the interval follows
/// the current rotation speed, switching to the final-fraction divisor
/// during a direct final rotation.
fn digit_tick(ctx: &Rc<RunContext>) {
    let winding = ctx.params.winding_count as usize;
    let (rotation, sub, final_rotation) = {
        let mut run = ctx.run.borrow_mut();
        run.sub_rotation = if run.sub_rotation < 99 {
            run.sub_rotation + 1
        } else {
            0
        };
        (run.rotation_index, run.sub_rotation, run.final_rotation)
    };
    ctx.view
        .set_display_text(ViewElement::DecimalCounter, &format!("{sub:02}"));
    if rotation < winding {
        let height = ctx.run.borrow().remaining_height_cm(ctx.params.winding_count);
        ctx.view
            .set_display_text(ViewElement::HeightLabel, &format!("{height:.1}cm"));
    } else if !ctx.stopwatch_armed.get() {
        ctx.stopwatch_armed.set(true);
        ctx.view.set_display_text(ViewElement::HeightLabel, "0.0cm");
        if ctx.auto_lap {
            ctx.stopwatch.borrow_mut().start();
            log::debug!("stopwatch armed at weight release");
        }
    }

    let mut divisor = DIGIT_DIVISOR;
    if final_rotation && ctx.schedule.final_angle_deg() <= LINE_SWEEP_DEG {
        divisor = f64::from(ctx.schedule.final_rotation_fraction().max(1));
        ctx.rotation_speed_ms
            .set(ctx.schedule.slot(rotation) as f64 / 4.0);
    }
    let interval_ms = ctx.rotation_speed_ms.get() * 4.0 / divisor;
    let ctx2 = Rc::clone(ctx);
    ctx.scheduler.schedule_once(
        interval_ms,
        Box::new(move || {
            if ctx2.cancel.is_cancelled() {
                return;
            }
            digit_tick(&ctx2);
        }),
    );
}

/// Restarts the string-release sub-chain for the winding that begins at
/// `rotation`.
fn restart_string_chain(ctx: &Rc<RunContext>, rotation: usize) {
    if let Some(id) = ctx.string_task.take() {
        ctx.scheduler.cancel(id);
    }
    ctx.string_iteration.set(0);
    ctx.string_x_offset.set(0.0);
    ctx.string_interval_ms
        .set(ctx.schedule.slot(rotation) as f64 / 200.0);
    schedule_string_tick(ctx);
}

fn schedule_string_tick(ctx: &Rc<RunContext>) {
    let ctx2 = Rc::clone(ctx);
    let id = ctx.scheduler.schedule_once(
        ctx.string_interval_ms.get(),
        Box::new(move || {
            if ctx2.cancel.is_cancelled() {
                return;
            }
            string_tick(&ctx2);
        }),
    );
    ctx.string_task.set(Some(id));
}

/// One iteration of string pay-out; 100 iterations span one winding.
fn string_tick(ctx: &Rc<RunContext>) {
    let iteration = ctx.string_iteration.get() + 1;
    ctx.string_iteration.set(iteration);
    let offset = ctx.string_x_offset.get() + STRING_X_STEP;
    ctx.string_x_offset.set(offset);
    ctx.view.redraw_line(ViewElement::CordString, offset);

    let winding = ctx.params.winding_count as usize;
    if iteration != STRING_RELEASE_ITERATIONS && ctx.run.borrow().rotation_index < winding {
        schedule_string_tick(ctx);
    } else {
        ctx.string_iteration.set(0);
        ctx.string_task.set(None);
    }
}

/// Repeating thread-fall frames after detach; after the last frame the
/// wheel is freewheeling and the post-detach deceleration is recorded.
fn start_thread_fall(ctx: &Rc<RunContext>) {
    ctx.thread_ticks.set(0);
    let ctx2 = Rc::clone(ctx);
    let id = ctx.scheduler.schedule_repeating(
        THREAD_FALL_INTERVAL_MS,
        Box::new(move || {
            if ctx2.cancel.is_cancelled() {
                if let Some(id) = ctx2.thread_task.take() {
                    ctx2.scheduler.cancel(id);
                }
                return;
            }
            let ticks = ctx2.thread_ticks.get() + 1;
            ctx2.thread_ticks.set(ticks);
            if ticks <= THREAD_FALL_TICKS {
                ctx2.view.set_element_position(
                    ViewElement::FallingThread,
                    -(f64::from(ticks)) * THREAD_FRAME_WIDTH_PX,
                    0.0,
                );
            } else {
                if let Some(id) = ctx2.thread_task.take() {
                    ctx2.scheduler.cancel(id);
                }
                ctx2.view.set_visible(ViewElement::FallingThread, false);
                let mut run = ctx2.run.borrow_mut();
                run.phase = Phase::Decelerating;
                run.decel_accel_deg = Some(if ctx2.params.ring_mass_g > 0.0 {
                    ctx2.derived.angular_accel_deg
                } else {
                    FALLBACK_DECEL_DEG
                });
            }
        }),
    );
    ctx.thread_task.set(Some(id));
}

/// The wheel has come to rest. Captures the lap, computes the observed
/// inertia, and releases the controls.
fn finish_run(ctx: &Rc<RunContext>) {
    ctx.abort();
    {
        let mut watch = ctx.stopwatch.borrow_mut();
        if ctx.auto_lap {
            watch.pause();
        }
        let lap = watch.elapsed_seconds();
        let mut run = ctx.run.borrow_mut();
        run.phase = Phase::Finished;
        let total = run.total_rotations();
        run.lap_seconds = (lap > 0.0).then_some(lap);
        run.observed_inertia = match run.lap_seconds {
            Some(lap) => observed_inertia(&ctx.params, total, lap).ok(),
            None => None,
        };
    }
    let run = ctx.run.borrow();
    ctx.recorder.borrow_mut().record_summary(RunSummary {
        total_rotations: run.total_rotations(),
        lap_seconds: run.lap_seconds,
        observed_inertia: run.observed_inertia,
    });
    ctx.view.set_controls_enabled(true);
    log::info!(
        "run finished: {:.2} rotations, lap {:?} s",
        run.total_rotations(),
        run.lap_seconds
    );
}
