//! Presentation boundary for the animation chains.
//!
//! The runtime never draws anything itself; every visual effect is
//! narrated through [`ExperimentView`] so a frontend (or a test) can
//! render or record it.

use std::cell::RefCell;

/// Stage elements addressed by view calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewElement {
    /// Radial line tracking the wheel angle.
    TrackingLine,
    /// The flywheel disc itself.
    Wheel,
    /// Whole-rotation counter readout.
    DigitCounter,
    /// Hundredths-of-a-rotation counter readout.
    DecimalCounter,
    /// Remaining fall height readout.
    HeightLabel,
    /// String wound around the axle.
    CordString,
    /// Tick marks for windings still on the axle.
    WoundMarks,
    /// Ring-mass assembly hanging from the string.
    WeightAssembly,
    /// Tray the assembly lands in.
    WeightContainer,
    /// Detached thread falling after release.
    FallingThread,
}

/// Sink for the runtime's visual effects.
pub trait ExperimentView {
    fn set_display_text(&self, element: ViewElement, value: &str);
    fn set_element_position(&self, element: ViewElement, x: f64, y: f64);
    fn redraw_line(&self, element: ViewElement, offset: f64);
    fn set_visible(&self, element: ViewElement, visible: bool);
    fn set_controls_enabled(&self, enabled: bool);
}

/// View that ignores everything, for headless runs.
#[derive(Default)]
pub struct NullView;

impl ExperimentView for NullView {
    fn set_display_text(&self, _element: ViewElement, _value: &str) {}
    fn set_element_position(&self, _element: ViewElement, _x: f64, _y: f64) {}
    fn redraw_line(&self, _element: ViewElement, _offset: f64) {}
    fn set_visible(&self, _element: ViewElement, _visible: bool) {}
    fn set_controls_enabled(&self, _enabled: bool) {}
}

/// One recorded view call.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewCall {
    DisplayText(ViewElement, String),
    ElementPosition(ViewElement, f64, f64),
    RedrawLine(ViewElement, f64),
    Visible(ViewElement, bool),
    ControlsEnabled(bool),
}

/// View that records every call, for assertions in tests.
#[derive(Default)]
pub struct RecordingView {
    calls: RefCell<Vec<ViewCall>>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ViewCall> {
        self.calls.borrow().clone()
    }

    pub fn count_matching(&self, pred: impl Fn(&ViewCall) -> bool) -> usize {
        self.calls.borrow().iter().filter(|call| pred(call)).count()
    }
}

impl ExperimentView for RecordingView {
    fn set_display_text(&self, element: ViewElement, value: &str) {
        self.calls
            .borrow_mut()
            .push(ViewCall::DisplayText(element, value.to_owned()));
    }

    fn set_element_position(&self, element: ViewElement, x: f64, y: f64) {
        self.calls
            .borrow_mut()
            .push(ViewCall::ElementPosition(element, x, y));
    }

    fn redraw_line(&self, element: ViewElement, offset: f64) {
        self.calls
            .borrow_mut()
            .push(ViewCall::RedrawLine(element, offset));
    }

    fn set_visible(&self, element: ViewElement, visible: bool) {
        self.calls
            .borrow_mut()
            .push(ViewCall::Visible(element, visible));
    }

    fn set_controls_enabled(&self, enabled: bool) {
        self.calls
            .borrow_mut()
            .push(ViewCall::ControlsEnabled(enabled));
    }
}
