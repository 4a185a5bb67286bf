//! Cooperative task scheduling for the animation chains.
//!
//! Every animation stage runs as a scheduled callback, so the whole
//! experiment advances on a single thread with no shared-state locking.
//! [`VirtualScheduler`] executes tasks against a simulated clock, which
//! makes long runs finish instantly and keeps tests deterministic.

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::rc::Rc;

use crate::clock::Clock;

/// Handle to a scheduled task, used for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

/// Deadline-based task executor.
///
/// Implementations take `&self`; schedulers are shared behind `Rc` and
/// callbacks schedule further tasks while one is being run.
pub trait TaskScheduler {
    /// Runs `callback` once after `delay_ms`.
    fn schedule_once(&self, delay_ms: f64, callback: Box<dyn FnMut()>) -> TaskId;

    /// Runs `callback` every `interval_ms` until cancelled.
    fn schedule_repeating(&self, interval_ms: f64, callback: Box<dyn FnMut()>) -> TaskId;

    /// Drops a pending task. Unknown ids are ignored.
    fn cancel(&self, id: TaskId);
}

/// Shared cancellation flag checked at the top of every chained callback.
///
/// Cancelling does not remove queued tasks; stale callbacks observe the
/// flag and return without doing work or rescheduling.
#[derive(Clone, Default)]
pub struct CancelToken {
    cancelled: Rc<Cell<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

enum TaskKind {
    Once(Box<dyn FnMut()>),
    Repeating { interval_ms: f64, callback: Box<dyn FnMut()> },
}

struct Entry {
    due_ms: f64,
    seq: u64,
    id: u64,
    kind: TaskKind,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // Reversed so the max-heap pops the earliest deadline; ties run in
    // submission order.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due_ms
            .total_cmp(&self.due_ms)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct Inner {
    now_ms: f64,
    next_id: u64,
    next_seq: u64,
    queue: BinaryHeap<Entry>,
    cancelled: HashSet<u64>,
}

/// Simulated-time scheduler.
///
/// Time only moves when tasks are drained; each callback observes
/// `now_ms()` equal to its own deadline.
#[derive(Clone)]
pub struct VirtualScheduler {
    inner: Rc<RefCell<Inner>>,
}

/// Default drain budget before `run_until_idle` gives up.
const MAX_DRAIN_TASKS: usize = 10_000_000;

impl VirtualScheduler {
    pub fn new() -> Self {
        VirtualScheduler {
            inner: Rc::new(RefCell::new(Inner {
                now_ms: 0.0,
                next_id: 0,
                next_seq: 0,
                queue: BinaryHeap::new(),
                cancelled: HashSet::new(),
            })),
        }
    }

    /// Current simulated time in milliseconds.
    pub fn now_ms(&self) -> f64 {
        self.inner.borrow().now_ms
    }

    /// A [`Clock`] view over the simulated time, for wiring up stopwatches.
    pub fn clock(&self) -> VirtualClock {
        VirtualClock {
            inner: Rc::clone(&self.inner),
        }
    }

    pub fn pending_tasks(&self) -> usize {
        let inner = self.inner.borrow();
        inner.queue.len() - inner.cancelled.len().min(inner.queue.len())
    }

    fn push(&self, delay_ms: f64, kind: TaskKind) -> TaskId {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        let seq = inner.next_seq;
        inner.next_seq += 1;
        let due_ms = inner.now_ms + delay_ms.max(0.0);
        inner.queue.push(Entry {
            due_ms,
            seq,
            id,
            kind,
        });
        TaskId(id)
    }

    /// Pops and runs the earliest pending task. Returns false when the
    /// queue is empty.
    fn run_next(&self) -> bool {
        loop {
            let entry = {
                let mut inner = self.inner.borrow_mut();
                match inner.queue.pop() {
                    Some(entry) => {
                        if inner.cancelled.remove(&entry.id) {
                            continue;
                        }
                        inner.now_ms = inner.now_ms.max(entry.due_ms);
                        entry
                    }
                    None => return false,
                }
            };
            match entry.kind {
                TaskKind::Once(mut callback) => callback(),
                TaskKind::Repeating {
                    interval_ms,
                    mut callback,
                } => {
                    callback();
                    let mut inner = self.inner.borrow_mut();
                    if !inner.cancelled.remove(&entry.id) {
                        let seq = inner.next_seq;
                        inner.next_seq += 1;
                        let due_ms = entry.due_ms + interval_ms.max(1.0);
                        inner.queue.push(Entry {
                            due_ms,
                            seq,
                            id: entry.id,
                            kind: TaskKind::Repeating {
                                interval_ms,
                                callback,
                            },
                        });
                    }
                }
            }
            return true;
        }
    }

    /// Drains tasks due within the next `ms` of simulated time, then
    /// advances the clock to the end of the window.
    pub fn advance(&self, ms: f64) {
        let deadline = self.now_ms() + ms.max(0.0);
        loop {
            let due = {
                let inner = self.inner.borrow();
                inner.queue.peek().map(|entry| entry.due_ms)
            };
            match due {
                Some(due_ms) if due_ms <= deadline => {
                    self.run_next();
                }
                _ => break,
            }
        }
        let mut inner = self.inner.borrow_mut();
        inner.now_ms = inner.now_ms.max(deadline);
    }

    /// Drains the queue completely. Returns the number of tasks run, or
    /// stops once the drain budget is exhausted.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while ran < MAX_DRAIN_TASKS && self.run_next() {
            ran += 1;
        }
        ran
    }
}

impl Default for VirtualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskScheduler for VirtualScheduler {
    fn schedule_once(&self, delay_ms: f64, callback: Box<dyn FnMut()>) -> TaskId {
        self.push(delay_ms, TaskKind::Once(callback))
    }

    fn schedule_repeating(&self, interval_ms: f64, callback: Box<dyn FnMut()>) -> TaskId {
        self.push(
            interval_ms.max(1.0),
            TaskKind::Repeating {
                interval_ms,
                callback,
            },
        )
    }

    fn cancel(&self, id: TaskId) {
        let mut inner = self.inner.borrow_mut();
        inner.cancelled.insert(id.0);
    }
}

/// [`Clock`] backed by a [`VirtualScheduler`]'s simulated time.
#[derive(Clone)]
pub struct VirtualClock {
    inner: Rc<RefCell<Inner>>,
}

impl Clock for VirtualClock {
    fn now_ms(&self) -> f64 {
        self.inner.borrow().now_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(log: &Rc<RefCell<Vec<u32>>>, tag: u32) -> Box<dyn FnMut()> {
        let log = Rc::clone(log);
        Box::new(move || log.borrow_mut().push(tag))
    }

    #[test]
    fn tasks_run_in_deadline_order() {
        let sched = VirtualScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        sched.schedule_once(300.0, record(&log, 3));
        sched.schedule_once(100.0, record(&log, 1));
        sched.schedule_once(200.0, record(&log, 2));
        sched.run_until_idle();
        assert_eq!(*log.borrow(), vec![1, 2, 3]);
        assert_eq!(sched.now_ms(), 300.0);
    }

    #[test]
    fn ties_run_in_submission_order() {
        let sched = VirtualScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for tag in 0..5 {
            sched.schedule_once(50.0, record(&log, tag));
        }
        sched.run_until_idle();
        assert_eq!(*log.borrow(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn cancelled_tasks_do_not_run() {
        let sched = VirtualScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let id = sched.schedule_once(100.0, record(&log, 1));
        sched.schedule_once(200.0, record(&log, 2));
        sched.cancel(id);
        sched.run_until_idle();
        assert_eq!(*log.borrow(), vec![2]);
    }

    #[test]
    fn repeating_task_fires_until_cancelled() {
        let sched = VirtualScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let id = sched.schedule_repeating(30.0, record(&log, 7));
        sched.advance(95.0);
        assert_eq!(log.borrow().len(), 3);
        sched.cancel(id);
        sched.advance(1000.0);
        assert_eq!(log.borrow().len(), 3);
    }

    #[test]
    fn callbacks_observe_their_own_deadline() {
        let sched = VirtualScheduler::new();
        let seen = Rc::new(Cell::new(0.0));
        let clock = sched.clock();
        let seen2 = Rc::clone(&seen);
        sched.schedule_once(250.0, Box::new(move || seen2.set(clock.now_ms())));
        sched.run_until_idle();
        assert_eq!(seen.get(), 250.0);
    }

    #[test]
    fn callbacks_can_schedule_further_tasks() {
        let sched = VirtualScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let inner_log = Rc::clone(&log);
        let sched2 = sched.clone();
        sched.schedule_once(10.0, Box::new(move || {
            inner_log.borrow_mut().push(1);
            let inner_log = Rc::clone(&inner_log);
            sched2.schedule_once(10.0, Box::new(move || inner_log.borrow_mut().push(2)));
        }));
        sched.run_until_idle();
        assert_eq!(*log.borrow(), vec![1, 2]);
        assert_eq!(sched.now_ms(), 20.0);
    }

    #[test]
    fn advance_stops_at_the_window_edge() {
        let sched = VirtualScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        sched.schedule_once(100.0, record(&log, 1));
        sched.schedule_once(500.0, record(&log, 2));
        sched.advance(200.0);
        assert_eq!(*log.borrow(), vec![1]);
        assert_eq!(sched.now_ms(), 200.0);
        sched.advance(300.0);
        assert_eq!(*log.borrow(), vec![1, 2]);
    }

    #[test]
    fn cancel_from_inside_a_repeating_callback_stops_it() {
        let sched = VirtualScheduler::new();
        let count = Rc::new(Cell::new(0u32));
        let id_slot: Rc<Cell<Option<TaskId>>> = Rc::new(Cell::new(None));
        let count2 = Rc::clone(&count);
        let id_slot2 = Rc::clone(&id_slot);
        let sched2 = sched.clone();
        let id = sched.schedule_repeating(30.0, Box::new(move || {
            count2.set(count2.get() + 1);
            if count2.get() == 4 {
                if let Some(id) = id_slot2.get() {
                    sched2.cancel(id);
                }
            }
        }));
        id_slot.set(Some(id));
        sched.run_until_idle();
        assert_eq!(count.get(), 4);
    }
}
