//! Priority-ordered tick scheduler
//!
//! Each registered callback runs once per tick, highest priority first, ties
//! in registration order. A loop stops when its controller says so, when
//! one of its `refs` is found destroyed at the start of its turn, or when a
//! sequencer task finishes. Stopping destroys the loop's `kills` exactly
//! once. A stopped callback never runs again.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::destroy::{DestroyRef, Destroyable, insert_unique};
use crate::consts::PRIORITY_DEFAULT;
use crate::error::EngineError;

/// Relative slack used when snapping the clock to a multiple of a new time-scale
const CLOCK_EPSILON: f64 = 1e-6;

/// Registration options for `Scheduler::forever`
#[derive(Clone)]
pub struct LoopOptions {
    priority: i32,
    refs: Vec<DestroyRef>,
    kills: Vec<DestroyRef>,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            priority: PRIORITY_DEFAULT,
            refs: Vec::new(),
            kills: Vec::new(),
        }
    }
}

impl LoopOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Higher priorities run earlier in the frame
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Stop the loop once `target` is destroyed
    pub fn refs(mut self, target: DestroyRef) -> Self {
        insert_unique(&mut self.refs, target);
        self
    }

    /// Destroy `target` when the loop stops
    pub fn kills(mut self, target: DestroyRef) -> Self {
        insert_unique(&mut self.kills, target);
        self
    }

    /// Tie the loop's lifetime to `target` both ways
    pub fn owns(self, target: DestroyRef) -> Self {
        self.refs(target.clone()).kills(target)
    }
}

/// Per-loop state shared between the scheduler and its controller handles
struct LoopState {
    id: u64,
    stopped: Cell<bool>,
    /// Whole steps of `step_size` run so far; clock = steps * step_size
    steps: Cell<u64>,
    /// Time-scale the step count is measured in
    step_size: Cell<f32>,
    refs: Vec<DestroyRef>,
    kills: Vec<DestroyRef>,
    time_scale: Rc<Cell<f32>>,
}

impl LoopState {
    fn stop(&self) {
        if self.stopped.replace(true) {
            return;
        }
        for target in &self.kills {
            target.destroy();
        }
    }

    fn clock(&self) -> f32 {
        (self.steps.get() as f64 * self.step_size.get() as f64) as f32
    }

    /// Add one time-scale step. After a time-scale change the clock first
    /// snaps down to a whole number of steps of the new scale.
    fn advance_clock(&self) {
        let ts = self.time_scale.get();
        if ts != self.step_size.get() {
            let clock = self.steps.get() as f64 * self.step_size.get() as f64;
            self.steps.set(snap_steps(clock, ts as f64));
            self.step_size.set(ts);
        }
        self.steps.set(self.steps.get() + 1);
    }
}

/// Whole steps of `ts` in `clock`, treating near-misses as exact
fn snap_steps(clock: f64, ts: f64) -> u64 {
    let n = clock / ts;
    let nearest = n.round();
    if (n - nearest).abs() <= CLOCK_EPSILON * n.max(1.0) {
        nearest as u64
    } else {
        n.floor() as u64
    }
}

impl Destroyable for LoopState {
    fn destroy(&self) {
        self.stop();
    }

    fn is_destroyed(&self) -> bool {
        self.stopped.get()
    }
}

/// Handle to one registered loop
#[derive(Clone)]
pub struct LoopController(Rc<LoopState>);

impl LoopController {
    /// Stop the loop; its callback will not run again and its kills die now
    pub fn stop(&self) {
        self.0.stop();
    }

    pub fn is_stopped(&self) -> bool {
        self.0.stopped.get()
    }

    /// Frames this loop has run, scaled by the time-scale in effect
    pub fn clock(&self) -> f32 {
        self.0.clock()
    }

    /// Current global time-scale
    pub fn time_scale(&self) -> f32 {
        self.0.time_scale.get()
    }

    /// Registration id, unique within one scheduler
    pub fn id(&self) -> u64 {
        self.0.id
    }

    /// This loop as a destroyable, for use in another loop's refs or kills
    pub fn as_destroyable(&self) -> DestroyRef {
        self.0.clone()
    }
}

impl std::fmt::Debug for LoopController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopController")
            .field("id", &self.0.id)
            .field("stopped", &self.0.stopped.get())
            .field("clock", &self.0.clock())
            .finish()
    }
}

type LoopFn = Box<dyn FnMut(&LoopController)>;

struct Entry {
    priority: i32,
    controller: LoopController,
    callback: RefCell<LoopFn>,
}

impl Entry {
    fn run(&self) {
        let state = &self.controller.0;
        if state.stopped.get() {
            return;
        }
        if state.refs.iter().any(|r| r.is_destroyed()) {
            state.stop();
            return;
        }
        (self.callback.borrow_mut())(&self.controller);
        state.advance_clock();
    }
}

/// Ends a tick even if a callback panics: drops stopped loops, merges the
/// pending ones and clears the ticking flag
struct TickGuard<'a>(&'a Shared);

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        let shared = self.0;
        let mut entries = shared.entries.borrow_mut();
        entries.retain(|e| !e.controller.is_stopped());
        for entry in shared.pending.borrow_mut().drain(..) {
            if !entry.controller.is_stopped() {
                insert_sorted(&mut entries, entry);
            }
        }
        shared.ticking.set(false);
    }
}

struct Shared {
    /// Active loops, sorted by descending priority then registration order
    entries: RefCell<Vec<Rc<Entry>>>,
    /// Loops registered during a tick, merged in once it finishes
    pending: RefCell<Vec<Rc<Entry>>>,
    ticking: Cell<bool>,
    next_id: Cell<u64>,
    frame: Cell<u64>,
    time_scale: Rc<Cell<f32>>,
}

/// Per-frame callback registry
///
/// Cheap to clone; every clone drives the same schedule.
#[derive(Clone)]
pub struct Scheduler {
    shared: Rc<Shared>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            shared: Rc::new(Shared {
                entries: RefCell::new(Vec::new()),
                pending: RefCell::new(Vec::new()),
                ticking: Cell::new(false),
                next_id: Cell::new(0),
                frame: Cell::new(0),
                time_scale: Rc::new(Cell::new(1.0)),
            }),
        }
    }

    /// Run `callback` once per tick until stopped
    ///
    /// A loop registered from inside a tick first runs on the next tick.
    pub fn forever(
        &self,
        callback: impl FnMut(&LoopController) + 'static,
        options: LoopOptions,
    ) -> LoopController {
        let id = self.shared.next_id.get();
        self.shared.next_id.set(id + 1);

        let controller = LoopController(Rc::new(LoopState {
            id,
            stopped: Cell::new(false),
            steps: Cell::new(0),
            step_size: Cell::new(self.shared.time_scale.get()),
            refs: options.refs,
            kills: options.kills,
            time_scale: self.shared.time_scale.clone(),
        }));
        let entry = Rc::new(Entry {
            priority: options.priority,
            controller: controller.clone(),
            callback: RefCell::new(Box::new(callback)),
        });

        if self.shared.ticking.get() {
            self.shared.pending.borrow_mut().push(entry);
        } else {
            insert_sorted(&mut self.shared.entries.borrow_mut(), entry);
        }
        controller
    }

    /// Run every active loop once, in priority order
    ///
    /// Panics raised by callbacks are not caught; they unwind out of here,
    /// and loops registered before the panic still join the schedule.
    pub fn tick(&self) -> Result<(), EngineError> {
        if self.shared.ticking.replace(true) {
            return Err(EngineError::ReentrantTick);
        }
        let guard = TickGuard(&self.shared);

        let count = self.shared.entries.borrow().len();
        for i in 0..count {
            let entry = self.shared.entries.borrow()[i].clone();
            entry.run();
        }

        drop(guard);
        self.shared.frame.set(self.shared.frame.get() + 1);
        Ok(())
    }

    /// Stop every loop, destroying their kills
    pub fn stop_all(&self) {
        let entries: Vec<Rc<Entry>> = self.shared.entries.borrow().clone();
        let pending: Vec<Rc<Entry>> = self.shared.pending.borrow().clone();
        for entry in entries.iter().chain(pending.iter()) {
            entry.controller.stop();
        }
        if !self.shared.ticking.get() {
            self.shared.entries.borrow_mut().clear();
            self.shared.pending.borrow_mut().clear();
        }
    }

    /// Loops currently scheduled (stopped ones linger until the tick ends)
    pub fn len(&self) -> usize {
        self.shared.entries.borrow().len() + self.shared.pending.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ticks completed so far
    pub fn frame(&self) -> u64 {
        self.shared.frame.get()
    }

    pub fn time_scale(&self) -> f32 {
        self.shared.time_scale.get()
    }

    /// Change the global time-scale; takes effect for the next clock advance
    pub fn set_time_scale(&self, time_scale: f32) -> Result<(), EngineError> {
        if !time_scale.is_finite() || time_scale <= 0.0 {
            return Err(EngineError::InvalidTimeScale(time_scale));
        }
        self.shared.time_scale.set(time_scale);
        Ok(())
    }
}

fn insert_sorted(entries: &mut Vec<Rc<Entry>>, entry: Rc<Entry>) {
    // Ids only grow, so landing after every equal priority keeps registration order
    let idx = entries.partition_point(|e| e.priority >= entry.priority);
    entries.insert(idx, entry);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sched::Lifeline;

    fn recorder() -> Rc<RefCell<Vec<&'static str>>> {
        Rc::new(RefCell::new(Vec::new()))
    }

    #[test]
    fn test_priority_order_with_ties() {
        let sched = Scheduler::new();
        let log = recorder();
        for (name, priority) in [("low", -5), ("a", 0), ("high", 10), ("b", 0)] {
            let log = log.clone();
            sched.forever(move |_| log.borrow_mut().push(name), LoopOptions::new().priority(priority));
        }
        sched.tick().unwrap();
        assert_eq!(*log.borrow(), vec!["high", "a", "b", "low"]);
    }

    #[test]
    fn test_stop_inside_callback() {
        let sched = Scheduler::new();
        let runs = Rc::new(Cell::new(0));
        let r = runs.clone();
        sched.forever(
            move |lp| {
                r.set(r.get() + 1);
                lp.stop();
                lp.stop();
            },
            LoopOptions::new(),
        );
        for _ in 0..5 {
            sched.tick().unwrap();
        }
        assert_eq!(runs.get(), 1);
        assert!(sched.is_empty());
    }

    #[test]
    fn test_refs_stop_and_kills_destroy() {
        let sched = Scheduler::new();
        let target = Lifeline::new();
        let victim = Lifeline::new();
        let runs = Rc::new(Cell::new(0));
        let r = runs.clone();
        let lp = sched.forever(
            move |_| r.set(r.get() + 1),
            LoopOptions::new().refs(target.clone()).kills(victim.clone()),
        );
        sched.tick().unwrap();
        assert_eq!(runs.get(), 1);

        target.destroy();
        sched.tick().unwrap();
        assert_eq!(runs.get(), 1);
        assert!(lp.is_stopped());
        assert!(victim.is_destroyed());
    }

    #[test]
    fn test_owns_ties_lifetime() {
        let sched = Scheduler::new();
        let entity = Lifeline::new();
        let lp = sched.forever(|_| {}, LoopOptions::new().owns(entity.clone()));
        lp.stop();
        assert!(entity.is_destroyed());
    }

    #[test]
    fn test_registration_during_tick_runs_next_frame() {
        let sched = Scheduler::new();
        let log = recorder();
        let inner_sched = sched.clone();
        let l = log.clone();
        sched.forever(
            move |lp| {
                let l2 = l.clone();
                inner_sched.forever(move |_| l2.borrow_mut().push("child"), LoopOptions::new().priority(100));
                lp.stop();
            },
            LoopOptions::new(),
        );
        sched.tick().unwrap();
        assert!(log.borrow().is_empty());
        sched.tick().unwrap();
        assert_eq!(*log.borrow(), vec!["child"]);
    }

    #[test]
    fn test_clock_with_time_scale() {
        let sched = Scheduler::new();
        let lp = sched.forever(|_| {}, LoopOptions::new());
        for _ in 0..3 {
            sched.tick().unwrap();
        }
        assert_eq!(lp.clock(), 3.0);

        sched.set_time_scale(0.5).unwrap();
        for _ in 0..4 {
            sched.tick().unwrap();
        }
        assert_eq!(lp.clock(), 5.0);

        // 5 is not a multiple of 2: snap down to 4 before stepping
        sched.set_time_scale(2.0).unwrap();
        sched.tick().unwrap();
        assert_eq!(lp.clock(), 6.0);
    }

    #[test]
    fn test_clock_keeps_advancing_over_long_runs() {
        for k in [0.1f32, 0.3, 0.7] {
            let sched = Scheduler::new();
            sched.set_time_scale(k).unwrap();
            let lp = sched.forever(|_| {}, LoopOptions::new());
            let mut prev = lp.clock();
            for tick in 1..=20_000u32 {
                sched.tick().unwrap();
                assert!(lp.clock() > prev, "k={} stalled at tick {}", k, tick);
                prev = lp.clock();
            }
            let expected = 20_000.0 * k;
            assert!((lp.clock() - expected).abs() <= expected * 1e-5, "k={} clock={}", k, lp.clock());
        }
    }

    #[test]
    fn test_clock_snaps_after_long_run_then_scale_change() {
        let sched = Scheduler::new();
        sched.set_time_scale(0.1).unwrap();
        let lp = sched.forever(|_| {}, LoopOptions::new());
        for _ in 0..10_000 {
            sched.tick().unwrap();
        }
        // 1000 is a whole number of 0.5 steps despite float error in 0.1
        sched.set_time_scale(0.5).unwrap();
        sched.tick().unwrap();
        assert!((lp.clock() - 1000.5).abs() < 1e-3, "clock={}", lp.clock());
    }

    #[test]
    fn test_panicking_tick_still_merges_pending() {
        let sched = Scheduler::new();
        let log = recorder();
        let inner = sched.clone();
        let l = log.clone();
        sched.forever(
            move |lp| {
                let l2 = l.clone();
                inner.forever(move |_| l2.borrow_mut().push("child"), LoopOptions::new().priority(100));
                lp.stop();
            },
            LoopOptions::new().priority(10),
        );
        sched.forever(|_| panic!("boom"), LoopOptions::new().priority(0));

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| sched.tick()));
        assert!(outcome.is_err());
        assert_eq!(sched.len(), 2);

        // The child was registered before the panic and runs on the very next tick
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| sched.tick()));
        assert_eq!(*log.borrow(), vec!["child"]);
    }

    #[test]
    fn test_invalid_time_scale() {
        let sched = Scheduler::new();
        assert!(sched.set_time_scale(0.0).is_err());
        assert!(sched.set_time_scale(f32::NAN).is_err());
        assert_eq!(sched.time_scale(), 1.0);
    }

    #[test]
    fn test_reentrant_tick_rejected() {
        let sched = Scheduler::new();
        let inner = sched.clone();
        let result = Rc::new(Cell::new(None));
        let res = result.clone();
        sched.forever(
            move |lp| {
                res.set(Some(matches!(inner.tick(), Err(EngineError::ReentrantTick))));
                lp.stop();
            },
            LoopOptions::new(),
        );
        sched.tick().unwrap();
        assert_eq!(result.get(), Some(true));
    }

    #[test]
    fn test_stop_all_destroys_kills() {
        let sched = Scheduler::new();
        let a = Lifeline::new();
        let b = Lifeline::new();
        sched.forever(|_| {}, LoopOptions::new().kills(a.clone()));
        sched.forever(|_| {}, LoopOptions::new().owns(b.clone()));
        sched.stop_all();
        assert!(a.is_destroyed() && b.is_destroyed());
        assert!(sched.is_empty());
    }

    #[test]
    fn test_loop_as_kill_of_another_loop() {
        let sched = Scheduler::new();
        let child = sched.forever(|_| {}, LoopOptions::new());
        let parent = sched.forever(|_| {}, LoopOptions::new().kills(child.as_destroyable()));
        parent.stop();
        assert!(child.is_stopped());
    }
}
