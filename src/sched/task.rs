//! Cooperative step-wise tasks
//!
//! A `Task` is resumed once per frame by `Scheduler::co_do` and answers
//! `Step::Suspend` (call me again next frame) or `Step::Done`. One suspend
//! is one frame. Tasks compose: a `Sequence` runs its steps in order, moving
//! straight on to the next step in the same frame when one finishes, so a
//! nested task gates the outer one exactly as long as it runs itself.

use std::collections::VecDeque;

use super::scheduler::{LoopController, LoopOptions, Scheduler};

/// Outcome of one resumption
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Suspended; resume next frame
    Suspend,
    /// Finished; do not resume again
    Done,
}

/// A resumable unit of work
pub trait Task {
    fn resume(&mut self, lp: &LoopController) -> Step;
}

impl Task for Box<dyn Task> {
    fn resume(&mut self, lp: &LoopController) -> Step {
        (**self).resume(lp)
    }
}

/// Task backed by a closure
pub struct FnTask<F>(F);

impl<F: FnMut(&LoopController) -> Step> Task for FnTask<F> {
    fn resume(&mut self, lp: &LoopController) -> Step {
        (self.0)(lp)
    }
}

/// Wrap a closure as a task
pub fn from_fn<F: FnMut(&LoopController) -> Step>(f: F) -> FnTask<F> {
    FnTask(f)
}

/// Suspend for `n` frames of scaled time
///
/// Each resumption takes the current time-scale off the remaining time, so
/// slow motion stretches the wait in real frames.
#[derive(Debug, Clone)]
pub struct Sleep {
    remaining: f32,
}

impl Sleep {
    pub fn new(frames: f32) -> Self {
        Self { remaining: frames }
    }
}

impl Task for Sleep {
    fn resume(&mut self, lp: &LoopController) -> Step {
        if self.remaining <= 0.0 {
            return Step::Done;
        }
        self.remaining -= lp.time_scale();
        Step::Suspend
    }
}

/// Run `body(lp, i)` once per frame for `n` frames, suspending after each
pub fn frames<F: FnMut(&LoopController, u32)>(n: u32, mut body: F) -> impl Task {
    let mut i = 0;
    from_fn(move |lp| {
        if i >= n {
            return Step::Done;
        }
        body(lp, i);
        i += 1;
        Step::Suspend
    })
}

/// Wait until another loop has stopped
pub struct WaitFor(pub LoopController);

impl Task for WaitFor {
    fn resume(&mut self, _lp: &LoopController) -> Step {
        if self.0.is_stopped() {
            Step::Done
        } else {
            Step::Suspend
        }
    }
}

/// Steps run back to back
#[derive(Default)]
pub struct Sequence {
    steps: VecDeque<Box<dyn Task>>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task; it starts the frame the previous one finishes
    pub fn then(mut self, task: impl Task + 'static) -> Self {
        self.steps.push_back(Box::new(task));
        self
    }

    /// Append an instant action that does not consume a frame
    pub fn then_do(self, mut action: impl FnMut(&LoopController) + 'static) -> Self {
        self.then(from_fn(move |lp| {
            action(lp);
            Step::Done
        }))
    }

    /// Append a `Sleep`
    pub fn wait(self, frames: f32) -> Self {
        self.then(Sleep::new(frames))
    }

    /// Append one bare suspend
    pub fn yield_frame(self) -> Self {
        let mut yielded = false;
        self.then(from_fn(move |_| {
            if yielded {
                Step::Done
            } else {
                yielded = true;
                Step::Suspend
            }
        }))
    }
}

impl Task for Sequence {
    fn resume(&mut self, lp: &LoopController) -> Step {
        while let Some(step) = self.steps.front_mut() {
            if step.resume(lp) == Step::Suspend {
                return Step::Suspend;
            }
            self.steps.pop_front();
        }
        Step::Done
    }
}

impl Scheduler {
    /// Resume `task` once per tick, stopping the loop when it finishes
    pub fn co_do(&self, task: impl Task + 'static, options: LoopOptions) -> LoopController {
        let mut task = task;
        self.forever(
            move |lp| {
                if task.resume(lp) == Step::Done {
                    lp.stop();
                }
            },
            options,
        )
    }
}
