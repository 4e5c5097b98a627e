//! Frame scheduling
//!
//! - `destroy`: the `Destroyable` capability and ownership sets
//! - `scheduler`: priority-ordered per-frame callbacks (`forever`)
//! - `task`: cooperative step-wise tasks layered on the scheduler (`co_do`)
//!
//! Everything runs on one thread; handles are `Rc`-shared so gameplay
//! scripts can hold on to the entities and loops they depend on.

pub mod destroy;
pub mod scheduler;
pub mod task;

pub use destroy::{DestroyRef, Destroyable, Lifeline};
pub use scheduler::{LoopController, LoopOptions, Scheduler};
pub use task::{Sequence, Sleep, Step, Task, WaitFor, from_fn, frames};
