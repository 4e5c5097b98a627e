//! Destroyable capability
//!
//! Anything that can die: danmaku, the player, loop controllers. `destroy`
//! is idempotent - the first call wins and later calls do nothing.

use std::cell::Cell;
use std::rc::Rc;

/// An entity with a one-way alive -> destroyed transition
pub trait Destroyable {
    /// Destroy the entity; calling this again is a no-op
    fn destroy(&self);
    /// Whether `destroy` has happened (or the entity died some other way)
    fn is_destroyed(&self) -> bool;
}

/// Shared handle used in loop `refs`/`kills` sets
pub type DestroyRef = Rc<dyn Destroyable>;

/// Bare destroy flag with no entity behind it
///
/// Handy as a lifetime token: hand it to several loops as a ref and
/// destroy it to stop them all at once.
#[derive(Debug, Default)]
pub struct Lifeline {
    destroyed: Cell<bool>,
}

impl Lifeline {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }
}

impl Destroyable for Lifeline {
    fn destroy(&self) {
        self.destroyed.set(true);
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }
}

/// Add `item` to `set` unless the same object is already there
pub(crate) fn insert_unique(set: &mut Vec<DestroyRef>, item: DestroyRef) {
    if !set.iter().any(|d| std::ptr::addr_eq(Rc::as_ptr(d), Rc::as_ptr(&item))) {
        set.push(item);
    }
}
