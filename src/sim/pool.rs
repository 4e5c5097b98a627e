//! Amortized compacting entity pool
//!
//! Holds possibly-destroyed entries. Destroyed entries are swept out only
//! when the number of pushes since the last sweep exceeds twice the live
//! count found by that sweep (never less than `POOL_MIN_BASELINE`), so the
//! O(n) compaction is rare while storage stays bounded.

use std::rc::Rc;

use crate::consts::POOL_MIN_BASELINE;
use crate::sched::Destroyable;

/// Live-ish list of shared entities
#[derive(Debug)]
pub struct EntityPool<T: Destroyable> {
    objects: Vec<Rc<T>>,
    /// Entries counted since the last compaction
    valid_count: usize,
    /// Live count recorded by the last compaction (floored)
    baseline: usize,
}

impl<T: Destroyable> Default for EntityPool<T> {
    fn default() -> Self {
        Self {
            objects: Vec::new(),
            valid_count: 0,
            baseline: POOL_MIN_BASELINE,
        }
    }
}

impl<T: Destroyable> EntityPool<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity, compacting first if the hysteresis threshold is crossed
    pub fn push(&mut self, obj: Rc<T>) {
        self.objects.push(obj);
        self.valid_count += 1;
        if self.valid_count > self.baseline * 2 {
            self.compact();
        }
    }

    /// Drop every destroyed entry now
    pub fn compact(&mut self) {
        let before = self.objects.len();
        self.objects.retain(|o| !o.is_destroyed());
        self.valid_count = self.objects.len();
        self.baseline = self.valid_count.max(POOL_MIN_BASELINE);
        log::debug!("pool compacted: {} -> {} entries", before, self.valid_count);
    }

    /// Entry at `index`, destroyed or not
    pub fn get(&self, index: usize) -> Option<&Rc<T>> {
        self.objects.get(index)
    }

    /// All stored entries; may include destroyed ones
    pub fn iter(&self) -> impl Iterator<Item = &Rc<T>> {
        self.objects.iter()
    }

    /// Entries that are still alive
    pub fn live(&self) -> impl Iterator<Item = &Rc<T>> {
        self.objects.iter().filter(|o| !o.is_destroyed())
    }

    pub fn live_count(&self) -> usize {
        self.live().count()
    }

    /// Stored entries including destroyed ones
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Compaction threshold baseline
    pub fn baseline(&self) -> usize {
        self.baseline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sched::Lifeline;

    #[test]
    fn test_no_compaction_below_threshold() {
        let mut pool = EntityPool::new();
        for _ in 0..120 {
            let obj = Lifeline::new();
            obj.destroy();
            pool.push(obj);
        }
        assert_eq!(pool.len(), 120);
        pool.push(Lifeline::new());
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.baseline(), POOL_MIN_BASELINE);
    }

    #[test]
    fn test_baseline_tracks_live_count() {
        let mut pool = EntityPool::new();
        let keep: Vec<_> = (0..200).map(|_| Lifeline::new()).collect();
        for obj in &keep {
            pool.push(obj.clone());
        }
        // 121st push compacted with 121 live entries
        assert_eq!(pool.baseline(), 121);
        assert_eq!(pool.len(), 200);
        assert_eq!(pool.live_count(), 200);
    }

    #[test]
    fn test_manual_compact() {
        let mut pool = EntityPool::new();
        let a = Lifeline::new();
        let b = Lifeline::new();
        pool.push(a.clone());
        pool.push(b.clone());
        a.destroy();
        pool.compact();
        assert_eq!(pool.len(), 1);
        assert!(!pool.get(0).unwrap().is_destroyed());
    }
}
