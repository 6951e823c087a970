//! Dispatch primitives shared by the queue facade and the worker pool.
//!
//! [`RoundRobin`] hands out slot numbers one submission at a time; the
//! queue serializes access so concurrent submitters each observe a
//! consistent advance. [`ActiveCounter`] tracks how many dispatched tasks
//! have not yet reached a terminal outcome.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Cycling slot cursor over `1..=slots`.
///
/// Not synchronized by itself; the queue holds it behind a mutex so that
/// advance-and-read is one critical section.
#[derive(Debug)]
pub(crate) struct RoundRobin {
    slots: usize,
    cursor: usize,
}

impl RoundRobin {
    pub(crate) fn new(slots: usize) -> Self {
        Self { slots, cursor: 1 }
    }

    /// Returns the slot for this call and advances the cursor.
    ///
    /// Wraps to 1 past the last slot; a cursor observed out of range (after
    /// a pool resize between runs) resets to 1 first.
    pub(crate) fn next(&mut self) -> usize {
        if self.cursor < 1 || self.cursor > self.slots {
            self.cursor = 1;
        }
        let slot = self.cursor;
        self.cursor = if self.cursor >= self.slots {
            1
        } else {
            self.cursor + 1
        };
        slot
    }

    /// Rewinds the cursor so the next dispatch goes to slot 1.
    pub(crate) fn reset(&mut self, slots: usize) {
        self.slots = slots;
        self.cursor = 1;
    }
}

/// Count of dispatched-but-unfinished tasks.
///
/// Incremented by the dispatcher once a task is persisted, decremented by
/// the executing worker on every terminal path. Clones share the same
/// underlying counter.
#[derive(Clone, Default)]
pub(crate) struct ActiveCounter(Arc<AtomicU64>);

impl ActiveCounter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn increment(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    /// Decrements, saturating at zero. The counter never goes negative even
    /// if an outcome races a compensating decrement.
    pub(crate) fn decrement(&self) {
        let _ = self
            .0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    pub(crate) fn get(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_cycles_one_through_n_and_wraps() {
        let mut rr = RoundRobin::new(3);
        let seen: Vec<usize> = (0..7).map(|_| rr.next()).collect();
        assert_eq!(seen, vec![1, 2, 3, 1, 2, 3, 1]);
    }

    #[test]
    fn cursor_resets_when_out_of_range() {
        let mut rr = RoundRobin::new(5);
        for _ in 0..4 {
            rr.next();
        }
        // shrink the pool mid-cycle; the stale cursor must snap back to 1
        rr.slots = 2;
        rr.cursor = 5;
        assert_eq!(rr.next(), 1);
        assert_eq!(rr.next(), 2);
        assert_eq!(rr.next(), 1);
    }

    #[test]
    fn single_slot_pool_always_yields_one() {
        let mut rr = RoundRobin::new(1);
        assert_eq!(rr.next(), 1);
        assert_eq!(rr.next(), 1);
    }

    #[test]
    fn counter_never_goes_negative() {
        let c = ActiveCounter::new();
        c.increment();
        c.decrement();
        c.decrement();
        assert_eq!(c.get(), 0);
        c.increment();
        assert_eq!(c.get(), 1);
    }

    #[test]
    fn counter_clones_share_state() {
        let a = ActiveCounter::new();
        let b = a.clone();
        a.increment();
        b.increment();
        assert_eq!(a.get(), 2);
        b.decrement();
        assert_eq!(a.get(), 1);
    }
}
