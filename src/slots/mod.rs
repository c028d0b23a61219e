//! Arrays with persistent indices.
//!
//! Removing a value leaves a hole instead of shifting its neighbours, so an
//! index stays valid for as long as its value is live. The arrays differ in
//! how they remember holes for reuse:
//!
//! - [`StableIndexSlotArray`]: descending-sorted free list, always reuses the
//!   lowest hole. Cheap adds, costlier removes.
//! - [`TrinaryStableIndexSlotArray`]: free indices bucketed into front, middle
//!   and back zones. Low-biased reuse without sorting.
//! - [`IntrusiveHoleStackArray`]: holes form a stack threaded through the
//!   vacated slots. No side list, strict O(1).
//! - [`MonitoredSlotArray`]: a stable array that also tracks which live
//!   values satisfy a predicate.

mod hole_stack;
mod monitored;
mod stable;
mod trinary;

pub use hole_stack::{HoleIter, IntrusiveHoleStackArray, Slot};
pub use monitored::MonitoredSlotArray;
pub use stable::StableIndexSlotArray;
pub use trinary::TrinaryStableIndexSlotArray;

use crate::tombstone::SlotPolicy;

/// One past the right bound.
#[inline]
fn live_end(last_index: Option<usize>) -> usize {
    last_index.map_or(0, |last| last + 1)
}

/// Highest live index among `slots`.
#[inline]
fn find_last_live<T, P: SlotPolicy<T>>(slots: &[T], policy: &P) -> Option<usize> {
    slots.iter().rposition(|slot| !policy.is_vacant(slot))
}

/// Iterator over the live slots of a policy-backed array, yielding each
/// value with its index.
pub struct Iter<'a, T, P> {
    inner: std::iter::Enumerate<std::slice::Iter<'a, T>>,
    policy: &'a P,
}

impl<'a, T, P> Iter<'a, T, P> {
    fn new(slots: &'a [T], policy: &'a P) -> Self {
        Self {
            inner: slots.iter().enumerate(),
            policy,
        }
    }
}

impl<'a, T, P: SlotPolicy<T>> Iterator for Iter<'a, T, P> {
    type Item = (usize, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        for (idx, slot) in self.inner.by_ref() {
            if !self.policy.is_vacant(slot) {
                return Some((idx, slot));
            }
        }
        None
    }
}

/// Mutable counterpart of [`Iter`].
pub struct IterMut<'a, T, P> {
    inner: std::iter::Enumerate<std::slice::IterMut<'a, T>>,
    policy: &'a P,
}

impl<'a, T, P> IterMut<'a, T, P> {
    fn new(slots: &'a mut [T], policy: &'a P) -> Self {
        Self {
            inner: slots.iter_mut().enumerate(),
            policy,
        }
    }
}

impl<'a, T, P: SlotPolicy<T>> Iterator for IterMut<'a, T, P> {
    type Item = (usize, &'a mut T);

    fn next(&mut self) -> Option<Self::Item> {
        for (idx, slot) in self.inner.by_ref() {
            if !self.policy.is_vacant(slot) {
                return Some((idx, slot));
            }
        }
        None
    }
}
