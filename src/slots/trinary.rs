use log::{debug, trace};

use super::{find_last_live, live_end, Iter, IterMut};
use crate::buffer::RefGrowBuffer;
use crate::config::TrinaryConfig;
use crate::error::Result;
use crate::tombstone::{Intrinsic, SlotPolicy, Tombstone};

const MIN_CAPACITY: usize = 6;

/// A stable-index array that buckets free indices into three zones instead of
/// sorting them.
///
/// With `L` the right bound, a freed index lands in the front zone if it is
/// below `L / 3`, in the middle zone if it is below `2 * (L / 3)`, and in the
/// back zone otherwise. Adding takes from the front zone first, then the
/// middle, then the back, and only appends when all three are empty. Reuse
/// is biased toward low indices while add and remove both stay O(1).
///
/// Zone membership is decided when an index is freed. As the right bound
/// shrinks, records can end up in a zone that is now too high for them; an
/// optional resort (see [`TrinaryConfig::resort_threshold`]) re-buckets every
/// record once the bound has dropped far enough.
pub struct TrinaryStableIndexSlotArray<T, P = Intrinsic> {
    slots: RefGrowBuffer<T>,
    front: Vec<usize>,
    middle: Vec<usize>,
    back: Vec<usize>,
    front_end: usize,
    middle_end: usize,
    count: usize,
    last_index: Option<usize>,
    /// Right bound at the time of the previous resort.
    resort_anchor: usize,
    resort_threshold: Option<f64>,
    policy: P,
}

impl<T: Tombstone> TrinaryStableIndexSlotArray<T> {
    pub fn new(capacity: usize) -> Self {
        Self::with_policy(capacity, Intrinsic)
    }
}

impl<T, P: SlotPolicy<T>> TrinaryStableIndexSlotArray<T, P> {
    pub fn with_policy(capacity: usize, policy: P) -> Self {
        Self {
            slots: RefGrowBuffer::with_capacity(capacity.max(MIN_CAPACITY)),
            front: Vec::new(),
            middle: Vec::new(),
            back: Vec::new(),
            front_end: 0,
            middle_end: 0,
            count: 0,
            last_index: None,
            resort_anchor: 0,
            resort_threshold: None,
            policy,
        }
    }

    pub fn with_config(config: &TrinaryConfig, policy: P) -> Result<Self> {
        config.validate()?;
        let mut arr = Self::with_policy(config.initial_capacity, policy);
        arr.resort_threshold = config.resort_threshold;
        Ok(arr)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    #[inline]
    pub fn last_index(&self) -> Option<usize> {
        self.last_index
    }

    pub fn free_slot_count(&self) -> usize {
        self.front.len() + self.middle.len() + self.back.len()
    }

    /// Sizes of the front, middle and back zones.
    pub fn zone_sizes(&self) -> [usize; 3] {
        [self.front.len(), self.middle.len(), self.back.len()]
    }

    pub fn add(&mut self, value: T) -> usize {
        let idx = self.add_uninitialized();
        self.slots[idx] = value;
        idx
    }

    pub fn add_ref(&mut self) -> (usize, &mut T) {
        let idx = self.add_uninitialized();
        (idx, &mut self.slots[idx])
    }

    /// Claim a slot without writing to it. The caller must populate it before
    /// the array inspects slots again.
    pub fn add_uninitialized(&mut self) -> usize {
        if let Some(idx) = self.snag_free_slot() {
            self.count += 1;
            return idx;
        }

        let idx = live_end(self.last_index);
        debug_assert_eq!(idx, self.count);
        if idx == self.slots.len() {
            let fresh = self.policy.fresh_slot();
            self.slots.push(fresh);
        }
        self.last_index = Some(idx);
        self.resort_anchor = idx;
        self.count += 1;
        self.recalc_zone_bounds();
        idx
    }

    /// # Panics
    /// Panics if `idx` is not a live slot.
    pub fn remove_at(&mut self, idx: usize) {
        let live = idx < live_end(self.last_index) && !self.policy.is_vacant(&self.slots[idx]);
        assert!(live, "slot {} is not live", idx);

        self.policy.vacate(&mut self.slots[idx]);
        self.count -= 1;

        if Some(idx) == self.last_index {
            let last = find_last_live(&self.slots.as_slice()[..idx], &self.policy);
            self.set_right_bound(last);
        } else {
            self.put_free_slot(idx);
        }
    }

    pub fn remove(&mut self, mut pred: impl FnMut(&T) -> bool) -> Option<usize> {
        let idx = self.iter().find(|&(_, v)| pred(v)).map(|(idx, _)| idx)?;
        self.remove_at(idx);
        Some(idx)
    }

    pub fn remove_last(&mut self) -> Option<usize> {
        let idx = self.last_index?;
        self.remove_at(idx);
        Some(idx)
    }

    pub fn clear(&mut self) {
        let end = live_end(self.last_index);
        for slot in &mut self.slots.as_mut_slice()[..end] {
            if !self.policy.is_vacant(slot) {
                self.policy.vacate(slot);
            }
        }
        self.front.clear();
        self.middle.clear();
        self.back.clear();
        self.count = 0;
        self.last_index = None;
        self.resort_anchor = 0;
        self.recalc_zone_bounds();
    }

    /// Shrink the backing storage to `max_capacity` slots (at least 6).
    /// Values stored beyond the new capacity are dropped.
    pub fn trim_excess(&mut self, max_capacity: usize) -> bool {
        let max_capacity = max_capacity.max(MIN_CAPACITY);
        if max_capacity >= self.slots.capacity() {
            return false;
        }

        debug!(
            "trimming trinary array from {} to {} slots",
            self.slots.capacity(),
            max_capacity
        );
        self.slots.trim_excess(max_capacity);

        if live_end(self.last_index) > max_capacity {
            let last = find_last_live(self.slots.as_slice(), &self.policy);
            self.set_right_bound(last);
            let end = live_end(last);
            self.count = self.slots.as_slice()[..end]
                .iter()
                .filter(|slot| !self.policy.is_vacant(slot))
                .count();
        }
        true
    }

    pub fn ensure_capacity(&mut self, capacity: usize) {
        self.slots.ensure_capacity(capacity);
    }

    pub fn get(&self, idx: usize) -> Option<&T> {
        self.slots
            .get(idx)
            .filter(|slot| !self.policy.is_vacant(slot))
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut T> {
        match self.slots.get_mut(idx) {
            Some(slot) if !self.policy.is_vacant(slot) => Some(slot),
            _ => None,
        }
    }

    #[inline]
    pub fn contains(&self, idx: usize) -> bool {
        self.get(idx).is_some()
    }

    pub fn last(&self) -> Option<&T> {
        self.last_index.map(|idx| &self.slots[idx])
    }

    pub fn last_mut(&mut self) -> Option<&mut T> {
        let idx = self.last_index?;
        Some(&mut self.slots[idx])
    }

    pub fn iter(&self) -> Iter<'_, T, P> {
        let end = live_end(self.last_index);
        Iter::new(&self.slots.as_slice()[..end], &self.policy)
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, T, P> {
        let end = live_end(self.last_index);
        IterMut::new(&mut self.slots.as_mut_slice()[..end], &self.policy)
    }

    pub fn iter_including_empty(&self) -> std::slice::Iter<'_, T> {
        let end = live_end(self.last_index);
        self.slots.as_slice()[..end].iter()
    }

    // ==================================
    // Zone bookkeeping.
    // ==================================

    fn snag_free_slot(&mut self) -> Option<usize> {
        self.front
            .pop()
            .or_else(|| self.middle.pop())
            .or_else(|| self.back.pop())
    }

    #[inline]
    fn recalc_zone_bounds(&mut self) {
        self.front_end = self.last_index.unwrap_or(0) / 3;
        self.middle_end = self.front_end * 2;
    }

    fn put_free_slot(&mut self, idx: usize) {
        let Some(last) = self.last_index else {
            return;
        };
        if idx < self.front_end {
            self.front.push(idx);
        } else if idx < self.middle_end {
            self.middle.push(idx);
        } else if idx < last {
            self.back.push(idx);
        }
    }

    /// Move the right bound down to `last`, dropping free records at or
    /// beyond it.
    fn set_right_bound(&mut self, last: Option<usize>) {
        self.last_index = last;
        let Some(last) = last else {
            self.front.clear();
            self.middle.clear();
            self.back.clear();
            self.resort_anchor = 0;
            self.recalc_zone_bounds();
            return;
        };

        let before = self.free_slot_count();
        self.front.retain(|&idx| idx < last);
        self.middle.retain(|&idx| idx < last);
        self.back.retain(|&idx| idx < last);
        let pruned = before - self.free_slot_count();
        if pruned > 0 {
            trace!("right bound moved to {}, pruned {} free slots", last, pruned);
        }

        self.recalc_zone_bounds();
        self.maybe_resort(last);
    }

    fn maybe_resort(&mut self, last: usize) {
        let Some(threshold) = self.resort_threshold else {
            return;
        };
        let shrunk = self.resort_anchor.saturating_sub(last);
        if (shrunk as f64) < self.resort_anchor as f64 * threshold {
            return;
        }
        self.resort_anchor = last;
        if last < 3 {
            return;
        }

        let mut all = std::mem::take(&mut self.front);
        all.append(&mut self.middle);
        all.append(&mut self.back);
        debug!(
            "re-bucketing {} free slots below right bound {}",
            all.len(),
            last
        );
        for idx in all {
            self.put_free_slot(idx);
        }
    }
}

impl<T, P: SlotPolicy<T>> std::ops::Index<usize> for TrinaryStableIndexSlotArray<T, P> {
    type Output = T;

    #[inline]
    fn index(&self, idx: usize) -> &T {
        &self.slots[idx]
    }
}

impl<T, P: SlotPolicy<T>> std::ops::IndexMut<usize> for TrinaryStableIndexSlotArray<T, P> {
    #[inline]
    fn index_mut(&mut self, idx: usize) -> &mut T {
        &mut self.slots[idx]
    }
}

impl<T: std::fmt::Debug, P: SlotPolicy<T>> std::fmt::Debug for TrinaryStableIndexSlotArray<T, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
