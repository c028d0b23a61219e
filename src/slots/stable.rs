use log::{debug, trace};

use super::{find_last_live, live_end, Iter, IterMut};
use crate::buffer::RefGrowBuffer;
use crate::config::SlotArrayConfig;
use crate::error::Result;
use crate::tombstone::{Intrinsic, SlotPolicy, Tombstone};

/// An auto-growing array with persistent indices and lowest-hole-first reuse.
///
/// Removed slots become tombstones and their indices go into a free list kept
/// sorted in descending order. Adding pops the tail of that list, which is the
/// lowest free index, so new values drift toward the front and the live
/// region stays compact. Every removal re-sorts the free list (O(k log k) for
/// k free slots): this array is meant for workloads with far more lookups than
/// mutations. Prefer [`TrinaryStableIndexSlotArray`](crate::TrinaryStableIndexSlotArray)
/// when adds and removes are frequent.
///
/// ```
/// use stable_slots::StableIndexSlotArray;
///
/// let mut arr: StableIndexSlotArray<Option<u32>> = StableIndexSlotArray::new(2);
/// let a = arr.add(Some(10));
/// let b = arr.add(Some(20));
/// arr.remove_at(a);
/// assert_eq!(arr.add(Some(30)), a);
/// assert_eq!(arr[b], Some(20));
/// ```
pub struct StableIndexSlotArray<T, P = Intrinsic> {
    slots: RefGrowBuffer<T>,
    /// Free indices at or below the right bound, sorted descending.
    free: Vec<usize>,
    count: usize,
    last_index: Option<usize>,
    policy: P,
}

impl<T: Tombstone> StableIndexSlotArray<T> {
    pub fn new(capacity: usize) -> Self {
        Self::with_policy(capacity, Intrinsic)
    }
}

impl<T, P: SlotPolicy<T>> StableIndexSlotArray<T, P> {
    pub fn with_policy(capacity: usize, policy: P) -> Self {
        Self {
            slots: RefGrowBuffer::with_capacity(capacity),
            free: Vec::new(),
            count: 0,
            last_index: None,
            policy,
        }
    }

    pub fn with_config(config: &SlotArrayConfig, policy: P) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_policy(config.initial_capacity, policy))
    }

    /// Number of live values.
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

    /// Highest live index, or `None` when empty.
    #[inline]
    pub fn last_index(&self) -> Option<usize> {
        self.last_index
    }

    /// Number of holes waiting to be reused.
    #[inline]
    pub fn free_slot_count(&self) -> usize {
        self.free.len()
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Store `value` in the lowest free slot (or append) and return its index.
    pub fn add(&mut self, value: T) -> usize {
        let idx = self.add_uninitialized();
        self.slots[idx] = value;
        idx
    }

    /// Claim a slot and return its index together with a reference to it.
    /// The slot still holds a tombstone and must be populated through the
    /// returned reference.
    pub fn add_ref(&mut self) -> (usize, &mut T) {
        let idx = self.add_uninitialized();
        (idx, &mut self.slots[idx])
    }

    /// Claim a slot and return its index without writing a value.
    ///
    /// The slot counts as live from now on but still holds a tombstone, so
    /// the caller must populate it (through `IndexMut`) before any other call
    /// that inspects slots.
    pub fn add_uninitialized(&mut self) -> usize {
        if let Some(idx) = self.free.pop() {
            self.count += 1;
            return idx;
        }

        // No holes below the right bound, so every slot up to it is live.
        let idx = live_end(self.last_index);
        debug_assert_eq!(idx, self.count);
        if idx == self.slots.len() {
            let fresh = self.policy.fresh_slot();
            self.slots.push(fresh);
        }
        self.last_index = Some(idx);
        self.count += 1;
        idx
    }

    /// Tombstone the slot at `idx` and make its index available for reuse.
    ///
    /// # Panics
    /// Panics if `idx` is not a live slot.
    pub fn remove_at(&mut self, idx: usize) {
        let live = idx < live_end(self.last_index) && !self.policy.is_vacant(&self.slots[idx]);
        assert!(live, "slot {} is not live", idx);

        self.policy.vacate(&mut self.slots[idx]);
        self.count -= 1;

        if Some(idx) == self.last_index {
            self.retreat_right_bound(idx);
        } else {
            self.free.push(idx);
            self.free.sort_unstable_by(|a, b| b.cmp(a));
        }
    }

    /// Remove the first live value matching `pred`. Returns its index.
    pub fn remove(&mut self, mut pred: impl FnMut(&T) -> bool) -> Option<usize> {
        let idx = self.iter().find(|&(_, v)| pred(v)).map(|(idx, _)| idx)?;
        self.remove_at(idx);
        Some(idx)
    }

    /// Remove the value at the right bound. Returns its index.
    pub fn remove_last(&mut self) -> Option<usize> {
        let idx = self.last_index?;
        self.remove_at(idx);
        Some(idx)
    }

    /// Tombstone every live slot. Capacity is kept.
    pub fn clear(&mut self) {
        let end = live_end(self.last_index);
        for slot in &mut self.slots.as_mut_slice()[..end] {
            if !self.policy.is_vacant(slot) {
                self.policy.vacate(slot);
            }
        }
        self.free.clear();
        self.count = 0;
        self.last_index = None;
    }

    /// Shrink the backing storage to `max_capacity` slots if it is larger.
    /// Values stored at or beyond `max_capacity` are dropped.
    ///
    /// Returns `true` if the storage was cut.
    pub fn trim_excess(&mut self, max_capacity: usize) -> bool {
        let max_capacity = max_capacity.max(1);
        if max_capacity >= self.slots.capacity() {
            return false;
        }

        debug!(
            "trimming slot array from {} to {} slots",
            self.slots.capacity(),
            max_capacity
        );
        self.slots.trim_excess(max_capacity);

        if live_end(self.last_index) > max_capacity {
            let last = find_last_live(self.slots.as_slice(), &self.policy);
            self.last_index = last;
            self.free.retain(|&idx| Some(idx) < last);
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

    /// The value at `idx`, or `None` if the slot is a hole or out of range.
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

    /// The value at the right bound.
    pub fn last(&self) -> Option<&T> {
        self.last_index.map(|idx| &self.slots[idx])
    }

    pub fn last_mut(&mut self) -> Option<&mut T> {
        let idx = self.last_index?;
        Some(&mut self.slots[idx])
    }

    /// Live values with their indices, in index order.
    pub fn iter(&self) -> Iter<'_, T, P> {
        let end = live_end(self.last_index);
        Iter::new(&self.slots.as_slice()[..end], &self.policy)
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, T, P> {
        let end = live_end(self.last_index);
        IterMut::new(&mut self.slots.as_mut_slice()[..end], &self.policy)
    }

    /// Every slot up to the right bound, tombstones included.
    pub fn iter_including_empty(&self) -> std::slice::Iter<'_, T> {
        let end = live_end(self.last_index);
        self.slots.as_slice()[..end].iter()
    }

    /// Walk back from the removed right bound to the next live slot and drop
    /// free records that now lie beyond it.
    fn retreat_right_bound(&mut self, removed: usize) {
        let last = find_last_live(&self.slots.as_slice()[..removed], &self.policy);
        self.last_index = last;

        // Descending order puts every stale record at the front.
        let stale = self.free.iter().take_while(|&&idx| Some(idx) > last).count();
        if stale > 0 {
            trace!("right bound moved to {:?}, pruned {} free slots", last, stale);
            self.free.drain(..stale);
        }
    }
}

impl<T, P: SlotPolicy<T>> std::ops::Index<usize> for StableIndexSlotArray<T, P> {
    type Output = T;

    /// Raw slot access; a tombstone is returned as-is.
    #[inline]
    fn index(&self, idx: usize) -> &T {
        &self.slots[idx]
    }
}

impl<T, P: SlotPolicy<T>> std::ops::IndexMut<usize> for StableIndexSlotArray<T, P> {
    #[inline]
    fn index_mut(&mut self, idx: usize) -> &mut T {
        &mut self.slots[idx]
    }
}

impl<T: std::fmt::Debug, P: SlotPolicy<T>> std::fmt::Debug for StableIndexSlotArray<T, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
