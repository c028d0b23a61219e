use super::{Iter, StableIndexSlotArray};
use crate::config::SlotArrayConfig;
use crate::error::Result;
use crate::tombstone::{Intrinsic, SlotPolicy, Tombstone};

type Monitor<T> = Box<dyn Fn(&T) -> bool>;

/// A [`StableIndexSlotArray`] that keeps a bag of the indices whose value
/// satisfies a monitored condition.
///
/// Adds and removes keep the bag current. A value changed in place through
/// [`get_mut`](Self::get_mut) or `IndexMut` must be followed by
/// [`update_monitor`](Self::update_monitor). Walking [`flagged`](Self::flagged)
/// touches only the flagged slots.
pub struct MonitoredSlotArray<T, P = Intrinsic> {
    inner: StableIndexSlotArray<T, P>,
    monitor: Monitor<T>,
    /// Unordered.
    flagged: Vec<usize>,
}

impl<T: Tombstone> MonitoredSlotArray<T> {
    pub fn new(capacity: usize, monitor: impl Fn(&T) -> bool + 'static) -> Self {
        Self::with_policy(capacity, Intrinsic, monitor)
    }
}

impl<T, P: SlotPolicy<T>> MonitoredSlotArray<T, P> {
    pub fn with_policy(capacity: usize, policy: P, monitor: impl Fn(&T) -> bool + 'static) -> Self {
        Self {
            inner: StableIndexSlotArray::with_policy(capacity, policy),
            monitor: Box::new(monitor),
            flagged: Vec::new(),
        }
    }

    pub fn with_config(
        config: &SlotArrayConfig,
        policy: P,
        monitor: impl Fn(&T) -> bool + 'static,
    ) -> Result<Self> {
        Ok(Self {
            inner: StableIndexSlotArray::with_config(config, policy)?,
            monitor: Box::new(monitor),
            flagged: Vec::new(),
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    #[inline]
    pub fn last_index(&self) -> Option<usize> {
        self.inner.last_index()
    }

    /// The underlying array, for read-only operations not mirrored here.
    pub fn as_slot_array(&self) -> &StableIndexSlotArray<T, P> {
        &self.inner
    }

    pub fn add(&mut self, value: T) -> usize {
        let flag = (self.monitor)(&value);
        let idx = self.inner.add(value);
        if flag {
            self.flagged.push(idx);
        }
        idx
    }

    /// Claim a slot, let `init` populate it, then evaluate the monitor.
    pub fn add_with(&mut self, init: impl FnOnce(&mut T)) -> usize {
        let (idx, slot) = self.inner.add_ref();
        init(slot);
        if (self.monitor)(slot) {
            self.flagged.push(idx);
        }
        idx
    }

    /// # Panics
    /// Panics if `idx` is not a live slot.
    pub fn remove_at(&mut self, idx: usize) {
        self.inner.remove_at(idx);
        self.unflag(idx);
    }

    pub fn remove(&mut self, pred: impl FnMut(&T) -> bool) -> Option<usize> {
        let idx = self.inner.remove(pred)?;
        self.unflag(idx);
        Some(idx)
    }

    pub fn remove_last(&mut self) -> Option<usize> {
        let idx = self.inner.remove_last()?;
        self.unflag(idx);
        Some(idx)
    }

    pub fn clear(&mut self) {
        self.inner.clear();
        self.flagged.clear();
    }

    pub fn trim_excess(&mut self, max_capacity: usize) -> bool {
        if !self.inner.trim_excess(max_capacity) {
            return false;
        }
        let inner = &self.inner;
        self.flagged.retain(|&idx| inner.contains(idx));
        true
    }

    /// Re-evaluate the monitored condition for `idx` after an in-place change.
    /// Vacant slots are never flagged.
    pub fn update_monitor(&mut self, idx: usize) {
        let met = self.inner.get(idx).map_or(false, |v| (self.monitor)(v));
        if met {
            if !self.is_flagged(idx) {
                self.flagged.push(idx);
            }
        } else {
            self.unflag(idx);
        }
    }

    pub fn is_flagged(&self, idx: usize) -> bool {
        self.flagged.contains(&idx)
    }

    pub fn flagged_count(&self) -> usize {
        self.flagged.len()
    }

    /// Flagged values with their indices, in no particular order.
    pub fn flagged(&self) -> impl Iterator<Item = (usize, &T)> + '_ {
        self.flagged
            .iter()
            .filter_map(move |&idx| self.inner.get(idx).map(|v| (idx, v)))
    }

    /// Visit each flagged value mutably, re-evaluating the condition
    /// afterwards and dropping the flag from values that no longer meet it.
    pub fn process_flagged(&mut self, mut f: impl FnMut(usize, &mut T)) {
        let mut i = 0;
        while i < self.flagged.len() {
            let idx = self.flagged[i];
            let still_met = match self.inner.get_mut(idx) {
                Some(value) => {
                    f(idx, value);
                    (self.monitor)(value)
                }
                None => false,
            };
            if still_met {
                i += 1;
            } else {
                self.flagged.swap_remove(i);
            }
        }
    }

    pub fn get(&self, idx: usize) -> Option<&T> {
        self.inner.get(idx)
    }

    /// Mutable access that bypasses the monitor; call
    /// [`update_monitor`](Self::update_monitor) afterwards.
    pub fn get_mut(&mut self, idx: usize) -> Option<&mut T> {
        self.inner.get_mut(idx)
    }

    pub fn iter(&self) -> Iter<'_, T, P> {
        self.inner.iter()
    }

    fn unflag(&mut self, idx: usize) {
        if let Some(pos) = self.flagged.iter().position(|&i| i == idx) {
            self.flagged.swap_remove(pos);
        }
    }
}

impl<T, P: SlotPolicy<T>> std::ops::Index<usize> for MonitoredSlotArray<T, P> {
    type Output = T;

    fn index(&self, idx: usize) -> &T {
        &self.inner[idx]
    }
}

impl<T, P: SlotPolicy<T>> std::ops::IndexMut<usize> for MonitoredSlotArray<T, P> {
    fn index_mut(&mut self, idx: usize) -> &mut T {
        &mut self.inner[idx]
    }
}
