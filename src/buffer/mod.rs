//! Growable contiguous buffers accessed by reference.
//!
//! [`RefGrowBuffer`] is the storage every slot array and tree in this crate is
//! built on. Its capacity is tracked explicitly and doubles when an append
//! finds the buffer full, so growth is predictable and observable through
//! [`RefGrowBuffer::capacity`].
//!
//! References handed out by the buffer borrow it, so the compiler rejects
//! holding one across a call that may reallocate.

mod pool;
mod queue;

pub use pool::{ObjectPool, ValuePool};
pub use queue::RefQueue;

use log::trace;

/// Capacity used by [`RefGrowBuffer::new`].
const DEFAULT_CAPACITY: usize = 8;

/// A growable buffer with doubling growth and by-reference access.
#[derive(Clone)]
pub struct RefGrowBuffer<T> {
    items: Vec<T>,
    /// Logical capacity. The backing `Vec` may hold more.
    capacity: usize,
}

impl<T> RefGrowBuffer<T> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a buffer with room for `capacity` elements (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.items
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    #[inline]
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    #[inline]
    pub fn get(&self, idx: usize) -> Option<&T> {
        self.items.get(idx)
    }

    #[inline]
    pub fn get_mut(&mut self, idx: usize) -> Option<&mut T> {
        self.items.get_mut(idx)
    }

    #[inline]
    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    #[inline]
    pub fn last_mut(&mut self) -> Option<&mut T> {
        self.items.last_mut()
    }

    /// Append `value` and return a reference to its slot. Doubles the capacity
    /// if the buffer is full.
    #[inline]
    pub fn push(&mut self, value: T) -> &mut T {
        self.reserve_one();
        let idx = self.items.len();
        self.items.push(value);
        &mut self.items[idx]
    }

    /// Append a default value and return a reference to it for in-place
    /// initialization.
    #[inline]
    pub fn push_default(&mut self) -> &mut T
    where
        T: Default,
    {
        self.push(T::default())
    }

    /// Append a copy of every element in `values`, growing to exactly the
    /// required size if they do not fit.
    pub fn extend_from_slice(&mut self, values: &[T])
    where
        T: Clone,
    {
        self.ensure_capacity(self.items.len() + values.len());
        self.items.extend_from_slice(values);
    }

    /// Make sure the capacity is at least `capacity`. Grows to exactly that
    /// size when it is not.
    pub fn ensure_capacity(&mut self, capacity: usize) {
        if capacity > self.capacity {
            self.grow_to(capacity);
        }
    }

    /// Release unused capacity. The capacity never drops below one slot.
    pub fn shrink_to_fit(&mut self) {
        self.items.shrink_to_fit();
        self.capacity = self.items.len().max(1);
    }

    /// Cut the capacity down to `max_capacity` (at least one slot), dropping
    /// any elements beyond it. Returns `false` when the capacity already fits.
    pub fn trim_excess(&mut self, max_capacity: usize) -> bool {
        let max_capacity = max_capacity.max(1);
        if max_capacity >= self.capacity {
            return false;
        }
        self.items.truncate(max_capacity);
        self.items.shrink_to(max_capacity);
        self.capacity = max_capacity;
        true
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    pub fn truncate(&mut self, len: usize) {
        self.items.truncate(len);
    }

    /// Drop the first `n` elements, shifting the rest to the front.
    pub fn remove_first_n(&mut self, n: usize) {
        let n = n.min(self.items.len());
        self.items.drain(..n);
    }

    /// Remove the element at `idx` by moving the last element into its place.
    /// Does not retain order.
    ///
    /// # Panics
    /// Panics if `idx` is out of bounds.
    pub fn swap_remove(&mut self, idx: usize) -> T {
        self.items.swap_remove(idx)
    }

    /// Remove the element at `idx`, shifting the tail left by one.
    ///
    /// # Panics
    /// Panics if `idx` is out of bounds.
    pub fn remove(&mut self, idx: usize) -> T {
        self.items.remove(idx)
    }

    /// Index of the first element matching `pred`.
    pub fn first_match_index(&self, mut pred: impl FnMut(&T) -> bool) -> Option<usize> {
        self.items.iter().position(|item| pred(item))
    }

    pub fn any_match(&self, mut pred: impl FnMut(&T) -> bool) -> bool {
        self.items.iter().any(|item| pred(item))
    }

    /// Remove the first element matching `pred` by swapping the last element
    /// into its place. Returns the index it occupied.
    pub fn remove_first_match(&mut self, pred: impl FnMut(&T) -> bool) -> Option<usize> {
        let idx = self.first_match_index(pred)?;
        self.items.swap_remove(idx);
        Some(idx)
    }

    /// Remove the first element matching `pred`, keeping the order of the
    /// remaining elements. Returns the index it occupied.
    pub fn remove_first_match_retaining_order(
        &mut self,
        pred: impl FnMut(&T) -> bool,
    ) -> Option<usize> {
        let idx = self.first_match_index(pred)?;
        self.items.remove(idx);
        Some(idx)
    }

    /// Insert `value` before the first element that is greater than it.
    ///
    /// Assumes the buffer is already ordered under `greater_than`. The scan is
    /// linear and the tail is shifted right, so the average cost is O(n/2).
    /// Returns the index the value was written to.
    pub fn insert_ordered(
        &mut self,
        value: T,
        mut greater_than: impl FnMut(&T, &T) -> bool,
    ) -> usize {
        let pos = self
            .items
            .iter()
            .position(|item| greater_than(item, &value))
            .unwrap_or(self.items.len());
        self.reserve_one();
        self.items.insert(pos, value);
        pos
    }

    /// Stable in-place insertion sort. O(n^2) worst case; cheap for short or
    /// nearly sorted buffers.
    pub fn insertion_sort_by(&mut self, mut greater_than: impl FnMut(&T, &T) -> bool) {
        for i in 1..self.items.len() {
            let mut j = i;
            while j > 0 && greater_than(&self.items[j - 1], &self.items[j]) {
                self.items.swap(j - 1, j);
                j -= 1;
            }
        }
    }

    #[inline]
    fn reserve_one(&mut self) {
        if self.items.len() == self.capacity {
            self.grow_to(self.capacity * 2);
        }
    }

    #[cold]
    fn grow_to(&mut self, new_capacity: usize) {
        trace!(
            "RefGrowBuffer growing from {} to {} slots",
            self.capacity,
            new_capacity
        );
        self.items.reserve_exact(new_capacity - self.items.len());
        self.capacity = new_capacity;
    }
}

impl<T> Default for RefGrowBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::ops::Index<usize> for RefGrowBuffer<T> {
    type Output = T;

    #[inline]
    fn index(&self, idx: usize) -> &T {
        &self.items[idx]
    }
}

impl<T> std::ops::IndexMut<usize> for RefGrowBuffer<T> {
    #[inline]
    fn index_mut(&mut self, idx: usize) -> &mut T {
        &mut self.items[idx]
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for RefGrowBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl<'a, T> IntoIterator for &'a RefGrowBuffer<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
