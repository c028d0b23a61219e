use log::trace;

/// A growable FIFO queue over a circular array.
///
/// Enqueue returns a reference to the new tail slot so large values can be
/// filled in place. When the ring is full its capacity doubles and the
/// elements are copied out in queue order, which also unwraps the layout.
pub struct RefQueue<T> {
    slots: Vec<Option<T>>,
    head: usize,
    len: usize,
}

impl<T> RefQueue<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    fn physical(&self, offset: usize) -> usize {
        (self.head + offset) % self.slots.len()
    }

    pub fn enqueue(&mut self, value: T) -> &mut T {
        if self.len == self.slots.len() {
            self.grow(self.slots.len() * 2);
        }
        let tail = self.physical(self.len);
        self.len += 1;
        self.slots[tail].insert(value)
    }

    pub fn dequeue(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let value = self.slots[self.head].take();
        self.head = (self.head + 1) % self.slots.len();
        self.len -= 1;
        value
    }

    /// Drop up to `n` elements from the front. Returns how many were dropped.
    pub fn dequeue_n(&mut self, n: usize) -> usize {
        let n = n.min(self.len);
        for _ in 0..n {
            self.dequeue();
        }
        n
    }

    pub fn peek(&self) -> Option<&T> {
        self.get(0)
    }

    pub fn peek_mut(&mut self) -> Option<&mut T> {
        self.get_mut(0)
    }

    /// Element `offset` positions behind the front.
    pub fn get(&self, offset: usize) -> Option<&T> {
        if offset >= self.len {
            return None;
        }
        self.slots[self.physical(offset)].as_ref()
    }

    pub fn get_mut(&mut self, offset: usize) -> Option<&mut T> {
        if offset >= self.len {
            return None;
        }
        let idx = self.physical(offset);
        self.slots[idx].as_mut()
    }

    pub fn ensure_capacity(&mut self, capacity: usize) {
        if capacity > self.slots.len() {
            self.grow(capacity);
        }
    }

    pub fn clear(&mut self) {
        while self.dequeue().is_some() {}
        self.head = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        (0..self.len).filter_map(move |offset| self.slots[self.physical(offset)].as_ref())
    }

    #[cold]
    fn grow(&mut self, new_capacity: usize) {
        trace!(
            "RefQueue growing from {} to {} slots",
            self.slots.len(),
            new_capacity
        );
        let mut slots: Vec<Option<T>> = Vec::with_capacity(new_capacity);
        for offset in 0..self.len {
            let idx = self.physical(offset);
            slots.push(self.slots[idx].take());
        }
        slots.resize_with(new_capacity, || None);
        self.slots = slots;
        self.head = 0;
    }
}

impl<T> Default for RefQueue<T> {
    fn default() -> Self {
        Self::with_capacity(8)
    }
}
