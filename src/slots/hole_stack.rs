use crate::buffer::RefGrowBuffer;
use crate::config::SlotArrayConfig;
use crate::error::Result;

/// A slot of an [`IntrusiveHoleStackArray`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot<T> {
    Occupied(T),
    /// A hole, linked to the hole that was vacated before it.
    Vacant { next_hole: Option<usize> },
}

impl<T> Slot<T> {
    #[inline]
    pub fn is_occupied(&self) -> bool {
        matches!(self, Slot::Occupied(_))
    }

    #[inline]
    pub fn occupied(&self) -> Option<&T> {
        match self {
            Slot::Occupied(value) => Some(value),
            Slot::Vacant { .. } => None,
        }
    }

    #[inline]
    pub fn occupied_mut(&mut self) -> Option<&mut T> {
        match self {
            Slot::Occupied(value) => Some(value),
            Slot::Vacant { .. } => None,
        }
    }
}

/// A stable-index array whose free list lives inside the vacated slots.
///
/// Every hole records the hole vacated before it, so the holes form a LIFO
/// stack with its top stored in the array. Add pops the top or appends; remove
/// pushes the slot or, for the rightmost slot, simply shortens the array. Both
/// are O(1) with no memory beyond the slots themselves.
///
/// Reuse is most-recently-freed first, not lowest first.
pub struct IntrusiveHoleStackArray<T> {
    slots: RefGrowBuffer<Slot<T>>,
    top: Option<usize>,
    count: usize,
}

impl<T> IntrusiveHoleStackArray<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: RefGrowBuffer::with_capacity(capacity),
            top: None,
            count: 0,
        }
    }

    pub fn with_config(config: &SlotArrayConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config.initial_capacity))
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

    /// Number of materialized slots, holes included.
    ///
    /// A hole can sit at the end when it was freed before its right
    /// neighbour and other holes were pushed on top of it since.
    #[inline]
    pub fn materialized_len(&self) -> usize {
        self.slots.len()
    }

    /// Highest occupied index. Walks back over trailing holes.
    pub fn last_index(&self) -> Option<usize> {
        self.slots.iter().rposition(Slot::is_occupied)
    }

    #[inline]
    pub fn hole_count(&self) -> usize {
        self.slots.len() - self.count
    }

    pub fn add(&mut self, value: T) -> usize {
        match self.top {
            Some(idx) => {
                let slot = std::mem::replace(&mut self.slots[idx], Slot::Occupied(value));
                match slot {
                    Slot::Vacant { next_hole } => self.top = next_hole,
                    Slot::Occupied(_) => unreachable!("hole stack top {} is occupied", idx),
                }
                self.count += 1;
                idx
            }
            None => {
                let idx = self.slots.len();
                self.slots.push(Slot::Occupied(value));
                self.count += 1;
                idx
            }
        }
    }

    /// Add a value and return a reference to it in place.
    pub fn add_ref(&mut self, value: T) -> (usize, &mut T) {
        let idx = self.add(value);
        match &mut self.slots[idx] {
            Slot::Occupied(value) => (idx, value),
            Slot::Vacant { .. } => unreachable!(),
        }
    }

    /// Take the value out of `idx`.
    ///
    /// # Panics
    /// Panics if `idx` is out of range or already a hole.
    pub fn remove(&mut self, idx: usize) -> T {
        let occupied = self.slots.get(idx).map_or(false, Slot::is_occupied);
        assert!(occupied, "slot {} is not occupied", idx);

        self.count -= 1;
        if idx + 1 == self.slots.len() {
            let value = match self.slots.pop() {
                Some(Slot::Occupied(value)) => value,
                _ => unreachable!(),
            };
            self.pop_trailing_holes();
            if self.count == 0 {
                self.slots.clear();
                self.top = None;
            }
            return value;
        }

        let hole = Slot::Vacant {
            next_hole: self.top,
        };
        self.top = Some(idx);
        let value = match std::mem::replace(&mut self.slots[idx], hole) {
            Slot::Occupied(value) => value,
            Slot::Vacant { .. } => unreachable!(),
        };
        if self.count == 0 {
            self.slots.clear();
            self.top = None;
        }
        value
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.top = None;
        self.count = 0;
    }

    /// Drop holes left at the end while they sit on top of the stack.
    fn pop_trailing_holes(&mut self) {
        while let Some(top) = self.top {
            if top + 1 != self.slots.len() {
                break;
            }
            match self.slots.pop() {
                Some(Slot::Vacant { next_hole }) => self.top = next_hole,
                _ => unreachable!("hole stack top {} is occupied", top),
            }
        }
    }

    pub fn ensure_capacity(&mut self, capacity: usize) {
        self.slots.ensure_capacity(capacity);
    }

    pub fn get(&self, idx: usize) -> Option<&T> {
        self.slots.get(idx).and_then(Slot::occupied)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut T> {
        self.slots.get_mut(idx).and_then(Slot::occupied_mut)
    }

    #[inline]
    pub fn contains(&self, idx: usize) -> bool {
        self.get(idx).is_some()
    }

    /// Raw slots up to the right bound, holes included.
    pub fn slots(&self) -> &[Slot<T>] {
        self.slots.as_slice()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.occupied().map(|value| (idx, value)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut T)> + '_ {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(idx, slot)| slot.occupied_mut().map(|value| (idx, value)))
    }

    /// Hole indices in the order they will be reused.
    pub fn holes(&self) -> HoleIter<'_, T> {
        HoleIter {
            slots: self.slots.as_slice(),
            next: self.top,
        }
    }

    pub fn first_match_index(&self, mut pred: impl FnMut(&T) -> bool) -> Option<usize> {
        self.iter().find(|&(_, v)| pred(v)).map(|(idx, _)| idx)
    }

    pub fn any_match(&self, pred: impl FnMut(&T) -> bool) -> bool {
        self.first_match_index(pred).is_some()
    }

    /// Remove the first live value matching `pred`, returning its index and
    /// the value.
    pub fn remove_first_match(&mut self, pred: impl FnMut(&T) -> bool) -> Option<(usize, T)> {
        let idx = self.first_match_index(pred)?;
        Some((idx, self.remove(idx)))
    }
}

impl<T> Default for IntrusiveHoleStackArray<T> {
    fn default() -> Self {
        Self::new(SlotArrayConfig::default().initial_capacity)
    }
}

impl<T> std::ops::Index<usize> for IntrusiveHoleStackArray<T> {
    type Output = T;

    fn index(&self, idx: usize) -> &T {
        match &self.slots[idx] {
            Slot::Occupied(value) => value,
            Slot::Vacant { .. } => panic!("slot {} is a hole", idx),
        }
    }
}

impl<T> std::ops::IndexMut<usize> for IntrusiveHoleStackArray<T> {
    fn index_mut(&mut self, idx: usize) -> &mut T {
        match &mut self.slots[idx] {
            Slot::Occupied(value) => value,
            Slot::Vacant { .. } => panic!("slot {} is a hole", idx),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for IntrusiveHoleStackArray<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Walks the hole stack from its top.
pub struct HoleIter<'a, T> {
    slots: &'a [Slot<T>],
    next: Option<usize>,
}

impl<'a, T> Iterator for HoleIter<'a, T> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let idx = self.next?;
        self.next = match self.slots.get(idx) {
            Some(Slot::Vacant { next_hole }) => *next_hole,
            _ => None,
        };
        Some(idx)
    }
}
