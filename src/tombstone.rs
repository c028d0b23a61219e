//! How a slot array tells live slots from holes.
//!
//! Every slot array needs two capabilities from its element type: a test that
//! recognises a tombstone and a setter that turns a live value into one. They
//! are expressed as a [`SlotPolicy`]. Types that know their own sentinel
//! implement [`Tombstone`] and use the zero-sized [`Intrinsic`] policy; other
//! types supply closures through [`Callbacks`].

use crate::error::{ConfigError, Result};

/// A value type that carries its own tombstone encoding.
pub trait Tombstone {
    /// A value for which `is_tombstone` returns `true`.
    fn tombstone() -> Self;

    fn is_tombstone(&self) -> bool;

    /// Overwrite this slot with a tombstone, dropping the live value.
    #[inline]
    fn make_tombstone(&mut self)
    where
        Self: Sized,
    {
        *self = Self::tombstone();
    }
}

impl<T> Tombstone for Option<T> {
    #[inline]
    fn tombstone() -> Self {
        None
    }

    #[inline]
    fn is_tombstone(&self) -> bool {
        self.is_none()
    }

    #[inline]
    fn make_tombstone(&mut self) {
        *self = None;
    }
}

/// The tombstone capability a slot array is constructed with.
pub trait SlotPolicy<T> {
    /// Produce a tombstoned value for a slot that has never held data.
    fn fresh_slot(&self) -> T;

    fn is_vacant(&self, slot: &T) -> bool;

    /// Mark a live slot as a tombstone.
    fn vacate(&self, slot: &mut T);
}

/// Policy for element types implementing [`Tombstone`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Intrinsic;

impl<T: Tombstone> SlotPolicy<T> for Intrinsic {
    #[inline]
    fn fresh_slot(&self) -> T {
        T::tombstone()
    }

    #[inline]
    fn is_vacant(&self, slot: &T) -> bool {
        slot.is_tombstone()
    }

    #[inline]
    fn vacate(&self, slot: &mut T) {
        slot.make_tombstone();
    }
}

type TestFn<T> = Box<dyn Fn(&T) -> bool>;
type SetFn<T> = Box<dyn Fn(&mut T)>;

/// Policy built from caller-supplied closures.
///
/// Fresh slots start from `T::default()` and are passed through the setter,
/// so the setter alone decides what a tombstone looks like.
pub struct Callbacks<T> {
    is_vacant: TestFn<T>,
    vacate: SetFn<T>,
}

impl<T> Callbacks<T> {
    pub fn new(
        is_vacant: impl Fn(&T) -> bool + 'static,
        vacate: impl Fn(&mut T) + 'static,
    ) -> Self {
        Self {
            is_vacant: Box::new(is_vacant),
            vacate: Box::new(vacate),
        }
    }

    pub fn builder() -> CallbacksBuilder<T> {
        CallbacksBuilder {
            is_vacant: None,
            vacate: None,
        }
    }
}

impl<T: Default> SlotPolicy<T> for Callbacks<T> {
    fn fresh_slot(&self) -> T {
        let mut slot = T::default();
        (self.vacate)(&mut slot);
        slot
    }

    #[inline]
    fn is_vacant(&self, slot: &T) -> bool {
        (self.is_vacant)(slot)
    }

    #[inline]
    fn vacate(&self, slot: &mut T) {
        (self.vacate)(slot)
    }
}

impl<T> std::fmt::Debug for Callbacks<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks").finish_non_exhaustive()
    }
}

/// Collects tombstone callbacks; both are mandatory.
pub struct CallbacksBuilder<T> {
    is_vacant: Option<TestFn<T>>,
    vacate: Option<SetFn<T>>,
}

impl<T> CallbacksBuilder<T> {
    /// Must return `true` exactly for slots the setter has produced.
    pub fn tombstone_test(mut self, f: impl Fn(&T) -> bool + 'static) -> Self {
        self.is_vacant = Some(Box::new(f));
        self
    }

    /// Must mutate the slot so that the test returns `true`.
    pub fn tombstone_setter(mut self, f: impl Fn(&mut T) + 'static) -> Self {
        self.vacate = Some(Box::new(f));
        self
    }

    pub fn build(self) -> Result<Callbacks<T>> {
        let is_vacant = self.is_vacant.ok_or(ConfigError::MissingTombstoneTest)?;
        let vacate = self.vacate.ok_or(ConfigError::MissingTombstoneSetter)?;
        Ok(Callbacks { is_vacant, vacate })
    }
}
