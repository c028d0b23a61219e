use log::trace;

use super::RefGrowBuffer;

/// A pool of reusable objects.
///
/// `checkout` hands back a previously returned object when one is available
/// and otherwise builds a fresh one with the generator. Returned objects are
/// reused as they are; resetting them is up to the caller.
pub struct ObjectPool<T> {
    free: RefGrowBuffer<T>,
    generate: Box<dyn FnMut() -> T>,
}

impl<T> ObjectPool<T> {
    pub fn new(generate: impl FnMut() -> T + 'static) -> Self {
        Self::with_capacity(8, generate)
    }

    pub fn with_capacity(capacity: usize, generate: impl FnMut() -> T + 'static) -> Self {
        Self {
            free: RefGrowBuffer::with_capacity(capacity),
            generate: Box::new(generate),
        }
    }

    /// Objects waiting to be checked out again.
    #[inline]
    pub fn available(&self) -> usize {
        self.free.len()
    }

    pub fn checkout(&mut self) -> T {
        match self.free.pop() {
            Some(object) => object,
            None => {
                trace!("ObjectPool empty, generating a new object");
                (self.generate)()
            }
        }
    }

    pub fn checkin(&mut self, object: T) {
        self.free.push(object);
    }
}

/// A pool of values that always hands out the best free value first.
///
/// Typical use is recycling numeric ids: the generator counts upwards and
/// `better` prefers the lowest number, so released ids are reissued lowest
/// first before new ones are minted.
pub struct ValuePool<T> {
    // Ordered worst to best; the best value sits at the end.
    free: RefGrowBuffer<T>,
    generate: Box<dyn FnMut() -> T>,
    better: Box<dyn Fn(&T, &T) -> bool>,
}

impl<T> ValuePool<T> {
    /// `better(a, b)` returns whether `a` should be handed out before `b`.
    pub fn new(
        capacity: usize,
        generate: impl FnMut() -> T + 'static,
        better: impl Fn(&T, &T) -> bool + 'static,
    ) -> Self {
        Self {
            free: RefGrowBuffer::with_capacity(capacity),
            generate: Box::new(generate),
            better: Box::new(better),
        }
    }

    #[inline]
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// The value the next `get` returns, if it comes from the free list.
    pub fn peek(&self) -> Option<&T> {
        self.free.as_slice().last()
    }

    pub fn get(&mut self) -> T {
        match self.free.pop() {
            Some(value) => value,
            None => (self.generate)(),
        }
    }

    pub fn release(&mut self, value: T) {
        let better = &self.better;
        self.free.insert_ordered(value, |item, new| better(item, new));
    }
}
