//! Handle-indexed object storage with scope-based bulk release.
//!
//! A [`Pool`] stores values in a growable vector and returns copyable
//! [`Handle`]s instead of pointers. Values are never freed one at a time:
//! [`Pool::release`] drops everything allocated after a [`PoolMark`], which is
//! how nested VM scopes reclaim their objects.
//!
//! Each slot records the serial number of the allocation that filled it. A
//! handle resolves only while its serial matches, so a handle that outlived
//! its scope yields `None` even after the slot index has been reused.
//!
//! ```
//! use sable_mem::Pool;
//!
//! let mut pool = Pool::new();
//! let outer = pool.alloc("outer");
//!
//! let mark = pool.mark();
//! let inner = pool.alloc("inner");
//! pool.release(mark);
//!
//! let reused = pool.alloc("reused");
//! assert_eq!(pool.get(outer), Some(&"outer"));
//! assert_eq!(pool.get(inner), None);
//! assert_eq!(pool.get(reused), Some(&"reused"));
//! ```

/// Copyable reference to a pooled value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    serial: u32,
}

impl Handle {
    /// Slot index inside the pool.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Allocation serial number.
    #[must_use]
    pub const fn serial(self) -> u32 {
        self.serial
    }
}

/// Pool length captured at scope entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolMark(usize);

struct Slot<T> {
    serial: u32,
    value: T,
}

/// Growable, bulk-released value store.
pub struct Pool<T> {
    slots: Vec<Slot<T>>,
    next_serial: u32,
}

impl<T> Pool<T> {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty pool with room for `capacity` values.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Pool {
            slots: Vec::with_capacity(capacity),
            next_serial: 0,
        }
    }

    /// Stores `value` and returns its handle.
    ///
    /// # Panics
    ///
    /// Panics if the pool holds `u32::MAX` values.
    pub fn alloc(&mut self, value: T) -> Handle {
        let index = u32::try_from(self.slots.len()).expect("object pool exhausted");
        let serial = self.next_serial;
        self.next_serial = self.next_serial.wrapping_add(1);
        self.slots.push(Slot { serial, value });
        Handle { index, serial }
    }

    fn slot(&self, handle: Handle) -> Option<&Slot<T>> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.serial == handle.serial)
    }

    /// Resolves a handle, or `None` if its allocation was released.
    #[must_use]
    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.slot(handle).map(|slot| &slot.value)
    }

    /// Mutable variant of [`Pool::get`].
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.serial == handle.serial)
            .map(|slot| &mut slot.value)
    }

    /// Whether `handle` still resolves.
    #[must_use]
    pub fn contains(&self, handle: Handle) -> bool {
        self.slot(handle).is_some()
    }

    /// Captures the current length for a later [`Pool::release`].
    #[must_use]
    pub fn mark(&self) -> PoolMark {
        PoolMark(self.slots.len())
    }

    /// Drops every value allocated after `mark`.
    pub fn release(&mut self, mark: PoolMark) {
        self.slots.truncate(mark.0);
    }

    /// Drops every value.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Number of live values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the pool is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}
