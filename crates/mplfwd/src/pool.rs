// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fixed-capacity generational pools
//!
//! The engine keeps domains, seeds and buffered messages in three bounded
//! pools. A slot is addressed by an opaque [`Handle`] carrying the slot index
//! plus the slot's generation at insertion time; freeing a slot bumps the
//! generation, so a handle that outlives its entry dereferences to `None`
//! instead of aliasing whatever was allocated into the reused slot.
//!
//! Occupancy is the slot's `Option` state; there is no free list and no
//! sentinel field. Allocation is a linear first-free scan.
//!
//! # Performance
//!
//! - `insert`: O(capacity) scan; capacities here are single-digit to
//!   low-double-digit, so the scan is cheaper than maintaining a free list.
//! - `get`/`get_mut`/`remove`: O(1) plus a generation compare.

use std::fmt;
use std::marker::PhantomData;

/// Typed handle into a [`Pool`].
///
/// Copyable and comparable; does not borrow the pool. A handle is only valid
/// for the pool that produced it and only while its entry is live.
pub struct Handle<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    fn new(index: u32, generation: u32) -> Self {
        Handle {
            index,
            generation,
            _marker: PhantomData,
        }
    }

    /// Handle that resolves in no pool. Unit-test filler for handle-typed
    /// fields whose referent is irrelevant to the test.
    #[cfg(test)]
    pub(crate) fn dangling() -> Self {
        Handle::new(u32::MAX, u32::MAX)
    }
}

// Manual impls: derives would bound T, and handles are plain ids.
impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}@g{})", self.index, self.generation)
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Bounded arena with generation-tagged handles.
pub struct Pool<T> {
    slots: Vec<Slot<T>>,
    used: usize,
}

impl<T> Pool<T> {
    /// Create a pool with a fixed number of slots. The pool never grows.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            slots.push(Slot {
                generation: 0,
                value: None,
            });
        }
        Pool { slots, used: 0 }
    }

    /// Insert into the first free slot, scanning from the front.
    ///
    /// # Errors
    ///
    /// Returns the value back when every slot is occupied, so the caller can
    /// run its reclamation policy and retry.
    pub fn insert(&mut self, value: T) -> std::result::Result<Handle<T>, T> {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.is_none() {
                slot.value = Some(value);
                self.used += 1;
                return Ok(Handle::new(i as u32, slot.generation));
            }
        }
        Err(value)
    }

    /// Free a slot, returning its value. Stale or foreign handles return
    /// `None` and leave the pool untouched.
    pub fn remove(&mut self, handle: Handle<T>) -> Option<T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation || slot.value.is_none() {
            return None;
        }
        // Bump the generation so every outstanding handle to this slot dies.
        slot.generation = slot.generation.wrapping_add(1);
        self.used -= 1;
        slot.value.take()
    }

    /// Borrow the entry behind a handle, if it is still live.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.as_ref()
    }

    /// Mutably borrow the entry behind a handle, if it is still live.
    #[inline]
    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.as_mut()
    }

    /// Number of occupied slots.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.used
    }

    /// True when no slot is occupied.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.used == 0
    }

    /// Total slot count.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// True when every slot is occupied.
    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.used == self.slots.len()
    }

    /// Iterate live entries with their handles, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.value
                .as_ref()
                .map(|v| (Handle::new(i as u32, slot.generation), v))
        })
    }

    /// Iterate live entries mutably with their handles, in slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle<T>, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(i, slot)| {
            let generation = slot.generation;
            slot.value
                .as_mut()
                .map(move |v| (Handle::new(i as u32, generation), v))
        })
    }
}

impl<T: fmt::Debug> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("used", &self.used)
            .field("capacity", &self.slots.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_insert_and_get() {
        let mut pool: Pool<u32> = Pool::new(4);
        let h = pool.insert(42).expect("space available");
        assert_eq!(pool.get(h), Some(&42));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_pool_full_returns_value_back() {
        let mut pool: Pool<u32> = Pool::new(2);
        pool.insert(1).expect("slot 0");
        pool.insert(2).expect("slot 1");
        assert_eq!(pool.insert(3), Err(3), "full pool must hand the value back");
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_pool_remove_frees_slot() {
        let mut pool: Pool<u32> = Pool::new(1);
        let h = pool.insert(7).expect("slot");
        assert_eq!(pool.remove(h), Some(7));
        assert_eq!(pool.len(), 0);
        assert!(pool.insert(8).is_ok(), "freed slot must be reusable");
    }

    #[test]
    fn test_pool_stale_handle_is_dead_after_reuse() {
        let mut pool: Pool<u32> = Pool::new(1);
        let old = pool.insert(1).expect("slot");
        pool.remove(old);
        let new = pool.insert(2).expect("reused slot");
        assert_eq!(pool.get(old), None, "stale handle must not alias the reuse");
        assert_eq!(pool.get(new), Some(&2));
        assert_eq!(pool.remove(old), None);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_pool_double_remove_is_inert() {
        let mut pool: Pool<u32> = Pool::new(2);
        let h = pool.insert(5).expect("slot");
        assert_eq!(pool.remove(h), Some(5));
        assert_eq!(pool.remove(h), None);
        assert_eq!(pool.len(), 0);
    }

    #[test]
    fn test_pool_linear_scan_reuses_first_free() {
        let mut pool: Pool<u32> = Pool::new(3);
        let h0 = pool.insert(0).expect("slot 0");
        let _h1 = pool.insert(1).expect("slot 1");
        pool.remove(h0);
        let h2 = pool.insert(2).expect("first free slot");
        // Slot 0 was the first free slot, so the new entry lands there.
        assert_eq!(format!("{:?}", h2), "Handle(0@g1)");
    }

    #[test]
    fn test_pool_iter_skips_free_slots() {
        let mut pool: Pool<u32> = Pool::new(4);
        let _a = pool.insert(10).expect("slot");
        let b = pool.insert(20).expect("slot");
        let _c = pool.insert(30).expect("slot");
        pool.remove(b);
        let values: Vec<u32> = pool.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![10, 30]);
    }

    #[test]
    fn test_pool_never_exceeds_capacity() {
        let mut pool: Pool<u8> = Pool::new(5);
        for i in 0..100u8 {
            let _ = pool.insert(i);
            assert!(pool.len() <= pool.capacity());
        }
        assert!(pool.is_full());
    }
}
