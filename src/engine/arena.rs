//! Generational slot allocator.
//!
//! [`Arena`] hands out packed [`Handle`]s whose high bits carry a version
//! and whose low bits carry a slot index. Versions advance on every
//! removal, so a handle held across a free-and-reuse cycle goes stale
//! instead of aliasing the new occupant. The zero handle is never issued
//! and never resolves.
//!
//! Freed slots form a single-linked LIFO free list threaded through the
//! slots' own stored handles: a free slot's index field encodes the next
//! free index, which is also what lets iteration detect free slots without
//! a separate liveness array.

use crate::engine::error::AllocationError;

const NO_SLOT: u32 = u32::MAX;

/// Packed slot reference: version in the high 32 bits, index in the low 32.
///
/// ## Invariants
/// - [`Handle::INVALID`] (all zero bits) never refers to a live entry; the
///   first occupant of any slot is issued version `1`.
/// - Two handles are interchangeable only if both fields match.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Handle(u64);

impl Handle {
    /// The always-invalid zero handle.
    pub const INVALID: Handle = Handle(0);

    #[inline]
    fn new(version: u32, index: u32) -> Self {
        Handle(((version as u64) << 32) | index as u64)
    }

    /// Slot index encoded in this handle.
    #[inline]
    pub fn index(self) -> u32 {
        self.0 as u32
    }

    /// Version encoded in this handle.
    #[inline]
    pub fn version(self) -> u32 {
        (self.0 >> 32) as u32
    }
}

struct Slot<T> {
    /// For a live slot: this slot's own handle (index field matches the
    /// slot's position). For a free slot: the bumped version plus the index
    /// of the next free slot.
    handle: Handle,
    value: Option<T>,
}

/// Handle-versioned slot allocator.
///
/// ## Reuse policy
/// The free list is LIFO: freshly freed slots are reused before untouched
/// capacity.
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_head: u32,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: NO_SLOT,
            len: 0,
        }
    }

    /// Number of live entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no entries are live.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Stores `value` and returns its handle.
    ///
    /// Reuses the most recently freed slot when one exists; otherwise a
    /// fresh slot is appended with version `1`.
    pub fn insert(&mut self, value: T) -> Result<Handle, AllocationError> {
        let handle = if self.free_head != NO_SLOT {
            let index = self.free_head;
            let slot = &mut self.slots[index as usize];
            self.free_head = slot.handle.index();
            // Version was already bumped when the slot was freed.
            let handle = Handle::new(slot.handle.version(), index);
            slot.handle = handle;
            slot.value = Some(value);
            handle
        } else {
            let index = self.slots.len();
            self.slots
                .try_reserve(1)
                .map_err(|_| AllocationError { bytes: std::mem::size_of::<Slot<T>>() })?;
            let handle = Handle::new(1, index as u32);
            self.slots.push(Slot {
                handle,
                value: Some(value),
            });
            handle
        };
        self.len += 1;
        Ok(handle)
    }

    /// Shared access to the entry behind `handle`, if it is still live.
    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.slots
            .get(handle.index() as usize)
            .filter(|slot| slot.handle == handle)
            .and_then(|slot| slot.value.as_ref())
    }

    /// Mutable access to the entry behind `handle`, if it is still live.
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index() as usize)
            .filter(|slot| slot.handle == handle)
            .and_then(|slot| slot.value.as_mut())
    }

    /// Returns `true` if `handle` refers to a live entry.
    #[inline]
    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    /// Removes and returns the entry behind `handle`.
    ///
    /// The slot's version is bumped and the slot becomes the new head of
    /// the free list, so stale copies of `handle` stop resolving.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        let slot = self
            .slots
            .get_mut(handle.index() as usize)
            .filter(|slot| slot.handle == handle)?;
        let value = slot.value.take()?;
        slot.handle = Handle::new(handle.version().wrapping_add(1), self.free_head);
        self.free_head = handle.index();
        self.len -= 1;
        Some(value)
    }

    /// Iterates over live entries with their handles.
    ///
    /// Free slots are skipped by position: their stored index field points
    /// at the next free slot instead of at themselves.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(position, slot)| slot.handle.index() as usize == *position)
            .filter_map(|(_, slot)| slot.value.as_ref().map(|value| (slot.handle, value)))
    }

    /// Frees every entry, bumping the version of each live slot.
    ///
    /// The free list is rebuilt in ascending linked order, so subsequent
    /// insertions fill the arena from slot `0` upward.
    pub fn clear_all(&mut self) {
        self.free_head = NO_SLOT;
        for position in (0..self.slots.len()).rev() {
            let slot = &mut self.slots[position];
            let mut version = slot.handle.version();
            if slot.value.take().is_some() {
                version = version.wrapping_add(1);
            }
            slot.handle = Handle::new(version, self.free_head);
            self.free_head = position as u32;
        }
        self.len = 0;
    }

    /// Discards all liveness without bumping versions.
    ///
    /// Unlike [`Arena::clear_all`], handles issued before the reset may be
    /// re-issued verbatim for the same slots; use only when no stale
    /// handles can survive the reset.
    pub fn reset(&mut self) {
        self.free_head = NO_SLOT;
        for position in (0..self.slots.len()).rev() {
            let slot = &mut self.slots[position];
            slot.value = None;
            slot.handle = Handle::new(slot.handle.version(), self.free_head);
            self.free_head = position as u32;
        }
        self.len = 0;
    }
}
