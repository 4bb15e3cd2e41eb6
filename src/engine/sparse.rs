//! Sparse-to-dense index mappings.
//!
//! A sparse set is a bijection between a sparse `index` space and a dense
//! `[0, count)` slot space, giving O(1) insertion, membership tests,
//! lookup, and swap-removal while keeping all values contiguous for
//! iteration.
//!
//! Two flavors exist: [`SparseSet`] stores typed values, and
//! [`BlobSparseSet`] stores opaque uniform rows backed by a
//! [`BlobVec`](crate::engine::storage::BlobVec). Both encode membership
//! with a **1-based** dense slot in the sparse array, so `0` means
//! *absent* and sparse storage can grow by zero fill.
//!
//! ## Invariants
//! - For every live `index`: `sparse[index] == k` with `k >= 1` and
//!   `indices[k - 1] == index`.
//! - `dense` and `indices` always have equal length.

use crate::engine::error::AllocationError;
use crate::engine::storage::{BlobVec, DropFn};

/// Sparse set of typed values.
pub struct SparseSet<T> {
    sparse: Vec<u32>,
    dense: Vec<T>,
    indices: Vec<u32>,
}

impl<T> Default for SparseSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SparseSet<T> {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            sparse: Vec::new(),
            dense: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Number of live entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Returns `true` if the set holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Returns `true` if `index` is present.
    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        self.sparse.get(index).is_some_and(|&slot| slot != 0)
    }

    #[inline]
    fn ensure_sparse(&mut self, index: usize) {
        if index >= self.sparse.len() {
            self.sparse.resize(index + 1, 0);
        }
    }

    /// Inserts `value` at `index`, replacing and returning any previous
    /// value stored there.
    pub fn insert(&mut self, index: usize, value: T) -> Option<T> {
        self.ensure_sparse(index);
        match self.sparse[index] {
            0 => {
                self.dense.push(value);
                self.indices.push(index as u32);
                self.sparse[index] = self.dense.len() as u32;
                None
            }
            slot => Some(std::mem::replace(&mut self.dense[slot as usize - 1], value)),
        }
    }

    /// Returns the entry at `index`, creating it with `create` if absent.
    pub fn get_or_insert_with(&mut self, index: usize, create: impl FnOnce() -> T) -> &mut T {
        self.ensure_sparse(index);
        if self.sparse[index] == 0 {
            self.dense.push(create());
            self.indices.push(index as u32);
            self.sparse[index] = self.dense.len() as u32;
        }
        let slot = self.sparse[index] as usize;
        &mut self.dense[slot - 1]
    }

    /// Returns the entry at `index`, creating a default value if absent.
    pub fn get_or_create(&mut self, index: usize) -> &mut T
    where
        T: Default,
    {
        self.get_or_insert_with(index, T::default)
    }

    /// Shared access to the value at `index`, if present.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        match self.sparse.get(index) {
            Some(&slot) if slot != 0 => Some(&self.dense[slot as usize - 1]),
            _ => None,
        }
    }

    /// Mutable access to the value at `index`, if present.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        match self.sparse.get(index) {
            Some(&slot) if slot != 0 => Some(&mut self.dense[slot as usize - 1]),
            _ => None,
        }
    }

    /// Removes and returns the value at `index`.
    ///
    /// The dense tail is swapped into the vacated slot and its sparse entry
    /// is fixed up, so removal is O(1).
    ///
    /// ## Panics
    /// Panics if `index` is absent.
    pub fn swap_remove(&mut self, index: usize) -> T {
        let slot = self.sparse[index] as usize;
        assert!(slot != 0, "sparse set index {index} is absent");

        self.sparse[index] = 0;
        let removed = self.dense.swap_remove(slot - 1);
        self.indices.swap_remove(slot - 1);
        if slot - 1 < self.dense.len() {
            let moved_index = self.indices[slot - 1] as usize;
            self.sparse[moved_index] = slot as u32;
        }
        removed
    }

    /// Iterates over the dense values.
    #[inline]
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.dense.iter()
    }

    /// Iterates mutably over the dense values.
    #[inline]
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.dense.iter_mut()
    }

    /// Iterates over the live sparse indices in dense order.
    #[inline]
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().map(|&index| index as usize)
    }
}

/// Sparse set of opaque uniform rows.
///
/// Rows are owned by the set: `discard` and `Drop` run the row destructor
/// when one was provided.
pub struct BlobSparseSet {
    sparse: Vec<u32>,
    dense: BlobVec,
    indices: Vec<u32>,
    drop_fn: Option<DropFn>,
}

impl BlobSparseSet {
    /// Creates an empty set of rows of `item_size` bytes aligned to
    /// `align`, with an optional destructor for stored rows.
    pub fn new(item_size: usize, align: usize, drop_fn: Option<DropFn>) -> Self {
        Self {
            sparse: Vec::new(),
            dense: BlobVec::new(item_size, align),
            indices: Vec::new(),
            drop_fn,
        }
    }

    /// Number of live entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Returns `true` if the set holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Returns `true` if `index` is present.
    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        self.sparse.get(index).is_some_and(|&slot| slot != 0)
    }

    /// Copies one row from `source` into the entry for `index`.
    ///
    /// A pre-existing row is dropped and overwritten; otherwise a dense
    /// slot is appended.
    ///
    /// ## Safety
    /// `source` must point to one readable row whose ownership transfers to
    /// the set.
    pub unsafe fn insert_bytes(
        &mut self,
        index: usize,
        source: *const u8,
    ) -> Result<(), AllocationError> {
        if index >= self.sparse.len() {
            self.sparse.resize(index + 1, 0);
        }
        match self.sparse[index] {
            0 => {
                self.dense.reserve(self.dense.len() + 1)?;
                unsafe { self.dense.push_bytes(source) };
                self.indices.push(index as u32);
                self.sparse[index] = self.dense.len() as u32;
            }
            slot => unsafe {
                let row = self.dense.bytes_at(slot as usize - 1);
                if let Some(drop_fn) = self.drop_fn {
                    drop_fn(row);
                }
                std::ptr::copy_nonoverlapping(source, row, self.dense.item_size());
            },
        }
        Ok(())
    }

    /// Returns a pointer to the row stored for `index`, if present.
    #[inline]
    pub fn get_ptr(&self, index: usize) -> Option<*mut u8> {
        match self.sparse.get(index) {
            Some(&slot) if slot != 0 => {
                Some(unsafe { self.dense.bytes_at(slot as usize - 1) })
            }
            _ => None,
        }
    }

    /// Drops the row stored for `index` and removes the entry.
    ///
    /// The dense tail row is swapped into the vacated slot, its sparse
    /// entry is fixed up, and `indices` shrinks by exactly one.
    ///
    /// ## Panics
    /// Panics if `index` is absent.
    pub fn discard(&mut self, index: usize) {
        let slot = self.sparse[index] as usize;
        assert!(slot != 0, "blob sparse set index {index} is absent");

        self.sparse[index] = 0;
        unsafe {
            let row = self.dense.bytes_at(slot - 1);
            if let Some(drop_fn) = self.drop_fn {
                drop_fn(row);
            }
            self.dense.swap_remove(slot - 1);
        }
        self.indices.swap_remove(slot - 1);
        if slot - 1 < self.indices.len() {
            let moved_index = self.indices[slot - 1] as usize;
            self.sparse[moved_index] = slot as u32;
        }
    }
}

impl Drop for BlobSparseSet {
    fn drop(&mut self) {
        if let Some(drop_fn) = self.drop_fn {
            for dense_row in 0..self.dense.len() {
                unsafe { drop_fn(self.dense.bytes_at(dense_row)) };
            }
        }
    }
}
