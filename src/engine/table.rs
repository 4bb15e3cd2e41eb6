//! Columnar storage for one archetype.
//!
//! A [`Table`] owns one [`Column`] per component plus a parallel roster of
//! the entities occupying its rows. All columns and the roster are indexed
//! by the same row, entities stay densely packed via swap-remove, and the
//! column set is frozen once the first row exists.
//!
//! ## Invariants
//! - After every public operation, every column's length equals
//!   `entities.len()`.
//! - `entities[row] == e` implies the world's slot for `e` points back at
//!   this table and `row`.
//! - Capacity is uniform: [`Table::reserve`] propagates one capacity to
//!   the roster and every column.

use std::ptr;

use crate::engine::component::ComponentDescriptor;
use crate::engine::entity::Entity;
use crate::engine::error::AllocationError;
use crate::engine::sparse::SparseSet;
use crate::engine::storage::BlobVec;
use crate::engine::types::{hash_type_name, ComponentID, RowIndex};

/// Storage for one component across all rows of one table.
pub struct Column {
    component_id: ComponentID,
    descriptor: ComponentDescriptor,
    data: BlobVec,
}

impl Column {
    fn with_capacity(
        component_id: ComponentID,
        descriptor: ComponentDescriptor,
        rows: usize,
    ) -> Result<Self, AllocationError> {
        Ok(Self {
            component_id,
            descriptor,
            data: BlobVec::with_capacity(descriptor.size, descriptor.align.max(1), rows)?,
        })
    }

    /// Component stored in this column.
    #[inline]
    pub fn component_id(&self) -> ComponentID {
        self.component_id
    }

    /// Number of initialized rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the column has no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Writes a value into a freshly extended, uninitialized row.
    ///
    /// ## Safety
    /// `row` must be within the column's logical length, uninitialized,
    /// and `source` must point to one value whose ownership transfers in.
    pub(crate) unsafe fn initialize(&mut self, row: usize, source: *const u8) {
        debug_assert!(row < self.data.len());
        unsafe {
            ptr::copy_nonoverlapping(source, self.data.bytes_at(row), self.descriptor.size);
        }
    }

    /// Drops the current value at `row`, then writes a replacement.
    ///
    /// ## Safety
    /// `row` must hold an initialized value; `source` as in
    /// [`Column::initialize`].
    pub(crate) unsafe fn replace(&mut self, row: usize, source: *const u8) {
        debug_assert!(row < self.data.len());
        unsafe {
            let destination = self.data.bytes_at(row);
            if let Some(drop_fn) = self.descriptor.drop_fn {
                drop_fn(destination);
            }
            ptr::copy_nonoverlapping(source, destination, self.descriptor.size);
        }
    }

    /// Drops the value at `row` and moves the tail row into the hole.
    ///
    /// ## Safety
    /// `row` must be within the column's logical length.
    unsafe fn swap_remove_and_drop(&mut self, row: usize) {
        unsafe {
            if let Some(drop_fn) = self.descriptor.drop_fn {
                drop_fn(self.data.bytes_at(row));
            }
            self.data.swap_remove(row);
        }
    }

    fn reserve(&mut self, rows: usize) -> Result<(), AllocationError> {
        self.data.reserve(rows)
    }

    #[inline]
    fn assert_type<T: 'static>(&self) {
        debug_assert_eq!(
            self.descriptor.type_id,
            hash_type_name(std::any::type_name::<T>()),
            "column for {} reinterpreted as {}",
            self.descriptor.type_name,
            std::any::type_name::<T>(),
        );
        debug_assert_eq!(self.descriptor.size, std::mem::size_of::<T>());
    }

    /// Reinterprets the column as a slice of `T`.
    ///
    /// The caller guarantees `T` matches the stored descriptor; a mismatch
    /// is a programmer error caught by debug assertions.
    pub fn as_slice<T: 'static>(&self) -> &[T] {
        self.assert_type::<T>();
        unsafe { std::slice::from_raw_parts(self.data.as_ptr().cast::<T>(), self.data.len()) }
    }

    /// Reinterprets the column as a mutable slice of `T`.
    pub fn as_mut_slice<T: 'static>(&mut self) -> &mut [T] {
        self.assert_type::<T>();
        unsafe {
            std::slice::from_raw_parts_mut(self.data.as_ptr().cast::<T>(), self.data.len())
        }
    }
}

impl Drop for Column {
    fn drop(&mut self) {
        if let Some(drop_fn) = self.descriptor.drop_fn {
            for row in 0..self.data.len() {
                unsafe { drop_fn(self.data.bytes_at(row)) };
            }
        }
    }
}

/// One archetype's columns plus its entity roster.
#[derive(Default)]
pub struct Table {
    columns: SparseSet<Column>,
    entities: Vec<Entity>,
    capacity: usize,
}

impl Table {
    /// Creates an empty table with no columns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if the table has no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Uniform row capacity shared by the roster and every column.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entities occupying the rows, in row order.
    #[inline]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Returns `true` if the table stores `component_id`.
    #[inline]
    pub fn has_column(&self, component_id: ComponentID) -> bool {
        self.columns.contains(component_id as usize)
    }

    /// Number of columns.
    #[inline]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Iterates over the stored component ids in column insertion order.
    pub fn column_ids(&self) -> impl Iterator<Item = ComponentID> + '_ {
        self.columns.indices().map(|index| index as ComponentID)
    }

    /// Iterates over the columns in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.values()
    }

    /// Adds a column for `component_id`.
    ///
    /// Tables freeze their column set at the first row, so this is only
    /// legal while the table is empty; violating that is a programmer
    /// error.
    ///
    /// ## Panics
    /// Panics if the table has rows or already stores `component_id`.
    pub fn add_column(
        &mut self,
        component_id: ComponentID,
        descriptor: &ComponentDescriptor,
    ) -> Result<(), AllocationError> {
        assert!(
            self.entities.is_empty(),
            "column set is frozen once a table has rows"
        );
        assert!(
            !self.has_column(component_id),
            "component {component_id} already has a column"
        );
        let column = Column::with_capacity(component_id, *descriptor, self.capacity)?;
        self.columns.insert(component_id as usize, column);
        Ok(())
    }

    /// Grows the table so at least `rows` rows fit, doubling from the
    /// current capacity and propagating the new capacity to every column.
    pub fn reserve(&mut self, rows: usize) -> Result<(), AllocationError> {
        if rows <= self.capacity {
            return Ok(());
        }
        let target = rows.max(self.capacity * 2);
        self.entities
            .try_reserve(target - self.entities.len())
            .map_err(|_| AllocationError {
                bytes: target * std::mem::size_of::<Entity>(),
            })?;
        for column in self.columns.values_mut() {
            column.reserve(target)?;
        }
        self.capacity = target;
        Ok(())
    }

    /// Appends `entity` and extends every column by one logical row.
    ///
    /// The new row of each column is uninitialized until written through
    /// [`Column::initialize`] or a transfer.
    pub fn add_entity(&mut self, entity: Entity) -> Result<RowIndex, AllocationError> {
        let row = self.entities.len();
        self.reserve(row + 1)?;
        self.entities.push(entity);
        for column in self.columns.values_mut() {
            column.data.set_len(row + 1);
        }
        Ok(row as RowIndex)
    }

    /// Shared access to the column for `component_id`.
    ///
    /// ## Panics
    /// Panics if the component has no column here; check
    /// [`Table::has_column`] first.
    pub fn column<T: 'static>(&self, component_id: ComponentID) -> &[T] {
        self.columns
            .get(component_id as usize)
            .unwrap_or_else(|| panic!("component {component_id} has no column in this table"))
            .as_slice::<T>()
    }

    /// Mutable access to the column for `component_id`.
    pub fn column_mut<T: 'static>(&mut self, component_id: ComponentID) -> &mut [T] {
        self.columns
            .get_mut(component_id as usize)
            .unwrap_or_else(|| panic!("component {component_id} has no column in this table"))
            .as_mut_slice::<T>()
    }

    #[inline]
    pub(crate) fn column_storage_mut(&mut self, component_id: ComponentID) -> Option<&mut Column> {
        self.columns.get_mut(component_id as usize)
    }

    /// Removes the row at `row`, dropping each column's value.
    ///
    /// Returns the entity that was relocated into the hole, or `None` when
    /// the removed row was the tail.
    pub fn swap_remove(&mut self, row: RowIndex) -> Option<Entity> {
        let row = row as usize;
        debug_assert!(row < self.entities.len());
        for column in self.columns.values_mut() {
            unsafe { column.swap_remove_and_drop(row) };
        }
        let is_last = row == self.entities.len() - 1;
        self.entities.swap_remove(row);
        if is_last {
            None
        } else {
            Some(self.entities[row])
        }
    }

    /// Moves the row at `row` into `destination`, whose column set must be
    /// a superset of this table's.
    ///
    /// ## Behavior
    /// - The entity is appended to `destination` first; growth happens
    ///   before any move so a failed allocation leaves both tables intact.
    /// - Shared columns transfer bytes without dropping (ownership moves).
    /// - Columns absent from `destination` have their value dropped.
    /// - The vacated source row is filled by the tail via swap-remove.
    ///
    /// ## Returns
    /// The entity relocated into the vacated source row (if any) and the
    /// row index the moved entity occupies in `destination`.
    pub fn transfer_row(
        &mut self,
        row: RowIndex,
        destination: &mut Table,
    ) -> Result<(Option<Entity>, RowIndex), AllocationError> {
        let row = row as usize;
        debug_assert!(row < self.entities.len());

        destination.reserve(destination.len() + 1)?;
        let new_row = destination.add_entity(self.entities[row])?;

        for column in self.columns.values_mut() {
            match destination.columns.get_mut(column.component_id as usize) {
                Some(target) => unsafe {
                    ptr::copy_nonoverlapping(
                        column.data.bytes_at(row),
                        target.data.bytes_at(new_row as usize),
                        column.descriptor.size,
                    );
                    column.data.swap_remove(row);
                },
                None => unsafe { column.swap_remove_and_drop(row) },
            }
        }

        let is_last = row == self.entities.len() - 1;
        self.entities.swap_remove(row);
        let replacement = if is_last {
            None
        } else {
            Some(self.entities[row])
        };
        Ok((replacement, new_row))
    }

    /// Drops every row, keeping columns and capacity.
    pub fn clear(&mut self) {
        for column in self.columns.values_mut() {
            if let Some(drop_fn) = column.descriptor.drop_fn {
                for row in 0..column.data.len() {
                    unsafe { drop_fn(column.data.bytes_at(row)) };
                }
            }
            column.data.set_len(0);
        }
        self.entities.clear();
    }
}
