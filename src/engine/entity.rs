//! Entity identity and the generational registry.
//!
//! Entities are lightweight, versioned handles that reference rows in
//! archetype storage. This module is responsible for:
//!
//! - issuing stable entity identifiers,
//! - detecting stale handles via per-slot generations,
//! - mapping each live entity to its archetype and row.
//!
//! ## Entity model
//!
//! An [`Entity`] is the value pair `(generation, id)`. The `id` indexes the
//! registry's slot table; the `generation` is a liveness epoch that is
//! bumped whenever the slot is freed, so handles issued before a despawn
//! stop matching afterwards. Two entities compare equal only if both
//! fields match.
//!
//! ## Reuse
//!
//! Freed ids are pushed onto a free list and reused LIFO before any fresh
//! capacity is touched. When the free list runs dry, capacity doubles and
//! the fresh ids are queued *behind* all freed ids, lowest id first.

use crate::engine::error::{AllocationError, UnknownEntityError};
use crate::engine::types::{ArchetypeID, EntityID, Generation, RowIndex, MIN_REGISTRY_GROWTH};

/// Versioned handle to an entity.
///
/// ## Invariants
/// - A handle is live iff `generation` matches the registry slot for `id`.
/// - Generation `0` is valid: the first occupant of a fresh slot is issued
///   generation `0`.
///
/// ## Notes
/// `Entity` values are cheap to copy and compare and carry no borrow of
/// the world.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Entity {
    /// Liveness epoch of the slot at the time this handle was issued.
    pub generation: Generation,

    /// Index of the registry slot owning this entity.
    pub id: EntityID,
}

/// Per-id record tracking liveness and storage location.
///
/// ## Invariants
/// - For a live entity `e`, `slot.generation == e.generation`.
/// - `archetype` and `row` are meaningful only while the slot is live, and
///   always reflect the entity's actual table row.

#[derive(Clone, Copy, Debug, Default)]
pub struct EntitySlot {
    /// Current liveness epoch of this slot.
    pub generation: Generation,

    /// Archetype currently holding the entity's row.
    pub archetype: ArchetypeID,

    /// Row index inside that archetype's table.
    pub row: RowIndex,
}

/// Generational entity registry.
///
/// ## Design
/// Slots and the free list are two independent arrays so capacity growth
/// amortizes separately for each. The id space is always the contiguous
/// range `[0, capacity)`; the free list holds exactly the ids not owned by
/// a live entity, without duplicates.

#[derive(Default)]
pub struct Entities {
    slots: Vec<EntitySlot>,
    free_list: Vec<EntityID>,
}

impl Entities {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-sized for `capacity` entities.
    pub fn with_capacity(capacity: usize) -> Result<Self, AllocationError> {
        let mut entities = Self::new();
        entities.grow(capacity)?;
        Ok(entities)
    }

    /// Total id space, live or free.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of live entities.
    #[inline]
    pub fn live_count(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    /// Extends the id space to at least `capacity` slots.
    ///
    /// ## Behavior
    /// Fresh ids are queued in descending order *ahead* of the existing
    /// free list, so allocation keeps draining freed ids first and then
    /// takes fresh ids lowest-first.
    ///
    /// ## Errors
    /// Fails with `AllocationError` when the backing arrays cannot grow;
    /// the registry is left unchanged in that case.

    pub fn grow(&mut self, capacity: usize) -> Result<(), AllocationError> {
        let current = self.slots.len();
        if capacity <= current {
            return Ok(());
        }
        let additional = capacity - current;
        self.slots
            .try_reserve(additional)
            .and_then(|_| self.free_list.try_reserve(additional))
            .map_err(|_| AllocationError {
                bytes: additional * std::mem::size_of::<EntitySlot>(),
            })?;

        self.slots
            .resize(capacity, EntitySlot::default());
        self.free_list
            .splice(0..0, (current as EntityID..capacity as EntityID).rev());
        Ok(())
    }

    /// Allocates an entity, reusing a freed id when one exists.
    ///
    /// ## Behavior
    /// - Pops an id from the tail of the free list.
    /// - When the free list is empty, capacity doubles (minimum 1024
    ///   slots) before the pop.
    /// - The returned handle adopts the slot's *current* generation; a
    ///   reused slot therefore hands out the post-bump generation.

    pub fn alloc(&mut self) -> Result<Entity, AllocationError> {
        if self.free_list.is_empty() {
            let target = (self.slots.len() * 2).max(MIN_REGISTRY_GROWTH);
            self.grow(target)?;
        }
        let id = self
            .free_list
            .pop()
            .expect("free list is non-empty after growth");
        Ok(Entity {
            generation: self.slots[id as usize].generation,
            id,
        })
    }

    /// Frees an entity, invalidating every copy of its handle.
    ///
    /// ## Behavior
    /// Validates the generation, bumps it on the slot, and returns the id
    /// to the free list so it is the next to be reused.
    ///
    /// ## Errors
    /// Fails with `UnknownEntityError` when the handle is stale or out of
    /// range; freeing an already-dead entity is safe to ignore.

    pub fn free(&mut self, entity: Entity) -> Result<(), UnknownEntityError> {
        let slot = self
            .slots
            .get_mut(entity.id as usize)
            .filter(|slot| slot.generation == entity.generation)
            .ok_or(UnknownEntityError { entity })?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(entity.id);
        Ok(())
    }

    /// Returns the slot of a live entity.
    pub fn get(&self, entity: Entity) -> Result<&EntitySlot, UnknownEntityError> {
        self.slots
            .get(entity.id as usize)
            .filter(|slot| slot.generation == entity.generation)
            .ok_or(UnknownEntityError { entity })
    }

    /// Returns the slot of a live entity for location updates.
    pub fn get_mut(&mut self, entity: Entity) -> Result<&mut EntitySlot, UnknownEntityError> {
        self.slots
            .get_mut(entity.id as usize)
            .filter(|slot| slot.generation == entity.generation)
            .ok_or(UnknownEntityError { entity })
    }

    /// Returns `true` if `entity` is live.
    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.get(entity).is_ok()
    }

    /// Frees every live entity and bumps its generation.
    ///
    /// Handles issued before the clear fail with `UnknownEntityError`
    /// afterwards, exactly as if each entity had been freed individually.
    /// The rebuilt free list drains lowest id first.

    pub fn clear(&mut self) {
        let mut is_free = vec![false; self.slots.len()];
        for &id in &self.free_list {
            is_free[id as usize] = true;
        }
        for (id, slot) in self.slots.iter_mut().enumerate() {
            if !is_free[id] {
                slot.generation = slot.generation.wrapping_add(1);
            }
        }
        self.free_list.clear();
        self.free_list
            .extend((0..self.slots.len() as EntityID).rev());
    }
}
