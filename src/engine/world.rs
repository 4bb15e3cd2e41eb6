//! World management and the archetype graph.
//!
//! This module defines the central orchestration layer of the ECS,
//! responsible for:
//!
//! * owning the entity registry, tables, archetypes, and the component
//!   descriptor list,
//! * interning component descriptors into world-scoped ids,
//! * locating or materializing the table whose column set matches an
//!   entity's components,
//! * migrating entity rows between tables when their component set grows.
//!
//! ## Execution model
//!
//! The world is a single-threaded mutable value. No operation suspends,
//! locks, or re-enters: component destructors invoked during a mutation
//! must not touch the world.
//!
//! ## Transition ordering
//!
//! An archetype transition proceeds: append to destination → move or drop
//! source columns → swap-remove at source → fix up the relocated
//! replacement's slot → update the moved entity's slot. Observers after
//! the call always see the post-state.
//!
//! ## Failure model
//!
//! Entity-path errors collapse to `UnknownEntity`; capacity-growth errors
//! collapse to `Allocation`, and growth always precedes mutation so a
//! failed operation leaves entities and tables consistent. Everything else
//! (reading an absent component, writing through a handle known to be
//! dead) is a programmer error and panics.

use ahash::AHashMap;
use log::trace;

use crate::engine::component::{Bundle, Component, ComponentDescriptor};
use crate::engine::entity::{Entities, Entity};
use crate::engine::error::{AllocationError, ECSResult};
use crate::engine::table::Table;
use crate::engine::types::{
    hash_bundle, hash_instance, hash_signature, hash_type_name, ArchetypeID, ComponentID,
    RowIndex, TypeHash, BASE_TABLE_CAPACITY,
};

/// One node of the archetype graph.
///
/// ## Purpose
/// Binds an archetype to its backing table and memoizes bundle-insertion
/// edges: "starting here, after inserting bundle `B`, land there". Edge
/// targets are idempotent: a bundle whose components are all already
/// present records a self-loop so the next traversal is O(1).
pub struct Archetype {
    table_id: u32,
    edges_added: AHashMap<TypeHash, ArchetypeID>,
}

impl Archetype {
    /// Index of the table backing this archetype.
    #[inline]
    pub fn table_id(&self) -> usize {
        self.table_id as usize
    }
}

/// Archetype-based ECS world.
///
/// ## Design
/// Entities live in dense, cache-friendly tables partitioned by the exact
/// set of components each entity carries. Spawned entities start in the
/// empty archetype (archetype `0`, zero columns); inserting a bundle moves
/// them along memoized graph edges into the table matching their new
/// component set.
///
/// ## Invariants
/// - Every column of every table has exactly as many rows as the table has
///   entities.
/// - For every live entity, the registry slot and the table roster agree
///   on archetype and row.
/// - No two archetypes share a sorted component-id signature.
pub struct World {
    entities: Entities,
    tables: Vec<Table>,
    descriptors: Vec<ComponentDescriptor>,
    component_ids: AHashMap<TypeHash, ComponentID>,
    archetypes: Vec<Archetype>,
    archetype_by_signature: AHashMap<u64, ArchetypeID>,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Creates a world with the empty archetype materialized.
    pub fn new() -> Self {
        let mut world = Self {
            entities: Entities::new(),
            tables: Vec::new(),
            descriptors: Vec::new(),
            component_ids: AHashMap::new(),
            archetypes: Vec::new(),
            archetype_by_signature: AHashMap::new(),
        };
        world.tables.push(Table::new());
        world.archetypes.push(Archetype {
            table_id: 0,
            edges_added: AHashMap::new(),
        });
        world.archetype_by_signature.insert(hash_signature(&[]), 0);
        world
    }

    /// Creates a world pre-sized for the expected entity, table, and
    /// component counts.
    ///
    /// ## Errors
    /// Fails with `Allocation` if any backing array cannot be pre-sized.
    pub fn with_capacity(
        entity_capacity: usize,
        table_capacity: usize,
        component_capacity: usize,
    ) -> ECSResult<Self> {
        let mut world = Self::new();
        world.entities.grow(entity_capacity)?;
        world.tables[0].reserve(entity_capacity)?;
        world
            .tables
            .try_reserve(table_capacity)
            .and_then(|_| world.descriptors.try_reserve(component_capacity))
            .map_err(|_| AllocationError {
                bytes: table_capacity * std::mem::size_of::<Table>(),
            })?;
        trace!(
            "world initialized (entities {entity_capacity}, tables {table_capacity}, components {component_capacity})"
        );
        Ok(world)
    }

    /// Number of live entities.
    #[inline]
    pub fn entity_count(&self) -> usize {
        self.entities.live_count()
    }

    /// Number of materialized archetypes, the empty archetype included.
    #[inline]
    pub fn archetype_count(&self) -> usize {
        self.archetypes.len()
    }

    /// Number of tables, the empty archetype's included.
    #[inline]
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// The table backing `archetype`.
    ///
    /// ## Panics
    /// Panics if `archetype` was never materialized.
    pub fn table(&self, archetype: ArchetypeID) -> &Table {
        &self.tables[self.archetypes[archetype as usize].table_id()]
    }

    /// Returns the archetype and row currently holding `entity`.
    pub fn location(&self, entity: Entity) -> ECSResult<(ArchetypeID, RowIndex)> {
        let slot = self.entities.get(entity)?;
        Ok((slot.archetype, slot.row))
    }

    /// Interns `descriptor` and returns its world-scoped component id.
    ///
    /// ## Behavior
    /// Ids are assigned monotonically the first time an
    /// `instance_type_id` is seen and are never reassigned, so the result
    /// is deterministic for a given `(type, name)` within this world.
    pub fn component_id(&mut self, descriptor: &ComponentDescriptor) -> ComponentID {
        if let Some(&id) = self.component_ids.get(&descriptor.instance_type_id) {
            return id;
        }
        let id = self.descriptors.len() as ComponentID;
        self.descriptors.push(*descriptor);
        self.component_ids.insert(descriptor.instance_type_id, id);
        trace!("interned component {} as id {id}", descriptor.type_name);
        id
    }

    #[inline]
    fn lookup_component<T: Component>(&self, name: Option<&'static str>) -> Option<ComponentID> {
        let type_id = hash_type_name(std::any::type_name::<T>());
        self.component_ids
            .get(&hash_instance(type_id, name))
            .copied()
    }

    /// Spawns an empty entity and returns a reference for follow-up calls.
    ///
    /// ## Behavior
    /// The entity is allocated from the registry (reusing freed ids LIFO),
    /// appended to the empty archetype's table, and its slot is recorded.
    /// All growth happens before any mutation.
    ///
    /// ## Errors
    /// Fails only with `Allocation`.
    pub fn spawn(&mut self) -> ECSResult<EntityRef<'_>> {
        let reserve_len = self.tables[0].len() + 1;
        self.tables[0].reserve(reserve_len)?;
        let entity = self.entities.alloc()?;
        let row = self.tables[0]
            .add_entity(entity)
            .expect("capacity was reserved above");
        let slot = self
            .entities
            .get_mut(entity)
            .expect("freshly allocated entity is live");
        slot.archetype = 0;
        slot.row = row;
        Ok(EntityRef {
            world: self,
            entity,
        })
    }

    /// Despawns `entity`, dropping each of its component values once.
    ///
    /// ## Behavior
    /// The registry slot's generation is bumped (invalidating every copy
    /// of the handle), the row is swap-removed from its table, and the
    /// slot of the entity relocated into the hole, if any, is fixed up.
    ///
    /// ## Errors
    /// Fails with `UnknownEntity` for a stale or out-of-range handle;
    /// despawning an already-dead entity is safe to ignore.
    pub fn despawn(&mut self, entity: Entity) -> ECSResult<()> {
        let slot = *self.entities.get(entity)?;
        self.entities
            .free(entity)
            .expect("slot was validated above");
        let table_id = self.archetypes[slot.archetype as usize].table_id();
        if let Some(replacement) = self.tables[table_id].swap_remove(slot.row) {
            self.entities
                .get_mut(replacement)
                .expect("relocated entity is live")
                .row = slot.row;
        }
        Ok(())
    }

    /// Inserts a bundle of components into `entity`.
    ///
    /// ## Behavior
    /// 1. The source archetype's edge cache is consulted with the bundle's
    ///    composition key; on a miss, the destination is resolved (and
    ///    materialized if its signature was never seen) and the edge is
    ///    cached, self-loops included.
    /// 2. If the destination differs, the entity's row transfers between
    ///    tables and both affected slots are updated.
    /// 3. The bundle's values are written: components new to the entity
    ///    initialize their rows, components it already carried are
    ///    overwritten with the old value dropped. Re-inserting a present
    ///    component is legal and clobbers; with duplicates in one bundle,
    ///    the most recent value wins.
    ///
    /// ## Errors
    /// Fails with `UnknownEntity` for a stale handle and `Allocation` when
    /// storage cannot grow; growth precedes mutation, so on failure the
    /// entity and all tables keep their pre-call state.
    pub fn insert<B: Bundle>(&mut self, entity: Entity, bundle: B) -> ECSResult<()> {
        let slot = *self.entities.get(entity)?;
        let source = slot.archetype;

        let mut descriptors = Vec::new();
        bundle.descriptors(&mut descriptors);

        let mut bundle_ids = Vec::with_capacity(descriptors.len());
        let mut instance_ids = Vec::with_capacity(descriptors.len());
        for descriptor in &descriptors {
            bundle_ids.push(self.component_id(descriptor));
            instance_ids.push(descriptor.instance_type_id);
        }
        let edge_key = hash_bundle(&instance_ids);

        let destination = match self.archetypes[source as usize].edges_added.get(&edge_key) {
            Some(&cached) => cached,
            None => {
                let resolved = self.resolve_destination(source, &bundle_ids)?;
                self.archetypes[source as usize]
                    .edges_added
                    .insert(edge_key, resolved);
                resolved
            }
        };

        let source_table_id = self.archetypes[source as usize].table_id();
        // Components absent from the source table land in uninitialized
        // rows and must be initialized rather than replaced.
        let fresh: Vec<bool> = {
            let source_table = &self.tables[source_table_id];
            bundle_ids
                .iter()
                .map(|&id| !source_table.has_column(id))
                .collect()
        };

        let row = if destination != source {
            let destination_table_id = self.archetypes[destination as usize].table_id();
            let (source_table, destination_table) =
                Self::table_pair_mut(&mut self.tables, source_table_id, destination_table_id);
            let (replacement, new_row) = source_table.transfer_row(slot.row, destination_table)?;
            if let Some(replacement) = replacement {
                self.entities
                    .get_mut(replacement)
                    .expect("relocated entity is live")
                    .row = slot.row;
            }
            let entity_slot = self
                .entities
                .get_mut(entity)
                .expect("slot was validated above");
            entity_slot.archetype = destination;
            entity_slot.row = new_row;
            new_row
        } else {
            slot.row
        };

        let table = &mut self.tables[self.archetypes[destination as usize].table_id()];
        let mut ordinal = 0;
        let mut written: Vec<ComponentID> = Vec::new();
        bundle.write_components(&mut |value| {
            let id = bundle_ids[ordinal];
            let column = table
                .column_storage_mut(id)
                .expect("destination table has a column for every bundle component");
            let first_write = fresh[ordinal] && !written.contains(&id);
            unsafe {
                if first_write {
                    column.initialize(row as usize, value);
                } else {
                    column.replace(row as usize, value);
                }
            }
            if fresh[ordinal] {
                written.push(id);
            }
            ordinal += 1;
        });
        Ok(())
    }

    /// Resolves the archetype an entity in `source` lands in after
    /// inserting the (already interned) `bundle_ids`.
    fn resolve_destination(
        &mut self,
        source: ArchetypeID,
        bundle_ids: &[ComponentID],
    ) -> Result<ArchetypeID, AllocationError> {
        let source_table = &self.tables[self.archetypes[source as usize].table_id()];

        let mut new_ids: Vec<ComponentID> = Vec::new();
        for &id in bundle_ids {
            if !source_table.has_column(id) && !new_ids.contains(&id) {
                new_ids.push(id);
            }
        }
        if new_ids.is_empty() {
            return Ok(source);
        }

        let mut signature: Vec<ComponentID> = source_table.column_ids().collect();
        signature.extend(new_ids);
        signature.sort_unstable();

        let signature_hash = hash_signature(&signature);
        if let Some(&existing) = self.archetype_by_signature.get(&signature_hash) {
            return Ok(existing);
        }

        let mut table = Table::new();
        for &id in &signature {
            table.add_column(id, &self.descriptors[id as usize])?;
        }
        table.reserve(BASE_TABLE_CAPACITY)?;

        let archetype_id = self.archetypes.len() as ArchetypeID;
        let table_id = self.tables.len() as u32;
        self.tables.push(table);
        self.archetypes.push(Archetype {
            table_id,
            edges_added: AHashMap::new(),
        });
        self.archetype_by_signature
            .insert(signature_hash, archetype_id);
        trace!(
            "materialized archetype {archetype_id} with {} columns",
            signature.len()
        );
        Ok(archetype_id)
    }

    fn table_pair_mut(tables: &mut [Table], a: usize, b: usize) -> (&mut Table, &mut Table) {
        assert!(a != b, "source and destination table must differ");
        if a < b {
            let (head, tail) = tables.split_at_mut(b);
            (&mut head[a], &mut tail[0])
        } else {
            let (head, tail) = tables.split_at_mut(a);
            (&mut tail[0], &mut head[b])
        }
    }

    /// Returns `true` if `entity` is live and carries component `T`.
    pub fn contains<T: Component>(&self, entity: Entity) -> bool {
        self.contains_impl::<T>(entity, None)
    }

    /// Returns `true` if `entity` is live and carries the named instance
    /// of component `T`.
    pub fn contains_named<T: Component>(&self, entity: Entity, name: &'static str) -> bool {
        self.contains_impl::<T>(entity, Some(name))
    }

    fn contains_impl<T: Component>(&self, entity: Entity, name: Option<&'static str>) -> bool {
        let Ok(slot) = self.entities.get(entity) else {
            return false;
        };
        let Some(id) = self.lookup_component::<T>(name) else {
            return false;
        };
        self.tables[self.archetypes[slot.archetype as usize].table_id()].has_column(id)
    }

    /// Reads component `T` of `entity`.
    ///
    /// ## Panics
    /// A dead entity or an absent component is a programmer error and
    /// panics; probe with [`World::contains`] first.
    pub fn get<T: Component>(&self, entity: Entity) -> &T {
        self.get_impl::<T>(entity, None)
    }

    /// Reads the named instance of component `T` of `entity`.
    pub fn get_named<T: Component>(&self, entity: Entity, name: &'static str) -> &T {
        self.get_impl::<T>(entity, Some(name))
    }

    fn get_impl<T: Component>(&self, entity: Entity, name: Option<&'static str>) -> &T {
        let slot = self
            .entities
            .get(entity)
            .unwrap_or_else(|error| panic!("{error}"));
        let id = self.lookup_component::<T>(name).unwrap_or_else(|| {
            panic!("component {} was never inserted", std::any::type_name::<T>())
        });
        let table = &self.tables[self.archetypes[slot.archetype as usize].table_id()];
        &table.column::<T>(id)[slot.row as usize]
    }

    /// Mutable access to component `T` of `entity`.
    ///
    /// ## Panics
    /// Same contract as [`World::get`].
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> &mut T {
        self.get_mut_impl::<T>(entity, None)
    }

    /// Mutable access to the named instance of component `T` of `entity`.
    pub fn get_named_mut<T: Component>(&mut self, entity: Entity, name: &'static str) -> &mut T {
        self.get_mut_impl::<T>(entity, Some(name))
    }

    fn get_mut_impl<T: Component>(&mut self, entity: Entity, name: Option<&'static str>) -> &mut T {
        let slot = *self
            .entities
            .get(entity)
            .unwrap_or_else(|error| panic!("{error}"));
        let id = self.lookup_component::<T>(name).unwrap_or_else(|| {
            panic!("component {} was never inserted", std::any::type_name::<T>())
        });
        let table = &mut self.tables[self.archetypes[slot.archetype as usize].table_id()];
        &mut table.column_mut::<T>(id)[slot.row as usize]
    }

    /// Despawns every entity, dropping all component values.
    ///
    /// Interned components, archetypes, and table capacity survive; all
    /// pre-clear entity handles go stale.
    pub fn clear(&mut self) {
        for table in &mut self.tables {
            table.clear();
        }
        self.entities.clear();
        trace!("world cleared");
    }
}

/// Transient reference to a freshly spawned (or looked-up) entity.
///
/// Borrows the world exclusively; drop it before the next unrelated world
/// mutation.
pub struct EntityRef<'world> {
    world: &'world mut World,
    entity: Entity,
}

impl EntityRef<'_> {
    /// The referenced entity's handle.
    #[inline]
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Inserts a bundle into the referenced entity.
    pub fn insert<B: Bundle>(&mut self, bundle: B) -> ECSResult<&mut Self> {
        self.world.insert(self.entity, bundle)?;
        Ok(self)
    }

    /// Returns `true` if the entity carries component `T`.
    pub fn contains<T: Component>(&self) -> bool {
        self.world.contains::<T>(self.entity)
    }

    /// Reads component `T`; same contract as [`World::get`].
    pub fn get<T: Component>(&self) -> &T {
        self.world.get::<T>(self.entity)
    }
}
