//! # strata-ecs
//!
//! Archetype-based Entity-Component-System core with dense, cache-friendly
//! columnar storage.
//!
//! ## Design Goals
//! - Tables partitioned by exact component set, one contiguous column per
//!   component
//! - Generational entity identity that is safe against stale handles
//! - Memoized archetype transitions: amortized O(1) bundle insertion and
//!   O(1) despawn
//! - Single-threaded, allocation-conscious core with no internal locking
//!
//! ```
//! use strata_ecs::prelude::*;
//!
//! #[derive(Clone, Copy, PartialEq, Debug)]
//! struct Position { x: f32, y: f32 }
//! impl Component for Position {}
//!
//! let mut world = World::new();
//! let entity = {
//!     let mut spawned = world.spawn().unwrap();
//!     spawned.insert(Position { x: 1.0, y: 2.0 }).unwrap();
//!     spawned.entity()
//! };
//! assert_eq!(*world.get::<Position>(entity), Position { x: 1.0, y: 2.0 });
//! world.despawn(entity).unwrap();
//! ```

#![forbid(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

pub mod engine;

// ─────────────────────────────────────────────────────────────────────────────
// Re-exports (Public API)
// ─────────────────────────────────────────────────────────────────────────────

pub use engine::world::{Archetype, EntityRef, World};

pub use engine::entity::{Entities, Entity, EntitySlot};

pub use engine::component::{named, Bundle, Component, ComponentDescriptor, Named};

pub use engine::arena::{Arena, Handle};

pub use engine::sparse::{BlobSparseSet, SparseSet};

pub use engine::storage::BlobVec;

pub use engine::table::{Column, Table};

pub use engine::typemap::TypeMap;

pub use engine::error::{AllocationError, ECSError, ECSResult, UnknownEntityError};

pub use engine::types::{ArchetypeID, ComponentID, EntityID, Generation, RowIndex};

// ─────────────────────────────────────────────────────────────────────────────
// Prelude (Optional but recommended)
// ─────────────────────────────────────────────────────────────────────────────

/// Commonly used world types.
///
/// Import with:
/// ```rust
/// use strata_ecs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        named, Bundle, Component, ComponentDescriptor, ECSError, ECSResult, Entity, EntityRef,
        TypeMap, World,
    };
}
