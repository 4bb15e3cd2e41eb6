//! Core identifiers, constants, and identity hashing.
//!
//! This module defines the **fundamental types and identifiers** shared by
//! every subsystem of the world: entity ids, component ids, archetype ids,
//! and the 64-bit identity hashes that key the world's internal maps.
//!
//! ## Identity model
//!
//! Three hash-derived identities exist, all 64-bit and non-cryptographic:
//!
//! - **Type hash** — derived from a type's printable name; stable for the
//!   lifetime of the process.
//! - **Instance hash** — equals the type hash for unnamed components, and
//!   mixes in the instance name otherwise, so two columns of the same Rust
//!   type under different names stay distinct.
//! - **Signature hash** — derived from a *sorted* list of [`ComponentID`]s,
//!   concatenated as little-endian bytes. Two archetypes collide only if
//!   their sorted id arrays are byte-equal, which implies identical ids.
//!
//! All hashes are produced by [`ahash::AHasher`] with its fixed default
//! keys, so identity is deterministic within a process.

use std::hash::Hasher;

use ahash::AHasher;

/// Index of an entity slot inside the registry.
pub type EntityID = u32;
/// Liveness epoch distinguishing reuses of the same [`EntityID`].
pub type Generation = u32;

/// World-scoped compact identifier for a component, assigned at interning.
pub type ComponentID = u32;
/// Identifier for an archetype within a world.
pub type ArchetypeID = u32;
/// Row position inside a table's parallel column arrays.
pub type RowIndex = u32;

/// 64-bit identity hash for types, named instances, and bundles.
pub type TypeHash = u64;

/// Baseline row capacity reserved for a freshly materialized table.
pub const BASE_TABLE_CAPACITY: usize = 64;

/// Minimum slot count added when the entity registry grows.
pub const MIN_REGISTRY_GROWTH: usize = 1024;

#[inline]
fn hasher() -> AHasher {
    AHasher::default()
}

/// Hashes a type's printable name into its [`TypeHash`].
pub fn hash_type_name(type_name: &str) -> TypeHash {
    let mut state = hasher();
    state.write(type_name.as_bytes());
    state.finish()
}

/// Derives the instance identity of a component from its type hash and an
/// optional instance name.
///
/// Unnamed components keep their type hash, so interning is stable across
/// repeated descriptor construction.
pub fn hash_instance(type_id: TypeHash, name: Option<&str>) -> TypeHash {
    match name {
        None => type_id,
        Some(name) => {
            let mut state = hasher();
            state.write_u64(type_id);
            state.write(name.as_bytes());
            state.finish()
        }
    }
}

/// Hashes a **sorted** component-id signature.
///
/// The ids are concatenated as little-endian bytes and fed to a single
/// hasher, so equal signatures always map to equal hashes.
pub fn hash_signature(sorted_ids: &[ComponentID]) -> u64 {
    debug_assert!(sorted_ids.windows(2).all(|w| w[0] < w[1]));
    let mut state = hasher();
    for &id in sorted_ids {
        state.write(&id.to_le_bytes());
    }
    state.finish()
}

/// Hashes a bundle's composition: its instance hashes in declaration order.
///
/// Used to key archetype edge caches. Keying by composition rather than by
/// the bundle's Rust type keeps two same-typed bundles with different
/// instance names on different edges.
pub fn hash_bundle(instance_ids: &[TypeHash]) -> TypeHash {
    let mut state = hasher();
    for &id in instance_ids {
        state.write_u64(id);
    }
    state.finish()
}
