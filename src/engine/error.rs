//! Error types for entity lookup and storage growth.
//!
//! This module declares the two recoverable failure modes of the world and
//! the aggregate error they bubble into. Each error carries enough context
//! to make failures actionable while remaining small and cheap to pass
//! around or convert into [`ECSError`].
//!
//! ## Goals
//! * **Specificity:** each error type models a single failure mode (stale
//!   entity handles, insufficient backing memory).
//! * **Ergonomics:** all errors implement [`std::error::Error`] and
//!   [`fmt::Display`], and provide `From<T>` conversions into the
//!   aggregate error so `?` flows upward.
//! * **Actionability:** structured fields (the offending entity, the byte
//!   count that failed to allocate) make logs useful without reproducing
//!   the issue.
//!
//! Everything else (adding a column to a populated table, reinterpreting a
//! column as the wrong type, reading an absent component) is a contract
//! violation on the caller's side and panics rather than returning.

use std::fmt;

use crate::engine::entity::Entity;

/// Returned when an [`Entity`] handle is no longer valid, either because it
/// was despawned (its generation no longer matches the slot) or because its
/// id lies outside the registry.
///
/// This is the only recoverable error on the entity path; callers typically
/// ignore it when despawning an entity that may already be dead.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownEntityError {
    /// The stale or out-of-range handle that was presented.
    pub entity: Entity,
}

impl fmt::Display for UnknownEntityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown entity (generation {}, id {})",
            self.entity.generation, self.entity.id
        )
    }
}

impl std::error::Error for UnknownEntityError {}

/// Returned when a capacity-growth path cannot obtain backing memory.
///
/// Growth always happens before mutation, so on failure the container, and
/// any world operation that grew it, is left in its pre-call state.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationError {
    /// Number of bytes the failed growth requested.
    pub bytes: usize,
}

impl fmt::Display for AllocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to allocate {} bytes of storage", self.bytes)
    }
}

impl std::error::Error for AllocationError {}

/// Aggregate error for world operations.
///
/// Mutating entry points (`spawn`, `despawn`, `insert`) return this type;
/// match on the variant for control flow, or log the `Display` form.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ECSError {
    /// An entity handle was stale or out of range.
    UnknownEntity(UnknownEntityError),

    /// A storage growth path failed to allocate.
    Allocation(AllocationError),
}

impl fmt::Display for ECSError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ECSError::UnknownEntity(e) => write!(f, "{e}"),
            ECSError::Allocation(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ECSError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ECSError::UnknownEntity(e) => Some(e),
            ECSError::Allocation(e) => Some(e),
        }
    }
}

impl From<UnknownEntityError> for ECSError {
    fn from(e: UnknownEntityError) -> Self {
        ECSError::UnknownEntity(e)
    }
}

impl From<AllocationError> for ECSError {
    fn from(e: AllocationError) -> Self {
        ECSError::Allocation(e)
    }
}

/// Convenience alias for results of world operations.
pub type ECSResult<T> = Result<T, ECSError>;
