//! Backing store boundary
//!
//! The engine hands a fully assembled [`SearchQuery`] to the store and gets
//! identifiers back. Reloading goes through the same trait so that a store
//! can report an identifier it matched but can no longer resolve.

use crate::entity::{EntityId, EntityKind};
use crate::planner::SearchQuery;

use super::errors::StorageResult;

/// Read-only store serving searches of kind `K`
pub trait SearchStore<K: EntityKind> {
    /// Ordered, paginated identifiers matching `query`
    fn execute(&self, query: &SearchQuery) -> StorageResult<Vec<EntityId>>;

    /// Number of entities matching `query`, ignoring order and window
    fn count(&self, query: &SearchQuery) -> StorageResult<u64>;

    /// Reloads one entity; `None` when it no longer exists
    fn load(&self, id: EntityId) -> StorageResult<Option<K::Entity>>;

    /// Whether any group exists at all
    fn has_groups(&self) -> StorageResult<bool>;
}
