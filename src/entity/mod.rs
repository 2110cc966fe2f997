//! Searchable entity kinds
//!
//! Each kind declares its search views, a static direct-field registry
//! and the policy used to restrict it to a caller's administrative scope.

mod fields;
mod group;
mod kind;
mod principal;

use serde::{Deserialize, Serialize};

pub use fields::{
    FieldAccessor, FieldDef, FieldLookup, FieldPath, FieldRegistry, RefPart, ResolvedField,
};
pub use group::{Group, Groups};
pub use kind::{EntityKind, KindTag, ScopePolicy, SearchView};
pub use principal::{Principal, Principals};

/// Entity identifier, shared by every kind
pub type EntityId = u64;

/// Link from one entity to another, carrying the target's id and name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: EntityId,
    pub name: String,
}

impl EntityRef {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
