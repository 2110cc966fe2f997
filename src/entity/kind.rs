//! Entity kinds
//!
//! The compiler is generic over an [`EntityKind`], which supplies the
//! kind's search views, its direct-field registry and its scope policy.
//! Principals and groups share one compiler instead of near-identical
//! per-kind implementations.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::fields::FieldRegistry;
use super::EntityId;

/// Runtime tag of an entity kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindTag {
    Principal,
    Group,
}

impl KindTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            KindTag::Principal => "principal",
            KindTag::Group => "group",
        }
    }

    /// Name of one of this kind's search views
    pub fn view(&self, view: SearchView) -> String {
        format!("{}_search{}", self.as_str(), view.suffix())
    }
}

impl fmt::Display for KindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Physical views queried by the compiled SQL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SearchView {
    /// One row per entity with its direct fields
    Base,
    /// One row per stored attribute value
    Attr,
    /// One row per entity for unique-valued schemas
    UniqueAttr,
    /// First stored value per (entity, schema) for multi-valued schemas
    FirstAttr,
    /// Relationship index (memberships / parent group)
    Relationship,
    /// Resource association index
    Resource,
    /// Entitlement index
    Entitlement,
}

impl SearchView {
    fn suffix(&self) -> &'static str {
        match self {
            SearchView::Base => "",
            SearchView::Attr => "_attr",
            SearchView::UniqueAttr => "_unique_attr",
            SearchView::FirstAttr => "_first_attr",
            SearchView::Relationship => "_relationship",
            SearchView::Resource => "_resource",
            SearchView::Entitlement => "_entitlement",
        }
    }
}

/// How the administrative scope restricts a kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopePolicy {
    /// Visible when at least one relationship lands inside scope
    AnyRelationshipInScope,
    /// Visible when the entity's own identifier is inside scope
    DirectContainment,
}

/// A searchable entity kind
pub trait EntityKind: 'static {
    /// Materialized entity type
    type Entity: Clone + fmt::Debug + 'static;

    const TAG: KindTag;

    const SCOPE_POLICY: ScopePolicy;

    /// Identifier of a materialized entity
    fn id(entity: &Self::Entity) -> EntityId;

    /// Static direct-field table
    fn fields() -> &'static FieldRegistry<Self::Entity>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_names() {
        assert_eq!(KindTag::Principal.view(SearchView::Base), "principal_search");
        assert_eq!(KindTag::Group.view(SearchView::Attr), "group_search_attr");
        assert_eq!(
            KindTag::Principal.view(SearchView::FirstAttr),
            "principal_search_first_attr"
        );
    }

    #[test]
    fn test_kind_tag_serde() {
        let tag: KindTag = serde_json::from_str("\"group\"").unwrap();
        assert_eq!(tag, KindTag::Group);
    }
}
