//! Administrative scope filter
//!
//! Applied once, around the fully compiled condition, never inside a leaf.
//! The predicate depends on the kind's [`ScopePolicy`]:
//!
//! - `AnyRelationshipInScope` (principals): a principal is hidden when it
//!   has relationships and none of them lands inside scope. A principal
//!   with no relationship at all is not owned by anyone and stays visible.
//! - `DirectContainment` (groups): a group is visible only when its own
//!   identifier is inside scope.
//!
//! Scope identifiers are bound after the condition parameters.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, KindTag, ScopePolicy, SearchView};
use crate::schema::AttrValue;

use super::fragment::{Params, Placeholder};

/// Groups the caller may act within, resolved fresh for every call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdministrativeScope {
    #[serde(default)]
    groups: BTreeSet<EntityId>,
    #[serde(default)]
    unrestricted: bool,
}

impl AdministrativeScope {
    /// Scope limited to the given groups
    pub fn restricted(groups: impl IntoIterator<Item = EntityId>) -> Self {
        Self {
            groups: groups.into_iter().collect(),
            unrestricted: false,
        }
    }

    /// Scope that bypasses filtering entirely
    pub fn unrestricted() -> Self {
        Self {
            groups: BTreeSet::new(),
            unrestricted: true,
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        self.unrestricted
    }

    /// Restricted scope without any group
    pub fn is_empty(&self) -> bool {
        !self.unrestricted && self.groups.is_empty()
    }

    pub fn groups(&self) -> &BTreeSet<EntityId> {
        &self.groups
    }

    pub fn contains(&self, group: EntityId) -> bool {
        self.unrestricted || self.groups.contains(&group)
    }
}

/// Scope predicate of one query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeFilter {
    Unrestricted,
    /// Hide entities whose relationships all fall outside these groups
    Relationships(Vec<Placeholder>),
    /// Keep only entities whose own id is one of these
    Containment(Vec<Placeholder>),
}

impl ScopeFilter {
    /// Builds the filter for `policy`, binding scope ids after `params`
    pub fn build(
        policy: ScopePolicy,
        scope: &AdministrativeScope,
        params: Params,
    ) -> (ScopeFilter, Params) {
        if scope.is_unrestricted() {
            return (ScopeFilter::Unrestricted, params);
        }

        let mut params = params;
        let ids = scope
            .groups()
            .iter()
            .map(|id| params.bind(AttrValue::Long(*id as i64)))
            .collect();

        let filter = match policy {
            ScopePolicy::AnyRelationshipInScope => ScopeFilter::Relationships(ids),
            ScopePolicy::DirectContainment => ScopeFilter::Containment(ids),
        };
        (filter, params)
    }

    /// WHERE-clause predicate over `id_column`, or None when unrestricted
    pub fn render(&self, kind: KindTag, id_column: &str) -> Option<String> {
        match self {
            ScopeFilter::Unrestricted => None,
            ScopeFilter::Relationships(ids) => {
                let rel = kind.view(SearchView::Relationship);
                if ids.is_empty() {
                    return Some(format!(
                        "{} NOT IN (SELECT subject_id FROM {})",
                        id_column, rel
                    ));
                }
                Some(format!(
                    "{} NOT IN (SELECT subject_id FROM {} WHERE subject_id NOT IN \
                     (SELECT subject_id FROM {} WHERE group_id IN ({})))",
                    id_column,
                    rel,
                    rel,
                    join(ids)
                ))
            }
            ScopeFilter::Containment(ids) => {
                if ids.is_empty() {
                    return Some("1=2".to_string());
                }
                Some(format!("{} IN ({})", id_column, join(ids)))
            }
        }
    }
}

fn join(ids: &[Placeholder]) -> String {
    ids.iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrestricted_binds_nothing() {
        let (filter, params) = ScopeFilter::build(
            ScopePolicy::DirectContainment,
            &AdministrativeScope::unrestricted(),
            Params::new(),
        );
        assert_eq!(filter, ScopeFilter::Unrestricted);
        assert!(params.is_empty());
        assert!(filter.render(KindTag::Group, "b.subject_id").is_none());
    }

    #[test]
    fn test_scope_ids_bound_after_condition() {
        let mut params = Params::new();
        params.bind(AttrValue::Long(30));

        let (filter, params) = ScopeFilter::build(
            ScopePolicy::AnyRelationshipInScope,
            &AdministrativeScope::restricted([7, 3]),
            params,
        );
        assert_eq!(
            filter,
            ScopeFilter::Relationships(vec![Placeholder(2), Placeholder(3)])
        );
        // Ids are bound in ascending order
        assert_eq!(params.get(Placeholder(2)), Some(&AttrValue::Long(3)));

        let sql = filter.render(KindTag::Principal, "b.subject_id").unwrap();
        assert!(sql.contains("group_id IN (?2, ?3)"));
    }

    #[test]
    fn test_group_containment() {
        let (filter, _) = ScopeFilter::build(
            ScopePolicy::DirectContainment,
            &AdministrativeScope::restricted([1]),
            Params::new(),
        );
        assert_eq!(
            filter.render(KindTag::Group, "b.subject_id").as_deref(),
            Some("b.subject_id IN (?1)")
        );
    }

    #[test]
    fn test_scope_json() {
        let scope: AdministrativeScope = serde_json::from_str(r#"{"groups": [1, 2]}"#).unwrap();
        assert!(scope.contains(2));
        assert!(!scope.contains(5));
        assert!(!scope.is_empty());

        let scope: AdministrativeScope = serde_json::from_str(r#"{"unrestricted": true}"#).unwrap();
        assert!(scope.contains(5));
    }
}
