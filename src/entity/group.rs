//! Groups (roles)
//!
//! A group is visible to a caller only when its own identifier is part of
//! the caller's administrative scope. Its relationship is the parent group.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::{AttrValue, ValueType};

use super::fields::{FieldAccessor, FieldDef, FieldRegistry};
use super::kind::{EntityKind, KindTag, ScopePolicy};
use super::{EntityId, EntityRef};

/// A group with its direct fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub parent: Option<EntityRef>,
    #[serde(default)]
    pub owner: Option<EntityRef>,
    /// 0 or 1
    #[serde(default)]
    pub inherit_attributes: Option<i64>,
    #[serde(default)]
    pub creation_date: Option<DateTime<Utc>>,
}

impl Group {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            parent: None,
            owner: None,
            inherit_attributes: None,
            creation_date: None,
        }
    }

    pub fn with_parent(mut self, parent: EntityRef) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_owner(mut self, owner: EntityRef) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Reference to this group, as stored on memberships and children
    pub fn to_ref(&self) -> EntityRef {
        EntityRef::new(self.id, self.name.clone())
    }
}

fn group_parent(g: &Group) -> Option<&EntityRef> {
    g.parent.as_ref()
}

fn group_owner(g: &Group) -> Option<&EntityRef> {
    g.owner.as_ref()
}

const GROUP_FIELD_DEFS: &[FieldDef<Group>] = &[
    FieldDef {
        name: "id",
        accessor: FieldAccessor::Scalar {
            value_type: ValueType::Long,
            read: |g| Some(AttrValue::Long(g.id as i64)),
        },
        sortable: true,
    },
    FieldDef {
        name: "name",
        accessor: FieldAccessor::Scalar {
            value_type: ValueType::String,
            read: |g| Some(AttrValue::String(g.name.clone())),
        },
        sortable: true,
    },
    FieldDef {
        name: "parent",
        accessor: FieldAccessor::Reference { read: group_parent },
        sortable: true,
    },
    FieldDef {
        name: "owner",
        accessor: FieldAccessor::Reference { read: group_owner },
        sortable: true,
    },
    FieldDef {
        name: "inherit_attributes",
        accessor: FieldAccessor::Flag {
            read: |g| g.inherit_attributes,
        },
        sortable: true,
    },
    FieldDef {
        name: "creation_date",
        accessor: FieldAccessor::Scalar {
            value_type: ValueType::Date,
            read: |g| g.creation_date.map(AttrValue::Date),
        },
        sortable: true,
    },
];

static GROUP_FIELDS: FieldRegistry<Group> = FieldRegistry::new(GROUP_FIELD_DEFS);

/// Group entity kind
#[derive(Debug, Clone, Copy, Default)]
pub struct Groups;

impl EntityKind for Groups {
    type Entity = Group;

    const TAG: KindTag = KindTag::Group;

    const SCOPE_POLICY: ScopePolicy = ScopePolicy::DirectContainment;

    fn id(entity: &Group) -> EntityId {
        entity.id
    }

    fn fields() -> &'static FieldRegistry<Group> {
        &GROUP_FIELDS
    }
}
