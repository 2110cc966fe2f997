//! Principals (users)
//!
//! A principal is visible to a caller when at least one of its group
//! memberships lands inside the caller's administrative scope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::{AttrValue, ValueType};

use super::fields::{FieldAccessor, FieldDef, FieldRegistry};
use super::kind::{EntityKind, KindTag, ScopePolicy};
use super::{EntityId, EntityRef};

/// A principal with its direct fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    pub id: EntityId,
    pub username: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub creation_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_login_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub failed_logins: Option<i64>,
    /// 0 or 1
    #[serde(default)]
    pub suspended: Option<i64>,
    #[serde(default)]
    pub manager: Option<EntityRef>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
    #[serde(default, skip_serializing)]
    pub security_answer: Option<String>,
}

impl Principal {
    pub fn new(id: EntityId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            status: None,
            creation_date: None,
            last_login_date: None,
            failed_logins: None,
            suspended: None,
            manager: None,
            password: None,
            token: None,
            security_answer: None,
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_manager(mut self, manager: EntityRef) -> Self {
        self.manager = Some(manager);
        self
    }

    pub fn with_suspended(mut self, suspended: bool) -> Self {
        self.suspended = Some(i64::from(suspended));
        self
    }
}

fn principal_manager(p: &Principal) -> Option<&EntityRef> {
    p.manager.as_ref()
}

const PRINCIPAL_FIELD_DEFS: &[FieldDef<Principal>] = &[
    FieldDef {
        name: "id",
        accessor: FieldAccessor::Scalar {
            value_type: ValueType::Long,
            read: |p| Some(AttrValue::Long(p.id as i64)),
        },
        sortable: true,
    },
    FieldDef {
        name: "username",
        accessor: FieldAccessor::Scalar {
            value_type: ValueType::String,
            read: |p| Some(AttrValue::String(p.username.clone())),
        },
        sortable: true,
    },
    FieldDef {
        name: "status",
        accessor: FieldAccessor::Scalar {
            value_type: ValueType::String,
            read: |p| p.status.clone().map(AttrValue::String),
        },
        sortable: true,
    },
    FieldDef {
        name: "creation_date",
        accessor: FieldAccessor::Scalar {
            value_type: ValueType::Date,
            read: |p| p.creation_date.map(AttrValue::Date),
        },
        sortable: true,
    },
    FieldDef {
        name: "last_login_date",
        accessor: FieldAccessor::Scalar {
            value_type: ValueType::Date,
            read: |p| p.last_login_date.map(AttrValue::Date),
        },
        sortable: true,
    },
    FieldDef {
        name: "failed_logins",
        accessor: FieldAccessor::Scalar {
            value_type: ValueType::Long,
            read: |p| p.failed_logins.map(AttrValue::Long),
        },
        sortable: true,
    },
    FieldDef {
        name: "suspended",
        accessor: FieldAccessor::Flag {
            read: |p| p.suspended,
        },
        sortable: true,
    },
    FieldDef {
        name: "manager",
        accessor: FieldAccessor::Reference {
            read: principal_manager,
        },
        sortable: true,
    },
    FieldDef {
        name: "password",
        accessor: FieldAccessor::Scalar {
            value_type: ValueType::String,
            read: |p| p.password.clone().map(AttrValue::String),
        },
        sortable: false,
    },
    FieldDef {
        name: "token",
        accessor: FieldAccessor::Scalar {
            value_type: ValueType::String,
            read: |p| p.token.clone().map(AttrValue::String),
        },
        sortable: false,
    },
    FieldDef {
        name: "security_answer",
        accessor: FieldAccessor::Scalar {
            value_type: ValueType::String,
            read: |p| p.security_answer.clone().map(AttrValue::String),
        },
        sortable: false,
    },
];

static PRINCIPAL_FIELDS: FieldRegistry<Principal> = FieldRegistry::new(PRINCIPAL_FIELD_DEFS);

/// Principal entity kind
#[derive(Debug, Clone, Copy, Default)]
pub struct Principals;

impl EntityKind for Principals {
    type Entity = Principal;

    const TAG: KindTag = KindTag::Principal;

    const SCOPE_POLICY: ScopePolicy = ScopePolicy::AnyRelationshipInScope;

    fn id(entity: &Principal) -> EntityId {
        entity.id
    }

    fn fields() -> &'static FieldRegistry<Principal> {
        &PRINCIPAL_FIELDS
    }
}
