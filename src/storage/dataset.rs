//! JSON dataset loader
//!
//! A dataset file carries both schema catalogs and the entities with their
//! attribute values, memberships, resources and entitlements:
//!
//! ```json
//! {
//!   "principal_schemas": [{"name": "age", "value_type": "Long"}],
//!   "group_schemas": [],
//!   "groups": [{"id": 1, "name": "root", "entitlements": ["USER_READ"]}],
//!   "principals": [{"id": 10, "username": "alice", "groups": [1],
//!                   "attributes": {"age": 30, "tags": ["a", "b"]}}]
//! }
//! ```
//!
//! An array attribute value stores one value per element. Every value is
//! coerced through its schema at load time.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::entity::{EntityId, Group, Principal};
use crate::schema::{AttrValue, AttributeSchema, MemoryCatalog};

use super::errors::{StorageError, StorageResult};
use super::memory::MemoryStore;

#[derive(Debug, Clone, Deserialize)]
pub struct GroupRecord {
    #[serde(flatten)]
    pub group: Group,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub entitlements: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrincipalRecord {
    #[serde(flatten)]
    pub principal: Principal,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
    /// Group memberships
    #[serde(default)]
    pub groups: Vec<EntityId>,
    #[serde(default)]
    pub resources: Vec<String>,
}

/// On-disk dataset layout
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub principal_schemas: Vec<AttributeSchema>,
    #[serde(default)]
    pub group_schemas: Vec<AttributeSchema>,
    #[serde(default)]
    pub groups: Vec<GroupRecord>,
    #[serde(default)]
    pub principals: Vec<PrincipalRecord>,
}

/// A populated store with the catalogs used to search it
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub store: MemoryStore,
    pub principal_catalog: MemoryCatalog,
    pub group_catalog: MemoryCatalog,
}

impl Dataset {
    pub fn from_path(path: &Path) -> StorageResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> StorageResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Builds the store, rejecting dangling references and ill-typed values
    pub fn load(self) -> StorageResult<LoadedDataset> {
        let principal_catalog: MemoryCatalog = self.principal_schemas.into_iter().collect();
        let group_catalog: MemoryCatalog = self.group_schemas.into_iter().collect();

        let group_ids: BTreeSet<EntityId> = self.groups.iter().map(|r| r.group.id).collect();
        let mut store = MemoryStore::new();

        for record in self.groups {
            let id = record.group.id;
            let label = format!("group {}", id);
            if let Some(parent) = &record.group.parent {
                if !group_ids.contains(&parent.id) {
                    return Err(dangling(&label, "group", parent.id.to_string()));
                }
            }
            for (schema, value) in &record.attributes {
                for v in coerce(&group_catalog, &label, schema, value)? {
                    store.add_group_attr(id, schema, v);
                }
            }
            for resource in &record.resources {
                store.add_group_resource(id, resource);
            }
            for entitlement in &record.entitlements {
                store.add_entitlement(id, entitlement);
            }
            store.insert_group(record.group);
        }

        for record in self.principals {
            let id = record.principal.id;
            let label = format!("principal {}", id);
            for (schema, value) in &record.attributes {
                for v in coerce(&principal_catalog, &label, schema, value)? {
                    store.add_principal_attr(id, schema, v);
                }
            }
            for group in &record.groups {
                if !group_ids.contains(group) {
                    return Err(dangling(&label, "group", group.to_string()));
                }
                store.add_membership(id, *group);
            }
            for resource in &record.resources {
                store.add_principal_resource(id, resource);
            }
            store.insert_principal(record.principal);
        }

        Ok(LoadedDataset {
            store,
            principal_catalog,
            group_catalog,
        })
    }
}

fn dangling(entity: &str, what: &'static str, name: String) -> StorageError {
    StorageError::DanglingReference {
        entity: entity.to_string(),
        what,
        name,
    }
}

fn coerce(
    catalog: &MemoryCatalog,
    entity: &str,
    schema: &str,
    value: &Value,
) -> StorageResult<Vec<AttrValue>> {
    let Some(def) = catalog.get(schema) else {
        return Err(dangling(entity, "schema", schema.to_string()));
    };
    let values = match value {
        Value::Array(items) => items.iter().collect(),
        single => vec![single],
    };
    values
        .into_iter()
        .map(|v| {
            AttrValue::from_json(def, v).map_err(|source| StorageError::InvalidValue {
                entity: entity.to_string(),
                schema: schema.to_string(),
                source,
            })
        })
        .collect()
}
