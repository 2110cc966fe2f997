//! In-memory EAV store
//!
//! Holds entities, their attribute values keyed by (entity, schema), and
//! the relationship, resource and entitlement indexes the search views
//! expose. Queries are evaluated directly over the structured
//! [`SearchQuery`] with the same set semantics as the rendered SQL.

use std::collections::{BTreeMap, BTreeSet};

use crate::entity::{EntityId, EntityKind, Group, Groups, Principal, Principals};
use crate::planner::SearchQuery;
use crate::schema::AttrValue;

use super::errors::StorageResult;
use super::eval::Evaluator;
use super::store::SearchStore;

/// Rows and indexes of one entity kind
#[derive(Debug, Clone)]
pub struct EntityTable<E> {
    pub(crate) entities: BTreeMap<EntityId, E>,
    /// entity -> schema -> values, in insertion order
    pub(crate) attributes: BTreeMap<EntityId, BTreeMap<String, Vec<AttrValue>>>,
    /// entity -> related groups
    pub(crate) relationships: BTreeMap<EntityId, BTreeSet<EntityId>>,
    pub(crate) resources: BTreeMap<EntityId, BTreeSet<String>>,
}

impl<E> Default for EntityTable<E> {
    fn default() -> Self {
        Self {
            entities: BTreeMap::new(),
            attributes: BTreeMap::new(),
            relationships: BTreeMap::new(),
            resources: BTreeMap::new(),
        }
    }
}

impl<E> EntityTable<E> {
    /// Stored values of `schema` for `id`; empty when unset
    pub fn values(&self, id: EntityId, schema: &str) -> &[AttrValue] {
        self.attributes
            .get(&id)
            .and_then(|attrs| attrs.get(schema))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn related(&self, id: EntityId) -> impl Iterator<Item = EntityId> + '_ {
        self.relationships.get(&id).into_iter().flatten().copied()
    }

    pub fn has_resource(&self, id: EntityId, resource: &str) -> bool {
        self.resources
            .get(&id)
            .is_some_and(|r| r.contains(resource))
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn insert(&mut self, id: EntityId, entity: E) {
        self.entities.insert(id, entity);
    }

    fn add_value(&mut self, id: EntityId, schema: &str, value: AttrValue) {
        self.attributes
            .entry(id)
            .or_default()
            .entry(schema.to_string())
            .or_default()
            .push(value);
    }

    fn relate(&mut self, id: EntityId, group: EntityId) {
        self.relationships.entry(id).or_default().insert(group);
    }

    fn add_resource(&mut self, id: EntityId, resource: &str) {
        self.resources
            .entry(id)
            .or_default()
            .insert(resource.to_string());
    }

    fn remove(&mut self, id: EntityId) -> Option<E> {
        self.attributes.remove(&id);
        self.relationships.remove(&id);
        self.resources.remove(&id);
        self.entities.remove(&id)
    }
}

/// In-memory store of principals and groups
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    principals: EntityTable<Principal>,
    groups: EntityTable<Group>,
    /// group -> entitlement names
    entitlements: BTreeMap<EntityId, BTreeSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_principal(&mut self, principal: Principal) {
        self.principals.insert(principal.id, principal);
    }

    /// Inserts a group; its parent becomes its relationship
    pub fn insert_group(&mut self, group: Group) {
        if let Some(parent) = &group.parent {
            self.groups.relate(group.id, parent.id);
        }
        self.groups.insert(group.id, group);
    }

    pub fn add_principal_attr(&mut self, id: EntityId, schema: &str, value: AttrValue) {
        self.principals.add_value(id, schema, value);
    }

    pub fn add_group_attr(&mut self, id: EntityId, schema: &str, value: AttrValue) {
        self.groups.add_value(id, schema, value);
    }

    pub fn add_membership(&mut self, principal: EntityId, group: EntityId) {
        self.principals.relate(principal, group);
    }

    pub fn add_principal_resource(&mut self, id: EntityId, resource: &str) {
        self.principals.add_resource(id, resource);
    }

    pub fn add_group_resource(&mut self, id: EntityId, resource: &str) {
        self.groups.add_resource(id, resource);
    }

    pub fn add_entitlement(&mut self, group: EntityId, entitlement: &str) {
        self.entitlements
            .entry(group)
            .or_default()
            .insert(entitlement.to_string());
    }

    /// Removes a principal and everything attached to it
    pub fn remove_principal(&mut self, id: EntityId) -> Option<Principal> {
        self.principals.remove(id)
    }

    pub fn principals(&self) -> &EntityTable<Principal> {
        &self.principals
    }

    pub fn groups(&self) -> &EntityTable<Group> {
        &self.groups
    }

    pub fn group_name(&self, id: EntityId) -> Option<&str> {
        self.groups.entities.get(&id).map(|g| g.name.as_str())
    }

    pub fn group_entitlements(&self, group: EntityId) -> impl Iterator<Item = &str> + '_ {
        self.entitlements
            .get(&group)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }
}

/// Entity kinds the in-memory store can serve
pub trait MemoryKind: EntityKind {
    fn table(store: &MemoryStore) -> &EntityTable<Self::Entity>;

    /// Entitlements held by `id`
    fn entitlements(store: &MemoryStore, id: EntityId) -> BTreeSet<&str>;
}

impl MemoryKind for Principals {
    fn table(store: &MemoryStore) -> &EntityTable<Principal> {
        &store.principals
    }

    /// Derived through group memberships
    fn entitlements(store: &MemoryStore, id: EntityId) -> BTreeSet<&str> {
        store
            .principals
            .related(id)
            .flat_map(|group| store.group_entitlements(group))
            .collect()
    }
}

impl MemoryKind for Groups {
    fn table(store: &MemoryStore) -> &EntityTable<Group> {
        &store.groups
    }

    fn entitlements(store: &MemoryStore, id: EntityId) -> BTreeSet<&str> {
        store.group_entitlements(id).collect()
    }
}

impl<K: MemoryKind> SearchStore<K> for MemoryStore {
    fn execute(&self, query: &SearchQuery) -> StorageResult<Vec<EntityId>> {
        Evaluator::<K>::new(self, &query.params).ordered(query)
    }

    fn count(&self, query: &SearchQuery) -> StorageResult<u64> {
        let matched = Evaluator::<K>::new(self, &query.params).select(query)?;
        Ok(matched.len() as u64)
    }

    fn load(&self, id: EntityId) -> StorageResult<Option<K::Entity>> {
        Ok(K::table(self).entities.get(&id).cloned())
    }

    fn has_groups(&self) -> StorageResult<bool> {
        Ok(!self.groups.is_empty())
    }
}
