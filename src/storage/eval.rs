//! Query evaluation over the in-memory store
//!
//! Mirrors the SQL semantics of the rendered query:
//! - a comparison against a missing value is false (three-valued logic)
//! - a multi-valued attribute matches when any of its values matches
//! - NOT IN over an index is the complement within the kind's universe
//! - AND / OR are set intersection / union

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::marker::PhantomData;

use regex::Regex;

use crate::compiler::{Fragment, NullTest, Params, Placeholder, RelationshipTarget, ScopeFilter, ValueTest};
use crate::condition::RelOp;
use crate::entity::EntityId;
use crate::planner::{OrderKey, SearchQuery, SortDirection};
use crate::schema::AttrValue;

use super::errors::{StorageError, StorageResult};
use super::like::like_regex;
use super::memory::{EntityTable, MemoryKind, MemoryStore};

/// A value test with its parameters resolved
enum BoundTest<'a> {
    Null(NullTest),
    Compare(RelOp, &'a AttrValue),
    Like(Regex, bool),
}

impl BoundTest<'_> {
    /// Evaluates against every stored value of one entity
    fn holds(&self, values: &[AttrValue]) -> bool {
        match self {
            BoundTest::Null(NullTest::IsNull) => values.is_empty(),
            BoundTest::Null(NullTest::IsNotNull) => !values.is_empty(),
            BoundTest::Compare(op, expected) => values
                .iter()
                .any(|v| v.compare(expected).is_some_and(|ord| rel_holds(*op, ord))),
            BoundTest::Like(re, negated) => values
                .iter()
                .filter_map(AttrValue::as_text)
                .any(|text| re.is_match(text) != *negated),
        }
    }
}

/// One column of a row's ORDER BY key
enum SortKey {
    /// Compared unsigned, like `subject_id`
    Id(EntityId),
    /// Missing values sort first
    Value(Option<AttrValue>),
}

impl SortKey {
    fn cmp_to(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (SortKey::Id(l), SortKey::Id(r)) => l.cmp(r),
            (SortKey::Value(None), SortKey::Value(None)) => Ordering::Equal,
            (SortKey::Value(None), SortKey::Value(Some(_))) => Ordering::Less,
            (SortKey::Value(Some(_)), SortKey::Value(None)) => Ordering::Greater,
            (SortKey::Value(Some(l)), SortKey::Value(Some(r))) => {
                l.compare(r).unwrap_or(Ordering::Equal)
            }
            // same term index always yields the same variant
            _ => Ordering::Equal,
        }
    }
}

fn rel_holds(op: RelOp, ord: Ordering) -> bool {
    match op {
        RelOp::Eq => ord == Ordering::Equal,
        RelOp::Ne => ord != Ordering::Equal,
        RelOp::Ge => ord != Ordering::Less,
        RelOp::Gt => ord == Ordering::Greater,
        RelOp::Le => ord != Ordering::Greater,
        RelOp::Lt => ord == Ordering::Less,
    }
}

/// Evaluates queries of kind `K` against one store snapshot
pub(crate) struct Evaluator<'a, K> {
    store: &'a MemoryStore,
    params: &'a Params,
    _kind: PhantomData<K>,
}

impl<'a, K: MemoryKind> Evaluator<'a, K> {
    pub fn new(store: &'a MemoryStore, params: &'a Params) -> Self {
        Self {
            store,
            params,
            _kind: PhantomData,
        }
    }

    fn table(&self) -> &'a EntityTable<K::Entity> {
        K::table(self.store)
    }

    /// Matching ids after scope and single-entity restriction
    pub fn select(&self, query: &SearchQuery) -> StorageResult<BTreeSet<EntityId>> {
        let mut matched = self.matching(&query.fragment)?;

        match &query.scope {
            ScopeFilter::Unrestricted => {}
            ScopeFilter::Relationships(ids) => {
                let scope = self.id_set(ids)?;
                let table = self.table();
                matched.retain(|id| {
                    let mut related = table.related(*id).peekable();
                    related.peek().is_none() || related.any(|g| scope.contains(&g))
                });
            }
            ScopeFilter::Containment(ids) => {
                let scope = self.id_set(ids)?;
                matched.retain(|id| scope.contains(id));
            }
        }

        if let Some(restrict) = query.restrict_to {
            let only = self.long(restrict)?;
            matched.retain(|id| *id as i64 == only);
        }
        Ok(matched)
    }

    /// Ordered and paginated ids
    pub fn ordered(&self, query: &SearchQuery) -> StorageResult<Vec<EntityId>> {
        let table = self.table();
        let mut rows: Vec<(EntityId, Vec<SortKey>)> = self
            .select(query)?
            .into_iter()
            .map(|id| (id, self.sort_keys(table, id, query)))
            .collect();

        rows.sort_by(|(_, a), (_, b)| {
            for ((left, right), term) in a.iter().zip(b).zip(&query.order.terms) {
                let ord = left.cmp_to(right);
                let ord = match term.direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });

        let ids = rows.into_iter().map(|(id, _)| id).collect();
        Ok(query.page.apply(ids))
    }

    fn sort_keys(
        &self,
        table: &EntityTable<K::Entity>,
        id: EntityId,
        query: &SearchQuery,
    ) -> Vec<SortKey> {
        query
            .order
            .terms
            .iter()
            .map(|term| match &term.key {
                OrderKey::Id => SortKey::Id(id),
                OrderKey::Field(path) => SortKey::Value(
                    table
                        .entities
                        .get(&id)
                        .and_then(|e| K::fields().read(e, path)),
                ),
                OrderKey::Attribute(i) => SortKey::Value(
                    query
                        .order
                        .joins
                        .get(*i)
                        .and_then(|join| table.values(id, &join.schema).first().cloned()),
                ),
            })
            .collect()
    }

    /// Ids matching a fragment, before scoping
    pub fn matching(&self, fragment: &Fragment) -> StorageResult<BTreeSet<EntityId>> {
        let table = self.table();
        match fragment {
            Fragment::Never => Ok(BTreeSet::new()),
            Fragment::Attribute { schema, test, .. } => {
                let test = self.bind(test)?;
                Ok(table
                    .ids()
                    .filter(|id| test.holds(table.values(*id, schema)))
                    .collect())
            }
            Fragment::Field { path, test } => {
                let test = self.bind(test)?;
                Ok(table
                    .entities
                    .iter()
                    .filter(|(_, e)| {
                        let value: Vec<AttrValue> = K::fields().read(e, path).into_iter().collect();
                        test.holds(&value)
                    })
                    .map(|(id, _)| *id)
                    .collect())
            }
            Fragment::Relationship { target, negated } => {
                let related: Box<dyn Fn(EntityId) -> bool + '_> = match target {
                    RelationshipTarget::Id(p) => {
                        let group = self.long(*p)?;
                        Box::new(move |id| table.related(id).any(|g| g as i64 == group))
                    }
                    RelationshipTarget::Name(p) => {
                        let name = self.text(*p)?;
                        Box::new(move |id| {
                            table
                                .related(id)
                                .any(|g| self.store.group_name(g) == Some(name))
                        })
                    }
                    RelationshipTarget::NamePattern(p) => {
                        let re = like_regex(self.text(*p)?, false)?;
                        Box::new(move |id| {
                            table
                                .related(id)
                                .filter_map(|g| self.store.group_name(g))
                                .any(|name| re.is_match(name))
                        })
                    }
                };
                Ok(table.ids().filter(|id| related(*id) != *negated).collect())
            }
            Fragment::Resource { name, negated } => {
                let resource = self.text(*name)?;
                Ok(table
                    .ids()
                    .filter(|id| table.has_resource(*id, resource) != *negated)
                    .collect())
            }
            Fragment::Entitlement { pattern, negated } => {
                let re = like_regex(self.text(*pattern)?, false)?;
                Ok(table
                    .ids()
                    .filter(|id| {
                        let held = K::entitlements(self.store, *id)
                            .into_iter()
                            .any(|e| re.is_match(e));
                        held != *negated
                    })
                    .collect())
            }
            Fragment::And(l, r) => {
                let left = self.matching(l)?;
                let right = self.matching(r)?;
                Ok(left.intersection(&right).copied().collect())
            }
            Fragment::Or(l, r) => {
                let mut left = self.matching(l)?;
                left.extend(self.matching(r)?);
                Ok(left)
            }
        }
    }

    fn bind(&self, test: &ValueTest) -> StorageResult<BoundTest<'a>> {
        Ok(match test {
            ValueTest::Null(null) => BoundTest::Null(*null),
            ValueTest::Compare { op, value } => BoundTest::Compare(*op, self.param(*value)?),
            ValueTest::Like {
                pattern,
                case_insensitive,
                negated,
            } => BoundTest::Like(like_regex(self.text(*pattern)?, *case_insensitive)?, *negated),
        })
    }

    fn param(&self, p: Placeholder) -> StorageResult<&'a AttrValue> {
        self.params
            .get(p)
            .ok_or(StorageError::UnboundParameter(p.index()))
    }

    fn long(&self, p: Placeholder) -> StorageResult<i64> {
        match self.param(p)? {
            AttrValue::Long(v) => Ok(*v),
            _ => Err(StorageError::ParameterType {
                index: p.index(),
                expected: "a long",
            }),
        }
    }

    fn text(&self, p: Placeholder) -> StorageResult<&'a str> {
        self.param(p)?.as_text().ok_or(StorageError::ParameterType {
            index: p.index(),
            expected: "a string",
        })
    }

    fn id_set(&self, ids: &[Placeholder]) -> StorageResult<BTreeSet<EntityId>> {
        ids.iter()
            .map(|p| self.long(*p).map(|v| v as EntityId))
            .collect()
    }
}
