//! Order-by planner
//!
//! Resolves each requested sort key to a direct field or to a join against
//! an attribute view. Joins are deduplicated by (view, schema) so the same
//! view is never joined twice. Clauses that resolve to nothing are dropped
//! with a warning; the search itself goes on.

use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::compiler::{quote, SearchContext};
use crate::entity::{EntityKind, FieldLookup, FieldPath, KindTag, SearchView};
use crate::observability::SearchEvent;
use crate::schema::{SchemaCatalog, ValueColumn};

/// Name of the identifier field
const ID_FIELD: &str = "id";

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    #[serde(alias = "asc")]
    Asc,
    #[serde(alias = "desc")]
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// One requested sort key; clause order is tie-break precedence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderByClause {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl OrderByClause {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Attribute view joined for ordering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewJoin {
    pub view: SearchView,
    pub schema: String,
    pub column: ValueColumn,
}

impl ViewJoin {
    pub fn alias(index: usize) -> String {
        format!("ob{}", index + 1)
    }
}

/// What a resolved sort term reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderKey {
    Id,
    Field(FieldPath),
    /// Index into [`OrderPlan::joins`]
    Attribute(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTerm {
    pub key: OrderKey,
    pub direction: SortDirection,
}

/// Resolved ordering of one query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderPlan {
    pub joins: Vec<ViewJoin>,
    pub terms: Vec<OrderTerm>,
}

impl OrderPlan {
    /// Ordering by identifier only
    pub fn by_id() -> Self {
        Self {
            joins: Vec::new(),
            terms: vec![OrderTerm {
                key: OrderKey::Id,
                direction: SortDirection::Asc,
            }],
        }
    }

    fn join(&mut self, join: ViewJoin) -> usize {
        if let Some(existing) = self
            .joins
            .iter()
            .position(|j| j.view == join.view && j.schema == join.schema)
        {
            return existing;
        }
        self.joins.push(join);
        self.joins.len() - 1
    }

    /// LEFT OUTER JOIN clauses against the base alias `base`
    pub fn render_joins(&self, kind: KindTag, base: &str) -> String {
        self.joins
            .iter()
            .enumerate()
            .map(|(i, j)| {
                let alias = ViewJoin::alias(i);
                format!(
                    " LEFT OUTER JOIN {} {} ON {}.subject_id = {}.subject_id AND {}.schema_name = {}",
                    kind.view(j.view),
                    alias,
                    alias,
                    base,
                    alias,
                    quote(&j.schema)
                )
            })
            .collect()
    }

    /// ORDER BY list against the base alias `base`
    pub fn render_order(&self, base: &str) -> String {
        self.terms
            .iter()
            .map(|t| {
                let column = match &t.key {
                    OrderKey::Id => format!("{}.subject_id", base),
                    OrderKey::Field(path) => format!("{}.{}", base, path.column()),
                    OrderKey::Attribute(i) => match self.joins.get(*i) {
                        Some(j) => format!("{}.{}", ViewJoin::alias(*i), j.column.column_name()),
                        None => format!("{}.subject_id", base),
                    },
                };
                format!("{} {}", column, t.direction.as_str())
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Plans ordering for one entity kind
pub struct OrderPlanner<'a, K, C> {
    catalog: &'a C,
    _kind: PhantomData<K>,
}

impl<'a, K: EntityKind, C: SchemaCatalog> OrderPlanner<'a, K, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self {
            catalog,
            _kind: PhantomData,
        }
    }

    /// Resolves `clauses`; the identifier is always the final tie-break
    pub fn plan(&self, clauses: &[OrderByClause], ctx: &SearchContext) -> OrderPlan {
        let mut plan = OrderPlan::default();

        for clause in clauses {
            let key = match K::fields().resolve(&clause.field, None) {
                FieldLookup::Found(field) if !field.sortable => {
                    drop_clause(ctx, clause, "field is not sortable");
                    continue;
                }
                FieldLookup::Found(field) if field.path.name == ID_FIELD => OrderKey::Id,
                FieldLookup::Found(field) => OrderKey::Field(field.path),
                FieldLookup::InvalidSubField { .. } => {
                    drop_clause(ctx, clause, "invalid sub-field");
                    continue;
                }
                FieldLookup::Unknown => match self.catalog.resolve(&clause.field) {
                    Some(schema) => {
                        let view = if schema.is_effectively_unique() {
                            SearchView::UniqueAttr
                        } else if schema.multivalue {
                            SearchView::FirstAttr
                        } else {
                            SearchView::Attr
                        };
                        OrderKey::Attribute(plan.join(ViewJoin {
                            view,
                            column: schema.value_type.column(),
                            schema: schema.name,
                        }))
                    }
                    None => {
                        drop_clause(ctx, clause, "no such field or schema");
                        continue;
                    }
                },
            };

            if plan.terms.iter().any(|t| t.key == key) {
                continue;
            }
            plan.terms.push(OrderTerm {
                key,
                direction: clause.direction,
            });
        }

        if !plan.terms.iter().any(|t| t.key == OrderKey::Id) {
            plan.terms.push(OrderTerm {
                key: OrderKey::Id,
                direction: SortDirection::Asc,
            });
        }
        plan
    }
}

fn drop_clause(ctx: &SearchContext, clause: &OrderByClause, reason: &str) {
    ctx.log(
        SearchEvent::OrderClauseDropped,
        &[("field", clause.field.as_str()), ("reason", reason)],
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Principals;
    use crate::observability::Logger;
    use crate::schema::{AttributeSchema, MemoryCatalog, ValueType};

    fn plan(clauses: &[OrderByClause]) -> (OrderPlan, Vec<String>) {
        let catalog = MemoryCatalog::new()
            .with_schema(AttributeSchema::new("age", ValueType::Long))
            .with_schema(AttributeSchema::new("email", ValueType::String).unique())
            .with_schema(AttributeSchema::new("tags", ValueType::String).multivalue());
        let planner = OrderPlanner::<Principals, _>::new(&catalog);
        let ctx = SearchContext::new(KindTag::Principal);
        Logger::capture(|| planner.plan(clauses, &ctx))
    }

    #[test]
    fn test_view_selection() {
        let (plan, _) = plan(&[
            OrderByClause::asc("email"),
            OrderByClause::desc("age"),
            OrderByClause::asc("tags"),
        ]);
        let views: Vec<_> = plan.joins.iter().map(|j| j.view).collect();
        assert_eq!(
            views,
            vec![SearchView::UniqueAttr, SearchView::Attr, SearchView::FirstAttr]
        );
        assert_eq!(plan.terms.len(), 4);
        assert_eq!(plan.terms[3].key, OrderKey::Id);
    }

    #[test]
    fn test_same_schema_joined_once() {
        let (plan, _) = plan(&[OrderByClause::asc("age"), OrderByClause::desc("age")]);
        assert_eq!(plan.joins.len(), 1);
        // The repeated clause adds no term
        assert_eq!(plan.terms.len(), 2);
        assert_eq!(plan.terms[0].direction, SortDirection::Asc);
    }

    #[test]
    fn test_unresolvable_and_sensitive_dropped() {
        let (plan, logs) = plan(&[
            OrderByClause::asc("bogus"),
            OrderByClause::asc("password"),
            OrderByClause::asc("username"),
        ]);
        assert_eq!(plan.terms.len(), 2);
        assert_eq!(
            plan.terms[0].key,
            OrderKey::Field(FieldPath::new("username", None))
        );
        assert_eq!(logs.len(), 2);
        assert!(logs.iter().all(|l| l.contains("SEARCH_ORDER_CLAUSE_DROPPED")));
    }

    #[test]
    fn test_explicit_id_not_duplicated() {
        let (plan, _) = plan(&[OrderByClause::desc("key")]);
        assert_eq!(
            plan.terms,
            vec![OrderTerm {
                key: OrderKey::Id,
                direction: SortDirection::Desc
            }]
        );
    }

    #[test]
    fn test_render() {
        let (plan, _) = plan(&[OrderByClause::desc("age"), OrderByClause::asc("manager")]);
        assert_eq!(
            plan.render_joins(KindTag::Principal, "b"),
            " LEFT OUTER JOIN principal_search_attr ob1 ON ob1.subject_id = b.subject_id \
             AND ob1.schema_name = 'age'"
        );
        assert_eq!(
            plan.render_order("b"),
            "ob1.longvalue DESC, b.manager_id ASC, b.subject_id ASC"
        );
    }

    #[test]
    fn test_direction_json() {
        let clause: OrderByClause =
            serde_json::from_str(r#"{"field": "age", "direction": "desc"}"#).unwrap();
        assert_eq!(clause, OrderByClause::desc("age"));
        let clause: OrderByClause = serde_json::from_str(r#"{"field": "age"}"#).unwrap();
        assert_eq!(clause.direction, SortDirection::Asc);
    }
}
