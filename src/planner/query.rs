//! Final query assembly
//!
//! Combines the compiled condition, the scope filter, an optional single
//! entity restriction, the order plan and pagination into one
//! [`SearchQuery`]. The store executes the structured form; [`render`]
//! produces the equivalent SQL.
//!
//! [`render`]: SearchQuery::render

use crate::compiler::{Fragment, Params, Placeholder, ScopeFilter, SqlWriter};
use crate::entity::{KindTag, SearchView};

use super::order::OrderPlan;

/// Alias of the kind's base view in the outer query
const BASE_ALIAS: &str = "b";

/// Offset / limit window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub offset: u64,
    /// None means unbounded
    pub limit: Option<u64>,
}

impl Page {
    /// 1-based page of `size` items.
    ///
    /// A negative page or size means unbounded; size 0 yields an empty page.
    pub fn new(page: i64, size: i64) -> Self {
        if page < 0 || size < 0 {
            return Self::unbounded();
        }
        let size = size as u64;
        let index = (page.max(1) - 1) as u64;
        Self {
            offset: size.saturating_mul(index),
            limit: Some(size),
        }
    }

    pub fn unbounded() -> Self {
        Self {
            offset: 0,
            limit: None,
        }
    }

    /// Applies the window to an ordered list
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let skip = usize::try_from(self.offset).unwrap_or(usize::MAX);
        let iter = items.into_iter().skip(skip);
        match self.limit {
            Some(limit) => iter
                .take(usize::try_from(limit).unwrap_or(usize::MAX))
                .collect(),
            None => iter.collect(),
        }
    }
}

/// Executable search: condition, scope, ordering and window
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub kind: KindTag,
    pub fragment: Fragment,
    pub scope: ScopeFilter,
    /// Restricts the result to one entity id
    pub restrict_to: Option<Placeholder>,
    pub order: OrderPlan,
    pub page: Page,
    pub params: Params,
}

impl SearchQuery {
    /// SQL selecting the ordered, paginated identifiers
    pub fn render(&self) -> String {
        let mut sql = format!(
            "SELECT {b}.subject_id FROM {} {b}{}",
            self.kind.view(SearchView::Base),
            self.order.render_joins(self.kind, BASE_ALIAS),
            b = BASE_ALIAS
        );
        sql.push_str(&self.render_where());
        sql.push_str(" ORDER BY ");
        sql.push_str(&self.order.render_order(BASE_ALIAS));
        if let Some(limit) = self.page.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        if self.page.offset > 0 {
            sql.push_str(&format!(" OFFSET {}", self.page.offset));
        }
        sql
    }

    /// SQL counting the matches, ignoring order and window
    pub fn render_count(&self) -> String {
        let mut sql = format!(
            "SELECT COUNT({b}.subject_id) FROM {} {b}",
            self.kind.view(SearchView::Base),
            b = BASE_ALIAS
        );
        sql.push_str(&self.render_where());
        sql
    }

    fn render_where(&self) -> String {
        let id_column = format!("{}.subject_id", BASE_ALIAS);

        let mut w = SqlWriter::new();
        self.fragment.render(self.kind, &mut w);
        let mut clauses = vec![format!("{} IN ({})", id_column, w.finish())];

        if let Some(scope) = self.scope.render(self.kind, &id_column) {
            clauses.push(scope);
        }
        if let Some(id) = self.restrict_to {
            clauses.push(format!("{} = {}", id_column, id));
        }
        format!(" WHERE {}", clauses.join(" AND "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ValueTest;
    use crate::condition::RelOp;
    use crate::schema::{AttrValue, ValueColumn};

    #[test]
    fn test_page_offsets() {
        assert_eq!(Page::new(1, 10), Page { offset: 0, limit: Some(10) });
        assert_eq!(Page::new(3, 10), Page { offset: 20, limit: Some(10) });
        // Page 0 is treated as the first page
        assert_eq!(Page::new(0, 10), Page { offset: 0, limit: Some(10) });
        assert_eq!(Page::new(2, -1), Page::unbounded());
        assert_eq!(Page::new(-1, 10), Page::unbounded());
        assert_eq!(Page::new(2, 0), Page { offset: 0, limit: Some(0) });
    }

    #[test]
    fn test_page_apply() {
        let items: Vec<u32> = (1..=7).collect();
        assert_eq!(Page::new(2, 3).apply(items.clone()), vec![4, 5, 6]);
        assert_eq!(Page::new(3, 3).apply(items.clone()), vec![7]);
        assert_eq!(Page::new(4, 3).apply(items.clone()), Vec::<u32>::new());
        assert_eq!(Page::new(1, 0).apply(items.clone()), Vec::<u32>::new());
        assert_eq!(Page::unbounded().apply(items.clone()), items);
    }

    #[test]
    fn test_render_full_query() {
        let mut params = Params::new();
        let value = params.bind(AttrValue::Long(30));
        let scope_id = params.bind(AttrValue::Long(5));
        let restrict = params.bind(AttrValue::Long(9));

        let query = SearchQuery {
            kind: KindTag::Group,
            fragment: Fragment::Attribute {
                schema: "age".into(),
                column: ValueColumn::Long,
                test: ValueTest::Compare {
                    op: RelOp::Eq,
                    value,
                },
            },
            scope: ScopeFilter::Containment(vec![scope_id]),
            restrict_to: Some(restrict),
            order: OrderPlan::by_id(),
            page: Page::new(2, 10),
            params,
        };

        assert_eq!(
            query.render(),
            "SELECT b.subject_id FROM group_search b WHERE b.subject_id IN \
             (SELECT subject_id FROM group_search_attr WHERE schema_name = 'age' AND longvalue = ?1) \
             AND b.subject_id IN (?2) AND b.subject_id = ?3 \
             ORDER BY b.subject_id ASC LIMIT 10 OFFSET 10"
        );
        assert!(query
            .render_count()
            .starts_with("SELECT COUNT(b.subject_id) FROM group_search b WHERE"));
    }
}
