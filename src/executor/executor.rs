//! Search executor for eavsearch
//!
//! Execution flow (strict order):
//! 1. Validate the condition tree
//! 2. Short-circuit an empty scope over a non-empty group universe
//! 3. Compile the condition, wrap it with the scope filter
//! 4. Plan ordering and the page window
//! 5. Execute against the store
//! 6. Deduplicate identifiers, reload entities, drop stale ones
//!
//! `search` swallows store failures and returns an empty list; `count`
//! and `matches` propagate them.

use std::collections::HashSet;
use std::marker::PhantomData;

use crate::compiler::{AdministrativeScope, ConditionCompiler, ScopeFilter, SearchContext};
use crate::condition::SearchCondition;
use crate::entity::{EntityId, EntityKind};
use crate::observability::SearchEvent;
use crate::planner::{ExplainPlan, OrderByClause, OrderPlanner, Page, SearchQuery};
use crate::schema::{AttrValue, SchemaCatalog};
use crate::storage::SearchStore;

use super::errors::SearchResult;

/// Runs searches of kind `K` against a store and schema catalog
pub struct SearchExecutor<'a, K, S, C> {
    store: &'a S,
    catalog: &'a C,
    log_queries: bool,
    _kind: PhantomData<K>,
}

impl<'a, K, S, C> SearchExecutor<'a, K, S, C>
where
    K: EntityKind,
    S: SearchStore<K>,
    C: SchemaCatalog,
{
    pub fn new(store: &'a S, catalog: &'a C) -> Self {
        Self {
            store,
            catalog,
            log_queries: false,
            _kind: PhantomData,
        }
    }

    /// Logs every compiled query at TRACE
    pub fn with_query_logging(mut self, enabled: bool) -> Self {
        self.log_queries = enabled;
        self
    }

    /// Number of visible entities matching `cond`.
    ///
    /// Store failures are returned to the caller.
    pub fn count(&self, scope: &AdministrativeScope, cond: &SearchCondition) -> SearchResult<u64> {
        let ctx = SearchContext::new(K::TAG);
        self.validate(cond, &ctx)?;
        if self.scope_excludes_all(scope, &ctx)? {
            return Ok(0);
        }

        let query = self.assemble(scope, cond, &[], Page::unbounded(), None, &ctx)?;
        let count = self.store.count(&query).map_err(|e| {
            ctx.log(SearchEvent::ExecutionFailed, &[("error", e.to_string().as_str())]);
            e
        })?;

        ctx.log(SearchEvent::CountComplete, &[("count", count.to_string().as_str())]);
        Ok(count)
    }

    /// One page of visible entities matching `cond`.
    ///
    /// `page` is 1-based; a negative page or page size means unbounded.
    /// Store failures are logged and yield an empty list. A malformed
    /// condition is still an error.
    pub fn search(
        &self,
        scope: &AdministrativeScope,
        cond: &SearchCondition,
        page: i64,
        page_size: i64,
        order_by: &[OrderByClause],
    ) -> SearchResult<Vec<K::Entity>> {
        let ctx = SearchContext::new(K::TAG);
        match self.try_search(scope, cond, Page::new(page, page_size), order_by, &ctx) {
            Ok(entities) => {
                ctx.log(
                    SearchEvent::SearchComplete,
                    &[
                        ("page", page.to_string().as_str()),
                        ("page_size", page_size.to_string().as_str()),
                        ("results", entities.len().to_string().as_str()),
                    ],
                );
                Ok(entities)
            }
            Err(e) if e.is_rejection() => Err(e),
            Err(e) => {
                ctx.log(SearchEvent::ExecutionFailed, &[("error", e.message())]);
                Ok(Vec::new())
            }
        }
    }

    /// Every visible entity matching `cond`, ordered by identifier
    pub fn search_all(
        &self,
        scope: &AdministrativeScope,
        cond: &SearchCondition,
    ) -> SearchResult<Vec<K::Entity>> {
        self.search(scope, cond, -1, -1, &[])
    }

    /// Whether `entity` is visible within `scope` and matches `cond`
    pub fn matches(
        &self,
        entity: &K::Entity,
        cond: &SearchCondition,
        scope: &AdministrativeScope,
    ) -> SearchResult<bool> {
        let ctx = SearchContext::new(K::TAG);
        self.validate(cond, &ctx)?;
        if self.scope_excludes_all(scope, &ctx)? {
            return Ok(false);
        }

        let id = K::id(entity);
        let query = self.assemble(scope, cond, &[], Page::unbounded(), Some(id), &ctx)?;
        Ok(self.store.count(&query)? > 0)
    }

    /// The query `search` would run, without touching the store
    pub fn explain(
        &self,
        scope: &AdministrativeScope,
        cond: &SearchCondition,
        page: i64,
        page_size: i64,
        order_by: &[OrderByClause],
    ) -> SearchResult<ExplainPlan> {
        let ctx = SearchContext::new(K::TAG);
        self.validate(cond, &ctx)?;
        let query = self.assemble(scope, cond, order_by, Page::new(page, page_size), None, &ctx)?;
        Ok(ExplainPlan::from_query(cond, &query))
    }

    fn try_search(
        &self,
        scope: &AdministrativeScope,
        cond: &SearchCondition,
        page: Page,
        order_by: &[OrderByClause],
        ctx: &SearchContext,
    ) -> SearchResult<Vec<K::Entity>> {
        self.validate(cond, ctx)?;
        if self.scope_excludes_all(scope, ctx)? {
            return Ok(Vec::new());
        }

        let query = self.assemble(scope, cond, order_by, page, None, ctx)?;
        let ids = self.store.execute(&query)?;
        self.materialize(ids, ctx)
    }

    fn validate(&self, cond: &SearchCondition, ctx: &SearchContext) -> SearchResult<()> {
        cond.validate().map_err(|e| {
            ctx.log(
                SearchEvent::InvalidCondition,
                &[("reason", e.to_string().as_str())],
            );
            e.into()
        })
    }

    /// An empty scope sees nothing unless there is nothing to restrict
    fn scope_excludes_all(
        &self,
        scope: &AdministrativeScope,
        ctx: &SearchContext,
    ) -> SearchResult<bool> {
        if !scope.is_empty() || !self.store.has_groups()? {
            return Ok(false);
        }
        ctx.log(SearchEvent::EmptyScope, &[]);
        Ok(true)
    }

    fn assemble(
        &self,
        scope: &AdministrativeScope,
        cond: &SearchCondition,
        order_by: &[OrderByClause],
        page: Page,
        restrict_to: Option<EntityId>,
        ctx: &SearchContext,
    ) -> SearchResult<SearchQuery> {
        let compiled = ConditionCompiler::<K, C>::new(self.catalog).compile(cond, ctx)?;
        let (scope, mut params) = ScopeFilter::build(K::SCOPE_POLICY, scope, compiled.params);
        let restrict_to = restrict_to.map(|id| params.bind(AttrValue::Long(id as i64)));
        let order = OrderPlanner::<K, C>::new(self.catalog).plan(order_by, ctx);

        let query = SearchQuery {
            kind: K::TAG,
            fragment: compiled.fragment,
            scope,
            restrict_to,
            order,
            page,
            params,
        };
        if self.log_queries {
            ctx.log(
                SearchEvent::QueryCompiled,
                &[
                    ("params", query.params.len().to_string().as_str()),
                    ("sql", query.render().as_str()),
                ],
            );
        }
        Ok(query)
    }

    /// Reloads matched ids in order; duplicates collapse, stale ids drop
    fn materialize(&self, ids: Vec<EntityId>, ctx: &SearchContext) -> SearchResult<Vec<K::Entity>> {
        let mut seen = HashSet::with_capacity(ids.len());
        let mut entities = Vec::with_capacity(ids.len());

        for id in ids {
            if !seen.insert(id) {
                continue;
            }
            match self.store.load(id)? {
                Some(entity) => entities.push(entity),
                None => ctx.log(
                    SearchEvent::StaleIdentifier,
                    &[("id", id.to_string().as_str())],
                ),
            }
        }
        Ok(entities)
    }
}
