//! Tree compiler
//!
//! Recursive descent over a [`SearchCondition`]. The parameter list is
//! threaded through by value: every step takes the list built so far and
//! returns it extended, so placeholders are numbered strictly left to
//! right, depth first.

use crate::condition::SearchCondition;
use crate::entity::EntityKind;
use crate::executor::SearchResult;
use crate::schema::SchemaCatalog;

use super::context::SearchContext;
use super::fragment::{CompiledFragment, Fragment, Params};
use super::leaf::LeafTranslator;

/// Compiles condition trees of one entity kind
pub struct ConditionCompiler<'a, K, C> {
    leaves: LeafTranslator<'a, K, C>,
}

impl<'a, K: EntityKind, C: SchemaCatalog> ConditionCompiler<'a, K, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self {
            leaves: LeafTranslator::new(catalog),
        }
    }

    /// Compiles and normalizes `cond`
    pub fn compile(
        &self,
        cond: &SearchCondition,
        ctx: &SearchContext,
    ) -> SearchResult<CompiledFragment> {
        let (fragment, params) = self.compile_node(cond, Params::new(), ctx)?;
        Ok(CompiledFragment::new(fragment, params).normalize())
    }

    fn compile_node(
        &self,
        cond: &SearchCondition,
        params: Params,
        ctx: &SearchContext,
    ) -> SearchResult<(Fragment, Params)> {
        match cond {
            SearchCondition::Leaf { cond, negated } => {
                self.leaves.translate(cond, *negated, params, ctx)
            }
            SearchCondition::And(l, r) => {
                let (l, params) = self.compile_node(l, params, ctx)?;
                let (r, params) = self.compile_node(r, params, ctx)?;
                Ok((Fragment::and(l, r), params))
            }
            SearchCondition::Or(l, r) => {
                let (l, params) = self.compile_node(l, params, ctx)?;
                let (r, params) = self.compile_node(r, params, ctx)?;
                Ok((Fragment::or(l, r), params))
            }
        }
    }
}
