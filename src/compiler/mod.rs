//! Search condition compiler
//!
//! Turns a [`SearchCondition`](crate::condition::SearchCondition) into a
//! structured fragment plus positional parameters, then wraps it with the
//! caller's administrative scope.
//!
//! # Design Principles
//!
//! 1. One generic compiler for every entity kind
//! 2. Parameters are threaded by value, never shared
//! 3. Bad leaves degrade to "matches nothing" instead of failing the query
//! 4. Scope filtering is orthogonal to the user's condition

mod context;
mod fragment;
mod leaf;
mod scope;
mod tree;

pub use context::SearchContext;
pub use fragment::{
    CompiledFragment, Fragment, NullTest, Params, Placeholder, RelationshipTarget, SqlWriter,
    ValueTest,
};
pub use leaf::LeafTranslator;
pub use scope::{AdministrativeScope, ScopeFilter};
pub use tree::ConditionCompiler;

pub(crate) use fragment::quote;
