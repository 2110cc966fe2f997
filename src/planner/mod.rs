//! Query planner subsystem for eavsearch
//!
//! Turns a compiled, scoped condition into an executable query: ordering,
//! pagination and the final SQL rendering.
//!
//! # Design Principles
//!
//! - Deterministic: same inputs give the same query text
//! - Stable: the identifier is always the last sort key
//! - Forgiving: unresolvable order clauses are dropped, not fatal

mod explain;
mod order;
mod query;

pub use explain::ExplainPlan;
pub use order::{OrderByClause, OrderKey, OrderPlan, OrderPlanner, OrderTerm, SortDirection, ViewJoin};
pub use query::{Page, SearchQuery};
