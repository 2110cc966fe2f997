//! Search condition AST
//!
//! Callers build a [`SearchCondition`] tree; the compiler consumes it.

mod ast;
mod validate;

pub use ast::{
    AttributeCond, CompareOp, DirectFieldCond, EntitlementCond, LeafCond, RelOp,
    RelationshipCond, ResourceCond, SearchCondition,
};
pub use validate::ConditionError;
