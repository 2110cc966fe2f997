//! Structural validation of condition trees
//!
//! Runs before any compilation. A tree that fails here is the caller's
//! mistake and is rejected outright; per-leaf data problems (unknown
//! schema, bad literal) are not checked here and degrade to match nothing.

use thiserror::Error;

use super::ast::{CompareOp, LeafCond, SearchCondition};

/// Structural defects of a condition tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    #[error("{leaf} condition has an empty {what}")]
    EmptyName {
        leaf: &'static str,
        what: &'static str,
    },

    #[error("operator {op} on '{target}' requires an expression")]
    MissingExpression { target: String, op: CompareOp },

    #[error("relationship condition needs a group id or a group name")]
    MissingRelationshipTarget,

    #[error("relationship condition sets both group id {id} and group name '{name}'")]
    AmbiguousRelationshipTarget { id: u64, name: String },
}

impl SearchCondition {
    /// Checks every leaf of the tree
    pub fn validate(&self) -> Result<(), ConditionError> {
        match self {
            SearchCondition::Leaf { cond, .. } => validate_leaf(cond),
            SearchCondition::And(l, r) | SearchCondition::Or(l, r) => {
                l.validate()?;
                r.validate()
            }
        }
    }
}

fn validate_leaf(cond: &LeafCond) -> Result<(), ConditionError> {
    match cond {
        LeafCond::Attribute(c) => {
            require_name(&c.schema, "attribute", "schema name")?;
            require_expression(&c.schema, c.op, c.expression.as_deref())
        }
        LeafCond::DirectField(c) => {
            require_name(&c.field, "direct field", "field name")?;
            require_expression(&c.field, c.op, c.expression.as_deref())
        }
        LeafCond::Relationship(c) => match (&c.group_id, &c.group_name) {
            (None, None) => Err(ConditionError::MissingRelationshipTarget),
            (Some(id), Some(name)) => Err(ConditionError::AmbiguousRelationshipTarget {
                id: *id,
                name: name.clone(),
            }),
            (None, Some(name)) => require_name(name, "relationship", "group name"),
            (Some(_), None) => Ok(()),
        },
        LeafCond::Resource(c) => require_name(&c.resource, "resource", "resource name"),
        LeafCond::Entitlement(c) => require_name(&c.pattern, "entitlement", "pattern"),
    }
}

fn require_name(name: &str, leaf: &'static str, what: &'static str) -> Result<(), ConditionError> {
    if name.trim().is_empty() {
        return Err(ConditionError::EmptyName { leaf, what });
    }
    Ok(())
}

fn require_expression(
    target: &str,
    op: CompareOp,
    expression: Option<&str>,
) -> Result<(), ConditionError> {
    if op.needs_expression() && expression.is_none() {
        return Err(ConditionError::MissingExpression {
            target: target.to_string(),
            op,
        });
    }
    Ok(())
}
