//! Search condition tree
//!
//! A condition is a binary tree: internal nodes are AND / OR of two
//! children, leaves carry exactly one leaf condition plus a negation flag.
//! A tree always holds at least one leaf; an empty conjunction cannot be
//! built through [`SearchCondition::and_all`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// Comparison operator of attribute and direct-field conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CompareOp {
    Eq,
    Ne,
    Ge,
    Gt,
    Le,
    Lt,
    Like,
    Ilike,
    IsNull,
    IsNotNull,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "EQ",
            CompareOp::Ne => "NE",
            CompareOp::Ge => "GE",
            CompareOp::Gt => "GT",
            CompareOp::Le => "LE",
            CompareOp::Lt => "LT",
            CompareOp::Like => "LIKE",
            CompareOp::Ilike => "ILIKE",
            CompareOp::IsNull => "ISNULL",
            CompareOp::IsNotNull => "ISNOTNULL",
        }
    }

    /// Null tests carry no expression
    pub fn needs_expression(&self) -> bool {
        !matches!(self, CompareOp::IsNull | CompareOp::IsNotNull)
    }

    pub fn is_pattern(&self) -> bool {
        matches!(self, CompareOp::Like | CompareOp::Ilike)
    }

    /// Relational form of this operator, if it has one
    pub fn relational(&self) -> Option<RelOp> {
        match self {
            CompareOp::Eq => Some(RelOp::Eq),
            CompareOp::Ne => Some(RelOp::Ne),
            CompareOp::Ge => Some(RelOp::Ge),
            CompareOp::Gt => Some(RelOp::Gt),
            CompareOp::Le => Some(RelOp::Le),
            CompareOp::Lt => Some(RelOp::Lt),
            _ => None,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Relational operator, closed under negation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelOp {
    Eq,
    Ne,
    Ge,
    Gt,
    Le,
    Lt,
}

impl RelOp {
    /// De Morgan counterpart
    pub fn negate(self) -> Self {
        match self {
            RelOp::Eq => RelOp::Ne,
            RelOp::Ne => RelOp::Eq,
            RelOp::Ge => RelOp::Lt,
            RelOp::Gt => RelOp::Le,
            RelOp::Le => RelOp::Gt,
            RelOp::Lt => RelOp::Ge,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            RelOp::Eq => "=",
            RelOp::Ne => "<>",
            RelOp::Ge => ">=",
            RelOp::Gt => ">",
            RelOp::Le => "<=",
            RelOp::Lt => "<",
        }
    }
}

/// Condition on a dynamic attribute value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeCond {
    pub schema: String,
    pub op: CompareOp,
    #[serde(default)]
    pub expression: Option<String>,
}

impl AttributeCond {
    pub fn new(schema: impl Into<String>, op: CompareOp, expression: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            op,
            expression: Some(expression.into()),
        }
    }

    pub fn eq(schema: impl Into<String>, expression: impl Into<String>) -> Self {
        Self::new(schema, CompareOp::Eq, expression)
    }

    pub fn like(schema: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(schema, CompareOp::Like, pattern)
    }

    pub fn is_null(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            op: CompareOp::IsNull,
            expression: None,
        }
    }

    pub fn is_not_null(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            op: CompareOp::IsNotNull,
            expression: None,
        }
    }
}

/// Membership (principals) or parent (groups) relationship.
///
/// Exactly one of `group_id` / `group_name` is set. A name containing `%`
/// is a LIKE pattern over related group names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipCond {
    #[serde(default)]
    pub group_id: Option<EntityId>,
    #[serde(default)]
    pub group_name: Option<String>,
}

impl RelationshipCond {
    pub fn by_id(group_id: EntityId) -> Self {
        Self {
            group_id: Some(group_id),
            group_name: None,
        }
    }

    pub fn by_name(group_name: impl Into<String>) -> Self {
        Self {
            group_id: None,
            group_name: Some(group_name.into()),
        }
    }
}

/// Association with an external resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCond {
    pub resource: String,
}

impl ResourceCond {
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
        }
    }
}

/// Entitlement name pattern (LIKE semantics)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementCond {
    pub pattern: String,
}

impl EntitlementCond {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }
}

/// Condition on a static field of the entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectFieldCond {
    pub field: String,
    pub op: CompareOp,
    #[serde(default)]
    pub expression: Option<String>,
}

impl DirectFieldCond {
    pub fn new(field: impl Into<String>, op: CompareOp, expression: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op,
            expression: Some(expression.into()),
        }
    }

    pub fn eq(field: impl Into<String>, expression: impl Into<String>) -> Self {
        Self::new(field, CompareOp::Eq, expression)
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op: CompareOp::IsNull,
            expression: None,
        }
    }
}

/// One atomic predicate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeafCond {
    Attribute(AttributeCond),
    Relationship(RelationshipCond),
    Resource(ResourceCond),
    Entitlement(EntitlementCond),
    DirectField(DirectFieldCond),
}

impl From<AttributeCond> for LeafCond {
    fn from(cond: AttributeCond) -> Self {
        LeafCond::Attribute(cond)
    }
}

impl From<RelationshipCond> for LeafCond {
    fn from(cond: RelationshipCond) -> Self {
        LeafCond::Relationship(cond)
    }
}

impl From<ResourceCond> for LeafCond {
    fn from(cond: ResourceCond) -> Self {
        LeafCond::Resource(cond)
    }
}

impl From<EntitlementCond> for LeafCond {
    fn from(cond: EntitlementCond) -> Self {
        LeafCond::Entitlement(cond)
    }
}

impl From<DirectFieldCond> for LeafCond {
    fn from(cond: DirectFieldCond) -> Self {
        LeafCond::DirectField(cond)
    }
}

/// Boolean expression tree over leaf conditions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchCondition {
    Leaf {
        cond: LeafCond,
        #[serde(default)]
        negated: bool,
    },
    And(Box<SearchCondition>, Box<SearchCondition>),
    Or(Box<SearchCondition>, Box<SearchCondition>),
}

impl SearchCondition {
    pub fn leaf(cond: impl Into<LeafCond>) -> Self {
        SearchCondition::Leaf {
            cond: cond.into(),
            negated: false,
        }
    }

    pub fn not_leaf(cond: impl Into<LeafCond>) -> Self {
        SearchCondition::Leaf {
            cond: cond.into(),
            negated: true,
        }
    }

    pub fn and(left: SearchCondition, right: SearchCondition) -> Self {
        SearchCondition::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: SearchCondition, right: SearchCondition) -> Self {
        SearchCondition::Or(Box::new(left), Box::new(right))
    }

    /// Left-deep conjunction; None when `conds` is empty
    pub fn and_all(conds: impl IntoIterator<Item = SearchCondition>) -> Option<Self> {
        conds.into_iter().reduce(SearchCondition::and)
    }

    /// Left-deep disjunction; None when `conds` is empty
    pub fn or_all(conds: impl IntoIterator<Item = SearchCondition>) -> Option<Self> {
        conds.into_iter().reduce(SearchCondition::or)
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            SearchCondition::Leaf { .. } => 1,
            SearchCondition::And(l, r) | SearchCondition::Or(l, r) => {
                l.leaf_count() + r.leaf_count()
            }
        }
    }
}

impl fmt::Display for LeafCond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeafCond::Attribute(c) => match &c.expression {
                Some(expr) => write!(f, "{} {} '{}'", c.schema, c.op, expr),
                None => write!(f, "{} {}", c.schema, c.op),
            },
            LeafCond::DirectField(c) => match &c.expression {
                Some(expr) => write!(f, "${} {} '{}'", c.field, c.op, expr),
                None => write!(f, "${} {}", c.field, c.op),
            },
            LeafCond::Relationship(c) => match (&c.group_id, &c.group_name) {
                (Some(id), _) => write!(f, "RELATED {}", id),
                (None, Some(name)) => write!(f, "RELATED '{}'", name),
                (None, None) => write!(f, "RELATED ?"),
            },
            LeafCond::Resource(c) => write!(f, "RESOURCE '{}'", c.resource),
            LeafCond::Entitlement(c) => write!(f, "ENTITLEMENT '{}'", c.pattern),
        }
    }
}

impl fmt::Display for SearchCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchCondition::Leaf { cond, negated } => {
                if *negated {
                    write!(f, "NOT ({})", cond)
                } else {
                    write!(f, "{}", cond)
                }
            }
            SearchCondition::And(l, r) => write!(f, "({} AND {})", l, r),
            SearchCondition::Or(l, r) => write!(f, "({} OR {})", l, r),
        }
    }
}
