//! Explain output
//!
//! Produces deterministic, human-readable explain output: the condition as
//! written, the SQL the engine would run and its ordered parameters.

use std::fmt;

use serde::Serialize;

use crate::entity::KindTag;
use crate::schema::AttrValue;

use super::query::SearchQuery;

/// Explain plan output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplainPlan {
    /// Entity kind searched
    pub kind: KindTag,
    /// Condition tree as written
    pub condition: String,
    /// Ordered, paginated identifier query
    pub sql: String,
    /// Counting query
    pub count_sql: String,
    /// Parameters in placeholder order
    pub params: Vec<AttrValue>,
}

impl ExplainPlan {
    /// Creates an explain plan from an assembled query
    pub fn from_query(condition: impl fmt::Display, query: &SearchQuery) -> Self {
        Self {
            kind: query.kind,
            condition: condition.to_string(),
            sql: query.render(),
            count_sql: query.render_count(),
            params: query.params.iter().cloned().collect(),
        }
    }
}

impl fmt::Display for ExplainPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXPLAIN PLAN ===")?;
        writeln!(f, "Kind: {}", self.kind)?;
        writeln!(f, "Condition: {}", self.condition)?;
        writeln!(f, "Query: {}", self.sql)?;
        writeln!(f, "Count: {}", self.count_sql)?;
        if !self.params.is_empty() {
            writeln!(f, "Parameters:")?;
            for (i, value) in self.params.iter().enumerate() {
                writeln!(f, "  ?{} = {}", i + 1, value)?;
            }
        }
        Ok(())
    }
}
