//! Observable events of the search engine
//!
//! Events are explicit and typed; each carries a fixed severity.

use std::fmt;

use super::logger::{Logger, Severity};

/// Observable events in eavsearch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchEvent {
    // Configuration
    /// Configuration loaded
    ConfigLoaded,
    /// Dataset loaded into the in-memory store
    DatasetLoaded,

    // Compilation
    /// Leaf names a schema the catalog does not know
    UnknownSchema,
    /// Leaf names a direct field the entity kind does not have
    UnknownField,
    /// Expression does not coerce to the declared type
    InvalidExpression,
    /// LIKE / ILIKE on a non-textual value
    PatternTypeMismatch,
    /// Order clause could not be resolved or is not sortable
    OrderClauseDropped,
    /// Compiled query text
    QueryCompiled,

    // Execution
    /// Condition tree rejected before compilation
    InvalidCondition,
    /// Empty scope over a non-empty group universe
    EmptyScope,
    /// Backing store failed
    ExecutionFailed,
    /// Matched identifier no longer resolves to an entity
    StaleIdentifier,
    /// Search returned
    SearchComplete,
    /// Count returned
    CountComplete,
}

impl SearchEvent {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchEvent::ConfigLoaded => "CONFIG_LOADED",
            SearchEvent::DatasetLoaded => "DATASET_LOADED",

            SearchEvent::UnknownSchema => "SEARCH_UNKNOWN_SCHEMA",
            SearchEvent::UnknownField => "SEARCH_UNKNOWN_FIELD",
            SearchEvent::InvalidExpression => "SEARCH_INVALID_EXPRESSION",
            SearchEvent::PatternTypeMismatch => "SEARCH_PATTERN_TYPE_MISMATCH",
            SearchEvent::OrderClauseDropped => "SEARCH_ORDER_CLAUSE_DROPPED",
            SearchEvent::QueryCompiled => "SEARCH_QUERY_COMPILED",

            SearchEvent::InvalidCondition => "SEARCH_INVALID_CONDITION",
            SearchEvent::EmptyScope => "SEARCH_EMPTY_SCOPE",
            SearchEvent::ExecutionFailed => "SEARCH_EXECUTION_FAILED",
            SearchEvent::StaleIdentifier => "SEARCH_STALE_IDENTIFIER",
            SearchEvent::SearchComplete => "SEARCH_COMPLETE",
            SearchEvent::CountComplete => "COUNT_COMPLETE",
        }
    }

    /// Fixed severity of this event
    pub fn severity(&self) -> Severity {
        match self {
            SearchEvent::QueryCompiled => Severity::Trace,

            SearchEvent::UnknownSchema
            | SearchEvent::UnknownField
            | SearchEvent::InvalidExpression
            | SearchEvent::PatternTypeMismatch
            | SearchEvent::OrderClauseDropped => Severity::Warn,

            SearchEvent::InvalidCondition
            | SearchEvent::ExecutionFailed
            | SearchEvent::StaleIdentifier => Severity::Error,

            SearchEvent::ConfigLoaded
            | SearchEvent::DatasetLoaded
            | SearchEvent::EmptyScope
            | SearchEvent::SearchComplete
            | SearchEvent::CountComplete => Severity::Info,
        }
    }

    /// Emit this event
    pub fn log(&self, fields: &[(&str, &str)]) {
        Logger::log(self.severity(), self.as_str(), fields);
    }
}

impl fmt::Display for SearchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
