//! Search error types
//!
//! Error codes:
//! - EAV_INVALID_SEARCH_CONDITION (REJECT)
//! - EAV_EXECUTION_FAILED (ERROR)

use std::fmt;

use crate::condition::ConditionError;
use crate::storage::StorageError;

/// Severity levels for search errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Client request rejected; the caller must fix it
    Reject,
    /// Operation failed but the engine is healthy
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Search error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchErrorCode {
    /// Malformed condition tree
    EavInvalidSearchCondition,
    /// Backing store failure
    EavExecutionFailed,
}

impl SearchErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SearchErrorCode::EavInvalidSearchCondition => "EAV_INVALID_SEARCH_CONDITION",
            SearchErrorCode::EavExecutionFailed => "EAV_EXECUTION_FAILED",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            SearchErrorCode::EavInvalidSearchCondition => Severity::Reject,
            SearchErrorCode::EavExecutionFailed => Severity::Error,
        }
    }
}

impl fmt::Display for SearchErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Search error type with full context
#[derive(Debug)]
pub struct SearchError {
    code: SearchErrorCode,
    message: String,
    source: Option<StorageError>,
}

impl SearchError {
    /// Create an invalid search condition error
    pub fn invalid_condition(reason: impl Into<String>) -> Self {
        Self {
            code: SearchErrorCode::EavInvalidSearchCondition,
            message: reason.into(),
            source: None,
        }
    }

    /// Create an execution failed error from a store failure
    pub fn execution_failed(source: StorageError) -> Self {
        Self {
            code: SearchErrorCode::EavExecutionFailed,
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> SearchErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns whether the caller is at fault
    pub fn is_rejection(&self) -> bool {
        self.severity() == Severity::Reject
    }
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for SearchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<ConditionError> for SearchError {
    fn from(err: ConditionError) -> Self {
        SearchError::invalid_condition(err.to_string())
    }
}

impl From<StorageError> for SearchError {
    fn from(err: StorageError) -> Self {
        SearchError::execution_failed(err)
    }
}

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;
