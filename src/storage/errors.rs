//! Backing store errors

use std::io;

use thiserror::Error;

use crate::schema::ValueError;

/// Result type for store operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Store and dataset failures
#[derive(Debug, Error)]
pub enum StorageError {
    /// Store cannot serve the request
    #[error("backing store unavailable: {0}")]
    Unavailable(String),

    /// Query references a placeholder with no bound value
    #[error("placeholder ?{0} has no bound parameter")]
    UnboundParameter(usize),

    /// Bound parameter has the wrong type for its use
    #[error("parameter ?{index} must be {expected}")]
    ParameterType {
        index: usize,
        expected: &'static str,
    },

    /// LIKE pattern could not be compiled
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Dataset file could not be read
    #[error("cannot read dataset: {0}")]
    Io(#[from] io::Error),

    /// Dataset file is not valid JSON for the dataset layout
    #[error("cannot parse dataset: {0}")]
    Parse(#[from] serde_json::Error),

    /// Dataset refers to something it does not define
    #[error("dataset {entity} refers to unknown {what} '{name}'")]
    DanglingReference {
        entity: String,
        what: &'static str,
        name: String,
    },

    /// Stored attribute value does not fit its schema
    #[error("dataset {entity} has an invalid value for '{schema}': {source}")]
    InvalidValue {
        entity: String,
        schema: String,
        #[source]
        source: ValueError,
    },
}
