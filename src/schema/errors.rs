//! Value coercion errors
//!
//! Raised when an expression string or stored JSON value cannot be
//! coerced into a schema's declared type. The search engine never
//! surfaces these to callers; a failing leaf degrades to match nothing.

use thiserror::Error;

/// Result type for value coercion
pub type ValueResult<T> = Result<T, ValueError>;

/// Coercion failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// Expression does not parse as the expected type
    #[error("'{expression}' is not a valid {expected} value")]
    InvalidLiteral {
        expression: String,
        expected: &'static str,
    },

    /// Expression is not one of the enumerated values
    #[error("'{expression}' is not an allowed value of enum schema '{schema}'")]
    NotEnumerated { expression: String, schema: String },

    /// JSON value has the wrong shape for the schema
    #[error("JSON value {value} cannot be stored in {expected} schema '{schema}'")]
    JsonMismatch {
        value: String,
        expected: &'static str,
        schema: String,
    },
}
