//! Search execution subsystem for eavsearch
//!
//! Drives one public call end to end: validation, compilation, scoping,
//! ordering, execution and materialization.
//!
//! # Execution Flow (strict order)
//!
//! 1. Validate the condition tree
//! 2. Resolve the empty-scope edge case
//! 3. Compile and scope the condition
//! 4. Plan ordering and pagination
//! 5. Execute against the backing store
//! 6. Reload entities, dropping identifiers that vanished
//!
//! # Failure Policy
//!
//! - Malformed conditions are rejected on every operation
//! - `search` degrades store failures to an empty result
//! - `count` and `matches` propagate store failures

mod errors;
mod executor;

pub use errors::{SearchError, SearchErrorCode, SearchResult, Severity};
pub use executor::SearchExecutor;
