//! Storage subsystem for eavsearch
//!
//! The backing store boundary plus an in-memory EAV store that evaluates
//! assembled queries with the same semantics as their SQL rendering.
//!
//! # Design Principles
//!
//! - Read-only: searches never mutate the store
//! - Structured: the store receives the query tree, never parsed SQL
//! - Strict loading: a dataset with dangling references is rejected whole

mod dataset;
mod errors;
mod eval;
mod like;
mod memory;
mod store;

pub use dataset::{Dataset, GroupRecord, LoadedDataset, PrincipalRecord};
pub use errors::{StorageError, StorageResult};
pub use like::like_regex;
pub use memory::{EntityTable, MemoryKind, MemoryStore};
pub use store::SearchStore;
