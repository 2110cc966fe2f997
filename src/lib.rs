//! eavsearch - search conditions over an entity-attribute-value identity store
//!
//! Compiles boolean search conditions over dynamic attributes, memberships,
//! resources, entitlements and direct fields into one scoped, ordered and
//! paginated query, runs it and materializes the matching entities.

pub mod cli;
pub mod compiler;
pub mod condition;
pub mod entity;
pub mod executor;
pub mod observability;
pub mod planner;
pub mod schema;
pub mod storage;
