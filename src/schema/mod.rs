//! Schema catalog subsystem for eavsearch
//!
//! Attributes are stored in an entity-attribute-value layout: each
//! schema declares a value type, and every stored value lands in the
//! column matching that type.
//!
//! # Principles
//!
//! - Schemas are read-only to the search engine
//! - Unknown schema names resolve to `None`, never to an error
//! - Expressions are coerced to the declared type before any query embeds them

mod catalog;
mod errors;
mod types;
mod value;

pub use catalog::{MemoryCatalog, SchemaCatalog};
pub use errors::{ValueError, ValueResult};
pub use types::{AttributeSchema, ValueColumn, ValueType};
pub use value::AttrValue;
