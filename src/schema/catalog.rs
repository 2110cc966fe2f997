//! Schema catalog
//!
//! Resolves an attribute name to its declared schema. An unknown name is
//! not an error at this layer: callers treat `None` as "the condition can
//! never match".

use std::collections::HashMap;

use super::types::AttributeSchema;

/// Read-only schema lookup used by every compiler stage
pub trait SchemaCatalog {
    /// Resolve a schema by name
    fn resolve(&self, name: &str) -> Option<AttributeSchema>;
}

/// In-memory catalog keyed by schema name
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    schemas: HashMap<String, AttributeSchema>,
}

impl MemoryCatalog {
    /// Creates an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`MemoryCatalog::register`]
    pub fn with_schema(mut self, schema: AttributeSchema) -> Self {
        self.register(schema);
        self
    }

    /// Adds or replaces a schema
    pub fn register(&mut self, schema: AttributeSchema) {
        self.schemas.insert(schema.name.clone(), schema);
    }

    /// Borrowing lookup, for callers that do not need an owned schema
    pub fn get(&self, name: &str) -> Option<&AttributeSchema> {
        self.schemas.get(name)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl SchemaCatalog for MemoryCatalog {
    fn resolve(&self, name: &str) -> Option<AttributeSchema> {
        self.schemas.get(name).cloned()
    }
}

impl FromIterator<AttributeSchema> for MemoryCatalog {
    fn from_iter<I: IntoIterator<Item = AttributeSchema>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for schema in iter {
            catalog.register(schema);
        }
        catalog
    }
}
