//! Attribute schema definitions
//!
//! Supported value types:
//! - Boolean, Long, Double, Date: stored in their own physical column
//! - String, Enum: both stored in the string column
//!
//! Schemas are defined at runtime by administrators and are read-only
//! to the search engine.

use serde::{Deserialize, Serialize};

/// Declared value type of an attribute schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Boolean,
    Long,
    Double,
    Date,
    String,
    Enum,
}

impl ValueType {
    /// Returns the type name for log and error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ValueType::Boolean => "boolean",
            ValueType::Long => "long",
            ValueType::Double => "double",
            ValueType::Date => "date",
            ValueType::String => "string",
            ValueType::Enum => "enum",
        }
    }

    /// Physical column holding values of this type
    pub fn column(&self) -> ValueColumn {
        match self {
            ValueType::Boolean => ValueColumn::Boolean,
            ValueType::Long => ValueColumn::Long,
            ValueType::Double => ValueColumn::Double,
            ValueType::Date => ValueColumn::Date,
            ValueType::String | ValueType::Enum => ValueColumn::String,
        }
    }

    /// LIKE and ILIKE only apply to textual values
    pub fn supports_pattern(&self) -> bool {
        matches!(self, ValueType::String | ValueType::Enum)
    }
}

/// Type-specific column of the attribute value table.
///
/// Exactly one column is populated per stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueColumn {
    Boolean,
    Long,
    Double,
    Date,
    String,
}

impl ValueColumn {
    /// Column name inside the `*_attr` search views
    pub fn column_name(&self) -> &'static str {
        match self {
            ValueColumn::Boolean => "booleanvalue",
            ValueColumn::Long => "longvalue",
            ValueColumn::Double => "doublevalue",
            ValueColumn::Date => "datevalue",
            ValueColumn::String => "stringvalue",
        }
    }
}

/// Administrator-defined attribute schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSchema {
    /// Unique schema name
    pub name: String,
    /// Declared value type
    pub value_type: ValueType,
    /// Values are unique across entities
    #[serde(default)]
    pub unique: bool,
    /// An entity may hold more than one value
    #[serde(default)]
    pub multivalue: bool,
    /// Allowed values for enum schemas (empty means unrestricted)
    #[serde(default)]
    pub enum_values: Vec<String>,
    /// chrono format string used to parse date expressions
    #[serde(default)]
    pub conversion_pattern: Option<String>,
}

impl AttributeSchema {
    /// Creates a single-valued, non-unique schema
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            unique: false,
            multivalue: false,
            enum_values: Vec::new(),
            conversion_pattern: None,
        }
    }

    /// Marks the schema as carrying a uniqueness constraint
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Allows more than one value per entity
    pub fn multivalue(mut self) -> Self {
        self.multivalue = true;
        self
    }

    /// Restricts an enum schema to the given values
    pub fn with_enum_values(mut self, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.enum_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the date conversion pattern
    pub fn with_conversion_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.conversion_pattern = Some(pattern.into());
        self
    }

    /// Uniqueness is relaxed for multi-valued schemas.
    pub fn is_effectively_unique(&self) -> bool {
        self.unique && !self.multivalue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_and_enum_share_column() {
        assert_eq!(ValueType::String.column(), ValueColumn::String);
        assert_eq!(ValueType::Enum.column(), ValueColumn::String);
        assert_eq!(ValueType::Long.column().column_name(), "longvalue");
    }

    #[test]
    fn test_pattern_support() {
        assert!(ValueType::String.supports_pattern());
        assert!(ValueType::Enum.supports_pattern());
        assert!(!ValueType::Long.supports_pattern());
        assert!(!ValueType::Date.supports_pattern());
    }

    #[test]
    fn test_multivalue_relaxes_uniqueness() {
        let schema = AttributeSchema::new("email", ValueType::String).unique();
        assert!(schema.is_effectively_unique());

        let schema = schema.multivalue();
        assert!(!schema.is_effectively_unique());
    }

    #[test]
    fn test_schema_deserialize_defaults() {
        let schema: AttributeSchema =
            serde_json::from_str(r#"{"name": "age", "value_type": "Long"}"#).unwrap();
        assert_eq!(schema, AttributeSchema::new("age", ValueType::Long));
    }
}
