//! Direct-field registry
//!
//! Each entity kind declares a static table mapping field names to typed
//! accessors. Conditions and order-by clauses on direct fields resolve
//! through this table; there is no runtime reflection.
//!
//! Three accessor shapes exist:
//! - `Scalar`: a plain typed column
//! - `Flag`: an integer column bounded to [0,1], compared as a Long
//! - `Reference`: a link to another entity, addressable through the
//!   synthetic `id` and `name` sub-fields only

use crate::schema::{AttrValue, ValueType};

use super::EntityRef;

/// Alias accepted for the identifier field
const KEY_ALIAS: &str = "key";

/// Synthetic sub-field of a reference field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RefPart {
    Id,
    Name,
}

impl RefPart {
    /// Parses a sub-field name; only `id` and `name` exist
    pub fn parse(sub: &str) -> Option<Self> {
        match sub {
            "id" => Some(RefPart::Id),
            "name" => Some(RefPart::Name),
            _ => None,
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            RefPart::Id => "id",
            RefPart::Name => "name",
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            RefPart::Id => ValueType::Long,
            RefPart::Name => ValueType::String,
        }
    }
}

/// Typed accessor for one direct field
pub enum FieldAccessor<E: 'static> {
    Scalar {
        value_type: ValueType,
        read: fn(&E) -> Option<AttrValue>,
    },
    Flag {
        read: fn(&E) -> Option<i64>,
    },
    Reference {
        read: fn(&E) -> Option<&EntityRef>,
    },
}

/// One entry of a kind's field table
pub struct FieldDef<E: 'static> {
    pub name: &'static str,
    pub accessor: FieldAccessor<E>,
    /// Sensitive fields never take part in ordering
    pub sortable: bool,
}

/// Canonical address of a direct field (plus sub-field for references)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    pub name: String,
    pub part: Option<RefPart>,
}

impl FieldPath {
    pub fn new(name: impl Into<String>, part: Option<RefPart>) -> Self {
        Self {
            name: name.into(),
            part,
        }
    }

    /// Column name in the kind's base search view
    pub fn column(&self) -> String {
        match self.part {
            Some(part) => format!("{}_{}", self.name, part.suffix()),
            None => self.name.clone(),
        }
    }
}

/// A field path resolved against the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedField {
    pub path: FieldPath,
    pub value_type: ValueType,
    /// Integer column logically holding a boolean
    pub flag: bool,
    pub sortable: bool,
}

/// Outcome of a registry lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldLookup {
    Found(ResolvedField),
    /// No such field: callers degrade the clause to match nothing
    Unknown,
    /// A sub-field other than `id`/`name`, or a sub-field of a non-reference
    InvalidSubField { field: String, sub: String },
}

/// Static field table of one entity kind
pub struct FieldRegistry<E: 'static> {
    fields: &'static [FieldDef<E>],
}

impl<E: 'static> FieldRegistry<E> {
    pub const fn new(fields: &'static [FieldDef<E>]) -> Self {
        Self { fields }
    }

    /// Looks up a field by name (`key` is an alias for `id`)
    pub fn get(&self, name: &str) -> Option<&FieldDef<E>> {
        let name = if name == KEY_ALIAS { "id" } else { name };
        self.fields.iter().find(|f| f.name == name)
    }

    /// Iterates declared field names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    /// Resolves a field name as written in a condition or order clause.
    ///
    /// `hint` is the condition expression, if any. A bare reference field
    /// targets its `id` sub-field when the hint is an integer (or absent)
    /// and its `name` sub-field otherwise.
    pub fn resolve(&self, name: &str, hint: Option<&str>) -> FieldLookup {
        if let Some((base, sub)) = name.split_once('.') {
            let Some(def) = self.get(base) else {
                return FieldLookup::Unknown;
            };
            return match (&def.accessor, RefPart::parse(sub)) {
                (FieldAccessor::Reference { .. }, Some(part)) => {
                    FieldLookup::Found(reference_field(def, part))
                }
                _ => FieldLookup::InvalidSubField {
                    field: base.to_string(),
                    sub: sub.to_string(),
                },
            };
        }

        if let Some(def) = self.get(name) {
            let resolved = match &def.accessor {
                FieldAccessor::Scalar { value_type, .. } => ResolvedField {
                    path: FieldPath::new(def.name, None),
                    value_type: *value_type,
                    flag: false,
                    sortable: def.sortable,
                },
                FieldAccessor::Flag { .. } => ResolvedField {
                    path: FieldPath::new(def.name, None),
                    value_type: ValueType::Long,
                    flag: true,
                    sortable: def.sortable,
                },
                FieldAccessor::Reference { .. } => {
                    let part = match hint {
                        Some(h) if h.trim().parse::<i64>().is_err() => RefPart::Name,
                        _ => RefPart::Id,
                    };
                    reference_field(def, part)
                }
            };
            return FieldLookup::Found(resolved);
        }

        // Column-style synthetic names: manager_id, parent_name
        for part in [RefPart::Id, RefPart::Name] {
            let suffix = format!("_{}", part.suffix());
            if let Some(base) = name.strip_suffix(suffix.as_str()) {
                if let Some(def) = self.get(base) {
                    if matches!(def.accessor, FieldAccessor::Reference { .. }) {
                        return FieldLookup::Found(reference_field(def, part));
                    }
                }
            }
        }

        FieldLookup::Unknown
    }

    /// Reads the value addressed by a resolved path
    pub fn read(&self, entity: &E, path: &FieldPath) -> Option<AttrValue> {
        let def = self.get(&path.name)?;
        match &def.accessor {
            FieldAccessor::Scalar { read, .. } => read(entity),
            FieldAccessor::Flag { read } => read(entity).map(AttrValue::Long),
            FieldAccessor::Reference { read } => {
                read(entity).map(|target| match path.part.unwrap_or(RefPart::Id) {
                    RefPart::Id => AttrValue::Long(target.id as i64),
                    RefPart::Name => AttrValue::String(target.name.clone()),
                })
            }
        }
    }
}

fn reference_field<E>(def: &FieldDef<E>, part: RefPart) -> ResolvedField {
    ResolvedField {
        path: FieldPath::new(def.name, Some(part)),
        value_type: part.value_type(),
        flag: false,
        sortable: def.sortable,
    }
}
