//! Leaf translators
//!
//! Turns one leaf condition into a [`Fragment`], binding its values into
//! the parameter list threaded through the compiler. Rules shared by all
//! leaf kinds:
//!
//! - ISNULL / ISNOTNULL swap under negation and bind nothing
//! - relational operators negate through their De Morgan counterpart
//! - LIKE / ILIKE apply to textual values only
//! - expressions are coerced to the declared type before binding
//!
//! Data problems (unknown schema or field, bad literal, LIKE on a number)
//! compile to [`Fragment::Never`] with a warning. Only structural defects
//! raise.

use std::marker::PhantomData;

use crate::condition::{
    AttributeCond, CompareOp, DirectFieldCond, EntitlementCond, LeafCond, RelationshipCond,
    ResourceCond,
};
use crate::entity::{EntityKind, FieldLookup, ResolvedField};
use crate::executor::{SearchError, SearchResult};
use crate::observability::SearchEvent;
use crate::schema::{AttrValue, AttributeSchema, SchemaCatalog, ValueType};

use super::context::SearchContext;
use super::fragment::{Fragment, NullTest, Params, RelationshipTarget, ValueTest};

/// Wildcard marking a relationship name as a pattern
const NAME_WILDCARD: char = '%';

/// Translates leaves of one entity kind against its schema catalog
pub struct LeafTranslator<'a, K, C> {
    catalog: &'a C,
    _kind: PhantomData<K>,
}

impl<'a, K: EntityKind, C: SchemaCatalog> LeafTranslator<'a, K, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self {
            catalog,
            _kind: PhantomData,
        }
    }

    /// Translates `leaf`, returning its fragment and the extended parameters
    pub fn translate(
        &self,
        leaf: &LeafCond,
        negated: bool,
        params: Params,
        ctx: &SearchContext,
    ) -> SearchResult<(Fragment, Params)> {
        match leaf {
            LeafCond::Attribute(cond) => self.attribute(cond, negated, params, ctx),
            LeafCond::DirectField(cond) => self.direct_field(cond, negated, params, ctx),
            LeafCond::Relationship(cond) => relationship(cond, negated, params),
            LeafCond::Resource(cond) => Ok(resource(cond, negated, params)),
            LeafCond::Entitlement(cond) => Ok(entitlement(cond, negated, params)),
        }
    }

    fn attribute(
        &self,
        cond: &AttributeCond,
        negated: bool,
        params: Params,
        ctx: &SearchContext,
    ) -> SearchResult<(Fragment, Params)> {
        let Some(schema) = self.catalog.resolve(&cond.schema) else {
            ctx.log(SearchEvent::UnknownSchema, &[("schema", cond.schema.as_str())]);
            return Ok((Fragment::Never, params));
        };

        let outcome = value_test(
            &schema,
            cond.op,
            cond.expression.as_deref(),
            negated,
            false,
            params,
            ctx,
        )?;
        Ok(outcome.into_fragment(|test| Fragment::Attribute {
            schema: schema.name.clone(),
            column: schema.value_type.column(),
            test,
        }))
    }

    fn direct_field(
        &self,
        cond: &DirectFieldCond,
        negated: bool,
        params: Params,
        ctx: &SearchContext,
    ) -> SearchResult<(Fragment, Params)> {
        let field = match K::fields().resolve(&cond.field, cond.expression.as_deref()) {
            FieldLookup::Found(field) => field,
            FieldLookup::Unknown => {
                ctx.log(SearchEvent::UnknownField, &[("field", cond.field.as_str())]);
                return Ok((Fragment::Never, params));
            }
            FieldLookup::InvalidSubField { field, sub } => {
                return Err(SearchError::invalid_condition(format!(
                    "'{}' has no sub-field '{}'; only id and name are supported",
                    field, sub
                )));
            }
        };

        let outcome = value_test(
            &field_schema(&field),
            cond.op,
            cond.expression.as_deref(),
            negated,
            field.flag,
            params,
            ctx,
        )?;
        Ok(outcome.into_fragment(|test| Fragment::Field {
            path: field.path.clone(),
            test,
        }))
    }
}

/// Result of translating an operator and expression against a type
enum TestOutcome {
    Test(ValueTest, Params),
    /// Leaf matches nothing; parameters come back unchanged
    Degraded(Params),
}

impl TestOutcome {
    fn into_fragment(self, build: impl FnOnce(ValueTest) -> Fragment) -> (Fragment, Params) {
        match self {
            TestOutcome::Test(test, params) => (build(test), params),
            TestOutcome::Degraded(params) => (Fragment::Never, params),
        }
    }
}

fn value_test(
    schema: &AttributeSchema,
    op: CompareOp,
    expression: Option<&str>,
    negated: bool,
    flag: bool,
    params: Params,
    ctx: &SearchContext,
) -> SearchResult<TestOutcome> {
    let mut params = params;

    if !op.needs_expression() {
        let null = if op == CompareOp::IsNull {
            NullTest::IsNull
        } else {
            NullTest::IsNotNull
        };
        let null = if negated { null.flip() } else { null };
        return Ok(TestOutcome::Test(ValueTest::Null(null), params));
    }

    let Some(expression) = expression else {
        return Err(SearchError::invalid_condition(format!(
            "operator {} on '{}' requires an expression",
            op, schema.name
        )));
    };

    if op.is_pattern() {
        if !schema.value_type.supports_pattern() {
            ctx.log(
                SearchEvent::PatternTypeMismatch,
                &[
                    ("op", op.as_str()),
                    ("schema", schema.name.as_str()),
                    ("type", schema.value_type.type_name()),
                ],
            );
            return Ok(TestOutcome::Degraded(params));
        }
        let pattern = params.bind(AttrValue::String(expression.to_string()));
        let test = ValueTest::Like {
            pattern,
            case_insensitive: op == CompareOp::Ilike,
            negated,
        };
        return Ok(TestOutcome::Test(test, params));
    }

    let Some(rel) = op.relational() else {
        return Err(SearchError::invalid_condition(format!(
            "operator {} is not supported on '{}'",
            op, schema.name
        )));
    };

    let coerced = if flag {
        coerce_flag(expression)
    } else {
        expression.to_string()
    };
    let value = match AttrValue::parse_expression(schema, &coerced) {
        Ok(value) => value,
        Err(err) => {
            let reason = err.to_string();
            ctx.log(
                SearchEvent::InvalidExpression,
                &[
                    ("expression", expression),
                    ("reason", reason.as_str()),
                    ("schema", schema.name.as_str()),
                ],
            );
            return Ok(TestOutcome::Degraded(params));
        }
    };

    let op = if negated { rel.negate() } else { rel };
    let value = params.bind(value);
    Ok(TestOutcome::Test(ValueTest::Compare { op, value }, params))
}

/// Integer fields bounded to [0,1] accept "true" / "false"
fn coerce_flag(expression: &str) -> String {
    let trimmed = expression.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        "1".to_string()
    } else if trimmed.eq_ignore_ascii_case("false") {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Synthetic schema used to coerce expressions against a direct field
fn field_schema(field: &ResolvedField) -> AttributeSchema {
    let value_type = if field.flag {
        ValueType::Long
    } else {
        field.value_type
    };
    AttributeSchema::new(field.path.column(), value_type)
}

fn relationship(
    cond: &RelationshipCond,
    negated: bool,
    params: Params,
) -> SearchResult<(Fragment, Params)> {
    let mut params = params;
    let target = match (&cond.group_id, &cond.group_name) {
        (Some(id), None) => RelationshipTarget::Id(params.bind(AttrValue::Long(*id as i64))),
        (None, Some(name)) if name.contains(NAME_WILDCARD) => {
            RelationshipTarget::NamePattern(params.bind(AttrValue::String(name.clone())))
        }
        (None, Some(name)) => RelationshipTarget::Name(params.bind(AttrValue::String(name.clone()))),
        _ => {
            return Err(SearchError::invalid_condition(
                "relationship condition needs exactly one of group id and group name",
            ))
        }
    };
    Ok((Fragment::Relationship { target, negated }, params))
}

fn resource(cond: &ResourceCond, negated: bool, params: Params) -> (Fragment, Params) {
    let mut params = params;
    let name = params.bind(AttrValue::String(cond.resource.clone()));
    (Fragment::Resource { name, negated }, params)
}

fn entitlement(cond: &EntitlementCond, negated: bool, params: Params) -> (Fragment, Params) {
    let mut params = params;
    let pattern = params.bind(AttrValue::String(cond.pattern.clone()));
    (Fragment::Entitlement { pattern, negated }, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Placeholder;
    use crate::condition::RelOp;
    use crate::entity::{KindTag, Principals};
    use crate::observability::Logger;
    use crate::schema::{MemoryCatalog, ValueColumn};

    fn catalog() -> MemoryCatalog {
        MemoryCatalog::new()
            .with_schema(AttributeSchema::new("age", ValueType::Long))
            .with_schema(AttributeSchema::new("email", ValueType::String))
    }

    fn translate(leaf: LeafCond, negated: bool) -> (Fragment, Params, Vec<String>) {
        let catalog = catalog();
        let translator = LeafTranslator::<Principals, _>::new(&catalog);
        let ctx = SearchContext::new(KindTag::Principal);
        let (result, logs) =
            Logger::capture(|| translator.translate(&leaf, negated, Params::new(), &ctx));
        let (fragment, params) = result.unwrap();
        (fragment, params, logs)
    }

    #[test]
    fn test_negated_relational_uses_de_morgan() {
        let (fragment, params, _) = translate(
            AttributeCond::new("age", CompareOp::Ge, "30").into(),
            true,
        );
        assert_eq!(
            fragment,
            Fragment::Attribute {
                schema: "age".into(),
                column: ValueColumn::Long,
                test: ValueTest::Compare {
                    op: RelOp::Lt,
                    value: Placeholder(1),
                },
            }
        );
        assert_eq!(params.into_vec(), vec![AttrValue::Long(30)]);
    }

    #[test]
    fn test_negated_is_null_flips_without_binding() {
        let (fragment, params, _) = translate(AttributeCond::is_null("email").into(), true);
        assert!(matches!(
            fragment,
            Fragment::Attribute {
                test: ValueTest::Null(NullTest::IsNotNull),
                ..
            }
        ));
        assert!(params.is_empty());
    }

    #[test]
    fn test_unknown_schema_degrades_with_warning() {
        let (fragment, params, logs) = translate(AttributeCond::eq("bogus", "x").into(), false);
        assert!(fragment.is_never());
        assert!(params.is_empty());
        assert_eq!(logs.len(), 1);
        assert!(logs[0].contains("SEARCH_UNKNOWN_SCHEMA"));
        assert!(logs[0].contains("\"search_id\""));
    }

    #[test]
    fn test_like_on_number_degrades() {
        let (fragment, params, logs) = translate(AttributeCond::like("age", "3%").into(), false);
        assert!(fragment.is_never());
        assert!(params.is_empty());
        assert!(logs[0].contains("SEARCH_PATTERN_TYPE_MISMATCH"));
    }

    #[test]
    fn test_bad_literal_degrades() {
        let (fragment, _, logs) = translate(AttributeCond::eq("age", "thirty").into(), false);
        assert!(fragment.is_never());
        assert!(logs[0].contains("SEARCH_INVALID_EXPRESSION"));
    }

    #[test]
    fn test_flag_field_accepts_true() {
        let (fragment, params, _) = translate(DirectFieldCond::eq("suspended", "true").into(), false);
        assert!(matches!(fragment, Fragment::Field { .. }));
        assert_eq!(params.into_vec(), vec![AttrValue::Long(1)]);
    }

    #[test]
    fn test_reference_field_by_name() {
        let (fragment, params, _) = translate(DirectFieldCond::eq("manager", "bob").into(), false);
        let Fragment::Field { path, .. } = fragment else {
            panic!("expected a field fragment");
        };
        assert_eq!(path.column(), "manager_name");
        assert_eq!(params.into_vec(), vec![AttrValue::String("bob".into())]);
    }

    #[test]
    fn test_invalid_sub_field_raises() {
        let catalog = catalog();
        let translator = LeafTranslator::<Principals, _>::new(&catalog);
        let ctx = SearchContext::new(KindTag::Principal);
        let leaf: LeafCond = DirectFieldCond::eq("manager.email", "x").into();

        let err = translator
            .translate(&leaf, false, Params::new(), &ctx)
            .unwrap_err();
        assert!(err.is_rejection());
    }

    #[test]
    fn test_relationship_name_pattern() {
        let (fragment, _, _) = translate(RelationshipCond::by_name("ops%").into(), true);
        assert!(matches!(
            fragment,
            Fragment::Relationship {
                target: RelationshipTarget::NamePattern(_),
                negated: true
            }
        ));
    }
}
