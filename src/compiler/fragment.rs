//! Structured query fragments
//!
//! A compiled condition is a tree of [`Fragment`]s plus a positional
//! [`Params`] list. Leaves reference parameters through [`Placeholder`]s;
//! no expression value is ever inlined into query text. The tree renders
//! to SQL over the kind's `*_search*` views only at the very end.
//!
//! Placeholders are numbered in the order they appear in the rendered
//! text. Any rewrite of the tree goes through [`CompiledFragment::normalize`],
//! which re-walks the tree and rebuilds the parameter list from scratch.

use std::fmt;

use serde::Serialize;

use crate::condition::RelOp;
use crate::entity::{FieldPath, KindTag, SearchView};
use crate::schema::{AttrValue, ValueColumn};

/// Positional parameter reference, 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Placeholder(pub usize);

impl Placeholder {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.0)
    }
}

/// Ordered parameter list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    values: Vec<AttrValue>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value and returns its placeholder
    pub fn bind(&mut self, value: AttrValue) -> Placeholder {
        self.values.push(value);
        Placeholder(self.values.len())
    }

    pub fn get(&self, placeholder: Placeholder) -> Option<&AttrValue> {
        placeholder
            .index()
            .checked_sub(1)
            .and_then(|i| self.values.get(i))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttrValue> {
        self.values.iter()
    }

    pub fn into_vec(self) -> Vec<AttrValue> {
        self.values
    }

    /// Copies the value behind `placeholder` from `self` into `into`
    fn rebind(&self, placeholder: Placeholder, into: &mut Params) -> Placeholder {
        match self.get(placeholder) {
            Some(value) => into.bind(value.clone()),
            None => placeholder,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullTest {
    IsNull,
    IsNotNull,
}

impl NullTest {
    pub fn flip(self) -> Self {
        match self {
            NullTest::IsNull => NullTest::IsNotNull,
            NullTest::IsNotNull => NullTest::IsNull,
        }
    }
}

/// Predicate applied to one value column or direct field
#[derive(Debug, Clone, PartialEq)]
pub enum ValueTest {
    Null(NullTest),
    Compare {
        op: RelOp,
        value: Placeholder,
    },
    Like {
        pattern: Placeholder,
        case_insensitive: bool,
        negated: bool,
    },
}

/// What a relationship leaf points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipTarget {
    Id(Placeholder),
    Name(Placeholder),
    NamePattern(Placeholder),
}

/// One node of a compiled condition
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// Matches nothing
    Never,
    /// Dynamic attribute test; multi-valued schemas match on any value
    Attribute {
        schema: String,
        column: ValueColumn,
        test: ValueTest,
    },
    /// Direct field test
    Field { path: FieldPath, test: ValueTest },
    /// Entity id [not] in the relationship index
    Relationship {
        target: RelationshipTarget,
        negated: bool,
    },
    /// Entity id [not] in the resource index
    Resource { name: Placeholder, negated: bool },
    /// Entity id [not] in the entitlement index (pattern match)
    Entitlement { pattern: Placeholder, negated: bool },
    And(Box<Fragment>, Box<Fragment>),
    Or(Box<Fragment>, Box<Fragment>),
}

impl Fragment {
    pub fn and(left: Fragment, right: Fragment) -> Self {
        Fragment::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Fragment, right: Fragment) -> Self {
        Fragment::Or(Box::new(left), Box::new(right))
    }

    pub fn is_never(&self) -> bool {
        matches!(self, Fragment::Never)
    }

    /// Folds `Never` through AND / OR
    fn simplify(self) -> Fragment {
        match self {
            Fragment::And(l, r) => match (l.simplify(), r.simplify()) {
                (Fragment::Never, _) | (_, Fragment::Never) => Fragment::Never,
                (l, r) => Fragment::and(l, r),
            },
            Fragment::Or(l, r) => match (l.simplify(), r.simplify()) {
                (Fragment::Never, other) | (other, Fragment::Never) => other,
                (l, r) => Fragment::or(l, r),
            },
            leaf => leaf,
        }
    }

    /// Rebuilds placeholders in render order
    fn renumber(&self, old: &Params, new: &mut Params) -> Fragment {
        let test = |t: &ValueTest, new: &mut Params| match t {
            ValueTest::Null(n) => ValueTest::Null(*n),
            ValueTest::Compare { op, value } => ValueTest::Compare {
                op: *op,
                value: old.rebind(*value, new),
            },
            ValueTest::Like {
                pattern,
                case_insensitive,
                negated,
            } => ValueTest::Like {
                pattern: old.rebind(*pattern, new),
                case_insensitive: *case_insensitive,
                negated: *negated,
            },
        };

        match self {
            Fragment::Never => Fragment::Never,
            Fragment::Attribute {
                schema,
                column,
                test: t,
            } => Fragment::Attribute {
                schema: schema.clone(),
                column: *column,
                test: test(t, new),
            },
            Fragment::Field { path, test: t } => Fragment::Field {
                path: path.clone(),
                test: test(t, new),
            },
            Fragment::Relationship { target, negated } => Fragment::Relationship {
                target: match target {
                    RelationshipTarget::Id(p) => RelationshipTarget::Id(old.rebind(*p, new)),
                    RelationshipTarget::Name(p) => RelationshipTarget::Name(old.rebind(*p, new)),
                    RelationshipTarget::NamePattern(p) => {
                        RelationshipTarget::NamePattern(old.rebind(*p, new))
                    }
                },
                negated: *negated,
            },
            Fragment::Resource { name, negated } => Fragment::Resource {
                name: old.rebind(*name, new),
                negated: *negated,
            },
            Fragment::Entitlement { pattern, negated } => Fragment::Entitlement {
                pattern: old.rebind(*pattern, new),
                negated: *negated,
            },
            Fragment::And(l, r) => {
                let l = l.renumber(old, new);
                let r = r.renumber(old, new);
                Fragment::and(l, r)
            }
            Fragment::Or(l, r) => {
                let l = l.renumber(old, new);
                let r = r.renumber(old, new);
                Fragment::or(l, r)
            }
        }
    }

    /// Renders a subquery selecting matching `subject_id`s
    pub fn render(&self, kind: KindTag, w: &mut SqlWriter) {
        let base = kind.view(SearchView::Base);
        match self {
            Fragment::Never => {
                w.push(&format!("SELECT subject_id FROM {} WHERE 1=2", base));
            }
            Fragment::Attribute {
                schema,
                column,
                test,
            } => {
                let attr = kind.view(SearchView::Attr);
                let schema = quote(schema);
                match test {
                    ValueTest::Null(NullTest::IsNull) => w.push(&format!(
                        "SELECT subject_id FROM {} WHERE subject_id NOT IN \
                         (SELECT subject_id FROM {} WHERE schema_name = {})",
                        base, attr, schema
                    )),
                    ValueTest::Null(NullTest::IsNotNull) => w.push(&format!(
                        "SELECT subject_id FROM {} WHERE schema_name = {}",
                        attr, schema
                    )),
                    test => w.push(&format!(
                        "SELECT subject_id FROM {} WHERE schema_name = {} AND {}",
                        attr,
                        schema,
                        render_test(column.column_name(), test)
                    )),
                }
            }
            Fragment::Field { path, test } => {
                w.push(&format!(
                    "SELECT subject_id FROM {} WHERE {}",
                    base,
                    render_test(&path.column(), test)
                ));
            }
            Fragment::Relationship { target, negated } => {
                let predicate = match target {
                    RelationshipTarget::Id(p) => format!("group_id = {}", p),
                    RelationshipTarget::Name(p) => format!("group_name = {}", p),
                    RelationshipTarget::NamePattern(p) => format!("group_name LIKE {}", p),
                };
                render_index(w, &base, &kind.view(SearchView::Relationship), &predicate, *negated);
            }
            Fragment::Resource { name, negated } => {
                let predicate = format!("resource_name = {}", name);
                render_index(w, &base, &kind.view(SearchView::Resource), &predicate, *negated);
            }
            Fragment::Entitlement { pattern, negated } => {
                let predicate = format!("entitlement LIKE {}", pattern);
                render_index(w, &base, &kind.view(SearchView::Entitlement), &predicate, *negated);
            }
            Fragment::And(l, r) => {
                let alias = w.next_alias();
                w.push("SELECT subject_id FROM (");
                l.render(kind, w);
                w.push(&format!(") {} WHERE subject_id IN (", alias));
                r.render(kind, w);
                w.push(")");
            }
            Fragment::Or(l, r) => {
                w.push("(");
                l.render(kind, w);
                w.push(") UNION (");
                r.render(kind, w);
                w.push(")");
            }
        }
    }
}

fn render_test(column: &str, test: &ValueTest) -> String {
    match test {
        ValueTest::Null(NullTest::IsNull) => format!("{} IS NULL", column),
        ValueTest::Null(NullTest::IsNotNull) => format!("{} IS NOT NULL", column),
        ValueTest::Compare { op, value } => format!("{} {} {}", column, op.as_sql(), value),
        ValueTest::Like {
            pattern,
            case_insensitive,
            negated,
        } => {
            let not = if *negated { "NOT " } else { "" };
            if *case_insensitive {
                format!("LOWER({}) {}LIKE LOWER({})", column, not, pattern)
            } else {
                format!("{} {}LIKE {}", column, not, pattern)
            }
        }
    }
}

fn render_index(w: &mut SqlWriter, base: &str, index: &str, predicate: &str, negated: bool) {
    let not = if negated { "NOT " } else { "" };
    w.push(&format!(
        "SELECT subject_id FROM {} WHERE subject_id {}IN \
         (SELECT subject_id FROM {} WHERE {})",
        base, not, index, predicate
    ));
}

/// SQL string literal for an identifier-like name
pub(crate) fn quote(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}

/// Accumulates rendered SQL and hands out unique subquery aliases
#[derive(Debug, Default)]
pub struct SqlWriter {
    sql: String,
    aliases: usize,
}

impl SqlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, text: &str) {
        self.sql.push_str(text);
    }

    pub fn next_alias(&mut self) -> String {
        self.aliases += 1;
        format!("t{}", self.aliases)
    }

    pub fn finish(self) -> String {
        self.sql
    }
}

/// A compiled condition with its parameters
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFragment {
    pub fragment: Fragment,
    pub params: Params,
}

impl CompiledFragment {
    pub fn new(fragment: Fragment, params: Params) -> Self {
        Self { fragment, params }
    }

    pub fn never() -> Self {
        Self::new(Fragment::Never, Params::new())
    }

    /// Folds always-false branches and renumbers parameters so that
    /// placeholder `?n` is the n-th placeholder of the rendered text
    pub fn normalize(self) -> Self {
        let fragment = self.fragment.simplify();
        let mut params = Params::new();
        let fragment = fragment.renumber(&self.params, &mut params);
        Self { fragment, params }
    }

    pub fn to_sql(&self, kind: KindTag) -> String {
        let mut w = SqlWriter::new();
        self.fragment.render(kind, &mut w);
        w.finish()
    }
}
