//! Search Scenario Tests
//!
//! End-to-end searches over the in-memory store:
//! - Set semantics of AND / OR / negated leaves
//! - Degrade-to-false for unknown schemas and bad literals
//! - Administrative scope filtering and the empty-scope edge case
//! - Pagination and ordering
//! - Stale identifiers and store failures

use std::collections::BTreeSet;

use eavsearch::compiler::AdministrativeScope;
use eavsearch::condition::{
    AttributeCond, CompareOp, DirectFieldCond, EntitlementCond, RelationshipCond, ResourceCond,
    SearchCondition,
};
use eavsearch::entity::{EntityId, Group, Groups, Principal, Principals};
use eavsearch::executor::{SearchErrorCode, SearchExecutor};
use eavsearch::observability::Logger;
use eavsearch::planner::{OrderByClause, SearchQuery};
use eavsearch::schema::{AttrValue, AttributeSchema, MemoryCatalog, ValueType};
use eavsearch::storage::{MemoryStore, SearchStore, StorageError, StorageResult};

// =============================================================================
// Helper Functions
// =============================================================================

/// Principals A(1), B(2), C(3), D(4):
/// - age: A=30, B=40, C=30, D unset
/// - name: Alice, Bob, Carl, Dora
/// - groups: A in staff(1), B in ops(2), C in staff and ops, D in none
fn setup() -> (MemoryStore, MemoryCatalog) {
    let mut store = MemoryStore::new();
    store.insert_group(Group::new(1, "staff"));
    store.insert_group(Group::new(2, "ops"));
    store.add_entitlement(2, "USER_DELETE");
    store.add_entitlement(1, "USER_READ");

    let people: [(EntityId, &str, Option<i64>); 4] = [
        (1, "Alice", Some(30)),
        (2, "Bob", Some(40)),
        (3, "Carl", Some(30)),
        (4, "Dora", None),
    ];
    for (id, name, age) in people {
        store.insert_principal(Principal::new(id, name.to_lowercase()));
        store.add_principal_attr(id, "name", AttrValue::String(name.to_string()));
        if let Some(age) = age {
            store.add_principal_attr(id, "age", AttrValue::Long(age));
        }
    }
    store.add_membership(1, 1);
    store.add_membership(2, 2);
    store.add_membership(3, 1);
    store.add_membership(3, 2);
    store.add_principal_resource(2, "ldap");

    let catalog = MemoryCatalog::new()
        .with_schema(AttributeSchema::new("age", ValueType::Long))
        .with_schema(AttributeSchema::new("name", ValueType::String));
    (store, catalog)
}

fn all() -> AdministrativeScope {
    AdministrativeScope::unrestricted()
}

fn ids(principals: &[Principal]) -> Vec<EntityId> {
    principals.iter().map(|p| p.id).collect()
}

fn search_ids(
    store: &MemoryStore,
    catalog: &MemoryCatalog,
    scope: &AdministrativeScope,
    cond: &SearchCondition,
) -> Vec<EntityId> {
    let exec = SearchExecutor::<Principals, _, _>::new(store, catalog);
    let (found, _) = Logger::capture(|| exec.search_all(scope, cond));
    ids(&found.unwrap())
}

/// Adds a multivalued `tags` schema: A=[Admin, x], B=[y], C=[ops, ADMIN-backup]
fn setup_with_tags() -> (MemoryStore, MemoryCatalog) {
    let (mut store, catalog) = setup();
    let tags: [(EntityId, &[&str]); 3] = [
        (1, &["Admin", "x"]),
        (2, &["y"]),
        (3, &["ops", "ADMIN-backup"]),
    ];
    for (id, values) in tags {
        for value in values {
            store.add_principal_attr(id, "tags", AttrValue::String(value.to_string()));
        }
    }
    let catalog =
        catalog.with_schema(AttributeSchema::new("tags", ValueType::String).multivalue());
    (store, catalog)
}

fn age_eq(age: &str) -> SearchCondition {
    SearchCondition::leaf(AttributeCond::eq("age", age))
}

// =============================================================================
// Condition Semantics
// =============================================================================

#[test]
fn test_eq_and_negated_eq() {
    let (store, catalog) = setup();

    assert_eq!(search_ids(&store, &catalog, &all(), &age_eq("30")), vec![1, 3]);

    // D has no age and matches neither the leaf nor its negation
    let not_thirty = SearchCondition::not_leaf(AttributeCond::eq("age", "30"));
    assert_eq!(search_ids(&store, &catalog, &all(), &not_thirty), vec![2]);
}

#[test]
fn test_and_with_like() {
    let (store, catalog) = setup();
    let cond = SearchCondition::and(age_eq("30"), SearchCondition::leaf(AttributeCond::like("name", "A%")));
    assert_eq!(search_ids(&store, &catalog, &all(), &cond), vec![1]);
}

#[test]
fn test_and_or_are_intersection_and_union() {
    let (store, catalog) = setup();
    let a = age_eq("30");
    let b = SearchCondition::leaf(RelationshipCond::by_id(2));

    let left: BTreeSet<_> = search_ids(&store, &catalog, &all(), &a).into_iter().collect();
    let right: BTreeSet<_> = search_ids(&store, &catalog, &all(), &b).into_iter().collect();

    let and = search_ids(&store, &catalog, &all(), &SearchCondition::and(a.clone(), b.clone()));
    let or = search_ids(&store, &catalog, &all(), &SearchCondition::or(a, b));

    assert_eq!(and, left.intersection(&right).copied().collect::<Vec<_>>());
    assert_eq!(or, left.union(&right).copied().collect::<Vec<_>>());
}

#[test]
fn test_null_checks_flip_under_negation() {
    let (store, catalog) = setup();
    let is_null = SearchCondition::leaf(AttributeCond::is_null("age"));
    let not_is_null = SearchCondition::not_leaf(AttributeCond::is_null("age"));

    assert_eq!(search_ids(&store, &catalog, &all(), &is_null), vec![4]);
    assert_eq!(search_ids(&store, &catalog, &all(), &not_is_null), vec![1, 2, 3]);
}

#[test]
fn test_negated_membership_is_complement() {
    let (store, catalog) = setup();
    let cond = SearchCondition::not_leaf(RelationshipCond::by_name("ops"));
    assert_eq!(search_ids(&store, &catalog, &all(), &cond), vec![1, 4]);
}

#[test]
fn test_ilike_folds_case() {
    let (store, catalog) = setup();
    let like = SearchCondition::leaf(AttributeCond::like("name", "a%"));
    let ilike = SearchCondition::leaf(AttributeCond::new("name", CompareOp::Ilike, "a%"));

    assert!(search_ids(&store, &catalog, &all(), &like).is_empty());
    assert_eq!(search_ids(&store, &catalog, &all(), &ilike), vec![1]);
}

#[test]
fn test_negated_ilike() {
    let (store, catalog) = setup();
    let cond = SearchCondition::not_leaf(AttributeCond::new("name", CompareOp::Ilike, "A%"));
    assert_eq!(search_ids(&store, &catalog, &all(), &cond), vec![2, 3, 4]);
}

#[test]
fn test_multivalued_attribute_matches_any_value() {
    let (store, catalog) = setup_with_tags();

    let ilike = SearchCondition::leaf(AttributeCond::new("tags", CompareOp::Ilike, "adm%"));
    assert_eq!(search_ids(&store, &catalog, &all(), &ilike), vec![1, 3]);

    // case-sensitive LIKE misses both spellings
    let like = SearchCondition::leaf(AttributeCond::like("tags", "adm%"));
    assert!(search_ids(&store, &catalog, &all(), &like).is_empty());

    // hit on the second value only
    let eq = SearchCondition::leaf(AttributeCond::eq("tags", "ADMIN-backup"));
    assert_eq!(search_ids(&store, &catalog, &all(), &eq), vec![3]);

    let like_second = SearchCondition::leaf(AttributeCond::like("tags", "%backup"));
    assert_eq!(search_ids(&store, &catalog, &all(), &like_second), vec![3]);

    let exec = SearchExecutor::<Principals, _, _>::new(&store, &catalog);
    let (count, _) = Logger::capture(|| exec.count(&all(), &ilike));
    assert_eq!(count.unwrap(), 2);
}

#[test]
fn test_relationship_name_pattern() {
    let (store, catalog) = setup();
    let cond = SearchCondition::leaf(RelationshipCond::by_name("st%"));
    assert_eq!(search_ids(&store, &catalog, &all(), &cond), vec![1, 3]);
}

#[test]
fn test_resource_and_entitlement() {
    let (store, catalog) = setup();
    let ldap = SearchCondition::leaf(ResourceCond::new("ldap"));
    assert_eq!(search_ids(&store, &catalog, &all(), &ldap), vec![2]);

    let delete = SearchCondition::leaf(EntitlementCond::new("USER_DEL%"));
    assert_eq!(search_ids(&store, &catalog, &all(), &delete), vec![2, 3]);
}

#[test]
fn test_direct_field_condition() {
    let (store, catalog) = setup();
    let cond = SearchCondition::leaf(DirectFieldCond::new("username", CompareOp::Like, "%a%"));
    // alice, carl, dora
    assert_eq!(search_ids(&store, &catalog, &all(), &cond), vec![1, 3, 4]);

    let by_key = SearchCondition::leaf(DirectFieldCond::eq("key", "3"));
    assert_eq!(search_ids(&store, &catalog, &all(), &by_key), vec![3]);
}

// =============================================================================
// Degrade-to-false
// =============================================================================

#[test]
fn test_unknown_schema_matches_nothing_and_warns() {
    let (store, catalog) = setup();
    let exec = SearchExecutor::<Principals, _, _>::new(&store, &catalog);
    let cond = SearchCondition::leaf(AttributeCond::eq("bogus", "x"));

    let (found, lines) = Logger::capture(|| exec.search_all(&all(), &cond));
    assert!(found.unwrap().is_empty());
    assert!(lines
        .iter()
        .any(|l| l.contains("SEARCH_UNKNOWN_SCHEMA") && l.contains("\"severity\":\"WARN\"")));
}

#[test]
fn test_bad_literal_degrades_one_branch_only() {
    let (store, catalog) = setup();
    let cond = SearchCondition::or(age_eq("thirty"), age_eq("40"));
    assert_eq!(search_ids(&store, &catalog, &all(), &cond), vec![2]);
}

#[test]
fn test_like_on_numeric_schema_matches_nothing() {
    let (store, catalog) = setup();
    let cond = SearchCondition::leaf(AttributeCond::like("age", "3%"));
    assert!(search_ids(&store, &catalog, &all(), &cond).is_empty());
}

// =============================================================================
// Administrative Scope
// =============================================================================

#[test]
fn test_empty_scope_with_groups_returns_nothing() {
    let (store, catalog) = setup();
    let exec = SearchExecutor::<Principals, _, _>::new(&store, &catalog);
    let empty = AdministrativeScope::restricted([]);
    let cond = SearchCondition::leaf(AttributeCond::is_not_null("name"));

    let (found, lines) = Logger::capture(|| exec.search_all(&empty, &cond));
    assert!(found.unwrap().is_empty());
    assert!(lines.iter().any(|l| l.contains("SEARCH_EMPTY_SCOPE")));

    let (count, _) = Logger::capture(|| exec.count(&empty, &cond));
    assert_eq!(count.unwrap(), 0);
}

#[test]
fn test_empty_scope_without_groups_sees_everything() {
    let mut store = MemoryStore::new();
    store.insert_principal(Principal::new(1, "solo"));
    let catalog = MemoryCatalog::new();
    let cond = SearchCondition::leaf(DirectFieldCond::is_null("status"));

    let found = search_ids(&store, &catalog, &AdministrativeScope::restricted([]), &cond);
    assert_eq!(found, vec![1]);
}

#[test]
fn test_principal_scope_needs_one_relationship_in_scope() {
    let (store, catalog) = setup();
    let cond = SearchCondition::leaf(AttributeCond::is_not_null("name"));

    // B only belongs to ops; D belongs to nothing and stays visible
    let staff = AdministrativeScope::restricted([1]);
    assert_eq!(search_ids(&store, &catalog, &staff, &cond), vec![1, 3, 4]);
}

#[test]
fn test_scope_monotonicity() {
    let (store, catalog) = setup();
    let cond = SearchCondition::leaf(AttributeCond::is_not_null("name"));

    let small: BTreeSet<_> =
        search_ids(&store, &catalog, &AdministrativeScope::restricted([2]), &cond)
            .into_iter()
            .collect();
    let large: BTreeSet<_> =
        search_ids(&store, &catalog, &AdministrativeScope::restricted([1, 2]), &cond)
            .into_iter()
            .collect();
    assert!(small.is_subset(&large));
}

#[test]
fn test_group_scope_is_direct_containment() {
    let (store, _) = setup();
    let catalog = MemoryCatalog::new();
    let exec = SearchExecutor::<Groups, _, _>::new(&store, &catalog);
    let cond = SearchCondition::leaf(DirectFieldCond::is_null("parent"));

    let (found, _) = Logger::capture(|| exec.search_all(&AdministrativeScope::restricted([2]), &cond));
    let names: Vec<_> = found.unwrap().into_iter().map(|g| g.name).collect();
    assert_eq!(names, vec!["ops"]);
}

// =============================================================================
// Pagination and Ordering
// =============================================================================

#[test]
fn test_pages_partition_unbounded_result() {
    let (store, catalog) = setup();
    let exec = SearchExecutor::<Principals, _, _>::new(&store, &catalog);
    let cond = SearchCondition::leaf(AttributeCond::is_not_null("name"));
    let order = [OrderByClause::desc("name")];

    let (full, _) = Logger::capture(|| exec.search(&all(), &cond, -1, -1, &order));
    let full = ids(&full.unwrap());
    assert_eq!(full, vec![4, 3, 2, 1]);

    let mut paged = Vec::new();
    for page in 1..=3 {
        let (chunk, _) = Logger::capture(|| exec.search(&all(), &cond, page, 3, &order));
        paged.extend(ids(&chunk.unwrap()));
    }
    assert_eq!(paged, full);
}

#[test]
fn test_page_zero_is_first_page() {
    let (store, catalog) = setup();
    let exec = SearchExecutor::<Principals, _, _>::new(&store, &catalog);
    let cond = SearchCondition::leaf(AttributeCond::is_not_null("name"));

    let (first, _) = Logger::capture(|| exec.search(&all(), &cond, 0, 2, &[]));
    assert_eq!(ids(&first.unwrap()), vec![1, 2]);
}

#[test]
fn test_zero_page_size_yields_empty_page() {
    let (store, catalog) = setup();
    let exec = SearchExecutor::<Principals, _, _>::new(&store, &catalog);
    let cond = age_eq("30");

    for page in [1, 2] {
        let (found, _) = Logger::capture(|| exec.search(&all(), &cond, page, 0, &[]));
        assert!(found.unwrap().is_empty());
    }
    // the window does not affect counting
    let (count, _) = Logger::capture(|| exec.count(&all(), &cond));
    assert_eq!(count.unwrap(), 2);
}

#[test]
fn test_unresolvable_order_clause_dropped() {
    let (store, catalog) = setup();
    let exec = SearchExecutor::<Principals, _, _>::new(&store, &catalog);
    let cond = SearchCondition::leaf(AttributeCond::is_not_null("name"));
    let order = [OrderByClause::desc("nope"), OrderByClause::asc("password")];

    let (found, lines) = Logger::capture(|| exec.search(&all(), &cond, 1, 10, &order));
    assert_eq!(ids(&found.unwrap()), vec![1, 2, 3, 4]);
    let dropped = lines
        .iter()
        .filter(|l| l.contains("SEARCH_ORDER_CLAUSE_DROPPED"))
        .count();
    assert_eq!(dropped, 2);
}

#[test]
fn test_order_by_age_puts_missing_first() {
    let (store, catalog) = setup();
    let exec = SearchExecutor::<Principals, _, _>::new(&store, &catalog);
    let cond = SearchCondition::leaf(AttributeCond::is_not_null("name"));

    let (found, _) =
        Logger::capture(|| exec.search(&all(), &cond, -1, -1, &[OrderByClause::asc("age")]));
    assert_eq!(ids(&found.unwrap()), vec![4, 1, 3, 2]);
}

// =============================================================================
// Materialization and Failures
// =============================================================================

/// Reports one identifier that no longer exists, plus a duplicate
struct StaleStore {
    inner: MemoryStore,
}

impl SearchStore<Principals> for StaleStore {
    fn execute(&self, query: &SearchQuery) -> StorageResult<Vec<EntityId>> {
        let mut ids = SearchStore::<Principals>::execute(&self.inner, query)?;
        ids.push(99);
        if let Some(first) = ids.first().copied() {
            ids.push(first);
        }
        Ok(ids)
    }

    fn count(&self, query: &SearchQuery) -> StorageResult<u64> {
        SearchStore::<Principals>::count(&self.inner, query)
    }

    fn load(&self, id: EntityId) -> StorageResult<Option<Principal>> {
        SearchStore::<Principals>::load(&self.inner, id)
    }

    fn has_groups(&self) -> StorageResult<bool> {
        SearchStore::<Principals>::has_groups(&self.inner)
    }
}

/// Fails every query
struct FailingStore;

impl SearchStore<Principals> for FailingStore {
    fn execute(&self, _query: &SearchQuery) -> StorageResult<Vec<EntityId>> {
        Err(StorageError::Unavailable("connection reset".into()))
    }

    fn count(&self, _query: &SearchQuery) -> StorageResult<u64> {
        Err(StorageError::Unavailable("connection reset".into()))
    }

    fn load(&self, _id: EntityId) -> StorageResult<Option<Principal>> {
        Ok(None)
    }

    fn has_groups(&self) -> StorageResult<bool> {
        Ok(true)
    }
}

#[test]
fn test_stale_identifier_logged_and_dropped() {
    let (inner, catalog) = setup();
    let store = StaleStore { inner };
    let exec = SearchExecutor::<Principals, _, _>::new(&store, &catalog);

    let (found, lines) = Logger::capture(|| exec.search_all(&all(), &age_eq("30")));
    assert_eq!(ids(&found.unwrap()), vec![1, 3]);

    let stale: Vec<_> = lines
        .iter()
        .filter(|l| l.contains("SEARCH_STALE_IDENTIFIER"))
        .collect();
    assert_eq!(stale.len(), 1);
    assert!(stale[0].contains("\"id\":\"99\""));
}

#[test]
fn test_search_swallows_failure_count_propagates() {
    let catalog = MemoryCatalog::new().with_schema(AttributeSchema::new("age", ValueType::Long));
    let exec = SearchExecutor::<Principals, _, _>::new(&FailingStore, &catalog);

    let (found, lines) = Logger::capture(|| exec.search_all(&all(), &age_eq("30")));
    assert!(found.unwrap().is_empty());
    assert!(lines.iter().any(|l| l.contains("SEARCH_EXECUTION_FAILED")));

    let (count, _) = Logger::capture(|| exec.count(&all(), &age_eq("30")));
    assert_eq!(count.unwrap_err().code(), SearchErrorCode::EavExecutionFailed);

    let someone = Principal::new(1, "alice");
    let (matched, _) = Logger::capture(|| exec.matches(&someone, &age_eq("30"), &all()));
    assert!(matched.is_err());
}

#[test]
fn test_matches_respects_scope() {
    let (store, catalog) = setup();
    let exec = SearchExecutor::<Principals, _, _>::new(&store, &catalog);
    let bob = Principal::new(2, "bob");
    let cond = age_eq("40");

    let (in_scope, _) = Logger::capture(|| exec.matches(&bob, &cond, &AdministrativeScope::restricted([2])));
    let (out_of_scope, _) =
        Logger::capture(|| exec.matches(&bob, &cond, &AdministrativeScope::restricted([1])));
    assert!(in_scope.unwrap());
    assert!(!out_of_scope.unwrap());
}

#[test]
fn test_every_call_gets_its_own_search_id() {
    let (store, catalog) = setup();
    let exec = SearchExecutor::<Principals, _, _>::new(&store, &catalog);

    let (_, first) = Logger::capture(|| exec.count(&all(), &age_eq("30")));
    let (_, second) = Logger::capture(|| exec.count(&all(), &age_eq("30")));
    assert_ne!(first[0], second[0]);
    assert!(first[0].contains("\"search_id\":"));
}
