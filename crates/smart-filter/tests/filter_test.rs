#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Filter application integration tests.
//!
//! Applies request-shaped filter maps to the blog schema and checks both the
//! recorded constraints and the rendered PostgreSQL.

use serde_json::json;
use smart_filter::{
    ApplyFilterExt, Constraint, ConstraintSet, DateComparison, FilterOperation, FilterValue,
    Filterable, FilterableAttributes, RawFilters, SelectQuery,
};
use smart_filter_test_utils::{assert, blog_relations, filters, init_tracing, post_entity};

// -------------------------------------------------------------------------
// Constraint sets
// -------------------------------------------------------------------------

#[test]
fn undeclared_keys_leave_query_unchanged() {
    init_tracing();
    let entity = post_entity();
    let base = entity.select();
    let expected = base.to_postgres();

    let mut query = base.clone();
    query.apply_filter(
        &entity,
        &filters(json!({"body": "x", "editor.name": "y", "comments.text": "z"})),
    );

    assert_eq!(query.to_postgres(), expected);
}

#[test]
fn plain_and_relation_filters_produce_two_constraints() {
    init_tracing();
    let attrs = FilterableAttributes::new()
        .with("name", FilterOperation::Equals)
        .with_relation("author.created_at", FilterOperation::Date, Some("users"));

    let mut set = ConstraintSet::new();
    attrs.apply_filter(
        &mut set,
        &filters(json!({
            "name": "Alice",
            "author.created_at": {"date_from": "2024-01-01"}
        })),
    );

    assert_eq!(set.len(), 2);
    assert!(set.constraints().contains(&Constraint::Equals {
        column: "name".to_string(),
        value: FilterValue::from("Alice"),
    }));
    assert!(set.constraints().contains(&Constraint::Exists {
        relation: "author".to_string(),
        table: Some("users".to_string()),
        constraints: vec![Constraint::DateCompare {
            column: "created_at".to_string(),
            comparison: DateComparison::AtLeast,
            value: FilterValue::from("2024-01-01"),
        }],
    }));
}

#[test]
fn between_with_one_element_is_skipped() {
    let mut set = ConstraintSet::new();
    post_entity().apply_filter(&mut set, &filters(json!({"price": [10]})));

    assert!(set.is_empty());
}

#[test]
fn malformed_entry_does_not_stop_others() {
    let mut set = ConstraintSet::new();
    post_entity().apply_filter(
        &mut set,
        &filters(json!({
            "price": [10],
            "published_at": "not a record",
            "status": "draft"
        })),
    );

    assert_eq!(
        set.constraints(),
        &[Constraint::Equals {
            column: "status".to_string(),
            value: FilterValue::from("draft"),
        }]
    );
}

#[test]
fn applying_twice_to_copies_is_equal() {
    let entity = post_entity();
    let request = filters(json!({
        "title": "rust",
        "author.name": "Alice",
        "price": [1, 5]
    }));

    let mut first = ConstraintSet::new();
    let mut second = ConstraintSet::new();
    entity.apply_filter(&mut first, &request);
    entity.apply_filter(&mut second, &request);

    assert_eq!(first, second);
    assert!(!first.is_empty());
}

// -------------------------------------------------------------------------
// Rendered SQL
// -------------------------------------------------------------------------

#[test]
fn like_filter_matches_substring() {
    let entity = post_entity();
    let mut query = entity.select();
    query.apply_filter(&entity, &filters(json!({"title": "abc"})));
    let sql = query.to_postgres();

    assert::contains(&sql, r#""posts"."title" LIKE"#);
    assert::contains(&sql, "%abc%");
}

#[test]
fn like_filter_matches_percent_literally() {
    let entity = post_entity();
    let mut query = entity.select();
    query.apply_filter(&entity, &filters(json!({"title": "50%"})));
    let sql = query.to_postgres();

    assert::contains(&sql, r#""posts"."title" LIKE E'%50\\%%'"#);
    assert::not_contains(&sql, "'%50%%'");
}

#[test]
fn relation_date_filter_renders_exists() {
    let entity = post_entity();
    let mut query = entity.select();
    query.apply_filter(
        &entity,
        &filters(json!({"author.created_at": {"date_from": "2024-01-01"}})),
    );
    let sql = query.to_postgres();

    assert::occurrences(&sql, "EXISTS", 1);
    assert::contains(&sql, r#"FROM "users" AS "author""#);
    assert::contains(&sql, r#""author"."id" = "posts"."author_id""#);
    assert::contains(&sql, r#"DATE("author"."created_at") >= '2024-01-01'"#);
    assert::not_contains(&sql, "JOIN");
}

#[test]
fn relation_date_range_uses_between() {
    let entity = post_entity();
    let mut query = entity.select();
    query.apply_filter(
        &entity,
        &filters(json!({
            "author.created_at": {"date_from": "2024-01-01", "date_to": "2024-06-30"}
        })),
    );
    let sql = query.to_postgres();

    assert::contains(
        &sql,
        r#""author"."created_at" BETWEEN '2024-01-01' AND '2024-06-30'"#,
    );
}

#[test]
fn two_level_relation_nests_exists() {
    let entity = post_entity();
    let mut query = entity.select();
    query.apply_filter(&entity, &filters(json!({"author.profile.bio": "rustacean"})));
    let sql = query.to_postgres();

    assert::occurrences(&sql, "EXISTS", 2);
    assert::contains(&sql, r#"FROM "users" AS "author""#);
    assert::contains(&sql, r#"FROM "profiles" AS "profile""#);
    assert::contains(&sql, r#""profile"."user_id" = "author"."id""#);
    assert::contains(&sql, r#""profile"."bio" LIKE"#);
    assert::contains(&sql, "%rustacean%");
}

#[test]
fn nested_entry_for_undeclared_leaf_is_dropped() {
    // `author.name` expands to a nested `name` entry, but posts do not
    // declare `name`, so only the relation filter applies.
    let entity = post_entity();
    let mut query = entity.select();
    query.apply_filter(&entity, &filters(json!({"author.name": "Alice"})));
    let sql = query.to_postgres();

    assert::occurrences(&sql, "EXISTS", 1);
    assert::contains(&sql, r#""author"."name" = 'Alice'"#);
    assert::not_contains(&sql, r#""posts"."name""#);
}

#[test]
fn between_and_equals_on_base_table() {
    let entity = post_entity();
    let mut query = entity.select();
    query.apply_filter(
        &entity,
        &filters(json!({"price": [10, 20], "status": "published", "title": null})),
    );
    let sql = query.to_postgres();

    assert::contains(&sql, r#""posts"."price" BETWEEN 10 AND 20"#);
    assert::contains(&sql, r#""posts"."status" = 'published'"#);
    assert::not_contains(&sql, "title");
}

#[test]
fn query_pairs_flow_through_to_sql() {
    let entity = post_entity();
    let request = RawFilters::from_query_pairs([
        ("published_at[date_to]", "2024-12-31"),
        ("title", ""),
        ("status", "draft"),
    ])
    .unwrap();

    let mut query = entity.select();
    query.apply_filter(&entity, &request);
    let sql = query.to_postgres();

    assert::contains(&sql, r#"DATE("posts"."published_at") <= '2024-12-31'"#);
    assert::contains(&sql, r#""posts"."status" = 'draft'"#);
    assert::not_contains(&sql, "title");
}

#[test]
fn existing_constraints_are_kept() {
    let entity = post_entity();
    let mut query = SelectQuery::new("posts", blog_relations());
    query.apply_filter(&entity, &filters(json!({"status": "draft"})));
    query.apply_filter(&entity, &filters(json!({"title": "rust"})));
    let sql = query.to_postgres();

    assert::contains(&sql, r#""posts"."status" = 'draft'"#);
    assert::contains(&sql, "%rust%");
}

#[test]
fn bound_values_for_execution() {
    let entity = post_entity();
    let mut query = entity.select();
    query.apply_filter(&entity, &filters(json!({"status": "draft", "price": [1, 2]})));
    let (sql, values) = query.build_postgres();

    assert::contains(&sql, "$1");
    assert::contains(&sql, "$3");
    assert_eq!(values.0.len(), 3);
}
