//! Smart filter test utilities.
//!
//! Helpers for integration testing: a small blog schema (posts, their
//! authors, and the authors' profiles), filter map builders, and assertion
//! helpers for rendered SQL.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use smart_filter::{
    EntityConfig, FilterOperation, FilterableAttributes, RawFilters, Relation, RelationGraph,
};

/// The blog schema as a YAML config document.
pub const BLOG_CONFIG_YAML: &str = r#"
post:
  table: posts
  attributes:
    title: like
    status: equals
    price: between
    published_at: date
    author:
      operation: like
      table: users
    author.name:
      operation: equals
    author.created_at:
      operation: date
      table: users
    author.profile.bio:
      operation: like
  relations:
    author:
      table: users
      local_key: author_id
      related_key: id
    comments:
      table: comments
      local_key: id
      related_key: post_id
user:
  table: users
  attributes:
    name: equals
    email: like
  relations:
    profile:
      table: profiles
      local_key: id
      related_key: user_id
"#;

/// Install a fmt subscriber honoring `RUST_LOG`; safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Relations of the blog schema.
pub fn blog_relations() -> Arc<RelationGraph> {
    Arc::new(
        RelationGraph::new()
            .with("posts", "author", Relation::belongs_to("users", "author_id", "id"))
            .with("posts", "comments", Relation::has_many("comments", "post_id", "id"))
            .with("users", "profile", Relation::has_one("profiles", "user_id", "id")),
    )
}

/// Filterable attributes of a blog post.
pub fn post_attributes() -> FilterableAttributes {
    FilterableAttributes::new()
        .with("title", FilterOperation::Like)
        .with("status", FilterOperation::Equals)
        .with("price", FilterOperation::Between)
        .with("published_at", FilterOperation::Date)
        .with_relation("author", FilterOperation::Like, Some("users"))
        .with_relation("author.name", FilterOperation::Equals, None)
        .with_relation("author.created_at", FilterOperation::Date, Some("users"))
        .with_relation("author.profile.bio", FilterOperation::Like, None)
}

/// Blog post entity over `posts`, sharing the blog relations.
pub fn post_entity() -> EntityConfig {
    EntityConfig::new("posts", post_attributes()).with_relations(blog_relations())
}

/// Build a filter map from a JSON object literal.
pub fn filters(json: JsonValue) -> RawFilters {
    match RawFilters::from_json_value(json) {
        Ok(filters) => filters,
        Err(e) => panic!("test filters must be a JSON object: {e}"),
    }
}

/// Assertion helpers for rendered SQL.
pub mod assert {
    /// Assert that SQL contains a fragment.
    pub fn contains(sql: &str, fragment: &str) {
        assert!(
            sql.contains(fragment),
            "Expected SQL to contain '{fragment}'\nActual: {sql}"
        );
    }

    /// Assert that SQL does not contain a fragment.
    pub fn not_contains(sql: &str, fragment: &str) {
        assert!(
            !sql.contains(fragment),
            "Expected SQL to NOT contain '{fragment}'\nActual: {sql}"
        );
    }

    /// Assert how many times a fragment occurs.
    pub fn occurrences(sql: &str, fragment: &str, expected: usize) {
        let actual = sql.matches(fragment).count();
        assert_eq!(
            actual, expected,
            "Expected '{fragment}' {expected} time(s), found {actual}\nActual: {sql}"
        );
    }
}
