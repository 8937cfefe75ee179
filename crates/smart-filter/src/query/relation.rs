//! Relation definitions used to build EXISTS subqueries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// How one table reaches a related table.
///
/// The subquery for a relation matches
/// `related.related_key = owner.local_key`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Relation {
    /// Related table.
    pub table: String,
    /// Column on the owning table.
    pub local_key: String,
    /// Column on the related table.
    pub related_key: String,
}

impl Relation {
    /// Owner holds the foreign key (`posts.author_id` → `users.id`).
    pub fn belongs_to(table: &str, foreign_key: &str, owner_key: &str) -> Self {
        Self {
            table: table.to_string(),
            local_key: foreign_key.to_string(),
            related_key: owner_key.to_string(),
        }
    }

    /// Related rows hold the foreign key (`users.id` ← `posts.author_id`).
    pub fn has_many(table: &str, foreign_key: &str, local_key: &str) -> Self {
        Self {
            table: table.to_string(),
            local_key: local_key.to_string(),
            related_key: foreign_key.to_string(),
        }
    }

    /// Same key layout as `has_many`; EXISTS makes the cardinality irrelevant.
    pub fn has_one(table: &str, foreign_key: &str, local_key: &str) -> Self {
        Self::has_many(table, foreign_key, local_key)
    }

    /// Convention for relations nobody registered: `owner.{relation}_id = related.id`.
    pub(crate) fn conventional(relation: &str, table: &str) -> Self {
        Self::belongs_to(table, &format!("{relation}_id"), "id")
    }
}

/// Relations keyed by owning table, then relation name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct RelationGraph {
    tables: BTreeMap<String, BTreeMap<String, Relation>>,
}

impl RelationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a relation, builder style.
    pub fn with(mut self, owner: &str, name: &str, relation: Relation) -> Self {
        self.insert(owner, name, relation);
        self
    }

    pub fn insert(&mut self, owner: &str, name: &str, relation: Relation) {
        self.tables
            .entry(owner.to_string())
            .or_default()
            .insert(name.to_string(), relation);
    }

    pub fn get(&self, owner: &str, name: &str) -> Option<&Relation> {
        self.tables.get(owner)?.get(name)
    }

    /// Merge another graph in; relations in `other` win.
    pub fn extend(&mut self, other: RelationGraph) {
        for (owner, relations) in other.tables {
            self.tables.entry(owner).or_default().extend(relations);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tables.values().all(BTreeMap::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn belongs_to_keys() {
        let rel = Relation::belongs_to("users", "author_id", "id");
        assert_eq!(rel.local_key, "author_id");
        assert_eq!(rel.related_key, "id");
    }

    #[test]
    fn has_many_keys() {
        let rel = Relation::has_many("comments", "post_id", "id");
        assert_eq!(rel.local_key, "id");
        assert_eq!(rel.related_key, "post_id");
    }

    #[test]
    fn conventional_relation_uses_relation_name() {
        let rel = Relation::conventional("author", "users");
        assert_eq!(rel, Relation::belongs_to("users", "author_id", "id"));
    }

    #[test]
    fn graph_lookup_by_owner_and_name() {
        let graph = RelationGraph::new()
            .with("posts", "author", Relation::belongs_to("users", "author_id", "id"))
            .with("users", "profile", Relation::has_one("profiles", "user_id", "id"));

        assert_eq!(graph.get("posts", "author").map(|r| r.table.as_str()), Some("users"));
        assert!(graph.get("users", "author").is_none());
        assert!(graph.get("comments", "author").is_none());
        assert!(!graph.is_empty());
    }

    #[test]
    fn extend_overrides_existing_relation() {
        let mut graph = RelationGraph::new().with(
            "posts",
            "author",
            Relation::belongs_to("users", "author_id", "id"),
        );
        graph.extend(RelationGraph::new().with(
            "posts",
            "author",
            Relation::belongs_to("members", "member_id", "id"),
        ));

        assert_eq!(
            graph.get("posts", "author").map(|r| r.table.as_str()),
            Some("members")
        );
    }

    #[test]
    fn deserializes_from_yaml() {
        let yaml = r#"
posts:
  author:
    table: users
    local_key: author_id
    related_key: id
"#;
        let graph: RelationGraph = serde_yml::from_str(yaml).unwrap();
        assert_eq!(
            graph.get("posts", "author"),
            Some(&Relation::belongs_to("users", "author_id", "id"))
        );
    }
}
