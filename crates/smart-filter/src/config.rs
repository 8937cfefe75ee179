//! Filter configuration loaded from JSON, YAML or TOML.
//!
//! A config document declares, per entity, the table it lives in, its
//! filterable attributes and its relations:
//!
//! ```yaml
//! post:
//!   table: posts
//!   attributes:
//!     title: like
//!     author.created_at: { operation: date, table: users }
//!   relations:
//!     author: { table: users, local_key: author_id, related_key: id }
//! ```
//!
//! Operation names and attribute shapes are validated at load time, so a
//! loaded config never needs per-request checks.

use std::collections::BTreeMap;
use std::env;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{FilterError, FilterResult};
use crate::filter::{Filterable, FilterableAttributes};
use crate::query::{Relation, RelationGraph, SelectQuery};

/// Environment variable naming the config file for [`FilterConfig::from_env`].
pub const CONFIG_ENV_VAR: &str = "SMART_FILTER_CONFIG";

/// Maximum config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// One entity as written in a config document.
#[derive(Debug, Deserialize)]
struct EntityDocument {
    table: String,
    #[serde(default)]
    attributes: FilterableAttributes,
    #[serde(default)]
    relations: BTreeMap<String, Relation>,
}

/// Filter configuration for a single entity type.
#[derive(Debug, Clone)]
pub struct EntityConfig {
    table: String,
    attributes: FilterableAttributes,
    relations: Arc<RelationGraph>,
}

impl EntityConfig {
    /// Entity without relations of its own.
    pub fn new(table: &str, attributes: FilterableAttributes) -> Self {
        Self {
            table: table.to_string(),
            attributes,
            relations: Arc::new(RelationGraph::new()),
        }
    }

    /// Share a relation graph (usually the whole config's).
    pub fn with_relations(mut self, relations: Arc<RelationGraph>) -> Self {
        self.relations = relations;
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn relations(&self) -> &Arc<RelationGraph> {
        &self.relations
    }

    /// Start a `SELECT` over this entity's table.
    pub fn select(&self) -> SelectQuery {
        SelectQuery::new(&self.table, Arc::clone(&self.relations))
    }
}

impl Filterable for EntityConfig {
    fn filterable_attributes(&self) -> &FilterableAttributes {
        &self.attributes
    }
}

/// All configured entities, keyed by entity name.
#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    entities: BTreeMap<String, EntityConfig>,
    relations: Arc<RelationGraph>,
}

impl FilterConfig {
    pub fn from_json_str(json: &str) -> FilterResult<Self> {
        Self::from_documents(serde_json::from_str(json)?)
    }

    pub fn from_yaml_str(yaml: &str) -> FilterResult<Self> {
        Self::from_documents(serde_yml::from_str(yaml)?)
    }

    pub fn from_toml_str(toml: &str) -> FilterResult<Self> {
        Self::from_documents(toml::from_str(toml)?)
    }

    /// Load a config file; the format follows the extension
    /// (`.json`, `.yaml`/`.yml`, `.toml`).
    pub fn load(path: &Path) -> FilterResult<Self> {
        let size = std::fs::metadata(path)?.len();
        if size > MAX_CONFIG_FILE_SIZE {
            return Err(FilterError::ConfigTooLarge(size));
        }

        let contents = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();

        let config = match extension {
            "json" => Self::from_json_str(&contents),
            "yaml" | "yml" => Self::from_yaml_str(&contents),
            "toml" => Self::from_toml_str(&contents),
            other => Err(FilterError::UnsupportedFormat(other.to_string())),
        }?;

        info!(
            path = %path.display(),
            entities = config.entities.len(),
            "loaded filter config"
        );
        Ok(config)
    }

    /// Load the file named by `SMART_FILTER_CONFIG`.
    pub fn from_env() -> FilterResult<Self> {
        let path =
            env::var(CONFIG_ENV_VAR).map_err(|_| FilterError::MissingEnv(CONFIG_ENV_VAR))?;
        Self::load(Path::new(&path))
    }

    fn from_documents(documents: BTreeMap<String, EntityDocument>) -> FilterResult<Self> {
        let mut graph = RelationGraph::new();
        for document in documents.values() {
            for (name, relation) in &document.relations {
                graph.insert(&document.table, name, relation.clone());
            }
        }
        let relations = Arc::new(graph);

        let mut entities = BTreeMap::new();
        for (name, document) in documents {
            document.attributes.validate()?;
            debug!(
                entity = %name,
                table = %document.table,
                attributes = document.attributes.len(),
                "registered filterable entity"
            );
            let entity = EntityConfig::new(&document.table, document.attributes)
                .with_relations(Arc::clone(&relations));
            entities.insert(name, entity);
        }

        Ok(Self {
            entities,
            relations,
        })
    }

    pub fn entity(&self, name: &str) -> Option<&EntityConfig> {
        self.entities.get(name)
    }

    pub fn entities(&self) -> impl Iterator<Item = (&str, &EntityConfig)> {
        self.entities.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Relations of every entity, keyed by table.
    pub fn relations(&self) -> &Arc<RelationGraph> {
        &self.relations
    }
}
