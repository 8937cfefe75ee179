//! Smart filter library.
//!
//! Translates HTTP-style filter maps (`?name=Alice&author.created_at[date_from]=...`)
//! into constraints on a query builder. The library exposes:
//! - `filter`: attribute spec types, the resolver and the applicator
//! - `query`: the `FilterQuery` seam with SeaQuery and recording implementations
//! - `config`: loading per-entity attribute specs and relations from JSON, YAML or TOML

pub mod config;
pub mod error;
pub mod filter;
pub mod query;

pub use config::{CONFIG_ENV_VAR, EntityConfig, FilterConfig};
pub use error::{FilterError, FilterResult};
pub use filter::{
    ApplyFilterExt, AttributeSpec, FilterOperation, FilterValue, Filterable,
    FilterableAttributes, MAX_RELATION_DEPTH, RawFilters, ResolvedFilter, ResolvedFilters, apply,
    resolve,
};
pub use query::{
    Constraint, ConstraintSet, DateComparison, FilterQuery, Relation, RelationGraph, SelectQuery,
};
