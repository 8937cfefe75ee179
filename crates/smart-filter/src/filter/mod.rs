//! Filter resolution and application.
//!
//! This module provides:
//! - FilterableAttributes: per-entity declaration of filterable attributes
//! - resolve: merges dotted keys into nested entries
//! - apply / Filterable / ApplyFilterExt: emit constraints onto a `FilterQuery`
//! - Types: FilterOperation, AttributeSpec, FilterValue, RawFilters

mod applicator;
mod attributes;
mod raw;
mod resolver;
pub mod types;

pub use applicator::{ApplyFilterExt, Filterable, MAX_RELATION_DEPTH, apply};
pub use attributes::FilterableAttributes;
pub use raw::RawFilters;
pub use resolver::{ResolvedFilter, ResolvedFilters, resolve};
pub use types::{AttributeSpec, FilterOperation, FilterValue};
