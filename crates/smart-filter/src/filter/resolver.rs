//! Attribute resolver.
//!
//! Intersects the declared attributes with the request's keys and expands
//! dotted keys into synthetic entries one relation level down.

use std::collections::BTreeMap;

use super::attributes::FilterableAttributes;
use super::raw::RawFilters;
use super::types::{FilterOperation, FilterValue};

/// A filter entry ready for classification.
///
/// Raw entries carry no metadata. Synthetic entries created from a dotted
/// key carry the operation and table declared for the key's root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedFilter {
    pub value: FilterValue,
    pub operation: Option<FilterOperation>,
    pub table: Option<String>,
}

impl ResolvedFilter {
    fn raw(value: FilterValue) -> Self {
        Self {
            value,
            operation: None,
            table: None,
        }
    }
}

/// Raw filters merged with the synthetic nested entries.
pub type ResolvedFilters = BTreeMap<String, ResolvedFilter>;

/// Resolve a raw filter map against the declared attributes.
///
/// The result keeps every raw entry (filtering by spec happens when filters
/// are applied) and adds one synthetic entry per declared dotted key whose
/// root segment is itself declared. A synthetic entry replaces a raw entry
/// that happens to use the same key.
pub fn resolve(attributes: &FilterableAttributes, filters: &RawFilters) -> ResolvedFilters {
    let mut resolved: ResolvedFilters = filters
        .iter()
        .map(|(key, value)| (key.to_string(), ResolvedFilter::raw(value.clone())))
        .collect();

    let filtered_keys = attributes.keys().filter(|key| filters.contains_key(key));

    for key in filtered_keys {
        let Some((root, nested_key)) = key.split_once('.') else {
            continue;
        };
        let Some(root_spec) = attributes.get(root) else {
            continue;
        };

        let entry = ResolvedFilter {
            value: filters.get(key).cloned().unwrap_or_default(),
            operation: root_spec.operation(),
            table: root_spec.table().map(str::to_string),
        };
        tracing::trace!(
            key,
            nested_key,
            operation = ?entry.operation,
            "expanded nested filter"
        );
        resolved.insert(nested_key.to_string(), entry);
    }

    resolved
}
