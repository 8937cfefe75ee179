//! Filterable attribute spec.
//!
//! The per-entity declaration of which attributes accept filtering and with
//! which operation. Built once at configuration-load time and only read
//! while filters are applied.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::types::{AttributeSpec, FilterOperation};
use crate::error::{FilterError, FilterResult};

/// Mapping from attribute name (plain or dotted) to its declaration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FilterableAttributes {
    attributes: BTreeMap<String, AttributeSpec>,
}

impl FilterableAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a plain attribute.
    pub fn with(mut self, name: &str, operation: FilterOperation) -> Self {
        self.attributes
            .insert(name.to_string(), AttributeSpec::Simple(operation));
        self
    }

    /// Declare a relation-qualified attribute record.
    pub fn with_relation(
        mut self,
        name: &str,
        operation: FilterOperation,
        table: Option<&str>,
    ) -> Self {
        self.attributes
            .insert(name.to_string(), AttributeSpec::relation(operation, table));
        self
    }

    /// Declare an attribute from an already built spec.
    pub fn insert(&mut self, name: impl Into<String>, spec: AttributeSpec) {
        self.attributes.insert(name.into(), spec);
    }

    pub fn get(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.get(name)
    }

    /// Whether `name` is literally a declared key.
    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeSpec)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Operation to apply for a resolved attribute key.
    ///
    /// Dotted keys read the `operation` of the record declared for the full
    /// dotted key; plain keys read a plain operation. Anything else (absent
    /// key, plain operation under a dotted key, record under a plain key)
    /// classifies as no operation.
    pub fn operation_of(&self, attribute: &str) -> Option<FilterOperation> {
        let spec = self.attributes.get(attribute)?;
        if attribute.contains('.') {
            match spec {
                AttributeSpec::Relation { operation, .. } => *operation,
                AttributeSpec::Simple(_) => None,
            }
        } else {
            match spec {
                AttributeSpec::Simple(op) => Some(*op),
                AttributeSpec::Relation { .. } => None,
            }
        }
    }

    /// Table declared on the record for `relation`, if any.
    pub fn nested_table(&self, relation: &str) -> Option<&str> {
        self.attributes.get(relation).and_then(AttributeSpec::table)
    }

    /// Check declarations that can never produce a constraint.
    ///
    /// A dotted key declared as a plain operation classifies as nothing, so it
    /// is rejected here rather than silently ignored on every request.
    pub fn validate(&self) -> FilterResult<()> {
        for (name, spec) in &self.attributes {
            if name.is_empty() || name.split('.').any(str::is_empty) {
                return Err(FilterError::InvalidAttribute {
                    attribute: name.clone(),
                    reason: "attribute names must not contain empty segments".to_string(),
                });
            }
            if name.contains('.') && !spec.is_relation() {
                return Err(FilterError::InvalidAttribute {
                    attribute: name.clone(),
                    reason: "dotted attributes must be declared as {operation, table} records"
                        .to_string(),
                });
            }
        }
        Ok(())
    }
}

impl FromIterator<(String, AttributeSpec)> for FilterableAttributes {
    fn from_iter<I: IntoIterator<Item = (String, AttributeSpec)>>(iter: I) -> Self {
        Self {
            attributes: iter.into_iter().collect(),
        }
    }
}
