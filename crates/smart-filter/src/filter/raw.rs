//! Raw filter maps as they arrive from a request.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde::{Deserialize, Serialize};

use super::types::FilterValue;
use crate::error::{FilterError, FilterResult};

/// Caller-supplied mapping from attribute key to filter value.
///
/// Keys may be dot-qualified (`author.created_at`) to reach attributes
/// through relations.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct RawFilters {
    entries: BTreeMap<String, FilterValue>,
}

impl RawFilters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, builder style.
    pub fn with(mut self, key: &str, value: impl Into<FilterValue>) -> Self {
        self.entries.insert(key.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a JSON object of filters.
    pub fn from_json_str(json: &str) -> FilterResult<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_json_value(value)
    }

    /// Convert a JSON object of filters. Anything but an object is rejected.
    pub fn from_json_value(value: serde_json::Value) -> FilterResult<Self> {
        match value {
            serde_json::Value::Object(fields) => Ok(fields
                .into_iter()
                .map(|(k, v)| (k, FilterValue::from(v)))
                .collect()),
            other => Err(FilterError::InvalidFilters(format!(
                "expected an object of filters, got {other}"
            ))),
        }
    }

    /// Build filters from decoded query-string pairs.
    ///
    /// Supports the bracket conventions used by HTML forms:
    /// - `name=Alice` → string
    /// - `price[]=10&price[]=20` → list
    /// - `created_at[date_from]=2024-01-01` → record
    ///
    /// Empty values become null so that blank form fields are never applied.
    pub fn from_query_pairs<I, K, V>(pairs: I) -> FilterResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut entries: BTreeMap<String, FilterValue> = BTreeMap::new();

        for (key, value) in pairs {
            let key = key.as_ref();
            let value = match value.as_ref() {
                "" => FilterValue::Null,
                v => FilterValue::String(v.to_string()),
            };

            let Some((name, rest)) = key.split_once('[') else {
                entries.insert(key.to_string(), value);
                continue;
            };
            let Some(field) = rest.strip_suffix(']') else {
                return Err(FilterError::InvalidFilters(format!(
                    "unterminated bracket in filter key: {key}"
                )));
            };
            if name.is_empty() || field.contains(['[', ']']) {
                return Err(FilterError::InvalidFilters(format!(
                    "unsupported filter key: {key}"
                )));
            }

            match entries.entry(name.to_string()) {
                Entry::Vacant(slot) => {
                    slot.insert(if field.is_empty() {
                        FilterValue::List(vec![value])
                    } else {
                        FilterValue::record([(field, value)])
                    });
                }
                Entry::Occupied(mut slot) => match (slot.get_mut(), field.is_empty()) {
                    (FilterValue::List(items), true) => items.push(value),
                    (FilterValue::Record(fields), false) => {
                        fields.insert(field.to_string(), value);
                    }
                    _ => {
                        return Err(FilterError::InvalidFilters(format!(
                            "conflicting shapes for filter key: {name}"
                        )));
                    }
                },
            }
        }

        Ok(Self { entries })
    }
}

impl FromIterator<(String, FilterValue)> for RawFilters {
    fn from_iter<I: IntoIterator<Item = (String, FilterValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
