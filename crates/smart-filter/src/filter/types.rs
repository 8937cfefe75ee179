//! Filter types.
//!
//! Provides the configuration and value types shared by the resolver and
//! the applicator:
//! - FilterOperation: the closed set of leaf operations
//! - AttributeSpec: how one filterable attribute is declared
//! - FilterValue: a raw filter value as it arrives from a request

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FilterError;

/// Leaf operations a filterable attribute can declare.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum FilterOperation {
    /// Substring match (LIKE %value%).
    Like,
    /// Exact match.
    Equals,
    /// Inclusive range over a two-element list.
    Between,
    /// Date range from a `{date_from, date_to}` record.
    Date,
}

impl FilterOperation {
    /// Name used in configuration files and query strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperation::Like => "like",
            FilterOperation::Equals => "equals",
            FilterOperation::Between => "between",
            FilterOperation::Date => "date",
        }
    }
}

impl fmt::Display for FilterOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOperation {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(FilterOperation::Like),
            "equals" => Ok(FilterOperation::Equals),
            "between" => Ok(FilterOperation::Between),
            "date" => Ok(FilterOperation::Date),
            other => Err(FilterError::UnknownOperation(other.to_string())),
        }
    }
}

impl TryFrom<String> for FilterOperation {
    type Error = FilterError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Declaration of a single filterable attribute.
///
/// A plain attribute names its operation directly (`name: equals`). An
/// attribute reached through a relation uses a record so it can also carry
/// the related table (`author.created_at: {operation: date, table: users}`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged, try_from = "RawAttributeSpec")]
pub enum AttributeSpec {
    Simple(FilterOperation),
    Relation {
        #[serde(skip_serializing_if = "Option::is_none")]
        operation: Option<FilterOperation>,
        #[serde(skip_serializing_if = "Option::is_none")]
        table: Option<String>,
    },
}

impl AttributeSpec {
    /// Relation record with an operation and optional table.
    pub fn relation(operation: FilterOperation, table: Option<&str>) -> Self {
        AttributeSpec::Relation {
            operation: Some(operation),
            table: table.map(str::to_string),
        }
    }

    /// Operation as the resolver copies it onto nested entries.
    pub fn operation(&self) -> Option<FilterOperation> {
        match self {
            AttributeSpec::Simple(op) => Some(*op),
            AttributeSpec::Relation { operation, .. } => *operation,
        }
    }

    /// Related table, only present on relation records.
    pub fn table(&self) -> Option<&str> {
        match self {
            AttributeSpec::Simple(_) => None,
            AttributeSpec::Relation { table, .. } => table.as_deref(),
        }
    }

    pub fn is_relation(&self) -> bool {
        matches!(self, AttributeSpec::Relation { .. })
    }
}

impl From<FilterOperation> for AttributeSpec {
    fn from(op: FilterOperation) -> Self {
        AttributeSpec::Simple(op)
    }
}

/// Wire shape of an attribute declaration before operation names are checked.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawAttributeSpec {
    Simple(String),
    Relation {
        #[serde(default)]
        operation: Option<String>,
        #[serde(default)]
        table: Option<String>,
    },
}

impl TryFrom<RawAttributeSpec> for AttributeSpec {
    type Error = FilterError;

    fn try_from(raw: RawAttributeSpec) -> Result<Self, Self::Error> {
        match raw {
            RawAttributeSpec::Simple(op) => Ok(AttributeSpec::Simple(op.parse()?)),
            RawAttributeSpec::Relation { operation, table } => Ok(AttributeSpec::Relation {
                operation: operation.map(|op| op.parse()).transpose()?,
                table,
            }),
        }
    }
}

/// Raw filter value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FilterValue {
    /// Absent or explicit null; never applied.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Integer(i64),
    /// Float value.
    Float(f64),
    /// String value.
    String(String),
    /// List of values (ranges).
    List(Vec<FilterValue>),
    /// Keyed record (date ranges).
    Record(BTreeMap<String, FilterValue>),
}

impl FilterValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FilterValue::Null)
    }

    /// Convert a scalar to its string form.
    pub fn as_string(&self) -> Option<String> {
        match self {
            FilterValue::String(s) => Some(s.clone()),
            FilterValue::Integer(i) => Some(i.to_string()),
            FilterValue::Float(f) => Some(f.to_string()),
            FilterValue::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Both ends of a range, if this is a list of exactly two elements.
    pub fn as_pair(&self) -> Option<(&FilterValue, &FilterValue)> {
        match self {
            FilterValue::List(items) if items.len() == 2 => Some((&items[0], &items[1])),
            _ => None,
        }
    }

    /// Look up a non-null field of a record (`date_from`, `date_to`).
    pub fn field(&self, key: &str) -> Option<&FilterValue> {
        match self {
            FilterValue::Record(fields) => fields.get(key).filter(|v| !v.is_null()),
            _ => None,
        }
    }

    /// Build a record from key/value pairs.
    pub fn record<K, V, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FilterValue>,
    {
        FilterValue::Record(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::String(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::String(s)
    }
}

impl From<i64> for FilterValue {
    fn from(i: i64) -> Self {
        FilterValue::Integer(i)
    }
}

impl From<f64> for FilterValue {
    fn from(f: f64) -> Self {
        FilterValue::Float(f)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        FilterValue::Bool(b)
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(items: Vec<T>) -> Self {
        FilterValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for FilterValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => FilterValue::Null,
            Value::Bool(b) => FilterValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FilterValue::Integer(i),
                None => n.as_f64().map_or(FilterValue::Null, FilterValue::Float),
            },
            Value::String(s) => FilterValue::String(s),
            Value::Array(items) => {
                FilterValue::List(items.into_iter().map(FilterValue::from).collect())
            }
            Value::Object(fields) => FilterValue::Record(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, FilterValue::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_names_round_trip() {
        for op in [
            FilterOperation::Like,
            FilterOperation::Equals,
            FilterOperation::Between,
            FilterOperation::Date,
        ] {
            assert_eq!(op.as_str().parse::<FilterOperation>().ok(), Some(op));
        }
    }

    #[test]
    fn unknown_operation_rejected() {
        let err = "greater_than".parse::<FilterOperation>();
        assert!(matches!(err, Err(FilterError::UnknownOperation(name)) if name == "greater_than"));
    }

    #[test]
    fn attribute_spec_from_string_and_record() {
        let simple: AttributeSpec = serde_json::from_str(r#""like""#).unwrap();
        assert_eq!(simple, AttributeSpec::Simple(FilterOperation::Like));

        let relation: AttributeSpec =
            serde_json::from_str(r#"{"operation": "date", "table": "users"}"#).unwrap();
        assert_eq!(relation.operation(), Some(FilterOperation::Date));
        assert_eq!(relation.table(), Some("users"));
        assert!(relation.is_relation());
    }

    #[test]
    fn attribute_spec_record_without_operation() {
        let relation: AttributeSpec = serde_json::from_str(r#"{"table": "users"}"#).unwrap();
        assert_eq!(relation.operation(), None);
        assert_eq!(relation.table(), Some("users"));
    }

    #[test]
    fn attribute_spec_rejects_unknown_operation() {
        let result: Result<AttributeSpec, _> = serde_json::from_str(r#""regex""#);
        assert!(result.is_err());
    }

    #[test]
    fn attribute_spec_serializes_untagged() {
        let json = serde_json::to_value(AttributeSpec::relation(FilterOperation::Like, None))
            .unwrap();
        assert_eq!(json, serde_json::json!({"operation": "like"}));
        let json = serde_json::to_value(AttributeSpec::Simple(FilterOperation::Equals)).unwrap();
        assert_eq!(json, serde_json::json!("equals"));
    }

    #[test]
    fn filter_value_from_json() {
        let value = FilterValue::from(serde_json::json!({
            "date_from": "2024-01-01",
            "date_to": null
        }));
        assert_eq!(
            value.field("date_from"),
            Some(&FilterValue::String("2024-01-01".to_string()))
        );
        assert_eq!(value.field("date_to"), None);

        assert_eq!(FilterValue::from(serde_json::json!(3)), FilterValue::Integer(3));
        assert_eq!(FilterValue::from(serde_json::json!(1.5)), FilterValue::Float(1.5));
    }

    #[test]
    fn filter_value_deserializes_null() {
        let value: FilterValue = serde_json::from_str("null").unwrap();
        assert!(value.is_null());
    }

    #[test]
    fn pair_requires_exactly_two_elements() {
        assert!(FilterValue::from(vec![10_i64]).as_pair().is_none());
        assert!(FilterValue::from(vec![1_i64, 2, 3]).as_pair().is_none());
        let pair = FilterValue::from(vec![10_i64, 20]);
        let (low, high) = pair.as_pair().unwrap();
        assert_eq!(low, &FilterValue::Integer(10));
        assert_eq!(high, &FilterValue::Integer(20));
    }
}
