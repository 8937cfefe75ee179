//! Backend-neutral constraint recording.

use serde::Serialize;

use super::{DateComparison, FilterQuery};
use crate::filter::FilterValue;

/// One constraint added by the applicator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Constraint {
    Equals {
        column: String,
        value: FilterValue,
    },
    Like {
        column: String,
        needle: FilterValue,
    },
    Between {
        column: String,
        low: FilterValue,
        high: FilterValue,
    },
    DateCompare {
        column: String,
        #[serde(serialize_with = "serialize_comparison")]
        comparison: DateComparison,
        value: FilterValue,
    },
    Exists {
        relation: String,
        table: Option<String>,
        constraints: Vec<Constraint>,
    },
}

fn serialize_comparison<S: serde::Serializer>(
    comparison: &DateComparison,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(match comparison {
        DateComparison::AtLeast => ">=",
        DateComparison::AtMost => "<=",
    })
}

/// Records constraints instead of building SQL.
///
/// Useful for translating filters onto a store SeaQuery does not cover, and
/// for inspecting exactly what a filter map produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ConstraintSet {
    constraints: Vec<Constraint>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn into_constraints(self) -> Vec<Constraint> {
        self.constraints
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}

impl FilterQuery for ConstraintSet {
    fn where_equals(&mut self, column: &str, value: &FilterValue) {
        self.constraints.push(Constraint::Equals {
            column: column.to_string(),
            value: value.clone(),
        });
    }

    fn where_like(&mut self, column: &str, needle: &FilterValue) {
        self.constraints.push(Constraint::Like {
            column: column.to_string(),
            needle: needle.clone(),
        });
    }

    fn where_between(&mut self, column: &str, low: &FilterValue, high: &FilterValue) {
        self.constraints.push(Constraint::Between {
            column: column.to_string(),
            low: low.clone(),
            high: high.clone(),
        });
    }

    fn where_date(&mut self, column: &str, comparison: DateComparison, value: &FilterValue) {
        self.constraints.push(Constraint::DateCompare {
            column: column.to_string(),
            comparison,
            value: value.clone(),
        });
    }

    fn where_has<F>(&mut self, relation: &str, table: Option<&str>, scope: F)
    where
        F: FnOnce(&mut Self),
    {
        let mut nested = ConstraintSet::new();
        scope(&mut nested);
        self.constraints.push(Constraint::Exists {
            relation: relation.to_string(),
            table: table.map(str::to_string),
            constraints: nested.constraints,
        });
    }
}
