//! Query builder seam.
//!
//! The applicator only talks to `FilterQuery`. This module provides:
//! - SelectQuery: SeaQuery `SelectStatement` with EXISTS subqueries per relation
//! - ConstraintSet: a backend-neutral record of the applied constraints
//! - Relation/RelationGraph: how relation names map to tables and keys

mod constraint;
mod relation;
mod select;

pub use constraint::{Constraint, ConstraintSet};
pub use relation::{Relation, RelationGraph};
pub use select::SelectQuery;

use crate::filter::FilterValue;

/// Direction of a single-bound date constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateComparison {
    /// Date part is on or after the value.
    AtLeast,
    /// Date part is on or before the value.
    AtMost,
}

/// Query builder operations the filter applicator relies on.
///
/// Implementations only ever add constraints; nothing is removed from the
/// query. A value the implementation cannot bind (a list where a scalar is
/// expected, for example) skips that one constraint.
pub trait FilterQuery {
    /// Constrain `column` to equal `value`.
    fn where_equals(&mut self, column: &str, value: &FilterValue);

    /// Constrain `column` to contain `needle` as a substring.
    fn where_like(&mut self, column: &str, needle: &FilterValue);

    /// Constrain `column` to the inclusive range `[low, high]`.
    fn where_between(&mut self, column: &str, low: &FilterValue, high: &FilterValue);

    /// Compare the date part of `column` against `value`.
    fn where_date(&mut self, column: &str, comparison: DateComparison, value: &FilterValue);

    /// Restrict to rows with at least one related `relation` row matching the
    /// constraints `scope` adds to the nested query.
    ///
    /// `table` is the related table declared in the attribute spec, if any.
    fn where_has<F>(&mut self, relation: &str, table: Option<&str>, scope: F)
    where
        F: FnOnce(&mut Self);
}
