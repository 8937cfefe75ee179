//! Filter applicator.
//!
//! Walks the resolved filters, classifies each attribute and emits the leaf
//! constraint, wrapping it in one EXISTS scope per relation hop.

use tracing::{debug, trace};

use super::attributes::FilterableAttributes;
use super::raw::RawFilters;
use super::resolver::resolve;
use super::types::{FilterOperation, FilterValue};
use crate::query::{DateComparison, FilterQuery};

/// Maximum number of relation hops a dotted attribute may traverse.
///
/// Segments beyond this depth stay part of the leaf column (`a.b.c.d`
/// filters column `c.d` inside `a` → `b`).
pub const MAX_RELATION_DEPTH: usize = 2;

const DATE_FROM: &str = "date_from";
const DATE_TO: &str = "date_to";

/// An entity type that declares which of its attributes accept filtering.
pub trait Filterable {
    fn filterable_attributes(&self) -> &FilterableAttributes;

    /// Apply `filters` to `query` using this entity's declarations.
    fn apply_filter<'q, Q: FilterQuery>(
        &self,
        query: &'q mut Q,
        filters: &RawFilters,
    ) -> &'q mut Q {
        apply(self.filterable_attributes(), query, filters)
    }
}

impl Filterable for FilterableAttributes {
    fn filterable_attributes(&self) -> &FilterableAttributes {
        self
    }
}

/// `query.apply_filter(&entity, &filters)` on any query type.
pub trait ApplyFilterExt: FilterQuery + Sized {
    fn apply_filter<E: Filterable + ?Sized>(&mut self, entity: &E, filters: &RawFilters)
    -> &mut Self;
}

impl<Q: FilterQuery> ApplyFilterExt for Q {
    fn apply_filter<E: Filterable + ?Sized>(
        &mut self,
        entity: &E,
        filters: &RawFilters,
    ) -> &mut Self {
        apply(entity.filterable_attributes(), self, filters)
    }
}

/// Apply a raw filter map to `query`.
///
/// Entries are skipped, never rejected: null values, attributes that are
/// not literally declared, and attributes without an operation add nothing.
/// The same query is returned with zero or more constraints appended.
pub fn apply<'q, Q: FilterQuery>(
    attributes: &FilterableAttributes,
    query: &'q mut Q,
    filters: &RawFilters,
) -> &'q mut Q {
    let resolved = resolve(attributes, filters);

    for (attribute, entry) in &resolved {
        let attribute = attribute.as_str();
        if entry.value.is_null() {
            trace!(attribute, "null filter value; skipped");
            continue;
        }
        if !attributes.contains(attribute) {
            trace!(attribute, "attribute is not filterable; skipped");
            continue;
        }
        let Some(operation) = attributes.operation_of(attribute) else {
            debug!(attribute, "filterable attribute has no operation; skipped");
            continue;
        };

        debug!(attribute, %operation, "applying filter");
        let segments: Vec<&str> = attribute.split('.').collect();
        let hop_count = segments.len().saturating_sub(1).min(MAX_RELATION_DEPTH);
        let (relations, leaf) = segments.split_at(hop_count);
        let column = leaf.join(".");

        let hops: Vec<Hop<'_>> = relations
            .iter()
            .copied()
            .enumerate()
            .map(|(depth, relation)| Hop {
                relation,
                table: hop_table(attributes, attribute, relation, depth),
            })
            .collect();

        apply_through(query, &hops, &column, operation, &entry.value);
    }

    query
}

/// One relation boundary on the way to the leaf column.
struct Hop<'a> {
    relation: &'a str,
    table: Option<&'a str>,
}

/// Table declared for a relation hop.
///
/// The first hop prefers the table on the attribute's own record
/// (`author.created_at: {table: users}`); every hop falls back to the
/// record declared for the relation name itself.
fn hop_table<'a>(
    attributes: &'a FilterableAttributes,
    attribute: &str,
    relation: &str,
    depth: usize,
) -> Option<&'a str> {
    let own = if depth == 0 {
        attributes.get(attribute).and_then(|spec| spec.table())
    } else {
        None
    };
    own.or_else(|| attributes.nested_table(relation))
}

fn apply_through<Q: FilterQuery>(
    query: &mut Q,
    hops: &[Hop<'_>],
    column: &str,
    operation: FilterOperation,
    value: &FilterValue,
) {
    match hops.split_first() {
        None => apply_leaf(query, column, operation, value),
        Some((hop, rest)) => query.where_has(hop.relation, hop.table, |nested| {
            apply_through(nested, rest, column, operation, value);
        }),
    }
}

fn apply_leaf<Q: FilterQuery>(
    query: &mut Q,
    column: &str,
    operation: FilterOperation,
    value: &FilterValue,
) {
    match operation {
        FilterOperation::Like => query.where_like(column, value),
        FilterOperation::Equals => query.where_equals(column, value),
        FilterOperation::Between => match value.as_pair() {
            Some((low, high)) => query.where_between(column, low, high),
            None => debug!(column, "between filter needs exactly two values; skipped"),
        },
        FilterOperation::Date => match (value.field(DATE_FROM), value.field(DATE_TO)) {
            (Some(from), Some(to)) => query.where_between(column, from, to),
            (Some(from), None) => query.where_date(column, DateComparison::AtLeast, from),
            (None, Some(to)) => query.where_date(column, DateComparison::AtMost, to),
            (None, None) => debug!(column, "date filter has no bounds; skipped"),
        },
    }
}
