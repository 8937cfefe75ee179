//! SeaQuery-backed filter target.
//!
//! Leaf constraints become `WHERE` conditions on a `SelectStatement`;
//! relations become `EXISTS (SELECT 1 FROM related AS relation WHERE ...)`
//! subqueries, so filtering through a relation never duplicates rows.

use std::sync::Arc;

use sea_query::{
    Alias, Asterisk, Expr, Func, PostgresQueryBuilder, Query, QueryBuilder, SelectStatement,
    Values,
};

use super::relation::{Relation, RelationGraph};
use super::{DateComparison, FilterQuery};
use crate::filter::FilterValue;

/// A SELECT over one table that filters can be applied to.
#[derive(Debug, Clone)]
pub struct SelectQuery {
    statement: SelectStatement,
    /// Real table name, used to look relations up.
    table: String,
    /// Name columns are qualified with (the table, or the relation alias in subqueries).
    alias: String,
    /// Aliases of the enclosing queries, outermost first.
    enclosing: Vec<String>,
    relations: Arc<RelationGraph>,
}

impl SelectQuery {
    /// Start `SELECT table.* FROM table`.
    pub fn new(table: &str, relations: Arc<RelationGraph>) -> Self {
        let mut statement = Query::select();
        statement
            .column((Alias::new(table), Asterisk))
            .from(Alias::new(table));
        Self::from_statement(statement, table, relations)
    }

    /// Wrap a caller-built statement whose FROM clause is `table`.
    pub fn from_statement(
        statement: SelectStatement,
        table: &str,
        relations: Arc<RelationGraph>,
    ) -> Self {
        Self {
            statement,
            table: table.to_string(),
            alias: table.to_string(),
            enclosing: Vec::new(),
            relations,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn statement(&self) -> &SelectStatement {
        &self.statement
    }

    /// Mutable access for constraints the filter map does not cover
    /// (ordering, pagination, extra conditions).
    pub fn statement_mut(&mut self) -> &mut SelectStatement {
        &mut self.statement
    }

    pub fn into_statement(self) -> SelectStatement {
        self.statement
    }

    /// Render with values inlined, for any SeaQuery backend.
    pub fn to_sql<B: QueryBuilder>(&self, backend: B) -> String {
        self.statement.to_string(backend)
    }

    /// Render for PostgreSQL with values inlined.
    pub fn to_postgres(&self) -> String {
        self.to_sql(PostgresQueryBuilder)
    }

    /// Render for PostgreSQL with `$n` placeholders and the bound values.
    pub fn build_postgres(&self) -> (String, Values) {
        self.statement.build(PostgresQueryBuilder)
    }

    /// Column reference; a dotted leaf (`profiles.bio`) is taken as `table.column`.
    fn column_expr(&self, column: &str) -> Expr {
        match column.rsplit_once('.') {
            Some((qualifier, name)) => Expr::col((Alias::new(qualifier), Alias::new(name))),
            None => Expr::col((Alias::new(&self.alias), Alias::new(column))),
        }
    }

    /// Relation to use for `relation` on this table.
    ///
    /// Registered relations win. Without one, a declared table falls back to
    /// the belongs-to naming convention.
    fn relation_for(&self, relation: &str, table: Option<&str>) -> Option<Relation> {
        if let Some(registered) = self.relations.get(&self.table, relation) {
            if let Some(declared) = table
                && declared != registered.table
            {
                tracing::debug!(
                    relation,
                    declared,
                    registered = %registered.table,
                    "declared relation table differs from registered relation; using registered"
                );
            }
            return Some(registered.clone());
        }
        table.map(|t| Relation::conventional(relation, t))
    }

    /// Alias for a subquery over `relation` that shadows no enclosing name.
    ///
    /// The relation name is used as-is unless this query or one around it
    /// already goes by that name; then a depth suffix is added.
    fn subquery_alias(&self, relation: &str) -> String {
        let in_scope =
            |name: &str| name == self.alias || self.enclosing.iter().any(|outer| outer == name);
        if !in_scope(relation) {
            return relation.to_string();
        }
        let mut depth = self.enclosing.len() + 1;
        loop {
            let candidate = format!("{relation}_{depth}");
            if !in_scope(&candidate) {
                return candidate;
            }
            depth += 1;
        }
    }
}

impl FilterQuery for SelectQuery {
    fn where_equals(&mut self, column: &str, value: &FilterValue) {
        let Some(value) = bind_value(value) else {
            tracing::debug!(column, "equals filter value is not a scalar; skipped");
            return;
        };
        let condition = self.column_expr(column).eq(value);
        self.statement.and_where(condition);
    }

    fn where_like(&mut self, column: &str, needle: &FilterValue) {
        let Some(needle) = needle.as_string() else {
            tracing::debug!(column, "like filter value is not a scalar; skipped");
            return;
        };
        let condition = self
            .column_expr(column)
            .like(format!("%{}%", escape_like_wildcards(&needle)));
        self.statement.and_where(condition);
    }

    fn where_between(&mut self, column: &str, low: &FilterValue, high: &FilterValue) {
        let (Some(low), Some(high)) = (bind_value(low), bind_value(high)) else {
            tracing::debug!(column, "range bounds are not scalars; skipped");
            return;
        };
        let condition = self.column_expr(column).between(low, high);
        self.statement.and_where(condition);
    }

    fn where_date(&mut self, column: &str, comparison: DateComparison, value: &FilterValue) {
        let Some(value) = bind_value(value) else {
            tracing::debug!(column, "date filter value is not a scalar; skipped");
            return;
        };
        let date = Expr::expr(Func::cust(Alias::new("DATE")).arg(self.column_expr(column)));
        let condition = match comparison {
            DateComparison::AtLeast => date.gte(value),
            DateComparison::AtMost => date.lte(value),
        };
        self.statement.and_where(condition);
    }

    fn where_has<F>(&mut self, relation: &str, table: Option<&str>, scope: F)
    where
        F: FnOnce(&mut Self),
    {
        let Some(target) = self.relation_for(relation, table) else {
            tracing::error!(
                relation,
                table = %self.table,
                "relation is not registered and declares no table; restricting results"
            );
            // Restrict rather than widen query results
            self.statement.and_where(Expr::cust("FALSE"));
            return;
        };

        let alias = self.subquery_alias(relation);
        let mut subquery = Query::select();
        subquery
            .expr(Expr::val(1))
            .from_as(Alias::new(&target.table), Alias::new(&alias))
            .and_where(
                Expr::col((Alias::new(&alias), Alias::new(&target.related_key)))
                    .equals((Alias::new(&self.alias), Alias::new(&target.local_key))),
            );

        let mut enclosing = self.enclosing.clone();
        enclosing.push(self.alias.clone());
        let mut nested = SelectQuery {
            statement: subquery,
            table: target.table,
            alias,
            enclosing,
            relations: Arc::clone(&self.relations),
        };
        scope(&mut nested);

        self.statement.and_where(Expr::exists(nested.statement));
    }
}

/// Convert a scalar filter value into a bindable SQL value.
fn bind_value(value: &FilterValue) -> Option<sea_query::Value> {
    match value {
        FilterValue::String(s) => Some(s.clone().into()),
        FilterValue::Integer(i) => Some((*i).into()),
        FilterValue::Float(f) => Some((*f).into()),
        FilterValue::Bool(b) => Some((*b).into()),
        FilterValue::Null | FilterValue::List(_) | FilterValue::Record(_) => None,
    }
}

/// Escape SQL LIKE wildcard characters (`%`, `_`, `\`) in a value.
fn escape_like_wildcards(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
