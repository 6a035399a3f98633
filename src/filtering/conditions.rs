//! Tree backend: compile a filter spec into a Sea-ORM [`Condition`].
//!
//! Columns are addressed as `"table"."column"`. Nested paths navigate
//! through joins registered on the [`QueryRoot`], keyed by the storage path
//! of every segment but the last:
//!
//! ```rust,ignore
//! let root = QueryRoot::new("users").join("address", "addr");
//! // address.city:=:Paris  ->  "addr"."city" = 'Paris'
//! ```
//!
//! Multi-valued fields compile to membership tests against the collection
//! (`'admin' = ANY("users"."roles")`) rather than comparisons of the
//! collection itself.

use sea_orm::{
    Condition, EntityName,
    sea_query::{Alias, Expr, Func, SimpleExpr},
};

use super::{
    compiler::{Operand, PlannedField, QueryCompiler},
    coercion::like_pattern,
    spec::FilterSpec,
    token::{Comparison, IsLiteral},
};
use crate::errors::QueryError;

/// Table a compiled condition is evaluated against, plus the aliases of
/// joined relations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRoot {
    table: String,
    joins: Vec<(String, String)>,
}

impl QueryRoot {
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            joins: Vec::new(),
        }
    }

    /// Root for a Sea-ORM entity's table
    #[must_use]
    pub fn for_entity<E: EntityName>(entity: E) -> Self {
        Self::new(entity.table_name())
    }

    /// Register the alias a relation path is joined under
    #[must_use]
    pub fn join(mut self, path: impl Into<String>, alias: impl Into<String>) -> Self {
        self.joins.push((path.into(), alias.into()));
        self
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Column expression for a path of storage names
    pub fn navigate(&self, columns: &[&str]) -> Result<Expr, String> {
        let Some((column, relation)) = columns.split_last() else {
            return Err("empty field path".to_string());
        };
        if relation.is_empty() {
            return Ok(Expr::col((Alias::new(&self.table), Alias::new(*column))));
        }

        let relation = relation.join(".");
        self.joins
            .iter()
            .find(|(path, _)| *path == relation)
            .map(|(_, alias)| Expr::col((Alias::new(alias), Alias::new(*column))))
            .ok_or_else(|| format!("no join registered for `{relation}`"))
    }
}

/// Per-token predicate before conjunction
enum Predicate {
    Expr(SimpleExpr),
    Any(Condition),
}

impl QueryCompiler<'_> {
    /// Compile `spec` into a condition over `root`.
    ///
    /// Predicates are grouped by storage field in first-seen order and
    /// combined with AND, so a field and its alias land in one group. An
    /// empty spec yields an empty `Condition::all()`, which matches every row.
    pub fn compile_condition(
        &self,
        spec: &FilterSpec,
        root: &QueryRoot,
    ) -> Result<Condition, QueryError> {
        let planned = self.plan_filters(spec)?;

        let mut groups: Vec<(String, Vec<Predicate>)> = Vec::new();
        for filter in &planned {
            let predicate = predicate(&filter.field, &filter.operand, root)?;
            let key = filter.field.columns.join(".");
            match groups.iter_mut().find(|(field, _)| *field == key) {
                Some((_, predicates)) => predicates.push(predicate),
                None => groups.push((key, vec![predicate])),
            }
        }

        let condition = groups
            .into_iter()
            .flat_map(|(_, predicates)| predicates)
            .fold(Condition::all(), |condition, predicate| match predicate {
                Predicate::Expr(expr) => condition.add(expr),
                Predicate::Any(any) => condition.add(any),
            });

        tracing::debug!(
            shape = self.shape().name,
            table = root.table(),
            predicates = condition.len(),
            "Compiled filter condition"
        );
        Ok(condition)
    }
}

/// Column expression for a planned field, wrapped in its function if any
pub(crate) fn target(field: &PlannedField<'_>, root: &QueryRoot) -> Result<Expr, QueryError> {
    let column = root
        .navigate(&field.columns)
        .map_err(|cause| QueryError::Resolution {
            token: field.token.to_string(),
            field: field.path.to_string(),
            field_type: field.type_name(),
            cause,
        })?;

    Ok(match field.function() {
        Some(function) => Expr::expr(Func::cust(Alias::new(function.sql_name())).arg(column)),
        None => column,
    })
}

fn compare(lhs: Expr, comparison: Comparison, rhs: impl Into<SimpleExpr>) -> SimpleExpr {
    match comparison {
        Comparison::Eq => lhs.eq(rhs),
        Comparison::Neq => lhs.ne(rhs),
        Comparison::Gt => lhs.gt(rhs),
        Comparison::Gte => lhs.gte(rhs),
        Comparison::Lt => lhs.lt(rhs),
        Comparison::Lte => lhs.lte(rhs),
    }
}

/// `value <op> ANY(collection)`, or `value <> ALL(collection)` for `<>`
fn membership(collection: Expr, comparison: Comparison, value: sea_orm::Value) -> SimpleExpr {
    let quantifier = if comparison == Comparison::Neq { "ALL" } else { "ANY" };
    let elements = Func::cust(Alias::new(quantifier)).arg(collection);
    compare(Expr::val(value), comparison.flipped(), elements)
}

fn predicate(
    field: &PlannedField<'_>,
    operand: &Operand,
    root: &QueryRoot,
) -> Result<Predicate, QueryError> {
    let column = target(field, root)?;
    let membership_field = field.is_membership();

    Ok(match operand {
        Operand::Compare(comparison, value) if membership_field => {
            Predicate::Expr(membership(column, *comparison, value.clone()))
        }
        Operand::Compare(comparison, value) => {
            Predicate::Expr(compare(column, *comparison, value.clone()))
        }
        Operand::In(values) if membership_field => Predicate::Any(values.iter().fold(
            Condition::any(),
            |any, value| any.add(membership(column.clone(), Comparison::Eq, value.clone())),
        )),
        Operand::In(values) => Predicate::Expr(column.is_in(values.iter().cloned())),
        Operand::Like(raw) => Predicate::Expr(column.like(like_pattern(raw, false))),
        Operand::Is(IsLiteral::True) => Predicate::Expr(column.eq(true)),
        Operand::Is(IsLiteral::False) => Predicate::Expr(column.eq(false)),
        Operand::Is(IsLiteral::Null) => Predicate::Expr(column.is_null()),
        Operand::Is(IsLiteral::NotNull) => Predicate::Expr(column.is_not_null()),
    })
}
