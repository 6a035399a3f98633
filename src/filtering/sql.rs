//! Textual backend: a `WHERE` clause with `?` placeholders and the matching
//! positional values, ready for `Statement::from_sql_and_values`.

use sea_orm::Value;

use super::{
    coercion::{LIKE_ESCAPE, like_pattern},
    compiler::{Operand, QueryCompiler},
    spec::FilterSpec,
};
use crate::errors::QueryError;

/// Rendered clause text and its positional values, in placeholder order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlClause {
    clause: String,
    values: Vec<Value>,
}

impl SqlClause {
    #[must_use]
    pub fn new(clause: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            clause: clause.into(),
            values,
        }
    }

    #[must_use]
    pub fn clause(&self) -> &str {
        &self.clause
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    #[must_use]
    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.clause, self.values)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clause.is_empty()
    }

    /// Append another fragment, separated by a space
    #[must_use]
    pub fn join(mut self, other: Self) -> Self {
        if other.clause.is_empty() {
            return self;
        }
        if !self.clause.is_empty() {
            self.clause.push(' ');
        }
        self.clause.push_str(&other.clause);
        self.values.extend(other.values);
        self
    }
}

impl QueryCompiler<'_> {
    /// Render `spec` as `WHERE a = ? AND b LIKE ? ESCAPE '!' AND ...`.
    ///
    /// Every column is prefixed with `prefix` (for instance `"u."`). An empty
    /// spec yields an empty clause and no values. `is` filters render their
    /// literal inline and take no placeholder.
    pub fn compile_text(&self, spec: &FilterSpec, prefix: &str) -> Result<SqlClause, QueryError> {
        let planned = self.plan_filters(spec)?;
        if planned.is_empty() {
            return Ok(SqlClause::default());
        }

        let mut conditions = Vec::with_capacity(planned.len());
        let mut values = Vec::with_capacity(planned.len());

        for filter in planned {
            let column = filter.field.column(prefix);
            match filter.operand {
                Operand::Compare(comparison, value) => {
                    conditions.push(format!("{column} {} ?", comparison.sql()));
                    values.push(value);
                }
                Operand::In(members) => {
                    let placeholders = vec!["?"; members.len()].join(",");
                    conditions.push(format!("{column} IN ({placeholders})"));
                    values.extend(members);
                }
                Operand::Like(raw) => {
                    conditions.push(format!("{column} LIKE ? ESCAPE '{LIKE_ESCAPE}'"));
                    values.push(Value::from(like_pattern(&raw, true)));
                }
                Operand::Is(literal) => {
                    conditions.push(format!("{column} {}", literal.sql()));
                }
            }
        }

        let clause = format!("WHERE {}", conditions.join(" AND "));
        tracing::debug!(
            shape = self.shape().name,
            conditions = conditions.len(),
            params = values.len(),
            "Compiled filter clause"
        );
        Ok(SqlClause::new(clause, values))
    }
}
