use sea_orm::{Order, sea_query::SimpleExpr};

use super::{
    compiler::QueryCompiler,
    conditions::{QueryRoot, target},
    spec::SortSpec,
};
use crate::errors::QueryError;

/// One `ORDER BY` term for the tree backend
#[derive(Debug, Clone, PartialEq)]
pub struct OrderClause {
    pub expr: SimpleExpr,
    pub order: Order,
}

impl OrderClause {
    #[must_use]
    pub fn into_parts(self) -> (SimpleExpr, Order) {
        (self.expr, self.order)
    }
}

impl QueryCompiler<'_> {
    /// Render `spec` as `ORDER BY a ASC, b DESC`, or an empty string when
    /// there are no sort tokens
    pub fn compile_sort_text(&self, spec: &SortSpec, prefix: &str) -> Result<String, QueryError> {
        let planned = self.plan_sorts(spec)?;
        if planned.is_empty() {
            return Ok(String::new());
        }

        let terms: Vec<String> = planned
            .iter()
            .map(|sort| format!("{} {}", sort.field.column(prefix), sort.direction.sql()))
            .collect();
        Ok(format!("ORDER BY {}", terms.join(", ")))
    }

    /// Order terms over `root`, in token order
    pub fn compile_order_list(
        &self,
        spec: &SortSpec,
        root: &QueryRoot,
    ) -> Result<Vec<OrderClause>, QueryError> {
        let planned = self.plan_sorts(spec)?;
        let clauses = planned
            .iter()
            .map(|sort| {
                Ok(OrderClause {
                    expr: target(&sort.field, root)?.into(),
                    order: sort.direction.into(),
                })
            })
            .collect::<Result<Vec<_>, QueryError>>()?;

        tracing::debug!(
            shape = self.shape().name,
            terms = clauses.len(),
            "Compiled order list"
        );
        Ok(clauses)
    }
}
