//! A complete list request: filter, sort and page, applied together.

use sea_orm::{QueryFilter, QueryOrder, QuerySelect};

use super::{
    compiler::QueryCompiler,
    conditions::QueryRoot,
    pagination::PaginationSpec,
    spec::{FilterSpec, SortSpec},
    sql::SqlClause,
};
use crate::{config::QueryConfig, errors::QueryError, models::ListParams};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub filter: FilterSpec,
    pub sort: SortSpec,
    pub pagination: PaginationSpec,
}

impl ListQuery {
    #[must_use]
    pub const fn new(filter: FilterSpec, sort: SortSpec, pagination: PaginationSpec) -> Self {
        Self {
            filter,
            sort,
            pagination,
        }
    }

    /// Parse request parameters
    pub fn from_params(params: ListParams, config: &QueryConfig) -> Result<Self, QueryError> {
        let (filter, sort, pagination) = params.into_specs(config)?;
        Ok(Self::new(filter, sort, pagination))
    }

    /// Add the filter, order and page window to a Sea-ORM select
    pub fn apply<S>(
        &self,
        compiler: &QueryCompiler<'_>,
        root: &QueryRoot,
        select: S,
    ) -> Result<S, QueryError>
    where
        S: QueryFilter + QueryOrder + QuerySelect,
    {
        let condition = compiler.compile_condition(&self.filter, root)?;
        let order = compiler.compile_order_list(&self.sort, root)?;

        let select = order
            .into_iter()
            .fold(select.filter(condition), |select, clause| {
                select.order_by(clause.expr, clause.order)
            });
        self.pagination.apply(select)
    }

    /// Full `WHERE ... ORDER BY ... <window>` text with positional values.
    ///
    /// The window is rendered in the compiler's dialect. A paged request on a
    /// compiler without a dialect fails with [`QueryError::UnsupportedDialect`].
    pub fn to_sql(&self, compiler: &QueryCompiler<'_>, prefix: &str) -> Result<SqlClause, QueryError> {
        let filter = compiler.compile_text(&self.filter, prefix)?;
        let order = compiler.compile_sort_text(&self.sort, prefix)?;
        let window = if self.pagination.is_unpaged() {
            String::new()
        } else {
            let dialect = compiler.dialect().ok_or_else(|| QueryError::UnsupportedDialect {
                dialect: "none configured".to_string(),
            })?;
            self.pagination.to_sql(dialect)?
        };

        Ok(filter
            .join(SqlClause::new(order, Vec::new()))
            .join(SqlClause::new(window, Vec::new())))
    }
}
