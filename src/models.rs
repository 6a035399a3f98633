use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_with::{StringWithSeparator, formats::CommaSeparator, serde_as};
use utoipa::{IntoParams, ToSchema};

use crate::{
    config::QueryConfig,
    errors::QueryError,
    filtering::{FilterSpec, PaginationSpec, SortSpec},
};

/// Query parameters for filtering, sorting and paginating a list endpoint.
///
/// # Filtering
/// `filter` is a comma-separated list of `<field>:<operator>:<value>` tokens,
/// combined with AND:
/// ```text
/// ?filter=age:>=:18,name:like:john,id:in:1;2;3,deleted_at:is:null
/// ```
///
/// # Sorting
/// `sort` is a comma-separated list of `<field>:<direction>` tokens; earlier
/// tokens take precedence:
/// ```text
/// ?sort=created_at:desc,name:asc
/// ```
///
/// # Pagination
/// `page` is zero-based. `size` defaults to the configured page size; `-1`
/// returns every row.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Filter tokens, comma-separated.
    ///
    /// Example: `age:>=:18,name:like:john`
    #[serde(default)]
    #[serde_as(as = "StringWithSeparator::<CommaSeparator, String>")]
    #[param(example = "age:>=:18,name:like:john")]
    pub filter: Vec<String>,
    /// Sort tokens, comma-separated.
    ///
    /// Example: `created_at:desc,name:asc`
    #[serde(default)]
    #[serde_as(as = "StringWithSeparator::<CommaSeparator, String>")]
    #[param(example = "created_at:desc,name:asc")]
    pub sort: Vec<String>,
    /// Zero-based page index.
    ///
    /// Example: `0`
    #[param(example = 0)]
    pub page: Option<u64>,
    /// Rows per page, `-1` for all rows.
    ///
    /// Example: `10`
    #[param(example = 10)]
    pub size: Option<i64>,
}

impl ListParams {
    /// Parse every parameter, failing on the first invalid one
    pub fn into_specs(
        self,
        config: &QueryConfig,
    ) -> Result<(FilterSpec, SortSpec, PaginationSpec), QueryError> {
        let filter = FilterSpec::parse(&self.filter)?;
        let sort = SortSpec::parse(&self.sort)?;
        let pagination =
            PaginationSpec::from_request(self.page, self.size, config.default_page_size)?;
        Ok((filter, sort, pagination))
    }
}

/// One page of records with the total count across all pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PageableResult<T> {
    data: Vec<T>,
    count: u64,
    page_count: u64,
    page_size: u64,
}

impl<T> PageableResult<T> {
    /// Wrap a page, deriving the page count from `count` and `page_size`
    #[must_use]
    pub fn of(data: Vec<T>, count: u64, page_size: u64) -> Self {
        Self {
            data,
            count,
            page_count: Self::count_pages(count, page_size),
            page_size,
        }
    }

    /// Wrap a page whose page count is already known
    #[must_use]
    pub const fn from_parts(data: Vec<T>, count: u64, page_count: u64, page_size: u64) -> Self {
        Self {
            data,
            count,
            page_count,
            page_size,
        }
    }

    /// Wrap the page a [`PaginationSpec`] selected. Unpaged requests form a
    /// single page holding all `count` rows.
    #[must_use]
    pub fn from_pagination(data: Vec<T>, count: u64, pagination: &PaginationSpec) -> Self {
        Self::of(data, count, pagination.size().unwrap_or(count))
    }

    /// `ceil(count / page_size)`; a zero page size means everything fits on
    /// one page
    #[must_use]
    pub const fn count_pages(count: u64, page_size: u64) -> u64 {
        if page_size == 0 {
            return if count == 0 { 0 } else { 1 };
        }
        count.div_ceil(page_size)
    }

    #[must_use]
    pub fn map<R, F>(self, f: F) -> PageableResult<R>
    where
        F: FnMut(T) -> R,
    {
        PageableResult {
            data: self.data.into_iter().map(f).collect(),
            count: self.count,
            page_count: self.page_count,
            page_size: self.page_size,
        }
    }

    #[must_use]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    #[must_use]
    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    #[must_use]
    pub const fn page_count(&self) -> u64 {
        self.page_count
    }

    #[must_use]
    pub const fn page_size(&self) -> u64 {
        self.page_size
    }
}

impl<T: Serialize> IntoResponse for PageableResult<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_pages() {
        assert_eq!(PageableResult::<()>::count_pages(105, 10), 11);
        assert_eq!(PageableResult::<()>::count_pages(100, 10), 10);
        assert_eq!(PageableResult::<()>::count_pages(0, 10), 0);
        assert_eq!(PageableResult::<()>::count_pages(7, 0), 1);
    }

    #[test]
    fn test_page_count_is_fixed_at_construction() {
        let page = PageableResult::of(vec![1, 2, 3], 23, 3);
        assert_eq!(page.page_count(), 8);
        let mapped = page.map(|n| n * 10);
        assert_eq!(mapped.data(), [10, 20, 30]);
        assert_eq!(mapped.page_count(), 8);
    }

    #[test]
    fn test_from_unpaged_pagination() {
        let page = PageableResult::from_pagination(vec!['a'; 4], 4, &PaginationSpec::unpaged());
        assert_eq!((page.page_size(), page.page_count()), (4, 1));
    }

    #[test]
    fn test_serialized_shape() {
        let page = PageableResult::of(vec!["x"], 1, 10);
        assert_eq!(
            serde_json::to_value(&page).unwrap(),
            serde_json::json!({"data": ["x"], "count": 1, "page_count": 1, "page_size": 10})
        );
    }

    #[test]
    fn test_into_specs() {
        let params = ListParams {
            filter: vec!["age:>:18".to_string()],
            sort: vec!["age:desc".to_string()],
            page: Some(2),
            size: None,
        };
        let (filter, sort, pagination) = params.into_specs(&QueryConfig::default()).unwrap();
        assert_eq!(filter.len(), 1);
        assert!(sort.is_sorted());
        assert_eq!(pagination.size(), Some(10));
        assert_eq!(pagination.page(), 2);
    }

    #[test]
    fn test_into_specs_rejects_bad_size() {
        let params = ListParams {
            size: Some(-3),
            ..ListParams::default()
        };
        assert_eq!(
            params.into_specs(&QueryConfig::default()).unwrap_err(),
            QueryError::InvalidPageSize { size: -3 }
        );
    }
}
