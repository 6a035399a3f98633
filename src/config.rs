//! # Compiler Configuration
//!
//! [`QueryConfig`] carries the per-application limits the compiler enforces.
//! It deserializes from any serde source with every field optional:
//!
//! ```rust,ignore
//! let config: QueryConfig = serde_json::from_str(r#"{
//!     "max_filter_params": 20,
//!     "default_page_size": 25,
//!     "dialect": "postgres"
//! }"#)?;
//! ```

use serde::{Deserialize, Serialize};

use crate::filtering::Dialect;

/// Raw filter values above this many characters are rejected
pub const DEFAULT_MAX_VALUE_LENGTH: usize = 10_000;

pub const DEFAULT_PAGE_SIZE: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Maximum number of filter tokens per request, unlimited when `None`
    pub max_filter_params: Option<usize>,
    /// Maximum number of sort tokens per request, unlimited when `None`
    pub max_sort_params: Option<usize>,
    pub max_value_length: usize,
    /// Page size used when a request does not name one
    pub default_page_size: u64,
    /// Dialect for textual pagination; callers may also pass one explicitly
    pub dialect: Option<Dialect>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_filter_params: None,
            max_sort_params: None,
            max_value_length: DEFAULT_MAX_VALUE_LENGTH,
            default_page_size: DEFAULT_PAGE_SIZE,
            dialect: None,
        }
    }
}

impl QueryConfig {
    #[must_use]
    pub const fn with_max_filter_params(mut self, limit: usize) -> Self {
        self.max_filter_params = Some(limit);
        self
    }

    #[must_use]
    pub const fn with_max_sort_params(mut self, limit: usize) -> Self {
        self.max_sort_params = Some(limit);
        self
    }

    #[must_use]
    pub const fn with_max_value_length(mut self, limit: usize) -> Self {
        self.max_value_length = limit;
        self
    }

    #[must_use]
    pub const fn with_default_page_size(mut self, size: u64) -> Self {
        self.default_page_size = size;
        self
    }

    #[must_use]
    pub const fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }
}
