use sea_orm::{DatabaseBackend, QuerySelect};
use serde::{Deserialize, Serialize};
use std::{fmt, num::NonZeroU64, str::FromStr};

use crate::{config::DEFAULT_PAGE_SIZE, errors::QueryError};

/// Requested page size meaning "return every row"
pub const UNPAGED_SIZE: i64 = -1;

/// SQL dialect used for rendering a pagination window as text.
///
/// Serialized as [`Dialect::name`] and deserialized through [`FromStr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Dialect {
    Postgres,
    MySql,
    MariaDb,
    Sqlite,
    H2,
    Oracle,
    SqlServer,
    Db2,
    /// Any database without a known window syntax
    Other,
}

impl Dialect {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
            Self::MariaDb => "mariadb",
            Self::Sqlite => "sqlite",
            Self::H2 => "h2",
            Self::Oracle => "oracle",
            Self::SqlServer => "sql_server",
            Self::Db2 => "db2",
            Self::Other => "other",
        }
    }

    /// Render a window of `limit` rows starting at `offset`
    pub fn render_window(self, offset: u64, limit: u64) -> Result<String, QueryError> {
        match self {
            Self::Postgres | Self::MySql | Self::MariaDb | Self::Sqlite | Self::H2 => {
                Ok(format!("LIMIT {limit} OFFSET {offset}"))
            }
            Self::Oracle | Self::SqlServer => {
                Ok(format!("OFFSET {offset} ROWS FETCH NEXT {limit} ROWS ONLY"))
            }
            Self::Db2 => Ok(format!("OFFSET {offset} ROWS FETCH FIRST {limit} ROWS ONLY")),
            Self::Other => Err(QueryError::UnsupportedDialect {
                dialect: self.name().to_string(),
            }),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = QueryError;

    /// Case-insensitive; a few common spellings are accepted
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "mysql" => Ok(Self::MySql),
            "mariadb" => Ok(Self::MariaDb),
            "sqlite" => Ok(Self::Sqlite),
            "h2" => Ok(Self::H2),
            "oracle" => Ok(Self::Oracle),
            "sql_server" | "sqlserver" | "mssql" => Ok(Self::SqlServer),
            "db2" => Ok(Self::Db2),
            _ => Err(QueryError::UnsupportedDialect {
                dialect: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Dialect {
    type Error = QueryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Dialect> for String {
    fn from(dialect: Dialect) -> Self {
        dialect.name().to_string()
    }
}

impl From<DatabaseBackend> for Dialect {
    fn from(backend: DatabaseBackend) -> Self {
        match backend {
            DatabaseBackend::Postgres => Self::Postgres,
            DatabaseBackend::MySql => Self::MySql,
            DatabaseBackend::Sqlite => Self::Sqlite,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageSize {
    Limited(NonZeroU64),
    Unpaged,
}

/// Offset and limit derived from a page request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OffsetLimit {
    /// No limiting at all
    Unlimited,
    Window { offset: u64, limit: u64 },
}

impl OffsetLimit {
    #[must_use]
    pub const fn offset(self) -> Option<u64> {
        match self {
            Self::Unlimited => None,
            Self::Window { offset, .. } => Some(offset),
        }
    }

    #[must_use]
    pub const fn limit(self) -> Option<u64> {
        match self {
            Self::Unlimited => None,
            Self::Window { limit, .. } => Some(limit),
        }
    }
}

/// Zero-based page index and page size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PaginationSpec {
    page: u64,
    size: PageSize,
}

impl Default for PaginationSpec {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE).unwrap_or_else(|_| Self::unpaged())
    }
}

impl PaginationSpec {
    /// Page `page` of `size` rows. A size of zero is rejected.
    pub fn new(page: u64, size: u64) -> Result<Self, QueryError> {
        let size = NonZeroU64::new(size).ok_or(QueryError::InvalidPageSize { size: 0 })?;
        Ok(Self {
            page,
            size: PageSize::Limited(size),
        })
    }

    /// Every row, no offset
    #[must_use]
    pub const fn unpaged() -> Self {
        Self {
            page: 0,
            size: PageSize::Unpaged,
        }
    }

    /// Build from request parameters, where a missing size falls back to
    /// `default_size` and a size of `-1` means unpaged
    pub fn from_request(
        page: Option<u64>,
        size: Option<i64>,
        default_size: u64,
    ) -> Result<Self, QueryError> {
        let page = page.unwrap_or(0);
        match size {
            None => Self::new(page, default_size),
            Some(UNPAGED_SIZE) => Ok(Self {
                page,
                size: PageSize::Unpaged,
            }),
            Some(size) => u64::try_from(size)
                .ok()
                .and_then(NonZeroU64::new)
                .map(|limit| Self {
                    page,
                    size: PageSize::Limited(limit),
                })
                .ok_or(QueryError::InvalidPageSize { size }),
        }
    }

    #[must_use]
    pub const fn page(&self) -> u64 {
        self.page
    }

    /// Page size, `None` when unpaged
    #[must_use]
    pub const fn size(&self) -> Option<u64> {
        match self.size {
            PageSize::Limited(size) => Some(size.get()),
            PageSize::Unpaged => None,
        }
    }

    #[must_use]
    pub const fn is_unpaged(&self) -> bool {
        matches!(self.size, PageSize::Unpaged)
    }

    /// Offset and limit of the page. Fails when either does not fit a
    /// signed 64-bit integer.
    pub fn to_offset_limit(&self) -> Result<OffsetLimit, QueryError> {
        let PageSize::Limited(size) = self.size else {
            return Ok(OffsetLimit::Unlimited);
        };
        let limit = size.get();
        self.page
            .checked_mul(limit)
            .filter(|offset| i64::try_from(*offset).is_ok() && i64::try_from(limit).is_ok())
            .map(|offset| OffsetLimit::Window { offset, limit })
            .ok_or(QueryError::InvalidPage {
                page: self.page,
                size: limit,
            })
    }

    /// Window text for `dialect`; empty when unpaged
    pub fn to_sql(&self, dialect: Dialect) -> Result<String, QueryError> {
        match self.to_offset_limit()? {
            OffsetLimit::Unlimited => Ok(String::new()),
            OffsetLimit::Window { offset, limit } => dialect.render_window(offset, limit),
        }
    }

    /// Restrict a Sea-ORM select to this page
    pub fn apply<S: QuerySelect>(&self, select: S) -> Result<S, QueryError> {
        Ok(match self.to_offset_limit()? {
            OffsetLimit::Unlimited => select,
            OffsetLimit::Window { offset, limit } => select.offset(offset).limit(limit),
        })
    }
}
