//! # Query Compilation Errors
//!
//! Every failure the compiler can produce is a [`QueryError`]. All of them are
//! raised synchronously while compiling, before anything reaches the database,
//! and each one names the offending token or field verbatim so a client can
//! correct its request without server-side log inspection.
//!
//! `QueryError` implements axum's [`IntoResponse`], so handlers can return it
//! directly:
//!
//! ```rust,ignore
//! async fn list_users(
//!     Query(params): Query<ListParams>,
//! ) -> Result<Json<PageableResult<User>>, QueryError> {
//!     let query = ListQuery::from_params(params, &QueryConfig::default())?;
//!     // ...
//! }
//! ```
//!
//! Request errors become `400 Bad Request`. Configuration errors (an
//! unsupported pagination dialect) become `500 Internal Server Error` and are
//! logged through `tracing`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::{collections::BTreeSet, fmt};

/// Which list parameter a token belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Filter,
    Sort,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Filter => f.write_str("filter"),
            Self::Sort => f.write_str("sort"),
        }
    }
}

/// A raw value that could not be converted to the type of its field
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot convert `{raw}` to {target}: {cause}")]
pub struct CoercionError {
    /// The value as it appeared in the token
    pub raw: String,
    /// Name of the type the value was converted to
    pub target: String,
    /// Underlying parse failure
    pub cause: String,
}

impl CoercionError {
    pub fn new(raw: impl Into<String>, target: impl fmt::Display, cause: impl fmt::Display) -> Self {
        Self {
            raw: raw.into(),
            target: target.to_string(),
            cause: cause.to_string(),
        }
    }
}

/// Errors raised while parsing, validating or compiling list parameters
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// Wrong number of segments or illegal characters in a field name
    #[error("malformed {kind} token `{token}`: {reason}")]
    MalformedToken {
        kind: ParamKind,
        token: String,
        reason: String,
    },

    /// Fields that are neither declared on the record shape nor allow-listed.
    /// Always lists every offending field of the request, not just the first.
    #[error("disallowed {kind} fields: {}", join_fields(.fields))]
    DisallowedFields {
        kind: ParamKind,
        fields: BTreeSet<String>,
    },

    #[error("unknown operator `{operator}` in filter token `{token}`")]
    UnknownOperator { token: String, operator: String },

    #[error(
        "invalid IS value `{literal}` in filter token `{token}`, expected one of true, false, null, not_null"
    )]
    InvalidIsLiteral { token: String, literal: String },

    #[error("invalid value in filter token `{token}`: {source}")]
    Coercion {
        token: String,
        #[source]
        source: CoercionError,
    },

    /// A `length()`/`size()` suffix on a field that cannot carry it, or used
    /// with an operator that has no numeric meaning
    #[error("`{function}()` in token `{token}` is not supported on field `{field}` of type {field_type}")]
    UnsupportedFunction {
        token: String,
        function: String,
        field: String,
        field_type: String,
    },

    /// A field path that could not be navigated or typed
    #[error("cannot resolve field `{field}` of type {field_type} in token `{token}`: {cause}")]
    Resolution {
        token: String,
        field: String,
        field_type: String,
        cause: String,
    },

    #[error("invalid sort direction `{direction}` in sort token `{token}`, expected asc or desc")]
    InvalidDirection { token: String, direction: String },

    #[error("too many {kind} parameters: {count}, at most {limit} allowed")]
    TooManyParams {
        kind: ParamKind,
        count: usize,
        limit: usize,
    },

    #[error("value for filter field `{field}` is longer than {limit} characters")]
    ValueTooLong { field: String, limit: usize },

    #[error("invalid page size {size}, expected a positive size or -1 for unpaged")]
    InvalidPageSize { size: i64 },

    /// The page's row offset does not fit a signed 64-bit integer
    #[error("page {page} of size {size} is out of range")]
    InvalidPage { page: u64, size: u64 },

    #[error("unsupported pagination dialect `{dialect}`")]
    UnsupportedDialect { dialect: String },
}

fn join_fields(fields: &BTreeSet<String>) -> String {
    fields.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

impl QueryError {
    pub(crate) fn malformed(kind: ParamKind, token: &str, reason: impl Into<String>) -> Self {
        Self::MalformedToken {
            kind,
            token: token.to_string(),
            reason: reason.into(),
        }
    }

    /// HTTP status this error maps to
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UnsupportedDialect { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::MalformedToken { .. }
            | Self::DisallowedFields { .. }
            | Self::UnknownOperator { .. }
            | Self::InvalidIsLiteral { .. }
            | Self::Coercion { .. }
            | Self::UnsupportedFunction { .. }
            | Self::Resolution { .. }
            | Self::InvalidDirection { .. }
            | Self::TooManyParams { .. }
            | Self::ValueTooLong { .. }
            | Self::InvalidPageSize { .. }
            | Self::InvalidPage { .. } => StatusCode::BAD_REQUEST,
        }
    }

    /// Whether the error comes from server configuration rather than the request
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Field names for errors that concern a set of fields
    fn details(&self) -> Option<Vec<String>> {
        match self {
            Self::DisallowedFields { fields, .. } => Some(fields.iter().cloned().collect()),
            _ => None,
        }
    }
}

/// Error body sent to clients
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<String>>,
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.is_configuration_error() {
            tracing::error!(error = %self, "Query configuration error");
        } else {
            tracing::debug!(error = %self, status = %status, "Rejected list parameters");
        }

        let body = ErrorResponse {
            error: if self.is_configuration_error() {
                "Query could not be built".to_string()
            } else {
                self.to_string()
            },
            details: self.details(),
        };

        (status, Json(body)).into_response()
    }
}
