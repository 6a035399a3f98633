//! # filtercrate
//!
//! Compile compact filter, sort and pagination tokens into either a
//! parameterized SQL fragment or a Sea-ORM [`Condition`](sea_orm::Condition)
//! tree, with field whitelisting, alias remapping and typed value coercion.
//!
//! ```rust,ignore
//! use filtercrate::{FieldDescriptor, FieldType, FilterSpec, QueryCompiler, RecordShape};
//!
//! static USER_FIELDS: [FieldDescriptor; 2] = [
//!     FieldDescriptor::new("id", FieldType::BigInteger).identity(),
//!     FieldDescriptor::new("name", FieldType::Text).alias("_name"),
//! ];
//! static USERS: RecordShape = RecordShape::new("users", &USER_FIELDS);
//!
//! let filter = FilterSpec::parse(["id:>=:10", "name:like:john"])?;
//! let sql = QueryCompiler::new(&USERS).compile_text(&filter, "")?;
//! assert_eq!(sql.clause(), "WHERE id >= ? AND _name LIKE ? ESCAPE '!'");
//! ```

pub mod config;
pub mod errors;
pub mod filtering;
pub mod models;
pub mod schema;

pub use config::QueryConfig;
pub use errors::{CoercionError, ParamKind, QueryError};
pub use filtering::{
    Dialect, Direction, FieldFunction, FieldPath, FilterSpec, FilterToken, IsLiteral, ListQuery,
    OffsetLimit, Operator, OrderClause, PaginationSpec, QueryCompiler, QueryRoot, SortSpec,
    SortToken, SqlClause,
};
pub use models::{ListParams, PageableResult};
pub use schema::{FieldDescriptor, FieldType, FieldTypeCache, RecordShape};
