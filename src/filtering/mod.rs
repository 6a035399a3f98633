//! # Filtering, Sorting & Pagination
//!
//! Compact string tokens in, typed query representations out.
//!
//! ## Token grammar
//!
//! ```text
//! filter: <field>:<operator>:<value>     e.g. age:>=:18, name:like:john, id:in:1;2;3
//! sort:   <field>:<direction>            e.g. created_at:desc
//! ```
//!
//! Operators are `=`, `<>` (or `!=`), `<`, `<=`, `>`, `>=`, `like`, `in` and
//! `is`. `is` takes exactly `true`, `false`, `null` or `not_null`. Fields may
//! use dot-notation (`address.city`) and may end in a computed function
//! (`name.length()`, `tags.size()`).
//!
//! ## Pipeline
//!
//! 1. [`token`] parses raw strings into [`FilterToken`]/[`SortToken`]
//! 2. [`security`] checks every field against the record shape and allow-list
//!    and rewrites aliases to storage names
//! 3. [`coercion`] converts raw values to the field's declared type
//! 4. one of the backends renders the result:
//!    - [`sql`]: `WHERE ... AND ...` text plus positional values
//!    - [`conditions`]: a Sea-ORM [`Condition`](sea_orm::Condition) tree
//!    - [`sort`]: `ORDER BY` text or an ordered list of [`OrderClause`]
//!    - [`pagination`]: offset/limit and dialect-specific window text
//!
//! ## Usage
//!
//! ```rust,ignore
//! let filter = FilterSpec::parse(["age:>=:18", "roles:in:admin;owner"])?;
//! let sort = SortSpec::parse(["name:asc"])?;
//!
//! let compiler = QueryCompiler::new(&USERS);
//! let sql = compiler.compile_text(&filter, "u.")?;
//! let condition = compiler.compile_condition(&filter, &QueryRoot::new("users"))?;
//! let order = compiler.compile_order_list(&sort, &QueryRoot::new("users"))?;
//! ```

pub mod coercion;
pub mod compiler;
pub mod conditions;
pub mod pagination;
pub mod query;
pub mod security;
pub mod sort;
pub mod spec;
pub mod sql;
pub mod token;

pub use compiler::QueryCompiler;
pub use conditions::QueryRoot;
pub use pagination::{Dialect, OffsetLimit, PaginationSpec};
pub use query::ListQuery;
pub use sort::OrderClause;
pub use spec::{FilterBuilder, FilterSpec, SortBuilder, SortSpec};
pub use sql::SqlClause;
pub use token::{
    Comparison, Direction, FieldFunction, FieldPath, FilterToken, IsLiteral, Operator, SortToken,
};
