//! Token grammar: `<field>:<operator>:<value>` for filters and
//! `<field>:<direction>` for sorting.

use sea_orm::Order;
use std::{fmt, str::FromStr};

use crate::errors::{ParamKind, QueryError};

/// Computed function applied to a field before comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldFunction {
    /// Character length of a text field
    Length,
    /// Element count of a multi-valued field
    Size,
}

impl FieldFunction {
    const ALL: [Self; 2] = [Self::Length, Self::Size];

    /// Name as written in a token, without the parentheses
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Length => "length",
            Self::Size => "size",
        }
    }

    /// SQL function the field is wrapped in
    #[must_use]
    pub const fn sql_name(self) -> &'static str {
        match self {
            Self::Length => "LENGTH",
            Self::Size => "CARDINALITY",
        }
    }
}

/// Dot-separated field reference with an optional trailing function
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
    function: Option<FieldFunction>,
}

impl FieldPath {
    /// Parse `a.b.c`, `name.length()` or `tags.size()`.
    ///
    /// Identifiers are restricted to ASCII letters, digits and underscores.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let (base, function) = FieldFunction::ALL
            .iter()
            .find_map(|function| {
                raw.strip_suffix("()")
                    .and_then(|rest| rest.strip_suffix(function.name()))
                    .and_then(|rest| rest.strip_suffix('.'))
                    .map(|base| (base, Some(*function)))
            })
            .unwrap_or((raw, None));

        if base.is_empty() {
            return Err("field name is empty".to_string());
        }
        if let Some(bad) = base
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '.'))
        {
            return Err(format!("illegal character `{bad}` in field name `{raw}`"));
        }

        let segments: Vec<String> = base.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(format!("empty path segment in field name `{raw}`"));
        }

        Ok(Self { segments, function })
    }

    /// First segment; the one checked against the permitted field set
    #[must_use]
    pub fn root(&self) -> &str {
        &self.segments[0]
    }

    /// Segments below the root
    #[must_use]
    pub fn nested(&self) -> &[String] {
        &self.segments[1..]
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    #[must_use]
    pub const fn function(&self) -> Option<FieldFunction> {
        self.function
    }

    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.segments.len() > 1
    }

    /// Segments joined with `.`, without the function suffix
    #[must_use]
    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted())?;
        if let Some(function) = self.function {
            write!(f, ".{}()", function.name())?;
        }
        Ok(())
    }
}

/// Filter operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    In,
    Is,
}

impl Operator {
    /// Parse an operator segment. Matching is case-insensitive and `!=` is
    /// accepted as a synonym of `<>`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "=" => Some(Self::Eq),
            "<>" | "!=" => Some(Self::Neq),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Gte),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Lte),
            "like" => Some(Self::Like),
            "in" => Some(Self::In),
            "is" => Some(Self::Is),
            _ => None,
        }
    }

    /// Canonical token spelling
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Neq => "<>",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Like => "like",
            Self::In => "in",
            Self::Is => "is",
        }
    }

    /// The scalar comparison this operator stands for, if any
    #[must_use]
    pub const fn comparison(self) -> Option<Comparison> {
        match self {
            Self::Eq => Some(Comparison::Eq),
            Self::Neq => Some(Comparison::Neq),
            Self::Gt => Some(Comparison::Gt),
            Self::Gte => Some(Comparison::Gte),
            Self::Lt => Some(Comparison::Lt),
            Self::Lte => Some(Comparison::Lte),
            Self::Like | Self::In | Self::Is => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Binary comparison taking one positional value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparison {
    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Neq => "<>",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
        }
    }

    /// The comparison with its operands swapped: `a > b` is `b < a`
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Eq => Self::Eq,
            Self::Neq => Self::Neq,
            Self::Gt => Self::Lt,
            Self::Gte => Self::Lte,
            Self::Lt => Self::Gt,
            Self::Lte => Self::Gte,
        }
    }
}

/// Value of an `is` filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IsLiteral {
    True,
    False,
    Null,
    NotNull,
}

impl IsLiteral {
    /// Exact, case-sensitive match
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "true" => Some(Self::True),
            "false" => Some(Self::False),
            "null" => Some(Self::Null),
            "not_null" => Some(Self::NotNull),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::True => "true",
            Self::False => "false",
            Self::Null => "null",
            Self::NotNull => "not_null",
        }
    }

    /// SQL rendered after the column; no positional value is needed
    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::True => "= true",
            Self::False => "= false",
            Self::Null => "IS NULL",
            Self::NotNull => "IS NOT NULL",
        }
    }

    /// Whether the literal compares against a boolean rather than nullness
    #[must_use]
    pub const fn is_boolean(self) -> bool {
        matches!(self, Self::True | Self::False)
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    /// Case-insensitive `asc` / `desc`
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.eq_ignore_ascii_case("asc") {
            Some(Self::Asc)
        } else if raw.eq_ignore_ascii_case("desc") {
            Some(Self::Desc)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl From<Direction> for Order {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Asc => Order::Asc,
            Direction::Desc => Order::Desc,
        }
    }
}

/// One parsed `<field>:<operator>:<value>` filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterToken {
    pub path: FieldPath,
    pub operator: Operator,
    /// Raw value; `;`-separated for `in`
    pub value: String,
    raw: String,
}

impl FilterToken {
    /// Parse a filter token.
    ///
    /// The token is split on the first two `:` only, so values may contain
    /// colons (timestamps, for instance). `is` literals are validated here.
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        let mut parts = raw.splitn(3, ':');
        let (Some(field), Some(operator), Some(value)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(QueryError::malformed(
                ParamKind::Filter,
                raw,
                "expected <field>:<operator>:<value>",
            ));
        };

        let path = FieldPath::parse(field)
            .map_err(|reason| QueryError::malformed(ParamKind::Filter, raw, reason))?;
        let operator = Operator::parse(operator).ok_or_else(|| QueryError::UnknownOperator {
            token: raw.to_string(),
            operator: operator.to_string(),
        })?;
        if operator == Operator::Is && IsLiteral::parse(value).is_none() {
            return Err(QueryError::InvalidIsLiteral {
                token: raw.to_string(),
                literal: value.to_string(),
            });
        }

        Ok(Self {
            path,
            operator,
            value: value.to_string(),
            raw: raw.to_string(),
        })
    }

    /// Build a token from parts, producing its canonical text
    pub fn new(field: &str, operator: Operator, value: impl fmt::Display) -> Result<Self, QueryError> {
        Self::parse(&format!("{field}:{}:{value}", operator.symbol()))
    }

    /// The token exactly as supplied
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Individual values of an `in` token
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.value.split(';')
    }
}

impl FromStr for FilterToken {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FilterToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// One parsed `<field>:<direction>` sort
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortToken {
    pub path: FieldPath,
    pub direction: Direction,
    raw: String,
}

impl SortToken {
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        let parts: Vec<&str> = raw.split(':').collect();
        let [field, direction] = parts.as_slice() else {
            return Err(QueryError::malformed(
                ParamKind::Sort,
                raw,
                "expected <field>:<direction>",
            ));
        };

        let path = FieldPath::parse(field)
            .map_err(|reason| QueryError::malformed(ParamKind::Sort, raw, reason))?;
        let direction = Direction::parse(direction).ok_or_else(|| QueryError::InvalidDirection {
            token: raw.to_string(),
            direction: (*direction).to_string(),
        })?;

        Ok(Self {
            path,
            direction,
            raw: raw.to_string(),
        })
    }

    pub fn new(field: &str, direction: Direction) -> Result<Self, QueryError> {
        Self::parse(&format!("{field}:{}", direction.as_str()))
    }

    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl FromStr for SortToken {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SortToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
