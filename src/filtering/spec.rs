//! Filter and sort specifications: ordered token lists plus an explicit
//! allow-list of fields not declared on the record shape.

use std::{collections::BTreeSet, fmt};

use super::token::{Direction, FilterToken, IsLiteral, Operator, SortToken};
use crate::{
    errors::QueryError,
    schema::{FieldDescriptor, FieldType, RecordShape},
};

/// Ordered filter tokens, combined with AND
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    tokens: Vec<FilterToken>,
    allow_list: BTreeSet<String>,
}

impl FilterSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse raw tokens in order. Empty strings are skipped.
    pub fn parse<I, S>(raw: I) -> Result<Self, QueryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tokens = raw
            .into_iter()
            .filter(|token| !token.as_ref().is_empty())
            .map(|token| FilterToken::parse(token.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_tokens(tokens))
    }

    #[must_use]
    pub fn from_tokens(tokens: Vec<FilterToken>) -> Self {
        Self {
            tokens,
            allow_list: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn builder() -> FilterBuilder {
        FilterBuilder::default()
    }

    /// Filter selecting live (`deleted == false`) or deleted records by the
    /// given soft-delete field.
    ///
    /// Boolean flags compile to `is:true`/`is:false`, any other type to
    /// `is:not_null`/`is:null`.
    pub fn soft_delete(field: &FieldDescriptor, deleted: bool) -> Result<Self, QueryError> {
        let literal = match (field.field_type, deleted) {
            (FieldType::Bool, true) => IsLiteral::True,
            (FieldType::Bool, false) => IsLiteral::False,
            (_, true) => IsLiteral::NotNull,
            (_, false) => IsLiteral::Null,
        };
        let token = FilterToken::new(field.name, Operator::Is, literal.as_str())?;
        Ok(Self::from_tokens(vec![token]))
    }

    /// Append the shape's soft-delete filter unless a token already
    /// references that field. Shapes without a soft-delete field are left
    /// unchanged.
    pub fn with_soft_delete(self, shape: &RecordShape, deleted: bool) -> Result<Self, QueryError> {
        let Some(field) = shape.soft_delete_field() else {
            tracing::debug!(shape = shape.name, "No soft-delete field declared");
            return Ok(self);
        };
        if self.tokens.iter().any(|token| field.matches(token.path.root())) {
            return Ok(self);
        }
        Ok(self.concat(Self::soft_delete(field, deleted)?))
    }

    /// Permit `field` even though the record shape does not declare it
    #[must_use]
    pub fn allow(mut self, field: impl Into<String>) -> Self {
        self.allow_list.insert(field.into());
        self
    }

    pub fn push(&mut self, token: FilterToken) {
        self.tokens.push(token);
    }

    /// Append `other`'s tokens, permitting every field they reference
    #[must_use]
    pub fn concat(mut self, other: Self) -> Self {
        self.allow_list.extend(other.allow_list);
        for token in other.tokens {
            self.allow_list.insert(token.path.root().to_string());
            self.tokens.push(token);
        }
        self
    }

    /// Whether any token's root segment is `field`
    #[must_use]
    pub fn references(&self, field: &str) -> bool {
        self.tokens.iter().any(|token| token.path.root() == field)
    }

    #[must_use]
    pub fn tokens(&self) -> &[FilterToken] {
        &self.tokens
    }

    #[must_use]
    pub const fn allow_list(&self) -> &BTreeSet<String> {
        &self.allow_list
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Collects filter conditions and renders them as canonical tokens
#[derive(Debug, Clone, Default)]
pub struct FilterBuilder {
    raw: Vec<String>,
    allow_list: Vec<String>,
}

impl FilterBuilder {
    fn condition(mut self, field: &str, operator: Operator, value: impl fmt::Display) -> Self {
        self.raw.push(format!("{field}:{}:{value}", operator.symbol()));
        self
    }

    #[must_use]
    pub fn equals(self, field: &str, value: impl fmt::Display) -> Self {
        self.condition(field, Operator::Eq, value)
    }

    #[must_use]
    pub fn not_equals(self, field: &str, value: impl fmt::Display) -> Self {
        self.condition(field, Operator::Neq, value)
    }

    #[must_use]
    pub fn greater(self, field: &str, value: impl fmt::Display) -> Self {
        self.condition(field, Operator::Gt, value)
    }

    #[must_use]
    pub fn greater_or_equals(self, field: &str, value: impl fmt::Display) -> Self {
        self.condition(field, Operator::Gte, value)
    }

    #[must_use]
    pub fn less(self, field: &str, value: impl fmt::Display) -> Self {
        self.condition(field, Operator::Lt, value)
    }

    #[must_use]
    pub fn less_or_equals(self, field: &str, value: impl fmt::Display) -> Self {
        self.condition(field, Operator::Lte, value)
    }

    /// Substring match
    #[must_use]
    pub fn like(self, field: &str, value: impl fmt::Display) -> Self {
        self.condition(field, Operator::Like, value)
    }

    #[must_use]
    pub fn in_values<I>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: fmt::Display,
    {
        let joined = values
            .into_iter()
            .map(|value| value.to_string())
            .collect::<Vec<_>>()
            .join(";");
        self.condition(field, Operator::In, joined)
    }

    #[must_use]
    pub fn is_true(self, field: &str) -> Self {
        self.condition(field, Operator::Is, IsLiteral::True.as_str())
    }

    #[must_use]
    pub fn is_false(self, field: &str) -> Self {
        self.condition(field, Operator::Is, IsLiteral::False.as_str())
    }

    #[must_use]
    pub fn is_null(self, field: &str) -> Self {
        self.condition(field, Operator::Is, IsLiteral::Null.as_str())
    }

    #[must_use]
    pub fn is_not_null(self, field: &str) -> Self {
        self.condition(field, Operator::Is, IsLiteral::NotNull.as_str())
    }

    #[must_use]
    pub fn allow(mut self, field: impl Into<String>) -> Self {
        self.allow_list.push(field.into());
        self
    }

    /// Parse the collected tokens
    pub fn build(self) -> Result<FilterSpec, QueryError> {
        let spec = FilterSpec::parse(&self.raw)?;
        Ok(self
            .allow_list
            .into_iter()
            .fold(spec, |spec, field| spec.allow(field)))
    }
}

/// Ordered sort tokens; earlier tokens take precedence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec {
    tokens: Vec<SortToken>,
    allow_list: BTreeSet<String>,
}

impl SortSpec {
    /// A spec that leaves the natural order untouched
    #[must_use]
    pub fn unsorted() -> Self {
        Self::default()
    }

    /// Parse raw tokens in order. Empty strings are skipped.
    pub fn parse<I, S>(raw: I) -> Result<Self, QueryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tokens = raw
            .into_iter()
            .filter(|token| !token.as_ref().is_empty())
            .map(|token| SortToken::parse(token.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_tokens(tokens))
    }

    #[must_use]
    pub fn from_tokens(tokens: Vec<SortToken>) -> Self {
        Self {
            tokens,
            allow_list: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn builder() -> SortBuilder {
        SortBuilder::default()
    }

    #[must_use]
    pub fn allow(mut self, field: impl Into<String>) -> Self {
        self.allow_list.insert(field.into());
        self
    }

    pub fn push(&mut self, token: SortToken) {
        self.tokens.push(token);
    }

    #[must_use]
    pub fn tokens(&self) -> &[SortToken] {
        &self.tokens
    }

    #[must_use]
    pub const fn allow_list(&self) -> &BTreeSet<String> {
        &self.allow_list
    }

    #[must_use]
    pub fn is_sorted(&self) -> bool {
        !self.tokens.is_empty()
    }

    #[must_use]
    pub fn is_unsorted(&self) -> bool {
        self.tokens.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SortBuilder {
    raw: Vec<String>,
}

impl SortBuilder {
    #[must_use]
    pub fn asc(self, field: &str) -> Self {
        self.by(field, Direction::Asc)
    }

    #[must_use]
    pub fn desc(self, field: &str) -> Self {
        self.by(field, Direction::Desc)
    }

    #[must_use]
    pub fn by(mut self, field: &str, direction: Direction) -> Self {
        self.raw.push(format!("{field}:{}", direction.as_str()));
        self
    }

    pub fn build(self) -> Result<SortSpec, QueryError> {
        SortSpec::parse(&self.raw)
    }
}
