//! Shared front half of every backend: limits, whitelisting, path typing and
//! value coercion. Backends consume the resulting plans and only decide how
//! to render them.

use sea_orm::{DatabaseBackend, Value};

use super::{
    coercion::coerce,
    pagination::Dialect,
    security::{self, ResolvedPath},
    spec::{FilterSpec, SortSpec},
    token::{Comparison, Direction, FieldFunction, FieldPath, IsLiteral, Operator},
};
use crate::{
    config::QueryConfig,
    errors::{CoercionError, ParamKind, QueryError},
    schema::{FieldDescriptor, FieldType, FieldTypeCache, RecordShape, ResolvedField},
};

/// Compiles filter and sort specs against one record shape
#[derive(Debug, Clone)]
pub struct QueryCompiler<'a> {
    shape: &'a RecordShape,
    config: QueryConfig,
    cache: Option<&'a FieldTypeCache>,
}

impl<'a> QueryCompiler<'a> {
    #[must_use]
    pub fn new(shape: &'a RecordShape) -> Self {
        Self {
            shape,
            config: QueryConfig::default(),
            cache: None,
        }
    }

    /// Compiler whose textual pagination follows the given backend's dialect
    #[must_use]
    pub fn for_backend(shape: &'a RecordShape, backend: DatabaseBackend) -> Self {
        Self::new(shape).with_config(QueryConfig::default().with_dialect(backend.into()))
    }

    #[must_use]
    pub fn with_config(mut self, config: QueryConfig) -> Self {
        self.config = config;
        self
    }

    /// Memoize nested path resolution in a shared cache
    #[must_use]
    pub const fn with_cache(mut self, cache: &'a FieldTypeCache) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub const fn shape(&self) -> &'a RecordShape {
        self.shape
    }

    #[must_use]
    pub const fn config(&self) -> &QueryConfig {
        &self.config
    }

    #[must_use]
    pub const fn dialect(&self) -> Option<Dialect> {
        self.config.dialect
    }

    pub(crate) fn plan_filters<'s>(
        &self,
        spec: &'s FilterSpec,
    ) -> Result<Vec<PlannedFilter<'s>>, QueryError> {
        check_count(ParamKind::Filter, spec.len(), self.config.max_filter_params)?;

        let limit = self.config.max_value_length;
        if let Some(token) = spec
            .tokens()
            .iter()
            .find(|token| token.value.chars().count() > limit)
        {
            return Err(QueryError::ValueTooLong {
                field: token.path.to_string(),
                limit,
            });
        }

        let resolved = security::resolve(
            ParamKind::Filter,
            spec.tokens().iter().map(|token| &token.path),
            self.shape.fields,
            spec.allow_list(),
        )?;

        spec.tokens()
            .iter()
            .zip(resolved)
            .map(|(token, resolved)| -> Result<PlannedFilter<'s>, QueryError> {
                let field = self.type_field(token.raw(), resolved)?;
                field.check_function(Some(token.operator))?;
                let operand = field.operand(token.operator, &token.value)?;
                Ok(PlannedFilter { field, operand })
            })
            .collect()
    }

    pub(crate) fn plan_sorts<'s>(
        &self,
        spec: &'s SortSpec,
    ) -> Result<Vec<PlannedSort<'s>>, QueryError> {
        check_count(ParamKind::Sort, spec.len(), self.config.max_sort_params)?;

        let resolved = security::resolve(
            ParamKind::Sort,
            spec.tokens().iter().map(|token| &token.path),
            self.shape.fields,
            spec.allow_list(),
        )?;

        spec.tokens()
            .iter()
            .zip(resolved)
            .map(|(token, resolved)| -> Result<PlannedSort<'s>, QueryError> {
                let field = self.type_field(token.raw(), resolved)?;
                field.check_function(None)?;
                Ok(PlannedSort {
                    field,
                    direction: token.direction,
                })
            })
            .collect()
    }

    /// Attach storage segments and the declared type to a whitelisted path
    fn type_field<'s>(
        &self,
        token: &'s str,
        resolved: ResolvedPath<'s>,
    ) -> Result<PlannedField<'s>, QueryError> {
        let path = resolved.requested;
        let mut columns = vec![resolved.root];

        let Some(descriptor) = resolved.descriptor else {
            columns.extend(path.nested().iter().map(String::as_str));
            return Ok(PlannedField {
                token,
                path,
                columns,
                field_type: None,
            });
        };

        let field_type = if path.is_nested() {
            let nested = self
                .resolve_nested(descriptor, path)
                .map_err(|cause| QueryError::Resolution {
                    token: token.to_string(),
                    field: path.to_string(),
                    field_type: descriptor.field_type.to_string(),
                    cause,
                })?;
            columns.extend(nested.storage);
            nested.field_type
        } else {
            descriptor.field_type
        };

        if matches!(field_type, FieldType::Relation(_)) && path.function().is_none() {
            return Err(QueryError::Resolution {
                token: token.to_string(),
                field: path.to_string(),
                field_type: field_type.to_string(),
                cause: "a related record must be followed by one of its fields".to_string(),
            });
        }

        Ok(PlannedField {
            token,
            path,
            columns,
            field_type: Some(field_type),
        })
    }

    fn resolve_nested(
        &self,
        root: &'static FieldDescriptor,
        path: &FieldPath,
    ) -> Result<ResolvedField, String> {
        let resolve = || root.resolve_nested(path.nested());
        match self.cache {
            Some(cache) => cache.get_or_resolve(root, &path.nested().join("."), resolve),
            None => resolve(),
        }
    }
}

fn check_count(kind: ParamKind, count: usize, limit: Option<usize>) -> Result<(), QueryError> {
    match limit {
        Some(limit) if count > limit => Err(QueryError::TooManyParams { kind, count, limit }),
        _ => Ok(()),
    }
}

/// A whitelisted, typed field reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlannedField<'s> {
    /// Originating token, verbatim
    pub token: &'s str,
    pub path: &'s FieldPath,
    /// Storage name of every path segment
    pub columns: Vec<&'s str>,
    /// `None` when the field was admitted through the allow-list only
    pub field_type: Option<FieldType>,
}

impl PlannedField<'_> {
    pub fn function(&self) -> Option<FieldFunction> {
        self.path.function()
    }

    /// Whether the comparison targets the elements of a collection
    pub fn is_membership(&self) -> bool {
        self.function().is_none() && self.field_type.is_some_and(|t| t.is_multi_valued())
    }

    pub fn type_name(&self) -> String {
        self.field_type
            .map_or_else(|| "untyped".to_string(), |field_type| field_type.to_string())
    }

    /// `<prefix>a.b`, wrapped in the function call when one is present
    pub fn column(&self, prefix: &str) -> String {
        let column = format!("{prefix}{}", self.columns.join("."));
        match self.function() {
            Some(function) => format!("{}({column})", function.sql_name()),
            None => column,
        }
    }

    /// `length()` needs a text field, `size()` a multi-valued one, and both
    /// only make sense under a comparison or `in`
    fn check_function(&self, operator: Option<Operator>) -> Result<(), QueryError> {
        let Some(function) = self.function() else {
            return Ok(());
        };

        let type_fits = match (function, self.field_type) {
            (_, None) => true,
            (FieldFunction::Length, Some(field_type)) => field_type.is_text(),
            (FieldFunction::Size, Some(field_type)) => field_type.is_multi_valued(),
        };
        let operator_fits = operator
            .is_none_or(|operator| operator.comparison().is_some() || operator == Operator::In);

        if type_fits && operator_fits {
            Ok(())
        } else {
            Err(QueryError::UnsupportedFunction {
                token: self.token.to_string(),
                function: function.name().to_string(),
                field: self.path.dotted(),
                field_type: self.type_name(),
            })
        }
    }

    /// Type raw values are coerced to: counts for functions, the declared
    /// type otherwise, text for untyped fields
    fn value_type(&self) -> Option<FieldType> {
        if self.function().is_some() {
            Some(FieldType::BigInteger)
        } else {
            self.field_type
        }
    }

    fn coerce(&self, raw: &str) -> Result<Value, QueryError> {
        match self.value_type() {
            Some(target) => coerce(raw, target).map_err(|source| self.coercion(source)),
            None => Ok(Value::from(raw.to_string())),
        }
    }

    fn coercion(&self, source: CoercionError) -> QueryError {
        QueryError::Coercion {
            token: self.token.to_string(),
            source,
        }
    }

    fn compare(&self, comparison: Comparison, raw: &str) -> Result<Operand, QueryError> {
        Ok(Operand::Compare(comparison, self.coerce(raw)?))
    }

    fn operand(&self, operator: Operator, raw: &str) -> Result<Operand, QueryError> {
        match operator {
            Operator::Eq => self.compare(Comparison::Eq, raw),
            Operator::Neq => self.compare(Comparison::Neq, raw),
            Operator::Gt => self.compare(Comparison::Gt, raw),
            Operator::Gte => self.compare(Comparison::Gte, raw),
            Operator::Lt => self.compare(Comparison::Lt, raw),
            Operator::Lte => self.compare(Comparison::Lte, raw),
            Operator::In => raw
                .split(';')
                .map(|value| self.coerce(value))
                .collect::<Result<Vec<_>, _>>()
                .map(Operand::In),
            Operator::Like => match self.field_type {
                None | Some(FieldType::Text | FieldType::Enum(_)) => {
                    Ok(Operand::Like(raw.to_string()))
                }
                Some(field_type) => Err(self.coercion(CoercionError::new(
                    raw,
                    field_type,
                    "like needs a text field",
                ))),
            },
            Operator::Is => {
                let literal = IsLiteral::parse(raw).ok_or_else(|| QueryError::InvalidIsLiteral {
                    token: self.token.to_string(),
                    literal: raw.to_string(),
                })?;
                match self.field_type {
                    Some(field_type) if literal.is_boolean() && field_type != FieldType::Bool => {
                        Err(self.coercion(CoercionError::new(
                            raw,
                            field_type,
                            "is true/false needs a bool field",
                        )))
                    }
                    _ => Ok(Operand::Is(literal)),
                }
            }
        }
    }
}

/// Typed right-hand side of a filter
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Operand {
    Compare(Comparison, Value),
    In(Vec<Value>),
    /// Raw substring; each backend decides on escaping
    Like(String),
    Is(IsLiteral),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PlannedFilter<'s> {
    pub field: PlannedField<'s>,
    pub operand: Operand,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlannedSort<'s> {
    pub field: PlannedField<'s>,
    pub direction: Direction,
}
