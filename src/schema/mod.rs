//! # Record Shapes
//!
//! A [`RecordShape`] is the static description of a record type the compiler
//! works against: its field names, their types, optional storage aliases and
//! the identity and soft-delete markers. Shapes are plain `static` tables
//! built once per record type and passed to the compiler; nothing is
//! discovered at runtime.
//!
//! ```rust,ignore
//! static ORDER_FIELDS: [FieldDescriptor; 2] = [
//!     FieldDescriptor::new("id", FieldType::BigInteger).identity(),
//!     FieldDescriptor::new("name", FieldType::Text),
//! ];
//!
//! static ORDER: FieldType = FieldType::Relation(&ORDER_FIELDS);
//!
//! static USER_FIELDS: [FieldDescriptor; 4] = [
//!     FieldDescriptor::new("id", FieldType::BigInteger).identity(),
//!     FieldDescriptor::new("name", FieldType::Text).alias("_name"),
//!     FieldDescriptor::new("roles", FieldType::List(&FieldType::Text)),
//!     FieldDescriptor::new("orders", FieldType::List(&ORDER)),
//! ];
//!
//! static USERS: RecordShape = RecordShape::new("users", &USER_FIELDS);
//! ```

mod cache;

pub use cache::FieldTypeCache;

use std::fmt;

/// Declared type of a record field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Bool,
    /// 32-bit signed integer
    Integer,
    /// 64-bit signed integer
    BigInteger,
    Float,
    Double,
    Text,
    Uuid,
    /// RFC 3339 timestamp, stored in UTC
    Timestamp,
    /// Text restricted to the listed member names (case-sensitive)
    Enum(&'static [&'static str]),
    /// Multi-valued field; the inner type is the element type
    List(&'static FieldType),
    /// Related record reachable through dot-notation
    Relation(&'static [FieldDescriptor]),
}

impl FieldType {
    /// Element type of a multi-valued field
    #[must_use]
    pub const fn element_type(&self) -> Option<FieldType> {
        match self {
            Self::List(element) => Some(**element),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_multi_valued(&self) -> bool {
        matches!(self, Self::List(_))
    }

    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text)
    }

    /// Fields reachable one level below this type, if it is navigable
    #[must_use]
    pub const fn nested_fields(&self) -> Option<&'static [FieldDescriptor]> {
        match self {
            Self::Relation(fields) | Self::List(Self::Relation(fields)) => Some(*fields),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::Integer => f.write_str("i32"),
            Self::BigInteger => f.write_str("i64"),
            Self::Float => f.write_str("f32"),
            Self::Double => f.write_str("f64"),
            Self::Text => f.write_str("text"),
            Self::Uuid => f.write_str("uuid"),
            Self::Timestamp => f.write_str("timestamp"),
            Self::Enum(members) => write!(f, "enum({})", members.join("|")),
            Self::List(element) => write!(f, "list<{element}>"),
            Self::Relation(_) => f.write_str("relation"),
        }
    }
}

/// Static metadata for one field of a record shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Name clients use in tokens
    pub name: &'static str,
    pub field_type: FieldType,
    /// Storage name the field is rewritten to, when it differs from `name`
    pub alias: Option<&'static str>,
    pub is_identity: bool,
    pub is_soft_delete: bool,
}

impl FieldDescriptor {
    #[must_use]
    pub const fn new(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            alias: None,
            is_identity: false,
            is_soft_delete: false,
        }
    }

    #[must_use]
    pub const fn alias(mut self, alias: &'static str) -> Self {
        self.alias = Some(alias);
        self
    }

    #[must_use]
    pub const fn identity(mut self) -> Self {
        self.is_identity = true;
        self
    }

    /// Mark the field as the soft-delete marker (a bool flag or a nullable timestamp)
    #[must_use]
    pub const fn soft_delete(mut self) -> Self {
        self.is_soft_delete = true;
        self
    }

    /// Name the field has in storage
    #[must_use]
    pub const fn storage_name(&self) -> &'static str {
        match self.alias {
            Some(alias) => alias,
            None => self.name,
        }
    }

    #[must_use]
    pub const fn element_type(&self) -> Option<FieldType> {
        self.field_type.element_type()
    }

    /// Whether a token segment refers to this field, by name or by storage alias
    #[must_use]
    pub fn matches(&self, segment: &str) -> bool {
        self.name == segment || self.alias == Some(segment)
    }

    /// Walk `nested` segments below this field.
    ///
    /// Returns the type of the last segment and the storage names of every
    /// nested segment. Fails with a human-readable cause when a segment does
    /// not exist or the walk reaches a non-navigable type.
    pub fn resolve_nested(&self, nested: &[String]) -> Result<ResolvedField, String> {
        let mut current = self.field_type;
        let mut owner = self.name;
        let mut storage = Vec::with_capacity(nested.len());

        for segment in nested {
            let Some(fields) = current.nested_fields() else {
                return Err(format!(
                    "`{owner}` is of type {current} and has no nested field `{segment}`"
                ));
            };
            let field = fields
                .iter()
                .find(|field| field.matches(segment))
                .ok_or_else(|| format!("`{owner}` has no field `{segment}`"))?;
            storage.push(field.storage_name());
            current = field.field_type;
            owner = field.name;
        }

        Ok(ResolvedField {
            field_type: current,
            storage,
        })
    }
}

/// Outcome of walking a nested path through a shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedField {
    /// Type of the last segment
    pub field_type: FieldType,
    /// Storage names of the nested segments, in path order
    pub storage: Vec<&'static str>,
}

/// Field table describing one record type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordShape {
    pub name: &'static str,
    pub fields: &'static [FieldDescriptor],
}

impl RecordShape {
    #[must_use]
    pub const fn new(name: &'static str, fields: &'static [FieldDescriptor]) -> Self {
        Self { name, fields }
    }

    /// Look a top-level field up by name or alias
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&'static FieldDescriptor> {
        self.fields.iter().find(|field| field.matches(name))
    }

    #[must_use]
    pub fn identity_field(&self) -> Option<&'static FieldDescriptor> {
        self.fields.iter().find(|field| field.is_identity)
    }

    #[must_use]
    pub fn soft_delete_field(&self) -> Option<&'static FieldDescriptor> {
        self.fields.iter().find(|field| field.is_soft_delete)
    }
}
