//! Field whitelisting and alias remapping.
//!
//! A field is permitted when its first path segment names a declared field
//! (by name or storage alias) or appears in the explicit allow-list of the filter or sort.
//! Nested segments and function suffixes are not whitelisted separately; they
//! are checked later when the path is typed against the shape.

use std::collections::BTreeSet;

use super::token::FieldPath;
use crate::{
    errors::{ParamKind, QueryError},
    schema::FieldDescriptor,
};

/// A token path whose root passed the whitelist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPath<'a> {
    /// The path as written in the token
    pub requested: &'a FieldPath,
    /// Storage name of the root segment
    pub root: &'a str,
    /// Declared field backing the root, `None` for allow-listed fields
    pub descriptor: Option<&'static FieldDescriptor>,
}

impl ResolvedPath<'_> {
    /// Whether the root was permitted only through the allow-list
    #[must_use]
    pub const fn is_untyped(&self) -> bool {
        self.descriptor.is_none()
    }
}

/// Check every path against `fields` and `allow_list`.
///
/// Roots matched through a declared name are rewritten to the field's
/// storage alias. Fails with [`QueryError::DisallowedFields`] naming every
/// offending root in the batch, not only the first.
pub fn resolve<'a, I>(
    kind: ParamKind,
    paths: I,
    fields: &'static [FieldDescriptor],
    allow_list: &BTreeSet<String>,
) -> Result<Vec<ResolvedPath<'a>>, QueryError>
where
    I: IntoIterator<Item = &'a FieldPath>,
{
    let mut resolved = Vec::new();
    let mut offenders = BTreeSet::new();

    for path in paths {
        let root = path.root();
        if let Some(descriptor) = fields.iter().find(|field| field.matches(root)) {
            resolved.push(ResolvedPath {
                requested: path,
                root: descriptor.storage_name(),
                descriptor: Some(descriptor),
            });
        } else if allow_list.contains(root) {
            resolved.push(ResolvedPath {
                requested: path,
                root,
                descriptor: None,
            });
        } else {
            offenders.insert(root.to_string());
        }
    }

    if offenders.is_empty() {
        Ok(resolved)
    } else {
        Err(QueryError::DisallowedFields {
            kind,
            fields: offenders,
        })
    }
}
