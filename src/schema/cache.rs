use dashmap::{DashMap, mapref::entry::Entry};

use super::{FieldDescriptor, ResolvedField};

/// Compute-or-fetch cache of resolved nested field types.
///
/// Entries are keyed by the address of the root field's static descriptor
/// plus the nested path below it, so shapes sharing a name never see each
/// other's resolutions. Concurrent readers never block each other; a miss
/// locks only the shard holding the key, so at most one writer resolves a
/// given key at a time. Resolution failures are not cached.
#[derive(Debug, Default)]
pub struct FieldTypeCache {
    entries: DashMap<(usize, String), ResolvedField>,
}

impl FieldTypeCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached resolution of `nested` below `root`, running
    /// `resolve` on a miss.
    pub fn get_or_resolve<F>(
        &self,
        root: &'static FieldDescriptor,
        nested: &str,
        resolve: F,
    ) -> Result<ResolvedField, String>
    where
        F: FnOnce() -> Result<ResolvedField, String>,
    {
        let key = (std::ptr::from_ref(root).addr(), nested.to_string());
        if let Some(hit) = self.entries.get(&key) {
            return Ok(hit.value().clone());
        }

        match self.entries.entry(key) {
            Entry::Occupied(occupied) => Ok(occupied.get().clone()),
            Entry::Vacant(vacant) => {
                let resolved = resolve()?;
                vacant.insert(resolved.clone());
                Ok(resolved)
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}
