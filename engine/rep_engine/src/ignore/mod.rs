//! Ignore registry.
//!
//! Types in the registry never survive a deep copy: every value of an
//! ignored type comes out as null (reference types) or its default (value
//! types). Plans read the registry when they are compiled, and container
//! adapters re-check it for each element's runtime type.
//!
//! Clearing the registry does not touch compiled plans. Use
//! [`Replicator::clear_ignored_types`](crate::Replicator::clear_ignored_types)
//! to clear both at once.

use dashmap::DashSet;
use rep_types::TypeId;
use rustc_hash::FxHashSet;

/// Concurrent set of ignored types.
#[derive(Debug, Default)]
pub struct IgnoreRegistry {
    types: DashSet<TypeId>,
}

impl IgnoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `ty`. Returns `false` if it was already ignored.
    pub fn ignore(&self, ty: TypeId) -> bool {
        self.types.insert(ty)
    }

    pub fn ignore_many(&self, types: impl IntoIterator<Item = TypeId>) {
        for ty in types {
            self.types.insert(ty);
        }
    }

    #[inline]
    pub fn is_ignored(&self, ty: TypeId) -> bool {
        !self.types.is_empty() && self.types.contains(&ty)
    }

    pub fn clear(&self) {
        self.types.clear();
    }

    /// Point-in-time copy of the ignored types.
    pub fn snapshot(&self) -> FxHashSet<TypeId> {
        self.types.iter().map(|entry| *entry.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests;
