//! Registry of mounted heading anchors.
//!
//! Maps each [`AnchorHandle`] to the identifier and rank it registered with.
//! Keeps a reverse index so an identifier is held by at most one live handle.

use std::collections::HashMap;
use std::collections::hash_map;
use std::fmt;

use crate::order::OrderRank;

/// Opaque identity of one rendered heading anchor.
///
/// Equality is identity: two handles are equal only if they were produced by
/// the same allocation. Handles are never reused within a page view.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnchorHandle(u64);

impl AnchorHandle {
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for AnchorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnchorHandle(#{})", self.0)
    }
}

/// Identifier and document-order rank of a registered heading.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryEntry {
    /// Heading slug.
    pub identifier: String,
    /// Rank drawn when the heading registered.
    pub rank: OrderRank,
}

/// Mapping from anchor handle to its registry entry.
#[derive(Debug, Default)]
pub struct SlugRegistry {
    entries: HashMap<AnchorHandle, RegistryEntry>,
    by_identifier: HashMap<String, AnchorHandle>,
}

impl SlugRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for `handle`.
    ///
    /// If a different handle currently holds `identifier`, its entry is
    /// removed and that handle is returned so the caller can stop observing it.
    pub fn register(
        &mut self,
        handle: AnchorHandle,
        identifier: impl Into<String>,
        rank: OrderRank,
    ) -> Option<AnchorHandle> {
        let identifier = identifier.into();

        let evicted = match self.by_identifier.get(&identifier) {
            Some(&holder) if holder != handle => {
                self.entries.remove(&holder);
                tracing::debug!(
                    identifier = %identifier,
                    evicted = ?holder,
                    handle = ?handle,
                    "Identifier re-registered by another anchor"
                );
                Some(holder)
            }
            _ => None,
        };

        // Replacing an entry may change its identifier; drop the stale reverse link.
        if let Some(previous) = self.entries.get(&handle)
            && previous.identifier != identifier
        {
            self.by_identifier.remove(&previous.identifier);
        }

        self.by_identifier.insert(identifier.clone(), handle);
        self.entries
            .insert(handle, RegistryEntry { identifier, rank });

        evicted
    }

    /// Remove the entry for `handle`.
    ///
    /// Returns the removed entry, or `None` if the handle was not registered.
    pub fn unregister(&mut self, handle: AnchorHandle) -> Option<RegistryEntry> {
        let entry = self.entries.remove(&handle)?;
        if self.by_identifier.get(&entry.identifier) == Some(&handle) {
            self.by_identifier.remove(&entry.identifier);
        }
        Some(entry)
    }

    /// Entry registered for `handle`.
    #[must_use]
    pub fn get(&self, handle: AnchorHandle) -> Option<&RegistryEntry> {
        self.entries.get(&handle)
    }

    /// Handle currently holding `identifier`.
    #[must_use]
    pub fn handle_of(&self, identifier: &str) -> Option<AnchorHandle> {
        self.by_identifier.get(identifier).copied()
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no heading is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all live entries in unspecified order.
    ///
    /// The iterator is lazy and `Clone`, so it can be restarted.
    pub fn entries(&self) -> Entries<'_> {
        Entries {
            inner: self.entries.iter(),
        }
    }

    /// Identifiers of all live entries in document order.
    #[must_use]
    pub fn sorted_identifiers(&self) -> Vec<String> {
        let mut entries: Vec<&RegistryEntry> = self.entries.values().collect();
        entries.sort_by_key(|entry| entry.rank);
        entries
            .into_iter()
            .map(|entry| entry.identifier.clone())
            .collect()
    }
}

/// Iterator over registry entries, see [`SlugRegistry::entries`].
#[derive(Clone)]
pub struct Entries<'a> {
    inner: hash_map::Iter<'a, AnchorHandle, RegistryEntry>,
}

impl<'a> Iterator for Entries<'a> {
    type Item = (AnchorHandle, &'a RegistryEntry);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(&handle, entry)| (handle, entry))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Entries<'_> {}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::order::OrderCounter;

    fn handle(raw: u64) -> AnchorHandle {
        AnchorHandle::from_raw(raw)
    }

    #[test]
    fn test_register_and_sort() {
        let counter = OrderCounter::new();
        let mut registry = SlugRegistry::new();
        registry.register(handle(3), "intro", counter.next());
        registry.register(handle(1), "usage", counter.next());
        registry.register(handle(2), "api", counter.next());

        assert_eq!(registry.sorted_identifiers(), vec!["intro", "usage", "api"]);
    }

    #[test]
    fn test_register_same_handle_replaces() {
        let counter = OrderCounter::new();
        let mut registry = SlugRegistry::new();
        registry.register(handle(1), "intro", counter.next());
        let latest = counter.next();
        let evicted = registry.register(handle(1), "intro", latest);

        assert_eq!(evicted, None);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(handle(1)).map(|e| e.rank), Some(latest));
    }

    #[test]
    fn test_register_same_handle_new_identifier() {
        let counter = OrderCounter::new();
        let mut registry = SlugRegistry::new();
        registry.register(handle(1), "old", counter.next());
        registry.register(handle(1), "new", counter.next());

        assert_eq!(registry.handle_of("old"), None);
        assert_eq!(registry.handle_of("new"), Some(handle(1)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_identifier_held_by_one_handle() {
        let counter = OrderCounter::new();
        let mut registry = SlugRegistry::new();
        registry.register(handle(1), "intro", counter.next());
        let evicted = registry.register(handle(2), "intro", counter.next());

        assert_eq!(evicted, Some(handle(1)));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.handle_of("intro"), Some(handle(2)));
        assert!(registry.get(handle(1)).is_none());
    }

    #[test]
    fn test_unregister_unknown_is_noop() {
        let mut registry = SlugRegistry::new();
        assert_eq!(registry.unregister(handle(9)), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unregister_twice() {
        let counter = OrderCounter::new();
        let mut registry = SlugRegistry::new();
        registry.register(handle(1), "intro", counter.next());

        assert!(registry.unregister(handle(1)).is_some());
        assert!(registry.unregister(handle(1)).is_none());
        assert_eq!(registry.handle_of("intro"), None);
    }

    #[test]
    fn test_evicted_unregister_keeps_successor() {
        let counter = OrderCounter::new();
        let mut registry = SlugRegistry::new();
        registry.register(handle(1), "intro", counter.next());
        registry.register(handle(2), "intro", counter.next());

        assert_eq!(registry.unregister(handle(1)), None);
        assert_eq!(registry.handle_of("intro"), Some(handle(2)));
    }

    #[test]
    fn test_entries_restartable() {
        let counter = OrderCounter::new();
        let mut registry = SlugRegistry::new();
        registry.register(handle(1), "a", counter.next());
        registry.register(handle(2), "b", counter.next());

        let entries = registry.entries();
        assert_eq!(entries.clone().count(), 2);
        assert_eq!(entries.len(), 2);
        let mut ids: Vec<_> = entries.map(|(_, e)| e.identifier.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
