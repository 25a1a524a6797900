//! Active anchor state.
//!
//! Maps heading identifiers to the latest visibility datum observed for
//! them. [`ActiveAnchors`] is the only writer; readers hold immutable
//! [`ActiveSnapshot`]s, either pulled with [`ActiveAnchors::snapshot`] or
//! pushed through a [`SnapshotReceiver`] on every change.

use std::collections::HashMap;
use std::sync::{Arc, mpsc};

/// Immutable view of the active anchor map.
///
/// Cheap to clone. A snapshot never changes after it was taken, even when
/// the state it came from is updated.
#[derive(Debug)]
pub struct ActiveSnapshot<D> {
    map: Arc<HashMap<String, D>>,
}

impl<D> Clone for ActiveSnapshot<D> {
    fn clone(&self) -> Self {
        Self {
            map: Arc::clone(&self.map),
        }
    }
}

impl<D> Default for ActiveSnapshot<D> {
    fn default() -> Self {
        Self {
            map: Arc::new(HashMap::new()),
        }
    }
}

impl<D> ActiveSnapshot<D> {
    /// Datum for `identifier`.
    #[must_use]
    pub fn get(&self, identifier: &str) -> Option<&D> {
        self.map.get(identifier)
    }

    /// Whether `identifier` has a datum.
    #[must_use]
    pub fn contains(&self, identifier: &str) -> bool {
        self.map.contains_key(identifier)
    }

    /// Number of identifiers with a datum.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate over `(identifier, datum)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &D)> {
        self.map.iter().map(|(id, datum)| (id.as_str(), datum))
    }

    /// Identifiers present in the snapshot, in unspecified order.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }
}

impl<D: PartialEq> PartialEq for ActiveSnapshot<D> {
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}

/// Receiver for active anchor snapshots.
///
/// Every change of the state sends the new snapshot. Intermediate snapshots
/// can be skipped with [`latest`](Self::latest).
pub struct SnapshotReceiver<D> {
    rx: mpsc::Receiver<ActiveSnapshot<D>>,
}

impl<D> SnapshotReceiver<D> {
    /// Take the next pending snapshot without blocking.
    #[must_use]
    pub fn try_recv(&self) -> Option<ActiveSnapshot<D>> {
        self.rx.try_recv().ok()
    }

    /// Drain all pending snapshots and return the most recent one.
    #[must_use]
    pub fn latest(&self) -> Option<ActiveSnapshot<D>> {
        self.rx.try_iter().last()
    }

    /// Iterate over pending snapshots without blocking.
    pub fn pending(&self) -> impl Iterator<Item = ActiveSnapshot<D>> + '_ {
        self.rx.try_iter()
    }
}

/// Reducer for the active anchor map.
///
/// Merges are last-write-wins per identifier; writing the datum already
/// stored is a no-op. Removal replaces the shared map copy-on-write, so
/// snapshots handed out earlier keep their content.
pub struct ActiveAnchors<D> {
    current: ActiveSnapshot<D>,
    subscribers: Vec<mpsc::Sender<ActiveSnapshot<D>>>,
}

impl<D> Default for ActiveAnchors<D> {
    fn default() -> Self {
        Self {
            current: ActiveSnapshot::default(),
            subscribers: Vec::new(),
        }
    }
}

impl<D: Clone + PartialEq> ActiveAnchors<D> {
    /// Create an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `datum` for `identifier`.
    ///
    /// Returns `true` if the state changed.
    pub fn on_event(&mut self, identifier: &str, datum: D) -> bool {
        if self.current.map.get(identifier) == Some(&datum) {
            return false;
        }
        Arc::make_mut(&mut self.current.map).insert(identifier.to_owned(), datum);
        self.publish();
        true
    }

    /// Remove `identifier` from the state.
    ///
    /// Returns `true` if the identifier was present.
    pub fn on_remove(&mut self, identifier: &str) -> bool {
        if !self.current.map.contains_key(identifier) {
            return false;
        }
        Arc::make_mut(&mut self.current.map).remove(identifier);
        self.publish();
        true
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> ActiveSnapshot<D> {
        self.current.clone()
    }

    /// Subscribe to future snapshots.
    pub fn subscribe(&mut self) -> SnapshotReceiver<D> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        SnapshotReceiver { rx }
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn publish(&mut self) {
        let snapshot = &self.current;
        // Receivers that were dropped are pruned here.
        self.subscribers
            .retain(|tx| tx.send(snapshot.clone()).is_ok());
    }
}
