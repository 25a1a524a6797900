//! Page view: the scope that owns all tracking state of one rendered page.
//!
//! A [`PageView`] is created once per page (one per navigation) and owns the
//! order counter, the slug registry, the visibility observer and the active
//! anchor state. Heading factories borrow its counter; mounted headings
//! register into it and tear down through it.
//!
//! Everything runs on the host's single-threaded event loop. Mutable state
//! sits behind one `RefCell` that is borrowed only for the duration of a
//! single operation, and no caller code runs while it is borrowed.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::active::{ActiveAnchors, ActiveSnapshot, SnapshotReceiver};
use crate::heading::{HeadingFactory, HeadingMarkup, HeadingTag};
use crate::observer::{ViewportObserver, Visibility, VisibilityObserver};
use crate::order::{OrderCounter, OrderRank};
use crate::registry::{AnchorHandle, RegistryEntry, SlugRegistry};
use crate::toc;

/// Identifies one mount of an anchor. A newer mount of the same anchor
/// supersedes older ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct MountToken(u64);

struct Tracker<O: VisibilityObserver> {
    registry: SlugRegistry,
    observer: O,
    active: ActiveAnchors<O::Datum>,
}

impl<O: VisibilityObserver> Tracker<O> {
    /// Teardown steps: stop observing, unregister, drop active state.
    fn teardown(&mut self, handle: AnchorHandle) {
        let last = self.registry.len() == 1 && self.registry.get(handle).is_some();
        if last {
            self.observer.disconnect();
        } else {
            self.observer.unobserve(handle);
        }

        if let Some(entry) = self.registry.unregister(handle) {
            self.active.on_remove(&entry.identifier);
            tracing::trace!(identifier = %entry.identifier, ?handle, "Unregistered heading anchor");
        }
    }
}

/// Shared state behind a [`PageView`].
pub(crate) struct PageScope<O: VisibilityObserver> {
    counter: OrderCounter,
    next_handle: Cell<u64>,
    next_token: Cell<u64>,
    markup: HeadingMarkup,
    /// Latest mount of each registered anchor.
    owners: RefCell<HashMap<AnchorHandle, MountToken>>,
    /// Teardowns that arrived while the tracker was borrowed.
    deferred: RefCell<Vec<AnchorHandle>>,
    tracker: RefCell<Tracker<O>>,
}

impl<O: VisibilityObserver> PageScope<O> {
    pub(crate) fn allocate_handle(&self) -> AnchorHandle {
        let raw = self.next_handle.get() + 1;
        self.next_handle.set(raw);
        AnchorHandle::from_raw(raw)
    }

    pub(crate) fn markup(&self) -> &HeadingMarkup {
        &self.markup
    }

    /// Registration steps: draw rank, register, observe.
    pub(crate) fn register(&self, handle: AnchorHandle, identifier: &str) -> (OrderRank, MountToken) {
        self.flush_deferred();

        let rank = self.counter.next();
        let token = MountToken(self.next_token.get() + 1);
        self.next_token.set(token.0);

        let mut tracker = self.tracker.borrow_mut();
        let mut owners = self.owners.borrow_mut();
        if let Some(evicted) = tracker.registry.register(handle, identifier, rank) {
            tracker.observer.unobserve(evicted);
            owners.remove(&evicted);
        }
        owners.insert(handle, token);
        tracker.observer.observe(handle);

        tracing::trace!(identifier, %rank, ?handle, "Registered heading anchor");
        (rank, token)
    }

    /// Run the teardown steps for `handle`.
    ///
    /// Returns `false` when `token` is not the latest mount of `handle`
    /// (already torn down, superseded by a remount, or evicted). While the
    /// tracker is borrowed the teardown is queued and runs as soon as the
    /// borrow ends.
    pub(crate) fn unregister(&self, handle: AnchorHandle, token: MountToken) -> bool {
        {
            let mut owners = self.owners.borrow_mut();
            if owners.get(&handle) != Some(&token) {
                tracing::trace!(?handle, "Stale heading teardown ignored");
                return false;
            }
            owners.remove(&handle);
        }

        match self.tracker.try_borrow_mut() {
            Ok(mut tracker) => tracker.teardown(handle),
            Err(_) => {
                tracing::debug!(?handle, "Page view busy, deferring heading teardown");
                self.deferred.borrow_mut().push(handle);
            }
        }
        true
    }

    /// Run queued teardowns if the tracker is free.
    pub(crate) fn flush_deferred(&self) {
        if self.deferred.borrow().is_empty() {
            return;
        }
        let Ok(mut tracker) = self.tracker.try_borrow_mut() else {
            return;
        };
        let handles = std::mem::take(&mut *self.deferred.borrow_mut());
        let owners = self.owners.borrow();
        for handle in handles {
            // Mounted again since the teardown was queued.
            if owners.contains_key(&handle) {
                continue;
            }
            tracker.teardown(handle);
        }
    }
}

/// Tracking scope of one rendered page.
///
/// Dropping the page view ends the scope: headings still mounted afterwards
/// tear down as no-ops.
pub struct PageView<O: VisibilityObserver> {
    scope: Rc<PageScope<O>>,
}

impl<O: VisibilityObserver> PageView<O> {
    /// Create a page view around a fresh observer.
    #[must_use]
    pub fn new(observer: O) -> Self {
        Self::with_markup(observer, HeadingMarkup::default())
    }

    /// Create a page view whose headings render with `markup`.
    #[must_use]
    pub fn with_markup(observer: O, markup: HeadingMarkup) -> Self {
        Self {
            scope: Rc::new(PageScope {
                counter: OrderCounter::new(),
                next_handle: Cell::new(0),
                next_token: Cell::new(0),
                markup,
                owners: RefCell::new(HashMap::new()),
                deferred: RefCell::new(Vec::new()),
                tracker: RefCell::new(Tracker {
                    registry: SlugRegistry::new(),
                    observer,
                    active: ActiveAnchors::new(),
                }),
            }),
        }
    }

    /// Heading factory for `tag` bound to this page's counter.
    #[must_use]
    pub fn factory(&self, tag: HeadingTag) -> HeadingFactory<O> {
        HeadingFactory::new(tag, Rc::clone(&self.scope))
    }

    /// Order counter of this page.
    #[must_use]
    pub fn counter(&self) -> &OrderCounter {
        &self.scope.counter
    }

    /// Drain the observer's pending batch into the active anchor state.
    ///
    /// Records are routed through the registry; records for anchors that are
    /// no longer registered are dropped. Returns the number of records that
    /// changed the state.
    pub fn deliver(&self) -> usize {
        self.scope.flush_deferred();
        let mut tracker = self.scope.tracker.borrow_mut();
        let Tracker {
            registry,
            observer,
            active,
        } = &mut *tracker;

        let mut applied = 0;
        for record in observer.take_records() {
            match registry.get(record.handle) {
                Some(entry) => {
                    if active.on_event(&entry.identifier, record.datum) {
                        applied += 1;
                    }
                }
                None => {
                    tracing::trace!(handle = ?record.handle, "Dropping record for unregistered anchor");
                }
            }
        }
        drop(tracker);
        self.scope.flush_deferred();
        applied
    }

    /// Current active anchor snapshot.
    #[must_use]
    pub fn snapshot(&self) -> ActiveSnapshot<O::Datum> {
        self.scope.tracker.borrow().active.snapshot()
    }

    /// Subscribe to active anchor snapshots.
    pub fn subscribe(&self) -> SnapshotReceiver<O::Datum> {
        self.scope.tracker.borrow_mut().active.subscribe()
    }

    /// Registered identifiers in document order.
    #[must_use]
    pub fn toc_identifiers(&self) -> Vec<String> {
        self.scope.tracker.borrow().registry.sorted_identifiers()
    }

    /// Registry entry of `handle`.
    #[must_use]
    pub fn entry(&self, handle: AnchorHandle) -> Option<RegistryEntry> {
        self.scope.tracker.borrow().registry.get(handle).cloned()
    }

    /// Handle currently registered for `identifier`.
    #[must_use]
    pub fn handle_of(&self, identifier: &str) -> Option<AnchorHandle> {
        self.scope.tracker.borrow().registry.handle_of(identifier)
    }

    /// All registry entries in document order.
    #[must_use]
    pub fn entries(&self) -> Vec<(AnchorHandle, RegistryEntry)> {
        let tracker = self.scope.tracker.borrow();
        let mut entries: Vec<_> = tracker
            .registry
            .entries()
            .map(|(handle, entry)| (handle, entry.clone()))
            .collect();
        entries.sort_by_key(|(_, entry)| entry.rank);
        entries
    }

    /// Number of registered headings.
    #[must_use]
    pub fn registered_count(&self) -> usize {
        self.scope.tracker.borrow().registry.len()
    }

    /// Run `f` with the observer, e.g. to feed it layout information.
    ///
    /// `f` must not call back into this page view. Headings unmounted inside
    /// `f` are torn down once it returns.
    pub fn with_observer<R>(&self, f: impl FnOnce(&mut O) -> R) -> R {
        let result = f(&mut self.scope.tracker.borrow_mut().observer);
        self.scope.flush_deferred();
        result
    }
}

impl PageView<ViewportObserver> {
    /// Identifier of the heading the TOC should highlight.
    ///
    /// See [`toc::active_heading`] for the policy.
    #[must_use]
    pub fn active_heading(&self) -> Option<String> {
        let order = self.toc_identifiers();
        let snapshot: ActiveSnapshot<Visibility> = self.snapshot();
        toc::active_heading(&snapshot, &order).map(str::to_owned)
    }
}
