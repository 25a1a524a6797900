//! Visibility observation of heading anchors.
//!
//! A page view owns exactly one [`VisibilityObserver`]. Headings subscribe
//! their anchor handles to it while mounted, and the page view drains the
//! batched [`VisibilityRecord`]s it produces.
//!
//! The concrete visibility policy is up to the implementation.
//! [`ViewportObserver`] derives records from element offsets and the scroll
//! position reported by the host.

use std::collections::BTreeMap;

use crate::registry::AnchorHandle;

/// One visibility change for one observed anchor.
#[derive(Clone, Debug, PartialEq)]
pub struct VisibilityRecord<D> {
    /// Anchor the record belongs to.
    pub handle: AnchorHandle,
    /// Observer-specific visibility datum.
    pub datum: D,
}

/// Shared observation facility for a page view.
///
/// Implementations must never return a record for a handle that is not
/// currently observed: records queued before [`unobserve`](Self::unobserve)
/// or [`disconnect`](Self::disconnect) are discarded.
pub trait VisibilityObserver {
    /// Visibility datum passed through to the active anchor state.
    type Datum: Clone + PartialEq;

    /// Start watching `handle`.
    fn observe(&mut self, handle: AnchorHandle);

    /// Stop watching `handle`. No-op if it is not observed.
    fn unobserve(&mut self, handle: AnchorHandle);

    /// Stop watching every handle.
    fn disconnect(&mut self);

    /// Whether `handle` is currently watched.
    fn is_observing(&self, handle: AnchorHandle) -> bool;

    /// Drain the pending batch of records.
    fn take_records(&mut self) -> Vec<VisibilityRecord<Self::Datum>>;
}

/// Visibility datum produced by [`ViewportObserver`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Visibility {
    /// Whether the anchor's top edge lies inside the viewport.
    pub intersecting: bool,
    /// Anchor top relative to the activation line (viewport top plus offset).
    /// Zero or negative once the heading has scrolled past the line.
    pub top: f64,
}

/// Geometry-driven observer.
///
/// The host reports the document offset of each anchor with
/// [`set_layout`](Self::set_layout) and the viewport with
/// [`scroll_to`](Self::scroll_to). Every change recomputes the visibility
/// of all observed anchors and queues a record for each one that changed.
///
/// The layout of an anchor is forgotten when it stops being observed, so a
/// remounted heading needs its layout reported again.
#[derive(Debug)]
pub struct ViewportObserver {
    offset: f64,
    scroll_top: f64,
    viewport_height: f64,
    layout: BTreeMap<AnchorHandle, f64>,
    observed: BTreeMap<AnchorHandle, Option<Visibility>>,
    pending: BTreeMap<AnchorHandle, Visibility>,
}

impl ViewportObserver {
    /// Create an observer with the given activation offset.
    ///
    /// `offset` is the distance from the viewport top to the line a heading
    /// must cross to count as passed (usually the fixed navbar height).
    #[must_use]
    pub fn new(offset: f64) -> Self {
        Self {
            offset,
            scroll_top: 0.0,
            viewport_height: 0.0,
            layout: BTreeMap::new(),
            observed: BTreeMap::new(),
            pending: BTreeMap::new(),
        }
    }

    /// Record the document offset of an anchor's top edge.
    pub fn set_layout(&mut self, handle: AnchorHandle, top: f64) {
        self.layout.insert(handle, top);
        self.refresh(Some(handle));
    }

    /// Move the viewport.
    pub fn scroll_to(&mut self, scroll_top: f64, viewport_height: f64) {
        self.scroll_top = scroll_top;
        self.viewport_height = viewport_height;
        self.refresh(None);
    }

    /// Number of handles currently observed.
    #[must_use]
    pub fn observed_count(&self) -> usize {
        self.observed.len()
    }

    fn visibility_of(&self, top: f64) -> Visibility {
        let bottom = self.scroll_top + self.viewport_height;
        Visibility {
            intersecting: top >= self.scroll_top && top < bottom,
            top: top - (self.scroll_top + self.offset),
        }
    }

    /// Recompute visibility for one handle, or all observed handles.
    fn refresh(&mut self, only: Option<AnchorHandle>) {
        let targets: Vec<AnchorHandle> = match only {
            Some(handle) if self.observed.contains_key(&handle) => vec![handle],
            Some(_) => return,
            None => self.observed.keys().copied().collect(),
        };

        for handle in targets {
            let Some(&top) = self.layout.get(&handle) else {
                continue;
            };
            let visibility = self.visibility_of(top);
            let Some(last) = self.observed.get_mut(&handle) else {
                continue;
            };
            if *last != Some(visibility) {
                *last = Some(visibility);
                self.pending.insert(handle, visibility);
            }
        }
    }
}

impl Default for ViewportObserver {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl VisibilityObserver for ViewportObserver {
    type Datum = Visibility;

    fn observe(&mut self, handle: AnchorHandle) {
        // Re-observing resets the last datum so the next refresh reports again.
        self.observed.insert(handle, None);
        self.refresh(Some(handle));
    }

    fn unobserve(&mut self, handle: AnchorHandle) {
        self.observed.remove(&handle);
        self.pending.remove(&handle);
        self.layout.remove(&handle);
    }

    fn disconnect(&mut self) {
        self.observed.clear();
        self.pending.clear();
        self.layout.clear();
    }

    fn is_observing(&self, handle: AnchorHandle) -> bool {
        self.observed.contains_key(&handle)
    }

    fn take_records(&mut self) -> Vec<VisibilityRecord<Visibility>> {
        std::mem::take(&mut self.pending)
            .into_iter()
            .map(|(handle, datum)| VisibilityRecord { handle, datum })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn handle(raw: u64) -> AnchorHandle {
        AnchorHandle::from_raw(raw)
    }

    #[test]
    fn test_observe_with_layout_queues_initial_record() {
        let mut observer = ViewportObserver::new(60.0);
        observer.scroll_to(0.0, 800.0);
        observer.set_layout(handle(1), 100.0);
        observer.observe(handle(1));

        let records = observer.take_records();
        assert_eq!(
            records,
            vec![VisibilityRecord {
                handle: handle(1),
                datum: Visibility {
                    intersecting: true,
                    top: 40.0,
                },
            }]
        );
        assert!(observer.take_records().is_empty());
    }

    #[test]
    fn test_unobserved_layout_does_not_queue() {
        let mut observer = ViewportObserver::new(0.0);
        observer.set_layout(handle(1), 100.0);
        observer.scroll_to(0.0, 800.0);
        assert!(observer.take_records().is_empty());
    }

    #[test]
    fn test_scroll_queues_only_changes() {
        let mut observer = ViewportObserver::new(0.0);
        observer.scroll_to(0.0, 500.0);
        observer.set_layout(handle(1), 100.0);
        observer.set_layout(handle(2), 900.0);
        observer.observe(handle(1));
        observer.observe(handle(2));
        observer.take_records();

        // Same viewport again: nothing changes.
        observer.scroll_to(0.0, 500.0);
        assert!(observer.take_records().is_empty());

        observer.scroll_to(600.0, 500.0);
        let records = observer.take_records();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].datum,
            Visibility {
                intersecting: false,
                top: -500.0,
            }
        );
        assert_eq!(
            records[1].datum,
            Visibility {
                intersecting: true,
                top: 300.0,
            }
        );
    }

    #[test]
    fn test_batch_coalesces_per_handle() {
        let mut observer = ViewportObserver::new(0.0);
        observer.set_layout(handle(1), 100.0);
        observer.observe(handle(1));
        observer.scroll_to(50.0, 500.0);
        observer.scroll_to(150.0, 500.0);

        let records = observer.take_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].datum.top, -50.0);
    }

    #[test]
    fn test_unobserve_discards_pending() {
        let mut observer = ViewportObserver::new(0.0);
        observer.set_layout(handle(1), 100.0);
        observer.observe(handle(1));
        observer.unobserve(handle(1));

        assert!(!observer.is_observing(handle(1)));
        assert!(observer.take_records().is_empty());
    }

    #[test]
    fn test_unobserve_forgets_layout() {
        let mut observer = ViewportObserver::new(0.0);
        observer.scroll_to(0.0, 500.0);
        observer.set_layout(handle(1), 100.0);
        observer.observe(handle(1));
        observer.unobserve(handle(1));
        observer.take_records();

        // Observing again reports nothing until the layout is known.
        observer.observe(handle(1));
        assert!(observer.take_records().is_empty());

        observer.set_layout(handle(1), 100.0);
        assert_eq!(observer.take_records().len(), 1);
    }

    #[test]
    fn test_disconnect_clears_everything() {
        let mut observer = ViewportObserver::new(0.0);
        observer.set_layout(handle(1), 100.0);
        observer.set_layout(handle(2), 200.0);
        observer.observe(handle(1));
        observer.observe(handle(2));
        observer.disconnect();

        assert_eq!(observer.observed_count(), 0);
        assert!(observer.take_records().is_empty());
        observer.scroll_to(10.0, 100.0);
        assert!(observer.take_records().is_empty());

        observer.observe(handle(2));
        assert!(observer.take_records().is_empty());
    }
}
