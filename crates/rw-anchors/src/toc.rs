//! Active heading selection for table-of-contents highlighting.
//!
//! The policy, given headings in document order and their latest
//! [`Visibility`]:
//!
//! 1. the last heading whose top has reached the activation line
//!    (`top <= 0`);
//! 2. otherwise the first heading inside the viewport;
//! 3. otherwise the first heading that has been observed at all.
//!
//! Since `top` is recomputed for every observed anchor on every scroll, a
//! fast scroll that jumps over several headings still lands on the right one.

use crate::active::{ActiveSnapshot, SnapshotReceiver};
use crate::observer::Visibility;

/// Pick the heading to highlight.
///
/// `order` lists identifiers in document order; identifiers missing from the
/// snapshot are skipped.
#[must_use]
pub fn active_heading<'a>(
    snapshot: &ActiveSnapshot<Visibility>,
    order: &'a [String],
) -> Option<&'a str> {
    let observed = move || {
        order
            .iter()
            .filter_map(move |id| snapshot.get(id).map(|visibility| (id.as_str(), visibility)))
    };

    observed()
        .rfind(|(_, visibility)| visibility.top <= 0.0)
        .or_else(|| observed().find(|(_, visibility)| visibility.intersecting))
        .or_else(|| observed().next())
        .map(|(id, _)| id)
}

/// Follows snapshot updates and reports when the highlighted heading changes.
pub struct TocHighlighter {
    rx: SnapshotReceiver<Visibility>,
    order: Vec<String>,
    current: Option<String>,
}

impl TocHighlighter {
    /// Create a highlighter for headings in `order`.
    #[must_use]
    pub fn new(rx: SnapshotReceiver<Visibility>, order: Vec<String>) -> Self {
        Self {
            rx,
            order,
            current: None,
        }
    }

    /// Replace the document order, e.g. after headings were added.
    pub fn set_order(&mut self, order: Vec<String>) {
        self.order = order;
    }

    /// Currently highlighted heading.
    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Consume pending snapshots.
    ///
    /// Returns `true` if the highlighted heading changed.
    pub fn poll(&mut self) -> bool {
        let Some(snapshot) = self.rx.latest() else {
            return false;
        };
        let next = active_heading(&snapshot, &self.order).map(str::to_owned);
        if next == self.current {
            return false;
        }
        tracing::debug!(from = ?self.current, to = ?next, "Active heading changed");
        self.current = next;
        true
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::active::ActiveAnchors;

    fn order(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|&id| id.to_owned()).collect()
    }

    fn vis(intersecting: bool, top: f64) -> Visibility {
        Visibility { intersecting, top }
    }

    #[test]
    fn test_last_passed_heading_wins() {
        let mut state = ActiveAnchors::new();
        state.on_event("intro", vis(false, -400.0));
        state.on_event("usage", vis(false, -10.0));
        state.on_event("api", vis(true, 200.0));
        let order = order(&["intro", "usage", "api"]);

        assert_eq!(active_heading(&state.snapshot(), &order), Some("usage"));
    }

    #[test]
    fn test_first_intersecting_when_none_passed() {
        let mut state = ActiveAnchors::new();
        state.on_event("intro", vis(false, 900.0));
        state.on_event("usage", vis(true, 100.0));
        state.on_event("api", vis(true, 300.0));
        let order = order(&["intro", "usage", "api"]);

        // Document order decides, not map order.
        assert_eq!(active_heading(&state.snapshot(), &order), Some("usage"));
    }

    #[test]
    fn test_first_observed_fallback() {
        let mut state = ActiveAnchors::new();
        state.on_event("api", vis(false, 900.0));
        state.on_event("usage", vis(false, 500.0));
        let order = order(&["intro", "usage", "api"]);

        assert_eq!(active_heading(&state.snapshot(), &order), Some("usage"));
    }

    #[test]
    fn test_empty_snapshot() {
        let state: ActiveAnchors<Visibility> = ActiveAnchors::new();
        assert_eq!(active_heading(&state.snapshot(), &order(&["intro"])), None);
    }

    #[test]
    fn test_highlighter_reports_changes() {
        let mut state = ActiveAnchors::new();
        let mut highlighter = TocHighlighter::new(state.subscribe(), order(&["intro", "usage"]));
        assert!(!highlighter.poll());

        state.on_event("intro", vis(true, 0.0));
        state.on_event("usage", vis(true, 300.0));
        assert!(highlighter.poll());
        assert_eq!(highlighter.current(), Some("intro"));

        state.on_event("usage", vis(true, 250.0));
        assert!(!highlighter.poll());

        state.on_event("usage", vis(true, -5.0));
        assert!(highlighter.poll());
        assert_eq!(highlighter.current(), Some("usage"));

        state.on_remove("usage");
        assert!(highlighter.poll());
        assert_eq!(highlighter.current(), Some("intro"));
    }
}
