//! Mock observer for testing.
//!
//! Provides [`RecordingObserver`], which records observe/unobserve calls and
//! replays batches injected by the test.

use std::collections::BTreeSet;

use crate::observer::{Visibility, VisibilityObserver, VisibilityRecord};
use crate::registry::AnchorHandle;

/// Observer that records calls and replays injected batches.
///
/// For tests of code built on top of the tracking layer.
#[derive(Debug, Default)]
pub struct RecordingObserver<D = Visibility> {
    observed: BTreeSet<AnchorHandle>,
    pending: Vec<VisibilityRecord<D>>,
    /// Every `observe` call in order.
    pub observe_calls: Vec<AnchorHandle>,
    /// Every `unobserve` call in order.
    pub unobserve_calls: Vec<AnchorHandle>,
    /// Number of `disconnect` calls.
    pub disconnects: usize,
}

impl<D> RecordingObserver<D> {
    /// Create an observer with no handles and no pending records.
    #[must_use]
    pub fn new() -> Self {
        Self {
            observed: BTreeSet::new(),
            pending: Vec::new(),
            observe_calls: Vec::new(),
            unobserve_calls: Vec::new(),
            disconnects: 0,
        }
    }

    /// Queue a record for `handle`.
    ///
    /// Ignored when `handle` is not observed, like a real observer would.
    pub fn push(&mut self, handle: AnchorHandle, datum: D) {
        if self.observed.contains(&handle) {
            self.pending.push(VisibilityRecord { handle, datum });
        }
    }

    /// Queue a record without checking observation state.
    ///
    /// Simulates a misbehaving observer that fires after teardown.
    pub fn push_unchecked(&mut self, handle: AnchorHandle, datum: D) {
        self.pending.push(VisibilityRecord { handle, datum });
    }
}

impl<D: Clone + PartialEq> VisibilityObserver for RecordingObserver<D> {
    type Datum = D;

    fn observe(&mut self, handle: AnchorHandle) {
        self.observed.insert(handle);
        self.observe_calls.push(handle);
    }

    fn unobserve(&mut self, handle: AnchorHandle) {
        self.observed.remove(&handle);
        self.pending.retain(|record| record.handle != handle);
        self.unobserve_calls.push(handle);
    }

    fn disconnect(&mut self) {
        self.observed.clear();
        self.pending.clear();
        self.disconnects += 1;
    }

    fn is_observing(&self, handle: AnchorHandle) -> bool {
        self.observed.contains(&handle)
    }

    fn take_records(&mut self) -> Vec<VisibilityRecord<D>> {
        std::mem::take(&mut self.pending)
    }
}
