//! Document-order ranks for headings within one page composition.

use std::cell::Cell;
use std::fmt;

/// Document-order position of a heading.
///
/// Strictly increasing in the order headings register within one page view.
/// Only relative order is meaningful; values are not contiguous across remounts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrderRank(u64);

impl OrderRank {
    /// Raw rank value (always positive).
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for OrderRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic counter scoped to one page composition.
///
/// Owned by the page view and shared by reference with every heading factory
/// of that page. A new page gets a new counter.
#[derive(Debug, Default)]
pub struct OrderCounter {
    value: Cell<u64>,
}

impl OrderCounter {
    /// Create a counter that has issued no ranks yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the counter and return the new rank.
    pub fn next(&self) -> OrderRank {
        let next = self.value.get() + 1;
        self.value.set(next);
        OrderRank(next)
    }

    /// Last issued rank, `None` before the first call to [`next`](Self::next).
    #[must_use]
    pub fn current(&self) -> Option<OrderRank> {
        match self.value.get() {
            0 => None,
            n => Some(OrderRank(n)),
        }
    }
}
