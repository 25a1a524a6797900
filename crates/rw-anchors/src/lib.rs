//! Heading anchor registration and active-section tracking for RW pages.
//!
//! Each rendered page gets one [`PageView`]. Headings built by its
//! [`HeadingFactory`]s register their anchors on mount, are observed by the
//! page's [`VisibilityObserver`] while mounted, and tear down when their
//! [`MountedHeading`] guard drops. Observer records flow into the page's
//! [`ActiveAnchors`] state, whose snapshots drive table-of-contents
//! highlighting.
//!
//! # Example
//!
//! ```
//! use rw_anchors::{HeadingProps, HeadingTag, PageView, ViewportObserver};
//!
//! let page = PageView::new(ViewportObserver::new(60.0));
//! let h2 = page.factory(HeadingTag::H2);
//!
//! let intro = h2.create(HeadingProps::new("Intro").with_id("intro")).mount();
//! let usage = h2.create(HeadingProps::new("Usage").with_id("usage")).mount();
//! assert_eq!(page.toc_identifiers(), vec!["intro", "usage"]);
//!
//! page.with_observer(|observer| {
//!     observer.set_layout(intro.handle(), 0.0);
//!     observer.set_layout(usage.handle(), 900.0);
//!     observer.scroll_to(0.0, 800.0);
//! });
//! page.deliver();
//! assert_eq!(page.active_heading().as_deref(), Some("intro"));
//!
//! drop(intro);
//! assert!(!page.snapshot().contains("intro"));
//! ```

mod active;
mod heading;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod observer;
mod order;
mod page;
mod registry;
pub mod toc;

pub use active::{ActiveAnchors, ActiveSnapshot, SnapshotReceiver};
pub use heading::{
    HeadingElement, HeadingFactory, HeadingLifecycle, HeadingMarkup, HeadingProps, HeadingTag,
    MountedHeading, escape_html,
};
#[cfg(any(test, feature = "mock"))]
pub use mock::RecordingObserver;
pub use observer::{ViewportObserver, Visibility, VisibilityObserver, VisibilityRecord};
pub use order::{OrderCounter, OrderRank};
pub use page::PageView;
pub use registry::{AnchorHandle, Entries, RegistryEntry, SlugRegistry};
pub use toc::TocHighlighter;
