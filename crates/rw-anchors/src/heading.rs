//! Heading elements and their mount/unmount protocol.
//!
//! A [`HeadingFactory`] is bound to one heading tag and to the order counter
//! of a page view. Each [`HeadingElement`] it creates owns one
//! [`AnchorHandle`]. Mounting a heading that carries an identifier runs the
//! registration steps and returns a [`MountedHeading`] guard; dropping the
//! guard (or calling [`MountedHeading::unmount`]) runs the teardown steps.
//!
//! ```text
//! Unmounted -> Registering -> Active -> Unregistering -> Unmounted
//! ```
//!
//! Headings without an identifier render as plain elements and never leave
//! `Unmounted`.

use std::fmt::Write;
use std::rc::{Rc, Weak};

use crate::observer::VisibilityObserver;
use crate::order::OrderRank;
use crate::page::{MountToken, PageScope};
use crate::registry::AnchorHandle;

/// Heading tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HeadingTag {
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
}

impl HeadingTag {
    /// Tag for a numeric level (1-6).
    #[must_use]
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(Self::H1),
            2 => Some(Self::H2),
            3 => Some(Self::H3),
            4 => Some(Self::H4),
            5 => Some(Self::H5),
            6 => Some(Self::H6),
            _ => None,
        }
    }

    /// Numeric level (1-6).
    #[must_use]
    pub fn level(self) -> u8 {
        match self {
            Self::H1 => 1,
            Self::H2 => 2,
            Self::H3 => 3,
            Self::H4 => 4,
            Self::H5 => 5,
            Self::H6 => 6,
        }
    }

    /// HTML element name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::H1 => "h1",
            Self::H2 => "h2",
            Self::H3 => "h3",
            Self::H4 => "h4",
            Self::H5 => "h5",
            Self::H6 => "h6",
        }
    }
}

/// How headings render their permalink affordance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeadingMarkup {
    /// Whether tracked headings get a permalink anchor.
    pub permalink: bool,
    /// Text of the permalink anchor.
    pub permalink_symbol: String,
}

impl Default for HeadingMarkup {
    fn default() -> Self {
        Self {
            permalink: true,
            permalink_symbol: "#".to_owned(),
        }
    }
}

/// Construction request for a heading element.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeadingProps {
    /// Inner HTML of the heading.
    pub content: String,
    /// Anchor identifier. Empty or missing means untracked.
    pub id: Option<String>,
    /// Plain-text label for the permalink's `aria-label`.
    pub label: Option<String>,
    /// Extra attributes passed through to the element.
    pub attrs: Vec<(String, String)>,
}

impl HeadingProps {
    /// Props with the given inner HTML.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// Set the anchor identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the plain-text label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Add a pass-through attribute.
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }
}

/// Lifecycle state of one heading mount.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeadingLifecycle {
    /// Not registered.
    Unmounted,
    /// Registration steps in progress.
    Registering,
    /// Registered and observed.
    Active,
    /// Teardown steps in progress.
    Unregistering,
}

/// Builds heading elements of one tag for one page view.
pub struct HeadingFactory<O: VisibilityObserver> {
    tag: HeadingTag,
    scope: Rc<PageScope<O>>,
}

impl<O: VisibilityObserver> HeadingFactory<O> {
    pub(crate) fn new(tag: HeadingTag, scope: Rc<PageScope<O>>) -> Self {
        Self { tag, scope }
    }

    /// Tag this factory produces.
    #[must_use]
    pub fn tag(&self) -> HeadingTag {
        self.tag
    }

    /// Build a heading element.
    #[must_use]
    pub fn create(&self, props: HeadingProps) -> HeadingElement<O> {
        let HeadingProps {
            content,
            id,
            label,
            attrs,
        } = props;
        HeadingElement {
            tag: self.tag,
            id: id.filter(|id| !id.is_empty()),
            label,
            content,
            attrs,
            handle: self.scope.allocate_handle(),
            scope: Rc::downgrade(&self.scope),
        }
    }
}

/// A renderable heading bound to a page view.
pub struct HeadingElement<O: VisibilityObserver> {
    tag: HeadingTag,
    id: Option<String>,
    label: Option<String>,
    content: String,
    attrs: Vec<(String, String)>,
    handle: AnchorHandle,
    scope: Weak<PageScope<O>>,
}

impl<O: VisibilityObserver> HeadingElement<O> {
    /// Heading tag.
    #[must_use]
    pub fn tag(&self) -> HeadingTag {
        self.tag
    }

    /// Anchor identifier, `None` for untracked headings.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Anchor handle owned by this element.
    #[must_use]
    pub fn handle(&self) -> AnchorHandle {
        self.handle
    }

    /// Whether mounting this heading registers it for tracking.
    #[must_use]
    pub fn is_tracked(&self) -> bool {
        self.id.is_some()
    }

    /// Mount the heading.
    ///
    /// Tracked headings draw a rank, register in the slug registry and start
    /// being observed. Mounting an element that is already mounted replaces
    /// the earlier registration with a fresh rank; the earlier guard's
    /// teardown becomes a no-op.
    pub fn mount(&self) -> MountedHeading<O> {
        let mut mounted = MountedHeading {
            handle: self.handle,
            identifier: self.id.clone(),
            rank: None,
            token: None,
            state: HeadingLifecycle::Unmounted,
            scope: Weak::clone(&self.scope),
        };

        let Some(identifier) = self.id.as_deref() else {
            return mounted;
        };
        let Some(scope) = self.scope.upgrade() else {
            tracing::debug!(identifier, "Heading mounted after its page view ended");
            return mounted;
        };

        mounted.state = HeadingLifecycle::Registering;
        let (rank, token) = scope.register(self.handle, identifier);
        mounted.rank = Some(rank);
        mounted.token = Some(token);
        mounted.state = HeadingLifecycle::Active;
        mounted
    }

    /// Render the heading as HTML.
    ///
    /// Attribute values are escaped; `content` is trusted HTML.
    #[must_use]
    pub fn to_html(&self) -> String {
        let tag = self.tag.as_str();
        let mut html = String::with_capacity(self.content.len() + 64);
        html.push('<');
        html.push_str(tag);
        if let Some(id) = &self.id {
            write!(html, r#" id="{}""#, escape_html(id)).unwrap();
        }
        for (name, value) in &self.attrs {
            write!(html, r#" {}="{}""#, escape_html(name), escape_html(value)).unwrap();
        }
        html.push('>');
        html.push_str(self.content.trim());

        if let Some(id) = &self.id
            && let Some(scope) = self.scope.upgrade()
            && scope.markup().permalink
        {
            let label = self.label.as_deref().unwrap_or(id);
            write!(
                html,
                r##"<a href="#{}" class="hash-link" aria-label="Direct link to {}">{}</a>"##,
                escape_html(id),
                escape_html(label),
                escape_html(&scope.markup().permalink_symbol),
            )
            .unwrap();
        }

        write!(html, "</{tag}>").unwrap();
        html
    }
}

/// Guard for one mount of a heading.
///
/// Dropping the guard runs the teardown steps, so teardown happens on every
/// exit path, unwinding included.
pub struct MountedHeading<O: VisibilityObserver> {
    handle: AnchorHandle,
    identifier: Option<String>,
    rank: Option<OrderRank>,
    token: Option<MountToken>,
    state: HeadingLifecycle,
    scope: Weak<PageScope<O>>,
}

impl<O: VisibilityObserver> MountedHeading<O> {
    /// Anchor handle of the mounted heading.
    #[must_use]
    pub fn handle(&self) -> AnchorHandle {
        self.handle
    }

    /// Identifier, `None` for untracked headings.
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    /// Rank drawn at mount, `None` if the heading was not registered.
    #[must_use]
    pub fn rank(&self) -> Option<OrderRank> {
        self.rank
    }

    /// Lifecycle state of this mount.
    #[must_use]
    pub fn state(&self) -> HeadingLifecycle {
        self.state
    }

    /// Run the teardown steps now.
    ///
    /// Returns `true` if this call tore the registration down. Repeated calls,
    /// superseded mounts and mounts whose page view has ended return `false`.
    pub fn unmount(&mut self) -> bool {
        let Some(token) = self.token.take() else {
            return false;
        };
        self.state = HeadingLifecycle::Unregistering;
        let torn_down = self
            .scope
            .upgrade()
            .is_some_and(|scope| scope.unregister(self.handle, token));
        self.state = HeadingLifecycle::Unmounted;
        torn_down
    }
}

impl<O: VisibilityObserver> Drop for MountedHeading<O> {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::mock::RecordingObserver;
    use crate::page::PageView;

    type Page = PageView<RecordingObserver<u8>>;

    #[test]
    fn test_tag_levels() {
        for level in 1..=6 {
            let tag = HeadingTag::from_level(level).unwrap();
            assert_eq!(tag.level(), level);
            assert_eq!(tag.as_str(), format!("h{level}"));
        }
        assert_eq!(HeadingTag::from_level(0), None);
        assert_eq!(HeadingTag::from_level(7), None);
    }

    #[test]
    fn test_mount_lifecycle_states() {
        let page = Page::new(RecordingObserver::new());
        let heading = page
            .factory(HeadingTag::H2)
            .create(HeadingProps::new("Intro").with_id("intro"));
        let mut mounted = heading.mount();

        assert_eq!(mounted.state(), HeadingLifecycle::Active);
        assert!(mounted.rank().is_some());
        assert!(mounted.unmount());
        assert_eq!(mounted.state(), HeadingLifecycle::Unmounted);
        assert!(!mounted.unmount());
    }

    #[test]
    fn test_untracked_heading_skips_registration() {
        let page = Page::new(RecordingObserver::new());
        let heading = page
            .factory(HeadingTag::H3)
            .create(HeadingProps::new("Plain"));
        let mounted = heading.mount();

        assert!(!heading.is_tracked());
        assert_eq!(mounted.state(), HeadingLifecycle::Unmounted);
        assert_eq!(mounted.rank(), None);
        assert_eq!(page.registered_count(), 0);
        page.with_observer(|o| assert!(o.observe_calls.is_empty()));
    }

    #[test]
    fn test_empty_id_is_untracked() {
        let page = Page::new(RecordingObserver::new());
        let heading = page
            .factory(HeadingTag::H2)
            .create(HeadingProps::new("Empty").with_id(""));
        assert!(!heading.is_tracked());
        assert_eq!(heading.to_html(), "<h2>Empty</h2>");
    }

    #[test]
    fn test_remount_supersedes_earlier_guard() {
        let page = Page::new(RecordingObserver::new());
        let heading = page
            .factory(HeadingTag::H2)
            .create(HeadingProps::new("Intro").with_id("intro"));
        let first = heading.mount();
        let second = heading.mount();

        assert!(first.rank() < second.rank());
        assert_eq!(page.registered_count(), 1);
        assert_eq!(
            page.entry(heading.handle()).map(|e| e.rank),
            second.rank()
        );

        drop(first);
        assert_eq!(page.registered_count(), 1);
        drop(second);
        assert_eq!(page.registered_count(), 0);
    }

    #[test]
    fn test_to_html_with_permalink() {
        let page = Page::new(RecordingObserver::new());
        let heading = page.factory(HeadingTag::H2).create(
            HeadingProps::new("<code>Usage</code>")
                .with_id("usage")
                .with_label("Usage")
                .with_attr("class", "anchor"),
        );

        assert_eq!(
            heading.to_html(),
            r##"<h2 id="usage" class="anchor"><code>Usage</code><a href="#usage" class="hash-link" aria-label="Direct link to Usage">#</a></h2>"##
        );
    }

    #[test]
    fn test_to_html_without_permalink() {
        let markup = HeadingMarkup {
            permalink: false,
            permalink_symbol: "#".to_owned(),
        };
        let page = Page::with_markup(RecordingObserver::new(), markup);
        let heading = page
            .factory(HeadingTag::H4)
            .create(HeadingProps::new("Deep").with_id("deep"));
        assert_eq!(heading.to_html(), r#"<h4 id="deep">Deep</h4>"#);
    }

    #[test]
    fn test_to_html_escapes_attributes() {
        let page = Page::new(RecordingObserver::new());
        let heading = page
            .factory(HeadingTag::H2)
            .create(HeadingProps::new("Q&A").with_attr("title", r#"a "b""#));
        assert_eq!(
            heading.to_html(),
            r#"<h2 title="a &quot;b&quot;">Q&A</h2>"#
        );
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<script>"), "&lt;script&gt;");
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_html("it's"), "it&#x27;s");
    }
}
