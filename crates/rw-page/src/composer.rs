//! Markdown page composition.
//!
//! [`PageComposer`] walks a markdown document and renders it to HTML. Every
//! heading is built through the page view's heading factories, so the
//! composed page carries one [`HeadingElement`] per heading, ready to be
//! mounted for anchor tracking.

use pulldown_cmark::{CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};
use rw_anchors::{
    HeadingElement, HeadingMarkup, HeadingProps, HeadingTag, MountedHeading, PageView,
    ViewportObserver, VisibilityObserver,
};
use rw_config::Config;

use crate::slug::SlugGenerator;
use crate::toc::{TocEntry, TocNode, build_toc_tree};

/// Options controlling page composition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComposeOptions {
    /// Extract the first H1 as page title (still rendered, left out of the ToC).
    pub extract_title: bool,
    /// Shallowest heading level listed in the ToC.
    pub toc_min_level: u8,
    /// Deepest heading level listed in the ToC.
    pub toc_max_level: u8,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            extract_title: true,
            toc_min_level: 2,
            toc_max_level: 3,
        }
    }
}

impl ComposeOptions {
    /// Options derived from the theme configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            extract_title: true,
            toc_min_level: config.toc.min_heading_level,
            toc_max_level: config.toc.max_heading_level,
        }
    }

    fn in_toc(&self, level: u8) -> bool {
        (self.toc_min_level..=self.toc_max_level).contains(&level)
    }
}

/// Create the tracking scope for one page from the theme configuration.
#[must_use]
pub fn page_view(config: &Config) -> PageView<ViewportObserver> {
    let markup = HeadingMarkup {
        permalink: config.headings.permalink,
        permalink_symbol: config.headings.permalink_symbol.clone(),
    };
    PageView::with_markup(ViewportObserver::new(config.anchors.viewport_offset), markup)
}

/// Result of composing a page.
pub struct ComposedPage<O: VisibilityObserver> {
    /// Rendered HTML.
    pub html: String,
    /// Title extracted from the first H1 heading.
    pub title: Option<String>,
    /// Table of contents entries in document order.
    pub toc: Vec<TocEntry>,
    /// Heading elements in document order.
    pub headings: Vec<HeadingElement<O>>,
}

impl<O: VisibilityObserver> ComposedPage<O> {
    /// Mount every heading in document order.
    ///
    /// Dropping the returned guards tears the headings down again.
    #[must_use]
    pub fn mount_all(&self) -> Vec<MountedHeading<O>> {
        self.headings.iter().map(HeadingElement::mount).collect()
    }

    /// Identifiers of the ToC entries in document order.
    #[must_use]
    pub fn toc_order(&self) -> Vec<String> {
        self.toc.iter().map(|entry| entry.id.clone()).collect()
    }

    /// ToC entries nested by level.
    #[must_use]
    pub fn toc_tree(&self) -> Vec<TocNode> {
        build_toc_tree(&self.toc)
    }
}

/// Heading being captured between its start and end events.
struct HeadingCapture<'a> {
    level: u8,
    id: Option<String>,
    attrs: Vec<(String, String)>,
    text: String,
    events: Vec<Event<'a>>,
}

/// Renders markdown into a page whose headings belong to `page`.
pub struct PageComposer<'p, O: VisibilityObserver> {
    page: &'p PageView<O>,
    options: ComposeOptions,
}

impl<'p, O: VisibilityObserver> PageComposer<'p, O> {
    /// Create a composer with default options.
    #[must_use]
    pub fn new(page: &'p PageView<O>) -> Self {
        Self {
            page,
            options: ComposeOptions::default(),
        }
    }

    /// Set composition options.
    #[must_use]
    pub fn with_options(mut self, options: ComposeOptions) -> Self {
        self.options = options;
        self
    }

    /// Compose `markdown` into a page.
    #[allow(clippy::too_many_lines)]
    pub fn compose(&self, markdown: &str) -> ComposedPage<O> {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

        // Explicit ids win over generated slugs regardless of position.
        let mut slugs = SlugGenerator::default();
        for event in Parser::new_ext(markdown, options) {
            if let Event::Start(Tag::Heading { id: Some(id), .. }) = event {
                slugs.reserve(&id);
            }
        }

        let mut events: Vec<Event<'_>> = Vec::new();
        let mut capture: Option<HeadingCapture<'_>> = None;
        let mut title = None;
        let mut toc = Vec::new();
        let mut headings = Vec::new();

        for event in Parser::new_ext(markdown, options) {
            match event {
                Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }) => {
                    let mut pass_through = Vec::new();
                    if !classes.is_empty() {
                        let classes: Vec<String> = classes.iter().map(ToString::to_string).collect();
                        pass_through.push(("class".to_owned(), classes.join(" ")));
                    }
                    for (name, value) in attrs {
                        pass_through.push((
                            name.to_string(),
                            value.map(|v| v.to_string()).unwrap_or_default(),
                        ));
                    }
                    capture = Some(HeadingCapture {
                        level: heading_level_to_num(level),
                        id: id.map(|id| id.to_string()),
                        attrs: pass_through,
                        text: String::new(),
                        events: Vec::new(),
                    });
                }
                Event::End(TagEnd::Heading(_)) => {
                    let Some(heading) = capture.take() else {
                        continue;
                    };
                    let level = heading.level;
                    let text = heading.text.trim().to_owned();
                    let id = heading.id.unwrap_or_else(|| slugs.generate(&text));

                    let is_title = self.options.extract_title && level == 1 && title.is_none();
                    if is_title {
                        title = Some(text.clone());
                    } else if !id.is_empty() && self.options.in_toc(level) {
                        toc.push(TocEntry {
                            level,
                            title: text.clone(),
                            id: id.clone(),
                        });
                    }

                    let mut inner = String::new();
                    html::push_html(&mut inner, heading.events.into_iter());

                    let mut props = HeadingProps::new(inner).with_label(text);
                    props.attrs = heading.attrs;
                    if !id.is_empty() {
                        props = props.with_id(id);
                    }

                    let Some(tag) = HeadingTag::from_level(level) else {
                        continue;
                    };
                    let element = self.page.factory(tag).create(props);
                    let mut markup = element.to_html();
                    markup.push('\n');
                    events.push(Event::Html(CowStr::from(markup)));
                    headings.push(element);
                }
                other => {
                    if let Some(heading) = capture.as_mut() {
                        if let Event::Text(text) | Event::Code(text) = &other {
                            heading.text.push_str(text);
                        }
                        heading.events.push(other);
                    } else {
                        events.push(other);
                    }
                }
            }
        }

        let mut html_out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut html_out, events.into_iter());

        tracing::debug!(
            headings = headings.len(),
            toc_entries = toc.len(),
            "Composed page"
        );

        ComposedPage {
            html: html_out,
            title,
            toc,
            headings,
        }
    }
}

/// Convert heading level enum to number (1-6).
fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
