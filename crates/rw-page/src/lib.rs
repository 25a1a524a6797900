//! Markdown page composition with tracked heading anchors.
//!
//! [`PageComposer`] renders a markdown document for one [`PageView`]:
//! headings are created through the page's heading factories, receive
//! unique slugs, and are collected together with the page's table of
//! contents. Mounting the composed headings registers them for
//! active-section tracking.
//!
//! # Example
//!
//! ```
//! use rw_config::Config;
//! use rw_page::{ComposeOptions, PageComposer, page_view};
//!
//! let config = Config::default();
//! let page = page_view(&config);
//! let composed = PageComposer::new(&page)
//!     .with_options(ComposeOptions::from_config(&config))
//!     .compose("# Guide\n\n## Install\n\n## Usage");
//!
//! assert_eq!(composed.title.as_deref(), Some("Guide"));
//! assert_eq!(composed.toc_order(), vec!["install", "usage"]);
//!
//! let mounted = composed.mount_all();
//! assert_eq!(page.toc_identifiers(), vec!["guide", "install", "usage"]);
//! drop(mounted);
//! ```

mod composer;
mod slug;
mod toc;

pub use composer::{ComposeOptions, ComposedPage, PageComposer, page_view};
pub use rw_anchors::PageView;
pub use slug::slugify;
pub use toc::{TocEntry, TocNode, build_toc_tree};
