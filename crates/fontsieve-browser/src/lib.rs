//! Per-document font harvest for fontsieve.
//!
//! # Scope
//!
//! This crate provides:
//! - **Documents** - a [`DomTree`](fontsieve_dom::DomTree) plus its style
//!   sheets, implementing [`DocumentModel`](fontsieve_core::DocumentModel)
//! - **Harvest** - [`spider`] runs the font resolution pipeline over one
//!   document, [`spider_all`] over many in parallel
//!
//! # Not Yet Implemented
//!
//! - HTML parsing: callers build the tree
//! - Resource retrieval: callers supply a loader for style sheets
//! - Merging the results of several documents

pub mod document;

pub use document::{Document, StyleSheetSource, collect_stylesheet_sources};
pub use fontsieve_common::warning::clear_warnings;
pub use fontsieve_core::{TagDefaults, WebFont};

use fontsieve_core::resolve_web_fonts;
use rayon::prelude::*;

/// How documents are harvested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpiderOptions {
    /// Drop fonts whose every file is a `data:` URI. They ship inside the
    /// style sheet and cannot be subset separately.
    pub ignore_embedded: bool,
    /// Default font per tag, used where no author style applies.
    pub tag_defaults: TagDefaults,
}

impl Default for SpiderOptions {
    fn default() -> Self {
        Self {
            ignore_embedded: true,
            tag_defaults: TagDefaults::html(),
        }
    }
}

/// The web fonts of `document` with the characters each of them renders.
///
/// Fonts are listed in `@font-face` order.
#[must_use]
pub fn spider(document: &Document, options: &SpiderOptions) -> Vec<WebFont> {
    let mut web_fonts = resolve_web_fonts(document, &options.tag_defaults);
    if options.ignore_embedded {
        web_fonts.retain(|font| !font.is_embedded());
    }
    web_fonts
}

/// [`spider`] for every document, in parallel.
///
/// Results are in the order of `documents`; nothing is shared between them.
#[must_use]
pub fn spider_all(documents: &[Document], options: &SpiderOptions) -> Vec<Vec<WebFont>> {
    documents
        .par_iter()
        .map(|document| spider(document, options))
        .collect()
}
