//! Font resolution engine.
//!
//! Given a document (an element tree plus its style rules, see
//! [`DocumentModel`]), find out which characters each downloadable font has to
//! render. The pipeline runs in four stages:
//!
//! 1. **Extraction** ([`web_font`]): every `@font-face` rule becomes a
//!    [`WebFont`] descriptor.
//! 2. **Cascade** ([`cascade`]): style rules and inline styles are applied to
//!    the elements they select, producing per-element font info and
//!    `::before` / `::after` text.
//! 3. **Propagation** ([`inherit`]): font info flows down the tree; every
//!    element below a declared font hands its text on.
//! 4. **Matching** ([`matcher`]): the text goes to the best face of every
//!    family in the element's `font-family` list.
//!
//! The engine is single-threaded per document and keeps no global state
//! besides the deduplicated warnings of `fontsieve-common`.

pub mod cascade;
pub mod content;
pub mod inherit;
pub mod matcher;
pub mod model;
pub mod properties;
pub mod shorthand;
pub mod text;
pub mod web_font;

#[cfg(test)]
mod testing;

pub use cascade::{PseudoElement, StyleMap, walk_cascade};
pub use content::{ContentError, ContentToken, parse_content};
pub use inherit::{TagDefault, TagDefaults, propagate};
pub use matcher::{EffectiveFont, StyleOrder, match_text};
pub use model::{CssRule, DocumentModel, SelectorError, StyleDeclaration};
pub use properties::{FontInfo, FontStyle};
pub use shorthand::{FontShorthand, parse_font_shorthand};
pub use web_font::{FontFile, FontFormat, WebFont, extract_web_fonts};

/// Run the whole pipeline over one document and return its web fonts, in
/// `@font-face` order, with their harvested characters and selectors.
///
/// Documents without usable `@font-face` rules return early, before any
/// selector is evaluated.
#[must_use]
pub fn resolve_web_fonts<M: DocumentModel>(model: &M, tag_defaults: &TagDefaults) -> Vec<WebFont> {
    let rules = model.rules();
    let mut web_fonts = extract_web_fonts(rules.iter().filter_map(|rule| match rule {
        CssRule::FontFace { style, base_url } => Some((*style, *base_url)),
        CssRule::Style { .. } => None,
    }));

    if web_fonts.is_empty() {
        return web_fonts;
    }

    let styled = walk_cascade(model, &mut web_fonts);
    propagate(model, &styled, &mut web_fonts, tag_defaults);
    web_fonts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Declarations, TestDocument};

    #[test]
    fn no_font_faces_short_circuits() {
        let mut doc = TestDocument::new();
        let _ = doc.element(0, "p", "x");
        // A rejected selector would warn if the cascade ran.
        doc.style_rules = vec![("p!".into(), Declarations::new(&[("font-family", "A")]))];
        assert!(resolve_web_fonts(&doc, &TagDefaults::html()).is_empty());
    }

    #[test]
    fn heading_in_brand_font() {
        let mut doc = TestDocument::new();
        let body = doc.element(0, "body", "");
        let h1 = doc.element(body, "h1", "Hi");
        doc.select("h1", &[h1]);
        doc.font_faces = vec![Declarations::new(&[
            ("font-family", "Brand"),
            ("src", "url(brand.woff2) format('woff2')"),
        ])];
        doc.style_rules = vec![("h1".into(), Declarations::new(&[("font-family", "Brand")]))];

        let fonts = resolve_web_fonts(&doc, &TagDefaults::html());
        assert_eq!(fonts.len(), 1);
        assert_eq!(fonts[0].chars_string(), "HIhi");
        assert_eq!(fonts[0].selectors, vec!["h1"]);
    }
}
