//! Applying style rules to elements.
//!
//! [CSS Cascading 4 § 6 Cascading](https://www.w3.org/TR/css-cascade-4/#cascading)
//!
//! Rules are applied in document order: for every element a rule matches,
//! the font info the rule declares is layered over what earlier rules left
//! (see [`FontInfo::merge`]). Specificity is not modeled. Results go into a
//! side table keyed by node, so the element tree is never touched; the
//! table is complete before propagation starts.
//!
//! Selectors are evaluated structurally: pseudo-classes are removed before
//! querying, and `::before` / `::after` selectors are evaluated for their
//! originating element.

use std::collections::HashMap;

use fontsieve_common::warning::warn_once;
use strum_macros::Display;

use crate::content::{ContentToken, parse_content, render_content};
use crate::model::{CssRule, DocumentModel, StyleDeclaration};
use crate::properties::FontInfo;
use crate::text::split_unquoted_commas;
use crate::web_font::WebFont;

/// Elements whose `style` attribute may declare a font.
pub const INLINE_STYLE_SELECTOR: &str = r#"body[style*="font"], body [style*="font"]"#;

/// [CSS Pseudo-Elements 4 § 4 Generated content](https://www.w3.org/TR/css-pseudo-4/#generated-content)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum PseudoElement {
    /// "Represents a styleable child pseudo-element immediately before the
    /// originating element's actual content."
    Before,
    /// "Represents a styleable child pseudo-element immediately after the
    /// originating element's actual content."
    After,
}

/// Generated content of one element, not part of the element tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PseudoChild {
    /// Font info declared by the pseudo-element's rules.
    pub info: FontInfo,
    /// The rendered `content`, `None` while no rule has set one.
    pub text: Option<String>,
}

/// What the cascade found out about one element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyledNode {
    /// Font info declared for the element itself, if any rule or its inline
    /// style declared one.
    pub explicit: Option<FontInfo>,
    /// `::before` content.
    pub before: Option<PseudoChild>,
    /// `::after` content.
    pub after: Option<PseudoChild>,
}

impl StyledNode {
    /// Layer `info` over the element's explicit font info.
    pub fn merge_explicit(&mut self, info: &FontInfo) {
        match &mut self.explicit {
            Some(explicit) => explicit.merge(info),
            None => self.explicit = Some(info.clone()),
        }
    }

    /// The slot for `pseudo`, created on first use.
    pub fn pseudo_mut(&mut self, pseudo: PseudoElement) -> &mut PseudoChild {
        let slot = match pseudo {
            PseudoElement::Before => &mut self.before,
            PseudoElement::After => &mut self.after,
        };
        slot.get_or_insert_with(PseudoChild::default)
    }

    /// Pseudo-children that have content, `::before` first.
    #[must_use]
    pub fn pseudo_children(&self) -> impl Iterator<Item = &PseudoChild> {
        [self.before.as_ref(), self.after.as_ref()]
            .into_iter()
            .flatten()
            .filter(|child| child.text.is_some())
    }
}

/// Side table produced by [`walk_cascade`].
pub type StyleMap<N> = HashMap<N, StyledNode>;

/// Split off a trailing `::before` / `::after` (or the legacy one-colon
/// form), returning the pseudo-element and the originating selector.
#[must_use]
pub fn split_pseudo_element(selector: &str) -> Option<(PseudoElement, &str)> {
    const SUFFIXES: [(&str, PseudoElement); 4] = [
        ("::before", PseudoElement::Before),
        ("::after", PseudoElement::After),
        (":before", PseudoElement::Before),
        (":after", PseudoElement::After),
    ];
    let lower = selector.to_ascii_lowercase();
    SUFFIXES.iter().find_map(|(suffix, pseudo)| {
        lower
            .ends_with(suffix)
            .then(|| (*pseudo, &selector[..selector.len() - suffix.len()]))
    })
}

/// Remove every pseudo-class and pseudo-element, with its argument list.
///
/// A compound that consisted only of pseudos becomes `*`, so `ul > :hover`
/// turns into `ul > *`. Colons inside quotes and attribute brackets are
/// left alone.
#[must_use]
pub fn strip_pseudo_classes(selector: &str) -> String {
    let chars: Vec<char> = selector.chars().collect();
    let mut out = String::with_capacity(selector.len());
    let mut quote: Option<char> = None;
    let mut brackets = 0usize;
    let mut i = 0;

    let ends_compound =
        |c: Option<&char>| c.is_none_or(|&c| c.is_whitespace() || matches!(c, '>' | '+' | '~' | ','));

    while let Some(&c) = chars.get(i) {
        if let Some(q) = quote {
            out.push(c);
            if c == '\\' {
                if let Some(&escaped) = chars.get(i + 1) {
                    out.push(escaped);
                    i += 1;
                }
            } else if c == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        match c {
            '"' | '\'' => quote = Some(c),
            '[' => brackets += 1,
            ']' => brackets = brackets.saturating_sub(1),
            '\\' => {
                out.push(c);
                if let Some(&escaped) = chars.get(i + 1) {
                    out.push(escaped);
                    i += 1;
                }
                i += 1;
                continue;
            }
            ':' if brackets == 0 => {
                let starts_compound = ends_compound(out.chars().next_back().as_ref());
                // Colons, name, then an optional balanced argument list.
                while chars.get(i) == Some(&':') {
                    i += 1;
                }
                while chars
                    .get(i)
                    .is_some_and(|&c| c.is_alphanumeric() || c == '-' || c == '_')
                {
                    i += 1;
                }
                if chars.get(i) == Some(&'(') {
                    let mut depth = 0usize;
                    let mut arg_quote: Option<char> = None;
                    while let Some(&c) = chars.get(i) {
                        i += 1;
                        match (arg_quote, c) {
                            (Some(q), _) if c == q => arg_quote = None,
                            (Some(_), _) => {}
                            (None, '"' | '\'') => arg_quote = Some(c),
                            (None, '(') => depth += 1,
                            (None, ')') => {
                                depth -= 1;
                                if depth == 0 {
                                    break;
                                }
                            }
                            _ => {}
                        }
                    }
                }
                if starts_compound && ends_compound(chars.get(i)) {
                    out.push('*');
                }
                continue;
            }
            _ => {}
        }
        out.push(c);
        i += 1;
    }

    out
}

/// The selector handed to the element tree for a selector of a rule.
fn element_selector(selector: &str) -> String {
    let host = split_pseudo_element(selector).map_or(selector, |(_, host)| host);
    let stripped = strip_pseudo_classes(host);
    let stripped = stripped.trim();
    if stripped.is_empty() {
        "*".to_string()
    } else {
        stripped.to_string()
    }
}

/// Query the element tree; rejected selectors match nothing.
fn select<M: DocumentModel>(model: &M, selector: &str) -> Vec<M::Node> {
    model.query_selector_all(selector).unwrap_or_else(|error| {
        warn_once("Cascade", &format!("selector {selector:?} matches nothing: {error}"));
        Vec::new()
    })
}

/// Parse a `content` value; unparseable values produce no text.
fn content_tokens(content: &str, selector: &str) -> Vec<ContentToken> {
    parse_content(content).unwrap_or_else(|error| {
        warn_once(
            "Cascade",
            &format!("content {content:?} of {selector:?} ignored: {error}"),
        );
        Vec::new()
    })
}

/// Add `selector` to every web font whose family `info` lists.
fn record_selector(web_fonts: &mut [WebFont], info: &FontInfo, selector: &str) {
    for font in web_fonts.iter_mut() {
        let quoted = font.quoted_family();
        if info.family.iter().any(|name| *name == quoted) {
            font.add_selector(selector);
        }
    }
}

/// Apply one style rule. Rules that declare no font are skipped.
fn apply_rule<M: DocumentModel>(
    model: &M,
    selector_text: &str,
    style: &M::Declaration,
    web_fonts: &mut [WebFont],
    styled: &mut StyleMap<M::Node>,
) {
    let info = FontInfo::from_declaration(style);
    if !info.has_font_style() {
        return;
    }
    let content = style.get("content");

    for selector in split_unquoted_commas(selector_text) {
        let selector = selector.trim();
        if selector.is_empty() {
            continue;
        }
        let nodes = select(model, &element_selector(selector));

        // A later rule with `content` replaces the generated content.
        if let (Some((pseudo, _)), Some(content)) = (split_pseudo_element(selector), content) {
            let tokens = content_tokens(content, selector);
            for &node in &nodes {
                *styled.entry(node).or_default().pseudo_mut(pseudo) = PseudoChild {
                    info: info.clone(),
                    text: Some(render_content(&tokens, |name| model.attribute(node, name))),
                };
            }
        }

        record_selector(web_fonts, &info, selector);
        for &node in &nodes {
            styled.entry(node).or_default().merge_explicit(&info);
        }
    }
}

/// Walk every style rule of the document, then every inline style, and
/// return the font info each element declares.
///
/// Selectors of rules that name a web font's family are recorded on that
/// web font along the way.
pub fn walk_cascade<M: DocumentModel>(model: &M, web_fonts: &mut [WebFont]) -> StyleMap<M::Node> {
    let mut styled = StyleMap::new();

    for rule in model.rules() {
        if let CssRule::Style { selector_text, style } = rule {
            apply_rule(model, selector_text, style, web_fonts, &mut styled);
        }
    }

    // [§ 6.1 Cascade sorting](https://www.w3.org/TR/css-cascade-4/#cascade-sort)
    // "Declarations that do not belong to a style rule (such as the contents
    // of a style attribute) are considered to be more specific than any
    // style rule."
    for node in select(model, INLINE_STYLE_SELECTOR) {
        let Some(style) = model.inline_style(node) else { continue };
        let info = FontInfo::from_declaration(&style);
        if info.has_font_style() {
            styled.entry(node).or_default().merge_explicit(&info);
        }
    }

    styled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::FontStyle;
    use crate::testing::{Declarations, TestDocument};

    #[test]
    fn splits_pseudo_elements() {
        assert_eq!(
            split_pseudo_element("h1::before"),
            Some((PseudoElement::Before, "h1"))
        );
        assert_eq!(
            split_pseudo_element(".note :AFTER"),
            Some((PseudoElement::After, ".note "))
        );
        assert_eq!(split_pseudo_element("::after"), Some((PseudoElement::After, "")));
        assert_eq!(split_pseudo_element("a::before:hover"), None);
        assert_eq!(split_pseudo_element("a.after"), None);
    }

    #[test]
    fn strips_pseudo_classes() {
        assert_eq!(strip_pseudo_classes("a:hover"), "a");
        assert_eq!(strip_pseudo_classes("li:not(.a, .b) > b"), "li > b");
        assert_eq!(strip_pseudo_classes("ul > :first-child"), "ul > *");
        assert_eq!(strip_pseudo_classes(":root"), "*");
        assert_eq!(strip_pseudo_classes("p:lang(en)::first-line"), "p");
        assert_eq!(
            strip_pseudo_classes(r#"a[href=":x"]:is(:hover, [title=")"])"#),
            r#"a[href=":x"]"#
        );
        assert_eq!(strip_pseudo_classes(r"a\:b"), r"a\:b");
    }

    #[test]
    fn element_selector_falls_back_to_universal() {
        assert_eq!(element_selector("::before"), "*");
        assert_eq!(element_selector(":hover::after"), "*");
        assert_eq!(element_selector("h1 a:visited::before"), "h1 a");
    }

    fn document_with_h1() -> (TestDocument, usize) {
        let mut doc = TestDocument::new();
        let body = doc.element(0, "body", "");
        let h1 = doc.element(body, "h1", "Hi");
        doc.select("h1", &[h1]);
        doc.select("*", &[body, h1]);
        (doc, h1)
    }

    #[test]
    fn rules_merge_in_document_order() {
        let (mut doc, h1) = document_with_h1();
        doc.style_rules = vec![
            ("h1".into(), Declarations::new(&[("font-family", "A"), ("font-weight", "300")])),
            ("h1:hover".into(), Declarations::new(&[("font-style", "italic")])),
            ("h1".into(), Declarations::new(&[("font-family", "inherit")])),
        ];
        let styled = walk_cascade(&doc, &mut []);
        let explicit = styled[&h1].explicit.clone().unwrap();
        assert_eq!(explicit.family, vec!["\"A\""]);
        assert_eq!(explicit.style, Some(FontStyle::Italic));
        assert_eq!(explicit.weight, Some(300));
    }

    #[test]
    fn rejected_selectors_match_nothing() {
        let (mut doc, h1) = document_with_h1();
        doc.style_rules = vec![(
            "h1!, h1".into(),
            Declarations::new(&[("font-family", "A")]),
        )];
        let styled = walk_cascade(&doc, &mut []);
        assert!(styled[&h1].explicit.is_some());
        assert_eq!(styled.len(), 1);
    }

    #[test]
    fn pseudo_content_resolves_attr_per_element() {
        let mut doc = TestDocument::new();
        let first = doc.element(0, "p", "");
        let second = doc.element(0, "p", "");
        let _ = doc.nodes[first].attributes.insert("data-n".into(), "1".into());
        let _ = doc.nodes[second].attributes.insert("data-n".into(), "2".into());
        doc.select("p", &[first, second]);
        doc.style_rules = vec![(
            "p::before".into(),
            Declarations::new(&[("content", r##""#" attr(data-n)"##), ("font-family", "Icons")]),
        )];

        let styled = walk_cascade(&doc, &mut []);
        let text = |node: usize| styled[&node].before.as_ref().and_then(|c| c.text.clone());
        assert_eq!(text(first).as_deref(), Some("#1"));
        assert_eq!(text(second).as_deref(), Some("#2"));
        assert_eq!(styled[&first].before.as_ref().unwrap().info.family, vec!["\"Icons\""]);
        // The originating element is styled too.
        assert!(styled[&first].explicit.is_some());
        assert!(styled[&first].after.is_none());
    }

    #[test]
    fn before_and_after_are_separate() {
        let (mut doc, h1) = document_with_h1();
        doc.style_rules = vec![
            ("h1::before".into(), Declarations::new(&[("content", "'<'"), ("font-family", "A")])),
            ("h1::after".into(), Declarations::new(&[("content", "'>'"), ("font-weight", "bold")])),
            ("h1:before".into(), Declarations::new(&[("content", "'«'"), ("font-style", "italic")])),
        ];
        let styled = walk_cascade(&doc, &mut []);
        let node = &styled[&h1];
        let texts: Vec<_> = node.pseudo_children().map(|c| c.text.clone().unwrap()).collect();
        assert_eq!(texts, vec!["«", ">"]);
        assert_eq!(node.after.as_ref().unwrap().info.weight, Some(700));
    }

    #[test]
    fn later_content_replaces_generated_content() {
        let (mut doc, h1) = document_with_h1();
        doc.style_rules = vec![
            ("h1::before".into(), Declarations::new(&[("content", "'a'"), ("font-family", "A")])),
            ("h1::before".into(), Declarations::new(&[("font-family", "B")])),
            ("h1::before".into(), Declarations::new(&[("content", "'c'"), ("font-weight", "300")])),
        ];
        let styled = walk_cascade(&doc, &mut []);
        let before = styled[&h1].before.clone().unwrap();
        assert_eq!(before.text.as_deref(), Some("c"));
        assert!(before.info.family.is_empty());
        assert_eq!(before.info.weight, Some(300));
        // Every rule still styles the originating element.
        assert_eq!(styled[&h1].explicit.as_ref().unwrap().family, vec!["\"B\""]);
    }

    #[test]
    fn content_without_font_is_ignored() {
        let (mut doc, h1) = document_with_h1();
        doc.style_rules = vec![
            ("h1".into(), Declarations::new(&[("font-family", "A")])),
            ("h1::before".into(), Declarations::new(&[("content", "'Z'")])),
        ];
        let styled = walk_cascade(&doc, &mut []);
        assert!(styled[&h1].before.is_none());
        assert_eq!(styled[&h1].pseudo_children().count(), 0);
    }

    #[test]
    fn malformed_content_yields_empty_text() {
        let (mut doc, h1) = document_with_h1();
        doc.style_rules = vec![(
            "h1::after".into(),
            Declarations::new(&[("content", "attr("), ("font-family", "A")]),
        )];
        let styled = walk_cascade(&doc, &mut []);
        assert_eq!(styled[&h1].after.as_ref().unwrap().text.as_deref(), Some(""));
    }

    #[test]
    fn rules_without_fonts_are_ignored() {
        let (mut doc, _) = document_with_h1();
        doc.style_rules = vec![("h1".into(), Declarations::new(&[("color", "red")]))];
        assert!(walk_cascade(&doc, &mut []).is_empty());
    }

    #[test]
    fn inline_styles_layer_last() {
        let (mut doc, h1) = document_with_h1();
        doc.nodes[h1].inline = Some(Declarations::new(&[("font-style", "oblique")]));
        doc.select(INLINE_STYLE_SELECTOR, &[h1]);
        doc.style_rules = vec![(
            "h1".into(),
            Declarations::new(&[("font", "italic 12px A")]),
        )];
        let styled = walk_cascade(&doc, &mut []);
        let explicit = styled[&h1].explicit.clone().unwrap();
        assert_eq!(explicit.style, Some(FontStyle::Oblique));
        assert_eq!(explicit.family, vec!["\"A\""]);
    }

    #[test]
    fn records_selectors_on_named_fonts() {
        let (mut doc, _) = document_with_h1();
        doc.style_rules = vec![
            ("h1, .title".into(), Declarations::new(&[("font-family", "'Brand', serif")])),
            ("h1".into(), Declarations::new(&[("font-family", "Brand")])),
            ("p".into(), Declarations::new(&[("font-family", "Other")])),
        ];
        let face = Declarations::new(&[("font-family", "Brand"), ("src", "url(b.woff2)")]);
        let mut fonts = vec![WebFont::from_font_face(&face, None).unwrap()];
        let _ = walk_cascade(&doc, &mut fonts);
        assert_eq!(fonts[0].selectors, vec!["h1", ".title"]);
    }
}
