//! Pushing font info down the element tree and harvesting text.
//!
//! [CSS Cascading 4 § 3.3 Inheritance](https://www.w3.org/TR/css-cascade-4/#inheriting)
//!
//! "Inheritance propagates property values from parent elements to their
//! children."
//!
//! The tree is walked depth first. Every element in a subtree where some
//! ancestor-or-self declared a font hands its text to the
//! [matcher](crate::matcher).

use std::collections::HashMap;

use crate::cascade::StyleMap;
use crate::matcher::{DEFAULT_WEIGHT, EffectiveFont, match_text};
use crate::model::DocumentModel;
use crate::properties::{FontInfo, FontStyle};
use crate::web_font::WebFont;

/// Node name given to `::before` / `::after` content while it is harvested.
pub const PSEUDO_NODE_NAME: &str = "#";

/// Default family, style and weight of one tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagDefault {
    /// Family list used when nothing is inherited.
    pub family: Vec<String>,
    /// Style used when nothing is inherited.
    pub style: FontStyle,
    /// Weight used when nothing is inherited.
    pub weight: u16,
}

impl Default for TagDefault {
    fn default() -> Self {
        Self {
            family: Vec::new(),
            style: FontStyle::Normal,
            weight: DEFAULT_WEIGHT,
        }
    }
}

/// Per-tag defaults that apply where no author style reaches.
///
/// Tags are looked up lowercased; unknown tags use [`TagDefault::default`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDefaults {
    tags: HashMap<String, TagDefault>,
    fallback: TagDefault,
}

impl TagDefaults {
    /// [WHATWG HTML § 15.3.4 Phrasing content](https://html.spec.whatwg.org/multipage/rendering.html#phrasing-content-3)
    ///
    /// "address, cite, dfn, em, i, var { font-style: italic; }
    /// b, strong { font-weight: bolder; }
    /// code, kbd, samp, tt { font-family: monospace; }"
    ///
    /// plus `pre` from § 15.3.3, the headings from § 15.3.6 and `th` from
    /// § 15.3.8. `bolder` is taken as `bold`.
    #[must_use]
    pub fn html() -> Self {
        let mut defaults = Self::default();
        for tag in ["code", "kbd", "pre", "samp"] {
            defaults.set(tag, |d| d.family = vec!["monospace".to_string()]);
        }
        for tag in ["b", "h1", "h2", "h3", "h4", "h5", "h6", "strong", "th"] {
            defaults.set(tag, |d| d.weight = 700);
        }
        for tag in ["address", "cite", "dfn", "em", "i", "var"] {
            defaults.set(tag, |d| d.style = FontStyle::Italic);
        }
        defaults
    }

    /// Adjust the defaults of `tag`, starting from the fallback.
    pub fn set(&mut self, tag: &str, update: impl FnOnce(&mut TagDefault)) {
        let entry = self
            .tags
            .entry(tag.to_ascii_lowercase())
            .or_insert_with(|| self.fallback.clone());
        update(entry);
    }

    /// The defaults of `tag`.
    #[must_use]
    pub fn get(&self, tag: &str) -> &TagDefault {
        self.tags
            .get(&tag.to_ascii_lowercase())
            .unwrap_or(&self.fallback)
    }

    /// Fill the gaps of inherited info with the defaults of `tag`.
    #[must_use]
    pub fn effective(&self, tag: Option<&str>, inherited: &FontInfo) -> EffectiveFont {
        let defaults = tag.map_or(&self.fallback, |tag| self.get(tag));
        EffectiveFont {
            family: if inherited.family.is_empty() {
                defaults.family.clone()
            } else {
                inherited.family.clone()
            },
            style: inherited.style.unwrap_or(defaults.style),
            weight: inherited.weight.unwrap_or(defaults.weight),
        }
    }
}

/// The text an element contributes: its text content, or the placeholder of
/// an empty form control.
fn element_text<M: DocumentModel>(model: &M, node: M::Node, name: &str) -> String {
    let text = model.text_content(node);
    let is_form_control = name.eq_ignore_ascii_case("input") || name.eq_ignore_ascii_case("textarea");
    if text.is_empty() && is_form_control {
        return model
            .attribute(node, "placeholder")
            .unwrap_or_default()
            .to_string();
    }
    text
}

/// The text as written plus its lowercase and uppercase forms, so glyphs for
/// text transformed by `text-transform` are kept too.
fn with_case_variants(text: &str) -> String {
    let mut harvest = String::with_capacity(text.len() * 3);
    harvest.push_str(text);
    harvest.push_str(&text.to_lowercase());
    harvest.push_str(&text.to_uppercase());
    harvest
}

/// Walk state shared by the recursion.
struct Propagation<'a, M: DocumentModel> {
    model: &'a M,
    styled: &'a StyleMap<M::Node>,
    web_fonts: &'a mut [WebFont],
    tag_defaults: &'a TagDefaults,
}

impl<M: DocumentModel> Propagation<'_, M> {
    fn harvest(&mut self, name: &str, inherited: &FontInfo, text: &str) {
        let font = self.tag_defaults.effective(Some(name), inherited);
        match_text(&font, &with_case_variants(text), self.web_fonts);
    }

    fn visit(&mut self, node: M::Node, inherited: &FontInfo, mut have_font_style: bool) {
        let model = self.model;
        let styled_map = self.styled;
        let styled = styled_map.get(&node);
        let mut inherited = inherited.clone();

        // STEP 1: Layer the element's own font info over the inherited one.
        if let Some(explicit) = styled.and_then(|s| s.explicit.as_ref()) {
            inherited.merge(explicit);
            have_font_style = true;
        }

        // STEP 2: Generated content, `::before` first. Only rules that
        // declare a font create it, so it is always harvested.
        if let Some(styled) = styled {
            for child in styled.pseudo_children() {
                self.harvest(
                    PSEUDO_NODE_NAME,
                    &inherited.merged(&child.info),
                    child.text.as_deref().unwrap_or_default(),
                );
            }
        }

        // STEP 3 + 4: The element's own text, with tag defaults applied.
        if let Some(name) = model.node_name(node).filter(|_| have_font_style) {
            let text = element_text(model, node, name);
            self.harvest(name, &inherited, &text);
        }

        // STEP 5: Children inherit the merged, not the defaulted, info.
        for &child in model.children(node) {
            self.visit(child, &inherited, have_font_style);
        }
    }
}

/// Walk the element tree from the root and feed every styled element's text
/// to the matching web fonts.
pub fn propagate<M: DocumentModel>(
    model: &M,
    styled: &StyleMap<M::Node>,
    web_fonts: &mut [WebFont],
    tag_defaults: &TagDefaults,
) {
    let mut walk = Propagation {
        model,
        styled,
        web_fonts,
        tag_defaults,
    };
    walk.visit(model.root(), &FontInfo::default(), false);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::{PseudoChild, StyledNode};
    use crate::testing::{Declarations, TestDocument};

    fn font(family: &str, style: Option<&str>, weight: Option<&str>) -> WebFont {
        let src = format!("url({family}-{}.woff2)", weight.unwrap_or("x"));
        let mut pairs = vec![("font-family", family), ("src", src.as_str())];
        if let Some(style) = style {
            pairs.push(("font-style", style));
        }
        if let Some(weight) = weight {
            pairs.push(("font-weight", weight));
        }
        WebFont::from_font_face(&Declarations::new(&pairs), None).unwrap()
    }

    fn explicit(family: &[&str]) -> StyledNode {
        StyledNode {
            explicit: Some(FontInfo {
                family: family.iter().map(|f| (*f).to_string()).collect(),
                ..FontInfo::default()
            }),
            ..StyledNode::default()
        }
    }

    #[test]
    fn html_defaults() {
        let defaults = TagDefaults::html();
        assert_eq!(defaults.get("H1").weight, 700);
        assert_eq!(defaults.get("em").style, FontStyle::Italic);
        assert_eq!(defaults.get("pre").family, vec!["monospace"]);
        assert_eq!(defaults.get("div"), &TagDefault::default());
        assert_eq!(defaults.get("#text"), &TagDefault::default());
    }

    #[test]
    fn effective_prefers_inherited_values() {
        let defaults = TagDefaults::html();
        let inherited = FontInfo {
            family: vec!["\"A\"".into()],
            style: None,
            weight: Some(300),
        };
        let code = defaults.effective(Some("code"), &inherited);
        assert_eq!(code.family, vec!["\"A\""]);
        assert_eq!(code.weight, 300);
        let strong = defaults.effective(Some("strong"), &FontInfo::default());
        assert_eq!(strong.weight, 700);
        assert_eq!(strong.style, FontStyle::Normal);
    }

    #[test]
    fn unstyled_subtrees_harvest_nothing() {
        let mut doc = TestDocument::new();
        let body = doc.element(0, "body", "");
        let _ = doc.element(body, "p", "Plain");
        let mut fonts = vec![font("A", None, None)];
        propagate(&doc, &StyleMap::new(), &mut fonts, &TagDefaults::html());
        assert!(fonts[0].chars.is_empty());
    }

    #[test]
    fn descendants_inherit_family_and_get_case_variants() {
        let mut doc = TestDocument::new();
        let body = doc.element(0, "body", "");
        let _ = doc.element(body, "p", "Ab");
        let mut styled = StyleMap::new();
        let _ = styled.insert(body, explicit(&["\"A\""]));
        let mut fonts = vec![font("A", None, None)];
        propagate(&doc, &styled, &mut fonts, &TagDefaults::html());
        assert_eq!(fonts[0].chars_string(), "ABab");
    }

    #[test]
    fn tag_defaults_apply_per_node_and_do_not_inherit() {
        let mut doc = TestDocument::new();
        let h1 = doc.element(0, "h1", "");
        let _ = doc.text(h1, "H");
        let span = doc.element(h1, "span", "");
        let _ = doc.text(span, "s");
        let mut styled = StyleMap::new();
        let _ = styled.insert(h1, explicit(&["\"A\""]));
        let mut fonts = vec![font("A", None, Some("400")), font("A", None, Some("700"))];
        propagate(&doc, &styled, &mut fonts, &TagDefaults::html());
        // The heading's whole text content is bold. Its text nodes and the
        // span get the fallback weight, so the regular face sees it all too.
        assert_eq!(fonts[1].chars_string(), "HShs");
        assert_eq!(fonts[0].chars_string(), "HShs");
    }

    #[test]
    fn empty_inputs_use_their_placeholder() {
        let mut doc = TestDocument::new();
        let input = doc.element(0, "INPUT", "");
        let _ = doc.nodes[input]
            .attributes
            .insert("placeholder".into(), "Go".into());
        let mut styled = StyleMap::new();
        let _ = styled.insert(input, explicit(&["\"A\""]));
        let mut fonts = vec![font("A", None, None)];
        propagate(&doc, &styled, &mut fonts, &TagDefaults::html());
        assert_eq!(fonts[0].chars_string(), "GOgo");
    }

    #[test]
    fn pseudo_content_uses_its_own_font() {
        let mut doc = TestDocument::new();
        let body = doc.element(0, "body", "");
        let h1 = doc.element(body, "h1", "x");
        let mut styled = StyleMap::new();
        let _ = styled.insert(body, explicit(&["\"Text\""]));
        let _ = styled.insert(
            h1,
            StyledNode {
                before: Some(PseudoChild {
                    info: FontInfo {
                        family: vec!["\"Icons\"".into()],
                        ..FontInfo::default()
                    },
                    text: Some("\u{e600}".into()),
                }),
                ..StyledNode::default()
            },
        );
        let mut fonts = vec![font("Text", None, None), font("Icons", None, None)];
        propagate(&doc, &styled, &mut fonts, &TagDefaults::html());
        assert_eq!(fonts[1].chars_string(), "\u{e600}");
        assert_eq!(fonts[0].chars_string(), "Xx");
    }

    #[test]
    fn pseudo_fonts_apply_without_a_styled_ancestor() {
        let mut doc = TestDocument::new();
        let p = doc.element(0, "p", "body text");
        let mut styled = StyleMap::new();
        let mut node = StyledNode::default();
        let after = node.pseudo_mut(crate::cascade::PseudoElement::After);
        after.info.family = vec!["\"Icons\"".into()];
        after.text = Some("*".into());
        let _ = styled.insert(p, node);
        let mut fonts = vec![font("Icons", None, None)];
        propagate(&doc, &styled, &mut fonts, &TagDefaults::html());
        assert_eq!(fonts[0].chars_string(), "*");
    }
}
