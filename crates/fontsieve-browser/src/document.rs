//! A document as the engine sees it: element tree plus style sheets.

use fontsieve_common::url::resolve_url;
use fontsieve_common::warning::warn_once;
use fontsieve_core::{CssRule, DocumentModel, SelectorError};
use fontsieve_css::{DeclarationBlock, ImportError, StyleSheet, parse_declaration_list};
use fontsieve_dom::{DomTree, ElementData, NodeId, SelectorParseError, query_selector_all};

/// Where a style sheet of the document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleSheetSource {
    /// [§ 4.2.4 The link element](https://html.spec.whatwg.org/multipage/semantics.html#the-link-element)
    ///
    /// `<link rel="stylesheet" href="...">`, with `href` as written.
    External {
        /// The `href` attribute.
        href: String,
    },
    /// [§ 4.2.6 The style element](https://html.spec.whatwg.org/multipage/semantics.html#the-style-element)
    Inline {
        /// The `<style>` element.
        node: NodeId,
    },
}

/// [§ 4.2.4 The link element](https://html.spec.whatwg.org/multipage/semantics.html#the-link-element)
///
/// "If the rel attribute's value contains the token stylesheet, then the link
/// is a stylesheet link."
///
/// Token comparison is ASCII case-insensitive.
fn is_stylesheet_link(data: &ElementData) -> bool {
    data.attribute("rel").is_some_and(|rel| {
        rel.split_ascii_whitespace()
            .any(|token| token.eq_ignore_ascii_case("stylesheet"))
    })
}

/// [CSS Cascading 4 § 6.1](https://www.w3.org/TR/css-cascade-4/#cascade-sort)
///
/// "Declarations from style sheets independently linked by the originating
/// document are treated as if they were concatenated in linking order."
///
/// Every `<link rel=stylesheet>` with a non-empty `href` and every `<style>`
/// element, in document order.
#[must_use]
pub fn collect_stylesheet_sources(tree: &DomTree) -> Vec<StyleSheetSource> {
    tree.elements_in_tree_order()
        .into_iter()
        .filter_map(|id| {
            let data = tree.as_element(id)?;
            if data.tag_name.eq_ignore_ascii_case("link") && is_stylesheet_link(data) {
                let href = data.attribute("href")?.trim();
                (!href.is_empty()).then(|| StyleSheetSource::External {
                    href: href.to_string(),
                })
            } else if data.tag_name.eq_ignore_ascii_case("style") {
                Some(StyleSheetSource::Inline { node: id })
            } else {
                None
            }
        })
        .collect()
}

/// [§ 4.2.6](https://html.spec.whatwg.org/multipage/semantics.html#update-a-style-block)
///
/// "Let text be the child text content of element."
fn child_text_content(tree: &DomTree, id: NodeId) -> String {
    tree.children(id)
        .iter()
        .filter_map(|&child| tree.as_text(child))
        .collect()
}

/// A parsed document ready for font resolution.
#[derive(Debug, Clone)]
pub struct Document {
    tree: DomTree,
    sheets: Vec<StyleSheet>,
    base_url: Option<String>,
}

impl Document {
    /// A document from an element tree and already parsed style sheets.
    #[must_use]
    pub fn new(tree: DomTree, sheets: Vec<StyleSheet>, base_url: Option<&str>) -> Self {
        Self {
            tree,
            sheets,
            base_url: base_url.map(str::to_string),
        }
    }

    /// A document whose style sheets are read from its own `<link>` and
    /// `<style>` elements.
    ///
    /// External sheets and `@import`s are resolved against `base_url` (or the
    /// importing sheet) and fetched through `loader`. "If the resource is not
    /// available, the user agent must act as if the resource was an empty
    /// style sheet": failures are reported once and skipped.
    pub fn from_tree<F>(tree: DomTree, base_url: Option<&str>, loader: &mut F) -> Self
    where
        F: FnMut(&str) -> Result<String, ImportError>,
    {
        let mut sheets = Vec::new();

        for source in collect_stylesheet_sources(&tree) {
            let mut sheet = match source {
                StyleSheetSource::External { href } => {
                    let url = resolve_url(&href, base_url);
                    match loader(&url) {
                        Ok(css) => StyleSheet::parse(&css, Some(&url)),
                        Err(error) => {
                            warn_once("Document", &format!("stylesheet treated as empty: {error}"));
                            continue;
                        }
                    }
                }
                StyleSheetSource::Inline { node } => {
                    let css = child_text_content(&tree, node);
                    if css.trim().is_empty() {
                        continue;
                    }
                    StyleSheet::parse(&css, base_url)
                }
            };
            sheet.resolve_imports(loader);
            sheets.push(sheet);
        }

        Self::new(tree, sheets, base_url)
    }

    /// The element tree.
    #[must_use]
    pub const fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Style sheets in document order.
    #[must_use]
    pub fn sheets(&self) -> &[StyleSheet] {
        &self.sheets
    }

    /// The document's location.
    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }
}

impl DocumentModel for Document {
    type Node = NodeId;
    type Declaration = DeclarationBlock;

    fn rules(&self) -> Vec<CssRule<'_, DeclarationBlock>> {
        self.sheets.iter().flat_map(StyleSheet::css_rules).collect()
    }

    fn root(&self) -> NodeId {
        self.tree.root()
    }

    fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
        query_selector_all(&self.tree, selector).map_err(|error| match error {
            SelectorParseError::Empty => SelectorError::Empty,
            other => SelectorError::Unsupported(other.to_string()),
        })
    }

    fn node_name(&self, node: NodeId) -> Option<&str> {
        self.tree.node_name(node)
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        self.tree.children(node)
    }

    fn text_content(&self, node: NodeId) -> String {
        self.tree.text_content(node).unwrap_or_default()
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.tree.as_element(node)?.attribute(name)
    }

    fn inline_style(&self, node: NodeId) -> Option<DeclarationBlock> {
        self.attribute(node, "style").map(parse_declaration_list)
    }
}
