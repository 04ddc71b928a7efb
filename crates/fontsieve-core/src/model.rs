//! The document model consumed by the engine.
//!
//! The engine never builds a DOM or CSSOM itself. It reads an element tree and
//! a flat list of style rules through [`DocumentModel`], and declaration
//! blocks through [`StyleDeclaration`]. `fontsieve-browser` implements both
//! on top of `fontsieve-dom` and `fontsieve-css`.

use std::hash::Hash;

use thiserror::Error;

/// [CSSOM § 6.6 CSSStyleDeclaration](https://www.w3.org/TR/cssom-1/#the-cssstyledeclaration-interface)
///
/// "A CSS declaration block is an ordered collection of CSS properties with
/// their associated values."
pub trait StyleDeclaration {
    /// "The length attribute must return the number of CSS declarations in
    /// the declarations."
    fn len(&self) -> usize;

    /// Returns `true` when no property is declared.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// "The item(index) method must return the property name of the CSS
    /// declaration at position index."
    fn item(&self, index: usize) -> Option<&str>;

    /// `getPropertyValue(property)`: the declared value, or `None` when the
    /// property is not declared in this block.
    fn get(&self, name: &str) -> Option<&str>;

    /// `getPropertyPriority(property)`: whether the declaration carries
    /// `!important`.
    fn is_important(&self, name: &str) -> bool;

    /// Property names in declaration order.
    fn names(&self) -> impl Iterator<Item = &str> {
        (0..self.len()).filter_map(|index| self.item(index))
    }
}

/// One rule of the flattened style sheet list.
///
/// Providers yield `@font-face` and style rules only, with `@media` blocks and
/// `@import`ed sheets already expanded in document order.
#[derive(Debug)]
pub enum CssRule<'a, D> {
    /// [§ 4.1 The @font-face rule](https://www.w3.org/TR/css-fonts-4/#font-face-rule)
    FontFace {
        /// The descriptors of the rule.
        style: &'a D,
        /// Location of the owning style sheet, used to resolve `src` URLs.
        base_url: Option<&'a str>,
    },
    /// [CSSOM § 6.4.3 CSSStyleRule](https://www.w3.org/TR/cssom-1/#the-cssstylerule-interface)
    Style {
        /// The rule's selector list as written.
        selector_text: &'a str,
        /// The rule's declarations.
        style: &'a D,
    },
}

/// A selector the element tree cannot evaluate.
///
/// Mirrors the `SyntaxError` thrown by `querySelectorAll`. The cascade walker
/// turns it into zero matches.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    /// The selector uses syntax outside what the provider supports.
    #[error("unsupported selector {0:?}")]
    Unsupported(String),
    /// The selector is empty.
    #[error("empty selector")]
    Empty,
}

/// Everything the engine needs to know about one document.
pub trait DocumentModel {
    /// Handle to a node of the element tree.
    type Node: Copy + Eq + Hash;
    /// Declaration block type shared by rules and inline styles.
    type Declaration: StyleDeclaration;

    /// All `@font-face` and style rules of the document, flattened through
    /// `@import` and `@media`, in document order.
    fn rules(&self) -> Vec<CssRule<'_, Self::Declaration>>;

    /// The document node.
    fn root(&self) -> Self::Node;

    /// [DOM § 4.2.6 querySelectorAll](https://dom.spec.whatwg.org/#dom-parentnode-queryselectorall)
    ///
    /// # Errors
    ///
    /// Returns a [`SelectorError`] when the selector cannot be evaluated.
    fn query_selector_all(&self, selector: &str) -> Result<Vec<Self::Node>, SelectorError>;

    /// [DOM § 4.4 nodeName](https://dom.spec.whatwg.org/#dom-node-nodename)
    ///
    /// The tag name for elements, `#text`, `#comment` or `#document` for the
    /// other node kinds, `None` for nodes without a name.
    fn node_name(&self, node: Self::Node) -> Option<&str>;

    /// Child nodes in document order.
    fn children(&self, node: Self::Node) -> &[Self::Node];

    /// [DOM § 4.4 textContent](https://dom.spec.whatwg.org/#dom-node-textcontent),
    /// with `null` read as the empty string.
    fn text_content(&self, node: Self::Node) -> String;

    /// Attribute value of an element.
    fn attribute(&self, node: Self::Node, name: &str) -> Option<&str>;

    /// The parsed `style` attribute of an element.
    fn inline_style(&self, node: Self::Node) -> Option<Self::Declaration>;
}
