//! CSS parsing for fontsieve.
//!
//! Turns style sheet text into [`StyleSheet`]s whose `@font-face` and style
//! rules are handed to the engine as [`fontsieve_core::CssRule`]s.
//!
//! # Structure
//!
//! - [`parser`]: rule and declaration consumption per
//!   [CSS Syntax 3 § 5](https://www.w3.org/TR/css-syntax-3/#parsing),
//!   keeping selector and value text verbatim
//! - [`declaration`]: declaration blocks, implementing
//!   [`fontsieve_core::StyleDeclaration`]
//! - [`stylesheet`]: `@import` resolution and rule flattening
//!
//! Only what font resolution needs is understood: style rules, `@font-face`,
//! `@import` and grouping rules such as `@media`. Everything else is skipped.

pub mod declaration;
pub mod parser;
pub mod stylesheet;

pub use declaration::{Declaration, DeclarationBlock};
pub use parser::{CssParser, ImportRule, Rule, StyleRule};
pub use stylesheet::{ImportError, StyleSheet};

/// Parse the value of a `style` attribute.
///
/// ```
/// use fontsieve_core::StyleDeclaration;
///
/// let style = fontsieve_css::parse_declaration_list("font-family: 'Brand' !important; color: red");
/// assert_eq!(style.get("font-family"), Some("'Brand'"));
/// assert!(style.is_important("font-family"));
/// ```
#[must_use]
pub fn parse_declaration_list(text: &str) -> DeclarationBlock {
    CssParser::new(text).parse_declaration_list()
}
