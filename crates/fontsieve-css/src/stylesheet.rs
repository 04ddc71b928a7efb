//! Style sheets, `@import` resolution and rule flattening.
//!
//! [CSSOM § 6.1 CSS Style Sheets](https://www.w3.org/TR/cssom-1/#css-style-sheets)

use fontsieve_common::url::resolve_url;
use fontsieve_common::warning::warn_once;
use fontsieve_core::CssRule;
use thiserror::Error;

use crate::declaration::DeclarationBlock;
use crate::parser::{CssParser, Rule};

/// Why an `@import`ed sheet could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    /// The loader has nothing at this location.
    #[error("style sheet not found: {0}")]
    NotFound(String),
    /// The location exists but could not be read.
    #[error("cannot read style sheet {url}: {reason}")]
    Unreadable {
        /// Resolved location of the sheet.
        url: String,
        /// Loader-specific description.
        reason: String,
    },
    /// The sheet imports itself, directly or through other sheets.
    #[error("import cycle through {0}")]
    Cycle(String),
}

/// [CSSOM § 6.1](https://www.w3.org/TR/cssom-1/#css-style-sheets)
///
/// A parsed style sheet and its location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleSheet {
    /// "location: ... the absolute-URL string of the first request of the
    /// CSS style sheet or null if the CSS style sheet was embedded."
    ///
    /// Base for `@font-face` `src` URLs and `@import`s. Embedded sheets use
    /// the document's location.
    pub href: Option<String>,
    /// Top-level rules in order.
    pub rules: Vec<Rule>,
}

impl StyleSheet {
    /// Parse `css`, located at `href`.
    #[must_use]
    pub fn parse(css: &str, href: Option<&str>) -> Self {
        Self {
            href: href.map(str::to_string),
            rules: CssParser::new(css).parse_rules(),
        }
    }

    /// Load every `@import`ed sheet through `loader`, recursively.
    ///
    /// Import URLs are resolved against the importing sheet before they are
    /// passed to `loader`. A sheet that fails to load, or that would import
    /// itself again, is treated as empty and reported once.
    pub fn resolve_imports<F>(&mut self, loader: &mut F)
    where
        F: FnMut(&str) -> Result<String, ImportError>,
    {
        let mut chain: Vec<String> = self.href.iter().cloned().collect();
        let Self { href, rules } = self;
        resolve_in(rules, href.as_deref(), loader, &mut chain);
    }

    /// [CSSOM § 6.4 CSS Rules](https://www.w3.org/TR/cssom-1/#css-rules)
    ///
    /// `@font-face` and style rules of this sheet, with imported sheets and
    /// grouping rules expanded in place, in document order.
    #[must_use]
    pub fn css_rules(&self) -> Vec<CssRule<'_, DeclarationBlock>> {
        let mut out = Vec::new();
        flatten(&self.rules, self.href.as_deref(), &mut out);
        out
    }
}

fn resolve_in<F>(rules: &mut [Rule], base: Option<&str>, loader: &mut F, chain: &mut Vec<String>)
where
    F: FnMut(&str) -> Result<String, ImportError>,
{
    for rule in rules {
        match rule {
            Rule::Import(import) => {
                let url = resolve_url(&import.href, base);
                if chain.contains(&url) {
                    let error = ImportError::Cycle(url);
                    warn_once("CSS", &format!("@import skipped: {error}"));
                    continue;
                }
                match loader(&url) {
                    Ok(css) => {
                        let mut sheet = StyleSheet::parse(&css, Some(&url));
                        chain.push(url);
                        let StyleSheet { href, rules } = &mut sheet;
                        resolve_in(rules, href.as_deref(), loader, chain);
                        let _ = chain.pop();
                        import.sheet = Some(Box::new(sheet));
                    }
                    Err(error) => {
                        warn_once("CSS", &format!("@import treated as empty: {error}"));
                    }
                }
            }
            Rule::Group { rules, .. } => resolve_in(rules, base, loader, chain),
            Rule::Style(_) | Rule::FontFace(_) => {}
        }
    }
}

fn flatten<'a>(rules: &'a [Rule], base: Option<&'a str>, out: &mut Vec<CssRule<'a, DeclarationBlock>>) {
    for rule in rules {
        match rule {
            Rule::Style(style) => out.push(CssRule::Style {
                selector_text: &style.selector_text,
                style: &style.declarations,
            }),
            Rule::FontFace(style) => out.push(CssRule::FontFace {
                style,
                base_url: base,
            }),
            Rule::Import(import) => {
                if let Some(sheet) = &import.sheet {
                    flatten(&sheet.rules, sheet.href.as_deref(), out);
                }
            }
            Rule::Group { rules, .. } => flatten(rules, base, out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_groups_in_order() {
        let sheet = StyleSheet::parse(
            "a { x: 1 } @media print { @supports (display: grid) { b { x: 2 } } } c { x: 3 }",
            None,
        );
        let selectors: Vec<&str> = sheet
            .css_rules()
            .iter()
            .filter_map(|rule| match rule {
                CssRule::Style { selector_text, .. } => Some(*selector_text),
                CssRule::FontFace { .. } => None,
            })
            .collect();
        assert_eq!(selectors, vec!["a", "b", "c"]);
    }

    #[test]
    fn imports_resolve_against_the_importing_sheet() {
        let mut sheet = StyleSheet::parse("@import 'parts/fonts.css'; a { x: 1 }", Some("/site/main.css"));
        let mut requested = Vec::new();
        sheet.resolve_imports(&mut |url: &str| {
            requested.push(url.to_string());
            match url {
                "/site/parts/fonts.css" => Ok("@import '../base.css'; @font-face { font-family: A; src: url(a.woff) }".into()),
                "/site/base.css" => Ok("b { x: 2 }".into()),
                other => Err(ImportError::NotFound(other.into())),
            }
        });
        assert_eq!(requested, vec!["/site/parts/fonts.css", "/site/base.css"]);

        let rules = sheet.css_rules();
        assert_eq!(rules.len(), 3);
        assert!(matches!(rules[0], CssRule::Style { selector_text: "b", .. }));
        assert!(matches!(
            rules[1],
            CssRule::FontFace { base_url: Some("/site/parts/fonts.css"), .. }
        ));
        assert!(matches!(rules[2], CssRule::Style { selector_text: "a", .. }));
    }

    #[test]
    fn failed_and_cyclic_imports_are_empty() {
        let mut sheet = StyleSheet::parse("@import 'loop.css'; @import 'gone.css';", Some("/a.css"));
        let mut calls = 0;
        sheet.resolve_imports(&mut |url: &str| {
            calls += 1;
            match url {
                "/loop.css" => Ok("@import 'a.css'; @import 'loop.css';".into()),
                _ => Err(ImportError::Unreadable {
                    url: url.into(),
                    reason: "denied".into(),
                }),
            }
        });
        assert_eq!(calls, 2);
        assert!(sheet.css_rules().is_empty());
    }
}
