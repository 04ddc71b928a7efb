//! CSS Parser per [§ 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing).
//!
//! The parser follows the rule and declaration consumption algorithms of CSS
//! Syntax, but works on characters instead of tokens: selectors and values
//! are kept as the author wrote them (quotes, escapes and all), since font
//! family names and `content` strings are interpreted later by the engine.

use fontsieve_core::text::strip_quotes;

use crate::declaration::{Declaration, DeclarationBlock};
use crate::stylesheet::StyleSheet;

/// [CSS Conditional 3 § 2](https://www.w3.org/TR/css-conditional-3/#processing)
///
/// At-rules whose block holds a list of rules that are flattened into the
/// surrounding sheet.
const GROUPING_AT_RULES: &[&str] = &["media", "supports", "layer", "container", "document", "-moz-document"];

/// [CSSOM § 6.4.3 CSSStyleRule](https://www.w3.org/TR/cssom-1/#the-cssstylerule-interface)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRule {
    /// The selector list as written, whitespace-trimmed.
    pub selector_text: String,
    /// The rule's declarations.
    pub declarations: DeclarationBlock,
}

/// [CSSOM § 6.4.4 CSSImportRule](https://www.w3.org/TR/cssom-1/#the-cssimportrule-interface)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRule {
    /// The imported URL as written, unresolved.
    pub href: String,
    /// Media query list and other conditions following the URL.
    pub media: String,
    /// The imported sheet, once [`StyleSheet::resolve_imports`] loaded it.
    pub sheet: Option<Box<StyleSheet>>,
}

/// A rule of a style sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// A style rule.
    Style(StyleRule),
    /// [CSS Fonts 4 § 4.1](https://www.w3.org/TR/css-fonts-4/#font-face-rule)
    /// `@font-face` and its descriptors.
    FontFace(DeclarationBlock),
    /// `@import`.
    Import(ImportRule),
    /// `@media` and the other grouping rules. Conditions are not evaluated:
    /// a font used under any condition has to be available.
    Group {
        /// The at-keyword, lowercased, without `@`.
        name: String,
        /// The condition text.
        prelude: String,
        /// The nested rules.
        rules: Vec<Rule>,
    },
}

/// [§ 3.3 Preprocessing the input stream](https://www.w3.org/TR/css-syntax-3/#input-preprocessing)
/// and [§ 4.3.2 Consume comments](https://www.w3.org/TR/css-syntax-3/#consume-comments).
///
/// Remove `/* ... */` comments outside strings. An unterminated comment runs
/// to the end of the input.
#[must_use]
pub fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut chars = css.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if c == '\\' {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            } else if c == q || c == '\n' {
                quote = None;
            }
            continue;
        }
        match c {
            '/' if chars.peek() == Some(&'*') => {
                let _ = chars.next();
                let mut previous = '\0';
                for c in chars.by_ref() {
                    if previous == '*' && c == '/' {
                        break;
                    }
                    previous = c;
                }
            }
            '"' | '\'' => {
                quote = Some(c);
                out.push(c);
            }
            '\\' => {
                out.push(c);
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// [§ 6.4.2 Important declarations](https://www.w3.org/TR/css-cascade-4/#importance)
///
/// "A declaration is important if it has a !important annotation, i.e.
/// if the last two (non-whitespace, non-comment) tokens in its value are
/// a <delim-token> with the value "!" followed by an <ident-token> with
/// a value that is an ASCII case-insensitive match for "important"."
///
/// STEP 1: Skip trailing whitespace in the value.
/// STEP 2: Check for "important".
/// STEP 3: Skip any whitespace between "!" and "important".
/// STEP 4: Check for "!".
///
/// Returns the value without the annotation and whether it was present.
#[must_use]
pub fn check_important(value: &str) -> (&str, bool) {
    // STEP 1
    let trimmed = value.trim_end();

    // STEP 2
    let keyword = "important";
    let Some(split) = trimmed.len().checked_sub(keyword.len()) else {
        return (trimmed, false);
    };
    if !trimmed.is_char_boundary(split) || !trimmed[split..].eq_ignore_ascii_case(keyword) {
        return (trimmed, false);
    }

    // STEP 3 + 4
    match trimmed[..split].trim_end().strip_suffix('!') {
        Some(rest) => (rest.trim_end(), true),
        None => (trimmed, false),
    }
}

/// Character-level CSS parser.
pub struct CssParser {
    chars: Vec<char>,
    position: usize,
}

impl CssParser {
    /// Create a parser over `css`, with comments removed.
    #[must_use]
    pub fn new(css: &str) -> Self {
        Self {
            chars: strip_comments(css).chars().collect(),
            position: 0,
        }
    }

    /// [§ 5.3.3 Parse a stylesheet](https://www.w3.org/TR/css-syntax-3/#parse-stylesheet)
    ///
    /// "Consume a list of rules from input, with the top-level flag set."
    pub fn parse_rules(&mut self) -> Vec<Rule> {
        self.consume_list_of_rules(true)
    }

    /// [§ 5.3.8 Parse a list of declarations](https://www.w3.org/TR/css-syntax-3/#parse-list-of-declarations)
    ///
    /// Parse declarations from a `style` attribute or similar. A stray `}`
    /// ends the list.
    pub fn parse_declaration_list(&mut self) -> DeclarationBlock {
        self.consume_list_of_declarations()
    }

    /// [§ 5.4.1 Consume a list of rules](https://www.w3.org/TR/css-syntax-3/#consume-list-of-rules)
    fn consume_list_of_rules(&mut self, top_level: bool) -> Vec<Rule> {
        // "Create an initially empty list of rules."
        let mut rules = Vec::new();

        loop {
            self.skip_whitespace();
            match self.peek() {
                // "<EOF-token>"
                // "Return the list of rules."
                None => return rules,

                // End of a nested block; the caller consumes the brace.
                Some('}') if !top_level => return rules,

                // Unbalanced brace at the top level.
                Some('}') => self.position += 1,

                // "<CDO-token> or <CDC-token>"
                // "If the top-level flag is set, do nothing."
                Some('<') if top_level && self.starts_with("<!--") => self.position += 4,
                Some('-') if top_level && self.starts_with("-->") => self.position += 3,

                // "<at-keyword-token>"
                // "Reconsume the current input token. Consume an at-rule, and
                // append the returned value to the list of rules."
                Some('@') => {
                    if let Some(rule) = self.consume_at_rule() {
                        rules.push(rule);
                    }
                }

                // "anything else"
                // "Reconsume the current input token. Consume a qualified rule.
                // If anything is returned, append it to the list of rules."
                Some(_) => {
                    if let Some(rule) = self.consume_qualified_rule() {
                        rules.push(Rule::Style(rule));
                    }
                }
            }
        }
    }

    /// [§ 5.4.2 Consume an at-rule](https://www.w3.org/TR/css-syntax-3/#consume-at-rule)
    ///
    /// Returns `None` for at-rules that carry nothing font related
    /// (`@charset`, `@keyframes`, `@page`, ...).
    fn consume_at_rule(&mut self) -> Option<Rule> {
        self.position += 1; // @
        let name = self.consume_name().to_ascii_lowercase();
        let prelude = self.consume_text_until(&[';', '{', '}']);

        match self.peek() {
            // "<semicolon-token>"
            // "Return the at-rule."
            Some(';') => {
                self.position += 1;
                (name == "import").then(|| Rule::Import(parse_import_prelude(&prelude)))
            }

            // "<{-token>"
            // "Consume a simple block and assign it to the at-rule's block."
            Some('{') => {
                self.position += 1;
                if name == "font-face" {
                    let block = self.consume_list_of_declarations();
                    self.consume_close_brace();
                    Some(Rule::FontFace(block))
                } else if GROUPING_AT_RULES.contains(&name.as_str()) {
                    let rules = self.consume_list_of_rules(false);
                    self.consume_close_brace();
                    Some(Rule::Group {
                        name,
                        prelude: prelude.trim().to_string(),
                        rules,
                    })
                } else {
                    self.skip_block();
                    None
                }
            }

            // "<EOF-token>"
            // "This is a parse error. Return the at-rule."
            // A `}` ends a statement at-rule missing its semicolon.
            _ => (name == "import").then(|| Rule::Import(parse_import_prelude(&prelude))),
        }
    }

    /// [§ 5.4.3 Consume a qualified rule](https://www.w3.org/TR/css-syntax-3/#consume-qualified-rule)
    fn consume_qualified_rule(&mut self) -> Option<StyleRule> {
        let prelude = self.consume_text_until(&['{', '}']);

        // "<EOF-token>"
        // "This is a parse error. Return nothing."
        // A `}` closes the enclosing block before this rule got one.
        if self.peek() != Some('{') {
            return None;
        }
        self.position += 1; // {

        let declarations = self.consume_list_of_declarations();
        self.consume_close_brace();

        Some(StyleRule {
            selector_text: prelude.trim().to_string(),
            declarations,
        })
    }

    /// [§ 5.4.5 Consume a list of declarations](https://www.w3.org/TR/css-syntax-3/#consume-list-of-declarations)
    fn consume_list_of_declarations(&mut self) -> DeclarationBlock {
        let mut block = DeclarationBlock::new();

        loop {
            self.skip_whitespace();
            match self.peek() {
                // "<whitespace-token>" or "<semicolon-token>"
                // "Do nothing."
                Some(';') => self.position += 1,

                // "<EOF-token>" or "<}-token>"
                // "Return the list of declarations."
                None | Some('}') => return block,

                // "<at-keyword-token>"
                // Nested at-rules are not part of the block.
                Some('@') => {
                    let _ = self.consume_at_rule();
                }

                Some(_) => {
                    if let Some(declaration) = self.consume_declaration() {
                        block.push(declaration);
                    }
                }
            }
        }
    }

    /// [§ 5.4.6 Consume a declaration](https://www.w3.org/TR/css-syntax-3/#consume-declaration)
    fn consume_declaration(&mut self) -> Option<Declaration> {
        let name = self.consume_text_until(&[':', ';', '{', '}']);

        match self.peek() {
            Some(':') => self.position += 1,
            // A nested rule; skipped.
            Some('{') => {
                self.position += 1;
                self.skip_block();
                return None;
            }
            // "If the next input token is anything other than a <colon-token>,
            // this is a parse error. Return nothing."
            _ => return None,
        }

        let value = self.consume_text_until(&[';', '}']);
        let name = name.trim();
        if name.is_empty() || name.contains(char::is_whitespace) {
            return None;
        }

        let (value, important) = check_important(&value);
        Some(Declaration::new(name, value, important))
    }

    /// Consume characters up to (not including) one of `stops` found outside
    /// strings and nested `()`, `[]` or `{}` groups, or to the end of input.
    ///
    /// A brace that is itself a stop also ends unbalanced `(` or `[` groups.
    fn consume_text_until(&mut self, stops: &[char]) -> String {
        let mut text = String::new();
        let mut quote: Option<char> = None;
        let mut depth = 0usize;
        let mut braces = 0usize;

        while let Some(c) = self.peek() {
            if let Some(q) = quote {
                text.push(c);
                self.position += 1;
                if c == '\\' {
                    if let Some(escaped) = self.peek() {
                        text.push(escaped);
                        self.position += 1;
                    }
                } else if c == q {
                    quote = None;
                }
                continue;
            }

            if depth == 0 && braces == 0 && stops.contains(&c) {
                break;
            }
            match c {
                '"' | '\'' => quote = Some(c),
                '(' | '[' => depth += 1,
                ')' | ']' => depth = depth.saturating_sub(1),
                '{' if stops.contains(&'{') => break,
                '{' => braces += 1,
                '}' if braces > 0 => braces -= 1,
                '}' if stops.contains(&'}') => break,
                '\\' => {
                    text.push(c);
                    self.position += 1;
                    if let Some(escaped) = self.peek() {
                        text.push(escaped);
                        self.position += 1;
                    }
                    continue;
                }
                _ => {}
            }
            text.push(c);
            self.position += 1;
        }

        text
    }

    /// [§ 4.3.11 Consume a name](https://www.w3.org/TR/css-syntax-3/#consume-name)
    fn consume_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() {
                name.push(c);
                self.position += 1;
            } else {
                break;
            }
        }
        name
    }

    /// Skip the rest of a `{}` block whose opening brace was consumed.
    fn skip_block(&mut self) {
        let mut depth = 1usize;
        while self.peek().is_some() {
            let _ = self.consume_text_until(&['{', '}']);
            match self.peek() {
                Some('{') => depth += 1,
                Some('}') => depth -= 1,
                _ => return,
            }
            self.position += 1;
            if depth == 0 {
                return;
            }
        }
    }

    fn consume_close_brace(&mut self) {
        if self.peek() == Some('}') {
            self.position += 1;
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.position += 1;
        }
    }

    fn starts_with(&self, literal: &str) -> bool {
        literal
            .chars()
            .enumerate()
            .all(|(offset, c)| self.chars.get(self.position + offset) == Some(&c))
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }
}

/// [CSS Cascading 4 § 2.1 @import](https://www.w3.org/TR/css-cascade-4/#at-import)
///
/// "@import [ <url> | <string> ] [ layer | layer(<layer-name>) ]?
/// <import-conditions> ;"
fn parse_import_prelude(prelude: &str) -> ImportRule {
    let prelude = prelude.trim();
    let lower = prelude.to_ascii_lowercase();

    let (href, rest) = if lower.starts_with("url(") {
        let close = prelude.find(')').unwrap_or(prelude.len());
        (strip_quotes(prelude[4..close].trim()), prelude.get(close + 1..).unwrap_or_default())
    } else if let Some(q) = prelude.chars().next().filter(|c| *c == '"' || *c == '\'') {
        let close = prelude[1..].find(q).map_or(prelude.len(), |i| i + 1);
        (&prelude[1..close], prelude.get(close + 1..).unwrap_or_default())
    } else {
        let end = prelude.find(char::is_whitespace).unwrap_or(prelude.len());
        (&prelude[..end], &prelude[end..])
    };

    ImportRule {
        href: href.trim().to_string(),
        media: rest.trim().to_string(),
        sheet: None,
    }
}
