//! CSS selector parsing and matching
//!
//! This module implements the structural subset of
//! [Selectors Level 4](https://www.w3.org/TR/selectors-4/) needed to answer
//! `querySelectorAll` for font resolution: type, class, ID, universal and
//! attribute selectors joined by the four combinators.
//!
//! Pseudo-classes and pseudo-elements are rejected with
//! [`SelectorParseError::UnsupportedPseudo`]; the font engine strips them
//! before querying because only structural matching matters for which text a
//! font can reach.

use thiserror::Error;

use crate::{DomTree, ElementData, NodeId};

/// Reasons a selector cannot be evaluated.
///
/// Mirrors the `SyntaxError` that `querySelectorAll` throws for invalid input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorParseError {
    /// The selector (or one entry of a selector list) is empty.
    #[error("empty selector")]
    Empty,
    /// A character that cannot start or continue a selector.
    #[error("unexpected character {ch:?} in selector {selector:?}")]
    UnexpectedCharacter {
        /// The offending character.
        ch: char,
        /// The selector being parsed.
        selector: String,
    },
    /// A combinator with no compound selector on one side.
    #[error("dangling combinator in selector {0:?}")]
    DanglingCombinator(String),
    /// An attribute selector that is not closed or has no name.
    #[error("malformed attribute selector in {0:?}")]
    MalformedAttribute(String),
    /// Pseudo-classes and pseudo-elements are outside the structural subset.
    #[error("unsupported pseudo selector {0:?}")]
    UnsupportedPseudo(String),
}

/// [§ 5 Elemental selectors](https://www.w3.org/TR/selectors-4/#elemental-selectors)
/// [§ 6 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
///
/// A simple selector is a single condition on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    /// [§ 5.1 Type selector](https://www.w3.org/TR/selectors-4/#type-selectors)
    ///
    /// Examples: `div`, `h1`
    Type(String),

    /// [§ 6.6 Class selector](https://www.w3.org/TR/selectors-4/#class-html)
    ///
    /// Examples: `.brand`, `.nav-item`
    Class(String),

    /// [§ 6.7 ID selector](https://www.w3.org/TR/selectors-4/#id-selectors)
    ///
    /// Examples: `#title`
    Id(String),

    /// [§ 5.2 Universal selector](https://www.w3.org/TR/selectors-4/#universal-selector)
    Universal,

    /// [§ 6.4 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
    ///
    /// Examples: `[lang]`, `[style*="font"]`, `[data-x="1,2"]`
    Attribute(AttributeSelector),
}

/// Attribute selectors per [§ 6.4](https://www.w3.org/TR/selectors-4/#attribute-selectors)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeSelector {
    /// `[attr]` — "Represents an element with the att attribute"
    Exists(String),
    /// `[attr=value]` — value is exactly `value`
    Equals(String, String),
    /// `[attr~=value]` — whitespace-separated word list containing `value`
    Includes(String, String),
    /// `[attr|=value]` — exactly `value` or `value` followed by `-`
    DashMatch(String, String),
    /// `[attr^=value]` — begins with `value`
    PrefixMatch(String, String),
    /// `[attr$=value]` — ends with `value`
    SuffixMatch(String, String),
    /// `[attr*=value]` — contains `value`
    SubstringMatch(String, String),
}

/// [§ 4.2 Compound selectors](https://www.w3.org/TR/selectors-4/#compound)
///
/// "A compound selector is a sequence of simple selectors that are not
/// separated by a combinator"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundSelector {
    /// The simple selectors that must all match one element.
    pub simple_selectors: Vec<SimpleSelector>,
}

/// [§ 16 Combinators](https://www.w3.org/TR/selectors-4/#combinators)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// `A B`: B is an arbitrary descendant of A.
    Descendant,
    /// `A > B`: B is a direct child of A.
    Child,
    /// `A + B`: B immediately follows A among element siblings.
    NextSibling,
    /// `A ~ B`: B follows A among element siblings.
    SubsequentSibling,
}

/// [§ 4.3 Complex selectors](https://www.w3.org/TR/selectors-4/#complex)
///
/// Stored subject-first: for `A > B C` the subject is `C` and `combinators`
/// is `[(Descendant, B), (Child, A)]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    /// The rightmost compound selector.
    pub subject: CompoundSelector,
    /// `(combinator, compound)` pairs walking left from the subject.
    pub combinators: Vec<(Combinator, CompoundSelector)>,
}

/// A parsed CSS selector ready for matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSelector {
    /// The complex selector (compound selectors with combinators).
    pub complex: ComplexSelector,
}

impl ParsedSelector {
    /// [§ 4.1 Selector Matching](https://www.w3.org/TR/selectors-4/#match-a-selector-against-an-element)
    ///
    /// Match against an element with full tree context. Descendant and
    /// subsequent-sibling combinators backtrack, so `div p span` finds the
    /// right `div` even when a nearer ancestor fails further up the chain.
    #[must_use]
    pub fn matches(&self, tree: &DomTree, node_id: NodeId) -> bool {
        compound_matches(&self.complex.subject, tree, node_id)
            && chain_matches(&self.complex.combinators, tree, node_id)
    }
}

fn chain_matches(chain: &[(Combinator, CompoundSelector)], tree: &DomTree, node_id: NodeId) -> bool {
    let Some(((combinator, compound), rest)) = chain.split_first() else {
        return true;
    };
    let step = |candidate: NodeId| {
        compound_matches(compound, tree, candidate) && chain_matches(rest, tree, candidate)
    };
    match combinator {
        Combinator::Descendant => tree.ancestors(node_id).any(step),
        Combinator::Child => tree.parent(node_id).is_some_and(step),
        Combinator::NextSibling => previous_element_sibling(tree, node_id).is_some_and(step),
        Combinator::SubsequentSibling => {
            let mut current = previous_element_sibling(tree, node_id);
            while let Some(sibling) = current {
                if step(sibling) {
                    return true;
                }
                current = previous_element_sibling(tree, sibling);
            }
            false
        }
    }
}

fn previous_element_sibling(tree: &DomTree, node_id: NodeId) -> Option<NodeId> {
    let mut current = tree.prev_sibling(node_id);
    while let Some(id) = current {
        if tree.as_element(id).is_some() {
            return Some(id);
        }
        current = tree.prev_sibling(id);
    }
    None
}

fn compound_matches(compound: &CompoundSelector, tree: &DomTree, node_id: NodeId) -> bool {
    let Some(element) = tree.as_element(node_id) else {
        return false;
    };
    compound
        .simple_selectors
        .iter()
        .all(|simple| simple.matches(element))
}

impl SimpleSelector {
    /// Check if this simple selector matches the given element.
    #[must_use]
    pub fn matches(&self, element: &ElementData) -> bool {
        match self {
            // "A type selector ... represents an element in the document tree
            // with the same qualified name as the identifier." HTML names
            // compare ASCII case-insensitively.
            Self::Type(name) => element.tag_name.eq_ignore_ascii_case(name),
            Self::Class(class_name) => element.classes().contains(class_name.as_str()),
            Self::Id(id) => element.id() == Some(id.as_str()),
            Self::Universal => true,
            Self::Attribute(attr_sel) => attr_sel.matches(element),
        }
    }
}

impl AttributeSelector {
    fn matches(&self, element: &ElementData) -> bool {
        match self {
            Self::Exists(name) => element.attribute(name).is_some(),
            Self::Equals(name, val) => element.attribute(name) == Some(val.as_str()),
            Self::Includes(name, val) => element
                .attribute(name)
                .is_some_and(|v| v.split_ascii_whitespace().any(|w| w == val)),
            Self::DashMatch(name, val) => element.attribute(name).is_some_and(|v| {
                v == val || v.strip_prefix(val.as_str()).is_some_and(|r| r.starts_with('-'))
            }),
            // "If 'val' is the empty string then the selector does not
            // represent anything."
            Self::PrefixMatch(name, val) => {
                !val.is_empty() && element.attribute(name).is_some_and(|v| v.starts_with(val.as_str()))
            }
            Self::SuffixMatch(name, val) => {
                !val.is_empty() && element.attribute(name).is_some_and(|v| v.ends_with(val.as_str()))
            }
            Self::SubstringMatch(name, val) => {
                !val.is_empty() && element.attribute(name).is_some_and(|v| v.contains(val.as_str()))
            }
        }
    }
}

/// [§ 4.3.10 ident-start code point](https://www.w3.org/TR/css-syntax-3/#ident-start-code-point)
const fn is_ident_start_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-' || !c.is_ascii()
}

/// [§ 4.3.9 ident code point](https://www.w3.org/TR/css-syntax-3/#ident-code-point)
const fn is_ident_char(c: char) -> bool {
    is_ident_start_char(c) || c.is_ascii_digit()
}

/// Cursor over the characters of one selector.
struct SelectorParser<'a> {
    source: &'a str,
    chars: Vec<char>,
    position: usize,
}

impl<'a> SelectorParser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            position: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position += 1;
        Some(c)
    }

    /// Skip whitespace, returning whether any was consumed.
    fn skip_whitespace(&mut self) -> bool {
        let start = self.position;
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.position += 1;
        }
        self.position > start
    }

    fn unexpected(&self, ch: char) -> SelectorParseError {
        SelectorParseError::UnexpectedCharacter {
            ch,
            selector: self.source.to_string(),
        }
    }

    /// Consume an identifier, honoring backslash escapes of a single character.
    fn consume_ident(&mut self) -> String {
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.position += 1;
                if let Some(escaped) = self.bump() {
                    ident.push(escaped);
                }
            } else if is_ident_char(c) {
                ident.push(c);
                self.position += 1;
            } else {
                break;
            }
        }
        ident
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector, SelectorParseError> {
        let mut compounds: Vec<CompoundSelector> = Vec::new();
        let mut combinators: Vec<Combinator> = Vec::new();

        loop {
            let had_whitespace = self.skip_whitespace();
            let Some(c) = self.peek() else { break };

            let explicit = match c {
                '>' => Some(Combinator::Child),
                '+' => Some(Combinator::NextSibling),
                '~' => Some(Combinator::SubsequentSibling),
                _ => None,
            };

            if let Some(combinator) = explicit {
                if compounds.len() == combinators.len() {
                    return Err(SelectorParseError::DanglingCombinator(self.source.to_string()));
                }
                self.position += 1;
                combinators.push(combinator);
                continue;
            }

            if compounds.len() > combinators.len() {
                if !had_whitespace {
                    return Err(self.unexpected(c));
                }
                combinators.push(Combinator::Descendant);
            }
            compounds.push(self.parse_compound()?);
        }

        if compounds.is_empty() {
            return Err(SelectorParseError::Empty);
        }
        if combinators.len() + 1 != compounds.len() {
            return Err(SelectorParseError::DanglingCombinator(self.source.to_string()));
        }

        // Re-order subject-first so matching walks outward from the element.
        let subject = compounds.pop().ok_or(SelectorParseError::Empty)?;
        let chain = combinators.into_iter().rev().zip(compounds.into_iter().rev()).collect();
        Ok(ComplexSelector {
            subject,
            combinators: chain,
        })
    }

    fn parse_compound(&mut self) -> Result<CompoundSelector, SelectorParseError> {
        let mut simple_selectors = Vec::new();

        while let Some(c) = self.peek() {
            match c {
                '*' => {
                    self.position += 1;
                    simple_selectors.push(SimpleSelector::Universal);
                }
                '.' | '#' => {
                    self.position += 1;
                    let ident = self.consume_ident();
                    if ident.is_empty() {
                        return Err(self.unexpected(c));
                    }
                    simple_selectors.push(if c == '.' {
                        SimpleSelector::Class(ident)
                    } else {
                        SimpleSelector::Id(ident)
                    });
                }
                '[' => {
                    self.position += 1;
                    simple_selectors.push(SimpleSelector::Attribute(self.parse_attribute()?));
                }
                ':' => {
                    let start = self.position;
                    while self.peek() == Some(':') {
                        self.position += 1;
                    }
                    let _ = self.consume_ident();
                    let pseudo: String = self.chars[start..self.position].iter().collect();
                    return Err(SelectorParseError::UnsupportedPseudo(pseudo));
                }
                _ if c.is_ascii_whitespace() || matches!(c, '>' | '+' | '~') => break,
                _ if is_ident_start_char(c) || c == '\\' => {
                    if !simple_selectors.is_empty() {
                        return Err(self.unexpected(c));
                    }
                    simple_selectors.push(SimpleSelector::Type(self.consume_ident()));
                }
                _ => return Err(self.unexpected(c)),
            }
        }

        if simple_selectors.is_empty() {
            return Err(SelectorParseError::Empty);
        }
        Ok(CompoundSelector { simple_selectors })
    }

    /// [§ 6.4 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
    ///
    /// Called after the opening `[`.
    fn parse_attribute(&mut self) -> Result<AttributeSelector, SelectorParseError> {
        let source = self.source;
        let malformed = move || SelectorParseError::MalformedAttribute(source.to_string());

        let _ = self.skip_whitespace();
        let name = self.consume_ident();
        if name.is_empty() {
            return Err(malformed());
        }
        let _ = self.skip_whitespace();

        let operator = match self.bump() {
            Some(']') => return Ok(AttributeSelector::Exists(name)),
            Some('=') => '=',
            Some(op @ ('~' | '|' | '^' | '$' | '*')) if self.peek() == Some('=') => {
                self.position += 1;
                op
            }
            _ => return Err(malformed()),
        };

        let _ = self.skip_whitespace();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.position += 1;
                let mut value = String::new();
                loop {
                    match self.bump() {
                        Some('\\') => {
                            if let Some(escaped) = self.bump() {
                                value.push(escaped);
                            }
                        }
                        Some(ch) if ch == quote => break,
                        Some(ch) => value.push(ch),
                        None => return Err(malformed()),
                    }
                }
                value
            }
            _ => {
                let value = self.consume_ident();
                if value.is_empty() {
                    return Err(malformed());
                }
                value
            }
        };

        // Optional case-sensitivity flag (`i` / `s`) is accepted and ignored.
        let _ = self.skip_whitespace();
        if self.peek().is_some_and(|c| matches!(c, 'i' | 'I' | 's' | 'S')) {
            self.position += 1;
            let _ = self.skip_whitespace();
        }
        if self.bump() != Some(']') {
            return Err(malformed());
        }

        Ok(match operator {
            '=' => AttributeSelector::Equals(name, value),
            '~' => AttributeSelector::Includes(name, value),
            '|' => AttributeSelector::DashMatch(name, value),
            '^' => AttributeSelector::PrefixMatch(name, value),
            '$' => AttributeSelector::SuffixMatch(name, value),
            _ => AttributeSelector::SubstringMatch(name, value),
        })
    }
}

/// Parse a raw selector string into a [`ParsedSelector`].
///
/// [§ 4 Selector syntax](https://www.w3.org/TR/selectors-4/#syntax)
///
/// # Errors
///
/// Returns a [`SelectorParseError`] for empty input, stray characters,
/// dangling combinators, malformed attribute selectors and any pseudo-class
/// or pseudo-element.
pub fn parse_selector(raw: &str) -> Result<ParsedSelector, SelectorParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SelectorParseError::Empty);
    }
    let complex = SelectorParser::new(trimmed).parse_complex()?;
    Ok(ParsedSelector { complex })
}

/// Split a selector list on top-level commas (outside quotes, brackets and
/// parentheses).
fn split_selector_list(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;

    for (index, c) in list.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (_, '\\') => escaped = true,
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[' | '(') => depth += 1,
            (None, ']' | ')') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(&list[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(&list[start..]);
    parts
}

/// [DOM § 4.2.6 querySelectorAll](https://dom.spec.whatwg.org/#dom-parentnode-queryselectorall)
///
/// "The querySelectorAll(selectors) method steps are to return the static
/// result of running scope-match a selectors string selectors against this."
///
/// Matches are returned once each, in tree order.
///
/// # Errors
///
/// Returns the first [`SelectorParseError`] of any entry in the list; like
/// the DOM method, one invalid entry invalidates the whole query.
pub fn query_selector_all(tree: &DomTree, selectors: &str) -> Result<Vec<NodeId>, SelectorParseError> {
    let parsed = split_selector_list(selectors)
        .into_iter()
        .map(parse_selector)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(tree
        .elements_in_tree_order()
        .into_iter()
        .filter(|&id| parsed.iter().any(|selector| selector.matches(tree, id)))
        .collect())
}
