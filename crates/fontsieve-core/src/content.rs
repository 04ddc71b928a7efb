//! Parser for the `content` property of `::before` / `::after`.
//!
//! [CSS Generated Content § 2 content](https://www.w3.org/TR/css-content-3/#content-property)
//!
//! Only the parts of the grammar that produce text are understood: quoted
//! strings and `attr(<ident>)`. Every other component (`counter()`, `url()`,
//! `open-quote`, ...) is skipped.

use thiserror::Error;

/// Syntax errors raised by [`parse_content`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    /// A character that cannot start any token.
    #[error("unexpected character {ch:?} at position {position}")]
    UnexpectedCharacter {
        /// The offending character.
        ch: char,
        /// Character offset in the value.
        position: usize,
    },
    /// `attr` not followed by `(`, an identifier and `)`.
    #[error("malformed attr() reference: {0:?}")]
    MalformedAttr(String),
}

/// One text-producing piece of a `content` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentToken {
    /// A string literal, unescaped and without its quotes.
    String(String),
    /// [§ 7.7 attr()](https://www.w3.org/TR/css-values-5/#attr-notation):
    /// the named attribute of the originating element.
    Attr(String),
}

/// Lexical classes of the `content` tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    /// One of `(`, `)`, `,`, `/`.
    Symbol(char),
    /// A quoted string, quotes and backslashes still in place.
    String(String),
    /// A run of characters that are not quotes, whitespace or symbols.
    Word(String),
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Self::Symbol(c) => c.to_string(),
            Self::String(s) | Self::Word(s) => s.clone(),
        }
    }
}

const fn is_symbol(c: char) -> bool {
    matches!(c, '(' | ')' | ',' | '/')
}

fn is_word_char(c: char) -> bool {
    !(c == '"' || c == '\'' || c.is_whitespace() || c.is_control() || is_symbol(c))
}

/// Split a `content` value into tokens.
///
/// Whitespace separates tokens and is dropped. Strings keep their quotes; a
/// backslash inside a string escapes the next character.
fn tokenize(input: &str) -> Result<Vec<Token>, ContentError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut position = 0;

    while let Some(&c) = chars.get(position) {
        if is_symbol(c) {
            tokens.push(Token::Symbol(c));
            position += 1;
        } else if c.is_whitespace() {
            position += 1;
        } else if c == '"' || c == '\'' {
            let mut value = String::from(c);
            position += 1;
            while let Some(&next) = chars.get(position) {
                value.push(next);
                position += 1;
                if next == '\\' {
                    if let Some(&escaped) = chars.get(position) {
                        value.push(escaped);
                        position += 1;
                    }
                } else if next == c {
                    break;
                }
            }
            tokens.push(Token::String(value));
        } else if is_word_char(c) {
            let start = position;
            while chars.get(position).is_some_and(|&next| is_word_char(next)) {
                position += 1;
            }
            tokens.push(Token::Word(chars[start..position].iter().collect()));
        } else {
            return Err(ContentError::UnexpectedCharacter { ch: c, position });
        }
    }

    Ok(tokens)
}

/// Remove the surrounding quotes of a string token and resolve its escapes.
///
/// `"sss\""` becomes `sss"`.
fn unescape_string(raw: &str) -> String {
    let inner = crate::text::strip_quotes(raw);
    let mut value = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                value.push(escaped);
            }
        } else {
            value.push(c);
        }
    }
    value
}

fn is_attr_ident(word: &str) -> bool {
    word.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

/// Parse a `content` value into its text-producing tokens, in order.
///
/// ```
/// use fontsieve_core::content::{ContentToken, parse_content};
///
/// let tokens = parse_content(r#""Pg. " attr(data-page)"#).unwrap();
/// assert_eq!(
///     tokens,
///     vec![
///         ContentToken::String("Pg. ".to_string()),
///         ContentToken::Attr("data-page".to_string()),
///     ]
/// );
/// ```
///
/// # Errors
///
/// Returns [`ContentError::MalformedAttr`] when `attr` is not followed by
/// `(`, an identifier and `)`, and [`ContentError::UnexpectedCharacter`] for
/// input the tokenizer cannot classify.
pub fn parse_content(input: &str) -> Result<Vec<ContentToken>, ContentError> {
    let tokens = tokenize(input)?;
    let mut parsed = Vec::new();
    let mut current = 0;

    while let Some(token) = tokens.get(current) {
        match token {
            Token::String(raw) => {
                parsed.push(ContentToken::String(unescape_string(raw)));
                current += 1;
            }
            Token::Word(word) if word.eq_ignore_ascii_case("attr") => {
                let open = tokens.get(current + 1);
                let name = tokens.get(current + 2);
                let close = tokens.get(current + 3);
                match (open, name, close) {
                    (Some(Token::Symbol('(')), Some(Token::Word(name)), Some(Token::Symbol(')')))
                        if is_attr_ident(name) =>
                    {
                        parsed.push(ContentToken::Attr(name.clone()));
                        current += 4;
                    }
                    _ => {
                        let found: String = [open, name, close]
                            .into_iter()
                            .flatten()
                            .map(Token::describe)
                            .collect();
                        return Err(ContentError::MalformedAttr(format!("attr{found}")));
                    }
                }
            }
            _ => current += 1,
        }
    }

    Ok(parsed)
}

/// Render parsed tokens to text, looking `attr()` references up with
/// `attribute`. Missing attributes contribute nothing.
#[must_use]
pub fn render_content<'a, F>(tokens: &[ContentToken], mut attribute: F) -> String
where
    F: FnMut(&str) -> Option<&'a str>,
{
    let mut text = String::new();
    for token in tokens {
        match token {
            ContentToken::String(value) => text.push_str(value),
            ContentToken::Attr(name) => text.push_str(attribute(name).unwrap_or_default()),
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_and_attr() {
        assert_eq!(
            parse_content(r#""Pg. " attr(data-page)"#).unwrap(),
            vec![
                ContentToken::String("Pg. ".into()),
                ContentToken::Attr("data-page".into()),
            ]
        );
    }

    #[test]
    fn unterminated_attr_is_an_error() {
        assert!(matches!(
            parse_content("attr("),
            Err(ContentError::MalformedAttr(_))
        ));
        assert!(matches!(
            parse_content("attr(\"x\")"),
            Err(ContentError::MalformedAttr(_))
        ));
        assert!(matches!(parse_content("attr"), Err(ContentError::MalformedAttr(_))));
    }

    #[test]
    fn attr_keyword_is_case_insensitive() {
        assert_eq!(
            parse_content("ATTR( title )").unwrap(),
            vec![ContentToken::Attr("title".into())]
        );
    }

    #[test]
    fn escapes_are_resolved() {
        assert_eq!(
            parse_content(r#""say \"hi\"" '\'' "a\\b""#).unwrap(),
            vec![
                ContentToken::String("say \"hi\"".into()),
                ContentToken::String("'".into()),
                ContentToken::String("a\\b".into()),
            ]
        );
    }

    #[test]
    fn other_components_are_skipped() {
        assert_eq!(
            parse_content(r#"open-quote counter(item) "." / "alt""#).unwrap(),
            vec![ContentToken::String(".".into()), ContentToken::String("alt".into())]
        );
        assert!(parse_content("none").unwrap().is_empty());
        assert!(parse_content("").unwrap().is_empty());
    }

    #[test]
    fn control_characters_are_rejected() {
        assert_eq!(
            parse_content("\"a\" \u{0}"),
            Err(ContentError::UnexpectedCharacter { ch: '\u{0}', position: 4 })
        );
    }

    #[test]
    fn unterminated_string_runs_to_end() {
        assert_eq!(
            parse_content("\"abc").unwrap(),
            vec![ContentToken::String("abc".into())]
        );
    }

    #[test]
    fn render_resolves_attributes() {
        let tokens = parse_content(r##""#" attr(data-n) attr(missing) "!""##).unwrap();
        let text = render_content(&tokens, |name| (name == "data-n").then_some("7"));
        assert_eq!(text, "#7!");
    }
}
