//! The `font` shorthand.
//!
//! [CSS Fonts 4 § 2.8 font](https://www.w3.org/TR/css-fonts-4/#font-prop)
//!
//! ```text
//! [ [ <'font-style'> || <font-variant-css2> || <'font-weight'> ||
//!     <font-width-css3> ]? <'font-size'> [ / <'line-height'> ]? <'font-family'> ]
//! | <system-family-name>
//! ```

use crate::text::split_unquoted_commas;

/// Longhand values carried by one `font` declaration.
///
/// "All subproperties of the font property are first reset to their initial
/// values, then set to the values explicitly specified." Subproperties the
/// value leaves out are therefore `normal`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontShorthand {
    /// `font-style`, including an optional oblique angle.
    pub style: String,
    /// `font-variant` (`normal` or `small-caps`).
    pub variant: String,
    /// `font-weight`.
    pub weight: String,
    /// `font-stretch`.
    pub stretch: String,
    /// `font-size`.
    pub size: String,
    /// `line-height`, when given after a `/`.
    pub line_height: Option<String>,
    /// `font-family` entries, trimmed, quotes kept.
    pub family: Vec<String>,
}

const STYLE_KEYWORDS: &[&str] = &["italic", "oblique"];

const WEIGHT_KEYWORDS: &[&str] = &["bold", "bolder", "lighter"];

/// [§ 2.3 font-width](https://www.w3.org/TR/css-fonts-4/#font-stretch-prop)
const STRETCH_KEYWORDS: &[&str] = &[
    "ultra-condensed",
    "extra-condensed",
    "condensed",
    "semi-condensed",
    "semi-expanded",
    "expanded",
    "extra-expanded",
    "ultra-expanded",
];

/// [§ 2.5 font-size](https://www.w3.org/TR/css-fonts-4/#font-size-prop)
const SIZE_KEYWORDS: &[&str] = &[
    "xx-small", "x-small", "small", "medium", "large", "x-large", "xx-large", "xxx-large",
    "larger", "smaller",
];

/// "<system-family-name>": these use the platform's UI font, which is never
/// a downloadable font.
const SYSTEM_FONTS: &[&str] = &["caption", "icon", "menu", "message-box", "small-caption", "status-bar"];

const CSS_WIDE_KEYWORDS: &[&str] = &["inherit", "initial", "unset", "revert", "revert-layer"];

fn is_one_of(word: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| word.eq_ignore_ascii_case(keyword))
}

/// A `<length-percentage>` or `0`, possibly a math function.
fn is_size(word: &str) -> bool {
    if is_one_of(word, SIZE_KEYWORDS) {
        return true;
    }
    let lower = word.to_ascii_lowercase();
    if ["calc(", "min(", "max(", "clamp(", "var("].iter().any(|f| lower.starts_with(f)) {
        return true;
    }
    let number_end = lower
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (i == 0 && (c == '+' || c == '-'))))
        .map_or(lower.len(), |(i, _)| i);
    let (number, unit) = lower.split_at(number_end);
    if number.parse::<f64>().is_err() {
        return false;
    }
    match unit {
        // Unitless zero is the only bare number that is a length.
        "" => number
            .trim_start_matches(['+', '-'])
            .chars()
            .all(|c| c == '0' || c == '.'),
        "%" => true,
        _ => unit.chars().all(|c| c.is_ascii_alphabetic()),
    }
}

/// `<number [1,1000]>`
fn is_numeric_weight(word: &str) -> bool {
    word.parse::<f64>().is_ok_and(|n| (1.0..=1000.0).contains(&n))
}

/// Byte offset of the end of the next whitespace-delimited word starting at
/// `start`, with parentheses kept together and `/` ending a word.
fn word_end(value: &str, start: usize) -> usize {
    let mut depth = 0usize;
    for (offset, c) in value[start..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            '/' if depth == 0 && offset > 0 => return start + offset,
            c if c.is_whitespace() && depth == 0 => return start + offset,
            _ => {}
        }
    }
    value.len()
}

fn skip_whitespace(value: &str, start: usize) -> usize {
    value[start..]
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map_or(value.len(), |(offset, _)| start + offset)
}

/// Parse a `font` value.
///
/// Returns `None` for system font keywords, CSS-wide keywords and values
/// that do not end in `<'font-size'> <'font-family'>`.
#[must_use]
pub fn parse_font_shorthand(value: &str) -> Option<FontShorthand> {
    let value = value.trim();
    if value.is_empty() || is_one_of(value, SYSTEM_FONTS) || is_one_of(value, CSS_WIDE_KEYWORDS) {
        return None;
    }

    let mut style: Option<String> = None;
    let mut variant: Option<String> = None;
    let mut weight: Option<String> = None;
    let mut stretch: Option<String> = None;
    let mut normals = 0usize;

    let mut position = skip_whitespace(value, 0);
    let size = loop {
        if position >= value.len() {
            return None;
        }
        let end = word_end(value, position);
        let word = &value[position..end];
        position = skip_whitespace(value, end);

        if word.eq_ignore_ascii_case("normal") {
            normals += 1;
        } else if style.is_none() && is_one_of(word, STYLE_KEYWORDS) {
            let mut keyword = word.to_ascii_lowercase();
            // `oblique <angle>`
            if keyword == "oblique" && position < value.len() {
                let angle_end = word_end(value, position);
                let angle = &value[position..angle_end];
                if angle.to_ascii_lowercase().ends_with("deg") {
                    keyword = format!("{keyword} {angle}");
                    position = skip_whitespace(value, angle_end);
                }
            }
            style = Some(keyword);
        } else if variant.is_none() && word.eq_ignore_ascii_case("small-caps") {
            variant = Some(word.to_ascii_lowercase());
        } else if weight.is_none() && (is_one_of(word, WEIGHT_KEYWORDS) || is_numeric_weight(word)) {
            weight = Some(word.to_ascii_lowercase());
        } else if stretch.is_none() && is_one_of(word, STRETCH_KEYWORDS) {
            stretch = Some(word.to_ascii_lowercase());
        } else if is_size(word) {
            break word.to_string();
        } else {
            return None;
        }

        let given = [&style, &variant, &weight, &stretch]
            .iter()
            .filter(|slot| slot.is_some())
            .count();
        if given + normals > 4 {
            return None;
        }
    };

    let mut line_height = None;
    if value[position..].starts_with('/') {
        position = skip_whitespace(value, position + 1);
        if position >= value.len() {
            return None;
        }
        let end = word_end(value, position);
        line_height = Some(value[position..end].to_string());
        position = skip_whitespace(value, end);
    }

    let family: Vec<String> = split_unquoted_commas(&value[position..])
        .into_iter()
        .map(|name| name.trim().to_string())
        .collect();
    if family.is_empty() || family.iter().any(String::is_empty) {
        return None;
    }

    let normal = || "normal".to_string();
    Some(FontShorthand {
        style: style.unwrap_or_else(normal),
        variant: variant.unwrap_or_else(normal),
        weight: weight.unwrap_or_else(normal),
        stretch: stretch.unwrap_or_else(normal),
        size,
        line_height,
        family,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_and_family_only() {
        let font = parse_font_shorthand("12px Arial").unwrap();
        assert_eq!(font.size, "12px");
        assert_eq!(font.family, vec!["Arial"]);
        assert_eq!(font.style, "normal");
        assert_eq!(font.weight, "normal");
        assert_eq!(font.line_height, None);
    }

    #[test]
    fn all_prefix_keywords() {
        let font =
            parse_font_shorthand("italic small-caps bold condensed 16px/2 \"Brand Sans\", serif")
                .unwrap();
        assert_eq!(font.style, "italic");
        assert_eq!(font.variant, "small-caps");
        assert_eq!(font.weight, "bold");
        assert_eq!(font.stretch, "condensed");
        assert_eq!(font.size, "16px");
        assert_eq!(font.line_height.as_deref(), Some("2"));
        assert_eq!(font.family, vec!["\"Brand Sans\"", "serif"]);
    }

    #[test]
    fn numeric_weight_and_spaced_line_height() {
        let font = parse_font_shorthand("600 1.2em / 1.5 'Brand', sans-serif").unwrap();
        assert_eq!(font.weight, "600");
        assert_eq!(font.size, "1.2em");
        assert_eq!(font.line_height.as_deref(), Some("1.5"));
        assert_eq!(font.family, vec!["'Brand'", "sans-serif"]);
    }

    #[test]
    fn oblique_angle() {
        let font = parse_font_shorthand("oblique 10deg 12px Brand").unwrap();
        assert_eq!(font.style, "oblique 10deg");
        assert_eq!(font.size, "12px");
    }

    #[test]
    fn keyword_sizes_and_functions() {
        assert_eq!(parse_font_shorthand("large Brand").unwrap().size, "large");
        assert_eq!(
            parse_font_shorthand("calc(1rem + 2px) Brand").unwrap().size,
            "calc(1rem + 2px)"
        );
        assert_eq!(parse_font_shorthand("0 Brand").unwrap().size, "0");
    }

    #[test]
    fn rejects_incomplete_or_system_values() {
        assert_eq!(parse_font_shorthand("bold"), None);
        assert_eq!(parse_font_shorthand("12px"), None);
        assert_eq!(parse_font_shorthand("Arial"), None);
        assert_eq!(parse_font_shorthand("menu"), None);
        assert_eq!(parse_font_shorthand("inherit"), None);
        assert_eq!(parse_font_shorthand("12px Arial,"), None);
        assert_eq!(parse_font_shorthand("normal normal normal normal normal 12px A"), None);
    }
}
