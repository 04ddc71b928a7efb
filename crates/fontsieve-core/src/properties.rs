//! Font property resolution for a single declaration block.
//!
//! [CSS Fonts 4 § 2 Basic Font Properties](https://www.w3.org/TR/css-fonts-4/#basic-font-props)
//!
//! Only `font-family`, `font-style`, `font-weight` (and, for completeness,
//! `font-stretch`) are resolved, from their longhands and from the `font`
//! shorthand. Within one block the later declaration wins unless the earlier
//! one is `!important` and the later one is not.

use strum_macros::{AsRefStr, Display, EnumString};

use crate::model::StyleDeclaration;
use crate::shorthand::{FontShorthand, parse_font_shorthand};
use crate::text::{split_unquoted_commas, strip_quotes};

/// [§ 2.1.3 Generic font families](https://www.w3.org/TR/css-fonts-4/#generic-font-families)
///
/// Names left bare by [`normalize_families`]. Everything else is quoted so a
/// family literally called `serif` stays distinct from the generic.
pub const FAMILY_KEYWORDS: &[&str] =
    &["serif", "sans-serif", "monospace", "cursive", "fantasy", "initial", "inherit"];

/// [§ 2.4 font-style](https://www.w3.org/TR/css-fonts-4/#font-style-prop)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum FontStyle {
    /// "Matches against a face that is classified as a normal face"
    Normal,
    /// "Matches against a font that is labeled as an italic face, or an
    /// oblique face if one is not"
    Italic,
    /// "Matches against a font that is labeled as an oblique face, or an
    /// italic face if one is not"
    Oblique,
}

impl FontStyle {
    /// Parse a `font-style` value or descriptor. Only the keyword counts, so
    /// `oblique 10deg` is [`FontStyle::Oblique`].
    #[must_use]
    pub fn parse_value(value: &str) -> Option<Self> {
        value.split_whitespace().next()?.parse().ok()
    }
}

/// [§ 2.2 font-weight](https://www.w3.org/TR/css-fonts-4/#font-weight-prop)
///
/// "normal: Same as 400. bold: Same as 700." Numbers in `[1, 1000]` are taken
/// as is. The relative keywords `bolder` and `lighter` need the parent's
/// computed weight and resolve to `None` here. For a descriptor range such as
/// `100 900` the first number is used.
#[must_use]
pub fn parse_font_weight(value: &str) -> Option<u16> {
    let word = value.split_whitespace().next()?;
    if word.eq_ignore_ascii_case("normal") {
        return Some(400);
    }
    if word.eq_ignore_ascii_case("bold") {
        return Some(700);
    }
    word.parse::<u16>().ok().filter(|weight| (1..=1000).contains(weight))
}

/// Split a `font-family` value and quote every non-keyword name.
///
/// ```
/// use fontsieve_core::properties::normalize_families;
///
/// assert_eq!(
///     normalize_families("'Brand Sans', Arial, SERIF"),
///     vec!["\"Brand Sans\"", "\"Arial\"", "serif"]
/// );
/// ```
#[must_use]
pub fn normalize_families(value: &str) -> Vec<String> {
    split_unquoted_commas(value)
        .into_iter()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            if let Some(keyword) = FAMILY_KEYWORDS.iter().find(|k| name.eq_ignore_ascii_case(k)) {
                return (*keyword).to_string();
            }
            let unquoted = strip_quotes(name);
            if unquoted.len() == name.len() {
                // Unquoted identifiers are joined by single spaces.
                let collapsed = unquoted.split_whitespace().collect::<Vec<_>>().join(" ");
                format!("\"{collapsed}\"")
            } else {
                format!("\"{unquoted}\"")
            }
        })
        .collect()
}

/// Run the cascade within one declaration block for `longhand` and `font`.
///
/// Returns `None` when neither property contributes a value.
fn scan<D, T>(
    style: &D,
    longhand: &str,
    from_longhand: impl Fn(&str) -> T,
    from_shorthand: impl Fn(FontShorthand) -> T,
) -> Option<T>
where
    D: StyleDeclaration + ?Sized,
{
    let mut winner: Option<(T, bool)> = None;

    for name in style.names() {
        let value = if name.eq_ignore_ascii_case(longhand) {
            style.get(name).map(&from_longhand)
        } else if name.eq_ignore_ascii_case("font") {
            style
                .get(name)
                .and_then(parse_font_shorthand)
                .map(&from_shorthand)
        } else {
            continue;
        };
        let Some(value) = value else { continue };

        // [§ 6.4 Important declarations](https://www.w3.org/TR/css-cascade-4/#importance)
        let important = style.is_important(name);
        if winner.as_ref().is_none_or(|(_, won_important)| important || !won_important) {
            winner = Some((value, important));
        }
    }

    winner.map(|(value, _)| value)
}

fn is_inherit(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("inherit")
}

/// The normalized `font-family` list, empty when undeclared or `inherit`.
#[must_use]
pub fn computed_font_families<D: StyleDeclaration + ?Sized>(style: &D) -> Vec<String> {
    let families = scan(style, "font-family", normalize_families, |font| {
        normalize_families(&font.family.join(","))
    })
    .unwrap_or_default();

    if families.first().is_some_and(|first| first == "inherit") {
        return Vec::new();
    }
    families
}

/// The `font-style` keyword, `None` when undeclared, `inherit` or unknown.
#[must_use]
pub fn computed_font_style<D: StyleDeclaration + ?Sized>(style: &D) -> Option<FontStyle> {
    scan(
        style,
        "font-style",
        FontStyle::parse_value,
        |font| FontStyle::parse_value(&font.style),
    )
    .flatten()
}

/// The numeric `font-weight`, `None` when undeclared, `inherit` or relative.
#[must_use]
pub fn computed_font_weight<D: StyleDeclaration + ?Sized>(style: &D) -> Option<u16> {
    scan(style, "font-weight", parse_font_weight, |font| {
        parse_font_weight(&font.weight)
    })
    .flatten()
}

/// The raw `font-stretch` value, `None` when undeclared or `inherit`.
#[must_use]
pub fn computed_font_stretch<D: StyleDeclaration + ?Sized>(style: &D) -> Option<String> {
    scan(
        style,
        "font-stretch",
        |value| (!is_inherit(value)).then(|| value.trim().to_string()),
        |font| Some(font.stretch),
    )
    .flatten()
    .filter(|value| !value.is_empty())
}

/// Family, style and weight of an element as far as they are known.
///
/// Used both for what a rule declares and for the inherited state of the
/// propagation walk. Empty or `None` means "not set here".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FontInfo {
    /// Normalized family list; see [`normalize_families`].
    pub family: Vec<String>,
    /// `font-style`.
    pub style: Option<FontStyle>,
    /// `font-weight` as a number.
    pub weight: Option<u16>,
}

impl FontInfo {
    /// Resolve everything a declaration block says about fonts.
    #[must_use]
    pub fn from_declaration<D: StyleDeclaration + ?Sized>(style: &D) -> Self {
        Self {
            family: computed_font_families(style),
            style: computed_font_style(style),
            weight: computed_font_weight(style),
        }
    }

    /// Whether any of family, style or weight is set.
    #[must_use]
    pub fn has_font_style(&self) -> bool {
        !self.family.is_empty() || self.style.is_some() || self.weight.is_some()
    }

    /// Layer `newer` over `self`: each of family, style and weight is
    /// replaced only when `newer` sets it.
    pub fn merge(&mut self, newer: &Self) {
        if !newer.family.is_empty() {
            self.family.clone_from(&newer.family);
        }
        if newer.style.is_some() {
            self.style = newer.style;
        }
        if newer.weight.is_some() {
            self.weight = newer.weight;
        }
    }

    /// [`merge`](Self::merge) returning a new value.
    #[must_use]
    pub fn merged(&self, newer: &Self) -> Self {
        let mut merged = self.clone();
        merged.merge(newer);
        merged
    }
}
