//! Picking the web fonts that render an element's text.
//!
//! [CSS Fonts 4 § 5.2 Matching font styles](https://www.w3.org/TR/css-fonts-4/#font-style-matching)
//!
//! Candidates are ranked by family position, then style, then weight. The
//! ranked list is walked once; the first acceptable face of each family gets
//! the text. Weight only orders candidates, it never rules one out.

use std::cmp::Ordering;

use crate::properties::{FontStyle, parse_font_weight};
use crate::web_font::WebFont;

/// Weight assumed for descriptors without a usable `font-weight`.
pub const DEFAULT_WEIGHT: u16 = 400;

/// [§ 5.2 step 4b](https://www.w3.org/TR/css-fonts-4/#font-style-matching)
///
/// "If the value of font-style is italic, italic faces are checked first,
/// then oblique, then normal faces. If the value is oblique, oblique faces
/// are checked first, then italic faces and then normal faces. If the value
/// is normal, normal faces are checked first, then oblique faces, then
/// italic faces."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleOrder;

impl StyleOrder {
    /// Position of a face's style in the fallback order for `desired`;
    /// lower is preferred.
    #[must_use]
    pub const fn rank(desired: FontStyle, face: FontStyle) -> u8 {
        match (desired, face) {
            (FontStyle::Normal, FontStyle::Normal)
            | (FontStyle::Italic, FontStyle::Italic)
            | (FontStyle::Oblique, FontStyle::Oblique) => 0,
            (FontStyle::Normal | FontStyle::Italic, FontStyle::Oblique)
            | (FontStyle::Oblique, FontStyle::Italic) => 1,
            (FontStyle::Normal, FontStyle::Italic)
            | (FontStyle::Italic | FontStyle::Oblique, FontStyle::Normal) => 2,
        }
    }
}

/// [§ 5.2 step 4c](https://www.w3.org/TR/css-fonts-4/#font-style-matching)
///
/// Rank of a face weight for a desired weight as `(band, distance)`; smaller
/// tuples are preferred.
///
/// "If the desired weight is inclusively between 400 and 500, weights
/// greater than or equal to the target weight are checked in ascending order
/// until 500 is hit and checked, followed by weights less than the target
/// weight in descending order, followed by weights greater than 500, until a
/// match is found."
///
/// "If the desired weight is less than 400, weights less than or equal to
/// the desired weight are checked in descending order followed by weights
/// above the desired weight in ascending order until a match is found."
///
/// "If the desired weight is greater than 500, weights greater than or equal
/// to the desired weight are checked in ascending order followed by weights
/// below the desired weight in descending order until a match is found."
#[must_use]
pub fn weight_rank(desired: u16, face: u16) -> (u8, u16) {
    let distance = desired.abs_diff(face);
    if face == desired {
        return (0, 0);
    }
    if (400..=500).contains(&desired) {
        if face > desired && face <= 500 {
            (1, distance)
        } else if face < desired {
            (2, distance)
        } else {
            (3, distance)
        }
    } else if desired < 400 {
        if face < desired { (1, distance) } else { (2, distance) }
    } else if face > desired {
        (1, distance)
    } else {
        (2, distance)
    }
}

/// Style of a descriptor; faces without one are `normal`.
fn face_style(font: &WebFont) -> FontStyle {
    font.style
        .as_deref()
        .and_then(FontStyle::parse_value)
        .unwrap_or(FontStyle::Normal)
}

/// Weight of a descriptor; faces without one are 400.
fn face_weight(font: &WebFont) -> u16 {
    font.weight
        .as_deref()
        .and_then(parse_font_weight)
        .unwrap_or(DEFAULT_WEIGHT)
}

/// Compare two optional family positions: present beats absent, earlier
/// beats later, two absent ones tie.
fn compare_family_position(a: Option<usize>, b: Option<usize>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// The fully resolved font of one element: the inherited info with tag
/// defaults filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveFont {
    /// Normalized family list.
    pub family: Vec<String>,
    /// Desired style.
    pub style: FontStyle,
    /// Desired weight.
    pub weight: u16,
}

impl EffectiveFont {
    /// Position of a web font's family in the family list.
    #[must_use]
    pub fn family_position(&self, font: &WebFont) -> Option<usize> {
        let quoted = font.quoted_family();
        self.family.iter().position(|name| *name == quoted)
    }

    /// Whether `font` may render text in this font: its family is listed and
    /// its style matches, or the desired style is slanted (italic and oblique
    /// fall back onto any face, synthesizing the slant if needed).
    #[must_use]
    pub fn accepts(&self, font: &WebFont) -> bool {
        self.family_position(font).is_some()
            && (self.style != FontStyle::Normal || face_style(font) == self.style)
    }

    /// Candidate order between two web fonts.
    #[must_use]
    pub fn compare(&self, a: &WebFont, b: &WebFont) -> Ordering {
        compare_family_position(self.family_position(a), self.family_position(b))
            .then_with(|| {
                StyleOrder::rank(self.style, face_style(a))
                    .cmp(&StyleOrder::rank(self.style, face_style(b)))
            })
            .then_with(|| {
                weight_rank(self.weight, face_weight(a)).cmp(&weight_rank(self.weight, face_weight(b)))
            })
    }
}

/// Hand `text` to the best acceptable web font of every family in the
/// element's family list.
///
/// `web_fonts` itself is not reordered; only the `chars` of the chosen
/// fonts change.
pub fn match_text(font: &EffectiveFont, text: &str, web_fonts: &mut [WebFont]) {
    let mut order: Vec<usize> = (0..web_fonts.len()).collect();
    order.sort_by(|&a, &b| font.compare(&web_fonts[a], &web_fonts[b]));

    let mut accepted: Vec<usize> = Vec::new();
    for index in order {
        let family = &web_fonts[index].family;
        if accepted.iter().any(|&done| web_fonts[done].family == *family) {
            continue;
        }
        if font.accepts(&web_fonts[index]) {
            web_fonts[index].add_chars(text);
            accepted.push(index);
        }
    }
}
