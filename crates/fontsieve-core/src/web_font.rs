//! Web font descriptors extracted from `@font-face` rules.
//!
//! [CSS Fonts 4 § 4 Font Resources](https://www.w3.org/TR/css-fonts-4/#font-resources)
//!
//! Each `@font-face` rule becomes one [`WebFont`]. The descriptor keeps the
//! raw `font-stretch`, `font-style` and `font-weight` values as declared and
//! accumulates two things while the document is walked: the characters the
//! font has to render, and the selectors of the rules that reference it.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use fontsieve_common::url::{
    is_data_url, is_http_url, percent_decode, resolve_url, strip_fragment, strip_query_and_fragment,
};
use fontsieve_common::warning::warn_once;
use regex::Regex;
use serde::{Serialize, Serializer};
use strum_macros::{AsRefStr, EnumString};

use crate::model::StyleDeclaration;
use crate::text::strip_quotes;

/// [§ 4.3 src](https://www.w3.org/TR/css-fonts-4/#src-desc)
///
/// `url(...)` optionally followed by `format(...)`; each argument may be
/// double quoted, single quoted or bare.
static SRC_ENTRY: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)url\(\s*(?:"([^"]*)"|'([^']*)'|([^)]*?))\s*\)(?:\s*format\(\s*(?:"([^"]*)"|'([^']*)'|([^)]*?))\s*\))?"#,
    )
    .ok()
});

/// [§ 4.3.1 Font formats](https://www.w3.org/TR/css-fonts-4/#font-format-values)
///
/// Format hints of a `src` entry. Hints outside the known set are kept
/// verbatim (lowercased).
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumString, AsRefStr)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum FontFormat {
    /// `.eot`
    EmbeddedOpentype,
    /// `.woff2`
    Woff2,
    /// `.woff`
    Woff,
    /// `.ttf`
    Truetype,
    /// `.otf`
    Opentype,
    /// `.svg`
    Svg,
    /// Any other format keyword.
    #[strum(default)]
    Other(String),
}

impl FontFormat {
    /// The format implied by a file extension (with the dot), if known.
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            ".eot" => Some(Self::EmbeddedOpentype),
            ".woff2" => Some(Self::Woff2),
            ".woff" => Some(Self::Woff),
            ".ttf" => Some(Self::Truetype),
            ".otf" => Some(Self::Opentype),
            ".svg" => Some(Self::Svg),
            _ => None,
        }
    }

    /// Parse a `format()` argument.
    #[must_use]
    pub fn from_hint(hint: &str) -> Self {
        let hint = hint.to_ascii_lowercase();
        hint.parse().unwrap_or(Self::Other(hint))
    }
}

impl Serialize for FontFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Other(hint) => serializer.serialize_str(hint),
            known => serializer.serialize_str(known.as_ref()),
        }
    }
}

/// One `src` entry of a font face.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FontFile {
    /// Resolved, cleaned and percent-decoded location of the file.
    pub url: String,
    /// The declared or inferred format, `None` when neither is known.
    pub format: Option<FontFormat>,
}

impl FontFile {
    /// Build a file entry from a raw `url()` argument.
    ///
    /// STEP 1: Resolve non-HTTP references against `base_url`.
    ///
    /// STEP 2: Drop the fragment of HTTP URLs, the query and fragment of all
    ///         others.
    ///
    /// STEP 3: Take the format from `format_hint`, else from the extension.
    ///
    /// STEP 4: Percent-decode the URL.
    #[must_use]
    pub fn new(raw_url: &str, format_hint: Option<&str>, base_url: Option<&str>) -> Self {
        // STEP 1
        let resolved = if is_http_url(raw_url) {
            raw_url.trim().to_string()
        } else {
            resolve_url(raw_url, base_url)
        };

        // STEP 2
        let cleaned = if is_http_url(&resolved) {
            strip_fragment(&resolved)
        } else {
            strip_query_and_fragment(&resolved)
        };

        // STEP 3
        let format = match format_hint.map(str::trim).filter(|hint| !hint.is_empty()) {
            Some(hint) => Some(FontFormat::from_hint(hint)),
            None => extension(strip_query_and_fragment(cleaned)).and_then(FontFormat::from_extension),
        };

        // STEP 4
        Self {
            url: percent_decode(cleaned),
            format,
        }
    }

    /// Whether the file is inlined as a `data:` URI.
    #[must_use]
    pub fn is_data_uri(&self) -> bool {
        is_data_url(&self.url)
    }
}

/// The extension of the last path segment, dot included.
fn extension(path: &str) -> Option<&str> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let dot = file_name.rfind('.')?;
    // A leading dot names a hidden file, not an extension.
    (dot > 0).then(|| &file_name[dot..])
}

/// Scan a `src` descriptor for its `url(...)[ format(...)]` entries.
#[must_use]
pub fn parse_src(src: &str, base_url: Option<&str>) -> Vec<FontFile> {
    let Some(pattern) = SRC_ENTRY.as_ref() else {
        return Vec::new();
    };
    pattern
        .captures_iter(src)
        .filter_map(|captures| {
            let url = captures
                .get(1)
                .or_else(|| captures.get(2))
                .or_else(|| captures.get(3))?
                .as_str();
            let format = captures
                .get(4)
                .or_else(|| captures.get(5))
                .or_else(|| captures.get(6))
                .map(|m| m.as_str());
            Some(FontFile::new(url, format, base_url))
        })
        .collect()
}

/// A downloadable font declared by an `@font-face` rule, plus the usage data
/// harvested for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebFont {
    /// SHA-1 of the family and the comma-joined file URLs. Identical
    /// declarations share an id.
    pub id: String,
    /// The family name without quotes.
    pub family: String,
    /// The `src` entries, in declaration order. Never empty.
    pub files: Vec<FontFile>,
    /// Raw `font-stretch` descriptor.
    pub stretch: Option<String>,
    /// Raw `font-style` descriptor.
    pub style: Option<String>,
    /// Raw `font-weight` descriptor.
    pub weight: Option<String>,
    /// Characters rendered with this font.
    #[serde(serialize_with = "serialize_chars")]
    pub chars: BTreeSet<char>,
    /// Selectors of the style rules that reference this family.
    pub selectors: Vec<String>,
}

fn serialize_chars<S: Serializer>(chars: &BTreeSet<char>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&chars.iter().collect::<String>())
}

impl WebFont {
    /// [§ 4.1 The @font-face rule](https://www.w3.org/TR/css-fonts-4/#font-face-rule)
    ///
    /// "The @font-face rule requires the font-family and src descriptors; if
    /// either of them are missing, the @font-face rule must not be considered
    /// when performing the font matching algorithm."
    ///
    /// Returns `None` for such rules, and for rules whose `src` has no
    /// parseable `url()` entry.
    #[must_use]
    pub fn from_font_face<D: StyleDeclaration>(style: &D, base_url: Option<&str>) -> Option<Self> {
        let family = strip_quotes(style.get("font-family")?.trim()).to_string();
        if family.is_empty() {
            return None;
        }

        let files = parse_src(style.get("src")?, base_url);
        if files.is_empty() {
            return None;
        }

        let descriptor = |name: &str| {
            style
                .get(name)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        Some(Self {
            id: font_id(&family, &files),
            stretch: descriptor("font-stretch"),
            style: descriptor("font-style"),
            weight: descriptor("font-weight"),
            family,
            files,
            chars: BTreeSet::new(),
            selectors: Vec::new(),
        })
    }

    /// Record characters rendered with this font. Already present characters
    /// are ignored.
    pub fn add_chars(&mut self, text: &str) {
        self.chars.extend(text.chars());
    }

    /// Record a selector that references this font. Duplicates are ignored.
    pub fn add_selector(&mut self, selector: &str) {
        if !self.selectors.iter().any(|known| known == selector) {
            self.selectors.push(selector.to_string());
        }
    }

    /// The harvested characters as a string, in code point order.
    #[must_use]
    pub fn chars_string(&self) -> String {
        self.chars.iter().collect()
    }

    /// Whether every file is inlined as a `data:` URI. Such fonts cannot be
    /// subset at this layer.
    #[must_use]
    pub fn is_embedded(&self) -> bool {
        self.files.iter().all(FontFile::is_data_uri)
    }

    /// The family as it appears in a normalized `font-family` list.
    #[must_use]
    pub fn quoted_family(&self) -> String {
        format!("\"{}\"", self.family)
    }
}

fn font_id(family: &str, files: &[FontFile]) -> String {
    let urls: Vec<&str> = files.iter().map(|file| file.url.as_str()).collect();
    let mut hasher = sha1_smol::Sha1::new();
    hasher.update(family.as_bytes());
    hasher.update(urls.join(",").as_bytes());
    hasher.digest().to_string()
}

/// Build a [`WebFont`] for every usable `@font-face` rule, in document order.
///
/// Rules without a family or without a `url()` in `src` are skipped with a
/// warning.
pub fn extract_web_fonts<'a, D, I>(font_faces: I) -> Vec<WebFont>
where
    D: StyleDeclaration + 'a,
    I: IntoIterator<Item = (&'a D, Option<&'a str>)>,
{
    font_faces
        .into_iter()
        .filter_map(|(style, base_url)| {
            let web_font = WebFont::from_font_face(style, base_url);
            if web_font.is_none() {
                let family = style.get("font-family").unwrap_or_default();
                warn_once(
                    "Fonts",
                    &format!("@font-face {family:?} skipped: needs font-family and a url() in src"),
                );
            }
            web_font
        })
        .collect()
}
