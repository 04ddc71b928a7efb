//! URL resolution utilities.
//!
//! [URL Standard](https://url.spec.whatwg.org/)
//!
//! Font file references inside `@font-face` are resolved against the location
//! of the style sheet that declares them. Style sheets loaded from disk carry
//! a plain filesystem path as their base, so resolution falls back to path
//! joining whenever the base is not a parseable absolute URL.

use percent_encoding::percent_decode_str;
use url::Url;

/// Returns `true` for `http://` and `https://` URLs (ASCII case-insensitive).
#[must_use]
pub fn is_http_url(url: &str) -> bool {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Returns `true` for `data:` URLs (ASCII case-insensitive).
#[must_use]
pub fn is_data_url(url: &str) -> bool {
    url.get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}

/// [§ 4.4 URL parsing](https://url.spec.whatwg.org/#url-parsing)
///
/// Resolve a potentially relative URL against a base URL.
///
/// STEP 1: "If url is an absolute URL, return url."
///
/// STEP 2: If the base parses as an absolute URL, join the reference onto it.
///
/// STEP 3: Otherwise treat the base as a filesystem path and join path
///         segments, collapsing `.` and `..`.
#[must_use]
pub fn resolve_url(href: &str, base_url: Option<&str>) -> String {
    let href = href.trim();

    // STEP 1: Absolute references are kept verbatim so `data:` payloads are
    // not re-encoded.
    if Url::parse(href).is_ok() {
        return href.to_string();
    }

    let Some(base) = base_url.filter(|b| !b.is_empty()) else {
        return href.to_string();
    };

    // STEP 2: Absolute base.
    if let Ok(joined) = Url::parse(base).and_then(|base| base.join(href)) {
        return joined.to_string();
    }

    // STEP 3: Filesystem base.
    if href.starts_with('/') {
        return normalize_path(href);
    }
    let base_dir = base.rsplit_once('/').map_or("", |(dir, _)| dir);
    if base_dir.is_empty() && !base.starts_with('/') {
        return normalize_path(href);
    }
    normalize_path(&format!("{base_dir}/{href}"))
}

/// Collapse `.` and `..` segments of a slash separated path.
fn normalize_path(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|last| *last != "..") {
                    let _ = segments.pop();
                } else if !absolute {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }
    let joined = segments.join("/");
    if absolute { format!("/{joined}") } else { joined }
}

/// Remove a trailing `#fragment`.
#[must_use]
pub fn strip_fragment(url: &str) -> &str {
    url.split_once('#').map_or(url, |(head, _)| head)
}

/// Remove a trailing `?query` and/or `#fragment`.
#[must_use]
pub fn strip_query_and_fragment(url: &str) -> &str {
    url.find(['?', '#']).map_or(url, |index| &url[..index])
}

/// Percent-decode a URL into a display string. Invalid UTF-8 sequences are
/// replaced rather than rejected.
#[must_use]
pub fn percent_decode(url: &str) -> String {
    percent_decode_str(url).decode_utf8_lossy().into_owned()
}
