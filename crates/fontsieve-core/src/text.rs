//! Quote-aware helpers for comma separated CSS text.

/// Split on commas that are not inside a quoted string.
///
/// Pieces are returned untrimmed, quotes included, so that
/// `a[data-x="1,2"], b` yields `a[data-x="1,2"]` and ` b`. A backslash inside
/// a quoted string escapes the next character. An unterminated string runs to
/// the end of the input.
///
/// Empty pieces are kept: `,a` yields `` and `a`, so positions line up with
/// the commas written. Callers skip the empty ones.
#[must_use]
pub fn split_unquoted_commas(input: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (index, c) in input.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            ',' => {
                pieces.push(&input[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }

    if start < input.len() || !pieces.is_empty() {
        pieces.push(&input[start..]);
    }
    pieces
}

/// Strip one leading and one trailing quote character (`"` or `'`).
///
/// The two ends are handled independently, so a lone quote on either side is
/// removed too.
#[must_use]
pub fn strip_quotes(value: &str) -> &str {
    let value = value
        .strip_prefix('"')
        .or_else(|| value.strip_prefix('\''))
        .unwrap_or(value);
    value
        .strip_suffix('"')
        .or_else(|| value.strip_suffix('\''))
        .unwrap_or(value)
}
