//! Canonical path construction for gallery entries.
//!
//! Every entry in the gallery tree is keyed by a canonical URL path: forward
//! slashes, a leading slash, and a guaranteed trailing slash. Breadcrumb
//! paths are the display-oriented twin: backslash separated with a trailing
//! backslash. All path assembly in the crate goes through this module so the
//! two forms can never drift apart.
//!
//! ## Fragment Titles
//!
//! Synthesized folders derive their title from their path fragment. Fragments
//! carrying a `YYYY-MM-DD` prefix are reformatted into a human-readable form:
//!
//! - `"2020-05-17-beach-trip"` → `"Beach Trip (17 May 2020)"`
//! - `"2020-05-17"` → `"17 May 2020"`
//! - `"family-portraits"` → `"Family Portraits"`

use chrono::NaiveDate;

/// Separator used by canonical URL paths.
pub const URL_SEPARATOR: char = '/';

/// Separator used by breadcrumb paths.
pub const BREADCRUMB_SEPARATOR: char = '\\';

/// Normalize a raw path into canonical URL form.
///
/// Backslashes become forward slashes, repeated separators collapse, and the
/// result always starts and ends with `/`. The empty string normalizes to the
/// root path `"/"`.
pub fn canonical_url(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push(URL_SEPARATOR);
    for fragment in raw_fragments(raw) {
        out.push_str(fragment);
        out.push(URL_SEPARATOR);
    }
    out
}

/// Normalize a raw path into breadcrumb form: backslash separated with a
/// guaranteed trailing backslash.
pub fn breadcrumb(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push(BREADCRUMB_SEPARATOR);
    for fragment in raw_fragments(raw) {
        out.push_str(fragment);
        out.push(BREADCRUMB_SEPARATOR);
    }
    out
}

/// Append a fragment to a canonical path, producing a canonical child path.
pub fn join(parent: &str, fragment: &str) -> String {
    let mut base = canonical_url(parent);
    for fragment in raw_fragments(fragment) {
        base.push_str(fragment);
        base.push(URL_SEPARATOR);
    }
    base
}

/// The non-empty fragments of a path, in order.
pub fn fragments(path: &str) -> Vec<&str> {
    raw_fragments(path).collect()
}

/// The canonical path of the immediate parent, or `None` at the root.
pub fn parent(path: &str) -> Option<String> {
    let parts = fragments(path);
    let (_, ancestors) = parts.split_last()?;
    let mut out = String::from("/");
    for fragment in ancestors {
        out.push_str(fragment);
        out.push(URL_SEPARATOR);
    }
    Some(out)
}

/// The last fragment of a canonical path, or `None` at the root.
pub fn leaf_fragment(path: &str) -> Option<&str> {
    raw_fragments(path).last()
}

/// Every strict ancestor of `path` from the root down, as canonical paths.
///
/// `"/albums/2020/trip/"` → `["/", "/albums/", "/albums/2020/"]`.
pub fn ancestors(path: &str) -> Vec<String> {
    let parts = fragments(path);
    if parts.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(parts.len());
    let mut current = String::from("/");
    out.push(current.clone());
    for fragment in parts.iter().take(parts.len().saturating_sub(1)) {
        current.push_str(fragment);
        current.push(URL_SEPARATOR);
        out.push(current.clone());
    }
    out
}

/// Reduce a free-form string to a URL-safe slug: lowercase ASCII
/// alphanumerics with single dashes between words.
pub fn url_safe_slug(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_dash = false;
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    out
}

/// Split a fragment into its `YYYY-MM-DD` date prefix and the remainder.
///
/// The remainder has the joining dash stripped: `"2020-05-17-beach"` →
/// `(2020-05-17, "beach")`, `"2020-05-17"` → `(2020-05-17, "")`.
pub fn date_prefix(fragment: &str) -> Option<(NaiveDate, &str)> {
    if fragment.len() < 10 || !fragment.is_char_boundary(10) {
        return None;
    }
    let (head, rest) = fragment.split_at(10);
    let date = NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()?;
    let rest = rest.strip_prefix('-').unwrap_or(rest);
    Some((date, rest))
}

/// Derive a display title from a path fragment.
///
/// Date-prefixed fragments are reformatted with the date moved into a
/// trailing parenthetical; everything else gets dash→space title casing.
pub fn fragment_title(fragment: &str) -> String {
    match date_prefix(fragment) {
        Some((date, rest)) if rest.is_empty() => format_date(date),
        Some((date, rest)) => format!("{} ({})", title_case(rest), format_date(date)),
        None => title_case(fragment),
    }
}

/// Dash→space conversion with each word's first letter uppercased.
pub fn title_case(raw: &str) -> String {
    raw.split('-')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_date(date: NaiveDate) -> String {
    date.format("%-d %B %Y").to_string()
}

fn raw_fragments(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(['/', '\\']).filter(|s| !s.is_empty())
}
