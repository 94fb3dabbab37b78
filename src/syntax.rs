//! Lexical vocabulary shared by the reader and the writer.

/// Words that may never appear as bare data values.
pub const RESERVED_KEYWORDS: [&str; 5] = ["stop_", "loop_", "save_", "data_", "global_"];

/// Returns true for the whitespace bytes that separate tokens.
#[inline]
#[must_use]
pub const fn is_star_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0B | 0x0C)
}

/// Returns true if `s` contains any token-separating whitespace.
#[must_use]
pub fn contains_whitespace(s: &str) -> bool {
    s.bytes().any(is_star_whitespace)
}

/// Returns true if `token` is exactly one of the reserved keywords.
#[must_use]
pub fn is_reserved(token: &str) -> bool {
    RESERVED_KEYWORDS.contains(&token)
}

/// Returns true if `value` begins with a reserved keyword, ignoring case.
///
/// Such values must be quoted on output: `data_1` and `SAVE_x` would be
/// read back as block headers.
#[must_use]
pub fn starts_with_reserved(value: &str) -> bool {
    RESERVED_KEYWORDS.iter().any(|keyword| {
        value
            .get(..keyword.len())
            .map_or(false, |head| head.eq_ignore_ascii_case(keyword))
    })
}

/// Splits a tag name into its category and short name.
///
/// `_Entry.ID` yields `(Some("_Entry"), "ID")`; a name without a dot
/// has no category.
#[must_use]
pub fn split_tag(name: &str) -> (Option<&str>, &str) {
    match name.split_once('.') {
        Some((category, short)) => (Some(category), short),
        None => (None, name),
    }
}

/// Joins a category and a short name into a full tag name.
#[must_use]
pub fn qualify(category: Option<&str>, short: &str) -> String {
    match category {
        Some(category) => format!("{}.{}", category, short),
        None => short.to_string(),
    }
}
