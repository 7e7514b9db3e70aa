//! Text helpers.

/// Truncate to at most `limit` characters without splitting a code point.
///
/// # Examples
///
/// ```
/// use reelsmith_core::truncate_chars;
///
/// assert_eq!(truncate_chars("héllo", 2), "hé");
/// assert_eq!(truncate_chars("short", 100), "short");
/// ```
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
