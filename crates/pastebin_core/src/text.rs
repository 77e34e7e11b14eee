//! Shared text helpers.

/// Escape the five HTML-significant characters in `value` and replace NUL
/// with U+FFFD.
///
/// Mirrors the escaping applied to content submitted through the web form so
/// the stored text can be rendered without further processing.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\'' => escaped.push_str("&#39;"),
            '"' => escaped.push_str("&#34;"),
            '\0' => escaped.push('\u{FFFD}'),
            other => escaped.push(other),
        }
    }
    escaped
}
