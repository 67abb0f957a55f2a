/// Escape the characters that are significant in HTML markup.
///
/// `&`, `<`, `>`, `"` and `'` become `&amp;`, `&lt;`, `&gt;`, `&#34;` and
/// `&#39;`. Existing character and entity references are decoded first, so
/// running the function twice gives the same result as running it once and
/// an `&` that opens no real reference is always escaped.
pub fn sanitize(text: &str) -> String {
    let decoded = html_escape::decode_html_entities(text);
    let escaped = html_escape::encode_text(&decoded);

    let mut out = String::with_capacity(escaped.len());
    for c in escaped.chars() {
        match c {
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Sanitize an optional field, leaving `None` untouched.
pub fn sanitize_opt(text: Option<&str>) -> Option<String> {
    text.map(sanitize)
}
