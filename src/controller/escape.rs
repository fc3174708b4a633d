use std::borrow::Cow;

/// HTML-escapes `&`, `<`, `>`, `"` and `'`.
pub fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Like [`escape`] for raw bytes. Invalid UTF-8 sequences become U+FFFD.
pub fn escape_bytes(bytes: &[u8]) -> String {
    escape(&String::from_utf8_lossy(bytes)).into_owned()
}

/// Trim then escape, the treatment every submitted field gets.
pub fn sanitize_field(value: &str) -> String {
    escape(value.trim()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_special_characters() {
        assert_eq!(
            escape(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#039;s&lt;/a&gt;"
        );
    }

    #[test]
    fn plain_ascii_is_unchanged_and_borrowed() {
        let escaped = escape("hello world 123");

        assert!(matches!(escaped, Cow::Borrowed("hello world 123")));
    }

    #[test]
    fn invalid_bytes_are_substituted() {
        assert_eq!(escape_bytes(b"ok\xff<"), "ok\u{FFFD}&lt;");
    }

    #[test]
    fn sanitize_field_trims_before_escaping() {
        assert_eq!(sanitize_field("  <b>  "), "&lt;b&gt;");
    }
}
