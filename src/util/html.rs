use std::borrow::Cow;

use url::Url;

#[inline]
fn needs_escape(c: char) -> bool {
    matches!(c, '&' | '<' | '>' | '"' | '\'')
}

/// Escape text for embedding in HTML element content or a quoted attribute.
///
/// Replaces `&`, `<`, `>`, `"` and `'` with entities. Returns `Cow::Borrowed`
/// when nothing needs escaping.
///
/// # Examples
///
/// ```
/// use byline::util::escape_html;
///
/// assert_eq!(escape_html("Tom & Jerry"), "Tom &amp; Jerry");
/// assert_eq!(escape_html("<b>"), "&lt;b&gt;");
/// ```
pub fn escape_html(s: &str) -> Cow<'_, str> {
    if !s.chars().any(needs_escape) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Prepare a link target for an `href` attribute.
///
/// Only absolute `http`/`https` URLs survive; anything else (including
/// `javascript:` and unparseable input) yields an empty string. The normalized
/// URL is then HTML-escaped.
pub fn escape_url(raw: &str) -> String {
    match Url::parse(raw.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => escape_html(url.as_str()).into_owned(),
        Ok(url) => {
            tracing::debug!(scheme = %url.scheme(), "Dropping link with disallowed scheme");
            String::new()
        }
        Err(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_clean_text_is_borrowed() {
        assert!(matches!(escape_html("Plain title"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_escape_all_special_chars() {
        assert_eq!(
            escape_html(r#"<a href="x">O'Brien & co</a>"#),
            "&lt;a href=&quot;x&quot;&gt;O&#039;Brien &amp; co&lt;/a&gt;"
        );
    }

    #[test]
    fn test_escape_preserves_unicode() {
        assert_eq!(escape_html("Misión <en español>"), "Misión &lt;en español&gt;");
    }

    #[test]
    fn test_escape_url_accepts_http_and_https() {
        assert_eq!(escape_url("https://example.com/?p=12"), "https://example.com/?p=12");
        assert_eq!(escape_url("http://example.com/a?x=1&y=2"), "http://example.com/a?x=1&amp;y=2");
    }

    #[test]
    fn test_escape_url_rejects_other_schemes() {
        assert_eq!(escape_url("javascript:alert(1)"), "");
        assert_eq!(escape_url("data:text/html,hi"), "");
        assert_eq!(escape_url("not a url"), "");
    }

    #[test]
    fn test_escape_url_encodes_quotes() {
        // The url crate percent-encodes quotes in the query, so the attribute stays closed.
        let out = escape_url("https://example.com/?q='x'");
        assert!(!out.contains('\''));
    }
}
