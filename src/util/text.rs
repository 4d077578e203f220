use std::borrow::Cow;

/// Returns true for bytes that never belong in a single-line text field.
#[inline]
fn is_control_byte(b: u8) -> bool {
    b < 0x20 || b == 0x7f
}

/// Strip ASCII control characters from text.
///
/// Removes 0x00-0x1F and 0x7F, including tab and line breaks, since every caller
/// wants a single-line value.
///
/// Returns `Cow::Borrowed` when the input contains no control characters (common case).
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    if !s.bytes().any(is_control_byte) {
        return Cow::Borrowed(s);
    }

    // Control bytes are ASCII, so they never split a multi-byte codepoint.
    Cow::Owned(s.chars().filter(|c| !(c.is_ascii() && is_control_byte(*c as u8))).collect())
}

/// Remove anything that looks like a markup tag.
///
/// A `<` followed by a letter, `/`, `!` or `?` opens a tag that runs to the next
/// `>`; an unterminated tag swallows the rest of the input. Any other `<` is kept
/// as text (escaping happens at render time).
pub fn strip_tags(s: &str) -> Cow<'_, str> {
    if !s.contains('<') {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        let opens_tag = c == '<'
            && chars
                .peek()
                .is_some_and(|n| n.is_ascii_alphabetic() || matches!(n, '/' | '!' | '?'));
        if opens_tag {
            for skipped in chars.by_ref() {
                if skipped == '>' {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

/// Remove percent-encoded octets (`%3C`, `%0a`, ...) that could smuggle markup
/// or control bytes past the other filters.
fn strip_percent_octets(s: &str) -> Cow<'_, str> {
    let bytes = s.as_bytes();
    let is_octet = |i: usize| {
        bytes[i] == b'%'
            && i + 2 < bytes.len()
            && bytes[i + 1].is_ascii_hexdigit()
            && bytes[i + 2].is_ascii_hexdigit()
    };
    if !(0..bytes.len()).any(is_octet) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < bytes.len() {
        if is_octet(i) {
            i += 3;
            continue;
        }
        // Advance one whole codepoint.
        let ch_len = s[i..].chars().next().map_or(1, char::len_utf8);
        out.push_str(&s[i..i + ch_len]);
        i += ch_len;
    }
    Cow::Owned(out)
}

/// Reduce untrusted client text to a safe single-line string.
///
/// Tags and percent-encoded octets are removed, line breaks and tabs become
/// spaces, runs of whitespace collapse to one space, and the result is trimmed.
///
/// # Examples
///
/// ```
/// use byline::util::sanitize_text_field;
///
/// assert_eq!(sanitize_text_field("  all\t time \n"), "all time");
/// assert_eq!(sanitize_text_field("<b>1 year ago</b>"), "1 year ago");
/// assert_eq!(sanitize_text_field("<script>x</script>"), "x");
/// ```
pub fn sanitize_text_field(s: &str) -> String {
    let no_tags = strip_tags(s);
    let no_octets = strip_percent_octets(&no_tags);

    let mut out = String::with_capacity(no_octets.len());
    for word in no_octets.split(|c: char| c.is_whitespace() || c.is_control()) {
        if word.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&strip_control_chars(word));
    }
    out
}
