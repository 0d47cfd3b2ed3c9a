//! Markup escaping shared by the stream renderer and the host-tree serializer.

use alloc::{borrow::Cow, string::String};

/// Escapes `&`, `<`, `>`, `"` and `'` for use in text content and quoted attribute values.
///
/// Returns the input unchanged when nothing needs escaping.
///
/// ```rust
/// assert_eq!(brook_core::escape_html(r#"<x>&"'"#), "&lt;x&gt;&amp;&quot;&#039;");
/// ```
#[must_use]
pub fn escape_html(input: &str) -> Cow<'_, str> {
    if !input.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(input);
    }
    let mut out = String::with_capacity(input.len() + 8);
    escape_into(&mut out, input);
    Cow::Owned(out)
}

/// Appends the escaped form of `input` to `out`.
pub fn escape_into(out: &mut String, input: &str) {
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            ch => out.push(ch),
        }
    }
}

/// Decodes the five escapes produced by [`escape_html`] plus `&apos;`, `&#39;` and numeric
/// character references. Unknown references are kept verbatim.
#[must_use]
pub fn unescape_html(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        rest = &rest[start..];
        let decoded = rest
            .find(';')
            .filter(|&end| end <= 12)
            .and_then(|end| decode_reference(&rest[1..end]).map(|ch| (ch, end)));
        if let Some((ch, end)) = decoded {
            out.push(ch);
            rest = &rest[end + 1..];
        } else {
            out.push('&');
            rest = &rest[1..];
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_the_five_characters() {
        assert_eq!(
            escape_html("a < b && c > \"d\" 'e'"),
            "a &lt; b &amp;&amp; c &gt; &quot;d&quot; &#039;e&#039;"
        );
    }

    #[test]
    fn borrows_clean_input() {
        assert!(matches!(escape_html("plain text"), Cow::Borrowed(_)));
        assert!(matches!(unescape_html("plain text"), Cow::Borrowed(_)));
    }

    #[test]
    fn unescape_reverses_escape() {
        let raw = "<x>&\"'";
        assert_eq!(unescape_html(&escape_html(raw)), raw);
    }

    #[test]
    fn unescape_numeric_and_unknown() {
        assert_eq!(unescape_html("&#65;&#x42;&#39;"), "AB'");
        assert_eq!(unescape_html("fish &chips; & more"), "fish &chips; & more");
        assert_eq!(unescape_html("trailing &"), "trailing &");
    }
}
