//! JSON embedded in inline `<script>` blocks.

use alloc::string::String;

use serde::Serialize;

/// Serializes `value` as JSON that is safe to place inside an inline `<script>` element.
///
/// `<`, `>` and `&` become unicode escapes so the payload can never close the script element
/// or open a comment; U+2028 and U+2029 are escaped because older JavaScript parsers treat
/// them as line terminators inside string literals.
///
/// # Errors
///
/// Returns the serializer error when `value` cannot be represented as JSON.
pub fn script_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(value)?;
    let mut out = String::with_capacity(json.len());
    for ch in json.chars() {
        match ch {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            ch => out.push(ch),
        }
    }
    Ok(out)
}
