//! Escaping for values spliced into CSS selectors.
//!
//! Serialization is delegated to `cssparser`, the tokenizer behind the
//! selector engine, so escaped names always parse back to themselves.

use cssparser::{serialize_identifier, serialize_string};

/// Escape `ident` for use after `#` or `.` in a selector.
pub fn escape_identifier(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len());
    // Writing into a String cannot fail.
    let _ = serialize_identifier(ident, &mut out);
    out
}

/// `s` as a double-quoted CSS string, e.g. for `[attr="value"]`.
pub fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    let _ = serialize_string(s, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_identifiers_are_unchanged() {
        assert_eq!(escape_identifier("main-nav_2"), "main-nav_2");
        assert_eq!(escape_identifier("über"), "über");
        assert_eq!(escape_identifier("--custom"), "--custom");
    }

    #[test]
    fn special_characters_are_escaped() {
        assert_eq!(escape_identifier("w-1/2"), "w-1\\/2");
        assert_eq!(escape_identifier("a.b"), "a\\.b");
        assert_eq!(escape_identifier("2col"), "\\32 col");
    }

    #[test]
    fn leading_hyphens_and_controls_stay_valid() {
        assert_eq!(escape_identifier("-2col"), "-\\32 col");
        assert_eq!(escape_identifier("-"), "\\-");
        assert_eq!(escape_identifier("a\nb"), "a\\a b");
    }

    #[test]
    fn strings_are_quoted_and_escaped() {
        assert_eq!(quote_string("q"), "\"q\"");
        assert_eq!(quote_string(r#"say "hi" \o/"#), r#""say \"hi\" \\o/""#);
        assert_eq!(quote_string("a\nb"), "\"a\\a b\"");
    }
}
