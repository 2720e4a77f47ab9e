//! Text cosmetics for scraped strings.
//!
//! Scraped text tends to carry layout whitespace, stray control characters
//! and literal `\uXXXX` escapes left behind by JSON-in-HTML. These helpers
//! strip them either by literal substitution or by regex.

use regex::{NoExpand, Regex};

use crate::Result;

/// Impurities removed by [`text_cosmetics`] when the caller has no list of
/// their own: newline, tab, carriage return, a literal `\s` and form feed.
pub const DEFAULT_IMPURITIES: &[&str] = &["\n", "\t", "\r", "\\s", "\x0c"];

/// Impurities removed by [`texts_cosmetics`] by default.
pub const DEFAULT_LIST_IMPURITIES: &[&str] = &["\n", "\t"];

/// Matches a literal unicode escape such as `\u2002` left in extracted text.
pub const UNICODE_ESCAPE_PATTERN: &str = r"\\u[0-9a-fA-F]{4}";

/// Replace every literal occurrence of each impurity, in order.
pub fn text_cosmetics(text: &str, impurities: &[&str], replacer: &str) -> String {
    impurities
        .iter()
        .filter(|impurity| !impurity.is_empty())
        .fold(text.to_string(), |acc, impurity| acc.replace(impurity, replacer))
}

/// [`text_cosmetics`] over a list of texts.
pub fn texts_cosmetics<S: AsRef<str>>(
    texts: &[S],
    impurities: &[&str],
    replacer: &str,
) -> Vec<String> {
    texts
        .iter()
        .map(|text| text_cosmetics(text.as_ref(), impurities, replacer))
        .collect()
}

/// Replace every match of each regex pattern, in order.
///
/// The replacer is inserted literally; `$1`-style group references are not
/// expanded.
///
/// ```
/// use gleaner_common::text::{text_cosmetics_re, UNICODE_ESCAPE_PATTERN};
///
/// let out = text_cosmetics_re(r"HOUSE\u2002FOODS", &[UNICODE_ESCAPE_PATTERN], " ").unwrap();
/// assert_eq!(out, "HOUSE FOODS");
/// ```
pub fn text_cosmetics_re(text: &str, patterns: &[&str], replacer: &str) -> Result<String> {
    let compiled = compile(patterns)?;
    Ok(apply(&compiled, text, replacer))
}

/// [`text_cosmetics_re`] over a list of texts. Patterns are compiled once.
pub fn texts_cosmetics_re<S: AsRef<str>>(
    texts: &[S],
    patterns: &[&str],
    replacer: &str,
) -> Result<Vec<String>> {
    let compiled = compile(patterns)?;
    Ok(texts
        .iter()
        .map(|text| apply(&compiled, text.as_ref(), replacer))
        .collect())
}

/// Drop every character outside the ASCII range.
pub fn text_remove_unicode(text: &str) -> String {
    text.chars().filter(char::is_ascii).collect()
}

pub fn texts_remove_unicode<S: AsRef<str>>(texts: &[S]) -> Vec<String> {
    texts
        .iter()
        .map(|text| text_remove_unicode(text.as_ref()))
        .collect()
}

/// Discard empty strings, keeping the order of the rest.
pub fn remove_void_texts<I>(texts: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    texts.into_iter().filter(|text| !text.is_empty()).collect()
}

/// Trim every line, drop blank ones and join the rest with `\n`.
pub fn clean_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn compile(patterns: &[&str]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| Regex::new(pattern).map_err(Into::into))
        .collect()
}

fn apply(compiled: &[Regex], text: &str, replacer: &str) -> String {
    compiled.iter().fold(text.to_string(), |acc, re| {
        re.replace_all(&acc, NoExpand(replacer)).into_owned()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GleanerError;

    #[test]
    fn default_impurities_strip_layout_characters() {
        let raw = "Copy\nright\t2024\r\x0cHouse\\sFoods";
        assert_eq!(
            text_cosmetics(raw, DEFAULT_IMPURITIES, ""),
            "Copyright2024HouseFoods"
        );
    }

    #[test]
    fn replacer_is_inserted_for_each_impurity() {
        assert_eq!(text_cosmetics("a\nb\tc", &["\n", "\t"], " "), "a b c");
    }

    #[test]
    fn empty_impurity_is_ignored() {
        assert_eq!(text_cosmetics("abc", &[""], "-"), "abc");
    }

    #[test]
    fn list_variant_keeps_order() {
        let out = texts_cosmetics(&["x\n", "\ty", "z"], DEFAULT_LIST_IMPURITIES, "");
        assert_eq!(out, vec!["x", "y", "z"]);
    }

    #[test]
    fn unicode_escapes_are_removed() {
        let raw = r"Copyright\u2002© HOUSE\u2002WELLNESS";
        let out = text_cosmetics_re(raw, &[UNICODE_ESCAPE_PATTERN], "").unwrap();
        assert_eq!(out, "Copyright© HOUSEWELLNESS");
    }

    #[test]
    fn real_unicode_characters_are_not_escapes() {
        let raw = "Copyright\u{2002}©";
        let out = text_cosmetics_re(raw, &[UNICODE_ESCAPE_PATTERN], "").unwrap();
        assert_eq!(out, raw);
    }

    #[test]
    fn replacer_is_literal() {
        let out = text_cosmetics_re("a1b2", &[r"(\d)"], "$1!").unwrap();
        assert_eq!(out, "a$1!b$1!");
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let err = text_cosmetics_re("abc", &[r"\u[0-9]{4}"], "").unwrap_err();
        assert!(matches!(err, GleanerError::Pattern(_)));
    }

    #[test]
    fn regex_list_variant() {
        let out = texts_cosmetics_re(&["1a", "b2"], &[r"\d"], "").unwrap();
        assert_eq!(out, vec!["a", "b"]);
    }

    #[test]
    fn non_ascii_is_dropped() {
        assert_eq!(text_remove_unicode("café ©2024 日本"), "caf 2024 ");
        assert_eq!(texts_remove_unicode(&["é", "e"]), vec!["", "e"]);
    }

    #[test]
    fn void_texts_are_discarded() {
        let texts = vec!["".to_string(), "a".into(), " ".into(), "".into()];
        assert_eq!(remove_void_texts(texts), vec!["a", " "]);
    }

    #[test]
    fn clean_lines_trims_and_drops_blank_lines() {
        let raw = "  Title \n\n\t\n  body text\n   ";
        assert_eq!(clean_lines(raw), "Title\nbody text");
    }
}
