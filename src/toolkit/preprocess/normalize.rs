

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").expect("whitespace pattern");
    static ref SPACE_AFTER_PUNCTUATION: Regex =
        Regex::new(r"([，。！？；：,.!?;:]) ").expect("punctuation spacing pattern");
}

/// Trims, collapses whitespace runs to one space and drops the space that
/// follows sentence punctuation. Total and idempotent.
pub fn normalize_whitespace(text: &str) -> String {
    let collapsed = WHITESPACE_RUN.replace_all(text.trim(), " ");
    SPACE_AFTER_PUNCTUATION.replace_all(&collapsed, "$1").into_owned()
}
