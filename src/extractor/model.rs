use regex::Regex;
use std::sync::LazyLock;

static SPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\u{a0}]+").unwrap());
static NEWLINE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\n\s*\n\s*").unwrap());
static SINGLE_NEWLINE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" ?\n ?").unwrap());

/// Collapse every run of whitespace to one space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Like [`collapse_whitespace`] but keeps blank-line paragraph breaks.
pub fn normalize_whitespace(text: &str) -> String {
    let spaced = SPACE_REGEX.replace_all(text.trim(), " ");
    let paragraphs = NEWLINE_REGEX.replace_all(&spaced, "\n\n");
    SINGLE_NEWLINE_REGEX
        .replace_all(&paragraphs, "\n")
        .trim()
        .to_string()
}

pub fn char_count(text: &str) -> usize {
    text.chars().count()
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
