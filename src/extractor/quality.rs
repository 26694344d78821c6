//! The bar a tier's output must clear before the orchestrator accepts it.

use regex::Regex;
use std::sync::LazyLock;

use crate::extractor::model::{char_count, word_count};

const MAX_BOILERPLATE_RATIO: f64 = 0.3;

const BOILERPLATE_KEYWORDS: &[&str] = &[
    "cookie",
    "privacy",
    "terms of service",
    "policy",
    "gdpr",
    "consent",
    "subscribe",
    "subscription",
    "newsletter",
    "sign in",
    "log in",
    "sign up",
    "register",
    "password",
    "advertisement",
    "access denied",
    "not found",
    "please wait",
    "enable javascript",
    "browser",
    "captcha",
    "robot",
    "click here",
];

/// Whole keywords only, with an optional plural `s`.
static BOILERPLATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = BOILERPLATE_KEYWORDS
        .iter()
        .map(|keyword| regex::escape(keyword))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{})s?\b", alternation)).unwrap()
});

/// Long enough and not dominated by consent, login or paywall chrome.
pub fn clears_bar(text: &str, min_chars: usize) -> bool {
    if char_count(text) < min_chars {
        return false;
    }
    !has_too_much_boilerplate(text)
}

pub fn has_too_much_boilerplate(text: &str) -> bool {
    let total_words = word_count(text);
    if total_words == 0 {
        return false;
    }

    let boilerplate_count = BOILERPLATE_REGEX.find_iter(text).count();

    boilerplate_count as f64 / total_words as f64 > MAX_BOILERPLATE_RATIO
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_short_text() {
        assert!(!clears_bar("Short", 100));
        assert!(clears_bar(&"Long enough content ".repeat(10), 100));
    }

    #[test]
    fn test_rejects_boilerplate() {
        let wall = "Please enable JavaScript and cookie consent to continue. Subscribe to our newsletter. ".repeat(20);
        assert!(has_too_much_boilerplate(&wall));
        assert!(!clears_bar(&wall, 100));
    }

    #[test]
    fn test_accepts_good_content() {
        let good_content = "This is a high-quality article with substantial content that provides value to readers. ".repeat(10);
        assert!(!has_too_much_boilerplate(&good_content));
        assert!(clears_bar(&good_content, 500));
    }

    #[test]
    fn test_empty_text_is_not_boilerplate() {
        assert!(!has_too_much_boilerplate(""));
        assert!(clears_bar("", 0));
    }

    #[test]
    fn test_keywords_match_whole_words_only() {
        let prose = "Policymakers praised the robotics lab and registered voters kept browsing the robotic exhibits downtown.";
        assert_eq!(BOILERPLATE_REGEX.find_iter(prose).count(), 0);
        assert!(!has_too_much_boilerplate(prose));

        let chrome = "Cookies and privacy policy.";
        assert_eq!(BOILERPLATE_REGEX.find_iter(chrome).count(), 3);
    }
}
