//! Main-content extraction by paragraph scoring.
//!
//! Pick the first structural container with enough visible text, score each
//! paragraph inside it as `length * (1 - link_density)`, keep the good ones in
//! document order. The result depends only on the HTML passed in.

use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

use crate::config::Thresholds;
use crate::extractor::cleaner::{
    collect_visible, has_excluded_ancestor, is_boilerplate_paragraph, is_excluded,
};
use crate::extractor::model::{char_count, word_count};

/// Structural candidates for the article container, strongest first.
const CONTAINER_SELECTORS: &[&str] = &[
    "article",
    "[itemprop='articleBody']",
    ".article-body",
    ".article-content",
    ".article__body",
    ".story-body",
    ".story-content",
    ".post-content",
    ".entry-content",
    "#article-body",
    "#story",
    ".content-body",
    "main",
    "[role='main']",
];

static CONTAINERS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    CONTAINER_SELECTORS
        .iter()
        .filter_map(|css| Selector::parse(css).ok())
        .collect()
});

static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p").unwrap());
static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadableConfig {
    /// A container must hold more visible text than this to be chosen.
    pub container_min_chars: usize,
    /// Paragraphs scoring below this are dropped.
    pub paragraph_min_chars: usize,
    /// Joined paragraphs shorter than this trigger the flat-text fallback.
    pub joined_min_chars: usize,
}

impl Default for ReadableConfig {
    fn default() -> Self {
        Self::from(&Thresholds::default())
    }
}

impl From<&Thresholds> for ReadableConfig {
    fn from(t: &Thresholds) -> Self {
        Self {
            container_min_chars: t.container_min_chars,
            paragraph_min_chars: t.paragraph_min_chars,
            joined_min_chars: t.joined_min_chars,
        }
    }
}

/// A scored paragraph, discarded once the winners are joined.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateParagraph {
    pub text: String,
    pub score: f64,
}

pub fn extract_readable_text(html: &str) -> String {
    extract_readable_text_with(html, &ReadableConfig::default())
}

pub fn extract_readable_text_with(html: &str, config: &ReadableConfig) -> String {
    let document = Html::parse_document(html);
    extract_from_document(&document, config)
}

pub fn extract_from_document(document: &Html, config: &ReadableConfig) -> String {
    let Some(container) = find_container(document, config) else {
        return String::new();
    };

    let joined = join_paragraphs(&score_paragraphs(container, None, config));

    if char_count(&joined) >= config.joined_min_chars {
        return joined;
    }

    // Too little prose: use the flat container text if it has more.
    let flat = collect_visible(container).text;
    if char_count(&flat) > char_count(&joined) {
        flat
    } else {
        joined
    }
}

/// First candidate container with enough visible text, else `<body>`.
pub fn find_container<'a>(document: &'a Html, config: &ReadableConfig) -> Option<ElementRef<'a>> {
    for selector in CONTAINERS.iter() {
        for candidate in document.select(selector) {
            if is_excluded(candidate) || has_excluded_ancestor(candidate, None) {
                continue;
            }
            if char_count(&collect_visible(candidate).text) > config.container_min_chars {
                return Some(candidate);
            }
        }
    }

    document
        .select(&BODY)
        .next()
        .or_else(|| Some(document.root_element()))
}

/// Score every `<p>` under `container`, dropping boilerplate and weak ones.
///
/// `paragraphs` overrides which elements count as paragraphs; site adapters
/// use it to point at their own markup.
pub fn score_paragraphs(
    container: ElementRef<'_>,
    paragraphs: Option<&Selector>,
    config: &ReadableConfig,
) -> Vec<CandidateParagraph> {
    let selector = paragraphs.unwrap_or(&PARAGRAPH);

    container
        .select(selector)
        .filter(|p| !is_excluded(*p) && !has_excluded_ancestor(*p, Some(container)))
        .filter_map(|p| {
            let visible = collect_visible(p);
            if visible.text.is_empty() || is_boilerplate_paragraph(&visible.text) {
                return None;
            }
            let score = paragraph_score(&visible.text, &visible.link_text);
            (score >= config.paragraph_min_chars as f64).then_some(CandidateParagraph {
                text: visible.text,
                score,
            })
        })
        .collect()
}

/// `length * (1 - link_density)`, link density measured in words.
pub fn paragraph_score(text: &str, link_text: &str) -> f64 {
    let words = word_count(text);
    if words == 0 {
        return 0.0;
    }
    let link_density = (word_count(link_text) as f64 / words as f64).min(1.0);
    char_count(text) as f64 * (1.0 - link_density)
}

pub fn join_paragraphs(paragraphs: &[CandidateParagraph]) -> String {
    paragraphs
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
