//! Decides which parts of a page are content and which are chrome.
//!
//! Rather than mutating the parsed tree, excluded subtrees are skipped while
//! walking it.

use regex::Regex;
use scraper::{ElementRef, Node};
use std::sync::LazyLock;

use crate::extractor::model::collapse_whitespace;

const EXCLUDED_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "nav", "header", "footer", "aside", "form",
    "iframe", "svg", "button", "select", "object", "embed", "canvas", "dialog",
];

/// Structural tags that never get dropped because of their class or id.
const STRUCTURAL_TAGS: &[&str] = &["html", "body", "main", "article"];

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "section",
    "article", "blockquote", "tr", "td", "th", "table", "pre", "figcaption", "dd", "dt", "main",
];

static CHROME_CLASS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:^|[\s_-])(?:ad|ads|adv|advert|advertisement|advertising|promo|promoted|sponsor|sponsored|subscribe|subscription|newsletter|paywall|social|share|sharing|related|recommended|recirculation|comments?|cookie|consent|popup|modal|banner|outbrain|taboola|breadcrumbs?|sidebar|widget)(?:[\s_-]|$)",
    )
    .unwrap()
});

const BOILERPLATE_PREFIXES: &[&str] = &[
    "subscribe",
    "click here",
    "advertisement",
    "sign up",
    "sign in",
    "log in",
    "read more",
    "read next",
    "related:",
    "follow us",
    "share this",
    "all rights reserved",
    "copyright",
    "\u{a9}",
    "newsletter",
    "get the latest",
    "support our journalism",
    "we use cookies",
];

/// True when the element and its whole subtree should be ignored.
pub fn is_excluded(element: ElementRef<'_>) -> bool {
    let el = element.value();
    let name = el.name();

    if EXCLUDED_TAGS.contains(&name) {
        return true;
    }

    if el.attr("hidden").is_some() || el.attr("aria-hidden") == Some("true") {
        return true;
    }
    if let Some(style) = el.attr("style") {
        let compact: String = style.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.to_ascii_lowercase().contains("display:none") {
            return true;
        }
    }

    if STRUCTURAL_TAGS.contains(&name) {
        return false;
    }

    let class = el.attr("class").unwrap_or_default();
    let id = el.id().unwrap_or_default();
    CHROME_CLASS_REGEX.is_match(class) || CHROME_CLASS_REGEX.is_match(id)
}

/// True when any ancestor of `element` (stopping below `root`, if given) is
/// excluded.
pub fn has_excluded_ancestor(element: ElementRef<'_>, root: Option<ElementRef<'_>>) -> bool {
    let stop = root.map(|r| r.id());
    element
        .ancestors()
        .take_while(|node| Some(node.id()) != stop)
        .filter_map(ElementRef::wrap)
        .any(is_excluded)
}

/// Visible text of a subtree plus the part of it that sits inside links.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct VisibleText {
    pub text: String,
    pub link_text: String,
}

/// Collect text under `root`, skipping excluded descendants. Both fields come
/// back whitespace-collapsed.
pub fn collect_visible(root: ElementRef<'_>) -> VisibleText {
    let root_id = root.id();
    let mut text = String::new();
    let mut link_text = String::new();

    for node in root.descendants() {
        match node.value() {
            Node::Element(el) => {
                if BLOCK_TAGS.contains(&el.name()) {
                    text.push(' ');
                }
            }
            Node::Text(t) => {
                let mut in_link = false;
                let mut hidden = false;
                for ancestor in node
                    .ancestors()
                    .take_while(|a| a.id() != root_id)
                    .filter_map(ElementRef::wrap)
                {
                    if is_excluded(ancestor) {
                        hidden = true;
                        break;
                    }
                    if ancestor.value().name() == "a" {
                        in_link = true;
                    }
                }
                if hidden {
                    continue;
                }
                text.push_str(t);
                if in_link {
                    link_text.push_str(t);
                    link_text.push(' ');
                }
            }
            _ => {}
        }
    }

    // An anchor as the root itself is all link text.
    if root.value().name() == "a" {
        link_text = text.clone();
    }

    VisibleText {
        text: collapse_whitespace(&text),
        link_text: collapse_whitespace(&link_text),
    }
}

/// Paragraphs that open like navigation, promos or legal footers.
pub fn is_boilerplate_paragraph(text: &str) -> bool {
    let lower = text.trim_start().to_lowercase();
    BOILERPLATE_PREFIXES
        .iter()
        .any(|prefix| lower.starts_with(prefix))
}
