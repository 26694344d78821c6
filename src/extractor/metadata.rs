use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use url::Url;

use crate::extractor::cleaner::collect_visible;
use crate::extractor::model::{char_count, collapse_whitespace};

pub const UNTITLED: &str = "Untitled Article";

const BYLINE_MIN_CHARS: usize = 3;
const BYLINE_MAX_CHARS: usize = 100;

/// Title sources after the social meta tags, in order.
const TITLE_META: &[&str] = &[
    "meta[property='og:title']",
    "meta[name='twitter:title']",
    "meta[property='twitter:title']",
];
const TITLE_HEADINGS: &[&str] = &["h1[itemprop='headline']", "article h1", "h1"];

const BYLINE_META: &[&str] = &["meta[name='author']", "meta[property='article:author']"];
const BYLINE_ELEMENTS: &[&str] = &[
    "[rel='author']",
    "[itemprop='author'] [itemprop='name']",
    "[itemprop='author']",
    ".byline__name",
    ".byline-name",
    ".author-name",
    ".byline",
    ".author",
    "[class*='byline']",
    "[class*='author-name']",
];

const DESCRIPTION_META: &[&str] = &[
    "meta[property='og:description']",
    "meta[name='description']",
    "meta[name='twitter:description']",
];

const PUBLISHED_META: &[&str] = &[
    "meta[property='article:published_time']",
    "meta[name='article:published_time']",
    "meta[itemprop='datePublished']",
    "meta[name='date']",
    "meta[name='pubdate']",
    "meta[name='publishdate']",
];

static BY_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[Bb]y\s+([\p{Lu}][\p{L}.'\-]+(?:\s+(?:[\p{Lu}][\p{L}.'\-]+|and|&)){0,5})(?:\s*[,|\x{2022}].*)?$")
        .unwrap()
});
static BY_PREFIX_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^by\s+").unwrap());

static TITLE_TAG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
static SITE_NAME: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("meta[property='og:site_name']").unwrap());
static TIME_DATETIME: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("time[datetime]").unwrap());
/// Short elements that may carry a "By <Name>" line.
static BYLINE_TEXT_CANDIDATES: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p, span, div, address, li, em, strong").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: String,
    pub byline: Option<String>,
    pub description: Option<String>,
    /// Hostname without a leading `www.`.
    pub site: String,
    pub site_name: Option<String>,
    /// RFC 3339 when the source date parses, otherwise as written.
    pub published_at: Option<String>,
}

impl Metadata {
    /// What is known about a page that was never retrieved.
    pub fn for_url(url: &Url) -> Self {
        Self {
            title: UNTITLED.to_string(),
            byline: None,
            description: None,
            site: site_from_url(url),
            site_name: None,
            published_at: None,
        }
    }
}

pub fn extract_metadata(html: &str, url: &Url) -> Metadata {
    let document = Html::parse_document(html);
    extract_metadata_from(&document, url)
}

pub fn extract_metadata_from(document: &Html, url: &Url) -> Metadata {
    Metadata {
        title: extract_title(document),
        byline: extract_byline(document),
        description: first_meta_content(document, DESCRIPTION_META),
        site: site_from_url(url),
        site_name: meta_content(document, &SITE_NAME),
        published_at: extract_published(document),
    }
}

pub fn site_from_url(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_lowercase();
    host.strip_prefix("www.").map(str::to_string).unwrap_or(host)
}

fn extract_title(document: &Html) -> String {
    if let Some(title) = first_meta_content(document, TITLE_META) {
        return title;
    }
    if let Some(title) = first_text(document, TITLE_HEADINGS) {
        return title;
    }
    document
        .select(&TITLE_TAG)
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .find(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string())
}

fn extract_byline(document: &Html) -> Option<String> {
    for css in BYLINE_META {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        for el in document.select(&selector) {
            if let Some(byline) = el.value().attr("content").and_then(accept_byline) {
                return Some(byline);
            }
        }
    }

    for css in BYLINE_ELEMENTS {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        for el in document.select(&selector) {
            let text = el
                .value()
                .attr("content")
                .map(str::to_string)
                .unwrap_or_else(|| collect_visible(el).text);
            if let Some(byline) = accept_byline(&text) {
                return Some(byline);
            }
        }
    }

    document
        .select(&BYLINE_TEXT_CANDIDATES)
        .map(|el| collect_visible(el).text)
        .filter(|text| char_count(text) <= BYLINE_MAX_CHARS + 3)
        .find_map(|text| {
            let caps = BY_NAME_REGEX.captures(&text)?;
            accept_byline(caps.get(1)?.as_str())
        })
}

/// Trim a leading "By " and keep names of a plausible length.
fn accept_byline(raw: &str) -> Option<String> {
    let collapsed = collapse_whitespace(raw);
    let name = BY_PREFIX_REGEX.replace(&collapsed, "").trim().to_string();
    let len = char_count(&name);
    if !(BYLINE_MIN_CHARS..=BYLINE_MAX_CHARS).contains(&len) {
        return None;
    }
    // Profile links are not names.
    if name.starts_with("http://") || name.starts_with("https://") {
        return None;
    }
    Some(name)
}

fn extract_published(document: &Html) -> Option<String> {
    let raw = first_meta_content(document, PUBLISHED_META).or_else(|| {
        document
            .select(&TIME_DATETIME)
            .filter_map(|el| el.value().attr("datetime"))
            .map(collapse_whitespace)
            .find(|d| !d.is_empty())
    })?;
    Some(normalize_date(&raw))
}

fn normalize_date(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Utc).to_rfc3339();
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return dt.with_timezone(&Utc).to_rfc3339();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    raw.to_string()
}

fn meta_content(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .filter_map(|el| el.value().attr("content"))
        .map(collapse_whitespace)
        .find(|c| !c.is_empty())
}

fn first_meta_content(document: &Html, selectors: &[&str]) -> Option<String> {
    selectors
        .iter()
        .filter_map(|css| Selector::parse(css).ok())
        .find_map(|selector| meta_content(document, &selector))
}

fn first_text(document: &Html, selectors: &[&str]) -> Option<String> {
    selectors
        .iter()
        .filter_map(|css| Selector::parse(css).ok())
        .find_map(|selector| {
            document
                .select(&selector)
                .map(|el: ElementRef<'_>| collapse_whitespace(&el.text().collect::<String>()))
                .find(|t| !t.is_empty())
        })
}
