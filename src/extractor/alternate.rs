//! Weaker substitutes for the article page itself: AMP and canonical
//! variants, JSON-LD bodies and social-preview text.

use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::LazyLock;
use url::Url;

use crate::extractor::cleaner::{collect_visible, has_excluded_ancestor, is_boilerplate_paragraph};
use crate::extractor::model::{char_count, collapse_whitespace, normalize_whitespace};

const ARTICLE_TYPES: &[&str] = &[
    "NewsArticle",
    "Article",
    "ReportageNewsArticle",
    "AnalysisNewsArticle",
    "BlogPosting",
];

/// Visible paragraphs appended to the description in the social fallback.
const OPEN_GRAPH_PARAGRAPHS: usize = 3;
const OPEN_GRAPH_PARAGRAPH_MIN_CHARS: usize = 40;

static AMP_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("link[rel~='amphtml'][href]").unwrap());
static CANONICAL_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("link[rel~='canonical'][href]").unwrap());
static JSON_LD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script[type='application/ld+json']").unwrap());
static DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("meta[property='og:description'], meta[name='description']").unwrap()
});
static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body p").unwrap());

/// The page's declared AMP variant, resolved against `base_url`.
pub fn find_amp_url(html: &str, base_url: &Url) -> Option<Url> {
    let document = Html::parse_document(html);
    find_link(&document, &AMP_LINK, base_url)
}

/// Common AMP URL shapes to probe when the page declares none.
pub fn amp_variants(base_url: &Url) -> Vec<Url> {
    let mut variants = Vec::new();

    let path = base_url.path().trim_end_matches('/');
    if !path.ends_with("/amp") {
        let mut suffixed = base_url.clone();
        suffixed.set_path(&format!("{}/amp", path));
        suffixed.set_fragment(None);
        variants.push(suffixed);
    }

    let already_amp = base_url
        .query_pairs()
        .any(|(k, v)| k == "amp" || (k == "outputType" && v == "amp"));
    if !already_amp {
        let mut query = base_url.clone();
        query.set_fragment(None);
        query.query_pairs_mut().append_pair("amp", "1");
        variants.push(query);

        let mut output_type = base_url.clone();
        output_type.set_fragment(None);
        output_type.query_pairs_mut().append_pair("outputType", "amp");
        variants.push(output_type);
    }

    variants
}

/// `<link rel="canonical">`, resolved against `base_url`.
pub fn find_canonical_url(html: &str, base_url: &Url) -> Option<Url> {
    let document = Html::parse_document(html);
    find_link(&document, &CANONICAL_LINK, base_url)
}

fn find_link(document: &Html, selector: &Selector, base_url: &Url) -> Option<Url> {
    document
        .select(selector)
        .filter_map(|el| el.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .find_map(|href| base_url.join(href).ok())
        .filter(|url| matches!(url.scheme(), "http" | "https"))
}

/// `articleBody`, `text` or `paragraph` of the first article-typed JSON-LD
/// entry that has one.
pub fn extract_json_ld(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    document
        .select(&JSON_LD)
        .filter_map(|script| {
            let raw = script.text().collect::<String>();
            serde_json::from_str::<Value>(raw.trim()).ok()
        })
        .find_map(|value| json_ld_body(&value))
}

fn json_ld_body(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => {
            if is_article_type(map.get("@type")) {
                for key in ["articleBody", "text", "paragraph"] {
                    if let Some(body) = map.get(key).and_then(body_text)
                        && !body.is_empty()
                    {
                        return Some(body);
                    }
                }
            }
            // @graph, mainEntity and friends
            map.values().find_map(json_ld_body)
        }
        Value::Array(items) => items.iter().find_map(json_ld_body),
        _ => None,
    }
}

fn is_article_type(value: Option<&Value>) -> bool {
    match value {
        Some(Value::String(t)) => ARTICLE_TYPES.contains(&t.as_str()),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|t| ARTICLE_TYPES.contains(&t)),
        _ => false,
    }
}

/// Bodies are sometimes HTML and sometimes split into paragraph objects.
fn body_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(strip_markup(s)),
        Value::Array(parts) => {
            let joined = parts
                .iter()
                .filter_map(body_text)
                .filter(|p| !p.is_empty())
                .collect::<Vec<_>>()
                .join("\n\n");
            Some(joined)
        }
        Value::Object(map) => map
            .get("text")
            .or_else(|| map.get("articleBody"))
            .and_then(body_text),
        _ => None,
    }
}

fn strip_markup(text: &str) -> String {
    if !text.contains('<') {
        return normalize_whitespace(text);
    }
    let fragment = Html::parse_fragment(text);
    let flat = fragment
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ");
    collapse_whitespace(&flat)
}

/// Description meta plus the first few visible paragraphs, as a last-resort
/// signal when nothing better exists.
pub fn extract_open_graph_content(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let mut parts = Vec::new();

    let description = document
        .select(&DESCRIPTION)
        .filter_map(|el| el.value().attr("content"))
        .map(collapse_whitespace)
        .find(|d| !d.is_empty());
    if let Some(description) = description {
        parts.push(description);
    }

    let paragraphs = document
        .select(&PARAGRAPH)
        .filter(|p| !has_excluded_ancestor(*p, None))
        .map(|p| collect_visible(p).text)
        .filter(|text| {
            char_count(text) >= OPEN_GRAPH_PARAGRAPH_MIN_CHARS && !is_boilerplate_paragraph(text)
        })
        .filter(|text| !parts.contains(text))
        .take(OPEN_GRAPH_PARAGRAPHS)
        .collect::<Vec<_>>();
    parts.extend(paragraphs);

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n\n"))
    }
}
