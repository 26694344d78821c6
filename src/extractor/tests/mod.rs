use bytes::Bytes;
use chrono::Utc;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use std::fs;
use url::Url;

use crate::config::Thresholds;
use crate::extractor::model::char_count;
use crate::extractor::{
    AdapterRegistry, extract_json_ld, extract_open_graph_content, extract_page,
    extract_readable_text, find_amp_url, find_canonical_url,
};
use crate::fetcher::types::{Charset, PageResponse};

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("src/extractor/tests/fixtures/{}", name))
        .expect("Failed to read test fixture")
}

fn create_test_response(html: String, url: &str) -> PageResponse {
    PageResponse {
        url_final: Url::parse(url).unwrap(),
        status: StatusCode::OK,
        headers: HeaderMap::new(),
        body_raw: Bytes::from(html.clone()),
        body_utf8: html,
        charset: Charset::Utf8,
        fetched_at: Utc::now(),
    }
}

#[test]
fn test_extract_article() {
    let response = create_test_response(
        fixture("article.html"),
        "https://www.valleyledger.example/news/flood-plan",
    );
    let registry = AdapterRegistry::new(&Thresholds::default());
    let page = extract_page(&response, &registry);

    assert_eq!(page.metadata.title, "River Town Approves $40 Million Flood Plan");
    assert_eq!(page.metadata.byline.as_deref(), Some("Priya Raman"));
    assert_eq!(page.metadata.site, "valleyledger.example");
    assert_eq!(page.metadata.site_name.as_deref(), Some("The Valley Ledger"));
    assert_eq!(
        page.metadata.published_at.as_deref(),
        Some("2024-05-14T09:30:00+00:00")
    );
    assert_eq!(page.adapter, None);

    assert!(page.text.starts_with("After three years of public hearings"));
    assert!(page.text.contains("Council member Dana Ortiz"));
    assert!(page.text.ends_with("each phase of construction."));
    assert!(!page.text.contains("Advertisement"));
    assert!(!page.text.contains("morning newsletter"));
    assert!(!page.text.contains("A short history"));
    assert!(!page.text.contains("Bridge repairs"));
    assert!(!page.text.contains("first to comment"));
    assert!(!page.text.contains("All rights reserved"));
    assert!(!page.text.contains("dataLayer"));
    assert!(char_count(&page.text) > 1_500);
    assert_eq!(page.text.split("\n\n").count(), 7);
}

#[test]
fn test_alternate_links_on_article() {
    let html = fixture("article.html");
    let base = Url::parse("https://www.valleyledger.example/news/flood-plan?utm_source=x").unwrap();

    assert_eq!(
        find_amp_url(&html, &base).unwrap().as_str(),
        "https://www.valleyledger.example/news/flood-plan/amp"
    );
    assert_eq!(
        find_canonical_url(&html, &base).unwrap().as_str(),
        "https://www.valleyledger.example/news/flood-plan"
    );
}

#[test]
fn test_paywalled_page_has_json_ld_body() {
    let html = fixture("paywall.html");

    let visible = extract_readable_text(&html);
    assert!(char_count(&visible) < 300);
    assert!(!visible.contains("Subscribe"));

    let body = extract_json_ld(&html).unwrap();
    assert!(body.starts_with("Three of the largest chip makers"));
    assert!(char_count(&body) > 1_000);
}

#[test]
fn test_og_only_page() {
    let html = fixture("og_only.html");

    assert_eq!(extract_readable_text(&html), "");
    let og = extract_open_graph_content(&html).unwrap();
    assert!(og.starts_with("A winter storm closed the coastal highway"));
    assert!(char_count(&og) < 300);
}

#[test]
fn test_malformed_html() {
    let html = "<html><head><title>Broken</title><body><p>Unclosed tags<div>More content";
    let response = create_test_response(html.to_string(), "https://example.com/broken");
    let page = extract_page(&response, &AdapterRegistry::new(&Thresholds::default()));

    assert_eq!(page.metadata.title, "Broken");
    assert!(page.text.contains("Unclosed tags"));
    assert!(page.text.contains("More content"));
}

#[cfg(feature = "fuzz")]
mod fuzz {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_extract_never_panics(
            html in ".*",
            url in "https://[a-z]+\\.com/.*"
        ) {
            let response = create_test_response(html, &url);
            let _ = extract_page(&response, &AdapterRegistry::new(&Thresholds::default()));
        }

        #[test]
        fn test_readable_text_is_deterministic(html in ".*") {
            let first = extract_readable_text(&html);
            prop_assert_eq!(first, extract_readable_text(&html));
        }
    }
}
