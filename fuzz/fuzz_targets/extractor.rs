#![no_main]

use bytes::Bytes;
use chrono::Utc;
use libfuzzer_sys::fuzz_target;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use url::Url;

use readwell::config::Thresholds;
use readwell::extractor::{
    AdapterRegistry, extract_json_ld, extract_open_graph_content, extract_page, find_amp_url,
};
use readwell::fetcher::{Charset, PageResponse};

fuzz_target!(|data: &[u8]| {
    let html = String::from_utf8_lossy(data).to_string();
    let url = Url::parse("https://example.com/story").unwrap();

    let response = PageResponse {
        url_final: url.clone(),
        status: StatusCode::OK,
        headers: HeaderMap::new(),
        body_raw: Bytes::from(html.clone()),
        body_utf8: html,
        charset: Charset::Utf8,
        fetched_at: Utc::now(),
    };

    // None of the extractors may panic on arbitrary markup.
    let registry = AdapterRegistry::new(&Thresholds::default());
    let _ = extract_page(&response, &registry);
    let _ = find_amp_url(&response.body_utf8, &url);
    let _ = extract_json_ld(&response.body_utf8);
    let _ = extract_open_graph_content(&response.body_utf8);
});
