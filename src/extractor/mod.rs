pub mod adapters;
pub mod alternate;
pub mod cleaner;
pub mod language;
pub mod metadata;
pub mod model;
pub mod quality;
pub mod readable;

#[cfg(test)]
mod tests;

pub use adapters::{AdapterOutput, AdapterRegistry, DomainExtractor, SelectorAdapter, SiteAdapter};
pub use alternate::{
    amp_variants, extract_json_ld, extract_open_graph_content, find_amp_url, find_canonical_url,
};
pub use metadata::{Metadata, extract_metadata};
pub use readable::{CandidateParagraph, ReadableConfig, extract_readable_text};

use scraper::Html;

use crate::fetcher::types::PageResponse;

/// Everything the direct tier learns from one fetched page.
#[derive(Debug, Clone)]
pub struct PageExtraction {
    pub metadata: Metadata,
    pub text: String,
    pub adapter: Option<&'static str>,
}

/// Parse a fetched page once and run metadata plus domain-aware extraction.
pub fn extract_page(resp: &PageResponse, registry: &AdapterRegistry) -> PageExtraction {
    let document = Html::parse_document(&resp.body_utf8);
    let metadata = metadata::extract_metadata_from(&document, &resp.url_final);
    let output = registry.adapter_for(&metadata.site).extract_document(&document);

    PageExtraction {
        metadata,
        text: output.text,
        adapter: output.adapter,
    }
}
