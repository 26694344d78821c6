//! Site-specific extraction rules for publishers whose markup defeats the
//! generic paragraph scorer.
//!
//! Every adapter falls back to the generic extractor when its own pattern
//! comes up short, so an adapter can only ever add text.

use scraper::{Html, Selector};
use tracing::debug;

use crate::config::Thresholds;
use crate::extractor::model::char_count;
use crate::extractor::readable::{
    ReadableConfig, extract_from_document, join_paragraphs, score_paragraphs,
};

/// A per-site extraction strategy.
pub trait SiteAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    /// `domain` is a lowercase hostname without `www.`.
    fn matches(&self, domain: &str) -> bool;

    /// Text found by the site's own pattern, possibly empty.
    fn extract(&self, document: &Html, config: &ReadableConfig) -> String;
}

/// Adapter driven by CSS selectors: the first selector that yields scored
/// paragraphs wins.
pub struct SelectorAdapter {
    name: &'static str,
    domains: &'static [&'static str],
    paragraphs: Vec<Selector>,
}

impl SelectorAdapter {
    pub fn new(
        name: &'static str,
        domains: &'static [&'static str],
        paragraph_selectors: &[&str],
    ) -> Self {
        let paragraphs = paragraph_selectors
            .iter()
            .filter_map(|css| Selector::parse(css).ok())
            .collect();
        Self {
            name,
            domains,
            paragraphs,
        }
    }
}

impl SiteAdapter for SelectorAdapter {
    fn name(&self) -> &'static str {
        self.name
    }

    fn matches(&self, domain: &str) -> bool {
        self.domains.iter().any(|d| domain_matches(domain, d))
    }

    fn extract(&self, document: &Html, config: &ReadableConfig) -> String {
        let root = document.root_element();
        // Selected paragraphs are trusted: no container search, no minimum.
        let relaxed = ReadableConfig {
            paragraph_min_chars: config.paragraph_min_chars.min(20),
            ..*config
        };
        self.paragraphs
            .iter()
            .map(|selector| join_paragraphs(&score_paragraphs(root, Some(selector), &relaxed)))
            .find(|text| !text.is_empty())
            .unwrap_or_default()
    }
}

/// `domain` equals `suffix` or is a subdomain of it.
pub fn domain_matches(domain: &str, suffix: &str) -> bool {
    domain == suffix
        || domain
            .strip_suffix(suffix)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

fn builtin_adapters() -> Vec<Box<dyn SiteAdapter>> {
    vec![
        Box::new(SelectorAdapter::new(
            "nytimes",
            &["nytimes.com"],
            &["section[name='articleBody'] p", "p.css-at9mc1, p.evys1bk0"],
        )),
        Box::new(SelectorAdapter::new(
            "washingtonpost",
            &["washingtonpost.com"],
            &["[data-qa='article-body'] p", "p[data-el='text']"],
        )),
        Box::new(SelectorAdapter::new(
            "cnn",
            &["cnn.com"],
            &["p[data-component-name='paragraph']", ".article__content p.paragraph", ".zn-body__paragraph"],
        )),
        Box::new(SelectorAdapter::new(
            "bbc",
            &["bbc.com", "bbc.co.uk"],
            &["[data-component='text-block'] p", "article p"],
        )),
        Box::new(SelectorAdapter::new(
            "reuters",
            &["reuters.com"],
            &["[data-testid^='paragraph-']", "div[class*='article-body__content'] p"],
        )),
        Box::new(SelectorAdapter::new(
            "guardian",
            &["theguardian.com"],
            &["#maincontent .article-body-commercial-selector p", "div[data-gu-name='body'] p"],
        )),
        Box::new(SelectorAdapter::new(
            "wsj",
            &["wsj.com"],
            &["p[data-type='paragraph']", "section[subscriptions-section='content'] p"],
        )),
        Box::new(SelectorAdapter::new(
            "bloomberg",
            &["bloomberg.com"],
            &["div.body-content p", "[class*='body-copy'] p"],
        )),
        Box::new(SelectorAdapter::new(
            "medium",
            &["medium.com"],
            &["article section p.pw-post-body-paragraph", "article section p"],
        )),
    ]
}

/// Output of a domain-aware extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterOutput {
    pub text: String,
    /// Set when a site adapter's own pattern produced the text.
    pub adapter: Option<&'static str>,
}

/// Registry of `(predicate, extractor)` pairs with the generic extractor as
/// the default.
pub struct AdapterRegistry {
    adapters: Vec<Box<dyn SiteAdapter>>,
    readable: ReadableConfig,
    adapter_min_chars: usize,
}

impl AdapterRegistry {
    pub fn new(thresholds: &Thresholds) -> Self {
        Self {
            adapters: builtin_adapters(),
            readable: ReadableConfig::from(thresholds),
            adapter_min_chars: thresholds.adapter_min_chars,
        }
    }

    pub fn empty(thresholds: &Thresholds) -> Self {
        Self {
            adapters: Vec::new(),
            ..Self::new(thresholds)
        }
    }

    pub fn register<A: SiteAdapter + 'static>(&mut self, adapter: A) {
        self.adapters.push(Box::new(adapter));
    }

    pub fn registered_names(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    /// The extractor to use for `domain`: its adapter if one matches, else
    /// the generic one.
    pub fn adapter_for(&self, domain: &str) -> DomainExtractor<'_> {
        let domain = domain.trim_start_matches("www.").to_lowercase();
        let adapter = self
            .adapters
            .iter()
            .find(|a| a.matches(&domain))
            .map(|a| a.as_ref());
        DomainExtractor {
            adapter,
            readable: &self.readable,
            adapter_min_chars: self.adapter_min_chars,
        }
    }
}

pub struct DomainExtractor<'a> {
    adapter: Option<&'a dyn SiteAdapter>,
    readable: &'a ReadableConfig,
    adapter_min_chars: usize,
}

impl DomainExtractor<'_> {
    pub fn adapter_name(&self) -> Option<&'static str> {
        self.adapter.map(|a| a.name())
    }

    pub fn extract(&self, html: &str) -> AdapterOutput {
        let document = Html::parse_document(html);
        self.extract_document(&document)
    }

    /// The adapter's text wins only when it clears `adapter_min_chars` and is
    /// at least as long as the generic extraction.
    pub fn extract_document(&self, document: &Html) -> AdapterOutput {
        let generic = extract_from_document(document, self.readable);

        if let Some(adapter) = self.adapter {
            let text = adapter.extract(document, self.readable);
            let chars = char_count(&text);
            let generic_chars = char_count(&generic);
            if chars >= self.adapter_min_chars && chars >= generic_chars {
                return AdapterOutput {
                    text,
                    adapter: Some(adapter.name()),
                };
            }
            debug!(
                adapter = adapter.name(),
                chars, generic_chars, "adapter pattern came up short, using generic extractor"
            );
        }

        AdapterOutput {
            text: generic,
            adapter: None,
        }
    }
}
