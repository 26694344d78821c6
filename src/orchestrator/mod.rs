//! Tier orchestrator: the public entry point of the pipeline.
//!
//! An extraction walks `Direct -> Alternate -> OpenGraph -> Terminal`,
//! stopping at the first tier whose output clears that tier's length bar.
//! Nothing past input validation is an error to the caller; failures are
//! recorded in `ExtractionResult::errors` and reflected in its status.

pub mod confidence;
pub mod errors;
pub mod result;
pub mod tiers;

pub use errors::{ExtractError, SetupError, TierError, parse_article_url};
pub use result::{Confidence, ExtractionResult, Method, Status, read_time_minutes};
pub use tiers::Tier;

use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::Config;
use crate::extractor::language::detect_language;
use crate::extractor::metadata::site_from_url;
use crate::extractor::model::char_count;
use crate::extractor::{
    AdapterRegistry, Metadata, amp_variants, extract_json_ld, extract_open_graph_content,
    extract_page, find_amp_url, find_canonical_url, quality,
};
use crate::fetcher::{FetchClient, FetchError, PageFetcher};
use crate::policy::{DomainPolicies, RateLimiter, RobotsGate, origin_key};

/// How the request for the target URL itself went.
#[derive(Debug)]
enum Initial {
    Pending,
    Fetched,
    RateLimited,
    Failed(FetchError),
}

/// Working state of one extraction.
struct Run<'a> {
    url: Url,
    origin: String,
    cancel: &'a CancellationToken,
    initial: Initial,
    final_url: Option<Url>,
    html: Option<String>,
    metadata: Option<Metadata>,
    errors: Vec<TierError>,
}

impl<'a> Run<'a> {
    fn new(url: Url, cancel: &'a CancellationToken) -> Self {
        Self {
            origin: origin_key(&url),
            url,
            cancel,
            initial: Initial::Pending,
            final_url: None,
            html: None,
            metadata: None,
            errors: Vec::new(),
        }
    }

    /// Secondary fetches are pointless when the origin is unreachable or
    /// over budget.
    fn may_probe(&self) -> bool {
        match &self.initial {
            Initial::Fetched => true,
            Initial::Failed(err) => !err.is_network() && !matches!(err, FetchError::Cancelled),
            Initial::Pending | Initial::RateLimited => false,
        }
    }

    fn is_same_page(&self, candidate: &Url) -> bool {
        same_document(candidate, &self.url)
            || self
                .final_url
                .as_ref()
                .is_some_and(|f| same_document(candidate, f))
    }

    fn failed(&self) -> bool {
        matches!(self.initial, Initial::Failed(_)) || self.cancel.is_cancelled()
    }

    fn failure_cause(&self) -> String {
        if self.cancel.is_cancelled() {
            return "the extraction was cancelled".to_string();
        }
        match &self.initial {
            Initial::RateLimited => {
                "the request budget for this site is exhausted, try again later".to_string()
            }
            Initial::Failed(err) if err.is_timeout() => {
                "the site did not respond in time".to_string()
            }
            Initial::Failed(err) if err.is_network() => {
                "the site could not be reached".to_string()
            }
            Initial::Failed(FetchError::Http { status, .. }) => match status.as_u16() {
                code @ (401 | 402 | 403) => format!(
                    "access was denied (HTTP {}), likely a paywall or bot protection",
                    code
                ),
                code @ (404 | 410) => format!("the page was not found (HTTP {})", code),
                429 => "the site is throttling requests (HTTP 429)".to_string(),
                code if code >= 500 => format!("the site returned a server error (HTTP {})", code),
                code => format!("the site answered with HTTP {}", code),
            },
            Initial::Failed(err) => format!("the page could not be retrieved ({})", err),
            Initial::Fetched | Initial::Pending => {
                "the page appears to be paywalled or rendered client-side".to_string()
            }
        }
    }
}

/// A tier's accepted output.
struct Outcome {
    method: Method,
    text: String,
    /// Page the text came from when it was not the target itself.
    source: Option<Url>,
}

fn same_document(a: &Url, b: &Url) -> bool {
    let mut a = a.clone();
    let mut b = b.clone();
    a.set_fragment(None);
    b.set_fragment(None);
    a == b
}

/// Shared, concurrency-safe extraction pipeline. One instance serves any
/// number of concurrent `extract` calls; per-origin state lives in the
/// policy store it owns.
pub struct Pipeline {
    fetcher: Arc<dyn PageFetcher>,
    robots: RobotsGate,
    limiter: RateLimiter,
    policies: DomainPolicies,
    adapters: AdapterRegistry,
    config: Config,
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self, SetupError> {
        let fetcher = FetchClient::new(config.fetch.clone())?;
        Self::with_fetcher(config, Arc::new(fetcher))
    }

    /// Build around any fetcher, e.g. a mock in tests.
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn PageFetcher>) -> Result<Self, SetupError> {
        let policies = DomainPolicies::new();
        let robots = RobotsGate::new(policies.clone(), &config.policy)?;
        let limiter = RateLimiter::from_config(policies.clone(), &config.policy);
        let adapters = AdapterRegistry::new(&config.thresholds);

        Ok(Self {
            fetcher,
            robots,
            limiter,
            policies,
            adapters,
            config,
        })
    }

    pub fn with_adapters(mut self, adapters: AdapterRegistry) -> Self {
        self.adapters = adapters;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn policies(&self) -> &DomainPolicies {
        &self.policies
    }

    /// Evict idle origins every `every` until `shutdown` fires.
    pub fn spawn_policy_sweeper(
        &self,
        every: std::time::Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let ttl = chrono::Duration::seconds(self.config.policy.policy_ttl_secs);
        self.policies.spawn_sweeper(every, ttl, shutdown)
    }

    pub async fn extract(&self, url: &str) -> Result<ExtractionResult, ExtractError> {
        self.extract_with_cancel(url, &CancellationToken::new()).await
    }

    /// Like [`Pipeline::extract`], abandoning in-flight fetches once `cancel`
    /// fires. A cancelled extraction still yields a result.
    #[instrument(skip(self, cancel))]
    pub async fn extract_with_cancel(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<ExtractionResult, ExtractError> {
        let url = parse_article_url(url)?;
        let mut run = Run::new(url, cancel);
        let mut tier = Tier::Direct;

        match self.robots_allows(&run.url, cancel).await {
            Some(true) => {}
            Some(false) => {
                info!(url = %run.url, "robots.txt disallows target, skipping fetch");
                run.errors.push(TierError::RobotsDisallowed {
                    url: run.url.to_string(),
                });
                let text = format!(
                    "Extraction skipped: robots.txt for {} disallows this page.",
                    site_from_url(&run.url)
                );
                let outcome = Outcome {
                    method: Method::RobotsRestricted,
                    text,
                    source: None,
                };
                return Ok(self.finish(run, outcome));
            }
            None => {
                run.errors.push(TierError::Cancelled);
                tier = Tier::Terminal;
            }
        }

        let outcome = loop {
            if tier != Tier::Terminal && cancel.is_cancelled() {
                run.errors.push(TierError::Cancelled);
                tier = Tier::Terminal;
            }

            let accepted = match tier {
                Tier::Direct => self.direct(&mut run).await,
                Tier::Alternate => self.alternate(&mut run).await,
                Tier::OpenGraph => self.open_graph(&mut run),
                Tier::Terminal => break self.terminal(&mut run),
            };
            if let Some(outcome) = accepted {
                break outcome;
            }

            tier = tier.next();
            debug!(?tier, "advancing to next tier");
        };

        Ok(self.finish(run, outcome))
    }

    /// `None` when `cancel` fires before the robots decision is known.
    async fn robots_allows(&self, url: &Url, cancel: &CancellationToken) -> Option<bool> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            allowed = self.robots.is_allowed(url) => Some(allowed),
        }
    }

    async fn direct(&self, run: &mut Run<'_>) -> Option<Outcome> {
        if !self.limiter.try_acquire(&run.origin) {
            warn!(origin = %run.origin, "rate limited, skipping network tiers");
            run.errors.push(TierError::RateLimited {
                origin: run.origin.clone(),
            });
            run.initial = Initial::RateLimited;
            return None;
        }

        match self.fetcher.fetch(&run.url, run.cancel).await {
            Ok(page) => {
                let extraction = extract_page(&page, &self.adapters);
                let method = match extraction.adapter {
                    Some(_) => Method::DomainAdapter,
                    None => Method::DirectFetch,
                };
                run.metadata = Some(extraction.metadata);
                run.final_url = Some(page.url_final);
                run.html = Some(page.body_utf8);
                run.initial = Initial::Fetched;
                self.accept(run, Tier::Direct, method, extraction.text, None)
            }
            Err(err) => {
                run.errors.push(TierError::Fetch {
                    source_name: Method::DirectFetch.as_str(),
                    url: run.url.to_string(),
                    reason: err.to_string(),
                });
                run.initial = Initial::Failed(err);
                None
            }
        }
    }

    /// AMP, then canonical, then JSON-LD. All discovery runs against the
    /// page fetched by the direct tier.
    async fn alternate(&self, run: &mut Run<'_>) -> Option<Outcome> {
        let base = run.final_url.clone().unwrap_or_else(|| run.url.clone());
        let html = run.html.as_deref();
        let declared_amp = html.and_then(|h| find_amp_url(h, &base));
        let canonical = html.and_then(|h| find_canonical_url(h, &base));
        let json_ld = html.and_then(extract_json_ld);

        if run.may_probe() {
            let amp_candidates: Vec<Url> = match declared_amp {
                Some(declared) => vec![declared],
                None => amp_variants(&base),
            }
            .into_iter()
            .filter(|candidate| !run.is_same_page(candidate))
            .take(self.config.thresholds.max_amp_probes)
            .collect();

            for candidate in amp_candidates {
                if let Some(outcome) = self.probe(run, candidate, Method::Amp).await {
                    return Some(outcome);
                }
                if run.cancel.is_cancelled() {
                    return None;
                }
            }

            if let Some(canonical) = canonical
                && !run.is_same_page(&canonical)
                && let Some(outcome) = self.probe(run, canonical, Method::Canonical).await
            {
                return Some(outcome);
            }
        }

        match json_ld {
            Some(body) => self.accept(run, Tier::Alternate, Method::JsonLd, body, None),
            None => {
                if run.html.is_some() {
                    run.errors.push(TierError::Unavailable {
                        source_name: Method::JsonLd.as_str(),
                        reason: "no article body in structured data",
                    });
                }
                None
            }
        }
    }

    /// Fetch a discovered variant under the same robots and rate-limit
    /// rules as the target.
    async fn probe(&self, run: &mut Run<'_>, url: Url, method: Method) -> Option<Outcome> {
        // Cancellation is recorded once the tier loop notices it.
        let allowed = self.robots_allows(&url, run.cancel).await?;
        if !allowed {
            run.errors.push(TierError::RobotsDisallowed {
                url: url.to_string(),
            });
            return None;
        }

        let origin = origin_key(&url);
        if !self.limiter.try_acquire(&origin) {
            run.errors.push(TierError::RateLimited { origin });
            return None;
        }

        match self.fetcher.fetch(&url, run.cancel).await {
            Ok(page) => {
                let extraction = extract_page(&page, &self.adapters);
                if run.metadata.is_none() {
                    run.metadata = Some(extraction.metadata);
                }
                self.accept(
                    run,
                    Tier::Alternate,
                    method,
                    extraction.text,
                    Some(page.url_final),
                )
            }
            Err(err) => {
                debug!(url = %url, error = %err, method = method.as_str(), "alternate source failed");
                run.errors.push(TierError::Fetch {
                    source_name: method.as_str(),
                    url: url.to_string(),
                    reason: err.to_string(),
                });
                None
            }
        }
    }

    fn open_graph(&self, run: &mut Run<'_>) -> Option<Outcome> {
        let content = run.html.as_deref().map(extract_open_graph_content)?;
        match content {
            Some(text) => self.accept(run, Tier::OpenGraph, Method::OpenGraph, text, None),
            None => {
                run.errors.push(TierError::Unavailable {
                    source_name: Method::OpenGraph.as_str(),
                    reason: "no description or visible paragraphs",
                });
                None
            }
        }
    }

    fn terminal(&self, run: &mut Run<'_>) -> Outcome {
        run.errors.push(TierError::AllTiersExhausted);
        let site = site_from_url(&run.url);
        let cause = run.failure_cause();
        warn!(%site, %cause, "all extraction tiers exhausted");

        Outcome {
            method: Method::Fallback,
            text: format!("Could not extract readable content from {}: {}.", site, cause),
            source: None,
        }
    }

    fn accept(
        &self,
        run: &mut Run<'_>,
        tier: Tier,
        method: Method,
        text: String,
        source: Option<Url>,
    ) -> Option<Outcome> {
        let threshold = tier.min_chars(&self.config.thresholds);
        let chars = char_count(&text);

        if quality::clears_bar(&text, threshold) {
            info!(method = method.as_str(), chars, "tier produced content");
            return Some(Outcome {
                method,
                text,
                source,
            });
        }

        debug!(method = method.as_str(), chars, threshold, "tier output rejected");
        let rejection = if chars < threshold {
            TierError::InsufficientContent {
                source_name: method.as_str(),
                chars,
                threshold,
            }
        } else {
            TierError::Unavailable {
                source_name: method.as_str(),
                reason: "content is mostly boilerplate",
            }
        };
        run.errors.push(rejection);
        None
    }

    fn finish(&self, run: Run<'_>, outcome: Outcome) -> ExtractionResult {
        let chars = char_count(&outcome.text);
        let confidence = confidence::score(outcome.method, chars, &self.config.thresholds);
        let status = confidence::status(outcome.method, confidence, run.failed());
        let language = if outcome.method.is_content() {
            detect_language(&outcome.text)
        } else {
            None
        };
        let read_time = read_time_minutes(&outcome.text);
        let metadata = run
            .metadata
            .unwrap_or_else(|| Metadata::for_url(&run.url));
        let final_url = outcome.source.or(run.final_url).map(|u| u.to_string());

        info!(
            url = %run.url,
            status = ?status,
            method = outcome.method.as_str(),
            confidence = ?confidence,
            chars,
            "extraction finished"
        );

        ExtractionResult {
            status,
            url: run.url.to_string(),
            final_url,
            site: metadata.site,
            site_name: metadata.site_name,
            title: metadata.title,
            byline: metadata.byline,
            description: metadata.description,
            published_at: metadata.published_at,
            text: outcome.text,
            read_time_minutes: read_time,
            method: outcome.method,
            confidence,
            language,
            errors: run.errors.iter().map(ToString::to_string).collect(),
            extracted_at: Utc::now(),
        }
    }
}
