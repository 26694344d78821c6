use thiserror::Error;
use url::Url;

use crate::fetcher::FetchError;
use crate::policy::RobotsError;

/// The only failure the pipeline surfaces; everything past input validation
/// degrades into the result instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Error, Debug)]
pub enum SetupError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Robots(#[from] RobotsError),
}

/// Per-tier diagnostics, rendered into `ExtractionResult::errors`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TierError {
    #[error("robots.txt disallows {url}")]
    RobotsDisallowed { url: String },

    #[error("rate limited: request budget for {origin} exhausted")]
    RateLimited { origin: String },

    #[error("{source_name}: fetching {url} failed: {reason}")]
    Fetch {
        source_name: &'static str,
        url: String,
        reason: String,
    },

    #[error("{source_name}: insufficient content ({chars} of {threshold} chars)")]
    InsufficientContent {
        source_name: &'static str,
        chars: usize,
        threshold: usize,
    },

    #[error("{source_name}: {reason}")]
    Unavailable {
        source_name: &'static str,
        reason: &'static str,
    },

    #[error("extraction cancelled")]
    Cancelled,

    #[error("all extraction tiers exhausted")]
    AllTiersExhausted,
}

/// Accept only absolute http(s) URLs with a host.
pub fn parse_article_url(raw: &str) -> Result<Url, ExtractError> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed)
        .map_err(|e| ExtractError::InvalidInput(format!("'{}' is not a valid URL: {}", trimmed, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ExtractError::InvalidInput(format!(
            "unsupported scheme '{}'",
            url.scheme()
        )));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ExtractError::InvalidInput(format!("'{}' has no host", trimmed)));
    }
    Ok(url)
}
