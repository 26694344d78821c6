use crate::config::FetchConfig;
use crate::fetcher::{
    backoff::calculate_backoff_delay,
    errors::FetchError,
    pipeline::process_response,
    types::{FetchAttempt, PageResponse},
    user_agent::random_desktop_user_agent,
};
use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};
use url::Url;

/// Seam between the tier orchestrator and the network.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// GET `url` with retries, resolving to the decoded HTML page.
    async fn fetch(&self, url: &Url, cancel: &CancellationToken)
    -> Result<PageResponse, FetchError>;
}

/// HTTP client that looks like a desktop browser and retries transient
/// failures with jittered exponential backoff.
#[derive(Clone)]
pub struct FetchClient {
    client: Client,
    config: FetchConfig,
}

impl FetchClient {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = ClientBuilder::new()
            .connect_timeout(Duration::from_millis(config.timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn attempt_for(&self, url: &Url, attempt_number: u32) -> FetchAttempt {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_static(random_desktop_user_agent()),
        );
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.9"),
        );
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        FetchAttempt {
            url: url.clone(),
            headers,
            timeout_ms: self.config.timeout_ms,
            attempt_number,
        }
    }

    /// A single GET. The per-request timeout covers connect, headers and body.
    async fn send(&self, attempt: &FetchAttempt) -> Result<PageResponse, FetchError> {
        let response = self
            .client
            .get(attempt.url.clone())
            .headers(attempt.headers.clone())
            .timeout(Duration::from_millis(attempt.timeout_ms))
            .send()
            .await
            .map_err(FetchError::from_reqwest_error)?;

        // Check content length before downloading
        if let Some(content_length) = response.content_length()
            && content_length > self.config.max_body_bytes
        {
            return Err(FetchError::BodyTooLarge(content_length));
        }

        let final_url = response.url().clone();
        let status = response.status();
        let headers = response.headers().clone();

        if !status.is_success() {
            return Err(FetchError::Http {
                status,
                retriable: status.is_server_error(),
            });
        }

        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .unwrap_or("text/html")
            .to_string();

        if !content_type.contains("text/html") && !content_type.contains("application/xhtml") {
            return Err(FetchError::UnsupportedContentType(content_type));
        }

        let body_bytes = response
            .bytes()
            .await
            .map_err(FetchError::from_reqwest_error)?;

        // Check body size after download (in case Content-Length was missing)
        if body_bytes.len() as u64 > self.config.max_body_bytes {
            return Err(FetchError::BodyTooLarge(body_bytes.len() as u64));
        }

        Ok(process_response(
            final_url,
            status,
            headers,
            body_bytes,
            &content_type,
        ))
    }
}

#[async_trait]
impl PageFetcher for FetchClient {
    #[instrument(skip_all, fields(url = %url))]
    async fn fetch(
        &self,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<PageResponse, FetchError> {
        let mut attempt_number = 0;

        loop {
            let attempt = self.attempt_for(url, attempt_number);

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                result = self.send(&attempt) => result,
            };

            let err = match result {
                Ok(page) => {
                    debug!(
                        attempt = attempt.attempt_number,
                        status = %page.status,
                        charset = ?page.charset,
                        bytes = page.body_raw.len(),
                        "fetched page"
                    );
                    return Ok(page);
                }
                Err(err) => err,
            };

            if !err.should_retry() || attempt_number >= self.config.max_retries {
                warn!(attempt = attempt.attempt_number, error = %err, "fetch failed");
                return Err(err);
            }

            let delay = calculate_backoff_delay(attempt_number, self.config.backoff_base_ms);
            debug!(
                attempt = attempt.attempt_number,
                error = %err,
                delay_ms = delay.as_millis() as u64,
                "transient fetch failure, backing off"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }

            attempt_number += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempt_carries_browser_headers() {
        let config = FetchConfig {
            timeout_ms: 7_500,
            ..FetchConfig::default()
        };
        let client = FetchClient::new(config).unwrap();
        let url = Url::parse("https://example.com/story").unwrap();
        let attempt = client.attempt_for(&url, 1);

        assert_eq!(attempt.attempt_number, 1);
        assert_eq!(client.config().timeout_ms, 7_500);
        assert_eq!(attempt.timeout_ms, client.config().timeout_ms);
        assert_eq!(attempt.headers[header::CACHE_CONTROL], "no-cache");
        assert!(attempt.headers.contains_key(header::ACCEPT_LANGUAGE));
        assert!(
            attempt.headers[header::USER_AGENT]
                .to_str()
                .unwrap()
                .starts_with("Mozilla/5.0")
        );
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let client = FetchClient::new(FetchConfig::default()).unwrap();
        let url = Url::parse("http://127.0.0.1:9/never").unwrap();
        let token = CancellationToken::new();
        token.cancel();

        let result = client.fetch(&url, &token).await;
        assert!(matches!(result, Err(FetchError::Cancelled)));
    }
}
