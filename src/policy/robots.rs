//! robots.txt compliance, cached per origin in the shared policy store.
//!
//! Any failure to retrieve or parse robots.txt allows the request.

use chrono::{DateTime, Duration, Utc};
use reqwest::header;
use robotstxt_rs::RobotsTxt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::PolicyConfig;
use crate::policy::store::{DomainPolicies, RobotsDecision, origin_key};

/// Maximum size of robots.txt to fetch (512KB).
const MAX_ROBOTS_SIZE: usize = 512 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum RobotsError {
    #[error("failed to fetch robots.txt: {0}")]
    Fetch(String),

    #[error("robots.txt unavailable: status {0}")]
    Unavailable(reqwest::StatusCode),

    #[error("robots.txt too large")]
    TooLarge,
}

#[derive(Clone)]
pub struct RobotsGate {
    policies: DomainPolicies,
    http: reqwest::Client,
    user_agent: String,
    ttl: Duration,
    enabled: bool,
}

impl RobotsGate {
    pub fn new(policies: DomainPolicies, config: &PolicyConfig) -> Result<Self, RobotsError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.robots_timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| RobotsError::Fetch(e.to_string()))?;

        Ok(Self {
            policies,
            http,
            user_agent: config.robots_user_agent.clone(),
            ttl: Duration::seconds(config.robots_ttl_secs),
            enabled: config.respect_robots,
        })
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Check `url` against its origin's robots.txt, fetching it at most once
    /// per TTL.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn is_allowed(&self, url: &Url) -> bool {
        if !self.enabled {
            return true;
        }

        let origin = origin_key(url);
        let now = Utc::now();

        let decision = match self.cached_decision(&origin, now) {
            Some(decision) => decision,
            None => match self.fetch_robots(&origin).await {
                Ok(decision) => {
                    self.policies.update(&origin, Utc::now(), |policy| {
                        policy.robots = Some(decision.clone());
                        policy.robots_checked_at = Some(Utc::now());
                    });
                    decision
                }
                Err(e) => {
                    warn!(origin = %origin, error = %e, "robots.txt unavailable, allowing");
                    return true;
                }
            },
        };

        let allowed = match &decision {
            RobotsDecision::Rules(robots) => {
                robots.can_fetch(&self.user_agent, &robots_path(url))
            }
            RobotsDecision::AllowAll => true,
        };

        if !allowed {
            info!(path = url.path(), "disallowed by robots.txt");
        }
        allowed
    }

    fn cached_decision(&self, origin: &str, now: DateTime<Utc>) -> Option<RobotsDecision> {
        let policy = self.policies.get(origin)?;
        let checked_at = policy.robots_checked_at?;
        if now.signed_duration_since(checked_at) > self.ttl {
            return None;
        }
        debug!(origin, "robots.txt cache hit");
        policy.robots
    }

    async fn fetch_robots(&self, origin: &str) -> Result<RobotsDecision, RobotsError> {
        let robots_url = format!("{}/robots.txt", origin);
        let response = self
            .http
            .get(&robots_url)
            .header(header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| RobotsError::Fetch(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            debug!("robots.txt not found for {}, allowing all", origin);
            return Ok(RobotsDecision::AllowAll);
        }
        if !status.is_success() {
            return Err(RobotsError::Unavailable(status));
        }

        if let Some(len) = response.content_length()
            && len as usize > MAX_ROBOTS_SIZE
        {
            return Err(RobotsError::TooLarge);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RobotsError::Fetch(e.to_string()))?;

        if bytes.len() > MAX_ROBOTS_SIZE {
            return Err(RobotsError::TooLarge);
        }

        let content = String::from_utf8_lossy(&bytes);
        Ok(RobotsDecision::Rules(Arc::new(RobotsTxt::parse(&content))))
    }
}

/// Rules match against the path and query, never the scheme or host.
fn robots_path(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}
