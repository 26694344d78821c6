use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use robotstxt_rs::RobotsTxt;
use std::{fmt, sync::Arc};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

/// What the robots gate learned about an origin.
#[derive(Clone)]
pub enum RobotsDecision {
    Rules(Arc<RobotsTxt>),
    /// No usable robots.txt (missing or 4xx): everything is allowed.
    AllowAll,
}

impl fmt::Debug for RobotsDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rules(_) => f.write_str("Rules"),
            Self::AllowAll => f.write_str("AllowAll"),
        }
    }
}

/// Mutable record for one origin. Updated on every attempt against it.
#[derive(Debug, Clone)]
pub struct DomainPolicy {
    pub window_start: DateTime<Utc>,
    pub request_count: u32,
    pub robots: Option<RobotsDecision>,
    pub robots_checked_at: Option<DateTime<Utc>>,
    pub last_seen: DateTime<Utc>,
}

impl DomainPolicy {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            window_start: now,
            request_count: 0,
            robots: None,
            robots_checked_at: None,
            last_seen: now,
        }
    }
}

/// `scheme://host[:port]`, the key every policy record is stored under.
pub fn origin_key(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// Guarded map of origin -> policy. Cloning shares the same map.
///
/// All read-modify-write goes through [`DomainPolicies::update`], which holds
/// the shard lock for the closure; nothing awaits while holding it.
#[derive(Clone, Default)]
pub struct DomainPolicies {
    store: Arc<DashMap<String, DomainPolicy>>,
}

impl DomainPolicies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update<R>(
        &self,
        origin: &str,
        now: DateTime<Utc>,
        f: impl FnOnce(&mut DomainPolicy) -> R,
    ) -> R {
        let mut entry = self
            .store
            .entry(origin.to_string())
            .or_insert_with(|| DomainPolicy::new(now));
        let policy = entry.value_mut();
        policy.last_seen = now;
        f(policy)
    }

    pub fn get(&self, origin: &str) -> Option<DomainPolicy> {
        self.store.get(origin).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Evict origins not touched within `ttl`. Returns how many were removed.
    pub fn sweep_expired(&self, now: DateTime<Utc>, ttl: Duration) -> usize {
        let before = self.store.len();
        self.store
            .retain(|_, policy| now.signed_duration_since(policy.last_seen) < ttl);
        before.saturating_sub(self.store.len())
    }

    /// Periodic TTL sweep until `shutdown` is cancelled.
    pub fn spawn_sweeper(
        &self,
        every: std::time::Duration,
        ttl: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let policies = self.clone();
        tokio::spawn(async move {
            let mut ticker = interval(every);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        info!("policy sweeper stopping");
                        break;
                    }
                    _ = ticker.tick() => {
                        let evicted = policies.sweep_expired(Utc::now(), ttl);
                        if evicted > 0 {
                            debug!(evicted, remaining = policies.len(), "evicted idle domain policies");
                        }
                    }
                }
            }
        })
    }
}
