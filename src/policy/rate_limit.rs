use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::config::PolicyConfig;
use crate::policy::store::DomainPolicies;

/// Fixed-window request counter per origin.
///
/// Denial is not an error: the orchestrator skips network-bound tiers instead.
#[derive(Clone)]
pub struct RateLimiter {
    policies: DomainPolicies,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(policies: DomainPolicies, max_requests: u32, window_seconds: i64) -> Self {
        Self {
            policies,
            max_requests,
            window: Duration::seconds(window_seconds),
        }
    }

    pub fn from_config(policies: DomainPolicies, config: &PolicyConfig) -> Self {
        Self::new(policies, config.max_requests_per_window, config.window_secs)
    }

    pub fn try_acquire(&self, origin: &str) -> bool {
        self.try_acquire_at(origin, Utc::now())
    }

    pub fn try_acquire_at(&self, origin: &str, now: DateTime<Utc>) -> bool {
        let granted = self.policies.update(origin, now, |data| {
            // Check if we need to reset the window
            if now.signed_duration_since(data.window_start) >= self.window {
                data.request_count = 0;
                data.window_start = now;
            }

            if data.request_count >= self.max_requests {
                return false;
            }
            data.request_count += 1;
            true
        });

        if !granted {
            debug!(origin, max = self.max_requests, "rate limit window exhausted");
        }
        granted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_max_per_window() {
        let limiter = RateLimiter::new(DomainPolicies::new(), 3, 60);
        let now = Utc::now();
        assert!(limiter.try_acquire_at("https://a.example", now));
        assert!(limiter.try_acquire_at("https://a.example", now));
        assert!(limiter.try_acquire_at("https://a.example", now));
        assert!(!limiter.try_acquire_at("https://a.example", now));
    }

    #[test]
    fn origins_are_counted_independently() {
        let limiter = RateLimiter::new(DomainPolicies::new(), 1, 60);
        let now = Utc::now();
        assert!(limiter.try_acquire_at("https://a.example", now));
        assert!(!limiter.try_acquire_at("https://a.example", now));
        assert!(limiter.try_acquire_at("https://b.example", now));
    }

    #[test]
    fn window_resets_after_expiry() {
        let limiter = RateLimiter::new(DomainPolicies::new(), 1, 60);
        let start = Utc::now();
        assert!(limiter.try_acquire_at("https://a.example", start));
        assert!(!limiter.try_acquire_at("https://a.example", start + Duration::seconds(59)));
        assert!(limiter.try_acquire_at("https://a.example", start + Duration::seconds(60)));
    }

    #[test]
    fn zero_budget_always_denies() {
        let limiter = RateLimiter::new(DomainPolicies::new(), 0, 60);
        assert!(!limiter.try_acquire("https://a.example"));
    }

    #[test]
    fn concurrent_acquires_never_exceed_budget() {
        let limiter = RateLimiter::new(DomainPolicies::new(), 50, 60);
        let now = Utc::now();
        let granted: usize = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let limiter = limiter.clone();
                    s.spawn(move || {
                        (0..20)
                            .filter(|_| limiter.try_acquire_at("https://busy.example", now))
                            .count()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });
        assert_eq!(granted, 50);
    }
}
