//! Configuration handling for the extraction pipeline.
//!
//! Every length threshold the tier orchestrator uses is tunable here rather
//! than hard coded. `Config::from_env` reads `READWELL_*` environment
//! variables and falls back to the defaults below when they are absent.

use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Environment variable names.
pub const ENV_FETCH_TIMEOUT_MS: &str = "READWELL_FETCH_TIMEOUT_MS";
pub const ENV_FETCH_MAX_RETRIES: &str = "READWELL_FETCH_MAX_RETRIES";
pub const ENV_FETCH_BACKOFF_BASE_MS: &str = "READWELL_FETCH_BACKOFF_BASE_MS";
pub const ENV_FETCH_MAX_REDIRECTS: &str = "READWELL_FETCH_MAX_REDIRECTS";
pub const ENV_RATE_LIMIT_MAX_REQUESTS: &str = "READWELL_RATE_LIMIT_MAX_REQUESTS";
pub const ENV_RATE_LIMIT_WINDOW_SECS: &str = "READWELL_RATE_LIMIT_WINDOW_SECS";
pub const ENV_ROBOTS_USER_AGENT: &str = "READWELL_ROBOTS_USER_AGENT";
pub const ENV_RESPECT_ROBOTS: &str = "READWELL_RESPECT_ROBOTS";
pub const ENV_DIRECT_MIN_CHARS: &str = "READWELL_DIRECT_MIN_CHARS";
pub const ENV_ALTERNATE_MIN_CHARS: &str = "READWELL_ALTERNATE_MIN_CHARS";
pub const ENV_OPEN_GRAPH_MIN_CHARS: &str = "READWELL_OPEN_GRAPH_MIN_CHARS";
pub const ENV_HIGH_CONFIDENCE_CHARS: &str = "READWELL_HIGH_CONFIDENCE_CHARS";

const DEFAULT_ROBOTS_USER_AGENT: &str = "ReadwellBot";

/// Outbound HTTP behaviour of the fetch client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Hard timeout for a single attempt, connect through body.
    pub timeout_ms: u64,
    /// Retries after the first attempt on transient failures.
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub max_redirects: usize,
    pub max_body_bytes: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 15_000,
            max_retries: 2,
            backoff_base_ms: 500,
            max_redirects: 5,
            max_body_bytes: 5 * 1024 * 1024,
        }
    }
}

/// Per-origin politeness: rate limiting and robots.txt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyConfig {
    pub max_requests_per_window: u32,
    pub window_secs: i64,
    pub robots_ttl_secs: i64,
    pub robots_timeout_ms: u64,
    /// Token matched against `User-agent:` lines in robots.txt.
    pub robots_user_agent: String,
    pub respect_robots: bool,
    /// Idle time after which a whole origin record is evicted.
    pub policy_ttl_secs: i64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_requests_per_window: 5,
            window_secs: 60,
            robots_ttl_secs: 24 * 60 * 60,
            robots_timeout_ms: 5_000,
            robots_user_agent: DEFAULT_ROBOTS_USER_AGENT.to_string(),
            respect_robots: true,
            policy_ttl_secs: 60 * 60,
        }
    }
}

/// Length bars (in characters) that drive tier advancement and scoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thresholds {
    pub direct_min_chars: usize,
    pub alternate_min_chars: usize,
    pub open_graph_min_chars: usize,
    pub high_confidence_chars: usize,
    pub container_min_chars: usize,
    pub paragraph_min_chars: usize,
    pub joined_min_chars: usize,
    pub adapter_min_chars: usize,
    pub max_amp_probes: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            direct_min_chars: 1_200,
            alternate_min_chars: 1_000,
            open_graph_min_chars: 100,
            high_confidence_chars: 1_500,
            container_min_chars: 500,
            paragraph_min_chars: 30,
            joined_min_chars: 400,
            adapter_min_chars: 500,
            max_amp_probes: 2,
        }
    }
}

/// Pipeline runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub fetch: FetchConfig,
    pub policy: PolicyConfig,
    pub thresholds: Thresholds,
}

impl Config {
    /// Load from environment variables, falling back to defaults.
    ///
    /// Fails only when a variable is present but does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::default();

        cfg.fetch.timeout_ms = env_or(ENV_FETCH_TIMEOUT_MS, cfg.fetch.timeout_ms)?;
        cfg.fetch.max_retries = env_or(ENV_FETCH_MAX_RETRIES, cfg.fetch.max_retries)?;
        cfg.fetch.backoff_base_ms = env_or(ENV_FETCH_BACKOFF_BASE_MS, cfg.fetch.backoff_base_ms)?;
        cfg.fetch.max_redirects = env_or(ENV_FETCH_MAX_REDIRECTS, cfg.fetch.max_redirects)?;

        cfg.policy.max_requests_per_window =
            env_or(ENV_RATE_LIMIT_MAX_REQUESTS, cfg.policy.max_requests_per_window)?;
        cfg.policy.window_secs = env_or(ENV_RATE_LIMIT_WINDOW_SECS, cfg.policy.window_secs)?;
        cfg.policy.robots_user_agent =
            env_or(ENV_ROBOTS_USER_AGENT, cfg.policy.robots_user_agent.clone())?;
        cfg.policy.respect_robots = env_or(ENV_RESPECT_ROBOTS, cfg.policy.respect_robots)?;

        let t = &mut cfg.thresholds;
        t.direct_min_chars = env_or(ENV_DIRECT_MIN_CHARS, t.direct_min_chars)?;
        t.alternate_min_chars = env_or(ENV_ALTERNATE_MIN_CHARS, t.alternate_min_chars)?;
        t.open_graph_min_chars = env_or(ENV_OPEN_GRAPH_MIN_CHARS, t.open_graph_min_chars)?;
        t.high_confidence_chars = env_or(ENV_HIGH_CONFIDENCE_CHARS, t.high_confidence_chars)?;

        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: ENV_FETCH_TIMEOUT_MS,
                reason: "timeout must be greater than zero".to_string(),
            });
        }
        if self.policy.window_secs <= 0 {
            return Err(ConfigError::InvalidValue {
                field: ENV_RATE_LIMIT_WINDOW_SECS,
                reason: "window must be a positive number of seconds".to_string(),
            });
        }
        Ok(())
    }
}

fn env_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            field: key,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Errors that can occur while building a configuration.
#[derive(Debug)]
pub enum ConfigError {
    InvalidValue { field: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl Error for ConfigError {}
