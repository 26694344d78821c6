//! Per-origin politeness state shared by every extraction in the process.

pub mod rate_limit;
pub mod robots;
pub mod store;

pub use rate_limit::RateLimiter;
pub use robots::{RobotsError, RobotsGate};
pub use store::{DomainPolicies, DomainPolicy, RobotsDecision, origin_key};
