pub mod backoff;
pub mod client;
pub mod errors;
pub mod pipeline;
pub mod types;
pub mod user_agent;

pub use client::{FetchClient, PageFetcher};
pub use errors::FetchError;
pub use types::{Charset, FetchAttempt, PageResponse};
