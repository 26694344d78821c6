pub mod config;
pub mod extractor;
pub mod fetcher;
pub mod orchestrator;
pub mod policy;

pub use config::Config;
pub use orchestrator::{
    Confidence, ExtractError, ExtractionResult, Method, Pipeline, SetupError, Status,
};
