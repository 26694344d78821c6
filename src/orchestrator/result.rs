use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::extractor::model::word_count;

const WORDS_PER_MINUTE: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Full,
    Limited,
    Error,
}

/// Ordered: `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Which strategy produced the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    DirectFetch,
    DomainAdapter,
    Amp,
    Canonical,
    JsonLd,
    OpenGraph,
    Fallback,
    RobotsRestricted,
}

impl Method {
    /// Tier the method belongs to; 0 means no tier ran.
    pub fn tier(self) -> u8 {
        match self {
            Self::RobotsRestricted => 0,
            Self::DirectFetch | Self::DomainAdapter => 1,
            Self::Amp | Self::Canonical | Self::JsonLd => 2,
            Self::OpenGraph => 3,
            Self::Fallback => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DirectFetch => "direct_fetch",
            Self::DomainAdapter => "domain_adapter",
            Self::Amp => "amp",
            Self::Canonical => "canonical",
            Self::JsonLd => "json_ld",
            Self::OpenGraph => "open_graph",
            Self::Fallback => "fallback",
            Self::RobotsRestricted => "robots_restricted",
        }
    }

    /// Whether the text came from the article rather than being synthesized.
    pub fn is_content(self) -> bool {
        !matches!(self, Self::Fallback | Self::RobotsRestricted)
    }
}

/// Final record of one extraction. Built once by the pipeline and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub status: Status,
    pub url: String,
    pub final_url: Option<String>,
    pub site: String,
    pub site_name: Option<String>,
    pub title: String,
    pub byline: Option<String>,
    pub description: Option<String>,
    pub published_at: Option<String>,
    /// Never empty.
    pub text: String,
    pub read_time_minutes: u32,
    pub method: Method,
    pub confidence: Confidence,
    pub language: Option<String>,
    pub errors: Vec<String>,
    pub extracted_at: DateTime<Utc>,
}

/// Whole minutes at 200 words per minute, never less than one.
pub fn read_time_minutes(text: &str) -> u32 {
    let words = word_count(text);
    words.div_ceil(WORDS_PER_MINUTE).max(1) as u32
}
