//! Maps how the text was obtained, and how much of it there is, to a coarse
//! quality label.

use crate::config::Thresholds;
use crate::orchestrator::result::{Confidence, Method, Status};

pub fn score(method: Method, text_chars: usize, thresholds: &Thresholds) -> Confidence {
    match method {
        Method::DirectFetch | Method::DomainAdapter => {
            if text_chars > thresholds.high_confidence_chars {
                Confidence::High
            } else {
                Confidence::Medium
            }
        }
        Method::Amp | Method::Canonical => Confidence::Medium,
        Method::JsonLd | Method::OpenGraph | Method::Fallback | Method::RobotsRestricted => {
            Confidence::Low
        }
    }
}

/// `Full` needs a tier 1 or 2 method and better than low confidence. A
/// synthesized result after the initial fetch failed is an `Error`.
pub fn status(method: Method, confidence: Confidence, initial_fetch_failed: bool) -> Status {
    if method == Method::Fallback && initial_fetch_failed {
        return Status::Error;
    }
    if matches!(method.tier(), 1 | 2) && confidence != Confidence::Low {
        return Status::Full;
    }
    Status::Limited
}
