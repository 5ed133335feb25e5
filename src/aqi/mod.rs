pub mod client;
pub mod fetch;
pub mod history;
pub mod mock;
pub mod names;
pub mod types;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AqiError {
    #[error("could not find air quality data for \"{city}\"")]
    NotFound {
        city: String,
        attempts: Vec<CandidateAttempt>,
    },
    #[error("network error: {0}")]
    Network(String),
    #[error("upstream error: {0}")]
    Upstream(String),
    #[error("JSON parsing failed: {0}")]
    JsonParsing(#[from] serde_json::Error),
    #[error("connectivity check failed: {0}")]
    ConnectivityCheckFailed(String),
}

/// Outcome of one failed lookup attempt during city resolution. Collected and
/// attached to [`AqiError::NotFound`] so failed resolutions stay debuggable
/// without digging through logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateAttempt {
    pub query: String,
    pub via: AttemptSource,
    pub error: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptSource {
    Station,
    SearchFallback,
}
