use std::time::Duration;

use judex_store::StoreError;
use thiserror::Error;

/// A failed call to the summarisation service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited: {message}")]
    RateLimited {
        message: String,
        /// Wait suggested in the structured error details, if any.
        retry_after: Option<Duration>,
    },

    #[error("service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed service response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("service returned no candidate text")]
    NoCandidates,

    #[error("API key contains characters not allowed in a header")]
    InvalidApiKey,
}

impl ServiceError {
    /// Throttling is the only condition worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

/// Generated text that is not a usable summary.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("summary is not valid JSON: {source}")]
    UnparsableJson {
        #[source]
        source: serde_json::Error,
        raw: String,
    },

    #[error("summary JSON is not an array")]
    NotAnArray,
}

/// A failure that stops a whole enrichment run.
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
