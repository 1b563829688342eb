//! Error types shared by both jobs

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClaBotError>;

/// Errors that can occur while running a CLA job
#[derive(Debug, Error)]
pub enum ClaBotError {
    /// Request could not be sent or its body could not be read
    #[error("HTTP request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// Endpoint answered with a non-success status
    #[error("API error from {endpoint} ({status}): {body}")]
    Api {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// Search page without a usable `items` array
    #[error("Malformed search response on page {page}: {source}")]
    MalformedSearchResponse {
        page: u32,
        #[source]
        source: serde_json::Error,
    },

    /// Sheet row with no first cell
    #[error("Sheet row {row} has no first cell")]
    MalformedRow { row: usize },

    /// Service-account key unusable or token exchange refused
    #[error("Credentials error: {0}")]
    Credentials(String),

    /// Repository slug is not `owner/repo`
    #[error("Invalid repository format: {0}. Expected: owner/repo")]
    InvalidRepository(String),

    /// A self-check case produced the wrong result
    #[error("Self-check failed: {0}")]
    SelfCheck(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ClaBotError {
    /// Whether the error came from talking to an HTTP endpoint
    pub fn is_http(&self) -> bool {
        matches!(self, ClaBotError::Http { .. } | ClaBotError::Api { .. })
    }
}
