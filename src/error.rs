//! Error taxonomy for calls against the LPR backend.
//!
//! ERROR HANDLING
//! ==============
//! Three failure shapes reach callers: the request never completed
//! (`Request`), the backend answered with a non-success status (`Status`,
//! or `Unauthorized` for an expired token), or the body could not be decoded
//! (`Parse`). The polling path logs and skips all of them; operator actions
//! turn them into a `Notice`.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No bearer token was configured.
    #[error("missing API token; pass --token or set LPR_API_TOKEN")]
    MissingToken,

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The base URL does not parse or cannot carry path segments.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// Network or connectivity failure.
    #[error("request failed: {0}")]
    Request(String),

    /// The backend rejected the bearer token.
    #[error("session expired or not authorized (status {status}); log in again")]
    Unauthorized { status: u16 },

    /// The backend returned a non-success status.
    #[error("backend returned status {status}")]
    Status { status: u16, body: String },

    /// The response body was missing or malformed.
    #[error("response parse failed: {0}")]
    Parse(String),

    /// The operation was refused before any request was sent.
    #[error("{0}")]
    Rejected(String),
}

impl ApiError {
    /// Whether the next poll has a reasonable chance of succeeding.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Status { status: 429 | 500..=599, .. })
    }

    /// Map an HTTP status + body into the matching error variant.
    #[must_use]
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => Self::Unauthorized { status },
            _ => Self::Status { status, body },
        }
    }
}
