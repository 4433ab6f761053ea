// error.rs - Error types for the backend API client.
//
// Only failures where no usable reply exists end up here. A backend that
// answers with an error status is not an error at this layer; see
// `Reply::Failed`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response (refused, timed out, reset).
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        source: reqwest::Error,
    },

    /// A successful reply whose body is not the expected JSON shape.
    #[error("unexpected response from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },

    /// The configured backend URL cannot be parsed.
    #[error("invalid backend URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// The underlying HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}
