// error.rs - Error types for policy and enforcement payloads.

use thiserror::Error;

/// Errors raised while validating operator input before it is sent.
///
/// None of these reach the backend: a payload that fails validation is
/// never submitted.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// Operator-supplied text is not valid JSON.
    #[error("invalid JSON in {field}: {source}")]
    InvalidJson {
        field: &'static str,
        source: serde_json::Error,
    },

    /// A policy document must be a JSON object (or a bare rules array).
    #[error("policy document must be a JSON object, got {0}")]
    NotADocument(&'static str),

    /// A required simulator field was left empty.
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    /// A policy-rules string could not be decoded into a rule sequence.
    #[error("policy rules are not a JSON array: {0}")]
    MalformedRules(String),
}
