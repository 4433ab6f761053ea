// error.rs - Error types for audit parsing and filter controls.

use thiserror::Error;

/// Errors that can occur while decoding audit data or parsing view controls.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The audit payload was not a JSON array of entries.
    #[error("malformed audit payload: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// A time range control value was not one of all/5m/1h/24h.
    #[error("invalid time range '{0}': expected one of all, 5m, 1h, 24h")]
    InvalidTimeRange(String),

    /// A decision control value was not one of all/allow/block.
    #[error("invalid decision filter '{0}': expected one of all, allow, block")]
    InvalidDecisionFilter(String),
}
