//! # ag-client
//!
//! HTTP client for the AgentGuard enforcement backend.
//!
//! The backend exposes `/audit`, `/tools`, `/policies`, `/anomalies`,
//! `/enforce` and `/generate_policy`. Every call is a single best-effort
//! request:
//!
//! - the request never completes: [`ClientError::Transport`]
//! - the backend answers with a failure: [`Reply::Failed`] carrying a
//!   [`BackendFailure`] with the raw body, never an error
//! - the backend answers normally: [`Reply::Ok`] with the decoded body

pub mod client;
pub mod error;
pub mod reply;

pub use client::{ApiClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use error::ClientError;
pub use reply::{BackendFailure, PolicyCreated, Reply};
