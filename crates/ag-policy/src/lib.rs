//! # ag-policy
//!
//! Policy, tool registry and enforcement payload types for the AgentGuard
//! dashboard.
//!
//! The backend owns policies, tools and anomalies; the dashboard only reads
//! them and posts new documents. The types here are deliberately tolerant:
//! a policy's `rules` may arrive as an array or as a JSON-encoded string,
//! and every optional field may be absent. Coercion failures surface as a
//! visible placeholder, never as an error that blocks rendering.
//!
//! ## Key components
//!
//! - [`Policy`] / [`Rules`] - policy documents and rule coercion
//! - [`ToolRecord`] / [`ToolSummary`] - registry entries and their derived
//!   call counts and [`SigHealth`]
//! - [`Anomaly`] - detector output, displayed as-is
//! - [`EnforceRequest`] / [`EnforceResponse`] - simulated enforcement calls
//! - [`parse_policy_document`] - validate operator JSON before it is sent

pub mod anomaly;
pub mod enforce;
pub mod error;
pub mod policy;
pub mod tool;

pub use anomaly::Anomaly;
pub use enforce::{
    new_request_id, split_roles, EnforceRequest, EnforceResponse, GenerateRequest,
    SimulationForm, DEFAULT_TOOL_VERSION, DEMO_AGENT,
};
pub use error::PolicyError;
pub use policy::{parse_policy_document, Policy, Rule, Rules};
pub use tool::{SigHealth, ToolRecord, ToolSummary};
