//! # ag-audit
//!
//! Audit log model, aggregation and filtering for the AgentGuard dashboard.
//!
//! The enforcement backend records one [`AuditLogEntry`] per enforcement
//! check. This crate turns a raw, unordered list of those entries into the
//! derived views the dashboard shows:
//!
//! - [`aggregate`] - per-agent [`AgentSummary`] rows and per-tool call counts
//!   in one linear pass.
//! - [`AgentStatus`] / [`relative_time`] - online/idle/offline classification
//!   and "5m ago" labels relative to a caller-supplied `now`.
//! - [`FilterState`] - the operator's single shared view selection.
//! - [`FilterPipeline`] - applies a `FilterState` to a snapshot and returns
//!   an ordered, paginated [`AuditPage`].
//!
//! Everything here is synchronous and free of I/O. Callers pass `now`
//! explicitly so results are reproducible in tests.
//!
//! ## Quick Example
//!
//! ```rust
//! use ag_audit::{aggregate, AuditLogEntry, FilterPipeline, FilterState};
//! use chrono::Utc;
//!
//! let entries = vec![
//!     AuditLogEntry::new("agent-1", "search", "ALLOW").with_created_at("2024-05-01T12:00:00"),
//!     AuditLogEntry::new("agent-1", "mcp:search", "DENY").with_created_at("2024-05-01T12:05:00"),
//! ];
//!
//! let agg = aggregate(&entries);
//! assert_eq!(agg.agents[0].allow_count, 1);
//! assert_eq!(agg.agents[0].block_count, 1);
//!
//! let mut filter = FilterState::default();
//! filter.set_tool("search");
//! let page = FilterPipeline::default().run(&entries, &filter, Utc::now());
//! assert_eq!(page.total_matched, 2);
//! ```

pub mod aggregate;
pub mod entry;
pub mod error;
pub mod filter;
pub mod namespace;
pub mod pipeline;
pub mod status;

pub use aggregate::{
    agent_detail, aggregate, search_agents, sort_by_last_seen, top_agents, top_tools,
    AgentDetail, AgentSummary, Aggregate, OverviewStats, ToolUsage,
};
pub use entry::{parse_timestamp, AuditLogEntry, Decision, RoleList};
pub use error::AuditError;
pub use filter::{DecisionFilter, EntitySelection, FilterState, TimeRange};
pub use namespace::{ToolNamespace, DEFAULT_TOOL_PREFIX};
pub use pipeline::{AuditPage, EmptyReason, FilterPipeline, DEFAULT_PAGE_SIZE};
pub use status::{relative_time, AgentStatus};
