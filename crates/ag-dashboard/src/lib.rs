//! # ag-dashboard
//!
//! Snapshot store, request sequencing and derived views for the AgentGuard
//! dashboard.
//!
//! Data flows one way:
//!
//! ```text
//! ApiClient -> Completion -> AppState::apply -> LogStore
//!                                                  |
//!                    FilterState -> DashboardView (agents, tools, audit page)
//! ```
//!
//! - [`LogStore`] holds one immutable snapshot per resource, replaced
//!   wholesale. A failed load empties only that resource and leaves a
//!   [`LoadNotice`].
//! - [`RequestSequencer`] tags every request with a per-resource [`Ticket`];
//!   a response older than the last applied one is dropped.
//! - [`AppState`] owns the store, the shared [`ag_audit::FilterState`] and
//!   the sequencer for the lifetime of a session.
//! - [`DashboardView`] derives every panel from the same snapshot in one go.
//! - [`DashboardConfig`] is read from `.agentguard/dashboard.toml`.

pub mod config;
pub mod error;
pub mod refresh;
pub mod sequence;
pub mod state;
pub mod store;
pub mod view;

pub use config::{DashboardConfig, CONFIG_FILE};
pub use error::DashboardError;
pub use refresh::{fetch, refresh, refresh_all, spawn_fetch, Completion};
pub use sequence::{RequestSequencer, Resource, Ticket};
pub use state::AppState;
pub use store::{LoadNotice, LogStore, Payload, ResourceLoad};
pub use view::{drawer, AgentRow, DashboardView, Presets, ToolRow, DRAWER_LIMIT};
