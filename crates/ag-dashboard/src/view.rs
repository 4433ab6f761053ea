// view.rs - Everything a renderer draws, derived from one snapshot.
//
// The agent panel, tool panel and audit table are always rebuilt together
// from the same LogStore and FilterState, so they can never disagree about
// which entity is selected or which data is current.

use ag_audit::{
    agent_detail, aggregate, relative_time, search_agents, sort_by_last_seen, top_agents,
    top_tools, AgentDetail, AgentStatus, AuditLogEntry, AuditPage, FilterPipeline, FilterState,
    OverviewStats,
};
use ag_policy::ToolSummary;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::store::{LoadNotice, LogStore};

/// Entries shown in the agent drawer.
pub const DRAWER_LIMIT: usize = 10;
/// Agent presets offered by the simulator.
pub const PRESET_AGENTS: usize = 6;
/// Tool presets offered by the simulator.
pub const PRESET_TOOLS: usize = 8;

/// One agent panel row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentRow {
    pub agent_id: String,
    pub status: AgentStatus,
    pub last_seen: Option<DateTime<Utc>>,
    /// "5m ago", "Never", ...
    pub last_seen_label: String,
    pub allow_count: u64,
    pub block_count: u64,
    pub roles: Vec<String>,
    /// This agent is the active agent filter.
    pub selected: bool,
}

/// One tool panel row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolRow {
    #[serde(flatten)]
    pub summary: ToolSummary,
    /// This tool (under either spelling) is the active tool filter.
    pub selected: bool,
}

/// All panels for one render.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView<'a> {
    pub generated_at: DateTime<Utc>,
    pub stats: OverviewStats,
    /// Sorted by last seen, newest first, narrowed by the agent panel search.
    pub agents: Vec<AgentRow>,
    /// Registry order.
    pub tools: Vec<ToolRow>,
    pub audit: AuditPage<'a>,
    pub filter: &'a FilterState,
    pub pill: Option<String>,
    pub notices: Vec<&'a LoadNotice>,
}

impl<'a> DashboardView<'a> {
    pub fn build(
        store: &'a LogStore,
        filter: &'a FilterState,
        pipeline: &FilterPipeline,
        agent_search: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let entries = store.audit();
        let mut agg = aggregate(entries);
        sort_by_last_seen(&mut agg.agents);

        let selected_agent = filter.agent_id();
        let agents = search_agents(&agg.agents, agent_search)
            .into_iter()
            .map(|summary| AgentRow {
                agent_id: summary.agent_id.clone(),
                status: summary.status(now),
                last_seen: summary.last_seen,
                last_seen_label: relative_time(now, summary.last_seen),
                allow_count: summary.allow_count,
                block_count: summary.block_count,
                roles: summary.roles.iter().cloned().collect(),
                selected: selected_agent == Some(summary.agent_id.as_str()),
            })
            .collect();

        let namespace = pipeline.namespace();
        let selected_tool = filter.tool_id();
        let tools = ToolSummary::summarize(store.tools(), &agg.tool_usage, namespace)
            .into_iter()
            .map(|summary| {
                let selected = selected_tool.is_some_and(|t| namespace.same_tool(t, &summary.id));
                ToolRow { summary, selected }
            })
            .collect();

        Self {
            generated_at: now,
            stats: OverviewStats::compute(entries, store.policies().len()),
            agents,
            tools,
            audit: pipeline.run(entries, filter, now),
            filter,
            pill: filter.pill(),
            notices: store.notices(),
        }
    }
}

/// Agent drawer: totals plus the newest entries for one agent.
pub fn drawer<'a>(entries: &'a [AuditLogEntry], agent_id: &str) -> AgentDetail<'a> {
    agent_detail(entries, agent_id, DRAWER_LIMIT)
}

/// Quick-fill choices for the simulator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Presets {
    pub agents: Vec<(String, u64)>,
    pub tools: Vec<(String, u64)>,
}

impl Presets {
    pub fn from_entries(entries: &[AuditLogEntry]) -> Self {
        Self {
            agents: top_agents(entries, PRESET_AGENTS),
            tools: top_tools(entries, PRESET_TOOLS),
        }
    }
}
