// overview.rs - One-shot dashboard: stats, agents, tools and the audit table.

use ag_audit::{DecisionFilter, TimeRange};
use ag_dashboard::AppState;
use chrono::Utc;
use clap::Args;

use super::Context;
use crate::render;

/// View controls shared by `overview` and `watch`.
#[derive(Args, Debug, Clone, Default)]
pub struct ViewArgs {
    /// Show only this agent's entries.
    #[arg(long, conflicts_with = "tool")]
    pub agent: Option<String>,

    /// Show only this tool's entries (with or without the namespace prefix).
    #[arg(long)]
    pub tool: Option<String>,

    /// Show only entries carrying this role. Combines with --agent/--tool.
    #[arg(long)]
    pub role: Option<String>,

    /// Time range: all, 5m, 1h, 24h.
    #[arg(long, default_value = "all")]
    pub range: TimeRange,

    /// Decision: all, allow, block (block includes DENY).
    #[arg(long, default_value = "all")]
    pub decision: DecisionFilter,

    /// Case-insensitive search over agent, tool and reason.
    #[arg(long)]
    pub search: Option<String>,

    /// Narrow the agent panel by agent id.
    #[arg(long)]
    pub agent_search: Option<String>,

    /// Number of audit pages to show.
    #[arg(long, default_value = "1")]
    pub pages: usize,

    /// Print JSON instead of tables.
    #[arg(long)]
    pub json: bool,
}

impl ViewArgs {
    /// Apply these controls to the shared filter. Paging comes last since
    /// every other mutation resets it.
    pub fn apply(&self, state: &mut AppState) {
        let filter = state.filter_mut();
        if let Some(agent) = &self.agent {
            filter.set_agent(agent.clone());
        }
        if let Some(tool) = &self.tool {
            filter.set_tool(tool.clone());
        }
        filter.set_role(self.role.clone());
        filter.set_time_range(self.range);
        filter.set_decision(self.decision);
        filter.set_search(self.search.clone().unwrap_or_default());

        state.set_agent_search(self.agent_search.clone().unwrap_or_default());
        for _ in 1..self.pages.max(1) {
            state.load_more();
        }
    }
}

pub async fn execute(ctx: &Context, args: &ViewArgs) -> anyhow::Result<()> {
    let mut state = ctx.load_all().await;
    args.apply(&mut state);
    show(&state, args.json)
}

pub(crate) fn show(state: &AppState, json: bool) -> anyhow::Result<()> {
    let view = state.view(Utc::now());
    if json {
        render::json(&view)
    } else {
        render::dashboard(&view);
        Ok(())
    }
}
