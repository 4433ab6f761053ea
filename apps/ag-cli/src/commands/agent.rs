// agent.rs - Agent drawer: totals and the newest entries for one agent.

use ag_dashboard::Resource;
use chrono::Utc;

use super::Context;
use crate::render;

pub async fn execute(ctx: &Context, agent_id: &str, json: bool) -> anyhow::Result<()> {
    let state = ctx.load(&[Resource::Audit]).await;
    let detail = state.agent_detail(agent_id);

    if json {
        return render::json(&detail);
    }
    render::notices(&state.store().notices());
    render::drawer(&detail, Utc::now());
    Ok(())
}
