// tools.rs - Tool registry panel with call counts from the audit log.

use ag_dashboard::Resource;
use chrono::Utc;

use super::Context;
use crate::render;

pub async fn execute(ctx: &Context, json: bool) -> anyhow::Result<()> {
    // Call counts come from the audit snapshot, not the registry.
    let state = ctx.load(&[Resource::Audit, Resource::Tools]).await;
    let view = state.view(Utc::now());

    if json {
        return render::json(&view.tools);
    }
    render::notices(&view.notices);
    render::tools(&view.tools);
    Ok(())
}
