// presets.rs - Most active agents and tools, for filling in `simulate`.

use ag_dashboard::Resource;

use super::Context;
use crate::render;

pub async fn execute(ctx: &Context, json: bool) -> anyhow::Result<()> {
    let state = ctx.load(&[Resource::Audit]).await;
    let presets = state.presets();

    if json {
        return render::json(&presets);
    }
    render::notices(&state.store().notices());
    if presets.agents.is_empty() && presets.tools.is_empty() {
        println!("No audit activity to build presets from.");
        return Ok(());
    }
    render::presets(&presets);
    Ok(())
}
