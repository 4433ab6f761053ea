// anomalies.rs - Detector output, shown as delivered.

use ag_dashboard::Resource;

use super::Context;
use crate::render;

pub async fn execute(ctx: &Context, json: bool) -> anyhow::Result<()> {
    let state = ctx.load(&[Resource::Anomalies]).await;
    let anomalies = state.store().anomalies();

    if json {
        return render::json(anomalies);
    }
    render::notices(&state.store().notices());
    render::anomalies(anomalies);
    Ok(())
}
