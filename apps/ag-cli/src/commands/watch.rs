// watch.rs - Auto-refreshing overview.
//
// Each tick fetches every resource on its own task; completions come back
// over a channel in whatever order the backend answers and go through
// AppState::apply, which drops anything superseded by a newer tick. The
// screen is redrawn when every resource has settled, or at the next tick
// if fresh data arrived but newer requests are still outstanding.

use std::time::Duration;

use ag_dashboard::{spawn_fetch, AppState, Resource};
use chrono::Utc;
use tokio::sync::mpsc;

use super::overview::{show, ViewArgs};
use super::Context;

pub async fn execute(ctx: &Context, args: &ViewArgs, interval: Option<u64>) -> anyhow::Result<()> {
    let period = interval
        .map(Duration::from_secs)
        .unwrap_or_else(|| ctx.config.refresh_interval());
    if period.is_zero() {
        anyhow::bail!("--interval must be at least 1 second");
    }

    let mut state = ctx.new_state();
    args.apply(&mut state);

    let (tx, mut rx) = mpsc::channel(Resource::ALL.len() * 4);
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    tracing::info!(period_secs = period.as_secs(), "watching {}", ctx.client.base_url());

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if state.take_redraw(true) {
                    draw(&state, args.json)?;
                }
                for resource in Resource::ALL {
                    let ticket = state.begin(resource);
                    spawn_fetch(ctx.client.clone(), ticket, tx.clone());
                }
            }
            Some(completion) = rx.recv() => {
                state.apply(completion, Utc::now());
                if state.take_redraw(false) {
                    draw(&state, args.json)?;
                }
            }
            _ = &mut shutdown => {
                tracing::info!("stopping watch");
                break;
            }
        }
    }

    Ok(())
}

fn draw(state: &AppState, json: bool) -> anyhow::Result<()> {
    if !json {
        println!("\n=== {} ===", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));
    }
    show(state, json)
}
