// refresh_cycle.rs - AppState through overlapping refreshes and filter changes.

use std::time::Duration;

use ag_audit::{AuditLogEntry, DecisionFilter, EmptyReason, FilterPipeline, TimeRange, ToolNamespace};
use ag_client::ApiClient;
use ag_dashboard::{refresh, AppState, Completion, Payload, Resource, ResourceLoad};
use ag_policy::{Anomaly, ToolRecord};
use chrono::{DateTime, TimeZone, Utc};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

fn entry(agent: &str, tool: &str, decision: &str, minutes_ago: i64) -> AuditLogEntry {
    let ts = now() - chrono::Duration::minutes(minutes_ago);
    AuditLogEntry::new(agent, tool, decision)
        .with_created_at(ts.format("%Y-%m-%dT%H:%M:%S").to_string())
}

fn snapshot(n: usize) -> Vec<AuditLogEntry> {
    (0..n)
        .map(|i| {
            let decision = if i % 3 == 0 { "BLOCK" } else { "ALLOW" };
            entry(&format!("agent-{}", i % 4), "mcp:search", decision, i as i64)
        })
        .collect()
}

#[test]
fn overlapping_refreshes_keep_the_newest_snapshot() {
    let mut state = AppState::default();

    // Periodic refresh and an operator refresh in flight together.
    let periodic = state.begin(Resource::Audit);
    let manual = state.begin(Resource::Audit);

    // The newer one lands first; the older one must not clobber it.
    assert!(state.apply(Completion::loaded(manual, Payload::Audit(snapshot(7))), now()));
    assert!(!state.apply(Completion::loaded(periodic, Payload::Audit(snapshot(3))), now()));

    let view = state.view(now());
    assert_eq!(view.stats.total_requests, 7);
    let counted: u64 = view.agents.iter().map(|a| a.allow_count + a.block_count).sum();
    assert_eq!(counted, 7);
}

#[test]
fn one_failed_resource_leaves_other_panels_intact() {
    let mut state = AppState::default();
    let audit = state.begin(Resource::Audit);
    let tools = state.begin(Resource::Tools);
    let anomalies = state.begin(Resource::Anomalies);

    state.apply(Completion::loaded(audit, Payload::Audit(snapshot(5))), now());
    state.apply(
        Completion::loaded(tools, Payload::Tools(vec![ToolRecord::new("mcp:search")])),
        now(),
    );
    state.apply(Completion::failed(anomalies, "backend returned 500: HTTP 500"), now());

    let view = state.view(now());
    assert_eq!(view.audit.rows.len(), 5);
    assert_eq!(view.tools[0].summary.call_count, 5);
    assert_eq!(view.notices.len(), 1);
    assert_eq!(view.notices[0].resource, Resource::Anomalies);
    assert!(state.store().anomalies().is_empty());

    // Recovery on the next cycle clears the notice.
    let retry = state.begin(Resource::Anomalies);
    state.apply(
        Completion::loaded(retry, Payload::Anomalies(vec![Anomaly::default()])),
        now(),
    );
    assert!(state.view(now()).notices.is_empty());
}

#[test]
fn filter_changes_rebuild_every_panel_and_reset_paging() {
    let pipeline = FilterPipeline::new(10, ToolNamespace::default());
    let mut state = AppState::new(pipeline);
    let ticket = state.begin(Resource::Audit);
    state.apply(Completion::loaded(ticket, Payload::Audit(snapshot(25))), now());

    let view = state.view(now());
    assert_eq!(view.audit.rows.len(), 10);
    assert!(view.audit.has_more);

    state.load_more();
    state.load_more();
    let view = state.view(now());
    assert_eq!(view.audit.rows.len(), 25);
    assert!(!view.audit.has_more);

    state.filter_mut().set_agent("agent-1");
    assert_eq!(state.filter().page_offset(), 0);
    let view = state.view(now());
    assert!(view.audit.rows.iter().all(|e| e.agent() == Some("agent-1")));
    assert!(view.agents.iter().any(|a| a.agent_id == "agent-1" && a.selected));
    assert_eq!(view.pill.as_deref(), Some("Agent: agent-1"));

    // Tool selection replaces the agent selection.
    state.filter_mut().set_tool("search");
    let view = state.view(now());
    assert!(view.agents.iter().all(|a| !a.selected));
    assert!(view.tools.is_empty());
    assert_eq!(view.audit.total_matched, 25);

    state.filter_mut().set_decision(DecisionFilter::Block);
    state.filter_mut().set_time_range(TimeRange::FiveMinutes);
    let view = state.view(now());
    // minutes_ago 0 and 3 are BLOCK and inside the window.
    assert_eq!(view.audit.total_matched, 2);

    state.filter_mut().clear_entity();
    assert_eq!(state.filter().decision(), DecisionFilter::Block);
    assert!(state.view(now()).pill.is_none());
}

#[test]
fn filtered_out_is_distinct_from_no_data() {
    let mut state = AppState::default();
    assert_eq!(state.view(now()).audit.empty, Some(EmptyReason::NoData));

    let ticket = state.begin(Resource::Audit);
    state.apply(Completion::loaded(ticket, Payload::Audit(snapshot(4))), now());
    state.filter_mut().set_search("no-such-agent");
    assert_eq!(state.view(now()).audit.empty, Some(EmptyReason::FilteredOut));
}

#[test]
fn same_filter_twice_gives_identical_output() {
    let mut state = AppState::default();
    let ticket = state.begin(Resource::Audit);
    state.apply(Completion::loaded(ticket, Payload::Audit(snapshot(12))), now());
    state.filter_mut().set_decision(DecisionFilter::Allow);

    let first: Vec<_> = state.view(now()).audit.rows.into_iter().cloned().collect();
    let second: Vec<_> = state.view(now()).audit.rows.into_iter().cloned().collect();
    assert_eq!(first, second);
}

#[test]
fn slow_backend_still_redraws_every_tick() {
    let mut state = AppState::default();
    let mut in_flight: Vec<Completion> = Vec::new();
    let mut redraws = 0;

    for tick in 0..20 {
        if state.take_redraw(true) {
            redraws += 1;
        }
        // Last tick's responses land only after this tick's requests went out.
        let tickets: Vec<_> = Resource::ALL.iter().map(|r| state.begin(*r)).collect();
        for completion in in_flight.drain(..) {
            state.apply(completion, now());
            if state.take_redraw(false) {
                redraws += 1;
            }
        }
        in_flight = tickets
            .into_iter()
            .map(|ticket| {
                let payload = match ticket.resource {
                    Resource::Audit => Payload::Audit(snapshot(tick + 1)),
                    Resource::Tools => Payload::Tools(vec![]),
                    Resource::Policies => Payload::Policies(vec![]),
                    Resource::Anomalies => Payload::Anomalies(vec![]),
                };
                Completion::loaded(ticket, payload)
            })
            .collect();
    }

    // Never settled, yet every tick after the first had something new to show.
    assert!(!state.settled());
    assert_eq!(redraws, 18);
    assert_eq!(state.store().audit().len(), 19);
}

#[tokio::test]
async fn unreachable_backend_yields_notices_not_errors() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ApiClient::new(&format!("http://{}", addr), Duration::from_secs(2)).unwrap();
    let mut state = AppState::default();
    let applied = refresh(&client, &mut state, &Resource::ALL).await;

    assert_eq!(applied, 4);
    assert_eq!(state.store().notices().len(), 4);
    assert!(matches!(
        state.store().load_state(Resource::Audit),
        ResourceLoad::Failed { .. }
    ));
    assert_eq!(state.view(now()).audit.empty, Some(EmptyReason::NoData));
}
