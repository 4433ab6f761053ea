// render.rs - Plain-text tables for the terminal.
//
// Every function here only formats; nothing fetches or mutates state.

use ag_audit::{relative_time, AgentDetail, AuditLogEntry, AuditPage, EmptyReason, OverviewStats};
use ag_dashboard::{AgentRow, DashboardView, LoadNotice, Presets, ToolRow};
use ag_policy::{Anomaly, Policy, SigHealth};
use chrono::{DateTime, Utc};
use serde::Serialize;

const RULE_WIDTH: usize = 96;

pub fn json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn notices(notices: &[&LoadNotice]) {
    for notice in notices {
        println!("! {}", notice);
    }
    if !notices.is_empty() {
        println!();
    }
}

pub fn dashboard(view: &DashboardView<'_>) {
    notices(&view.notices);
    stats(&view.stats);
    println!();

    if let Some(pill) = &view.pill {
        println!("Filter: {}", pill);
    }
    println!(
        "Range: {}  Decision: {}{}",
        view.filter.time_range(),
        view.filter.decision(),
        if view.filter.search_term().is_empty() {
            String::new()
        } else {
            format!("  Search: \"{}\"", view.filter.search_term())
        }
    );
    println!();

    println!("AGENTS");
    agents(&view.agents);
    println!();
    println!("TOOLS");
    tools(&view.tools);
    println!();
    println!("AUDIT LOG");
    audit(&view.audit, view.generated_at);
}

pub fn stats(stats: &OverviewStats) {
    println!(
        "Agents: {}   Requests: {}   Threats blocked: {}   Active policies: {}",
        stats.total_agents, stats.total_requests, stats.threats_blocked, stats.active_policies
    );
}

pub fn agents(rows: &[AgentRow]) {
    if rows.is_empty() {
        println!("No agents found.");
        return;
    }
    println!(
        "  {:<24} {:<8} {:<12} {:>6} {:>6}  ROLES",
        "AGENT", "STATUS", "LAST SEEN", "ALLOW", "BLOCK"
    );
    println!("{}", "-".repeat(RULE_WIDTH));
    for row in rows {
        println!(
            "{} {:<24} {:<8} {:<12} {:>6} {:>6}  {}",
            if row.selected { ">" } else { " " },
            cell(&row.agent_id, 24),
            row.status.label(),
            row.last_seen_label,
            row.allow_count,
            row.block_count,
            if row.roles.is_empty() {
                "-".to_string()
            } else {
                row.roles.join(",")
            },
        );
    }
}

pub fn tools(rows: &[ToolRow]) {
    if rows.is_empty() {
        println!("No tools registered.");
        return;
    }
    println!(
        "  {:<28} {:<10} {:>6}  {:<8} {:<13} DESCRIPTION",
        "TOOL", "VERSION", "CALLS", "SIG", "SIGNATURE"
    );
    println!("{}", "-".repeat(RULE_WIDTH));
    for row in rows {
        let tool = &row.summary;
        println!(
            "{} {:<28} {:<10} {:>6}  {:<8} {:<13} {}",
            if row.selected { ">" } else { " " },
            cell(&tool.id, 28),
            cell(tool.version_label(), 10),
            tool.call_count,
            match tool.sig_health {
                SigHealth::Ok => "ok",
                SigHealth::Missing => "missing",
            },
            tool.short_signature(),
            cell(tool.description_label(), 40),
        );
    }
}

pub fn audit(page: &AuditPage<'_>, now: DateTime<Utc>) {
    match page.empty {
        Some(EmptyReason::NoData) => {
            println!("No audit entries yet.");
            return;
        }
        Some(EmptyReason::FilteredOut) => {
            println!("No entries match the current filters.");
            return;
        }
        None => {}
    }

    audit_header();
    for entry in &page.rows {
        audit_row(entry, now);
    }
    println!();
    if page.has_more {
        println!(
            "Showing {} of {} matching entries. Use --pages to load more.",
            page.rows.len(),
            page.total_matched
        );
    } else {
        println!("{} matching entries.", page.total_matched);
    }
}

fn audit_header() {
    println!(
        "{:<12} {:<20} {:<26} {:<8} {:<10} REASON",
        "WHEN", "AGENT", "TOOL", "DECISION", "POLICY"
    );
    println!("{}", "-".repeat(RULE_WIDTH));
}

fn audit_row(entry: &AuditLogEntry, now: DateTime<Utc>) {
    println!(
        "{:<12} {:<20} {:<26} {:<8} {:<10} {}",
        relative_time(now, entry.timestamp()),
        cell(entry.agent().unwrap_or("-"), 20),
        cell(entry.tool().unwrap_or("-"), 26),
        entry.decision.as_str(),
        cell(entry.policy_version.as_deref().unwrap_or("-"), 10),
        entry.reason.as_deref().unwrap_or(""),
    );
}

pub fn drawer(detail: &AgentDetail<'_>, now: DateTime<Utc>) {
    println!("Agent:         {}", detail.agent_id);
    println!("Total calls:   {}", detail.total_calls);
    println!(
        "Last decision: {}",
        detail
            .last_decision
            .as_ref()
            .map_or("N/A", |d| d.as_str())
    );
    println!(
        "Last policy:   {}",
        detail.last_policy.as_deref().unwrap_or("N/A")
    );
    println!();
    if detail.recent.is_empty() {
        println!("No activity recorded for this agent.");
        return;
    }
    audit_header();
    for entry in &detail.recent {
        audit_row(entry, now);
    }
}

pub fn policies(list: &[&Policy]) {
    if list.is_empty() {
        println!("No policies found.");
        return;
    }
    println!(
        "{:<32} {:<10} {:<20} {:>5}",
        "NAME", "VERSION", "CREATED", "RULES"
    );
    println!("{}", "-".repeat(72));
    for policy in list {
        println!(
            "{:<32} {:<10} {:<20} {:>5}",
            cell(policy.display_name(), 32),
            cell(&policy.version_label(), 10),
            policy
                .created_at
                .as_deref()
                .and_then(ag_audit::parse_timestamp)
                .map_or_else(|| "N/A".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string()),
            policy.rule_count(),
        );
    }
}

pub fn policy(policy: &Policy) {
    println!("{} (version {})", policy.display_name(), policy.version_label());
    let rules = policy.typed_rules();
    if !rules.is_empty() {
        println!();
        for (i, rule) in rules.iter().enumerate() {
            println!("  {:>2}. {}", i + 1, rule.one_line());
        }
    }
    println!();
    println!("{}", policy.display_json());
}

pub fn anomalies(list: &[Anomaly]) {
    if list.is_empty() {
        println!("No anomalies detected.");
        return;
    }
    println!("{:<20} {:<20} DETAIL", "WHEN", "AGENT");
    println!("{}", "-".repeat(RULE_WIDTH));
    for anomaly in list {
        println!(
            "{:<20} {:<20} {}",
            anomaly.created_at.as_deref().unwrap_or("-"),
            cell(anomaly.agent_label(), 20),
            anomaly.detail_text(),
        );
    }
}

pub fn presets(presets: &Presets) {
    println!("AGENTS");
    for (agent, count) in &presets.agents {
        println!("  {:<28} {:>6}", agent, count);
    }
    println!("TOOLS");
    for (tool, count) in &presets.tools {
        println!("  {:<28} {:>6}", tool, count);
    }
}

/// Fit `s` into `width` columns, marking truncation with "...".
fn cell(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let keep = width.saturating_sub(3);
    format!("{}...", s.chars().take(keep).collect::<String>())
}
