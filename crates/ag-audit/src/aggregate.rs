// aggregate.rs - Per-agent and per-tool views derived from a snapshot.
//
// Everything here is rebuilt from scratch for every snapshot; nothing is
// patched incrementally. `aggregate` makes one linear pass over the entries.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entry::{AuditLogEntry, Decision};
use crate::namespace::ToolNamespace;
use crate::pipeline::sort_newest_first;
use crate::status::AgentStatus;

/// Activity of one agent across the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentSummary {
    pub agent_id: String,
    /// Latest created_at among the agent's entries, by timestamp order.
    pub last_seen: Option<DateTime<Utc>>,
    pub allow_count: u64,
    /// BLOCK, DENY and anything else that is not ALLOW.
    pub block_count: u64,
    pub roles: BTreeSet<String>,
}

impl AgentSummary {
    fn new(agent_id: &str) -> Self {
        Self {
            agent_id: agent_id.to_string(),
            last_seen: None,
            allow_count: 0,
            block_count: 0,
            roles: BTreeSet::new(),
        }
    }

    pub fn total(&self) -> u64 {
        self.allow_count + self.block_count
    }

    pub fn status(&self, now: DateTime<Utc>) -> AgentStatus {
        AgentStatus::classify(now, self.last_seen)
    }
}

/// Call counts keyed by the tool_id exactly as recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ToolUsage {
    counts: HashMap<String, u64>,
}

impl ToolUsage {
    /// Calls recorded under exactly this id.
    pub fn calls(&self, tool_id: &str) -> u64 {
        self.counts.get(tool_id).copied().unwrap_or(0)
    }

    /// Calls recorded under either spelling of the tool (bare or prefixed).
    pub fn calls_for(&self, tool_id: &str, namespace: &ToolNamespace) -> u64 {
        let bare = namespace.strip(tool_id);
        if namespace.prefix().is_empty() {
            return self.calls(bare);
        }
        self.calls(bare) + self.calls(&namespace.qualify(bare))
    }

    /// Sum over all tools.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Output of one aggregation pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Aggregate {
    /// One row per agent, in order of first appearance.
    pub agents: Vec<AgentSummary>,
    pub tool_usage: ToolUsage,
}

/// Build agent summaries and tool call counts in one pass.
///
/// Entries without an agent_id still count toward tool usage. last_seen is
/// resolved by comparing parsed timestamps, so arrival order never matters;
/// an unparseable created_at never replaces a parseable one.
pub fn aggregate(entries: &[AuditLogEntry]) -> Aggregate {
    let mut agents: Vec<AgentSummary> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut tool_usage = ToolUsage::default();

    for entry in entries {
        if let Some(tool) = entry.tool() {
            *tool_usage.counts.entry(tool.to_string()).or_insert(0) += 1;
        }

        let Some(agent_id) = entry.agent() else {
            continue;
        };
        let slot = *index.entry(agent_id).or_insert_with(|| {
            agents.push(AgentSummary::new(agent_id));
            agents.len() - 1
        });
        let summary = &mut agents[slot];

        if entry.decision.is_allow() {
            summary.allow_count += 1;
        } else {
            summary.block_count += 1;
        }

        summary
            .roles
            .extend(entry.role_names().into_iter().map(str::to_string));

        if let Some(ts) = entry.timestamp() {
            if summary.last_seen.map_or(true, |current| ts > current) {
                summary.last_seen = Some(ts);
            }
        }
    }

    Aggregate { agents, tool_usage }
}

/// Sort agents by last_seen, newest first. Stable: ties keep their prior
/// relative order, and agents never seen go last.
pub fn sort_by_last_seen(agents: &mut [AgentSummary]) {
    agents.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
}

/// Agent panel search: case-insensitive substring on agent_id.
pub fn search_agents<'a>(agents: &'a [AgentSummary], term: &str) -> Vec<&'a AgentSummary> {
    let term = term.to_lowercase();
    agents
        .iter()
        .filter(|a| term.is_empty() || a.agent_id.to_lowercase().contains(&term))
        .collect()
}

/// Headline numbers for the overview cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OverviewStats {
    pub total_agents: usize,
    pub total_requests: usize,
    /// Entries whose decision is anything other than ALLOW.
    pub threats_blocked: usize,
    pub active_policies: usize,
}

impl OverviewStats {
    pub fn compute(entries: &[AuditLogEntry], active_policies: usize) -> Self {
        let agents: BTreeSet<&str> = entries.iter().filter_map(|e| e.agent()).collect();
        Self {
            total_agents: agents.len(),
            total_requests: entries.len(),
            threats_blocked: entries.iter().filter(|e| !e.decision.is_allow()).count(),
            active_policies,
        }
    }
}

/// Drill-down for a single agent.
#[derive(Debug, Clone, Serialize)]
pub struct AgentDetail<'a> {
    pub agent_id: String,
    pub total_calls: usize,
    /// Decision of the newest entry by timestamp.
    pub last_decision: Option<Decision>,
    /// Policy version of the newest entry by timestamp.
    pub last_policy: Option<String>,
    /// The newest `limit` entries, newest first.
    pub recent: Vec<&'a AuditLogEntry>,
}

/// Collect the drawer view for `agent_id`.
pub fn agent_detail<'a>(
    entries: &'a [AuditLogEntry],
    agent_id: &str,
    limit: usize,
) -> AgentDetail<'a> {
    let mut keyed: Vec<(Option<DateTime<Utc>>, &AuditLogEntry)> = entries
        .iter()
        .filter(|e| e.agent() == Some(agent_id))
        .map(|e| (e.timestamp(), e))
        .collect();
    sort_newest_first(&mut keyed);

    let newest = keyed.first().map(|(_, e)| *e);
    AgentDetail {
        agent_id: agent_id.to_string(),
        total_calls: keyed.len(),
        last_decision: newest.map(|e| e.decision.clone()),
        last_policy: newest.and_then(|e| e.policy_version.clone()),
        recent: keyed.into_iter().take(limit).map(|(_, e)| e).collect(),
    }
}

/// The `n` agents with the most entries, ties in order of first appearance.
pub fn top_agents(entries: &[AuditLogEntry], n: usize) -> Vec<(String, u64)> {
    top_by(entries.iter().filter_map(|e| e.agent()), n)
}

/// The `n` tools with the most entries, ties in order of first appearance.
pub fn top_tools(entries: &[AuditLogEntry], n: usize) -> Vec<(String, u64)> {
    top_by(entries.iter().filter_map(|e| e.tool()), n)
}

fn top_by<'a>(ids: impl Iterator<Item = &'a str>, n: usize) -> Vec<(String, u64)> {
    let mut order: Vec<(&str, u64)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for id in ids {
        match index.get(id) {
            Some(&i) => order[i].1 += 1,
            None => {
                index.insert(id, order.len());
                order.push((id, 1));
            }
        }
    }
    order.sort_by(|a, b| b.1.cmp(&a.1));
    order
        .into_iter()
        .take(n)
        .map(|(id, count)| (id.to_string(), count))
        .collect()
}
