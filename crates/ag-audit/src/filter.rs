// filter.rs - The operator's shared view selection.
//
// A single FilterState drives the agent panel highlight, the tool panel
// highlight and the audit table at the same time. Its fields are private so
// every change goes through the mutation methods below, which keep two
// invariants:
//
// - agent and tool selection are mutually exclusive; role is independent
//   and combines with either (AND);
// - every mutation except `load_more` resets the pagination cursor, so a
//   "load more" affordance always refers to the currently filtered set.

use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::entry::Decision;
use crate::error::AuditError;

/// How far back the audit table looks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeRange {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "24h")]
    TwentyFourHours,
}

impl TimeRange {
    /// Window length, or `None` for "all".
    pub fn window(&self) -> Option<Duration> {
        match self {
            TimeRange::All => None,
            TimeRange::FiveMinutes => Some(Duration::minutes(5)),
            TimeRange::OneHour => Some(Duration::hours(1)),
            TimeRange::TwentyFourHours => Some(Duration::hours(24)),
        }
    }
}

impl FromStr for TimeRange {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(TimeRange::All),
            "5m" => Ok(TimeRange::FiveMinutes),
            "1h" => Ok(TimeRange::OneHour),
            "24h" => Ok(TimeRange::TwentyFourHours),
            _ => Err(AuditError::InvalidTimeRange(s.to_string())),
        }
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeRange::All => write!(f, "all"),
            TimeRange::FiveMinutes => write!(f, "5m"),
            TimeRange::OneHour => write!(f, "1h"),
            TimeRange::TwentyFourHours => write!(f, "24h"),
        }
    }
}

/// Which decisions the audit table shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionFilter {
    #[default]
    All,
    Allow,
    /// BLOCK and DENY rows.
    Block,
}

impl DecisionFilter {
    pub fn matches(&self, decision: &Decision) -> bool {
        match self {
            DecisionFilter::All => true,
            DecisionFilter::Allow => decision.is_allow(),
            DecisionFilter::Block => decision.is_blocking(),
        }
    }
}

impl FromStr for DecisionFilter {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(DecisionFilter::All),
            "allow" => Ok(DecisionFilter::Allow),
            "block" | "deny" => Ok(DecisionFilter::Block),
            _ => Err(AuditError::InvalidDecisionFilter(s.to_string())),
        }
    }
}

impl std::fmt::Display for DecisionFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecisionFilter::All => write!(f, "all"),
            DecisionFilter::Allow => write!(f, "allow"),
            DecisionFilter::Block => write!(f, "block"),
        }
    }
}

/// The "jump to entity" selection. At most one of agent or tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EntitySelection {
    #[default]
    None,
    Agent(String),
    Tool(String),
}

/// The operator's current view selection plus the audit pagination cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    selection: EntitySelection,
    role: Option<String>,
    time_range: TimeRange,
    decision: DecisionFilter,
    search_term: String,
    page_offset: usize,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    // --- reads ---

    pub fn selection(&self) -> &EntitySelection {
        &self.selection
    }

    pub fn agent_id(&self) -> Option<&str> {
        match &self.selection {
            EntitySelection::Agent(id) => Some(id),
            _ => None,
        }
    }

    pub fn tool_id(&self) -> Option<&str> {
        match &self.selection {
            EntitySelection::Tool(id) => Some(id),
            _ => None,
        }
    }

    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    pub fn time_range(&self) -> TimeRange {
        self.time_range
    }

    pub fn decision(&self) -> DecisionFilter {
        self.decision
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn page_offset(&self) -> usize {
        self.page_offset
    }

    /// True when any entity dimension (agent, tool or role) is active.
    pub fn has_entity_filter(&self) -> bool {
        self.selection != EntitySelection::None || self.role.is_some()
    }

    /// One-line description of the active entity filter, for the filter pill.
    pub fn pill(&self) -> Option<String> {
        let primary = match &self.selection {
            EntitySelection::Agent(id) => Some(format!("Agent: {}", id)),
            EntitySelection::Tool(id) => Some(format!("Tool: {}", id)),
            EntitySelection::None => None,
        };
        match (primary, &self.role) {
            (Some(p), Some(role)) => Some(format!("{} + Role: {}", p, role)),
            (Some(p), None) => Some(p),
            (None, Some(role)) => Some(format!("Role: {}", role)),
            (None, None) => None,
        }
    }

    // --- mutations ---

    /// Select an agent. Clears any tool selection; the role filter stays.
    pub fn set_agent(&mut self, agent_id: impl Into<String>) {
        self.selection = non_empty(agent_id.into())
            .map(EntitySelection::Agent)
            .unwrap_or_default();
        self.page_offset = 0;
    }

    /// Select a tool. Clears any agent selection; the role filter stays.
    pub fn set_tool(&mut self, tool_id: impl Into<String>) {
        self.selection = non_empty(tool_id.into())
            .map(EntitySelection::Tool)
            .unwrap_or_default();
        self.page_offset = 0;
    }

    /// Set or clear the role filter without touching agent/tool selection.
    pub fn set_role(&mut self, role: Option<String>) {
        self.role = role.and_then(non_empty);
        self.page_offset = 0;
    }

    /// Reset agent, tool and role together. View controls (time range,
    /// decision, search) are left alone.
    pub fn clear_entity(&mut self) {
        self.selection = EntitySelection::None;
        self.role = None;
        self.page_offset = 0;
    }

    pub fn set_time_range(&mut self, range: TimeRange) {
        self.time_range = range;
        self.page_offset = 0;
    }

    pub fn set_decision(&mut self, decision: DecisionFilter) {
        self.decision = decision;
        self.page_offset = 0;
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        self.page_offset = 0;
    }

    /// Extend the visible audit rows by one page.
    pub fn load_more(&mut self, page_size: usize) {
        self.page_offset = self.page_offset.saturating_add(page_size);
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
