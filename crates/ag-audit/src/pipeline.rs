// pipeline.rs - FilterState applied to an audit snapshot.
//
// Stages run in a fixed order, each a pure narrowing of the previous one:
//
// 1. time range cutoff (rows without a parseable created_at are dropped
//    unless the range is "all")
// 2. decision
// 3. free-text search over agent_id, tool_id and reason
// 4. entity selection: agent, tool (namespace-insensitive) and role
// 5. sort by created_at, newest first; rows without a timestamp last,
//    keeping their relative order
// 6. truncate to page_offset + page_size
//
// The result borrows from the snapshot; nothing is cloned.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entry::AuditLogEntry;
use crate::filter::{EntitySelection, FilterState};
use crate::namespace::ToolNamespace;

/// Rows per audit page.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Why an audit page has no rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReason {
    /// The snapshot itself has no entries.
    NoData,
    /// The snapshot has entries but none survive the filter.
    FilteredOut,
}

/// One rendered slice of the audit table.
#[derive(Debug, Clone, Serialize)]
pub struct AuditPage<'a> {
    /// Matching rows, newest first, at most `page_offset + page_size` long.
    pub rows: Vec<&'a AuditLogEntry>,
    /// How many rows matched before truncation.
    pub total_matched: usize,
    /// Whether a "load more" action would reveal further rows.
    pub has_more: bool,
    /// Set only when `rows` is empty.
    pub empty: Option<EmptyReason>,
}

impl AuditPage<'_> {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Applies a FilterState to a snapshot.
#[derive(Debug, Clone)]
pub struct FilterPipeline {
    page_size: usize,
    namespace: ToolNamespace,
}

impl FilterPipeline {
    pub fn new(page_size: usize, namespace: ToolNamespace) -> Self {
        Self {
            page_size: page_size.max(1),
            namespace,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn namespace(&self) -> &ToolNamespace {
        &self.namespace
    }

    /// Run every stage and paginate.
    pub fn run<'a>(
        &self,
        entries: &'a [AuditLogEntry],
        filter: &FilterState,
        now: DateTime<Utc>,
    ) -> AuditPage<'a> {
        let matched = self.matching(entries, filter, now);
        let total_matched = matched.len();
        let limit = filter.page_offset().saturating_add(self.page_size);
        let rows: Vec<&AuditLogEntry> = matched.into_iter().take(limit).collect();
        let has_more = total_matched > rows.len();

        let empty = if !rows.is_empty() {
            None
        } else if entries.is_empty() {
            Some(EmptyReason::NoData)
        } else {
            Some(EmptyReason::FilteredOut)
        };

        tracing::debug!(
            total = entries.len(),
            matched = total_matched,
            shown = rows.len(),
            "audit filter applied"
        );

        AuditPage {
            rows,
            total_matched,
            has_more,
            empty,
        }
    }

    /// Stages 1-5: every matching row, sorted, without pagination.
    pub fn matching<'a>(
        &self,
        entries: &'a [AuditLogEntry],
        filter: &FilterState,
        now: DateTime<Utc>,
    ) -> Vec<&'a AuditLogEntry> {
        let cutoff = filter.time_range().window().map(|w| now - w);
        let term = filter.search_term().to_lowercase();

        // Parse each timestamp once; the cutoff and the sort both need it.
        let mut keyed: Vec<(Option<DateTime<Utc>>, &AuditLogEntry)> = entries
            .iter()
            .map(|e| (e.timestamp(), e))
            .filter(|(ts, _)| match cutoff {
                Some(cutoff) => ts.is_some_and(|t| t >= cutoff),
                None => true,
            })
            .filter(|(_, e)| filter.decision().matches(&e.decision))
            .filter(|(_, e)| term.is_empty() || matches_search(e, &term))
            .filter(|(_, e)| self.matches_entity(e, filter))
            .collect();

        sort_newest_first(&mut keyed);
        keyed.into_iter().map(|(_, e)| e).collect()
    }

    fn matches_entity(&self, entry: &AuditLogEntry, filter: &FilterState) -> bool {
        let selected = match filter.selection() {
            EntitySelection::None => true,
            EntitySelection::Agent(id) => entry.agent() == Some(id.as_str()),
            EntitySelection::Tool(id) => entry
                .tool()
                .is_some_and(|t| self.namespace.same_tool(t, id)),
        };
        selected && filter.role().map_or(true, |role| entry.has_role(role))
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, ToolNamespace::default())
    }
}

/// Case-insensitive substring match on agent_id, tool_id or reason.
/// `term` must already be lowercased.
fn matches_search(entry: &AuditLogEntry, term: &str) -> bool {
    [&entry.agent_id, &entry.tool_id, &entry.reason]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(term))
}

/// Stable sort, newest first. `None` orders below every `Some`, so
/// reversing the comparison puts undated rows last.
pub(crate) fn sort_newest_first<T>(keyed: &mut [(Option<DateTime<Utc>>, T)]) {
    keyed.sort_by(|a, b| b.0.cmp(&a.0));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{DecisionFilter, TimeRange};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
    }

    fn at(minutes_ago: i64) -> String {
        (now() - Duration::minutes(minutes_ago)).to_rfc3339()
    }

    fn sample() -> Vec<AuditLogEntry> {
        vec![
            AuditLogEntry::new("a1", "search", "ALLOW")
                .with_created_at(at(120))
                .with_roles("user"),
            AuditLogEntry::new("a1", "mcp:search", "BLOCK")
                .with_created_at(at(2))
                .with_roles("user,admin")
                .with_reason("rate_limited"),
            AuditLogEntry::new("a2", "run_shell_sim", "deny")
                .with_created_at(at(30))
                .with_roles("admin"),
            AuditLogEntry::new("a3", "read_logs", "ALLOW"),
        ]
    }

    fn tools(page: &AuditPage<'_>) -> Vec<String> {
        page.rows
            .iter()
            .map(|e| e.tool_id.clone().unwrap_or_default())
            .collect()
    }

    #[test]
    fn sorts_newest_first_with_undated_last() {
        let entries = sample();
        let page = FilterPipeline::default().run(&entries, &FilterState::new(), now());
        assert_eq!(
            tools(&page),
            vec!["mcp:search", "run_shell_sim", "search", "read_logs"]
        );
        assert_eq!(page.total_matched, 4);
        assert!(!page.has_more);
        assert_eq!(page.empty, None);
    }

    #[test]
    fn undated_rows_keep_relative_order() {
        let entries = vec![
            AuditLogEntry::new("a", "first", "ALLOW"),
            AuditLogEntry::new("a", "second", "ALLOW").with_created_at("garbage"),
            AuditLogEntry::new("a", "third", "ALLOW"),
        ];
        let page = FilterPipeline::default().run(&entries, &FilterState::new(), now());
        assert_eq!(tools(&page), vec!["first", "second", "third"]);
    }

    #[test]
    fn time_range_drops_old_and_undated_rows() {
        let entries = sample();
        let mut filter = FilterState::new();
        filter.set_time_range(TimeRange::OneHour);
        let page = FilterPipeline::default().run(&entries, &filter, now());
        assert_eq!(tools(&page), vec!["mcp:search", "run_shell_sim"]);

        filter.set_time_range(TimeRange::FiveMinutes);
        let page = FilterPipeline::default().run(&entries, &filter, now());
        assert_eq!(tools(&page), vec!["mcp:search"]);
    }

    #[test]
    fn decision_block_returns_block_and_deny() {
        let entries = vec![
            AuditLogEntry::new("a", "t1", "ALLOW"),
            AuditLogEntry::new("a", "t2", "BLOCK"),
            AuditLogEntry::new("a", "t3", "DENY"),
        ];
        let mut filter = FilterState::new();
        filter.set_decision(DecisionFilter::Block);
        let page = FilterPipeline::default().run(&entries, &filter, now());
        assert_eq!(tools(&page), vec!["t2", "t3"]);
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let entries = sample();
        let mut filter = FilterState::new();
        filter.set_search("RATE");
        let page = FilterPipeline::default().run(&entries, &filter, now());
        assert_eq!(tools(&page), vec!["mcp:search"]);

        filter.set_search("A2");
        let page = FilterPipeline::default().run(&entries, &filter, now());
        assert_eq!(tools(&page), vec!["run_shell_sim"]);
    }

    #[test]
    fn search_whitespace_is_part_of_the_term() {
        let entries = sample();
        let mut filter = FilterState::new();
        filter.set_search(" rate");
        let page = FilterPipeline::default().run(&entries, &filter, now());
        assert!(page.rows.is_empty());
        assert_eq!(page.empty, Some(EmptyReason::FilteredOut));

        filter.set_search("rate_");
        let page = FilterPipeline::default().run(&entries, &filter, now());
        assert_eq!(tools(&page), vec!["mcp:search"]);
    }

    #[test]
    fn tool_filter_ignores_namespace_prefix() {
        let entries = sample();
        let mut filter = FilterState::new();
        filter.set_tool("search");
        let page = FilterPipeline::default().run(&entries, &filter, now());
        assert_eq!(tools(&page), vec!["mcp:search", "search"]);

        filter.set_tool("mcp:search");
        let page = FilterPipeline::default().run(&entries, &filter, now());
        assert_eq!(page.total_matched, 2);
    }

    #[test]
    fn role_combines_with_agent_filter() {
        let entries = sample();
        let mut filter = FilterState::new();
        filter.set_role(Some("admin".into()));
        let page = FilterPipeline::default().run(&entries, &filter, now());
        assert_eq!(tools(&page), vec!["mcp:search", "run_shell_sim"]);

        filter.set_agent("a1");
        let page = FilterPipeline::default().run(&entries, &filter, now());
        assert_eq!(tools(&page), vec!["mcp:search"]);
    }

    #[test]
    fn pagination_and_load_more() {
        let entries: Vec<AuditLogEntry> = (0..7)
            .map(|i| AuditLogEntry::new("a", format!("t{}", i), "ALLOW").with_created_at(at(i)))
            .collect();
        let pipeline = FilterPipeline::new(3, ToolNamespace::default());
        let mut filter = FilterState::new();

        let page = pipeline.run(&entries, &filter, now());
        assert_eq!(page.rows.len(), 3);
        assert!(page.has_more);

        filter.load_more(pipeline.page_size());
        filter.load_more(pipeline.page_size());
        let page = pipeline.run(&entries, &filter, now());
        assert_eq!(page.rows.len(), 7);
        assert!(!page.has_more);
        assert_eq!(page.total_matched, 7);
    }

    #[test]
    fn empty_snapshot_differs_from_filtered_out() {
        let pipeline = FilterPipeline::default();
        let filter = FilterState::new();
        let page = pipeline.run(&[], &filter, now());
        assert_eq!(page.empty, Some(EmptyReason::NoData));

        let entries = sample();
        let mut filter = FilterState::new();
        filter.set_agent("nobody");
        let page = pipeline.run(&entries, &filter, now());
        assert_eq!(page.empty, Some(EmptyReason::FilteredOut));
        assert!(page.is_empty());
    }

    #[test]
    fn filtering_is_idempotent() {
        let entries = sample();
        let mut filter = FilterState::new();
        filter.set_role(Some("user".into()));
        filter.set_search("a1");
        let pipeline = FilterPipeline::default();
        let first = pipeline.run(&entries, &filter, now());
        let second = pipeline.run(&entries, &filter, now());
        assert_eq!(first.rows, second.rows);
        assert_eq!(first.total_matched, second.total_matched);
    }
}
