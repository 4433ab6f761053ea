// state.rs - AppState: the one owned object behind a dashboard session.
//
// Holds the current LogStore, the shared FilterState and the request
// sequencer. Built once at startup and passed by reference; responses are
// applied through `apply` so stale ones are dropped in one place.

use ag_audit::{AgentDetail, FilterPipeline, FilterState};
use chrono::{DateTime, Utc};

use crate::refresh::Completion;
use crate::sequence::{RequestSequencer, Resource, Ticket};
use crate::store::LogStore;
use crate::view::{drawer, DashboardView, Presets};

#[derive(Debug, Clone)]
pub struct AppState {
    store: LogStore,
    filter: FilterState,
    sequencer: RequestSequencer,
    pipeline: FilterPipeline,
    agent_search: String,
    dirty: bool,
}

impl AppState {
    pub fn new(pipeline: FilterPipeline) -> Self {
        Self {
            store: LogStore::new(),
            filter: FilterState::default(),
            sequencer: RequestSequencer::new(),
            pipeline,
            agent_search: String::new(),
            dirty: false,
        }
    }

    pub fn store(&self) -> &LogStore {
        &self.store
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    /// Mutate the shared filter. Every panel picks the change up on the
    /// next `view`.
    pub fn filter_mut(&mut self) -> &mut FilterState {
        &mut self.filter
    }

    pub fn pipeline(&self) -> &FilterPipeline {
        &self.pipeline
    }

    /// Show one more page of audit rows.
    pub fn load_more(&mut self) {
        self.filter.load_more(self.pipeline.page_size());
    }

    /// Agent panel search box; does not affect the audit table.
    pub fn set_agent_search(&mut self, term: impl Into<String>) {
        self.agent_search = term.into();
    }

    pub fn agent_search(&self) -> &str {
        &self.agent_search
    }

    /// Take a ticket before sending a request for `resource`.
    pub fn begin(&mut self, resource: Resource) -> Ticket {
        self.sequencer.issue(resource)
    }

    /// Apply a finished fetch. Returns false if it was superseded by a
    /// newer request for the same resource and therefore dropped.
    pub fn apply(&mut self, completion: Completion, at: DateTime<Utc>) -> bool {
        let Completion { ticket, result } = completion;
        if let Ok(payload) = &result {
            if payload.resource() != ticket.resource {
                tracing::warn!(
                    ticket = %ticket.resource,
                    payload = %payload.resource(),
                    "response does not match its ticket, dropped"
                );
                return false;
            }
        }
        if !self.sequencer.accept(ticket) {
            tracing::debug!(
                resource = %ticket.resource,
                seq = ticket.seq,
                latest = self.sequencer.applied(ticket.resource),
                "stale response dropped"
            );
            return false;
        }

        match result {
            Ok(payload) => {
                tracing::debug!(resource = %ticket.resource, rows = payload.len(), "snapshot replaced");
                self.store.replace(payload, at);
            }
            Err(message) => self.store.fail(ticket.resource, message),
        }
        self.dirty = true;
        true
    }

    /// True when no resource has a request outstanding.
    pub fn settled(&self) -> bool {
        Resource::ALL.iter().all(|r| !self.is_pending(*r))
    }

    /// Decide whether a redraw is due and clear the flag if so.
    ///
    /// Something must have been applied since the last redraw. Between
    /// ticks the redraw waits until every resource has settled; at a tick
    /// it happens regardless, so a backend slower than the refresh period
    /// still gets its snapshots on screen once per tick.
    pub fn take_redraw(&mut self, at_tick: bool) -> bool {
        if self.dirty && (at_tick || self.settled()) {
            self.dirty = false;
            return true;
        }
        false
    }

    pub fn is_pending(&self, resource: Resource) -> bool {
        self.sequencer.is_pending(resource)
    }

    /// All panels, derived from the current snapshot and filter.
    pub fn view(&self, now: DateTime<Utc>) -> DashboardView<'_> {
        DashboardView::build(
            &self.store,
            &self.filter,
            &self.pipeline,
            &self.agent_search,
            now,
        )
    }

    pub fn agent_detail(&self, agent_id: &str) -> AgentDetail<'_> {
        drawer(self.store.audit(), agent_id)
    }

    pub fn presets(&self) -> Presets {
        Presets::from_entries(self.store.audit())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(FilterPipeline::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Payload;
    use ag_audit::AuditLogEntry;

    fn audit(ids: &[&str]) -> Payload {
        Payload::Audit(ids.iter().map(|id| AuditLogEntry::new(*id, "t", "ALLOW")).collect())
    }

    #[test]
    fn stale_completion_does_not_overwrite_newer_snapshot() {
        let mut state = AppState::default();
        let old = state.begin(Resource::Audit);
        let new = state.begin(Resource::Audit);
        let now = Utc::now();

        assert!(state.apply(Completion::loaded(new, audit(&["fresh"])), now));
        assert!(!state.apply(Completion::loaded(old, audit(&["stale", "stale"])), now));
        assert_eq!(state.store().audit().len(), 1);
        assert_eq!(state.store().audit()[0].agent(), Some("fresh"));
    }

    #[test]
    fn stale_failure_is_dropped_too() {
        let mut state = AppState::default();
        let old = state.begin(Resource::Tools);
        let new = state.begin(Resource::Tools);
        let now = Utc::now();

        assert!(state.apply(Completion::loaded(new, Payload::Tools(vec![])), now));
        assert!(!state.apply(Completion::failed(old, "timed out"), now));
        assert!(state.store().notices().is_empty());
    }

    #[test]
    fn mismatched_payload_is_rejected() {
        let mut state = AppState::default();
        let ticket = state.begin(Resource::Tools);
        assert!(!state.apply(Completion::loaded(ticket, audit(&["a"])), Utc::now()));
        assert!(state.is_pending(Resource::Tools));
    }

    #[test]
    fn redraw_waits_for_settle_between_ticks() {
        let mut state = AppState::default();
        assert!(!state.take_redraw(true));

        let audit_ticket = state.begin(Resource::Audit);
        let tools_ticket = state.begin(Resource::Tools);
        state.apply(Completion::loaded(audit_ticket, audit(&["a"])), Utc::now());
        assert!(!state.take_redraw(false));

        state.apply(Completion::loaded(tools_ticket, Payload::Tools(vec![])), Utc::now());
        assert!(state.settled());
        assert!(state.take_redraw(false));
        assert!(!state.take_redraw(false));
    }

    #[test]
    fn stale_completion_does_not_mark_dirty() {
        let mut state = AppState::default();
        let old = state.begin(Resource::Audit);
        let new = state.begin(Resource::Audit);
        state.apply(Completion::loaded(new, audit(&["fresh"])), Utc::now());
        assert!(state.take_redraw(false));

        state.apply(Completion::loaded(old, audit(&["stale"])), Utc::now());
        assert!(!state.take_redraw(true));
    }

    #[test]
    fn load_more_uses_pipeline_page_size() {
        let mut state = AppState::default();
        state.load_more();
        assert_eq!(state.filter().page_offset(), state.pipeline().page_size());
        state.filter_mut().set_agent("a");
        assert_eq!(state.filter().page_offset(), 0);
    }
}
