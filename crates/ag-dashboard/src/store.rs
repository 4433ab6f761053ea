// store.rs - LogStore: the latest snapshot of every backend collection.
//
// Each resource is replaced wholesale when a response is applied; nothing
// is merged. A failed load empties that resource and records a notice, and
// leaves every other resource untouched.

use std::sync::Arc;

use ag_audit::AuditLogEntry;
use ag_policy::{Anomaly, Policy, ToolRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::sequence::Resource;

/// A fetched collection, ready to replace its slot in the store.
#[derive(Debug, Clone)]
pub enum Payload {
    Audit(Vec<AuditLogEntry>),
    Tools(Vec<ToolRecord>),
    Policies(Vec<Policy>),
    Anomalies(Vec<Anomaly>),
}

impl Payload {
    pub fn resource(&self) -> Resource {
        match self {
            Payload::Audit(_) => Resource::Audit,
            Payload::Tools(_) => Resource::Tools,
            Payload::Policies(_) => Resource::Policies,
            Payload::Anomalies(_) => Resource::Anomalies,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Payload::Audit(v) => v.len(),
            Payload::Tools(v) => v.len(),
            Payload::Policies(v) => v.len(),
            Payload::Anomalies(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Non-fatal "failed to load X" message for one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadNotice {
    pub resource: Resource,
    pub message: String,
}

impl std::fmt::Display for LoadNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to load {}: {}", self.resource.label(), self.message)
    }
}

/// Load state of one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ResourceLoad {
    NotLoaded,
    Loaded { at: DateTime<Utc> },
    Failed { notice: LoadNotice },
}

/// The most recently applied snapshot of each collection.
///
/// Collections are held behind `Arc` so a view built from one state stays
/// valid while a newer response replaces the slot.
#[derive(Debug, Clone)]
pub struct LogStore {
    audit: Arc<Vec<AuditLogEntry>>,
    tools: Arc<Vec<ToolRecord>>,
    policies: Arc<Vec<Policy>>,
    anomalies: Arc<Vec<Anomaly>>,
    loads: [ResourceLoad; 4],
}

impl Default for LogStore {
    fn default() -> Self {
        Self {
            audit: Arc::default(),
            tools: Arc::default(),
            policies: Arc::default(),
            anomalies: Arc::default(),
            loads: [
                ResourceLoad::NotLoaded,
                ResourceLoad::NotLoaded,
                ResourceLoad::NotLoaded,
                ResourceLoad::NotLoaded,
            ],
        }
    }
}

impl LogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn audit(&self) -> &[AuditLogEntry] {
        &self.audit
    }

    pub fn tools(&self) -> &[ToolRecord] {
        &self.tools
    }

    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }

    pub fn anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }

    pub fn load_state(&self, resource: Resource) -> &ResourceLoad {
        &self.loads[resource.index()]
    }

    /// Notices for every resource whose last load failed.
    pub fn notices(&self) -> Vec<&LoadNotice> {
        self.loads
            .iter()
            .filter_map(|load| match load {
                ResourceLoad::Failed { notice } => Some(notice),
                _ => None,
            })
            .collect()
    }

    /// Replace one collection with a fresh snapshot.
    pub fn replace(&mut self, payload: Payload, at: DateTime<Utc>) {
        let resource = payload.resource();
        match payload {
            Payload::Audit(v) => self.audit = Arc::new(v),
            Payload::Tools(v) => self.tools = Arc::new(v),
            Payload::Policies(v) => self.policies = Arc::new(v),
            Payload::Anomalies(v) => self.anomalies = Arc::new(v),
        }
        self.loads[resource.index()] = ResourceLoad::Loaded { at };
    }

    /// Record a failed load: the collection is treated as empty.
    pub fn fail(&mut self, resource: Resource, message: impl Into<String>) {
        match resource {
            Resource::Audit => self.audit = Arc::default(),
            Resource::Tools => self.tools = Arc::default(),
            Resource::Policies => self.policies = Arc::default(),
            Resource::Anomalies => self.anomalies = Arc::default(),
        }
        let notice = LoadNotice {
            resource,
            message: message.into(),
        };
        tracing::warn!("{}", notice);
        self.loads[resource.index()] = ResourceLoad::Failed { notice };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_is_wholesale() {
        let mut store = LogStore::new();
        let now = Utc::now();
        store.replace(
            Payload::Audit(vec![
                AuditLogEntry::new("a", "t", "ALLOW"),
                AuditLogEntry::new("b", "t", "ALLOW"),
            ]),
            now,
        );
        store.replace(Payload::Audit(vec![AuditLogEntry::new("c", "t", "BLOCK")]), now);
        assert_eq!(store.audit().len(), 1);
        assert_eq!(store.audit()[0].agent(), Some("c"));
        assert_eq!(store.load_state(Resource::Audit), &ResourceLoad::Loaded { at: now });
    }

    #[test]
    fn failure_is_isolated_to_one_resource() {
        let mut store = LogStore::new();
        let now = Utc::now();
        store.replace(Payload::Audit(vec![AuditLogEntry::new("a", "t", "ALLOW")]), now);
        store.replace(Payload::Anomalies(vec![Anomaly::default()]), now);

        store.fail(Resource::Anomalies, "connection refused");

        assert!(store.anomalies().is_empty());
        assert_eq!(store.audit().len(), 1);
        let notices = store.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(
            notices[0].to_string(),
            "failed to load anomalies: connection refused"
        );
    }

    #[test]
    fn later_success_clears_notice() {
        let mut store = LogStore::new();
        store.fail(Resource::Tools, "HTTP 500");
        store.replace(Payload::Tools(vec![ToolRecord::new("mcp:x")]), Utc::now());
        assert!(store.notices().is_empty());
    }
}
