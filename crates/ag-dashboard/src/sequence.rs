// sequence.rs - Per-resource request sequencing ("latest wins").
//
// Periodic and operator-triggered refreshes of the same resource can be in
// flight together and complete in any order. Every request takes a Ticket
// before it is sent; a response is applied only if its ticket is newer than
// the last one applied for that resource. Older responses are dropped.

use serde::Serialize;

/// A backend collection the dashboard snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Audit,
    Tools,
    Policies,
    Anomalies,
}

impl Resource {
    pub const ALL: [Resource; 4] = [
        Resource::Audit,
        Resource::Tools,
        Resource::Policies,
        Resource::Anomalies,
    ];

    /// Human-readable name, used in load notices.
    pub fn label(&self) -> &'static str {
        match self {
            Resource::Audit => "audit log",
            Resource::Tools => "tools",
            Resource::Policies => "policies",
            Resource::Anomalies => "anomalies",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Resource::Audit => 0,
            Resource::Tools => 1,
            Resource::Policies => 2,
            Resource::Anomalies => 3,
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Issued to a request before it is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Ticket {
    pub resource: Resource,
    pub seq: u64,
}

/// Hands out tickets and remembers the newest one applied per resource.
#[derive(Debug, Clone, Default)]
pub struct RequestSequencer {
    issued: [u64; 4],
    applied: [u64; 4],
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next ticket for `resource`. Sequence numbers start at 1.
    pub fn issue(&mut self, resource: Resource) -> Ticket {
        let slot = &mut self.issued[resource.index()];
        *slot += 1;
        Ticket {
            resource,
            seq: *slot,
        }
    }

    /// Record `ticket` as applied if it is the newest seen so far.
    /// Returns false for a stale response, which the caller must drop.
    pub fn accept(&mut self, ticket: Ticket) -> bool {
        let slot = &mut self.applied[ticket.resource.index()];
        if ticket.seq <= *slot {
            return false;
        }
        *slot = ticket.seq;
        true
    }

    /// Sequence of the last applied response, 0 if none.
    pub fn applied(&self, resource: Resource) -> u64 {
        self.applied[resource.index()]
    }

    /// True while a newer request than the last applied one is outstanding.
    pub fn is_pending(&self, resource: Resource) -> bool {
        self.issued[resource.index()] > self.applied[resource.index()]
    }
}
