// entry.rs - Audit log entry data model.
//
// One AuditLogEntry is one enforcement check recorded by the backend and
// returned from `GET /audit`. Entries are backend-owned and immutable; the
// dashboard only reads them. Every field is optional on the wire because
// older rows predate some columns (created_at was added by a migration).

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::AuditError;

/// Outcome of one enforcement check.
///
/// The wire value is matched case-insensitively and normalized to uppercase.
/// BLOCK and DENY are equivalent for aggregation; anything unrecognized is
/// kept verbatim (uppercased) in `Other` so it can still be displayed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Value", into = "String")]
pub enum Decision {
    Allow,
    Block,
    Deny,
    Other(String),
}

impl Decision {
    /// Parse a raw decision string (any case, surrounding whitespace ignored).
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_uppercase();
        match normalized.as_str() {
            "ALLOW" => Decision::Allow,
            "BLOCK" => Decision::Block,
            "DENY" => Decision::Deny,
            _ => Decision::Other(normalized),
        }
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// BLOCK or DENY.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Decision::Block | Decision::Deny)
    }

    /// Normalized uppercase label, empty when the backend sent nothing.
    pub fn as_str(&self) -> &str {
        match self {
            Decision::Allow => "ALLOW",
            Decision::Block => "BLOCK",
            Decision::Deny => "DENY",
            Decision::Other(s) => s,
        }
    }
}

impl Default for Decision {
    fn default() -> Self {
        Decision::Other(String::new())
    }
}

impl From<Value> for Decision {
    fn from(raw: Value) -> Self {
        scalar_text(raw).as_deref().map(Decision::parse).unwrap_or_default()
    }
}

impl From<Decision> for String {
    fn from(decision: Decision) -> Self {
        decision.as_str().to_string()
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Roles attached to the requesting agent.
///
/// The audit table stores them as a comma-separated string, but some
/// backend versions return a JSON array. `#[serde(untagged)]` tries each
/// variant in order until one deserializes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleList {
    Csv(String),
    List(Vec<String>),
}

impl RoleList {
    fn from_value(raw: Value) -> Option<Self> {
        match raw {
            Value::Array(items) => Some(RoleList::List(
                items.into_iter().filter_map(scalar_text).collect(),
            )),
            other => scalar_text(other).map(RoleList::Csv),
        }
    }

    /// Trimmed, non-empty role names in their original order.
    pub fn names(&self) -> Vec<&str> {
        match self {
            RoleList::Csv(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .collect(),
            RoleList::List(items) => items
                .iter()
                .map(|r| r.trim())
                .filter(|r| !r.is_empty())
                .collect(),
        }
    }
}

/// A single audit row as returned by `GET /audit`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Which agent requested the tool call. Rows without one are counted in
    /// raw totals but never attributed to an agent.
    #[serde(default, deserialize_with = "lenient_text")]
    pub agent_id: Option<String>,

    /// Tool identifier, with or without a namespace prefix (see `ToolNamespace`).
    #[serde(default, deserialize_with = "lenient_text")]
    pub tool_id: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub tool_version: Option<String>,

    #[serde(default)]
    pub decision: Decision,

    /// Why the engine decided what it did (e.g. "tool_not_found").
    #[serde(default, deserialize_with = "lenient_text")]
    pub reason: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub policy_version: Option<String>,

    #[serde(default, deserialize_with = "lenient_roles")]
    pub roles: Option<RoleList>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub request_id: Option<String>,

    /// ISO-8601 timestamp as written by the backend. Kept raw; use
    /// [`AuditLogEntry::timestamp`] for comparisons.
    #[serde(default, deserialize_with = "lenient_text")]
    pub created_at: Option<String>,
}

impl AuditLogEntry {
    /// Create an entry with the three fields every real row carries.
    ///
    /// Mostly useful in tests and examples; real entries come from JSON.
    pub fn new(
        agent_id: impl Into<String>,
        tool_id: impl Into<String>,
        decision: impl AsRef<str>,
    ) -> Self {
        Self {
            agent_id: Some(agent_id.into()),
            tool_id: Some(tool_id.into()),
            decision: Decision::parse(decision.as_ref()),
            ..Self::default()
        }
    }

    /// Set the raw created_at string and return self (builder pattern).
    pub fn with_created_at(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = Some(created_at.into());
        self
    }

    /// Set a comma-separated role list and return self.
    pub fn with_roles(mut self, roles: impl Into<String>) -> Self {
        self.roles = Some(RoleList::Csv(roles.into()));
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_policy_version(mut self, version: impl Into<String>) -> Self {
        self.policy_version = Some(version.into());
        self
    }

    /// Decode a `GET /audit` body.
    pub fn parse_list(json: &str) -> Result<Vec<Self>, AuditError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The agent id, if present and non-empty.
    pub fn agent(&self) -> Option<&str> {
        self.agent_id.as_deref().filter(|a| !a.is_empty())
    }

    /// The tool id, if present and non-empty.
    pub fn tool(&self) -> Option<&str> {
        self.tool_id.as_deref().filter(|t| !t.is_empty())
    }

    /// Parsed created_at. Missing and malformed values both yield `None`.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_deref().and_then(parse_timestamp)
    }

    /// Parsed role names (empty when the row has none).
    pub fn role_names(&self) -> Vec<&str> {
        self.roles.as_ref().map(RoleList::names).unwrap_or_default()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.role_names().iter().any(|r| *r == role)
    }
}

/// Strings pass through; numbers and booleans become their JSON text;
/// null, arrays and objects become `None`.
fn scalar_text(raw: Value) -> Option<String> {
    match raw {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// A row with one oddly typed column must not sink the whole `GET /audit`
// list, so scalar columns accept any JSON value.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Value::deserialize(deserializer).map(scalar_text)
}

fn lenient_roles<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<RoleList>, D::Error> {
    Value::deserialize(deserializer).map(RoleList::from_value)
}

/// Parse a backend timestamp.
///
/// Accepts RFC 3339 (`2024-05-01T12:00:00Z`, `+02:00` offsets) and the naive
/// `isoformat()` shape the backend writes (`2024-05-01T12:00:00.123456`),
/// which is interpreted as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn decision_is_case_insensitive() {
        assert_eq!(Decision::parse("allow"), Decision::Allow);
        assert_eq!(Decision::parse(" Block "), Decision::Block);
        assert_eq!(Decision::parse("deny"), Decision::Deny);
        assert_eq!(
            Decision::parse("require_approval"),
            Decision::Other("REQUIRE_APPROVAL".into())
        );
    }

    #[test]
    fn entry_decodes_backend_row() {
        let json = r#"[{
            "id": 7,
            "agent_id": "agent-1",
            "tool_id": "mcp:read_logs",
            "tool_version": "1.0",
            "decision": "deny",
            "reason": "role_not_permitted",
            "policy_version": "v3",
            "roles": "user, auditor",
            "created_at": "2024-05-01T12:00:00.123456"
        }]"#;

        let entries = AuditLogEntry::parse_list(json).unwrap();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.decision, Decision::Deny);
        assert_eq!(entry.role_names(), vec!["user", "auditor"]);
        assert!(entry.timestamp().is_some());
    }

    #[test]
    fn missing_fields_default() {
        let entries = AuditLogEntry::parse_list(r#"[{"tool_id": "x", "decision": null}]"#).unwrap();
        let entry = &entries[0];
        assert_eq!(entry.agent(), None);
        assert_eq!(entry.decision, Decision::default());
        assert!(entry.timestamp().is_none());
        assert!(entry.role_names().is_empty());
    }

    #[test]
    fn oddly_typed_columns_do_not_drop_the_list() {
        let json = r#"[
            {"agent_id": "a", "decision": 1, "roles": 42, "created_at": 1714564800},
            {"agent_id": 7, "tool_id": "t", "decision": "allow", "roles": ["ops", 3, null],
             "reason": {"code": "x"}},
            {"agent_id": "b", "decision": "block", "created_at": "2024-05-01T12:00:00Z"}
        ]"#;
        let entries = AuditLogEntry::parse_list(json).unwrap();
        assert_eq!(entries.len(), 3);

        assert_eq!(entries[0].decision, Decision::Other("1".into()));
        assert!(!entries[0].decision.is_allow());
        assert_eq!(entries[0].role_names(), vec!["42"]);
        assert!(entries[0].timestamp().is_none());

        assert_eq!(entries[1].agent(), Some("7"));
        assert_eq!(entries[1].role_names(), vec!["ops", "3"]);
        assert_eq!(entries[1].reason, None);

        assert_eq!(entries[2].decision, Decision::Block);
        assert!(entries[2].timestamp().is_some());
    }

    #[test]
    fn roles_accept_array_shape() {
        let entries =
            AuditLogEntry::parse_list(r#"[{"agent_id": "a", "roles": ["admin", " ops "]}]"#)
                .unwrap();
        assert!(entries[0].has_role("ops"));
        assert!(!entries[0].has_role("user"));
    }

    #[test]
    fn empty_agent_id_is_treated_as_missing() {
        let entry = AuditLogEntry {
            agent_id: Some(String::new()),
            ..AuditLogEntry::default()
        };
        assert_eq!(entry.agent(), None);
    }

    #[test]
    fn timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-05-01T12:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-01T14:00:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-01T12:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-01 12:00:00"), Some(expected));
        assert_eq!(parse_timestamp("not a date"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn decision_serializes_uppercase() {
        let json = serde_json::to_string(&Decision::parse("allow")).unwrap();
        assert_eq!(json, "\"ALLOW\"");
    }
}
