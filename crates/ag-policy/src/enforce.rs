// enforce.rs - Simulated enforcement and policy generation payloads.
//
// The simulator posts the same request an agent gateway would send to
// `POST /enforce`. Operator input arrives as loose text fields; everything
// is validated here so a malformed payload is never sent.

use ag_audit::Decision;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::PolicyError;
use crate::tool::ToolRecord;

/// Version sent when the operator leaves it blank.
pub const DEFAULT_TOOL_VERSION: &str = "1.0.0";

/// Agent id used for tool example payloads.
pub const DEMO_AGENT: &str = "demo-agent";

/// Body of `POST /enforce`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnforceRequest {
    pub agent_id: String,
    pub agent_roles: Vec<String>,
    pub tool_id: String,
    pub tool_version: String,
    pub params: Value,
    pub request_id: String,
}

/// Raw simulator form fields, as typed by the operator.
#[derive(Debug, Clone, Default)]
pub struct SimulationForm {
    pub agent_id: String,
    /// Comma-separated.
    pub agent_roles: String,
    pub tool_id: String,
    pub tool_version: Option<String>,
    /// JSON text; blank means `{}`.
    pub params: Option<String>,
    pub request_id: Option<String>,
}

impl EnforceRequest {
    /// Validate a simulator form and build the request.
    pub fn from_form(form: &SimulationForm) -> Result<Self, PolicyError> {
        let agent_id = form.agent_id.trim();
        if agent_id.is_empty() {
            return Err(PolicyError::MissingField("agent_id"));
        }
        let tool_id = form.tool_id.trim();
        if tool_id.is_empty() {
            return Err(PolicyError::MissingField("tool_id"));
        }

        let params = match form.params.as_deref().map(str::trim) {
            None | Some("") => Value::Object(Map::new()),
            Some(text) => serde_json::from_str(text).map_err(|source| {
                PolicyError::InvalidJson {
                    field: "params",
                    source,
                }
            })?,
        };

        Ok(Self {
            agent_id: agent_id.to_string(),
            agent_roles: split_roles(&form.agent_roles),
            tool_id: tool_id.to_string(),
            tool_version: non_blank(form.tool_version.as_deref())
                .unwrap_or(DEFAULT_TOOL_VERSION)
                .to_string(),
            params,
            request_id: non_blank(form.request_id.as_deref())
                .map(str::to_string)
                .unwrap_or_else(new_request_id),
        })
    }

    /// Example payload for a registry tool: demo agent, `user` role, the
    /// tool's input schema as params.
    pub fn example_for(tool: &ToolRecord) -> Self {
        Self {
            agent_id: DEMO_AGENT.to_string(),
            agent_roles: vec!["user".to_string()],
            tool_id: tool.id.clone(),
            tool_version: non_blank(tool.version.as_deref())
                .unwrap_or(DEFAULT_TOOL_VERSION)
                .to_string(),
            params: tool
                .input_schema
                .clone()
                .unwrap_or_else(|| Value::Object(Map::new())),
            request_id: new_request_id(),
        }
    }
}

/// Body returned by `POST /enforce`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnforceResponse {
    #[serde(default)]
    pub decision: Decision,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub policy_version: Option<String>,
    /// Anything else the engine echoes back (request_id, tool_id, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EnforceResponse {
    /// "ALLOWED" or "BLOCKED - reason".
    pub fn verdict(&self) -> String {
        if self.decision.is_allow() {
            "ALLOWED".to_string()
        } else {
            format!("BLOCKED - {}", self.reason.as_deref().unwrap_or("no reason given"))
        }
    }
}

/// Body of `POST /generate_policy`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Natural-language description of the desired policy.
    pub nl: String,
    pub model: String,
}

impl GenerateRequest {
    /// Reject an empty description locally; it would only bounce off the
    /// backend with `missing_nl`.
    pub fn new(nl: &str, model: &str) -> Result<Self, PolicyError> {
        let nl = nl.trim();
        if nl.is_empty() {
            return Err(PolicyError::MissingField("nl"));
        }
        Ok(Self {
            nl: nl.to_string(),
            model: model.to_string(),
        })
    }
}

/// `req-` followed by 7 random hex characters.
pub fn new_request_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("req-{}", &id[..7])
}

/// Comma-split, trimmed, non-empty role names.
pub fn split_roles(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
