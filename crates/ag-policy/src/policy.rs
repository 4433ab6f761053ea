// policy.rs - Policy documents as served by `GET /policies`.
//
// The policy store persists `rules` as a JSON-encoded TEXT column, and some
// backend versions hand that string straight back instead of decoding it.
// `Rules` accepts both shapes; `Rules::coerce` produces the ordered rule
// sequence either way.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::PolicyError;

/// Placeholder shown in place of an empty or missing rule list.
pub const NO_RULES: &str = "No rules";

/// A policy's rule list in whichever shape the backend sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rules {
    /// Already a JSON array.
    Structured(Vec<Value>),
    /// A JSON-encoded array inside a string.
    Encoded(String),
    /// Anything else (object, number, ...). Shown verbatim.
    Unexpected(Value),
}

impl Rules {
    /// The ordered rule sequence, decoding the string form if needed.
    pub fn coerce(&self) -> Result<Vec<Value>, PolicyError> {
        match self {
            Rules::Structured(rules) => Ok(rules.clone()),
            Rules::Encoded(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(Value::Array(rules)) => Ok(rules),
                Ok(other) => Err(PolicyError::MalformedRules(format!(
                    "decoded to {}",
                    json_kind(&other)
                ))),
                Err(e) => Err(PolicyError::MalformedRules(e.to_string())),
            },
            Rules::Unexpected(other) => Err(PolicyError::MalformedRules(format!(
                "got {}",
                json_kind(other)
            ))),
        }
    }
}

/// Typed view of one rule, for compact listings.
///
/// The policy store accepts `tool` as an alias for `tool_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default, alias = "tool")]
    pub tool_id: Option<String>,
    #[serde(default)]
    pub effect: Option<String>,
    #[serde(default)]
    pub conditions: Map<String, Value>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl Rule {
    /// `[reader] mcp:read_logs -> ALLOW (Reader access to logs)`
    pub fn one_line(&self) -> String {
        let mut line = format!(
            "[{}] {} -> {}",
            self.roles.join(","),
            self.tool_id.as_deref().unwrap_or("*"),
            self.effect.as_deref().unwrap_or("BLOCK"),
        );
        if !self.conditions.is_empty() {
            line.push_str(&format!(" if {}", Value::Object(self.conditions.clone())));
        }
        if let Some(reason) = &self.reason {
            line.push_str(&format!(" ({})", reason));
        }
        line
    }
}

/// A stored policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default)]
    pub name: Option<String>,

    /// Usually a semver string, occasionally a number in hand-written docs.
    #[serde(default)]
    pub version: Option<Value>,

    #[serde(default)]
    pub rules: Option<Rules>,

    #[serde(default)]
    pub created_at: Option<String>,

    /// Columns the dashboard does not interpret (id, created_by, ...),
    /// kept so the JSON view shows the full record.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Policy {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Untitled")
    }

    pub fn version_label(&self) -> String {
        match &self.version {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Null) | None => "N/A".to_string(),
            Some(Value::String(_)) => "N/A".to_string(),
            Some(other) => other.to_string(),
        }
    }

    /// Number of rules, 0 when they cannot be coerced to a sequence.
    pub fn rule_count(&self) -> usize {
        self.rules
            .as_ref()
            .and_then(|r| r.coerce().ok())
            .map_or(0, |r| r.len())
    }

    /// Typed rules, skipping entries that are not rule objects.
    pub fn typed_rules(&self) -> Vec<Rule> {
        self.rules
            .as_ref()
            .and_then(|r| r.coerce().ok())
            .unwrap_or_default()
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect()
    }

    /// Pretty JSON of the whole policy with `rules` decoded.
    ///
    /// Missing or empty rules show as "No rules". Rules that cannot be
    /// decoded are shown exactly as received.
    pub fn display_json(&self) -> String {
        let rules = match &self.rules {
            None => Value::String(NO_RULES.to_string()),
            Some(rules) => match rules.coerce() {
                Ok(list) if list.is_empty() => Value::String(NO_RULES.to_string()),
                Ok(list) => Value::Array(list),
                Err(e) => {
                    tracing::warn!(policy = self.display_name(), "cannot decode policy rules: {}", e);
                    match rules {
                        Rules::Encoded(raw) => Value::String(raw.clone()),
                        Rules::Structured(list) => Value::Array(list.clone()),
                        Rules::Unexpected(v) => v.clone(),
                    }
                }
            },
        };

        let mut doc = self.extra.clone();
        doc.insert(
            "name".to_string(),
            self.name.clone().map_or(Value::Null, Value::String),
        );
        doc.insert(
            "version".to_string(),
            self.version.clone().unwrap_or(Value::Null),
        );
        doc.insert("rules".to_string(), rules);
        doc.insert(
            "created_at".to_string(),
            self.created_at.clone().map_or(Value::Null, Value::String),
        );

        serde_json::to_string_pretty(&Value::Object(doc))
            .unwrap_or_else(|_| "Error displaying policy JSON".to_string())
    }

    /// Case-insensitive search over name and version (policy list search box).
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty()
            || self.display_name().to_lowercase().contains(&term)
            || self.version_label().to_lowercase().contains(&term)
    }
}

/// Validate operator-supplied policy JSON before it is posted.
///
/// Objects pass through unchanged (a full document or a `{rules: [...]}`
/// wrapper). A bare array is treated as a rule list and wrapped.
pub fn parse_policy_document(text: &str) -> Result<Value, PolicyError> {
    let value: Value = serde_json::from_str(text).map_err(|source| PolicyError::InvalidJson {
        field: "policy",
        source,
    })?;
    match value {
        Value::Object(_) => Ok(value),
        Value::Array(rules) => {
            let mut doc = Map::new();
            doc.insert("rules".to_string(), Value::Array(rules));
            Ok(Value::Object(doc))
        }
        other => Err(PolicyError::NotADocument(json_kind(&other))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
