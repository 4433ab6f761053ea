// tool.rs - Tool registry entries and their derived panel rows.
//
// `GET /tools` returns the registry as-is; call counts are not part of it.
// ToolSummary joins each registry entry with the call counts aggregated
// from the audit snapshot.

use std::sync::OnceLock;

use ag_audit::{ToolNamespace, ToolUsage};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A registry entry from `GET /tools`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub version: Option<String>,
    /// Hex digest the registry signed the tool manifest with.
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Parameter schema; used to prefill simulator params.
    #[serde(default)]
    pub input_schema: Option<Value>,
}

impl ToolRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }
}

/// Heuristic validity of a recorded tool signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SigHealth {
    /// At least 32 hex digits, nothing else.
    Ok,
    Missing,
}

impl SigHealth {
    pub fn of(signature: Option<&str>) -> Self {
        static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
        let pattern = PATTERN.get_or_init(|| Regex::new(r"(?i)^[0-9a-f]{32,}$").ok());
        match (signature, pattern) {
            (Some(sig), Some(re)) if re.is_match(sig) => SigHealth::Ok,
            _ => SigHealth::Missing,
        }
    }
}

/// A tool panel row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSummary {
    pub id: String,
    pub version: Option<String>,
    pub signature: Option<String>,
    pub description: Option<String>,
    pub input_schema: Option<Value>,
    /// Audit entries recorded for this tool under either id spelling.
    pub call_count: u64,
    pub sig_health: SigHealth,
}

impl ToolSummary {
    /// Join registry entries with aggregated call counts, keeping registry order.
    pub fn summarize(
        tools: &[ToolRecord],
        usage: &ToolUsage,
        namespace: &ToolNamespace,
    ) -> Vec<ToolSummary> {
        tools
            .iter()
            .map(|tool| ToolSummary {
                id: tool.id.clone(),
                version: tool.version.clone(),
                signature: tool.signature.clone(),
                description: tool.description.clone(),
                input_schema: tool.input_schema.clone(),
                call_count: usage.calls_for(&tool.id, namespace),
                sig_health: SigHealth::of(tool.signature.as_deref()),
            })
            .collect()
    }

    pub fn version_label(&self) -> &str {
        self.version.as_deref().unwrap_or("N/A")
    }

    pub fn description_label(&self) -> &str {
        self.description
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or("No description")
    }

    /// First 8 characters of the signature, or "No signature".
    pub fn short_signature(&self) -> String {
        match self.signature.as_deref().filter(|s| !s.is_empty()) {
            Some(sig) => format!("{}...", sig.chars().take(8).collect::<String>()),
            None => "No signature".to_string(),
        }
    }
}
