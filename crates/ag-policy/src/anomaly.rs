// anomaly.rs - Detector output from `GET /anomalies`.
//
// The detector writes `detail` as a JSON-encoded string
// (e.g. `{"blocks_last_minute": 4}`); nothing beyond agent_id, detail and
// created_at is assumed.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub detail: Option<Value>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Anomaly {
    pub fn agent_label(&self) -> &str {
        self.agent_id
            .as_deref()
            .filter(|a| !a.is_empty())
            .unwrap_or("?")
    }

    /// The detail text, or the whole anomaly as JSON when there is none.
    pub fn detail_text(&self) -> String {
        match &self.detail {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Null) | None | Some(Value::String(_)) => {
                serde_json::to_string(self).unwrap_or_default()
            }
            Some(other) => other.to_string(),
        }
    }
}
