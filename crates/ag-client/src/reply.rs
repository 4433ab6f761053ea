// reply.rs - Structured backend replies.
//
// Every endpoint answers with best-effort JSON. A reply is `Failed` when the
// HTTP status is not 2xx, or when a 2xx body reports an application error
// itself (`{"status": "error"}` or a numeric `status >= 400`). Failures keep
// the raw body so the operator sees exactly what the backend said.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A backend-reported failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendFailure {
    /// HTTP status of the reply.
    pub status: u16,
    /// The operator-facing message: the body's `error`, else its `detail`,
    /// else the whole body as JSON.
    pub error: String,
    /// Parsed body, or `{"error": "HTTP n", "body": "<text>"}` when the body
    /// was not JSON.
    pub body: Value,
}

impl BackendFailure {
    pub fn new(status: u16, body: Value) -> Self {
        let error = failure_message(&body);
        Self {
            status,
            error,
            body,
        }
    }

    /// Wrap a body that did not parse as JSON.
    pub fn from_text(status: u16, text: &str) -> Self {
        Self::new(status, json!({ "error": format!("HTTP {}", status), "body": text }))
    }
}

impl std::fmt::Display for BackendFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "backend returned {}: {}", self.status, self.error)
    }
}

/// Outcome of a request that reached the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply<T> {
    Ok(T),
    Failed(BackendFailure),
}

impl<T> Reply<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Reply::Ok(_))
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Reply::Ok(value) => Some(value),
            Reply::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&BackendFailure> {
        match self {
            Reply::Ok(_) => None,
            Reply::Failed(failure) => Some(failure),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reply<U> {
        match self {
            Reply::Ok(value) => Reply::Ok(f(value)),
            Reply::Failed(failure) => Reply::Failed(failure),
        }
    }
}

/// Body of a successful `POST /policies`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyCreated {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub version: Option<Value>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Classify a raw reply. `Err(text)` means a 2xx body that is not JSON.
pub(crate) fn classify(status: u16, text: &str) -> Result<Reply<Value>, serde_json::Error> {
    let success = (200..300).contains(&status);
    let parsed = serde_json::from_str::<Value>(text);

    if !success {
        let failure = match parsed {
            Ok(body) => BackendFailure::new(status, body),
            Err(_) => BackendFailure::from_text(status, text),
        };
        return Ok(Reply::Failed(failure));
    }

    let body = parsed?;
    if reports_error(&body) {
        return Ok(Reply::Failed(BackendFailure::new(status, body)));
    }
    Ok(Reply::Ok(body))
}

fn reports_error(body: &Value) -> bool {
    match body.get("status") {
        Some(Value::String(s)) => s.eq_ignore_ascii_case("error"),
        Some(Value::Number(n)) => n.as_u64().is_some_and(|code| code >= 400),
        _ => false,
    }
}

fn failure_message(body: &Value) -> String {
    for key in ["error", "detail"] {
        match body.get(key) {
            Some(Value::String(s)) if !s.is_empty() => return s.clone(),
            Some(Value::Null) | None => {}
            Some(Value::String(_)) => {}
            Some(other) => return other.to_string(),
        }
    }
    body.to_string()
}
