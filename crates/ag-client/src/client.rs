// client.rs - Backend API client.
//
// One best-effort request per call, no retries. Transport failures are
// `ClientError`s; anything the backend answered is a `Reply`.

use std::time::Duration;

use ag_audit::AuditLogEntry;
use ag_policy::{Anomaly, EnforceRequest, EnforceResponse, GenerateRequest, Policy, ToolRecord};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::ClientError;
use crate::reply::{classify, BackendFailure, PolicyCreated, Reply};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5073";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the enforcement backend's HTTP API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let parsed = Url::parse(trimmed).map_err(|e| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ClientError::Build)?;

        Ok(Self {
            http,
            base_url: trimmed.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /audit`
    pub async fn fetch_audit(&self) -> Result<Reply<Vec<AuditLogEntry>>, ClientError> {
        self.get_list("/audit").await
    }

    /// `GET /tools`
    pub async fn fetch_tools(&self) -> Result<Reply<Vec<ToolRecord>>, ClientError> {
        self.get_list("/tools").await
    }

    /// `GET /policies`
    pub async fn fetch_policies(&self) -> Result<Reply<Vec<Policy>>, ClientError> {
        self.get_list("/policies").await
    }

    /// `GET /anomalies`
    pub async fn fetch_anomalies(&self) -> Result<Reply<Vec<Anomaly>>, ClientError> {
        self.get_list("/anomalies").await
    }

    /// `POST /enforce`
    ///
    /// The engine answers an unknown tool with a 404 that still carries a
    /// BLOCK decision; such replies are returned as `Reply::Ok`.
    pub async fn enforce(
        &self,
        request: &EnforceRequest,
    ) -> Result<Reply<EnforceResponse>, ClientError> {
        let url = self.url("/enforce");
        match self.post_json(&url, request).await? {
            Reply::Ok(body) => decode(&url, body).map(Reply::Ok),
            Reply::Failed(failure) => Ok(decision_in_failure(failure)),
        }
    }

    /// `POST /policies` with an already-validated policy document.
    pub async fn apply_policy(&self, document: &Value) -> Result<Reply<PolicyCreated>, ClientError> {
        let url = self.url("/policies");
        match self.post_json(&url, document).await? {
            Reply::Ok(body) => decode(&url, body).map(Reply::Ok),
            Reply::Failed(failure) => Ok(Reply::Failed(failure)),
        }
    }

    /// `POST /generate_policy`, returning the generated policy document.
    pub async fn generate_policy(
        &self,
        request: &GenerateRequest,
    ) -> Result<Reply<Value>, ClientError> {
        let url = self.url("/generate_policy");
        let reply = self.post_json(&url, request).await?;
        Ok(match reply {
            Reply::Ok(mut body) => match body.get_mut("policy").map(Value::take) {
                Some(policy) if !policy.is_null() => Reply::Ok(policy),
                _ => {
                    let mut failure = BackendFailure::new(200, body);
                    failure.error = "response carried no policy".to_string();
                    Reply::Failed(failure)
                }
            },
            failed => failed,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Reply<Vec<T>>, ClientError> {
        let url = self.url(path);
        tracing::debug!(%url, "GET");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| transport(&url, source))?;
        match self.read(&url, response).await? {
            Reply::Ok(body) => decode(&url, body).map(Reply::Ok),
            Reply::Failed(failure) => Ok(Reply::Failed(failure)),
        }
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<Reply<Value>, ClientError> {
        tracing::debug!(%url, "POST");
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|source| transport(url, source))?;
        self.read(url, response).await
    }

    async fn read(&self, url: &str, response: reqwest::Response) -> Result<Reply<Value>, ClientError> {
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|source| transport(url, source))?;
        let reply = classify(status, &text).map_err(|source| ClientError::Decode {
            url: url.to_string(),
            source,
        })?;
        if let Reply::Failed(failure) = &reply {
            tracing::info!(%url, status, error = %failure.error, "backend reported failure");
        }
        Ok(reply)
    }
}

fn transport(url: &str, source: reqwest::Error) -> ClientError {
    tracing::warn!(%url, "request failed: {}", source);
    ClientError::Transport {
        url: url.to_string(),
        source,
    }
}

fn decode<T: DeserializeOwned>(url: &str, body: Value) -> Result<T, ClientError> {
    serde_json::from_value(body).map_err(|source| ClientError::Decode {
        url: url.to_string(),
        source,
    })
}

fn decision_in_failure(failure: BackendFailure) -> Reply<EnforceResponse> {
    if failure.body.get("decision").is_some_and(Value::is_string) {
        if let Ok(response) = serde_json::from_value::<EnforceResponse>(failure.body.clone()) {
            return Reply::Ok(response);
        }
    }
    Reply::Failed(failure)
}
