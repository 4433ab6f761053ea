// http_contract.rs - ApiClient against an in-process fake backend.

use std::net::SocketAddr;
use std::time::Duration;

use ag_client::{ApiClient, ClientError, Reply};
use ag_policy::{EnforceRequest, GenerateRequest, SimulationForm};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

async fn spawn_backend(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client(addr: SocketAddr) -> ApiClient {
    ApiClient::new(&format!("http://{}", addr), Duration::from_secs(5)).unwrap()
}

fn backend() -> Router {
    Router::new()
        .route(
            "/audit",
            get(|| async {
                Json(json!([
                    {"id": 1, "agent_id": "a1", "tool_id": "mcp:read_logs", "decision": "allow",
                     "roles": "reader,auditor", "created_at": "2024-05-01T12:00:00"},
                    {"id": 2, "agent_id": "a2", "tool_id": "read_logs", "decision": "DENY",
                     "reason": "no_matching_rule"}
                ]))
            }),
        )
        .route(
            "/tools",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "database is locked") }),
        )
        .route(
            "/policies",
            get(|| async {
                Json(json!([
                    {"id": 3, "name": "demo", "version": "1.0.0",
                     "rules": "[{\"roles\": [\"reader\"], \"tool_id\": \"mcp:read_logs\", \"effect\": \"ALLOW\"}]",
                     "created_at": "2024-05-01T11:00:00"}
                ]))
            })
            .post(|Json(doc): Json<Value>| async move {
                if doc.get("rules").is_some() {
                    (
                        StatusCode::OK,
                        Json(json!({"status": "created", "version": "1.0.1",
                                    "created_at": "2024-05-01T12:30:00"})),
                    )
                } else {
                    (
                        StatusCode::BAD_REQUEST,
                        Json(json!({"status": "error", "detail": "policy has no rules"})),
                    )
                }
            }),
        )
        .route(
            "/anomalies",
            get(|| async { Json(json!({"unexpected": "object"})) }),
        )
        .route(
            "/enforce",
            post(|Json(req): Json<Value>| async move {
                if req["tool_id"] == "mcp:read_logs" {
                    (
                        StatusCode::OK,
                        Json(json!({"decision": "ALLOW", "reason": "rule matched",
                                    "policy_version": "1.0.0",
                                    "request_id": req["request_id"].clone()})),
                    )
                } else {
                    (
                        StatusCode::NOT_FOUND,
                        Json(json!({"decision": "BLOCK", "reason": "tool_not_found"})),
                    )
                }
            }),
        )
        .route(
            "/generate_policy",
            post(|Json(req): Json<Value>| async move {
                if req["model"] == "broken" {
                    Json(json!({"status": "error", "error": "model unavailable"}))
                } else {
                    Json(json!({"status": "ok", "policy": {"name": "generated", "rules": []}}))
                }
            }),
        )
}

#[tokio::test]
async fn audit_entries_decode() {
    let addr = spawn_backend(backend()).await;
    let entries = client(addr).fetch_audit().await.unwrap().ok().unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries[0].decision.is_allow());
    assert_eq!(entries[0].role_names(), vec!["reader", "auditor"]);
    assert!(entries[1].decision.is_blocking());
}

#[tokio::test]
async fn non_json_error_reply_is_structured() {
    let addr = spawn_backend(backend()).await;
    let reply = client(addr).fetch_tools().await.unwrap();
    let failure = reply.failure().unwrap();
    assert_eq!(failure.status, 500);
    assert_eq!(failure.error, "HTTP 500");
    assert_eq!(failure.body["body"], "database is locked");
}

#[tokio::test]
async fn encoded_policy_rules_survive_the_trip() {
    let addr = spawn_backend(backend()).await;
    let policies = client(addr).fetch_policies().await.unwrap().ok().unwrap();
    assert_eq!(policies[0].rule_count(), 1);
    assert_eq!(policies[0].extra.get("id"), Some(&json!(3)));
}

#[tokio::test]
async fn wrong_shape_is_a_decode_error() {
    let addr = spawn_backend(backend()).await;
    let err = client(addr).fetch_anomalies().await.unwrap_err();
    assert!(matches!(err, ClientError::Decode { .. }));
}

#[tokio::test]
async fn enforce_reports_verdicts() {
    let addr = spawn_backend(backend()).await;
    let api = client(addr);

    let form = SimulationForm {
        agent_id: "a1".into(),
        agent_roles: "reader".into(),
        tool_id: "mcp:read_logs".into(),
        ..SimulationForm::default()
    };
    let request = EnforceRequest::from_form(&form).unwrap();
    let response = api.enforce(&request).await.unwrap().ok().unwrap();
    assert_eq!(response.verdict(), "ALLOWED");
    assert_eq!(response.extra["request_id"], json!(request.request_id));

    let form = SimulationForm {
        tool_id: "mcp:unknown".into(),
        ..form
    };
    let request = EnforceRequest::from_form(&form).unwrap();
    let response = api.enforce(&request).await.unwrap().ok().unwrap();
    assert_eq!(response.verdict(), "BLOCKED - tool_not_found");
}

#[tokio::test]
async fn apply_policy_surfaces_detail() {
    let addr = spawn_backend(backend()).await;
    let api = client(addr);

    let created = api
        .apply_policy(&json!({"name": "p", "rules": []}))
        .await
        .unwrap()
        .ok()
        .unwrap();
    assert_eq!(created.version, Some(json!("1.0.1")));

    let reply = api.apply_policy(&json!({"name": "p"})).await.unwrap();
    assert_eq!(reply.failure().unwrap().error, "policy has no rules");
}

#[tokio::test]
async fn generate_policy_error_status_in_ok_reply() {
    let addr = spawn_backend(backend()).await;
    let api = client(addr);

    let ok = api
        .generate_policy(&GenerateRequest::new("readers can read logs", "m").unwrap())
        .await
        .unwrap();
    assert_eq!(ok, Reply::Ok(json!({"name": "generated", "rules": []})));

    let failed = api
        .generate_policy(&GenerateRequest::new("readers can read logs", "broken").unwrap())
        .await
        .unwrap();
    assert_eq!(failed.failure().unwrap().error, "model unavailable");
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(addr).fetch_audit().await.unwrap_err();
    assert!(matches!(err, ClientError::Transport { .. }));
}
