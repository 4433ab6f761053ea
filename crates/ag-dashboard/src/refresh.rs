// refresh.rs - Fetching snapshots from the backend.
//
// A fetch never fails outright: transport errors, backend failures and
// undecodable bodies all become a `Completion` carrying a message, which
// AppState turns into a load notice for that resource alone.

use ag_client::{ApiClient, Reply};
use chrono::Utc;
use tokio::sync::mpsc;

use crate::sequence::{Resource, Ticket};
use crate::state::AppState;
use crate::store::Payload;

/// A finished fetch, tagged with the ticket it was issued.
#[derive(Debug, Clone)]
pub struct Completion {
    pub ticket: Ticket,
    pub result: Result<Payload, String>,
}

impl Completion {
    pub fn loaded(ticket: Ticket, payload: Payload) -> Self {
        Self {
            ticket,
            result: Ok(payload),
        }
    }

    pub fn failed(ticket: Ticket, message: impl Into<String>) -> Self {
        Self {
            ticket,
            result: Err(message.into()),
        }
    }
}

/// Fetch one resource.
pub async fn fetch(client: &ApiClient, ticket: Ticket) -> Completion {
    let outcome = match ticket.resource {
        Resource::Audit => client.fetch_audit().await.map(|r| r.map(Payload::Audit)),
        Resource::Tools => client.fetch_tools().await.map(|r| r.map(Payload::Tools)),
        Resource::Policies => client.fetch_policies().await.map(|r| r.map(Payload::Policies)),
        Resource::Anomalies => client.fetch_anomalies().await.map(|r| r.map(Payload::Anomalies)),
    };
    match outcome {
        Ok(Reply::Ok(payload)) => Completion::loaded(ticket, payload),
        Ok(Reply::Failed(failure)) => Completion::failed(ticket, failure.to_string()),
        Err(e) => Completion::failed(ticket, e.to_string()),
    }
}

/// Fetch every resource in parallel and apply the results.
/// Returns how many completions were applied.
pub async fn refresh_all(client: &ApiClient, state: &mut AppState) -> usize {
    let [audit, tools, policies, anomalies] = Resource::ALL.map(|r| state.begin(r));
    let (a, t, p, n) = tokio::join!(
        fetch(client, audit),
        fetch(client, tools),
        fetch(client, policies),
        fetch(client, anomalies),
    );
    let now = Utc::now();
    let mut applied = 0;
    for completion in [a, t, p, n] {
        if state.apply(completion, now) {
            applied += 1;
        }
    }
    applied
}

/// Fetch the given resources in parallel and apply the results.
pub async fn refresh(client: &ApiClient, state: &mut AppState, resources: &[Resource]) -> usize {
    let (tx, mut rx) = mpsc::channel(resources.len().max(1));
    for &resource in resources {
        spawn_fetch(client.clone(), state.begin(resource), tx.clone());
    }
    drop(tx);

    let mut applied = 0;
    while let Some(completion) = rx.recv().await {
        if state.apply(completion, Utc::now()) {
            applied += 1;
        }
    }
    applied
}

/// Run a fetch on its own task and deliver the completion over `tx`.
/// Completions arrive in whatever order the backend answers.
pub fn spawn_fetch(client: ApiClient, ticket: Ticket, tx: mpsc::Sender<Completion>) {
    tokio::spawn(async move {
        let completion = fetch(&client, ticket).await;
        if tx.send(completion).await.is_err() {
            tracing::debug!(resource = %ticket.resource, "refresh receiver closed");
        }
    });
}
