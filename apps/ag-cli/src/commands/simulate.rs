// simulate.rs - Send a simulated enforcement request.
//
// The request is built and validated locally first; malformed params never
// leave the machine. After a verdict the audit log is re-fetched so the new
// entry shows up.

use ag_client::Reply;
use ag_dashboard::Resource;
use ag_policy::{split_roles, EnforceRequest, SimulationForm};
use chrono::Utc;
use clap::Args;

use super::Context;
use crate::render;

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    /// Agent making the call.
    #[arg(long, required_unless_present = "example")]
    pub agent: Option<String>,

    /// Comma-separated agent roles.
    #[arg(long)]
    pub roles: Option<String>,

    /// Tool being called.
    #[arg(long, required_unless_present = "example")]
    pub tool: Option<String>,

    /// Tool version (defaults to 1.0.0).
    #[arg(long)]
    pub tool_version: Option<String>,

    /// Call parameters as JSON text (defaults to {}).
    #[arg(long)]
    pub params: Option<String>,

    /// Request id (defaults to a random req-xxxxxxx).
    #[arg(long)]
    pub request_id: Option<String>,

    /// Use the example payload for this registry tool instead. --roles,
    /// --tool-version and --request-id still apply on top of it.
    #[arg(long, conflicts_with_all = ["agent", "tool", "params"])]
    pub example: Option<String>,

    /// Print the request without sending it.
    #[arg(long)]
    pub dry_run: bool,

    #[arg(long)]
    pub json: bool,
}

impl SimulateArgs {
    fn form(&self) -> SimulationForm {
        SimulationForm {
            agent_id: self.agent.clone().unwrap_or_default(),
            agent_roles: self.roles.clone().unwrap_or_default(),
            tool_id: self.tool.clone().unwrap_or_default(),
            tool_version: self.tool_version.clone(),
            params: self.params.clone(),
            request_id: self.request_id.clone(),
        }
    }

    /// Apply the operator's explicit fields over an example request.
    fn overlay(&self, mut request: EnforceRequest) -> EnforceRequest {
        if let Some(roles) = &self.roles {
            request.agent_roles = split_roles(roles);
        }
        if let Some(version) = self.tool_version.as_deref().filter(|v| !v.trim().is_empty()) {
            request.tool_version = version.trim().to_string();
        }
        if let Some(id) = self.request_id.as_deref().filter(|v| !v.trim().is_empty()) {
            request.request_id = id.trim().to_string();
        }
        request
    }
}

pub async fn execute(ctx: &Context, args: &SimulateArgs) -> anyhow::Result<()> {
    let request = match &args.example {
        Some(tool_id) => args.overlay(example_request(ctx, tool_id).await?),
        None => EnforceRequest::from_form(&args.form())?,
    };

    if args.dry_run {
        return render::json(&request);
    }

    tracing::debug!(request_id = %request.request_id, tool = %request.tool_id, "simulating");
    let response = match ctx.client.enforce(&request).await? {
        Reply::Ok(response) => response,
        Reply::Failed(failure) => {
            if args.json {
                render::json(&failure)?;
            }
            anyhow::bail!("Enforcement failed ({}): {}", failure.status, failure.error);
        }
    };

    if args.json {
        return render::json(&response);
    }

    println!("{}", response.verdict());
    println!(
        "  request {}  policy {}",
        request.request_id,
        response.policy_version.as_deref().unwrap_or("N/A")
    );
    println!();

    let state = ctx.load(&[Resource::Audit]).await;
    render::notices(&state.store().notices());
    render::drawer(&state.agent_detail(&request.agent_id), Utc::now());
    Ok(())
}

async fn example_request(ctx: &Context, tool_id: &str) -> anyhow::Result<EnforceRequest> {
    let state = ctx.load(&[Resource::Tools]).await;
    if let Some(notice) = state.store().notices().first() {
        anyhow::bail!("{}", notice);
    }
    let namespace = ctx.config.namespace();
    let Some(tool) = state
        .store()
        .tools()
        .iter()
        .find(|t| namespace.same_tool(&t.id, tool_id))
    else {
        anyhow::bail!("Tool '{}' is not in the registry", tool_id);
    };
    Ok(EnforceRequest::example_for(tool))
}
