// policies.rs - Policy subcommands: list, show, apply.

use std::io::Read;
use std::path::{Path, PathBuf};

use ag_client::Reply;
use ag_dashboard::Resource;
use ag_policy::{parse_policy_document, Policy};
use clap::Subcommand;
use serde_json::Value;

use super::Context;
use crate::render;

#[derive(Subcommand)]
pub enum PolicyCommands {
    /// List stored policies.
    List {
        /// Filter by name or version (case-insensitive).
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Show one policy with its rules decoded.
    Show {
        /// Policy name, or its 1-based position in `list`.
        policy: String,
        #[arg(long)]
        json: bool,
    },
    /// Validate a policy document and post it to the backend.
    Apply {
        /// JSON file with a policy object or a bare rules array ("-" for stdin).
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
}

pub async fn execute(ctx: &Context, cmd: &PolicyCommands) -> anyhow::Result<()> {
    match cmd {
        PolicyCommands::List { search, json } => {
            let state = ctx.load(&[Resource::Policies]).await;
            let term = search.as_deref().unwrap_or("");
            let matching: Vec<&Policy> = state
                .store()
                .policies()
                .iter()
                .filter(|p| p.matches_search(term))
                .collect();

            if *json {
                return render::json(&matching);
            }
            render::notices(&state.store().notices());
            render::policies(&matching);
        }

        PolicyCommands::Show { policy, json } => {
            let state = ctx.load(&[Resource::Policies]).await;
            render::notices(&state.store().notices());
            let Some(found) = find_policy(state.store().policies(), policy) else {
                anyhow::bail!("No policy named '{}'", policy);
            };
            if *json {
                return render::json(found);
            }
            render::policy(found);
        }

        PolicyCommands::Apply { file, json } => {
            let text = read_document(file)?;
            // Validated before anything is sent.
            let document = parse_policy_document(&text)?;
            apply_document(ctx, &document, *json).await?;
        }
    }

    Ok(())
}

/// Post a validated document and report the outcome.
pub(crate) async fn apply_document(ctx: &Context, document: &Value, json: bool) -> anyhow::Result<()> {
    match ctx.client.apply_policy(document).await? {
        Reply::Ok(created) => {
            if json {
                return render::json(&created);
            }
            println!(
                "Policy created: version {} at {}",
                value_label(created.version.as_ref()),
                created.created_at.as_deref().unwrap_or("N/A"),
            );
            Ok(())
        }
        Reply::Failed(failure) => {
            if json {
                render::json(&failure)?;
            }
            anyhow::bail!("Policy rejected ({}): {}", failure.status, failure.error)
        }
    }
}

fn value_label(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "N/A".to_string(),
        Some(other) => other.to_string(),
    }
}

fn find_policy<'a>(policies: &'a [Policy], key: &str) -> Option<&'a Policy> {
    policies
        .iter()
        .find(|p| p.name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(key)))
        .or_else(|| {
            key.parse::<usize>()
                .ok()
                .and_then(|i| i.checked_sub(1))
                .and_then(|i| policies.get(i))
        })
}

fn read_document(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))
}
