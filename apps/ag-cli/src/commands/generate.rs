// generate.rs - Draft a policy from a natural-language description.

use ag_client::Reply;
use ag_policy::{parse_policy_document, GenerateRequest};
use clap::Args;

use super::policies::apply_document;
use super::Context;
use crate::render;

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// What the policy should allow or block, in plain language.
    pub description: String,

    /// Generator model (defaults to [generator] default_model).
    #[arg(long)]
    pub model: Option<String>,

    /// Post the generated policy immediately.
    #[arg(long)]
    pub apply: bool,

    #[arg(long)]
    pub json: bool,
}

pub async fn execute(ctx: &Context, args: &GenerateArgs) -> anyhow::Result<()> {
    let model = args
        .model
        .as_deref()
        .unwrap_or(&ctx.config.generator.default_model);
    let request = GenerateRequest::new(&args.description, model)?;

    let policy = match ctx.client.generate_policy(&request).await? {
        Reply::Ok(policy) => policy,
        Reply::Failed(failure) => {
            if args.json {
                render::json(&failure)?;
            }
            anyhow::bail!("Policy generation failed: {}", failure.error);
        }
    };

    render::json(&policy)?;

    if args.apply {
        // Same validation as a hand-written document.
        let document = parse_policy_document(&policy.to_string())?;
        if !args.json {
            println!();
        }
        apply_document(ctx, &document, args.json).await?;
    }
    Ok(())
}
