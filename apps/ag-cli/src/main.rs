//! # ag-cli
//!
//! Terminal dashboard for the AgentGuard policy-enforcement service.
//!
//! - `agentguard overview` - stats, agents, tools and the filtered audit table
//! - `agentguard watch` - the same view, auto-refreshed
//! - `agentguard agent <id>` - one agent's recent activity
//! - `agentguard tools` / `anomalies` / `presets` - single panels
//! - `agentguard policies list/show/apply` - inspect and post policies
//! - `agentguard simulate` - send a simulated enforcement request
//! - `agentguard generate-policy` - draft a policy from a description
//!
//! Tables go to stdout; logs go to stderr.

mod commands;
mod render;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ag_dashboard::DashboardConfig;
use commands::Context;

/// AgentGuard dashboard: audit, agents, tools and policies in the terminal.
#[derive(Parser)]
#[command(name = "agentguard", version, about)]
struct Cli {
    /// Project root directory (defaults to current directory).
    #[arg(long, default_value = ".")]
    project_root: PathBuf,

    /// Config file (defaults to <project-root>/.agentguard/dashboard.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Backend base URL, overriding the config file.
    #[arg(long, env = "AGENTGUARD_URL")]
    base_url: Option<String>,

    /// Debug-level logging on stderr.
    #[arg(long, short)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Overview stats, agent and tool panels, and the audit table.
    Overview {
        #[command(flatten)]
        view: commands::overview::ViewArgs,
    },
    /// Auto-refreshing overview. Stop with Ctrl-C.
    Watch {
        #[command(flatten)]
        view: commands::overview::ViewArgs,
        /// Refresh period in seconds (defaults to [refresh] interval_secs).
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Recent activity for one agent.
    Agent {
        agent_id: String,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Tool registry with call counts and signature health.
    Tools {
        #[arg(long)]
        json: bool,
    },
    /// Inspect and apply policies.
    Policies {
        #[command(subcommand)]
        command: commands::policies::PolicyCommands,
    },
    /// Anomalies reported by the detector.
    Anomalies {
        #[arg(long)]
        json: bool,
    },
    /// Send a simulated enforcement request.
    Simulate(commands::simulate::SimulateArgs),
    /// Generate a policy from a natural-language description.
    GeneratePolicy(commands::generate::GenerateArgs),
    /// Most active agents and tools, for filling in `simulate`.
    Presets {
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let project_root = cli
        .project_root
        .canonicalize()
        .unwrap_or_else(|_| cli.project_root.clone());
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| DashboardConfig::path_in(&project_root));

    let mut config = DashboardConfig::load_or_default(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url.clone());
    }
    tracing::debug!(backend = %config.backend.base_url, "using backend");

    let ctx = Context::new(config)?;

    match &cli.command {
        Commands::Overview { view } => commands::overview::execute(&ctx, view).await,
        Commands::Watch { view, interval } => commands::watch::execute(&ctx, view, *interval).await,
        Commands::Agent { agent_id, json } => commands::agent::execute(&ctx, agent_id, *json).await,
        Commands::Tools { json } => commands::tools::execute(&ctx, *json).await,
        Commands::Policies { command } => commands::policies::execute(&ctx, command).await,
        Commands::Anomalies { json } => commands::anomalies::execute(&ctx, *json).await,
        Commands::Simulate(args) => commands::simulate::execute(&ctx, args).await,
        Commands::GeneratePolicy(args) => commands::generate::execute(&ctx, args).await,
        Commands::Presets { json } => commands::presets::execute(&ctx, *json).await,
    }
}

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let level = if verbose { "debug" } else { "warn" };
    // Logs go to stderr so they don't interfere with tables and JSON on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("ag_client={}", level).parse()?)
                .add_directive(format!("ag_dashboard={}", level).parse()?)
                .add_directive(format!("ag_audit={}", level).parse()?)
                .add_directive(format!("ag_policy={}", level).parse()?)
                .add_directive(format!("agentguard={}", level).parse()?),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
    Ok(())
}
