// CLI for identity helpers and scripted lifecycle runs

use anyhow::Context;
use clap::{Parser, Subcommand};
use rolmanager_cli::commands::{ids, scenario};
use rolmanager_core::RuntimeConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rolmanager")]
#[command(about = "RolManager - role-gated, time-delayed operation scheduling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Runtime config file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the identifier of a role
    RoleId {
        /// Well-known role (admin, proposer, executor, canceler) or any role name
        name: String,
    },

    /// Print the identity of an operation
    OperationId {
        /// Call target, label or 0x address (repeat for batches)
        #[arg(short, long, required = true)]
        target: Vec<String>,

        /// Call payload, text or 0x hex (one per target)
        #[arg(short, long, required = true)]
        payload: Vec<String>,

        /// Predecessor operation id
        #[arg(long)]
        predecessor: Option<String>,

        /// Salt
        #[arg(short, long, default_value = "0")]
        salt: u64,

        /// Hash as a batch
        #[arg(short, long)]
        batch: bool,
    },

    /// Run a scenario file against a simulated clock
    Run {
        /// Scenario file path
        path: PathBuf,
    },
}

fn load_runtime_config(path: Option<&PathBuf>) -> anyhow::Result<RuntimeConfig> {
    let mut config = match path {
        Some(path) => RuntimeConfig::load_from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => RuntimeConfig::default(),
    };
    config.merge_with_env()?;
    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let runtime = load_runtime_config(cli.config.as_ref())?;

    // Initialize tracing
    let log_level = if cli.verbose {
        "debug"
    } else {
        runtime.log_filter.as_str()
    };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    match cli.command {
        Commands::RoleId { name } => ids::handle_role_id(&name)?,
        Commands::OperationId {
            target,
            payload,
            predecessor,
            salt,
            batch,
        } => ids::handle_operation_id(&target, &payload, predecessor.as_deref(), salt, batch)?,
        Commands::Run { path } => scenario::handle_run(&path, &runtime)?,
    }

    Ok(())
}
