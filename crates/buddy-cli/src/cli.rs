use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bcluster")]
#[command(about = "Deploy task definitions to ECS services")]
#[command(version)]
pub struct Cli {
    /// AWS region (falls back to the SDK's default region chain)
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Named AWS profile
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// Write debug logs to .bcluster-debug.log
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register a task definition, update the service and wait for the rollout
    Deploy(DeployArgs),

    /// Show the current state of a target's service
    Status(StatusArgs),
}

#[derive(Args)]
pub struct DeployArgs {
    /// Deployment descriptor (YAML)
    pub app_config_file: PathBuf,

    /// Target name in the descriptor
    pub target_name: String,

    /// Image used by containers that do not pin one
    pub image: String,

    /// Build revision, used as the log stream prefix and as $build_rev
    pub build_rev: String,

    /// Resolve and print the container definitions, then stop
    #[arg(long)]
    pub dry_run: bool,

    /// Seconds to wait for the rollout
    #[arg(long, default_value = "300")]
    pub timeout: u64,

    /// Seconds between two polls of the service
    #[arg(long, default_value = "5")]
    pub interval: u64,

    /// Retries for a failed service poll (default: fail immediately)
    #[arg(long, default_value = "0")]
    pub poll_retries: u32,

    /// Service events shown in the final state
    #[arg(long, default_value = "15")]
    pub events: usize,
}

#[derive(Args)]
pub struct StatusArgs {
    /// Deployment descriptor (YAML)
    pub app_config_file: PathBuf,

    /// Target name in the descriptor
    pub target_name: String,

    /// Service events shown
    #[arg(long, default_value = "15")]
    pub events: usize,
}
