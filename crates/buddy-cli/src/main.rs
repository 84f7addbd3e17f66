use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::eyre;
use colored::Colorize;

use buddy_cli::cli::{Cli, Commands};
use buddy_cli::commands::{self, DeployRequest};
use buddy_core::services::ecs::{AwsSettings, EcsClient};
use buddy_core::services::orchestrator::{DeploySettings, RetryPolicy};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let _guard = if cli.debug {
        Some(setup_debug_logging())
    } else {
        setup_stderr_logging();
        None
    };

    if let Err(e) = run(cli).await {
        eprintln!("{} {e}", "Error:".red().bold());
        std::process::exit(1);
    }
    Ok(())
}

/// Configure file-based tracing to `.bcluster-debug.log` in CWD.
/// Returns the guard that must be held alive for the duration of the program.
fn setup_debug_logging() -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::never(".", ".bcluster-debug.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_ansi(false)
        .init();

    guard
}

fn setup_stderr_logging() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();
}

async fn run(cli: Cli) -> color_eyre::Result<()> {
    let aws = AwsSettings {
        region: cli.region,
        profile: cli.profile,
    };
    let client = EcsClient::connect(&aws).await;

    match cli.command {
        Commands::Deploy(args) => {
            let aws_region = client
                .region()
                .ok_or_else(|| eyre!("no AWS region configured, pass --region or set AWS_REGION"))?
                .to_string();
            let request = DeployRequest {
                config_path: args.app_config_file,
                target_name: args.target_name,
                image: args.image,
                build_rev: args.build_rev,
                aws_region,
                dry_run: args.dry_run,
            };
            let settings = DeploySettings {
                timeout: Duration::from_secs(args.timeout),
                interval: Duration::from_secs(args.interval),
                event_limit: args.events,
                retry: RetryPolicy {
                    max_retries: args.poll_retries,
                    backoff: Duration::from_secs(args.interval),
                },
            };
            commands::deploy(&client, &request, settings).await?;
        }
        Commands::Status(args) => {
            commands::status(&client, &args.app_config_file, &args.target_name, args.events)
                .await?;
        }
    }
    Ok(())
}
