use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use buddy_core::models::{DeploymentContext, DeploymentTarget, ResolvedContainerDefinition};
use buddy_core::services::config_loader;
use buddy_core::services::ecs::{to_container_definition, EcsApi};
use buddy_core::services::orchestrator::{DeploySettings, Orchestrator};
use buddy_core::Result;

use crate::output;

/// Everything the deploy command needs, already parsed from the command line.
#[derive(Debug, Clone)]
pub struct DeployRequest {
    pub config_path: PathBuf,
    pub target_name: String,
    pub image: String,
    pub build_rev: String,
    pub aws_region: String,
    pub dry_run: bool,
}

/// The target plus its fully resolved container definitions.
#[derive(Debug, Clone)]
pub struct PreparedDeploy {
    pub target: DeploymentTarget,
    pub containers: Vec<ResolvedContainerDefinition>,
}

/// Load the descriptor and resolve the target's containers. Nothing is sent to ECS.
pub fn prepare(request: &DeployRequest) -> Result<PreparedDeploy> {
    let descriptor = config_loader::load(&request.config_path)?;
    let target = DeploymentTarget::load(&descriptor, &request.target_name)?;
    let context = DeploymentContext::new(
        target.task_name.as_str(),
        request.aws_region.as_str(),
        request.build_rev.as_str(),
    );
    let containers = target.task_containers(&request.image, &context)?;
    for container in &containers {
        to_container_definition(container)?;
    }
    Ok(PreparedDeploy { target, containers })
}

/// Resolve, print and (unless dry-running) roll out the definitions.
/// Returns the active task definition ARN after a successful rollout.
pub async fn deploy<C: EcsApi>(
    client: &C,
    request: &DeployRequest,
    settings: DeploySettings,
) -> Result<Option<String>> {
    let prepared = prepare(request)?;

    println!("Definition:");
    print!("{}", output::render_definitions(&prepared.containers)?);

    if request.dry_run {
        output::echo_error("Dry-run!");
        return Ok(None);
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            output::print_progress(&event);
        }
    });

    let report = {
        let mut orchestrator =
            Orchestrator::new(client, &prepared.target, settings).with_progress(tx);
        orchestrator.deploy(&prepared.containers).await
    };
    join_printer(printer).await;

    let arn = report?.outcome.into_result()?;
    output::echo_step("Success");
    Ok(Some(arn))
}

/// Wait for the progress printer to drain. A failed printer never fails the deployment.
async fn join_printer(printer: JoinHandle<()>) {
    if let Err(e) = printer.await {
        tracing::warn!(error = %e, "progress_printer_failed");
    }
}

/// Print the live state of the target's service.
pub async fn status<C: EcsApi>(
    client: &C,
    config_path: &Path,
    target_name: &str,
    event_limit: usize,
) -> Result<()> {
    let descriptor = config_loader::load(config_path)?;
    let target = DeploymentTarget::load(&descriptor, target_name)?;
    let state = client
        .describe_service(&target.cluster_name, &target.service_name)
        .await?
        .with_recent_events(event_limit);

    output::echo_step(&format!(
        "{} / {}: {} running, {} desired",
        target.cluster_name, target.service_name, state.running_count, state.desired_count
    ));
    if !state.is_converged() {
        println!("{}", output::render_deployments(&state.deployments));
    }
    print!("{}", output::render_state(&state)?);
    Ok(())
}
