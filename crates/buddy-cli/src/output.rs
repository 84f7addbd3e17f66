use colored::Colorize;

use buddy_core::models::{DeploymentSummary, ResolvedContainerDefinition, ServiceDeploymentState};
use buddy_core::services::orchestrator::DeployProgress;

pub fn echo_step(message: &str) {
    println!("{}", message.green().bold());
}

pub fn echo_action(message: &str) {
    println!("{}", message.yellow().bold());
}

pub fn echo_error(message: &str) {
    println!("{}", message.red().bold());
}

pub fn render_definitions(
    containers: &[ResolvedContainerDefinition],
) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(containers)
}

/// One line per in-flight deployment: task definition, status, running tasks.
pub fn render_deployments(deployments: &[DeploymentSummary]) -> String {
    let mut lines = vec!["Wait: deployment in progress".to_string()];
    lines.extend(deployments.iter().map(|d| {
        format!(
            "{} - {} - running: {}",
            d.task_definition, d.status, d.running_count
        )
    }));
    lines.join("\n")
}

pub fn render_state(state: &ServiceDeploymentState) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(state)
}

pub fn print_progress(event: &DeployProgress) {
    match event {
        DeployProgress::Registering { .. } => echo_action("Register task..."),
        DeployProgress::Registered {
            task_definition_arn,
        } => echo_step(&format!("Registered task: {task_definition_arn}")),
        DeployProgress::Updating { service } => echo_action(&format!("Updating service {service}")),
        DeployProgress::Updated => echo_step("Updated"),
        DeployProgress::Waiting { timeout } => echo_step(&format!(
            "Waiting for deployment to complete ({}s)",
            timeout.as_secs()
        )),
        DeployProgress::Tick { deployments, .. } => {
            println!();
            println!("{}", render_deployments(deployments));
        }
        DeployProgress::FinalState(state) => {
            println!("Final state:");
            match render_state(state) {
                Ok(yaml) => print!("{yaml}"),
                Err(e) => tracing::warn!(error = %e, "final_state_render_failed"),
            }
        }
    }
}
