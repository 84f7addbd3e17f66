use std::time::Duration;

use tokio::sync::mpsc;

use crate::error::{BuddyError, Result};
use crate::models::{
    DeploymentSummary, DeploymentTarget, ResolvedContainerDefinition, ServiceDeploymentState,
};

use super::ecs::EcsApi;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_EVENT_LIMIT: usize = 15;

/// Retries for a failed `describe_service` call within one poll tick.
///
/// The default performs no retry: a failed fetch ends the deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

#[derive(Debug, Clone)]
pub struct DeploySettings {
    pub timeout: Duration,
    pub interval: Duration,
    /// Number of service events kept in the final state report.
    pub event_limit: usize,
    pub retry: RetryPolicy,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            interval: DEFAULT_INTERVAL,
            event_limit: DEFAULT_EVENT_LIMIT,
            retry: RetryPolicy::none(),
        }
    }
}

impl DeploySettings {
    /// How many times the service is polled before giving up: floor(timeout / interval).
    pub fn max_attempts(&self) -> Result<u32> {
        if self.interval.is_zero() {
            return Err(BuddyError::InvalidConfig(
                "poll interval must be greater than zero".into(),
            ));
        }
        let attempts = self.timeout.as_nanos() / self.interval.as_nanos();
        Ok(u32::try_from(attempts).unwrap_or(u32::MAX))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentPhase {
    Registering,
    Updating,
    Polling,
    Converged,
    TimedOut,
    Diverged,
}

/// Progress records streamed to the caller while a deployment runs.
#[derive(Debug, Clone)]
pub enum DeployProgress {
    Registering { family: String },
    Registered { task_definition_arn: String },
    Updating { service: String },
    Updated,
    Waiting { timeout: Duration },
    Tick {
        attempt: u32,
        deployments: Vec<DeploymentSummary>,
    },
    FinalState(ServiceDeploymentState),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentOutcome {
    Converged {
        task_definition_arn: String,
    },
    TimedOut {
        attempts: u32,
        timeout: Duration,
    },
    /// Rollout settled, but on a different task definition than the one registered.
    Diverged {
        expected: String,
        active: Option<String>,
    },
}

impl DeploymentOutcome {
    pub fn phase(&self) -> DeploymentPhase {
        match self {
            Self::Converged { .. } => DeploymentPhase::Converged,
            Self::TimedOut { .. } => DeploymentPhase::TimedOut,
            Self::Diverged { .. } => DeploymentPhase::Diverged,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Converged { .. })
    }

    /// Turn the convergence failures into command errors.
    pub fn into_result(self) -> Result<String> {
        match self {
            Self::Converged {
                task_definition_arn,
            } => Ok(task_definition_arn),
            Self::TimedOut { timeout, .. } => Err(BuddyError::TimedOut(timeout.as_secs())),
            Self::Diverged { active, .. } => Err(BuddyError::Diverged(
                active.unwrap_or_else(|| "none".to_string()),
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeployReport {
    pub outcome: DeploymentOutcome,
    /// Service state fetched after polling, events capped to the configured limit.
    pub final_state: ServiceDeploymentState,
    pub poll_attempts: u32,
}

/// Drives register → update → poll for one target.
pub struct Orchestrator<'a, C: EcsApi> {
    client: &'a C,
    target: &'a DeploymentTarget,
    settings: DeploySettings,
    progress: Option<mpsc::UnboundedSender<DeployProgress>>,
    phase: DeploymentPhase,
}

impl<'a, C: EcsApi> Orchestrator<'a, C> {
    pub fn new(client: &'a C, target: &'a DeploymentTarget, settings: DeploySettings) -> Self {
        Self {
            client,
            target,
            settings,
            progress: None,
            phase: DeploymentPhase::Registering,
        }
    }

    pub fn with_progress(mut self, progress: mpsc::UnboundedSender<DeployProgress>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn phase(&self) -> DeploymentPhase {
        self.phase
    }

    fn emit(&self, event: DeployProgress) {
        if let Some(tx) = &self.progress {
            let _ = tx.send(event);
        }
    }

    fn enter(&mut self, phase: DeploymentPhase) {
        tracing::info!(from = ?self.phase, to = ?phase, "deployment_phase");
        self.phase = phase;
    }

    /// Run the whole deployment. API failures are returned as errors; a
    /// timeout or a divergence is reported through the outcome.
    pub async fn deploy(&mut self, containers: &[ResolvedContainerDefinition]) -> Result<DeployReport> {
        let max_attempts = self.settings.max_attempts()?;
        let target = self.target;

        self.enter(DeploymentPhase::Registering);
        self.emit(DeployProgress::Registering {
            family: target.task_name.clone(),
        });
        let task_definition_arn = self
            .client
            .register_task_definition(&target.task_name, containers)
            .await?;
        tracing::info!(arn = %task_definition_arn, "task_definition_registered");
        self.emit(DeployProgress::Registered {
            task_definition_arn: task_definition_arn.clone(),
        });

        self.enter(DeploymentPhase::Updating);
        self.emit(DeployProgress::Updating {
            service: target.service_name.clone(),
        });
        self.client
            .update_service(&target.cluster_name, &target.service_name, &task_definition_arn)
            .await?;
        self.emit(DeployProgress::Updated);

        self.enter(DeploymentPhase::Polling);
        self.emit(DeployProgress::Waiting {
            timeout: self.settings.timeout,
        });
        let (converged, poll_attempts) = self.wait_for_deploy(max_attempts).await?;

        let final_state = self.fetch_state().await?;
        let outcome = if !converged {
            DeploymentOutcome::TimedOut {
                attempts: poll_attempts,
                timeout: self.settings.timeout,
            }
        } else if final_state.active_task_definition() == Some(task_definition_arn.as_str()) {
            DeploymentOutcome::Converged {
                task_definition_arn,
            }
        } else {
            DeploymentOutcome::Diverged {
                expected: task_definition_arn,
                active: final_state.task_definition.clone(),
            }
        };

        self.enter(outcome.phase());
        let final_state = final_state.with_recent_events(self.settings.event_limit);
        self.emit(DeployProgress::FinalState(final_state.clone()));

        Ok(DeployReport {
            outcome,
            final_state,
            poll_attempts,
        })
    }

    /// Poll until the service reports a single deployment or attempts run out.
    /// Returns whether it converged and how many polls were made.
    async fn wait_for_deploy(&self, max_attempts: u32) -> Result<(bool, u32)> {
        for attempt in 1..=max_attempts {
            let state = self.fetch_state().await?;
            tracing::debug!(
                attempt,
                deployments = state.deployments.len(),
                "poll_tick"
            );
            self.emit(DeployProgress::Tick {
                attempt,
                deployments: state.deployments.clone(),
            });
            if state.is_converged() {
                return Ok((true, attempt));
            }
            tokio::time::sleep(self.settings.interval).await;
        }
        tracing::warn!(attempts = max_attempts, "deployment_timed_out");
        Ok((false, max_attempts))
    }

    async fn fetch_state(&self) -> Result<ServiceDeploymentState> {
        let retry = self.settings.retry;
        let mut failures = 0;
        loop {
            match self
                .client
                .describe_service(&self.target.cluster_name, &self.target.service_name)
                .await
            {
                Ok(state) => return Ok(state),
                Err(e) if failures < retry.max_retries => {
                    failures += 1;
                    tracing::warn!(error = %e, failures, "describe_service_retry");
                    tokio::time::sleep(retry.backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
