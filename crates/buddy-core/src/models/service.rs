use chrono::{DateTime, Utc};
use serde::Serialize;

/// One rollout tracked by the service, as reported by `describe_services`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSummary {
    pub id: String,
    pub status: String,
    pub task_definition: String,
    pub desired_count: i32,
    pub running_count: i32,
    pub pending_count: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollout_state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEvent {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub message: String,
}

/// Snapshot of a live service. Never cached: every poll fetches a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDeploymentState {
    pub service_name: String,
    pub status: String,
    /// ARN of the task definition the service currently runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_definition: Option<String>,
    pub desired_count: i32,
    pub running_count: i32,
    pub pending_count: i32,
    pub deployments: Vec<DeploymentSummary>,
    /// Most recent first, as ECS returns them.
    pub events: Vec<ServiceEvent>,
}

impl ServiceDeploymentState {
    /// A single deployment means steady state; two or more means a rollout is in flight.
    pub fn is_converged(&self) -> bool {
        self.deployments.len() < 2
    }

    pub fn active_task_definition(&self) -> Option<&str> {
        self.task_definition.as_deref()
    }

    /// Copy of the state keeping only the `limit` most recent events.
    pub fn with_recent_events(&self, limit: usize) -> Self {
        let mut state = self.clone();
        state.events.truncate(limit);
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deployment(status: &str) -> DeploymentSummary {
        DeploymentSummary {
            id: format!("ecs-svc/{status}"),
            status: status.into(),
            task_definition: "arn:aws:ecs:us-east-1:123456789012:task-definition/web:1".into(),
            ..Default::default()
        }
    }

    #[test]
    fn single_deployment_is_converged() {
        let state = ServiceDeploymentState {
            deployments: vec![deployment("PRIMARY")],
            ..Default::default()
        };
        assert!(state.is_converged());
    }

    #[test]
    fn two_or_more_deployments_are_in_flight_whatever_their_status() {
        for statuses in [
            vec!["PRIMARY", "ACTIVE"],
            vec!["PRIMARY", "PRIMARY"],
            vec!["ACTIVE", "INACTIVE", "DRAINING"],
        ] {
            let state = ServiceDeploymentState {
                deployments: statuses.into_iter().map(deployment).collect(),
                ..Default::default()
            };
            assert!(!state.is_converged());
        }
    }

    #[test]
    fn with_recent_events_caps_the_event_list() {
        let state = ServiceDeploymentState {
            events: (0..20)
                .map(|i| ServiceEvent {
                    id: i.to_string(),
                    created_at: None,
                    message: format!("event {i}"),
                })
                .collect(),
            ..Default::default()
        };
        let capped = state.with_recent_events(15);
        assert_eq!(capped.events.len(), 15);
        assert_eq!(capped.events[0].message, "event 0");
        assert_eq!(state.events.len(), 20);
    }
}
