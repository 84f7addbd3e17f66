// Each test binary compiles this module independently and uses a different
// subset of helpers, so unused-function warnings are expected.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use buddy_cli::commands::DeployRequest;
use buddy_core::models::{DeploymentSummary, ResolvedContainerDefinition, ServiceDeploymentState};
use buddy_core::services::ecs::EcsApi;
use buddy_core::Result;

pub const NEW_ARN: &str = "arn:aws:ecs:us-east-1:123456789012:task-definition/T:7";
pub const OLD_ARN: &str = "arn:aws:ecs:us-east-1:123456789012:task-definition/T:6";

/// Descriptor with target `production` → task `T` → container `C` needing `V` from environment `E`.
pub const DESCRIPTOR: &str = r#"
targets:
  production:
    cluster: CLUSTER
    service: SERVICE
    task: T
    environment: E
tasks:
  T:
    containers: [C]
environments:
  E:
    V: value1
containers:
  C:
    properties:
      cpu: 10
      memory: 20
      command: [prog, arg1, arg2]
      logConfiguration:
        logDriver: awslogs
    environment: [V]
"#;

pub fn write_descriptor(dir: &Path, yaml: &str) -> PathBuf {
    let path = dir.join("config.yaml");
    std::fs::write(&path, yaml).unwrap();
    path
}

pub fn request(config_path: PathBuf) -> DeployRequest {
    DeployRequest {
        config_path,
        target_name: "production".into(),
        image: "img:tag1".into(),
        build_rev: "rev1".into(),
        aws_region: "us-east-1".into(),
        dry_run: false,
    }
}

pub fn service_state(task_definitions: &[&str], active: &str) -> ServiceDeploymentState {
    ServiceDeploymentState {
        service_name: "SERVICE".into(),
        status: "ACTIVE".into(),
        task_definition: Some(active.into()),
        desired_count: 2,
        running_count: 2,
        deployments: task_definitions
            .iter()
            .enumerate()
            .map(|(i, td)| DeploymentSummary {
                id: format!("ecs-svc/{i}"),
                status: if i == 0 { "PRIMARY" } else { "ACTIVE" }.into(),
                task_definition: td.to_string(),
                desired_count: 2,
                running_count: 1,
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    }
}

/// Fake control plane: records calls and replays scripted states,
/// repeating the last one once the script is exhausted.
#[derive(Default)]
pub struct ScriptedEcs {
    states: Mutex<VecDeque<ServiceDeploymentState>>,
    last: Mutex<ServiceDeploymentState>,
    pub registered: Mutex<Vec<(String, Vec<ResolvedContainerDefinition>)>>,
    pub calls: Mutex<Vec<&'static str>>,
}

impl ScriptedEcs {
    pub fn new(states: Vec<ServiceDeploymentState>) -> Self {
        Self {
            states: Mutex::new(states.into()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EcsApi for ScriptedEcs {
    async fn register_task_definition(
        &self,
        family: &str,
        containers: &[ResolvedContainerDefinition],
    ) -> Result<String> {
        self.calls.lock().unwrap().push("register");
        self.registered
            .lock()
            .unwrap()
            .push((family.to_string(), containers.to_vec()));
        Ok(NEW_ARN.to_string())
    }

    async fn update_service(&self, _: &str, _: &str, _: &str) -> Result<()> {
        self.calls.lock().unwrap().push("update");
        Ok(())
    }

    async fn describe_service(&self, _: &str, _: &str) -> Result<ServiceDeploymentState> {
        self.calls.lock().unwrap().push("describe");
        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.states.lock().unwrap().pop_front() {
            *last = next;
        }
        Ok(last.clone())
    }
}
