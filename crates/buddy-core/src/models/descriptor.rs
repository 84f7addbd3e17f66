use std::collections::HashMap;

use serde::Deserialize;

use super::container::ContainerDefinitionTemplate;

/// The deployment descriptor file: targets, tasks, containers and environments.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeploymentDescriptor {
    #[serde(default)]
    pub targets: HashMap<String, TargetConfig>,
    #[serde(default)]
    pub tasks: HashMap<String, TaskConfig>,
    #[serde(default)]
    pub containers: HashMap<String, ContainerDefinitionTemplate>,
    #[serde(default)]
    pub environments: HashMap<String, HashMap<String, serde_yaml::Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    pub cluster: String,
    pub service: String,
    pub task: String,
    #[serde(default)]
    pub environment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    #[serde(default)]
    pub containers: Vec<String>,
}
