use std::collections::BTreeMap;

use super::container::ContainerDefinitionTemplate;

/// A container reference of the target's task, resolved against the descriptor.
#[derive(Debug, Clone)]
pub struct TaskContainer {
    pub name: String,
    pub template: ContainerDefinitionTemplate,
}

/// Everything a deploy needs to know about one named target.
#[derive(Debug, Clone)]
pub struct DeploymentTarget {
    pub name: String,
    pub cluster_name: String,
    pub service_name: String,
    pub task_name: String,
    pub environment: BTreeMap<String, String>,
    /// Containers of the task, in declared order.
    pub containers: Vec<TaskContainer>,
}
