use std::collections::BTreeMap;

use serde_yaml::Value;

use crate::error::{BuddyError, DefinitionError, Result};
use crate::models::{
    DeploymentContext, DeploymentDescriptor, DeploymentTarget, ResolvedContainerDefinition,
    TaskContainer,
};

use super::container_builder;

impl DeploymentTarget {
    /// Resolve a named target, its task, environment and container templates.
    pub fn load(descriptor: &DeploymentDescriptor, target_name: &str) -> Result<Self> {
        let target = descriptor
            .targets
            .get(target_name)
            .ok_or_else(|| BuddyError::TargetNotFound(target_name.to_string()))?;

        let task = descriptor
            .tasks
            .get(&target.task)
            .ok_or_else(|| BuddyError::TaskNotFound(target.task.clone()))?;

        let environment = match target.environment.as_deref() {
            Some(environment_name) => {
                let variables = descriptor
                    .environments
                    .get(environment_name)
                    .ok_or_else(|| BuddyError::EnvironmentNotFound(environment_name.to_string()))?;
                stringify_environment(environment_name, variables)?
            }
            None => BTreeMap::new(),
        };

        let containers = task
            .containers
            .iter()
            .map(|name| {
                descriptor
                    .containers
                    .get(name)
                    .map(|template| TaskContainer {
                        name: name.clone(),
                        template: template.clone(),
                    })
                    .ok_or_else(|| BuddyError::ContainerNotFound(name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            target_name,
            cluster = %target.cluster,
            service = %target.service,
            task = %target.task,
            containers = containers.len(),
            "target_loaded"
        );

        Ok(Self {
            name: target_name.to_string(),
            cluster_name: target.cluster.clone(),
            service_name: target.service.clone(),
            task_name: target.task.clone(),
            environment,
            containers,
        })
    }

    /// Build every container of the task, in declared order, stopping at the first failure.
    pub fn task_containers(
        &self,
        image: &str,
        context: &DeploymentContext,
    ) -> std::result::Result<Vec<ResolvedContainerDefinition>, DefinitionError> {
        self.containers
            .iter()
            .map(|c| {
                container_builder::build(&c.template, &c.name, image, &self.environment, context)
            })
            .collect()
    }
}

fn stringify_environment(
    environment_name: &str,
    variables: &std::collections::HashMap<String, Value>,
) -> Result<BTreeMap<String, String>> {
    variables
        .iter()
        .map(|(name, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => {
                    return Err(BuddyError::InvalidConfig(format!(
                        "environment {environment_name}: variable {name} must be a scalar"
                    )))
                }
            };
            Ok((name.clone(), value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EnvironmentVariable;
    use crate::services::config_loader;

    const DESCRIPTOR: &str = r#"
targets:
  production:
    cluster: CLUSTERNAME
    service: SERVICENAME
    task: TASKNAME
    environment: ENVNAME
  bare:
    cluster: CLUSTERNAME
    service: SERVICENAME
    task: TASKNAME
  broken-env:
    cluster: CLUSTERNAME
    service: SERVICENAME
    task: TASKNAME
    environment: NOPE
  broken-task:
    cluster: CLUSTERNAME
    service: SERVICENAME
    task: NOPE
  broken-container:
    cluster: CLUSTERNAME
    service: SERVICENAME
    task: GHOST
tasks:
  TASKNAME:
    containers: [CONTAINERNAME, sidecar]
  GHOST:
    containers: [CONTAINERNAME, phantom]
environments:
  ENVNAME:
    VARIABLE_NAME: VARIABLE_VALUE
    PORT: 8080
    DEBUG: false
containers:
  CONTAINERNAME:
    properties:
      cpu: 10
      memory: 20
      command: [prog, arg1, arg2]
      logConfiguration:
        logDriver: awslogs
    environment: [VARIABLE_NAME, PORT]
  sidecar:
    properties:
      image: envoyproxy/envoy:v1.29
"#;

    fn descriptor() -> DeploymentDescriptor {
        config_loader::parse(DESCRIPTOR).unwrap()
    }

    fn context() -> DeploymentContext {
        DeploymentContext::new("TASKNAME", "us-east-1", "rev")
    }

    #[test]
    fn load_resolves_identity_and_environment() {
        let target = DeploymentTarget::load(&descriptor(), "production").unwrap();
        assert_eq!(target.cluster_name, "CLUSTERNAME");
        assert_eq!(target.service_name, "SERVICENAME");
        assert_eq!(target.task_name, "TASKNAME");
        assert_eq!(target.environment["VARIABLE_NAME"], "VARIABLE_VALUE");
        assert_eq!(target.environment["PORT"], "8080");
        assert_eq!(target.environment["DEBUG"], "false");
        let names: Vec<_> = target.containers.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["CONTAINERNAME", "sidecar"]);
    }

    #[test]
    fn target_without_environment_gets_an_empty_one() {
        let target = DeploymentTarget::load(&descriptor(), "bare").unwrap();
        assert!(target.environment.is_empty());
    }

    #[test]
    fn missing_lookups_name_the_offending_key() {
        let d = descriptor();
        assert!(matches!(
            DeploymentTarget::load(&d, "staging"),
            Err(BuddyError::TargetNotFound(ref n)) if n == "staging"
        ));
        assert!(matches!(
            DeploymentTarget::load(&d, "broken-env"),
            Err(BuddyError::EnvironmentNotFound(ref n)) if n == "NOPE"
        ));
        assert!(matches!(
            DeploymentTarget::load(&d, "broken-task"),
            Err(BuddyError::TaskNotFound(ref n)) if n == "NOPE"
        ));
        assert!(matches!(
            DeploymentTarget::load(&d, "broken-container"),
            Err(BuddyError::ContainerNotFound(ref n)) if n == "phantom"
        ));
    }

    #[test]
    fn non_scalar_environment_value_is_rejected() {
        let mut d = descriptor();
        d.environments
            .get_mut("ENVNAME")
            .unwrap()
            .insert("LIST".into(), Value::Sequence(vec![]));
        let err = DeploymentTarget::load(&d, "production").unwrap_err();
        assert!(matches!(err, BuddyError::InvalidConfig(ref m) if m.contains("LIST")));
    }

    #[test]
    fn task_containers_resolves_in_declared_order() {
        let target = DeploymentTarget::load(&descriptor(), "production").unwrap();
        let containers = target.task_containers("image:tag", &context()).unwrap();

        assert_eq!(containers.len(), 2);
        assert_eq!(containers[0].name, "CONTAINERNAME");
        assert_eq!(containers[0].image, "image:tag");
        assert_eq!(
            containers[0].environment,
            vec![
                EnvironmentVariable::new("VARIABLE_NAME", "VARIABLE_VALUE"),
                EnvironmentVariable::new("PORT", "8080"),
            ]
        );
        assert_eq!(containers[0].log_driver(), Some("awslogs"));
        assert_eq!(containers[1].name, "sidecar");
        assert_eq!(containers[1].image, "envoyproxy/envoy:v1.29");
    }

    #[test]
    fn task_containers_fails_fast_on_unbound_variable() {
        let mut d = descriptor();
        d.containers
            .get_mut("CONTAINERNAME")
            .unwrap()
            .environment
            .push("MISSINGVAR".into());
        let target = DeploymentTarget::load(&d, "production").unwrap();
        let err = target.task_containers("image:tag", &context()).unwrap_err();
        assert_eq!(err, DefinitionError::UnknownVariable("MISSINGVAR".into()));
    }
}
