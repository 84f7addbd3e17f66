use std::path::Path;

use crate::error::{BuddyError, Result};
use crate::models::DeploymentDescriptor;

pub fn load(config_path: &Path) -> Result<DeploymentDescriptor> {
    if !config_path.exists() {
        return Err(BuddyError::ConfigNotFound(config_path.to_path_buf()));
    }
    let contents = std::fs::read_to_string(config_path)?;
    parse(&contents)
}

pub fn parse(contents: &str) -> Result<DeploymentDescriptor> {
    let descriptor: DeploymentDescriptor = serde_yaml::from_str(contents)
        .map_err(|e| BuddyError::InvalidConfig(e.to_string()))?;
    tracing::debug!(
        targets = descriptor.targets.len(),
        tasks = descriptor.tasks.len(),
        containers = descriptor.containers.len(),
        "descriptor_loaded"
    );
    Ok(descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn parse_full_config() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = r#"
targets:
  production:
    cluster: main
    service: web
    task: web-task
    environment: prod
tasks:
  web-task:
    containers: [web, worker]
containers:
  web:
    properties:
      cpu: 128
      memory: 256
    environment: [DATABASE_URL]
  worker:
    properties:
      command: [worker, --queue, default]
environments:
  prod:
    DATABASE_URL: postgres://db/prod
    WORKERS: 4
"#;
        let path = dir.path().join("deploy.yaml");
        fs::write(&path, yaml).unwrap();
        let config = load(&path).unwrap();

        let target = &config.targets["production"];
        assert_eq!(target.cluster, "main");
        assert_eq!(target.environment.as_deref(), Some("prod"));
        assert_eq!(config.tasks["web-task"].containers, vec!["web", "worker"]);
        assert_eq!(config.containers["web"].environment, vec!["DATABASE_URL"]);
        assert_eq!(config.containers["worker"].properties.len(), 1);
        assert_eq!(config.environments["prod"].len(), 2);
    }

    #[test]
    fn parse_minimal_config() {
        let yaml = "targets:\n  staging:\n    cluster: c\n    service: s\n    task: t\n";
        let config = parse(yaml).unwrap();
        assert!(config.targets["staging"].environment.is_none());
        assert!(config.tasks.is_empty());
        assert!(config.containers.is_empty());
        assert!(config.environments.is_empty());
    }

    #[test]
    fn target_without_cluster_is_invalid() {
        let yaml = "targets:\n  staging:\n    service: s\n    task: t\n";
        let err = parse(yaml).unwrap_err();
        assert!(matches!(err, BuddyError::InvalidConfig(ref m) if m.contains("cluster")));
    }

    #[test]
    fn missing_config_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load(&dir.path().join("deploy.yaml")),
            Err(BuddyError::ConfigNotFound(_))
        ));
    }
}
