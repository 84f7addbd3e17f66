use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum BuddyError {
    #[error("config file not found at {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("missing target {0}")]
    TargetNotFound(String),

    #[error("missing task {0}")]
    TaskNotFound(String),

    #[error("missing environment {0}")]
    EnvironmentNotFound(String),

    #[error("missing container {0}")]
    ContainerNotFound(String),

    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error("ecs {operation} failed: {message}")]
    Api {
        operation: &'static str,
        message: String,
    },

    #[error("service {service} not found in cluster {cluster}")]
    ServiceNotFound { cluster: String, service: String },

    #[error("Deployment didn't finish in {0}s")]
    TimedOut(u64),

    #[error("Deployment failed (active: {0})")]
    Diverged(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

/// Raised while turning a container template into a concrete definition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DefinitionError {
    #[error("Unknown environment variable {0}")]
    UnknownVariable(String),

    #[error("unsupported container property {0}")]
    UnsupportedProperty(String),

    #[error("invalid value for container property {key}: {reason}")]
    InvalidProperty { key: String, reason: String },
}

pub type Result<T> = std::result::Result<T, BuddyError>;
