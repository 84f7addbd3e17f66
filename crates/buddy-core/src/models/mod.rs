pub mod container;
pub mod context;
pub mod descriptor;
pub mod service;
pub mod target;

pub use container::{ContainerDefinitionTemplate, EnvironmentVariable, ResolvedContainerDefinition};
pub use context::DeploymentContext;
pub use descriptor::{DeploymentDescriptor, TargetConfig, TaskConfig};
pub use service::{DeploymentSummary, ServiceDeploymentState, ServiceEvent};
pub use target::{DeploymentTarget, TaskContainer};
