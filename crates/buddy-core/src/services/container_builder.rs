use std::collections::BTreeMap;

use serde_yaml::{Mapping, Value};

use crate::error::DefinitionError;
use crate::models::{
    ContainerDefinitionTemplate, DeploymentContext, EnvironmentVariable,
    ResolvedContainerDefinition,
};

use super::substitution::substitute_mapping;

/// Log driver shipping container output to CloudWatch Logs.
pub const AWSLOGS_DRIVER: &str = "awslogs";

/// Build a registrable container definition from a template.
///
/// Template properties are copied and interpolated, `name` is always the given
/// container name, and the template's own `image` wins over the deploy-time one.
/// Every declared environment variable must be bound in `environment`.
pub fn build(
    template: &ContainerDefinitionTemplate,
    name: &str,
    image: &str,
    environment: &BTreeMap<String, String>,
    context: &DeploymentContext,
) -> Result<ResolvedContainerDefinition, DefinitionError> {
    let mut properties = Mapping::new();
    let mut pinned_image = None;
    let mut static_environment = None;
    let mut log_configuration = None;

    for (key, value) in substitute_mapping(&template.properties, context) {
        match key.as_str() {
            Some("name") => {}
            Some("image") => pinned_image = Some(value),
            Some("environment") => static_environment = Some(value),
            Some("logConfiguration") => log_configuration = Some(value),
            _ => {
                properties.insert(key, value);
            }
        }
    }

    let image = match pinned_image {
        Some(Value::String(pinned)) => pinned,
        Some(_) => {
            return Err(DefinitionError::InvalidProperty {
                key: "image".into(),
                reason: "expected a string".into(),
            })
        }
        None => image.to_string(),
    };

    let environment = if template.environment.is_empty() {
        match static_environment {
            Some(value) => {
                serde_yaml::from_value(value).map_err(|e| DefinitionError::InvalidProperty {
                    key: "environment".into(),
                    reason: e.to_string(),
                })?
            }
            None => Vec::new(),
        }
    } else {
        resolve_environment(&template.environment, environment)?
    };

    let log_configuration = log_configuration.map(|config| configure_cloudwatch_logs(config, context));

    Ok(ResolvedContainerDefinition {
        name: name.to_string(),
        image,
        environment,
        log_configuration,
        properties,
    })
}

/// Bind each required variable, in declared order. Fails on the first unbound name.
pub fn resolve_environment(
    required: &[String],
    environment: &BTreeMap<String, String>,
) -> Result<Vec<EnvironmentVariable>, DefinitionError> {
    required
        .iter()
        .map(|name| {
            environment
                .get(name)
                .map(|value| EnvironmentVariable::new(name, value))
                .ok_or_else(|| DefinitionError::UnknownVariable(name.clone()))
        })
        .collect()
}

/// Inject the awslogs group/region/stream-prefix defaults under any explicit options.
/// Any other driver is returned unchanged.
pub fn configure_cloudwatch_logs(config: Value, context: &DeploymentContext) -> Value {
    if config.get("logDriver").and_then(Value::as_str) != Some(AWSLOGS_DRIVER) {
        return config;
    }
    let mut config = match config {
        Value::Mapping(config) => config,
        other => return other,
    };

    let mut defaults = Mapping::new();
    defaults.insert("awslogs-group".into(), context.task_name.as_str().into());
    defaults.insert("awslogs-region".into(), context.aws_region.as_str().into());
    defaults.insert("awslogs-stream-prefix".into(), context.build_rev.as_str().into());

    let explicit = config
        .get("options")
        .and_then(Value::as_mapping)
        .cloned()
        .unwrap_or_default();
    config.insert("options".into(), Value::Mapping(overlay(&defaults, &explicit)));
    Value::Mapping(config)
}

/// New mapping holding `base` with every entry of `overrides` laid over it.
pub fn overlay(base: &Mapping, overrides: &Mapping) -> Mapping {
    let mut merged = base.clone();
    for (key, value) in overrides {
        merged.insert(key.clone(), value.clone());
    }
    merged
}
