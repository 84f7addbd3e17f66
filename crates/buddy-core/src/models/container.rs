use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

/// Static container properties plus the variables the container needs from its environment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContainerDefinitionTemplate {
    #[serde(default)]
    pub properties: Mapping,
    #[serde(default)]
    pub environment: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentVariable {
    pub name: String,
    pub value: String,
}

impl EnvironmentVariable {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A container definition ready to be registered, serialized in the ECS camelCase shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedContainerDefinition {
    pub name: String,
    pub image: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub environment: Vec<EnvironmentVariable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_configuration: Option<Value>,
    /// Remaining static properties, in template order.
    #[serde(flatten)]
    pub properties: Mapping,
}

impl ResolvedContainerDefinition {
    pub fn log_driver(&self) -> Option<&str> {
        self.log_configuration
            .as_ref()
            .and_then(|c| c.get("logDriver"))
            .and_then(Value::as_str)
    }

    pub fn log_options(&self) -> Option<&Mapping> {
        self.log_configuration
            .as_ref()
            .and_then(|c| c.get("options"))
            .and_then(Value::as_mapping)
    }
}
