use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_ecs::error::{BuildError, DisplayErrorContext};
use aws_sdk_ecs::types::{
    ContainerCondition, ContainerDefinition, ContainerDependency, EnvironmentFile,
    EnvironmentFileType, HealthCheck, HostEntry, KernelCapabilities, KeyValuePair,
    LinuxParameters, LogConfiguration, LogDriver, MountPoint, PortMapping,
    RepositoryCredentials, Secret, Tmpfs, TransportProtocol, Ulimit, UlimitName, VolumeFrom,
};
use serde_yaml::{Mapping, Value};

use crate::error::{BuddyError, DefinitionError, Result};
use crate::models::{
    DeploymentSummary, ResolvedContainerDefinition, ServiceDeploymentState, ServiceEvent,
};

/// The slice of the ECS control plane a deployment needs.
#[async_trait]
pub trait EcsApi: Send + Sync {
    /// Register a new revision of `family`. Returns the task definition ARN.
    async fn register_task_definition(
        &self,
        family: &str,
        containers: &[ResolvedContainerDefinition],
    ) -> Result<String>;

    async fn update_service(
        &self,
        cluster: &str,
        service: &str,
        task_definition_arn: &str,
    ) -> Result<()>;

    async fn describe_service(&self, cluster: &str, service: &str)
        -> Result<ServiceDeploymentState>;
}

/// Explicit AWS session settings, supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct AwsSettings {
    pub region: Option<String>,
    pub profile: Option<String>,
}

pub struct EcsClient {
    client: aws_sdk_ecs::Client,
    region: Option<String>,
}

impl EcsClient {
    pub async fn connect(settings: &AwsSettings) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &settings.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(profile) = &settings.profile {
            loader = loader.profile_name(profile);
        }
        let sdk_config = loader.load().await;
        let region = sdk_config.region().map(|r| r.to_string());
        tracing::debug!(region = ?region, "aws_config_loaded");
        Self {
            client: aws_sdk_ecs::Client::new(&sdk_config),
            region,
        }
    }

    /// The region the client talks to, if one could be resolved.
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }
}

fn api_error<E>(operation: &'static str, err: E) -> BuddyError
where
    E: std::error::Error,
{
    BuddyError::Api {
        operation,
        message: DisplayErrorContext(err).to_string(),
    }
}

#[async_trait]
impl EcsApi for EcsClient {
    async fn register_task_definition(
        &self,
        family: &str,
        containers: &[ResolvedContainerDefinition],
    ) -> Result<String> {
        let definitions = containers
            .iter()
            .map(to_container_definition)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let output = self
            .client
            .register_task_definition()
            .family(family)
            .set_container_definitions(Some(definitions))
            .send()
            .await
            .map_err(|e| api_error("register_task_definition", e))?;

        output
            .task_definition()
            .and_then(|t| t.task_definition_arn())
            .map(str::to_string)
            .ok_or_else(|| BuddyError::Api {
                operation: "register_task_definition",
                message: "response carried no task definition ARN".into(),
            })
    }

    async fn update_service(
        &self,
        cluster: &str,
        service: &str,
        task_definition_arn: &str,
    ) -> Result<()> {
        self.client
            .update_service()
            .cluster(cluster)
            .service(service)
            .task_definition(task_definition_arn)
            .send()
            .await
            .map_err(|e| api_error("update_service", e))?;
        Ok(())
    }

    async fn describe_service(
        &self,
        cluster: &str,
        service: &str,
    ) -> Result<ServiceDeploymentState> {
        let output = self
            .client
            .describe_services()
            .cluster(cluster)
            .services(service)
            .send()
            .await
            .map_err(|e| api_error("describe_services", e))?;

        let Some(svc) = output.services().first() else {
            if let Some(reason) = output.failures().first().and_then(|f| f.reason()) {
                tracing::warn!(cluster, service, reason, "describe_services_failure");
            }
            return Err(BuddyError::ServiceNotFound {
                cluster: cluster.to_string(),
                service: service.to_string(),
            });
        };

        Ok(ServiceDeploymentState {
            service_name: svc.service_name().unwrap_or(service).to_string(),
            status: svc.status().unwrap_or_default().to_string(),
            task_definition: svc.task_definition().map(str::to_string),
            desired_count: svc.desired_count(),
            running_count: svc.running_count(),
            pending_count: svc.pending_count(),
            deployments: svc
                .deployments()
                .iter()
                .map(|d| DeploymentSummary {
                    id: d.id().unwrap_or_default().to_string(),
                    status: d.status().unwrap_or_default().to_string(),
                    task_definition: d.task_definition().unwrap_or_default().to_string(),
                    desired_count: d.desired_count(),
                    running_count: d.running_count(),
                    pending_count: d.pending_count(),
                    rollout_state: d.rollout_state().map(|r| r.as_str().to_string()),
                })
                .collect(),
            events: svc
                .events()
                .iter()
                .map(|e| ServiceEvent {
                    id: e.id().unwrap_or_default().to_string(),
                    created_at: e.created_at().and_then(|t| {
                        chrono::DateTime::from_timestamp(t.secs(), t.subsec_nanos())
                    }),
                    message: e.message().unwrap_or_default().to_string(),
                })
                .collect(),
        })
    }
}

/// Convert a resolved definition into the SDK shape.
/// Properties outside the mapped set are rejected rather than dropped.
pub fn to_container_definition(
    def: &ResolvedContainerDefinition,
) -> std::result::Result<ContainerDefinition, DefinitionError> {
    let mut builder = ContainerDefinition::builder()
        .name(&def.name)
        .image(&def.image);

    if !def.environment.is_empty() {
        builder = builder.set_environment(Some(
            def.environment
                .iter()
                .map(|v| KeyValuePair::builder().name(&v.name).value(&v.value).build())
                .collect(),
        ));
    }

    if let Some(config) = &def.log_configuration {
        builder = builder.log_configuration(to_log_configuration(config)?);
    }

    for (key, value) in &def.properties {
        let key = key.as_str().ok_or_else(|| DefinitionError::InvalidProperty {
            key: format!("{key:?}"),
            reason: "property names must be strings".into(),
        })?;
        builder = match key {
            "cpu" => builder.cpu(int(key, value)?),
            "memory" => builder.memory(int(key, value)?),
            "memoryReservation" => builder.memory_reservation(int(key, value)?),
            "startTimeout" => builder.start_timeout(int(key, value)?),
            "stopTimeout" => builder.stop_timeout(int(key, value)?),
            "essential" => builder.essential(boolean(key, value)?),
            "privileged" => builder.privileged(boolean(key, value)?),
            "readonlyRootFilesystem" => builder.readonly_root_filesystem(boolean(key, value)?),
            "disableNetworking" => builder.disable_networking(boolean(key, value)?),
            "interactive" => builder.interactive(boolean(key, value)?),
            "pseudoTerminal" => builder.pseudo_terminal(boolean(key, value)?),
            "command" => builder.set_command(Some(strings(key, value)?)),
            "entryPoint" => builder.set_entry_point(Some(strings(key, value)?)),
            "links" => builder.set_links(Some(strings(key, value)?)),
            "dnsServers" => builder.set_dns_servers(Some(strings(key, value)?)),
            "dnsSearchDomains" => builder.set_dns_search_domains(Some(strings(key, value)?)),
            "dockerSecurityOptions" => {
                builder.set_docker_security_options(Some(strings(key, value)?))
            }
            "workingDirectory" => builder.working_directory(string(key, value)?),
            "hostname" => builder.hostname(string(key, value)?),
            "user" => builder.user(string(key, value)?),
            "dockerLabels" => builder.set_docker_labels(Some(string_map(key, value)?)),
            "portMappings" => builder.set_port_mappings(Some(entries(key, value, port_mapping)?)),
            "mountPoints" => builder.set_mount_points(Some(entries(key, value, mount_point)?)),
            "volumesFrom" => builder.set_volumes_from(Some(entries(key, value, volume_from)?)),
            "secrets" => builder.set_secrets(Some(entries(key, value, secret)?)),
            "ulimits" => builder.set_ulimits(Some(entries(key, value, ulimit)?)),
            "dependsOn" => builder.set_depends_on(Some(entries(key, value, dependency)?)),
            "environmentFiles" => {
                builder.set_environment_files(Some(entries(key, value, environment_file)?))
            }
            "extraHosts" => builder.set_extra_hosts(Some(entries(key, value, host_entry)?)),
            "healthCheck" => builder.health_check(health_check(key, value)?),
            "linuxParameters" => builder.linux_parameters(linux_parameters(key, value)?),
            "repositoryCredentials" => {
                builder.repository_credentials(repository_credentials(key, value)?)
            }
            other => return Err(DefinitionError::UnsupportedProperty(other.to_string())),
        };
    }

    Ok(builder.build())
}

fn invalid(key: &str, reason: &str) -> DefinitionError {
    DefinitionError::InvalidProperty {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn built<T>(
    key: &str,
    result: std::result::Result<T, BuildError>,
) -> std::result::Result<T, DefinitionError> {
    result.map_err(|e| invalid(key, &e.to_string()))
}

fn int(key: &str, value: &Value) -> std::result::Result<i32, DefinitionError> {
    value
        .as_i64()
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| invalid(key, "expected an integer"))
}

fn boolean(key: &str, value: &Value) -> std::result::Result<bool, DefinitionError> {
    value.as_bool().ok_or_else(|| invalid(key, "expected a boolean"))
}

fn string(key: &str, value: &Value) -> std::result::Result<String, DefinitionError> {
    scalar_string(value).ok_or_else(|| invalid(key, "expected a string"))
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn strings(key: &str, value: &Value) -> std::result::Result<Vec<String>, DefinitionError> {
    value
        .as_sequence()
        .ok_or_else(|| invalid(key, "expected a list"))?
        .iter()
        .map(|v| scalar_string(v).ok_or_else(|| invalid(key, "expected a list of strings")))
        .collect()
}

fn string_map(
    key: &str,
    value: &Value,
) -> std::result::Result<HashMap<String, String>, DefinitionError> {
    let mapping: &Mapping = value
        .as_mapping()
        .ok_or_else(|| invalid(key, "expected a mapping"))?;
    mapping
        .iter()
        .map(|(k, v)| match (k.as_str(), scalar_string(v)) {
            (Some(k), Some(v)) => Ok((k.to_string(), v)),
            _ => Err(invalid(key, "expected a mapping of strings")),
        })
        .collect()
}

/// Convert every entry of a list-valued property.
fn entries<T>(
    key: &str,
    value: &Value,
    convert: impl Fn(&str, &Value) -> std::result::Result<T, DefinitionError>,
) -> std::result::Result<Vec<T>, DefinitionError> {
    value
        .as_sequence()
        .ok_or_else(|| invalid(key, "expected a list"))?
        .iter()
        .map(|entry| convert(key, entry))
        .collect()
}

/// A nested object property, read field by field. Unknown fields are rejected.
struct Fields<'a> {
    key: &'a str,
    mapping: &'a Mapping,
}

impl<'a> Fields<'a> {
    fn new(
        key: &'a str,
        value: &'a Value,
        allowed: &[&str],
    ) -> std::result::Result<Self, DefinitionError> {
        let mapping = value
            .as_mapping()
            .ok_or_else(|| invalid(key, "expected a mapping"))?;
        for field in mapping.keys() {
            let name = field
                .as_str()
                .ok_or_else(|| invalid(key, "field names must be strings"))?;
            if !allowed.contains(&name) {
                return Err(invalid(key, &format!("unsupported field {name}")));
            }
        }
        Ok(Self { key, mapping })
    }

    fn path(&self, field: &str) -> String {
        format!("{}.{field}", self.key)
    }

    fn get(&self, field: &str) -> Option<&'a Value> {
        self.mapping.get(field)
    }

    fn int(&self, field: &str) -> std::result::Result<Option<i32>, DefinitionError> {
        self.get(field).map(|v| int(&self.path(field), v)).transpose()
    }

    fn boolean(&self, field: &str) -> std::result::Result<Option<bool>, DefinitionError> {
        self.get(field).map(|v| boolean(&self.path(field), v)).transpose()
    }

    fn string(&self, field: &str) -> std::result::Result<Option<String>, DefinitionError> {
        self.get(field).map(|v| string(&self.path(field), v)).transpose()
    }

    fn strings(&self, field: &str) -> std::result::Result<Option<Vec<String>>, DefinitionError> {
        self.get(field).map(|v| strings(&self.path(field), v)).transpose()
    }
}

fn to_log_configuration(config: &Value) -> std::result::Result<LogConfiguration, DefinitionError> {
    let driver = config
        .get("logDriver")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("logConfiguration", "logDriver is required"))?;
    let options = match config.get("options") {
        Some(options) => Some(string_map("logConfiguration.options", options)?),
        None => None,
    };
    built(
        "logConfiguration",
        LogConfiguration::builder()
            .log_driver(LogDriver::from(driver))
            .set_options(options)
            .build(),
    )
}

fn port_mapping(key: &str, entry: &Value) -> std::result::Result<PortMapping, DefinitionError> {
    let f = Fields::new(key, entry, &["containerPort", "hostPort", "protocol", "name"])?;
    Ok(PortMapping::builder()
        .set_container_port(f.int("containerPort")?)
        .set_host_port(f.int("hostPort")?)
        .set_protocol(f.string("protocol")?.map(|p| TransportProtocol::from(p.as_str())))
        .set_name(f.string("name")?)
        .build())
}

fn mount_point(key: &str, entry: &Value) -> std::result::Result<MountPoint, DefinitionError> {
    let f = Fields::new(key, entry, &["sourceVolume", "containerPath", "readOnly"])?;
    Ok(MountPoint::builder()
        .set_source_volume(f.string("sourceVolume")?)
        .set_container_path(f.string("containerPath")?)
        .set_read_only(f.boolean("readOnly")?)
        .build())
}

fn volume_from(key: &str, entry: &Value) -> std::result::Result<VolumeFrom, DefinitionError> {
    let f = Fields::new(key, entry, &["sourceContainer", "readOnly"])?;
    Ok(VolumeFrom::builder()
        .set_source_container(f.string("sourceContainer")?)
        .set_read_only(f.boolean("readOnly")?)
        .build())
}

fn secret(key: &str, entry: &Value) -> std::result::Result<Secret, DefinitionError> {
    let f = Fields::new(key, entry, &["name", "valueFrom"])?;
    built(
        key,
        Secret::builder()
            .set_name(f.string("name")?)
            .set_value_from(f.string("valueFrom")?)
            .build(),
    )
}

fn ulimit(key: &str, entry: &Value) -> std::result::Result<Ulimit, DefinitionError> {
    let f = Fields::new(key, entry, &["name", "softLimit", "hardLimit"])?;
    built(
        key,
        Ulimit::builder()
            .set_name(f.string("name")?.map(|n| UlimitName::from(n.as_str())))
            .set_soft_limit(f.int("softLimit")?)
            .set_hard_limit(f.int("hardLimit")?)
            .build(),
    )
}

fn dependency(
    key: &str,
    entry: &Value,
) -> std::result::Result<ContainerDependency, DefinitionError> {
    let f = Fields::new(key, entry, &["containerName", "condition"])?;
    built(
        key,
        ContainerDependency::builder()
            .set_container_name(f.string("containerName")?)
            .set_condition(f.string("condition")?.map(|c| ContainerCondition::from(c.as_str())))
            .build(),
    )
}

fn environment_file(
    key: &str,
    entry: &Value,
) -> std::result::Result<EnvironmentFile, DefinitionError> {
    let f = Fields::new(key, entry, &["value", "type"])?;
    built(
        key,
        EnvironmentFile::builder()
            .set_value(f.string("value")?)
            .set_type(f.string("type")?.map(|t| EnvironmentFileType::from(t.as_str())))
            .build(),
    )
}

fn host_entry(key: &str, entry: &Value) -> std::result::Result<HostEntry, DefinitionError> {
    let f = Fields::new(key, entry, &["hostname", "ipAddress"])?;
    built(
        key,
        HostEntry::builder()
            .set_hostname(f.string("hostname")?)
            .set_ip_address(f.string("ipAddress")?)
            .build(),
    )
}

fn health_check(key: &str, value: &Value) -> std::result::Result<HealthCheck, DefinitionError> {
    let f = Fields::new(
        key,
        value,
        &["command", "interval", "timeout", "retries", "startPeriod"],
    )?;
    built(
        key,
        HealthCheck::builder()
            .set_command(f.strings("command")?)
            .set_interval(f.int("interval")?)
            .set_timeout(f.int("timeout")?)
            .set_retries(f.int("retries")?)
            .set_start_period(f.int("startPeriod")?)
            .build(),
    )
}

fn repository_credentials(
    key: &str,
    value: &Value,
) -> std::result::Result<RepositoryCredentials, DefinitionError> {
    let f = Fields::new(key, value, &["credentialsParameter"])?;
    built(
        key,
        RepositoryCredentials::builder()
            .set_credentials_parameter(f.string("credentialsParameter")?)
            .build(),
    )
}

fn linux_parameters(
    key: &str,
    value: &Value,
) -> std::result::Result<LinuxParameters, DefinitionError> {
    let f = Fields::new(
        key,
        value,
        &[
            "capabilities",
            "initProcessEnabled",
            "sharedMemorySize",
            "maxSwap",
            "swappiness",
            "tmpfs",
        ],
    )?;
    let capabilities = f
        .get("capabilities")
        .map(|v| kernel_capabilities(&f.path("capabilities"), v))
        .transpose()?;
    let tmpfs = f
        .get("tmpfs")
        .map(|v| entries(&f.path("tmpfs"), v, tmpfs_mount))
        .transpose()?;
    Ok(LinuxParameters::builder()
        .set_capabilities(capabilities)
        .set_init_process_enabled(f.boolean("initProcessEnabled")?)
        .set_shared_memory_size(f.int("sharedMemorySize")?)
        .set_max_swap(f.int("maxSwap")?)
        .set_swappiness(f.int("swappiness")?)
        .set_tmpfs(tmpfs)
        .build())
}

fn kernel_capabilities(
    key: &str,
    value: &Value,
) -> std::result::Result<KernelCapabilities, DefinitionError> {
    let f = Fields::new(key, value, &["add", "drop"])?;
    Ok(KernelCapabilities::builder()
        .set_add(f.strings("add")?)
        .set_drop(f.strings("drop")?)
        .build())
}

fn tmpfs_mount(key: &str, entry: &Value) -> std::result::Result<Tmpfs, DefinitionError> {
    let f = Fields::new(key, entry, &["containerPath", "size", "mountOptions"])?;
    built(
        key,
        Tmpfs::builder()
            .set_container_path(f.string("containerPath")?)
            .set_size(f.int("size")?)
            .set_mount_options(f.strings("mountOptions")?)
            .build(),
    )
}
