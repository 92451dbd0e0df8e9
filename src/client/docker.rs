// ABOUTME: Bollard-backed Client talking to one Docker-compatible engine per machine.
// ABOUTME: Maps service specs to engine requests and engine state to container records.

use super::types::{
    ContainerRecord, ContainerStatus, CreatedContainer, Health, HealthLogEntry, HealthStatus,
    LABEL_MANAGED, LABEL_SERVICE_ID, RemoveOptions, StopOptions, VolumeCreateOptions, VolumeRef,
};
use super::{Client, ClientError};
use crate::config::Config;
use crate::error::Error;
use crate::spec::{ServiceSpec, VolumeType};
use crate::types::{ContainerId, MachineId, ServiceId};
use async_trait::async_trait;
use bollard::Docker;
use bollard::models::{
    ContainerCreateBody, ContainerStateStatusEnum, HealthConfig, HealthStatusEnum, HostConfig,
    Mount, MountTypeEnum, VolumeCreateRequest,
};
use bollard::query_parameters::{
    CreateContainerOptions, InspectContainerOptions, RemoveContainerOptions,
    StartContainerOptions, StopContainerOptions,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Duration;

const ENGINE_TIMEOUT_SECS: u64 = 120;

// =============================================================================
// Error Mapping Helpers
// =============================================================================

fn map_create_error(e: bollard::errors::Error) -> ClientError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ClientError::ImageNotFound(message.clone()),
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 409 => ClientError::AlreadyExists(message.clone()),
        _ => ClientError::Runtime(e.to_string()),
    }
}

fn map_stop_error(e: bollard::errors::Error) -> ClientError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ClientError::ContainerNotFound(message.clone()),
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 304 => ClientError::NotRunning(message.clone()),
        _ => ClientError::Runtime(e.to_string()),
    }
}

fn map_not_found_error(e: bollard::errors::Error) -> ClientError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ClientError::ContainerNotFound(message.clone()),
        _ => ClientError::Runtime(e.to_string()),
    }
}

fn map_volume_error(e: bollard::errors::Error) -> ClientError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 409 => ClientError::AlreadyExists(message.clone()),
        _ => ClientError::Runtime(e.to_string()),
    }
}

/// A failed placement probe. A 404 means the container lives elsewhere;
/// anything else means the machine could not answer.
fn map_probe_error(machine_id: &MachineId, e: bollard::errors::Error) -> Option<ClientError> {
    match &e {
        bollard::errors::Error::DockerResponseServerError { status_code, .. }
            if *status_code == 404 =>
        {
            None
        }
        bollard::errors::Error::DockerResponseServerError { .. } => {
            Some(ClientError::Runtime(format!("{}: {}", machine_id, e)))
        }
        _ => Some(ClientError::Connection(format!("{}: {}", machine_id, e))),
    }
}

// Engine fields are signed; saturate instead of wrapping negative.

fn duration_nanos(d: Duration) -> i64 {
    i64::try_from(d.as_nanos()).unwrap_or(i64::MAX)
}

fn stop_timeout_secs(d: Duration) -> i32 {
    i32::try_from(d.as_secs()).unwrap_or(i32::MAX)
}

// =============================================================================
// DockerClient
// =============================================================================

/// Client backed by one bollard connection per machine.
///
/// Docker and Podman both work through the Docker-compatible API. The
/// client remembers which machine each container it created lives on;
/// containers it has not seen are looked up on every machine.
pub struct DockerClient {
    machines: HashMap<MachineId, Docker>,
    placements: RwLock<HashMap<ContainerId, MachineId>>,
}

impl DockerClient {
    pub fn new(machines: HashMap<MachineId, Docker>) -> Self {
        Self {
            machines,
            placements: RwLock::new(HashMap::new()),
        }
    }

    /// Connect to the engine socket of every configured machine.
    pub fn connect(config: &Config) -> Result<Self, Error> {
        let mut machines = HashMap::new();
        for machine in config.machines.iter() {
            let docker = Docker::connect_with_unix(
                &machine.socket,
                ENGINE_TIMEOUT_SECS,
                bollard::API_DEFAULT_VERSION,
            )
            .map_err(|e| Error::Connection {
                machine: machine.id.to_string(),
                reason: e.to_string(),
            })?;
            machines.insert(machine.id.clone(), docker);
        }
        Ok(Self::new(machines))
    }

    fn engine(&self, machine_id: &MachineId) -> Result<&Docker, ClientError> {
        self.machines
            .get(machine_id)
            .ok_or_else(|| ClientError::MachineNotFound(machine_id.to_string()))
    }

    /// Find the engine hosting a container, probing all machines if needed.
    async fn engine_for(&self, container_id: &ContainerId) -> Result<&Docker, ClientError> {
        let known = self.placements.read().get(container_id).cloned();
        if let Some(machine_id) = known {
            return self.engine(&machine_id);
        }

        for (machine_id, docker) in &self.machines {
            let probe = docker
                .inspect_container(container_id.as_str(), None::<InspectContainerOptions>)
                .await;
            if let Err(e) = probe {
                match map_probe_error(machine_id, e) {
                    Some(err) => return Err(err),
                    None => continue,
                }
            }

            tracing::debug!(
                container_id = %container_id.short(),
                machine_id = %machine_id,
                "located container"
            );
            self.placements
                .write()
                .insert(container_id.clone(), machine_id.clone());
            return Ok(docker);
        }

        Err(ClientError::ContainerNotFound(container_id.to_string()))
    }

    fn container_body(service_id: &ServiceId, spec: &ServiceSpec) -> ContainerCreateBody {
        let container = &spec.container;

        let mut labels = container.labels.clone();
        labels.insert(LABEL_SERVICE_ID.to_string(), service_id.to_string());
        labels.insert(LABEL_MANAGED.to_string(), "true".to_string());

        let env: Vec<String> = container
            .env
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();

        // Only named volumes are mounted; other kinds are provisioned elsewhere.
        let mounts: Vec<Mount> = container
            .volume_mounts
            .iter()
            .filter_map(|m| {
                let volume = spec.volume(&m.volume_name)?;
                (volume.kind == VolumeType::Volume).then(|| Mount {
                    source: Some(volume.docker_volume_name().to_string()),
                    target: Some(m.container_path.clone()),
                    typ: Some(MountTypeEnum::VOLUME),
                    read_only: Some(m.read_only),
                    ..Default::default()
                })
            })
            .collect();

        let healthcheck = container.healthcheck.as_ref().map(|hc| HealthConfig {
            test: Some(hc.test.clone()),
            interval: Some(duration_nanos(hc.interval)),
            timeout: Some(duration_nanos(hc.timeout)),
            retries: Some(i64::from(hc.retries)),
            start_period: Some(duration_nanos(hc.start_period)),
            start_interval: None,
        });

        ContainerCreateBody {
            image: Some(container.image.clone()),
            cmd: container.command.clone(),
            env: if env.is_empty() { None } else { Some(env) },
            labels: Some(labels),
            healthcheck,
            host_config: Some(HostConfig {
                mounts: if mounts.is_empty() {
                    None
                } else {
                    Some(mounts)
                },
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn volume_request(opts: &VolumeCreateOptions) -> VolumeCreateRequest {
        let non_empty = |m: &HashMap<String, String>| (!m.is_empty()).then(|| m.clone());
        VolumeCreateRequest {
            name: Some(opts.name.clone()),
            driver: (!opts.driver.is_empty()).then(|| opts.driver.clone()),
            driver_opts: non_empty(&opts.driver_opts),
            labels: non_empty(&opts.labels),
            ..Default::default()
        }
    }
}

impl std::fmt::Debug for DockerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DockerClient")
            .field("machines", &self.machines.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn status_name(status: ContainerStateStatusEnum) -> &'static str {
    match status {
        ContainerStateStatusEnum::CREATED => "created",
        ContainerStateStatusEnum::RUNNING => "running",
        ContainerStateStatusEnum::PAUSED => "paused",
        ContainerStateStatusEnum::RESTARTING => "restarting",
        ContainerStateStatusEnum::REMOVING => "removing",
        ContainerStateStatusEnum::EXITED => "exited",
        ContainerStateStatusEnum::DEAD => "dead",
        _ => "unknown",
    }
}

#[async_trait]
impl Client for DockerClient {
    async fn create_container(
        &self,
        service_id: &ServiceId,
        spec: &ServiceSpec,
        machine_id: &MachineId,
    ) -> Result<CreatedContainer, ClientError> {
        let docker = self.engine(machine_id)?;
        let body = Self::container_body(service_id, spec);

        let response = docker
            .create_container(None::<CreateContainerOptions>, body)
            .await
            .map_err(map_create_error)?;

        let id = ContainerId::new(response.id);
        tracing::debug!(
            container_id = %id.short(),
            machine_id = %machine_id,
            image = %spec.container.image,
            "created container"
        );
        self.placements
            .write()
            .insert(id.clone(), machine_id.clone());

        Ok(CreatedContainer {
            id,
            warnings: response.warnings,
        })
    }

    async fn start_container(
        &self,
        _service_id: &ServiceId,
        container_id: &ContainerId,
    ) -> Result<(), ClientError> {
        self.engine_for(container_id)
            .await?
            .start_container(container_id.as_str(), None::<StartContainerOptions>)
            .await
            .map_err(map_not_found_error)
    }

    async fn stop_container(
        &self,
        _service_id: &ServiceId,
        container_id: &ContainerId,
        opts: &StopOptions,
    ) -> Result<(), ClientError> {
        let engine_opts = StopContainerOptions {
            t: opts.timeout.map(stop_timeout_secs),
            signal: opts.signal.clone(),
        };

        self.engine_for(container_id)
            .await?
            .stop_container(container_id.as_str(), Some(engine_opts))
            .await
            .map_err(map_stop_error)
    }

    async fn remove_container(
        &self,
        _service_id: &ServiceId,
        container_id: &ContainerId,
        opts: &RemoveOptions,
    ) -> Result<(), ClientError> {
        let engine_opts = RemoveContainerOptions {
            v: opts.remove_volumes,
            force: opts.force,
            ..Default::default()
        };

        self.engine_for(container_id)
            .await?
            .remove_container(container_id.as_str(), Some(engine_opts))
            .await
            .map_err(map_not_found_error)?;

        self.placements.write().remove(container_id);
        Ok(())
    }

    async fn inspect_container(
        &self,
        _service_id: &ServiceId,
        container_id: &ContainerId,
    ) -> Result<ContainerRecord, ClientError> {
        let details = self
            .engine_for(container_id)
            .await?
            .inspect_container(container_id.as_str(), None::<InspectContainerOptions>)
            .await
            .map_err(map_not_found_error)?;

        let state = details.state.unwrap_or_default();

        let health = state.health.and_then(|h| {
            let status = match h.status? {
                HealthStatusEnum::STARTING => HealthStatus::Starting,
                HealthStatusEnum::HEALTHY => HealthStatus::Healthy,
                HealthStatusEnum::UNHEALTHY => HealthStatus::Unhealthy,
                // "none" means no healthcheck is configured.
                _ => return None,
            };
            let log = h
                .log
                .unwrap_or_default()
                .into_iter()
                .map(|entry| HealthLogEntry {
                    exit_code: entry.exit_code.unwrap_or_default(),
                    output: entry.output.unwrap_or_default(),
                })
                .collect();
            Some(Health { status, log })
        });

        let config = details.config.unwrap_or_default();

        Ok(ContainerRecord {
            id: container_id.clone(),
            name: details
                .name
                .unwrap_or_default()
                .trim_start_matches('/')
                .to_string(),
            image: config.image.unwrap_or_default(),
            labels: config.labels.unwrap_or_default(),
            state: ContainerStatus {
                running: state.running.unwrap_or(false),
                status: state
                    .status
                    .map(status_name)
                    .unwrap_or("unknown")
                    .to_string(),
                exit_code: state.exit_code.unwrap_or_default(),
                health,
            },
        })
    }

    async fn create_volume(
        &self,
        machine_id: &MachineId,
        opts: &VolumeCreateOptions,
    ) -> Result<VolumeRef, ClientError> {
        let docker = self.engine(machine_id)?;

        let request = Self::volume_request(opts);

        let volume = docker
            .create_volume(request)
            .await
            .map_err(map_volume_error)?;

        Ok(VolumeRef {
            name: volume.name,
            driver: volume.driver,
            machine_id: machine_id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{HealthcheckSpec, VolumeMountSpec, VolumeSpec};

    #[test]
    fn container_body_carries_service_labels() {
        let spec = ServiceSpec::with_image("web", "app:v2");
        let body = DockerClient::container_body(&ServiceId::new("svc-1"), &spec);

        let labels = body.labels.unwrap();
        assert_eq!(labels.get(LABEL_SERVICE_ID).map(String::as_str), Some("svc-1"));
        assert_eq!(labels.get(LABEL_MANAGED).map(String::as_str), Some("true"));
        assert_eq!(body.image.as_deref(), Some("app:v2"));
        assert!(body.healthcheck.is_none());
    }

    #[test]
    fn container_body_mounts_named_volumes_only() {
        let mut spec = ServiceSpec::with_image("web", "app:v2");
        spec.volumes.push(VolumeSpec::named("data"));
        spec.volumes.push(VolumeSpec {
            name: "scratch".to_string(),
            kind: VolumeType::Tmpfs,
            volume_options: None,
        });
        spec.container.volume_mounts = vec![
            VolumeMountSpec {
                volume_name: "data".to_string(),
                container_path: "/var/lib/app".to_string(),
                read_only: false,
            },
            VolumeMountSpec {
                volume_name: "scratch".to_string(),
                container_path: "/tmp".to_string(),
                read_only: false,
            },
        ];

        let body = DockerClient::container_body(&ServiceId::new("svc-1"), &spec);
        let mounts = body.host_config.unwrap().mounts.unwrap();
        assert_eq!(mounts.len(), 1);
        assert_eq!(mounts[0].source.as_deref(), Some("data"));
        assert_eq!(mounts[0].target.as_deref(), Some("/var/lib/app"));
    }

    #[test]
    fn container_body_converts_healthcheck_durations() {
        let mut spec = ServiceSpec::with_image("web", "app:v2");
        spec.container.healthcheck = Some(HealthcheckSpec {
            test: vec!["CMD-SHELL".to_string(), "true".to_string()],
            interval: Duration::from_secs(2),
            timeout: Duration::from_secs(1),
            retries: 5,
            start_period: Duration::ZERO,
        });

        let body = DockerClient::container_body(&ServiceId::new("svc-1"), &spec);
        let hc = body.healthcheck.unwrap();
        assert_eq!(hc.interval, Some(2_000_000_000));
        assert_eq!(hc.retries, Some(5));
    }

    #[test]
    fn stop_error_maps_not_modified_to_not_running() {
        let err = map_stop_error(bollard::errors::Error::DockerResponseServerError {
            status_code: 304,
            message: "already stopped".to_string(),
        });
        assert!(matches!(err, ClientError::NotRunning(_)));
    }

    #[test]
    fn huge_durations_saturate_instead_of_wrapping() {
        let mut spec = ServiceSpec::with_image("web", "app:v2");
        spec.container.healthcheck = Some(HealthcheckSpec {
            test: vec!["CMD".to_string(), "true".to_string()],
            interval: Duration::from_secs(u64::MAX),
            timeout: Duration::from_secs(1),
            retries: u32::MAX,
            start_period: Duration::ZERO,
        });

        let hc = DockerClient::container_body(&ServiceId::new("svc-1"), &spec)
            .healthcheck
            .unwrap();
        assert_eq!(hc.interval, Some(i64::MAX));
        assert_eq!(hc.timeout, Some(1_000_000_000));
        assert_eq!(hc.retries, Some(i64::from(u32::MAX)));

        assert_eq!(stop_timeout_secs(Duration::from_secs(u64::MAX)), i32::MAX);
        assert_eq!(stop_timeout_secs(Duration::from_secs(10)), 10);
    }

    #[test]
    fn probe_skips_only_missing_containers() {
        let machine = MachineId::new("edge-1");

        let missing = bollard::errors::Error::DockerResponseServerError {
            status_code: 404,
            message: "No such container".to_string(),
        };
        assert!(map_probe_error(&machine, missing).is_none());

        let server = bollard::errors::Error::DockerResponseServerError {
            status_code: 500,
            message: "boom".to_string(),
        };
        assert!(matches!(
            map_probe_error(&machine, server),
            Some(ClientError::Runtime(msg)) if msg.starts_with("edge-1: ")
        ));

        let unreachable = bollard::errors::Error::IOError {
            err: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
        };
        assert!(matches!(
            map_probe_error(&machine, unreachable),
            Some(ClientError::Connection(_))
        ));
    }

    #[test]
    fn volume_request_omits_empty_fields() {
        let bare = DockerClient::volume_request(&VolumeCreateOptions {
            name: "data".to_string(),
            ..Default::default()
        });
        assert_eq!(bare.name.as_deref(), Some("data"));
        assert!(bare.driver.is_none());
        assert!(bare.driver_opts.is_none());
        assert!(bare.labels.is_none());

        let full = DockerClient::volume_request(&VolumeCreateOptions {
            name: "pg-data".to_string(),
            driver: "local".to_string(),
            driver_opts: HashMap::from([("type".to_string(), "nfs".to_string())]),
            labels: HashMap::from([("tier".to_string(), "db".to_string())]),
        });
        assert_eq!(full.driver.as_deref(), Some("local"));
        assert_eq!(
            full.driver_opts.unwrap().get("type").map(String::as_str),
            Some("nfs")
        );
        assert_eq!(full.labels.unwrap().get("tier").map(String::as_str), Some("db"));
    }
}
