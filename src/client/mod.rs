// ABOUTME: Capability contract operations use to act on machines.
// ABOUTME: Defines the Client trait, its errors, name resolution, and a bollard backend.

mod docker;
mod resolver;
mod types;

pub use docker::DockerClient;
pub use resolver::{NameResolver, StaticNameResolver};
pub use types::*;

use crate::spec::ServiceSpec;
use crate::types::{ContainerId, MachineId, ServiceId};
use async_trait::async_trait;

/// Container and volume lifecycle calls against the cluster's machines.
///
/// Every call blocks until the engine acknowledges it or fails. Callers
/// race calls against their cancellation token, so implementations do not
/// need to observe cancellation themselves.
#[async_trait]
pub trait Client: Send + Sync {
    /// Create (but do not start) a container for a service on a machine.
    async fn create_container(
        &self,
        service_id: &ServiceId,
        spec: &ServiceSpec,
        machine_id: &MachineId,
    ) -> Result<CreatedContainer, ClientError>;

    async fn start_container(
        &self,
        service_id: &ServiceId,
        container_id: &ContainerId,
    ) -> Result<(), ClientError>;

    async fn stop_container(
        &self,
        service_id: &ServiceId,
        container_id: &ContainerId,
        opts: &StopOptions,
    ) -> Result<(), ClientError>;

    async fn remove_container(
        &self,
        service_id: &ServiceId,
        container_id: &ContainerId,
        opts: &RemoveOptions,
    ) -> Result<(), ClientError>;

    /// Current runtime state of a container. Never cached by callers.
    async fn inspect_container(
        &self,
        service_id: &ServiceId,
        container_id: &ContainerId,
    ) -> Result<ContainerRecord, ClientError>;

    async fn create_volume(
        &self,
        machine_id: &MachineId,
        opts: &VolumeCreateOptions,
    ) -> Result<VolumeRef, ClientError>;
}

/// Errors from Client calls.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("machine not found: {0}")]
    MachineNotFound(String),

    #[error("container not found: {0}")]
    ContainerNotFound(String),

    #[error("image not found: {0}")]
    ImageNotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("container not running: {0}")]
    NotRunning(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
