// ABOUTME: Stop and remove operations for existing containers.
// ABOUTME: Fire-and-confirm calls with no readiness interaction and no retries.

use std::fmt;

use async_trait::async_trait;
use snafu::ResultExt;
use tokio_util::sync::CancellationToken;

use super::error::{OperationError, RemoveContainerSnafu, StopContainerSnafu};
use super::{Operation, until_cancelled};
use crate::client::{Client, ContainerRecord, NameResolver, RemoveOptions, StopOptions};
use crate::types::{ContainerId, MachineId, ServiceId};

/// Stops a container on a machine.
#[derive(Debug, Clone)]
pub struct StopContainerOperation {
    pub service_id: ServiceId,
    pub container_id: ContainerId,
    pub machine_id: MachineId,
}

impl StopContainerOperation {
    pub fn new(service_id: ServiceId, container_id: ContainerId, machine_id: MachineId) -> Self {
        Self {
            service_id,
            container_id,
            machine_id,
        }
    }
}

#[async_trait]
impl Operation for StopContainerOperation {
    async fn execute(
        &self,
        client: &dyn Client,
        cancel: &CancellationToken,
    ) -> Result<(), OperationError> {
        until_cancelled(
            cancel,
            client.stop_container(&self.service_id, &self.container_id, &StopOptions::default()),
        )
        .await?
        .context(StopContainerSnafu)?;

        tracing::info!(
            container_id = %self.container_id.short(),
            machine_id = %self.machine_id,
            "stopped container"
        );
        Ok(())
    }

    fn format(&self, resolver: &dyn NameResolver) -> String {
        format!(
            "{}: Stop container [id={} name={}]",
            resolver.machine_name(&self.machine_id),
            self.container_id.short(),
            resolver.container_name(&self.container_id)
        )
    }
}

impl fmt::Display for StopContainerOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StopContainerOperation[machine_id={} service_id={} container_id={}]",
            self.machine_id, self.service_id, self.container_id
        )
    }
}

/// Stops and removes a container, along with its anonymous volumes.
///
/// If the stop succeeds but the removal fails, the container is left
/// stopped for later reconciliation.
#[derive(Debug, Clone)]
pub struct RemoveContainerOperation {
    pub machine_id: MachineId,
    pub container: ContainerRecord,
}

impl RemoveContainerOperation {
    pub fn new(machine_id: MachineId, container: ContainerRecord) -> Self {
        Self {
            machine_id,
            container,
        }
    }
}

#[async_trait]
impl Operation for RemoveContainerOperation {
    async fn execute(
        &self,
        client: &dyn Client,
        cancel: &CancellationToken,
    ) -> Result<(), OperationError> {
        let service_id = self.container.service_id();
        let container_id = &self.container.id;

        until_cancelled(
            cancel,
            client.stop_container(&service_id, container_id, &StopOptions::default()),
        )
        .await?
        .context(StopContainerSnafu)?;

        let opts = RemoveOptions {
            remove_volumes: true,
            force: false,
        };
        until_cancelled(cancel, client.remove_container(&service_id, container_id, &opts))
            .await?
            .context(RemoveContainerSnafu)?;

        tracing::info!(
            container_id = %container_id.short(),
            machine_id = %self.machine_id,
            "removed container"
        );
        Ok(())
    }

    fn format(&self, resolver: &dyn NameResolver) -> String {
        format!(
            "{}: Remove container [id={} image={}]",
            resolver.machine_name(&self.machine_id),
            self.container.short_id(),
            self.container.image
        )
    }
}

impl fmt::Display for RemoveContainerOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RemoveContainerOperation[machine_id={} service_id={} container_id={}]",
            self.machine_id,
            self.container.service_id(),
            self.container.id
        )
    }
}
