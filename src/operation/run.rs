// ABOUTME: Run operation: create and start a container, then hold until it is ready.
// ABOUTME: Returning only after the health gate passes is what makes rollouts zero-downtime.

use std::fmt;

use async_trait::async_trait;
use snafu::ResultExt;
use tokio_util::sync::CancellationToken;

use super::error::{CreateContainerSnafu, HealthError, OperationError, StartContainerSnafu};
use super::health::HealthGate;
use super::{Operation, until_cancelled};
use crate::client::{Client, NameResolver};
use crate::config::HealthPolicy;
use crate::spec::ServiceSpec;
use crate::types::{MachineId, ServiceId};

/// Creates and starts a new service container on a machine.
///
/// A container that is created but fails to start, or starts but fails the
/// health gate, is left in place for the caller to reconcile.
#[derive(Debug, Clone)]
pub struct RunContainerOperation {
    pub service_id: ServiceId,
    pub spec: ServiceSpec,
    pub machine_id: MachineId,
    pub policy: HealthPolicy,
}

impl RunContainerOperation {
    pub fn new(service_id: ServiceId, spec: ServiceSpec, machine_id: MachineId) -> Self {
        Self {
            service_id,
            spec,
            machine_id,
            policy: HealthPolicy::default(),
        }
    }

    /// Replace the health gate timing.
    pub fn with_policy(mut self, policy: HealthPolicy) -> Self {
        self.policy = policy;
        self
    }
}

#[async_trait]
impl Operation for RunContainerOperation {
    async fn execute(
        &self,
        client: &dyn Client,
        cancel: &CancellationToken,
    ) -> Result<(), OperationError> {
        let created = until_cancelled(
            cancel,
            client.create_container(&self.service_id, &self.spec, &self.machine_id),
        )
        .await?
        .context(CreateContainerSnafu)?;

        for warning in &created.warnings {
            tracing::warn!(container_id = %created.id.short(), "{}", warning);
        }

        until_cancelled(cancel, client.start_container(&self.service_id, &created.id))
            .await?
            .context(StartContainerSnafu)?;

        tracing::info!(
            container_id = %created.id.short(),
            machine_id = %self.machine_id,
            image = %self.spec.container.image,
            "started container, waiting for it to become healthy"
        );

        // The caller may stop the previous replica as soon as this returns.
        let gate = HealthGate::new(&self.service_id, &created.id, self.policy);
        match gate.wait(client, cancel).await {
            Ok(()) => Ok(()),
            Err(HealthError::Cancelled) => Err(OperationError::Cancelled),
            Err(source) => Err(OperationError::WaitHealthy { source }),
        }
    }

    fn format(&self, resolver: &dyn NameResolver) -> String {
        format!(
            "{}: Run container [image={}]",
            resolver.machine_name(&self.machine_id),
            self.spec.container.image
        )
    }
}

impl fmt::Display for RunContainerOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RunContainerOperation[machine_id={} service_id={} image={}]",
            self.machine_id, self.service_id, self.spec.container.image
        )
    }
}
