// ABOUTME: Volume provisioning operation.
// ABOUTME: Rejects non-named volume specs before any side effect, then creates the volume.

use std::fmt;

use async_trait::async_trait;
use snafu::ResultExt;
use tokio_util::sync::CancellationToken;

use super::error::{CreateVolumeSnafu, OperationError};
use super::{Operation, until_cancelled};
use crate::client::{Client, NameResolver, VolumeCreateOptions};
use crate::spec::{VolumeSpec, VolumeType};
use crate::types::MachineId;

/// Creates a named volume on a machine.
#[derive(Debug, Clone)]
pub struct CreateVolumeOperation {
    pub volume: VolumeSpec,
    pub machine_id: MachineId,
    /// Used for formatting the operation output only.
    pub machine_name: String,
}

impl CreateVolumeOperation {
    pub fn new(volume: VolumeSpec, machine_id: MachineId, machine_name: impl Into<String>) -> Self {
        Self {
            volume,
            machine_id,
            machine_name: machine_name.into(),
        }
    }

    fn create_options(&self) -> VolumeCreateOptions {
        let mut opts = VolumeCreateOptions {
            name: self.volume.docker_volume_name().to_string(),
            ..Default::default()
        };
        if let Some(options) = &self.volume.volume_options {
            if let Some(driver) = &options.driver {
                opts.driver = driver.name.clone();
                opts.driver_opts = driver.options.clone();
            }
            opts.labels = options.labels.clone();
        }
        opts
    }
}

#[async_trait]
impl Operation for CreateVolumeOperation {
    async fn execute(
        &self,
        client: &dyn Client,
        cancel: &CancellationToken,
    ) -> Result<(), OperationError> {
        if self.volume.kind != VolumeType::Volume {
            return Err(OperationError::InvalidVolumeType {
                actual: self.volume.kind,
                expected: VolumeType::Volume,
            });
        }

        let opts = self.create_options();
        let volume = until_cancelled(cancel, client.create_volume(&self.machine_id, &opts))
            .await?
            .context(CreateVolumeSnafu)?;

        tracing::info!(
            volume = %volume.name,
            driver = %volume.driver,
            machine_id = %self.machine_id,
            "created volume"
        );
        Ok(())
    }

    fn format(&self, _resolver: &dyn NameResolver) -> String {
        format!(
            "{}: Create volume [name={}]",
            self.machine_name,
            self.volume.docker_volume_name()
        )
    }
}

impl fmt::Display for CreateVolumeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CreateVolumeOperation[machine_id={} volume={}]",
            self.machine_id,
            self.volume.docker_volume_name()
        )
    }
}
