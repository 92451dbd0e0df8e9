// ABOUTME: Shared types for the Client contract.
// ABOUTME: Container records, health state, and options for stop/remove/volume calls.

use crate::types::{ContainerId, MachineId, ServiceId};
use std::collections::HashMap;
use std::time::Duration;

/// Label carrying the ID of the service a container belongs to.
pub const LABEL_SERVICE_ID: &str = "rollout.service.id";
/// Label marking containers created through this crate.
pub const LABEL_MANAGED: &str = "rollout.managed";

/// Reference to a container returned by `Client::create_container`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedContainer {
    pub id: ContainerId,
    /// Non-fatal messages from the engine (e.g. deprecated options).
    pub warnings: Vec<String>,
}

/// Reference to a volume returned by `Client::create_volume`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeRef {
    pub name: String,
    pub driver: String,
    pub machine_id: MachineId,
}

/// Options for stopping a container. The default defers to the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopOptions {
    /// Grace period before the engine kills the container.
    pub timeout: Option<Duration>,
    /// Signal to send instead of the image's stop signal.
    pub signal: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoveOptions {
    /// Delete anonymous volumes owned only by the container.
    pub remove_volumes: bool,
    /// Kill the container first if it is still running.
    pub force: bool,
}

/// Options for creating a named volume on a machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolumeCreateOptions {
    pub name: String,
    /// Empty means the engine's default driver.
    pub driver: String,
    pub driver_opts: HashMap<String, String>,
    pub labels: HashMap<String, String>,
}

/// Runtime view of a container as returned by `Client::inspect_container`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRecord {
    pub id: ContainerId,
    pub name: String,
    pub image: String,
    pub labels: HashMap<String, String>,
    pub state: ContainerStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerStatus {
    pub running: bool,
    /// Engine lifecycle status: "created", "running", "exited", ...
    pub status: String,
    pub exit_code: i64,
    /// Present only when the container declares a healthcheck.
    pub health: Option<Health>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Health {
    pub status: HealthStatus,
    /// Recent healthcheck results, oldest first.
    pub log: Vec<HealthLogEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Starting,
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthLogEntry {
    pub exit_code: i64,
    pub output: String,
}

impl ContainerRecord {
    /// Service the container belongs to, read from its labels.
    ///
    /// Containers without the label yield an empty ID.
    pub fn service_id(&self) -> ServiceId {
        ServiceId::new(
            self.labels
                .get(LABEL_SERVICE_ID)
                .cloned()
                .unwrap_or_default(),
        )
    }

    pub fn short_id(&self) -> &str {
        self.id.short()
    }

    /// Running with a healthcheck that reports healthy.
    pub fn healthy(&self) -> bool {
        self.state.running
            && self
                .state
                .health
                .as_ref()
                .is_some_and(|h| h.status == HealthStatus::Healthy)
    }
}

impl Health {
    /// Trimmed output of the most recent healthcheck run.
    pub fn last_output(&self) -> Option<&str> {
        self.log.last().map(|entry| entry.output.trim())
    }
}
