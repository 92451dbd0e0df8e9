// ABOUTME: Test support utilities.
// ABOUTME: Scripted in-memory Client that records every call, plus tracing setup.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use rollout::client::{
    Client, ClientError, ContainerRecord, ContainerStatus, CreatedContainer, Health,
    HealthLogEntry, HealthStatus, LABEL_SERVICE_ID, RemoveOptions, StopOptions,
    VolumeCreateOptions, VolumeRef,
};
use rollout::spec::ServiceSpec;
use rollout::types::{ContainerId, MachineId, ServiceId};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("rollout=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// ID handed out by `MockClient::create_container`.
pub const NEW_CONTAINER_ID: &str = "c0ffee0123456789abcdef";

/// A Client call as observed by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create {
        service_id: String,
        machine_id: String,
        image: String,
    },
    Start {
        container_id: String,
    },
    Stop {
        service_id: String,
        container_id: String,
    },
    Remove {
        container_id: String,
        remove_volumes: bool,
    },
    Inspect {
        container_id: String,
    },
    CreateVolume {
        machine_id: String,
        opts: VolumeCreateOptions,
    },
}

/// Which call the mock should fail or block on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    Create,
    Start,
    /// Stop of one specific container.
    Stop(String),
    Remove,
    Inspect,
    CreateVolume,
}

pub struct MockClient {
    calls: Mutex<Vec<Call>>,
    inspections: Mutex<VecDeque<ContainerStatus>>,
    failing: HashSet<Method>,
    hanging: HashSet<Method>,
}

impl MockClient {
    /// A client whose containers report running with no healthcheck.
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            inspections: Mutex::new(VecDeque::from([running()])),
            failing: HashSet::new(),
            hanging: HashSet::new(),
        }
    }

    /// States returned by successive inspects; the last one repeats forever.
    pub fn with_inspections(self, states: impl IntoIterator<Item = ContainerStatus>) -> Self {
        *self.inspections.lock() = states.into_iter().collect();
        self
    }

    pub fn failing(mut self, method: Method) -> Self {
        self.failing.insert(method);
        self
    }

    /// Calls to `method` never complete.
    pub fn hanging(mut self, method: Method) -> Self {
        self.hanging.insert(method);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn inspect_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, Call::Inspect { .. }))
            .count()
    }

    async fn enter(&self, method: Method, call: Call) -> Result<(), ClientError> {
        self.calls.lock().push(call);
        if self.hanging.contains(&method) {
            std::future::pending::<()>().await;
        }
        if self.failing.contains(&method) {
            return Err(ClientError::Runtime(format!("mock {:?} failure", method)));
        }
        Ok(())
    }

    fn next_status(&self) -> ContainerStatus {
        let mut states = self.inspections.lock();
        if states.len() > 1 {
            states.pop_front().unwrap_or_else(running)
        } else {
            states.front().cloned().unwrap_or_else(running)
        }
    }
}

#[async_trait]
impl Client for MockClient {
    async fn create_container(
        &self,
        service_id: &ServiceId,
        spec: &ServiceSpec,
        machine_id: &MachineId,
    ) -> Result<CreatedContainer, ClientError> {
        self.enter(
            Method::Create,
            Call::Create {
                service_id: service_id.to_string(),
                machine_id: machine_id.to_string(),
                image: spec.container.image.clone(),
            },
        )
        .await?;
        Ok(CreatedContainer {
            id: ContainerId::new(NEW_CONTAINER_ID),
            warnings: vec![],
        })
    }

    async fn start_container(
        &self,
        _service_id: &ServiceId,
        container_id: &ContainerId,
    ) -> Result<(), ClientError> {
        self.enter(
            Method::Start,
            Call::Start {
                container_id: container_id.to_string(),
            },
        )
        .await
    }

    async fn stop_container(
        &self,
        service_id: &ServiceId,
        container_id: &ContainerId,
        _opts: &StopOptions,
    ) -> Result<(), ClientError> {
        self.enter(
            Method::Stop(container_id.to_string()),
            Call::Stop {
                service_id: service_id.to_string(),
                container_id: container_id.to_string(),
            },
        )
        .await
    }

    async fn remove_container(
        &self,
        _service_id: &ServiceId,
        container_id: &ContainerId,
        opts: &RemoveOptions,
    ) -> Result<(), ClientError> {
        self.enter(
            Method::Remove,
            Call::Remove {
                container_id: container_id.to_string(),
                remove_volumes: opts.remove_volumes,
            },
        )
        .await
    }

    async fn inspect_container(
        &self,
        service_id: &ServiceId,
        container_id: &ContainerId,
    ) -> Result<ContainerRecord, ClientError> {
        self.enter(
            Method::Inspect,
            Call::Inspect {
                container_id: container_id.to_string(),
            },
        )
        .await?;
        Ok(ContainerRecord {
            id: container_id.clone(),
            name: "web-1".to_string(),
            image: "app:v2".to_string(),
            labels: HashMap::from([(LABEL_SERVICE_ID.to_string(), service_id.to_string())]),
            state: self.next_status(),
        })
    }

    async fn create_volume(
        &self,
        machine_id: &MachineId,
        opts: &VolumeCreateOptions,
    ) -> Result<VolumeRef, ClientError> {
        self.enter(
            Method::CreateVolume,
            Call::CreateVolume {
                machine_id: machine_id.to_string(),
                opts: opts.clone(),
            },
        )
        .await?;
        Ok(VolumeRef {
            name: opts.name.clone(),
            driver: if opts.driver.is_empty() {
                "local".to_string()
            } else {
                opts.driver.clone()
            },
            machine_id: machine_id.clone(),
        })
    }
}

// =============================================================================
// Container states
// =============================================================================

/// Running, no healthcheck declared.
pub fn running() -> ContainerStatus {
    ContainerStatus {
        running: true,
        status: "running".to_string(),
        exit_code: 0,
        health: None,
    }
}

pub fn exited(exit_code: i64) -> ContainerStatus {
    ContainerStatus {
        running: false,
        status: "exited".to_string(),
        exit_code,
        health: None,
    }
}

fn with_health(status: HealthStatus, outputs: &[&str]) -> ContainerStatus {
    ContainerStatus {
        health: Some(Health {
            status,
            log: outputs
                .iter()
                .map(|o| HealthLogEntry {
                    exit_code: if status == HealthStatus::Healthy { 0 } else { 1 },
                    output: o.to_string(),
                })
                .collect(),
        }),
        ..running()
    }
}

pub fn starting() -> ContainerStatus {
    with_health(HealthStatus::Starting, &[])
}

pub fn healthy() -> ContainerStatus {
    with_health(HealthStatus::Healthy, &["ok"])
}

pub fn unhealthy(last_output: &str) -> ContainerStatus {
    with_health(HealthStatus::Unhealthy, &["starting up", last_output])
}

/// A container record as a planner would pass it to a remove operation.
pub fn existing_container(id: &str, service_id: &str, image: &str) -> ContainerRecord {
    ContainerRecord {
        id: ContainerId::new(id),
        name: format!("{}-old", service_id),
        image: image.to_string(),
        labels: HashMap::from([(LABEL_SERVICE_ID.to_string(), service_id.to_string())]),
        state: running(),
    }
}
