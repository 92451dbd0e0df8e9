// ABOUTME: Declarative service and container specification.
// ABOUTME: Describes the image, healthcheck, and mounts of a desired container.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use super::VolumeSpec;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub name: String,
    pub container: ContainerSpec,
    #[serde(default)]
    pub volumes: Vec<VolumeSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub image: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,

    #[serde(default)]
    pub env: HashMap<String, String>,

    #[serde(default)]
    pub labels: HashMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthcheck: Option<HealthcheckSpec>,

    #[serde(default)]
    pub volume_mounts: Vec<VolumeMountSpec>,
}

/// Healthcheck the engine runs inside the container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthcheckSpec {
    /// Command in engine form, e.g. `["CMD-SHELL", "curl -f localhost"]`.
    pub test: Vec<String>,

    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,

    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    #[serde(default = "default_retries")]
    pub retries: u32,

    #[serde(default, with = "humantime_serde")]
    pub start_period: Duration,
}

fn default_interval() -> Duration {
    Duration::from_secs(30)
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_retries() -> u32 {
    3
}

/// Mount of a service volume into the container filesystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeMountSpec {
    pub volume_name: String,
    pub container_path: String,
    #[serde(default)]
    pub read_only: bool,
}

impl ServiceSpec {
    /// A service running `image` with no healthcheck, mounts, or env.
    pub fn with_image(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            container: ContainerSpec {
                image: image.into(),
                ..Default::default()
            },
            volumes: Vec::new(),
        }
    }

    /// Look up a service volume by the name mounts refer to.
    pub fn volume(&self, name: &str) -> Option<&VolumeSpec> {
        self.volumes.iter().find(|v| v.name == name)
    }
}
