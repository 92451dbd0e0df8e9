// ABOUTME: Declarative volume specification consumed by volume operations.
// ABOUTME: Defines volume kinds, driver options, and the engine volume name rule.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Kind of storage a volume spec describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeType {
    /// A host path mounted into the container.
    Bind,
    /// A named volume managed by the container engine.
    Volume,
    /// An in-memory filesystem.
    Tmpfs,
}

impl fmt::Display for VolumeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolumeType::Bind => write!(f, "bind"),
            VolumeType::Volume => write!(f, "volume"),
            VolumeType::Tmpfs => write!(f, "tmpfs"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeSpec {
    /// Name the service refers to the volume by.
    pub name: String,

    #[serde(rename = "type")]
    pub kind: VolumeType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_options: Option<VolumeOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeOptions {
    /// Engine-level volume name, when it differs from the declared name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<VolumeDriver>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub labels: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeDriver {
    pub name: String,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub options: HashMap<String, String>,
}

impl VolumeSpec {
    /// A named volume with no extra options.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: VolumeType::Volume,
            volume_options: None,
        }
    }

    /// Name of the volume as the container engine knows it.
    ///
    /// An explicit `volume_options.name` wins over the declared name.
    pub fn docker_volume_name(&self) -> &str {
        self.volume_options
            .as_ref()
            .and_then(|o| o.name.as_deref())
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.name)
    }
}
