// ABOUTME: Configuration types and parsing for rollout.yml.
// ABOUTME: Declares the machines to connect to and the health-gate policy.

mod deserialize;
mod health;
mod machine;

pub use health::HealthPolicy;
pub use machine::{DEFAULT_SOCKET, MachineConfig};

use crate::client::StaticNameResolver;
use crate::error::{Error, Result};
use deserialize::deserialize_machines;
use nonempty::NonEmpty;
use serde::Deserialize;
use std::path::Path;

pub const CONFIG_FILENAME: &str = "rollout.yml";
pub const CONFIG_FILENAME_ALT: &str = "rollout.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".rollout/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(deserialize_with = "deserialize_machines")]
    pub machines: NonEmpty<MachineConfig>,

    #[serde(default)]
    pub health: HealthPolicy,
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.health.validate().map_err(Error::InvalidConfig)?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!("Loading config from {}", path.display());
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Resolver that displays machines by their configured names.
    pub fn name_resolver(&self) -> StaticNameResolver {
        let mut resolver = StaticNameResolver::new();
        for machine in self.machines.iter() {
            resolver.insert_machine(machine.id.clone(), machine.name.clone());
        }
        resolver
    }

    /// Single local machine with the default policy.
    pub fn local() -> Self {
        Config {
            machines: NonEmpty::new(MachineConfig {
                id: "local".into(),
                name: "local".to_string(),
                socket: DEFAULT_SOCKET.to_string(),
            }),
            health: HealthPolicy::default(),
        }
    }
}
