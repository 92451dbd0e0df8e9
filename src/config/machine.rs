// ABOUTME: Machine entries: cluster member ID, display name, and engine socket.
// ABOUTME: Parses the short "id" form as well as the detailed mapping form.

use crate::types::MachineId;
use serde::Deserialize;

pub const DEFAULT_SOCKET: &str = "/var/run/docker.sock";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineConfig {
    pub id: MachineId,
    pub name: String,
    pub socket: String,
}

impl MachineConfig {
    /// A machine named after its ID, reached through the default socket.
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        let id = id.trim();
        if id.is_empty() {
            return Err("machine id cannot be empty".to_string());
        }

        Ok(MachineConfig {
            id: MachineId::new(id),
            name: id.to_string(),
            socket: DEFAULT_SOCKET.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum MachineEntry {
    Simple(String),
    Detailed {
        id: String,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        socket: Option<String>,
    },
}

impl MachineEntry {
    pub(super) fn into_machine_config(self) -> Result<MachineConfig, String> {
        match self {
            MachineEntry::Simple(id) => MachineConfig::new(id),
            MachineEntry::Detailed { id, name, socket } => {
                let mut machine = MachineConfig::new(id)?;
                if let Some(name) = name {
                    machine.name = name;
                }
                if let Some(socket) = socket {
                    machine.socket = socket;
                }
                Ok(machine)
            }
        }
    }
}
