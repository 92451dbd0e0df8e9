// ABOUTME: Name resolution for human-readable operation output.
// ABOUTME: Maps machine and container IDs to display names; never used for execution.

use crate::types::{ContainerId, MachineId};
use std::collections::HashMap;

/// Resolves machine and container IDs to their display names.
///
/// Lookups cannot fail: unknown IDs resolve to a best-effort placeholder.
pub trait NameResolver: Send + Sync {
    fn machine_name(&self, machine_id: &MachineId) -> String;
    fn container_name(&self, container_id: &ContainerId) -> String;
}

/// Map-backed resolver. Unknown machines resolve to their ID, unknown
/// containers to their short ID.
#[derive(Debug, Clone, Default)]
pub struct StaticNameResolver {
    machines: HashMap<MachineId, String>,
    containers: HashMap<ContainerId, String>,
}

impl StaticNameResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_machine(mut self, id: impl Into<MachineId>, name: impl Into<String>) -> Self {
        self.machines.insert(id.into(), name.into());
        self
    }

    pub fn with_container(mut self, id: impl Into<ContainerId>, name: impl Into<String>) -> Self {
        self.containers.insert(id.into(), name.into());
        self
    }

    pub fn insert_machine(&mut self, id: MachineId, name: String) {
        self.machines.insert(id, name);
    }

    pub fn insert_container(&mut self, id: ContainerId, name: String) {
        self.containers.insert(id, name);
    }
}

impl NameResolver for StaticNameResolver {
    fn machine_name(&self, machine_id: &MachineId) -> String {
        self.machines
            .get(machine_id)
            .cloned()
            .unwrap_or_else(|| machine_id.to_string())
    }

    fn container_name(&self, container_id: &ContainerId) -> String {
        self.containers
            .get(container_id)
            .cloned()
            .unwrap_or_else(|| container_id.short().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_names() {
        let resolver = StaticNameResolver::new()
            .with_machine("m1", "edge-1")
            .with_container("c0ffee", "web-1");

        assert_eq!(resolver.machine_name(&MachineId::new("m1")), "edge-1");
        assert_eq!(resolver.container_name(&ContainerId::new("c0ffee")), "web-1");
    }

    #[test]
    fn unknown_ids_fall_back_to_ids() {
        let resolver = StaticNameResolver::new();

        assert_eq!(resolver.machine_name(&MachineId::new("m9")), "m9");
        assert_eq!(
            resolver.container_name(&ContainerId::new("0123456789abcdef")),
            "0123456789ab"
        );
    }
}
