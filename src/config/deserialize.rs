// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Turns the machine list into a validated non-empty set.

use nonempty::NonEmpty;
use serde::Deserialize;
use std::collections::HashSet;

use super::MachineConfig;
use super::machine::MachineEntry;

pub fn deserialize_machines<'de, D>(deserializer: D) -> Result<NonEmpty<MachineConfig>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values: Vec<MachineEntry> = Vec::deserialize(deserializer)?;
    let machines = values
        .into_iter()
        .map(|entry| entry.into_machine_config())
        .collect::<Result<Vec<_>, _>>()
        .map_err(serde::de::Error::custom)?;

    let mut seen = HashSet::new();
    for machine in &machines {
        if !seen.insert(machine.id.as_str()) {
            return Err(serde::de::Error::custom(format!(
                "duplicate machine id: {}",
                machine.id
            )));
        }
    }

    NonEmpty::from_vec(machines)
        .ok_or_else(|| serde::de::Error::custom("at least one machine is required"))
}
