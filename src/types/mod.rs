// ABOUTME: Type-safe identifiers shared by every module.
// ABOUTME: Uses phantom types to prevent ID confusion at compile time.

mod id;

pub use id::{ContainerId, Id, MachineId, SHORT_ID_LEN, ServiceId};
