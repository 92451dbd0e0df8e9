// ABOUTME: Declarative service and volume specifications read by operations.
// ABOUTME: Operations consume these values but never mutate them.

mod service;
mod volume;

pub use service::{ContainerSpec, HealthcheckSpec, ServiceSpec, VolumeMountSpec};
pub use volume::{VolumeDriver, VolumeOptions, VolumeSpec, VolumeType};
