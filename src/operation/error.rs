// ABOUTME: Error types for operation execution and the health gate.
// ABOUTME: Each failing step gets a short prefix; the underlying cause stays reachable via source().

use snafu::Snafu;
use std::time::Duration;

use crate::client::ClientError;
use crate::spec::VolumeType;

/// Failure of a single operation.
///
/// Cancellation is never wrapped: whichever step observes it, `execute`
/// returns `Cancelled` itself.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum OperationError {
    #[snafu(display("create container: {source}"))]
    CreateContainer { source: ClientError },

    #[snafu(display("start container: {source}"))]
    StartContainer { source: ClientError },

    #[snafu(display("wait for container healthy: {source}"))]
    WaitHealthy { source: HealthError },

    #[snafu(display("stop container: {source}"))]
    StopContainer { source: ClientError },

    #[snafu(display("remove container: {source}"))]
    RemoveContainer { source: ClientError },

    #[snafu(display("invalid volume type: '{actual}', expected '{expected}'"))]
    InvalidVolumeType {
        actual: VolumeType,
        expected: VolumeType,
    },

    #[snafu(display("create volume: {source}"))]
    CreateVolume { source: ClientError },

    #[snafu(display("operation cancelled"))]
    Cancelled,
}

/// Readiness failures reported by the health gate.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum HealthError {
    #[snafu(display("inspect container: {source}"))]
    Inspect { source: ClientError },

    #[snafu(display("inspect container after no-healthcheck wait: {source}"))]
    InspectAfterWait { source: ClientError },

    #[snafu(display(
        "container {container} exited during healthcheck wait (status: {status}, exit code: {exit_code})"
    ))]
    Crashed {
        container: String,
        status: String,
        exit_code: i64,
    },

    #[snafu(display(
        "container {container} exited shortly after start (status: {status}, exit code: {exit_code})"
    ))]
    ExitedAfterStart {
        container: String,
        status: String,
        exit_code: i64,
    },

    #[snafu(display("container {container} became unhealthy: {last_log}"))]
    Unhealthy { container: String, last_log: String },

    #[snafu(display(
        "timeout waiting for container {container} to become healthy after {}s",
        elapsed.as_secs()
    ))]
    TimedOut { container: String, elapsed: Duration },

    #[snafu(display("health check cancelled"), context(name(GateCancelledSnafu)))]
    Cancelled,
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationErrorKind {
    /// A Client call failed (runtime or connectivity).
    Client,
    /// The container crashed, became unhealthy, or never became ready.
    Readiness,
    /// Input was rejected before any side effect.
    Precondition,
    /// The governing cancellation token fired.
    Cancelled,
}

impl OperationError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> OperationErrorKind {
        match self {
            OperationError::CreateContainer { .. }
            | OperationError::StartContainer { .. }
            | OperationError::StopContainer { .. }
            | OperationError::RemoveContainer { .. }
            | OperationError::CreateVolume { .. } => OperationErrorKind::Client,
            OperationError::WaitHealthy { source } => match source {
                HealthError::Inspect { .. } | HealthError::InspectAfterWait { .. } => {
                    OperationErrorKind::Client
                }
                HealthError::Cancelled => OperationErrorKind::Cancelled,
                _ => OperationErrorKind::Readiness,
            },
            OperationError::InvalidVolumeType { .. } => OperationErrorKind::Precondition,
            OperationError::Cancelled => OperationErrorKind::Cancelled,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind() == OperationErrorKind::Cancelled
    }
}

/// Marker returned when a call loses the race against cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Interrupted;

impl From<Interrupted> for OperationError {
    fn from(_: Interrupted) -> Self {
        OperationError::Cancelled
    }
}

impl From<Interrupted> for HealthError {
    fn from(_: Interrupted) -> Self {
        HealthError::Cancelled
    }
}
