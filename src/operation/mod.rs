// ABOUTME: Atomic cluster-mutating operations and their sequential composite.
// ABOUTME: Exports the Operation trait, the concrete operations, and the health gate.

mod container;
mod error;
mod health;
mod run;
mod sequence;
mod volume;

pub use container::{RemoveContainerOperation, StopContainerOperation};
pub use error::{HealthError, OperationError, OperationErrorKind};
pub use health::{GateState, HealthGate, MAX_HEALTH_LOG_CHARS};
pub use run::RunContainerOperation;
pub use sequence::SequenceOperation;
pub use volume::CreateVolumeOperation;

use crate::client::{Client, NameResolver};
use async_trait::async_trait;
use error::Interrupted;
use std::fmt;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// A single atomic action in a deployment.
///
/// Operations are built once by a planner, executed at most once, and then
/// kept only for reporting. `Display` gives a stable, ID-based description
/// for logs; `format` gives a resolved, human-readable plan line.
#[async_trait]
pub trait Operation: fmt::Display + fmt::Debug + Send + Sync {
    /// Perform the operation against the client.
    ///
    /// Every Client call races `cancel`; once it fires, the operation
    /// returns `OperationError::Cancelled` without wrapping it.
    async fn execute(
        &self,
        client: &dyn Client,
        cancel: &CancellationToken,
    ) -> Result<(), OperationError>;

    /// One line describing the operation with machine and container names
    /// resolved. Never fails and never calls the Client.
    fn format(&self, resolver: &dyn NameResolver) -> String;
}

/// Run `fut` unless `cancel` fires first. Cancellation wins ties.
pub(crate) async fn until_cancelled<F: Future>(
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output, Interrupted> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Interrupted),
        out = fut => Ok(out),
    }
}
