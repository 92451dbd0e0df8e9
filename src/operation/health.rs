// ABOUTME: Health gate that blocks a rollout until a new container is ready.
// ABOUTME: Polls the container and drives an explicit Starting -> terminal state machine.

use std::time::Duration;

use snafu::ResultExt;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::error::{HealthError, InspectAfterWaitSnafu, InspectSnafu};
use super::until_cancelled;
use crate::client::{Client, ContainerRecord, HealthStatus};
use crate::config::HealthPolicy;
use crate::types::{ContainerId, ServiceId};

/// Longest healthcheck output quoted in an unhealthy error.
pub const MAX_HEALTH_LOG_CHARS: usize = 200;

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

const NO_HEALTH_LOGS: &str = "no healthcheck logs available";

/// Readiness of a container as judged by the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    /// Not yet decided; keep polling.
    Starting,
    Healthy,
    Unhealthy {
        last_log: String,
    },
    Crashed {
        status: String,
        exit_code: i64,
        /// Crashed on the confirmation inspect after the no-healthcheck window.
        after_window: bool,
    },
    TimedOut {
        elapsed: Duration,
    },
}

impl GateState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GateState::Starting)
    }

    /// Convert a terminal state into the gate's result.
    fn into_result(self, container: &ContainerId) -> Result<(), HealthError> {
        let container = container.short().to_string();
        match self {
            GateState::Healthy => Ok(()),
            GateState::Unhealthy { last_log } => Err(HealthError::Unhealthy {
                container,
                last_log,
            }),
            GateState::Crashed {
                status,
                exit_code,
                after_window: false,
            } => Err(HealthError::Crashed {
                container,
                status,
                exit_code,
            }),
            GateState::Crashed {
                status,
                exit_code,
                after_window: true,
            } => Err(HealthError::ExitedAfterStart {
                container,
                status,
                exit_code,
            }),
            GateState::TimedOut { elapsed } => Err(HealthError::TimedOut { container, elapsed }),
            // Only reachable if the loop exits early, which it does not.
            GateState::Starting => Err(HealthError::TimedOut {
                container,
                elapsed: Duration::ZERO,
            }),
        }
    }
}

/// Outcome of evaluating one inspected record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Step {
    /// Stay in `Starting` until the next tick.
    Wait,
    /// No healthcheck and the observation window has passed: re-inspect to confirm.
    Confirm,
    /// Move to a terminal state.
    Settle(GateState),
}

/// Transition table for a single poll.
pub(crate) fn evaluate(record: &ContainerRecord, elapsed: Duration, policy: &HealthPolicy) -> Step {
    let state = &record.state;

    if !state.running {
        return Step::Settle(GateState::Crashed {
            status: state.status.clone(),
            exit_code: state.exit_code,
            after_window: false,
        });
    }

    let Some(health) = &state.health else {
        if elapsed < policy.no_healthcheck_window {
            return Step::Wait;
        }
        return Step::Confirm;
    };

    match health.status {
        HealthStatus::Healthy => Step::Settle(GateState::Healthy),
        HealthStatus::Unhealthy => Step::Settle(GateState::Unhealthy {
            last_log: health
                .last_output()
                .map(truncate_log)
                .unwrap_or_else(|| NO_HEALTH_LOGS.to_string()),
        }),
        HealthStatus::Starting => Step::Wait,
    }
}

/// Resolve the confirmation inspect for a container without a healthcheck.
pub(crate) fn confirm(record: &ContainerRecord) -> GateState {
    if record.state.running {
        GateState::Healthy
    } else {
        GateState::Crashed {
            status: record.state.status.clone(),
            exit_code: record.state.exit_code,
            after_window: true,
        }
    }
}

/// Trim a healthcheck output and cap it at `MAX_HEALTH_LOG_CHARS` characters.
pub(crate) fn truncate_log(output: &str) -> String {
    let output = output.trim();
    match output.char_indices().nth(MAX_HEALTH_LOG_CHARS) {
        Some((idx, _)) => format!("{}...", &output[..idx]),
        None => output.to_string(),
    }
}

/// Waits for a just-started container to become ready to serve traffic.
///
/// Containers with a healthcheck pass as soon as the engine reports them
/// healthy. Containers without one pass once they have stayed up for the
/// policy's observation window. Cancellation pre-empts every other outcome.
#[derive(Debug, Clone)]
pub struct HealthGate<'a> {
    service_id: &'a ServiceId,
    container_id: &'a ContainerId,
    policy: HealthPolicy,
}

impl<'a> HealthGate<'a> {
    pub fn new(service_id: &'a ServiceId, container_id: &'a ContainerId, policy: HealthPolicy) -> Self {
        Self {
            service_id,
            container_id,
            policy,
        }
    }

    pub async fn wait(
        &self,
        client: &dyn Client,
        cancel: &CancellationToken,
    ) -> Result<(), HealthError> {
        let start = Instant::now();

        let deadline = tokio::time::sleep_until(start + self.policy.max_wait);
        tokio::pin!(deadline);

        // interval_at panics on a zero period.
        let period = self.policy.poll_interval.max(MIN_POLL_INTERVAL);
        let mut ticker = tokio::time::interval_at(start + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut state = GateState::Starting;
        while !state.is_terminal() {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    tracing::debug!(container_id = %self.container_id.short(), "health gate cancelled");
                    return Err(HealthError::Cancelled);
                }

                _ = &mut deadline => {
                    state = GateState::TimedOut { elapsed: start.elapsed() };
                }

                _ = ticker.tick() => {
                    state = self.poll(client, cancel, start.elapsed()).await?;
                }
            }
        }

        match &state {
            GateState::Healthy => tracing::info!(
                container_id = %self.container_id.short(),
                elapsed = ?start.elapsed(),
                "container ready"
            ),
            failed => tracing::warn!(
                container_id = %self.container_id.short(),
                state = ?failed,
                "container failed health gate"
            ),
        }

        state.into_result(self.container_id)
    }

    async fn poll(
        &self,
        client: &dyn Client,
        cancel: &CancellationToken,
        elapsed: Duration,
    ) -> Result<GateState, HealthError> {
        let record = until_cancelled(
            cancel,
            client.inspect_container(self.service_id, self.container_id),
        )
        .await?
        .context(InspectSnafu)?;

        match evaluate(&record, elapsed, &self.policy) {
            Step::Wait => {
                tracing::debug!(
                    container_id = %self.container_id.short(),
                    status = %record.state.status,
                    elapsed = ?elapsed,
                    "container still starting"
                );
                Ok(GateState::Starting)
            }
            Step::Confirm => {
                let record = until_cancelled(
                    cancel,
                    client.inspect_container(self.service_id, self.container_id),
                )
                .await?
                .context(InspectAfterWaitSnafu)?;
                Ok(confirm(&record))
            }
            Step::Settle(state) => Ok(state),
        }
    }
}
