// ABOUTME: Timing policy for the health gate that guards container rollouts.
// ABOUTME: Poll interval, overall deadline, and the crash-watch window for unchecked containers.

use serde::Deserialize;
use std::time::Duration;

/// How long and how often the health gate polls a freshly started container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct HealthPolicy {
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,

    #[serde(default = "default_max_wait", with = "humantime_serde")]
    pub max_wait: Duration,

    /// Minimum time a container without a healthcheck must stay up.
    #[serde(default = "default_no_healthcheck_window", with = "humantime_serde")]
    pub no_healthcheck_window: Duration,
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_max_wait() -> Duration {
    Duration::from_secs(90)
}

fn default_no_healthcheck_window() -> Duration {
    Duration::from_secs(5)
}

impl HealthPolicy {
    pub fn validate(&self) -> Result<(), String> {
        if self.poll_interval.is_zero() {
            return Err("health.poll_interval must be greater than zero".to_string());
        }
        if self.max_wait < self.poll_interval {
            return Err(format!(
                "health.max_wait ({:?}) must be at least health.poll_interval ({:?})",
                self.max_wait, self.poll_interval
            ));
        }
        Ok(())
    }
}

impl Default for HealthPolicy {
    fn default() -> Self {
        HealthPolicy {
            poll_interval: default_poll_interval(),
            max_wait: default_max_wait(),
            no_healthcheck_window: default_no_healthcheck_window(),
        }
    }
}
