//! Configuration for notification polling

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the notification watcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Whether the watcher polls at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Seconds between polls
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Number of recent notifications fetched per poll
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_true() -> bool {
    true
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_limit() -> u32 {
    20
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_secs: default_poll_interval_secs(),
            limit: default_limit(),
        }
    }
}

impl NotificationConfig {
    /// Create a config with polling disabled
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Interval between polls (at least one second)
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}
