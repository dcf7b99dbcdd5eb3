//! Configuration for the session timer

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the session countdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Tick granularity in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Remaining time at or below which observers warn
    #[serde(default = "default_warning_threshold_secs")]
    pub warning_threshold_secs: u64,

    /// Session length assumed for credentials carrying only an issue time
    #[serde(default = "default_session_duration_minutes")]
    pub session_duration_minutes: u64,
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_warning_threshold_secs() -> u64 {
    6 * 60
}

fn default_session_duration_minutes() -> u64 {
    60
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            warning_threshold_secs: default_warning_threshold_secs(),
            session_duration_minutes: default_session_duration_minutes(),
        }
    }
}

impl TimerConfig {
    /// Interval between ticks (never zero)
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    /// Warning threshold
    pub fn warning_threshold(&self) -> Duration {
        Duration::from_secs(self.warning_threshold_secs)
    }

    /// Fallback session length
    pub fn session_duration(&self) -> chrono::Duration {
        i64::try_from(self.session_duration_minutes)
            .ok()
            .and_then(chrono::Duration::try_minutes)
            .unwrap_or_else(|| chrono::Duration::minutes(60))
    }

    /// Set the warning threshold
    pub fn with_warning_threshold(mut self, threshold: Duration) -> Self {
        self.warning_threshold_secs = threshold.as_secs();
        self
    }

    /// Set the tick interval
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }
}
