//! "New since last poll" detection
//!
//! The watcher keeps no cursor of its own: every [`NotificationWatcher::poll`]
//! takes the previous [`Watermark`] and returns the next one together with
//! the notifications that are newer than it.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::{Notification, NotificationApi, NotificationConfig};
use crate::error::NotificationError;

/// Highest notification id observed so far
///
/// `Watermark::default()` means nothing has been observed yet; the first
/// successful poll only establishes the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Watermark(Option<u64>);

impl Watermark {
    pub fn at(id: u64) -> Self {
        Self(Some(id))
    }

    pub fn latest(&self) -> Option<u64> {
        self.0
    }

    pub fn is_baseline_set(&self) -> bool {
        self.0.is_some()
    }
}

/// Result of one poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome {
    pub watermark: Watermark,
    /// Notifications newer than the previous watermark, newest first
    pub fresh: Vec<Notification>,
}

/// Where the watcher raises alerts
pub trait AlertSink: Send + Sync {
    /// Show one alert for a batch of new notifications
    fn alert(&self, fresh: &[Notification]);

    /// Play the short audible cue
    fn chime(&self);
}

/// Compare a listing against the previous watermark
pub fn diff(watermark: Watermark, notifications: Vec<Notification>) -> PollOutcome {
    let newest = notifications.iter().map(|n| n.id).max();

    match (watermark.0, newest) {
        // An empty listing makes anything that appears later new
        (_, None) => PollOutcome {
            watermark: Watermark::at(0),
            fresh: Vec::new(),
        },
        (None, Some(newest)) => PollOutcome {
            watermark: Watermark::at(newest),
            fresh: Vec::new(),
        },
        (Some(seen), Some(newest)) => {
            let fresh = notifications.into_iter().filter(|n| n.id > seen).collect();
            PollOutcome {
                watermark: Watermark::at(newest.max(seen)),
                fresh,
            }
        }
    }
}

/// Polls the notification API and alerts on new items
pub struct NotificationWatcher {
    api: Arc<dyn NotificationApi>,
    limit: u32,
}

impl NotificationWatcher {
    pub fn new(api: Arc<dyn NotificationApi>, limit: u32) -> Self {
        Self { api, limit }
    }

    pub fn from_config(api: Arc<dyn NotificationApi>, config: &NotificationConfig) -> Self {
        Self::new(api, config.limit)
    }

    /// Fetch the recent notifications and diff them against `watermark`
    pub async fn poll(&self, watermark: Watermark) -> Result<PollOutcome, NotificationError> {
        let notifications = self.api.list(self.limit).await?;
        Ok(diff(watermark, notifications))
    }

    /// Poll every `interval` until the task is dropped
    ///
    /// Each non-empty batch produces one alert and one chime. A failed poll
    /// is logged and keeps the previous watermark.
    pub async fn run(&self, interval: Duration, sink: &dyn AlertSink, mut watermark: Watermark) {
        info!(interval_secs = interval.as_secs(), "Notification watcher started");

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            match self.poll(watermark).await {
                Ok(outcome) => {
                    watermark = outcome.watermark;
                    if outcome.fresh.is_empty() {
                        debug!(watermark = ?watermark.latest(), "No new notifications");
                        continue;
                    }
                    info!(count = outcome.fresh.len(), "New notifications");
                    sink.alert(&outcome.fresh);
                    sink.chime();
                }
                Err(e) => warn!("Notification poll failed: {}", e),
            }
        }
    }
}
