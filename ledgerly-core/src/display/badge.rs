//! Countdown badge: passive readout of the remaining session time

use std::time::Duration;

use serde::Serialize;

use crate::timer::{SessionTimerService, Subscription};

/// Rendered badge content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BadgeText {
    pub text: String,
    /// At or below the warning threshold
    pub urgent: bool,
}

/// Countdown badge renderer
#[derive(Debug, Clone, Copy)]
pub struct CountdownBadge {
    threshold: Duration,
}

impl CountdownBadge {
    pub fn new(threshold: Duration) -> Self {
        Self { threshold }
    }

    /// Badge for `remaining`, or `None` when there is no active session
    pub fn render(&self, remaining: Duration) -> Option<BadgeText> {
        if remaining.is_zero() {
            return None;
        }
        Some(BadgeText {
            text: format_remaining(remaining),
            urgent: remaining <= self.threshold,
        })
    }

    /// Subscribe the badge to `service`
    ///
    /// `on_render` receives the new badge on every notification. Dropping the
    /// returned subscription detaches the badge.
    pub fn attach<F>(self, service: &SessionTimerService, on_render: F) -> Subscription
    where
        F: Fn(Option<BadgeText>) + Send + Sync + 'static,
    {
        service.subscribe(move |remaining| on_render(self.render(remaining)))
    }
}

/// Format as `minutes:seconds` with zero-padded seconds
pub fn format_remaining(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}
