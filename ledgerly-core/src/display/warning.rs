//! Expiry warning panel
//!
//! A per-session state machine: the panel appears once when the remaining
//! time first reaches the warning threshold, stays away after a dismiss, and
//! re-arms whenever the session token changes or the session is renewed.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use super::layout::{LayoutProbe, bottom_offset};
use crate::error::SessionError;
use crate::timer::{SessionTimerService, Subscription, WeakSessionTimer};

/// Visibility of the warning panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelState {
    #[default]
    Hidden,
    Shown,
    Dismissed,
}

/// What the host draws while the panel is shown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelView {
    pub minutes: u64,
    pub seconds: u64,
    /// Remaining time as a share of the threshold, capped at 100
    pub percent: u32,
    pub bottom_offset: u32,
}

/// Warning panel state machine
#[derive(Debug, Clone)]
pub struct ExpiryWarningPanel {
    threshold: Duration,
    state: PanelState,
    /// Shown once already this session
    warned: bool,
    /// Token recorded at the last reset
    token: Option<String>,
    remaining: Duration,
}

impl ExpiryWarningPanel {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            state: PanelState::Hidden,
            warned: false,
            token: None,
            remaining: Duration::ZERO,
        }
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Feed one countdown observation
    ///
    /// Returns the new state when it changed.
    pub fn observe(&mut self, remaining: Duration, token: Option<&str>) -> Option<PanelState> {
        let before = self.state;

        if self.token.as_deref() != token {
            debug!("Session token changed, re-arming expiry warning");
            self.token = token.map(str::to_string);
            self.state = PanelState::Hidden;
            self.warned = false;
        }

        self.remaining = remaining;

        if !remaining.is_zero()
            && remaining <= self.threshold
            && !self.warned
            && self.state == PanelState::Hidden
        {
            self.state = PanelState::Shown;
            self.warned = true;
        }

        (self.state != before).then_some(self.state)
    }

    /// User closed the panel
    ///
    /// Only a shown panel can be dismissed. Returns whether the state changed.
    pub fn dismiss(&mut self) -> bool {
        if self.state != PanelState::Shown {
            return false;
        }
        self.state = PanelState::Dismissed;
        true
    }

    /// The session was renewed
    ///
    /// Hides a shown panel and clears the one-shot flag so a later approach
    /// to expiry warns again. A dismissal stands for the rest of the session.
    pub fn renewed(&mut self) -> Option<PanelState> {
        self.warned = false;
        if self.state == PanelState::Shown {
            self.state = PanelState::Hidden;
            return Some(self.state);
        }
        None
    }

    /// Panel content while shown
    pub fn view(&self, probe: &dyn LayoutProbe) -> Option<PanelView> {
        if self.state != PanelState::Shown {
            return None;
        }

        let secs = self.remaining.as_secs();
        let threshold = self.threshold.as_secs();
        let percent = match threshold {
            0 => 100,
            t => u32::try_from((secs.saturating_mul(100) / t).min(100)).unwrap_or(100),
        };

        Some(PanelView {
            minutes: secs / 60,
            seconds: secs % 60,
            percent,
            bottom_offset: bottom_offset(probe),
        })
    }
}

type StateCallback = Arc<dyn Fn(PanelState) + Send + Sync>;

/// Warning panel attached to a live session timer
///
/// Dropping the handle detaches the panel.
pub struct WarningPanelHandle {
    panel: Arc<Mutex<ExpiryWarningPanel>>,
    timer: WeakSessionTimer,
    on_change: StateCallback,
    _subscription: Subscription,
}

impl WarningPanelHandle {
    /// Attach a panel to `service`; `on_change` runs on every state change
    pub fn attach<F>(service: &SessionTimerService, threshold: Duration, on_change: F) -> Self
    where
        F: Fn(PanelState) + Send + Sync + 'static,
    {
        let panel = Arc::new(Mutex::new(ExpiryWarningPanel::new(threshold)));
        let on_change: StateCallback = Arc::new(on_change);
        let timer = service.downgrade();

        let observed = Arc::clone(&panel);
        let notify = Arc::clone(&on_change);
        let tokens = timer.clone();
        let subscription = service.subscribe(move |remaining| {
            let token = tokens.get_token();
            let changed = lock(&observed).observe(remaining, token.as_deref());
            if let Some(state) = changed {
                notify(state);
            }
        });

        Self {
            panel,
            timer,
            on_change,
            _subscription: subscription,
        }
    }

    pub fn state(&self) -> PanelState {
        lock(&self.panel).state()
    }

    pub fn view(&self, probe: &dyn LayoutProbe) -> Option<PanelView> {
        lock(&self.panel).view(probe)
    }

    pub fn dismiss(&self) {
        let changed = lock(&self.panel).dismiss();
        if changed {
            (self.on_change)(PanelState::Dismissed);
        }
    }

    /// Renew the session from the panel
    ///
    /// On failure the panel is left as it was and the error is returned.
    pub async fn extend(&self) -> Result<Duration, SessionError> {
        let service = self.timer.upgrade().ok_or(SessionError::CredentialAbsent)?;
        let remaining = service.refresh_session().await?;

        let changed = lock(&self.panel).renewed();
        if let Some(state) = changed {
            (self.on_change)(state);
        }
        Ok(remaining)
    }
}

fn lock(panel: &Mutex<ExpiryWarningPanel>) -> MutexGuard<'_, ExpiryWarningPanel> {
    panel.lock().unwrap_or_else(PoisonError::into_inner)
}
