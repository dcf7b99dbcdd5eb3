//! SessionTimerService: the shared session countdown
//!
//! One service instance owns the clock state for the session: the current
//! token, its expiry, and the subscribers watching the remaining time. The
//! state lives behind a mutex that is never held across an `.await` or while
//! callbacks run, so a renewal in flight never stalls the tick loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::subscribers::{Callback, SubscriberRegistry, notify};
use super::{SessionEvent, Subscription, TimerConfig};
use crate::auth::{Credential, CredentialStore, RenewalError, SessionRenewer};
use crate::clock::{Clock, SystemClock};
use crate::error::SessionError;

/// Capacity of the session event channel
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Shared session countdown
///
/// Cheap to clone; every clone drives the same clock. The ticking loop only
/// holds a weak reference and stops once the last clone is dropped.
#[derive(Clone)]
pub struct SessionTimerService {
    inner: Arc<TimerInner>,
}

/// Non-owning handle to a [`SessionTimerService`]
///
/// Observers registered as subscribers hold this instead of a clone so the
/// registry does not keep the service alive.
#[derive(Clone)]
pub struct WeakSessionTimer {
    inner: Weak<TimerInner>,
}

struct TimerInner {
    config: TimerConfig,
    store: Arc<dyn CredentialStore>,
    renewer: Arc<dyn SessionRenewer>,
    clock: Arc<dyn Clock>,
    state: Mutex<ClockState>,
    subscribers: Arc<SubscriberRegistry>,
    running: AtomicBool,
    event_tx: broadcast::Sender<SessionEvent>,
    /// Serializes renewal commits against login and logout
    transition: tokio::sync::Mutex<()>,
}

#[derive(Debug, Default)]
struct ClockState {
    token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    expired_announced: bool,
    /// Bumped whenever the token is replaced, so a tick that read the store
    /// before a renewal does not overwrite the renewed credential
    generation: u64,
}

impl ClockState {
    fn remaining(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at
            .and_then(|expires_at| (expires_at - now).to_std().ok())
            .unwrap_or(Duration::ZERO)
    }
}

impl TimerInner {
    fn state(&self) -> MutexGuard<'_, ClockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.event_tx.send(event);
    }

    fn remaining(&self) -> Duration {
        self.state().remaining(self.clock.now())
    }

    fn token(&self) -> Option<String> {
        self.state().token.clone()
    }

    /// Make `credential` the current session if its token differs
    fn adopt(&self, state: &mut ClockState, credential: Option<&Credential>) -> Option<SessionEvent> {
        let token = credential.map(Credential::token);
        if state.token.as_deref() == token {
            return None;
        }

        state.token = token.map(str::to_string);
        state.expires_at = credential.and_then(|credential| {
            match credential.expires_at(self.config.session_duration()) {
                Ok(expires_at) => Some(expires_at),
                Err(e) => {
                    warn!("Stored credential has no usable expiry: {}", e);
                    None
                }
            }
        });
        state.expired_announced = false;
        state.generation += 1;

        Some(SessionEvent::TokenChanged {
            has_token: state.token.is_some(),
        })
    }
}

impl SessionTimerService {
    /// Create a service reading time from the system clock
    pub fn new(
        config: TimerConfig,
        store: Arc<dyn CredentialStore>,
        renewer: Arc<dyn SessionRenewer>,
    ) -> Self {
        Self::with_clock(config, store, renewer, Arc::new(SystemClock))
    }

    /// Create a service with an explicit clock
    pub fn with_clock(
        config: TimerConfig,
        store: Arc<dyn CredentialStore>,
        renewer: Arc<dyn SessionRenewer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(TimerInner {
                config,
                store,
                renewer,
                clock,
                state: Mutex::new(ClockState::default()),
                subscribers: Arc::new(SubscriberRegistry::default()),
                running: AtomicBool::new(false),
                event_tx,
                transition: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Get the timer configuration
    pub fn config(&self) -> &TimerConfig {
        &self.inner.config
    }

    /// Non-owning handle for observers
    pub fn downgrade(&self) -> WeakSessionTimer {
        WeakSessionTimer {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Start the ticking loop
    ///
    /// Seeds the clock from the stored credential, notifies subscribers once,
    /// then ticks every `tick_interval`. Calling this again while the loop is
    /// running does nothing.
    pub async fn start_timer(&self) {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            debug!("Session timer already running");
            return;
        }

        let period = self.inner.config.tick_interval();
        info!(interval_ms = period.as_millis() as u64, "Starting session timer");
        self.inner.emit(SessionEvent::Started);

        self.tick().await;

        let weak = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                let Some(inner) = weak.upgrade() else {
                    debug!("Session timer dropped, stopping tick loop");
                    break;
                };
                SessionTimerService { inner }.tick().await;
            }
        });
    }

    /// Whether the ticking loop has been started
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Run one tick
    ///
    /// Re-reads the credential store, adopts a changed token, recomputes the
    /// remaining time and notifies every subscriber exactly once. The tick
    /// loop calls this; hosts driving their own schedule may call it too.
    pub async fn tick(&self) -> Duration {
        let generation = self.inner.state().generation;
        let stored = self.inner.store.load().await;

        let mut events = Vec::new();
        let remaining = {
            let mut state = self.inner.state();

            match stored {
                Ok(credential) if state.generation == generation => {
                    if let Some(event) = self.inner.adopt(&mut state, credential.as_ref()) {
                        info!(has_token = state.token.is_some(), "Session credential changed");
                        events.push(event);
                    }
                }
                Ok(_) => debug!("Session replaced during tick, keeping the newer credential"),
                Err(e) => error!("Credential store unavailable, keeping session: {}", e),
            }

            let remaining = state.remaining(self.inner.clock.now());
            if remaining.is_zero() && state.expires_at.is_some() && !state.expired_announced {
                state.expired_announced = true;
                info!("Session expired");
                events.push(SessionEvent::Expired);
            }
            remaining
        };

        for event in events {
            self.inner.emit(event);
        }

        debug!(remaining_ms = remaining.as_millis() as u64, "Session tick");
        notify(&self.inner.subscribers.snapshot(), remaining);
        remaining
    }

    /// Register a remaining-time callback
    ///
    /// The callback runs immediately with the current value, then once per
    /// tick and after every renewal. Drop the returned handle to unsubscribe.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        let callback: Callback = Arc::new(callback);
        let id = self.inner.subscribers.insert(Arc::clone(&callback));
        notify(std::slice::from_ref(&callback), self.remaining());
        Subscription::new(id, &self.inner.subscribers)
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    /// Subscribe to session lifecycle events
    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Current session token, or `None` when logged out
    pub fn get_token(&self) -> Option<String> {
        self.inner.token()
    }

    /// When the current session expires, if known
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.inner.state().expires_at
    }

    /// Remaining session time right now
    pub fn remaining(&self) -> Duration {
        self.inner.remaining()
    }

    /// Renew the session through the renewal collaborator
    ///
    /// On success the renewed credential is stored, the clock moves to its
    /// expiry and subscribers are notified before this returns. On failure
    /// nothing changes and the error is returned to the caller.
    ///
    /// A renewal that completes after the session was cleared or replaced is
    /// discarded with [`SessionError::Superseded`].
    pub async fn refresh_session(&self) -> Result<Duration, SessionError> {
        let (generation, held) = {
            let state = self.inner.state();
            (state.generation, state.token.clone())
        };
        let current = match held {
            Some(token) => Credential::new(token),
            None => self
                .inner
                .store
                .load()
                .await?
                .ok_or(SessionError::CredentialAbsent)?,
        };

        info!("Renewing session");
        let renewed = self.inner.renewer.renew(&current).await?;
        let expires_at = renewed
            .expires_at(self.inner.config.session_duration())
            .map_err(RenewalError::from)?;

        let _transition = self.inner.transition.lock().await;
        {
            let state = self.inner.state();
            if state.generation != generation && state.token.as_deref() != Some(current.token()) {
                warn!("Session changed while renewal was in flight, discarding renewed credential");
                return Err(SessionError::Superseded);
            }
        }
        self.inner.store.save(&renewed).await?;

        let remaining = {
            let mut state = self.inner.state();
            state.token = Some(renewed.access_token);
            state.expires_at = Some(expires_at);
            state.expired_announced = false;
            state.generation += 1;
            state.remaining(self.inner.clock.now())
        };

        info!(%expires_at, "Session renewed");
        self.inner.emit(SessionEvent::Renewed { expires_at });
        notify(&self.inner.subscribers.snapshot(), remaining);
        Ok(remaining)
    }

    /// Store a freshly issued credential and switch the clock to it
    pub async fn begin_session(&self, credential: &Credential) -> Result<Duration, SessionError> {
        let _transition = self.inner.transition.lock().await;
        self.inner.store.save(credential).await?;
        Ok(self.tick().await)
    }

    /// Log out: clear the stored credential and reset the clock
    pub async fn clear_session(&self) -> Result<(), SessionError> {
        let _transition = self.inner.transition.lock().await;
        self.inner.store.clear().await?;

        let event = {
            let mut state = self.inner.state();
            let event = self.inner.adopt(&mut state, None);
            state.generation += 1;
            event
        };
        if let Some(event) = event {
            info!("Session cleared");
            self.inner.emit(event);
        }

        notify(&self.inner.subscribers.snapshot(), Duration::ZERO);
        Ok(())
    }
}

impl WeakSessionTimer {
    /// Upgrade to a full handle if the service is still alive
    pub fn upgrade(&self) -> Option<SessionTimerService> {
        self.inner
            .upgrade()
            .map(|inner| SessionTimerService { inner })
    }

    /// Current session token, or `None` when logged out or dropped
    pub fn get_token(&self) -> Option<String> {
        self.inner.upgrade().and_then(|inner| inner.token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{MemoryCredentialStore, mint};
    use crate::clock::ManualClock;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;

    /// Renewer answering from a queue of scripted results
    #[derive(Default)]
    struct ScriptedRenewer {
        responses: Mutex<VecDeque<Result<Credential, RenewalError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedRenewer {
        fn queue(&self, response: Result<Credential, RenewalError>) {
            self.responses.lock().unwrap().push_back(response);
        }
    }

    #[async_trait]
    impl SessionRenewer for ScriptedRenewer {
        async fn renew(&self, _current: &Credential) -> Result<Credential, RenewalError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(RenewalError::Rejected("no scripted response".into())))
        }
    }

    fn start_time() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn credential_expiring_in(secs: i64) -> Credential {
        Credential::new(mint(json!({
            "user_id": 1,
            "iat": start_time().timestamp(),
            "exp": start_time().timestamp() + secs,
        })))
    }

    struct Harness {
        service: SessionTimerService,
        store: Arc<MemoryCredentialStore>,
        renewer: Arc<ScriptedRenewer>,
        clock: ManualClock,
    }

    fn harness(credential: Option<Credential>) -> Harness {
        let store = Arc::new(match credential {
            Some(c) => MemoryCredentialStore::with_credential(c),
            None => MemoryCredentialStore::new(),
        });
        let renewer = Arc::new(ScriptedRenewer::default());
        let clock = ManualClock::new(start_time());
        let service = SessionTimerService::with_clock(
            TimerConfig::default(),
            store.clone(),
            renewer.clone(),
            Arc::new(clock.clone()),
        );
        Harness {
            service,
            store,
            renewer,
            clock,
        }
    }

    fn recorder(service: &SessionTimerService) -> (Arc<Mutex<Vec<Duration>>>, Subscription) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let subscription = service.subscribe(move |remaining| sink.lock().unwrap().push(remaining));
        (seen, subscription)
    }

    // ==================== Credential State Tests ====================

    #[tokio::test]
    async fn absent_credential_reports_zero() {
        let h = harness(None);
        assert_eq!(h.service.tick().await, Duration::ZERO);
        h.clock.advance(Duration::from_secs(10));
        assert_eq!(h.service.tick().await, Duration::ZERO);
        assert!(h.service.get_token().is_none());
    }

    #[tokio::test]
    async fn login_after_absent_start_produces_countdown() {
        let h = harness(None);
        assert_eq!(h.service.tick().await, Duration::ZERO);

        h.store.save(&credential_expiring_in(600)).await.unwrap();

        assert_eq!(h.service.tick().await, Duration::from_secs(600));
        assert!(h.service.get_token().is_some());
    }

    #[tokio::test]
    async fn malformed_credential_reports_zero_without_expiring() {
        let h = harness(Some(Credential::new("garbage")));
        let mut events = h.service.events();

        assert_eq!(h.service.tick().await, Duration::ZERO);
        assert_eq!(h.service.get_token().as_deref(), Some("garbage"));

        assert_eq!(
            events.try_recv().unwrap(),
            SessionEvent::TokenChanged { has_token: true }
        );
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn issue_time_fallback_uses_session_duration() {
        let token = mint(json!({ "iat": start_time().timestamp() }));
        let h = harness(Some(Credential::new(token)));
        assert_eq!(h.service.tick().await, Duration::from_secs(60 * 60));
    }

    #[tokio::test]
    async fn token_change_in_store_is_adopted_on_tick() {
        let h = harness(Some(credential_expiring_in(600)));
        h.service.tick().await;
        let first = h.service.get_token();

        let mut events = h.service.events();
        let other = Credential::new(mint(json!({ "user_id": 2, "exp": start_time().timestamp() + 900 })));
        h.store.save(&other).await.unwrap();

        assert_eq!(h.service.tick().await, Duration::from_secs(900));
        assert_ne!(h.service.get_token(), first);
        assert_eq!(
            events.try_recv().unwrap(),
            SessionEvent::TokenChanged { has_token: true }
        );
    }

    // ==================== Countdown Tests ====================

    #[tokio::test]
    async fn five_minute_session_reaches_exactly_zero_and_stays() {
        let h = harness(Some(credential_expiring_in(300)));
        let mut previous = h.service.tick().await;
        assert_eq!(previous, Duration::from_secs(300));

        for _ in 0..300 {
            h.clock.advance(Duration::from_secs(1));
            let remaining = h.service.tick().await;
            assert!(remaining <= previous, "countdown must not increase");
            previous = remaining;
        }
        assert_eq!(previous, Duration::ZERO);

        for _ in 0..10 {
            h.clock.advance(Duration::from_secs(1));
            assert_eq!(h.service.tick().await, Duration::ZERO);
        }
    }

    #[tokio::test]
    async fn expired_event_fires_once_per_token() {
        let h = harness(Some(credential_expiring_in(2)));
        h.service.tick().await;
        let mut events = h.service.events();

        for _ in 0..5 {
            h.clock.advance(Duration::from_secs(1));
            h.service.tick().await;
        }

        assert_eq!(events.try_recv().unwrap(), SessionEvent::Expired);
        assert!(events.try_recv().is_err());
    }

    // ==================== Subscriber Tests ====================

    #[tokio::test]
    async fn subscriber_receives_current_value_immediately() {
        let h = harness(Some(credential_expiring_in(120)));
        h.service.tick().await;
        h.clock.advance(Duration::from_secs(20));

        let (seen, _subscription) = recorder(&h.service);

        assert_eq!(*seen.lock().unwrap(), vec![Duration::from_secs(100)]);
    }

    #[tokio::test]
    async fn each_live_subscriber_gets_one_notification_per_tick() {
        let h = harness(Some(credential_expiring_in(120)));

        let (a, sub_a) = recorder(&h.service);
        let (b, _sub_b) = recorder(&h.service);
        h.service.tick().await;

        sub_a.unsubscribe();
        let (c, _sub_c) = recorder(&h.service);
        h.service.tick().await;
        h.service.tick().await;

        // Immediate value, then one per tick while subscribed
        assert_eq!(a.lock().unwrap().len(), 2);
        assert_eq!(b.lock().unwrap().len(), 4);
        assert_eq!(c.lock().unwrap().len(), 3);
        assert_eq!(h.service.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn panicking_subscriber_does_not_block_others() {
        let h = harness(Some(credential_expiring_in(120)));
        let _bad = h.service.subscribe(|remaining| {
            if remaining < Duration::from_secs(120) {
                panic!("render failure");
            }
        });
        let (seen, _good) = recorder(&h.service);

        h.clock.advance(Duration::from_secs(1));
        h.service.tick().await;
        h.clock.advance(Duration::from_secs(1));
        h.service.tick().await;

        assert_eq!(seen.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn subscriber_may_unsubscribe_from_its_own_callback() {
        let h = harness(Some(credential_expiring_in(120)));
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let slot_in_cb = Arc::clone(&slot);
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in_cb = Arc::clone(&calls);

        let subscription = h.service.subscribe(move |_| {
            if calls_in_cb.fetch_add(1, Ordering::SeqCst) >= 1 {
                slot_in_cb.lock().unwrap().take();
            }
        });
        *slot.lock().unwrap() = Some(subscription);

        h.service.tick().await;
        h.service.tick().await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(h.service.subscriber_count(), 0);
    }

    // ==================== Start Timer Tests ====================

    #[tokio::test(start_paused = true)]
    async fn start_timer_twice_runs_one_loop() {
        let h = harness(Some(credential_expiring_in(3600)));
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let _subscription = h.service.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        h.service.start_timer().await;
        h.service.start_timer().await;
        h.service.start_timer().await;
        assert!(h.service.is_running());

        tokio::time::sleep(Duration::from_millis(5500)).await;

        // Immediate on subscribe, seed on start, ticks at 1s..5s
        assert_eq!(count.load(Ordering::SeqCst), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn start_timer_emits_started_once() {
        let h = harness(None);
        let mut events = h.service.events();

        h.service.start_timer().await;
        h.service.start_timer().await;

        assert_eq!(events.try_recv().unwrap(), SessionEvent::Started);
        assert!(events.try_recv().is_err());
    }

    // ==================== Renewal Tests ====================

    #[tokio::test]
    async fn refresh_session_extends_and_notifies() {
        let h = harness(Some(credential_expiring_in(10)));
        h.service.tick().await;
        let (seen, _subscription) = recorder(&h.service);

        h.clock.advance(Duration::from_secs(5));
        h.service.tick().await;

        let renewed = Credential::new(mint(json!({
            "user_id": 1,
            "exp": start_time().timestamp() + 15,
        })));
        h.renewer.queue(Ok(renewed.clone()));

        let remaining = h.service.refresh_session().await.unwrap();

        assert_eq!(remaining, Duration::from_secs(10));
        assert_eq!(seen.lock().unwrap().last(), Some(&Duration::from_secs(10)));
        assert_eq!(h.service.get_token().as_deref(), Some(renewed.token()));
        assert_eq!(h.store.load().await.unwrap(), Some(renewed));
    }

    #[tokio::test]
    async fn refresh_session_failure_leaves_state_unchanged() {
        let original = credential_expiring_in(60);
        let h = harness(Some(original.clone()));
        h.service.tick().await;
        let (seen, _subscription) = recorder(&h.service);
        h.renewer.queue(Err(RenewalError::Rejected("Session expired".into())));

        let result = h.service.refresh_session().await;

        assert!(matches!(result, Err(SessionError::RenewalFailed(_))));
        assert_eq!(h.service.get_token().as_deref(), Some(original.token()));
        assert_eq!(h.service.remaining(), Duration::from_secs(60));
        assert_eq!(h.store.load().await.unwrap(), Some(original));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    /// Renewer that holds every call until released
    struct GatedRenewer {
        renewed: Credential,
        entered: tokio::sync::Notify,
        release: tokio::sync::Notify,
    }

    #[async_trait]
    impl SessionRenewer for GatedRenewer {
        async fn renew(&self, _current: &Credential) -> Result<Credential, RenewalError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(self.renewed.clone())
        }
    }

    fn gated_service(
        original: Credential,
        renewed: Credential,
    ) -> (SessionTimerService, Arc<MemoryCredentialStore>, Arc<GatedRenewer>, ManualClock) {
        let store = Arc::new(MemoryCredentialStore::with_credential(original));
        let renewer = Arc::new(GatedRenewer {
            renewed,
            entered: tokio::sync::Notify::new(),
            release: tokio::sync::Notify::new(),
        });
        let clock = ManualClock::new(start_time());
        let service = SessionTimerService::with_clock(
            TimerConfig::default(),
            store.clone(),
            renewer.clone(),
            Arc::new(clock.clone()),
        );
        (service, store, renewer, clock)
    }

    fn spawn_refresh(
        service: &SessionTimerService,
    ) -> tokio::task::JoinHandle<Result<Duration, SessionError>> {
        let service = service.clone();
        tokio::spawn(async move { service.refresh_session().await })
    }

    #[tokio::test]
    async fn ticks_continue_while_renewal_is_pending() {
        let (service, _store, renewer, clock) =
            gated_service(credential_expiring_in(60), credential_expiring_in(3600));
        service.tick().await;

        let pending = spawn_refresh(&service);
        renewer.entered.notified().await;

        clock.advance(Duration::from_secs(1));
        assert_eq!(service.tick().await, Duration::from_secs(59));
        clock.advance(Duration::from_secs(1));
        assert_eq!(service.tick().await, Duration::from_secs(58));

        renewer.release.notify_one();
        assert_eq!(pending.await.unwrap().unwrap(), Duration::from_secs(3598));
        assert_eq!(service.tick().await, Duration::from_secs(3598));
    }

    #[tokio::test]
    async fn renewal_completing_after_logout_is_discarded() {
        let (service, store, renewer, _clock) =
            gated_service(credential_expiring_in(60), credential_expiring_in(3600));
        service.tick().await;
        let mut events = service.events();

        let pending = spawn_refresh(&service);
        renewer.entered.notified().await;
        service.clear_session().await.unwrap();
        assert!(service.get_token().is_none());

        renewer.release.notify_one();
        let result = pending.await.unwrap();

        assert!(matches!(result, Err(SessionError::Superseded)));
        assert!(service.get_token().is_none());
        assert_eq!(service.remaining(), Duration::ZERO);
        assert_eq!(store.load().await.unwrap(), None);
        assert_eq!(
            events.try_recv().unwrap(),
            SessionEvent::TokenChanged { has_token: false }
        );
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn renewal_completing_after_account_switch_keeps_new_session() {
        let (service, store, renewer, _clock) =
            gated_service(credential_expiring_in(60), credential_expiring_in(3600));
        service.tick().await;

        let pending = spawn_refresh(&service);
        renewer.entered.notified().await;

        let other = Credential::new(mint(json!({ "user_id": 2, "exp": start_time().timestamp() + 900 })));
        store.save(&other).await.unwrap();
        assert_eq!(service.tick().await, Duration::from_secs(900));

        renewer.release.notify_one();
        let result = pending.await.unwrap();

        assert!(matches!(result, Err(SessionError::Superseded)));
        assert_eq!(service.get_token().as_deref(), Some(other.token()));
        assert_eq!(store.load().await.unwrap(), Some(other));
    }

    #[tokio::test]
    async fn renewal_survives_tick_adopting_same_credential() {
        let original = credential_expiring_in(60);
        let (service, _store, renewer, _clock) =
            gated_service(original.clone(), credential_expiring_in(3600));

        // Not yet seeded: the renewal reads the store, then a tick adopts the same token
        let pending = spawn_refresh(&service);
        renewer.entered.notified().await;
        assert_eq!(service.tick().await, Duration::from_secs(60));

        renewer.release.notify_one();
        assert_eq!(pending.await.unwrap().unwrap(), Duration::from_secs(3600));
    }

    #[tokio::test]
    async fn refresh_session_rejects_unusable_renewed_credential() {
        let h = harness(Some(credential_expiring_in(60)));
        h.service.tick().await;
        h.renewer.queue(Ok(Credential::new("not-a-jwt")));

        let result = h.service.refresh_session().await;

        assert!(matches!(
            result,
            Err(SessionError::RenewalFailed(RenewalError::InvalidCredential(_)))
        ));
        assert_eq!(h.service.remaining(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn refresh_session_without_credential_is_absent() {
        let h = harness(None);
        let result = h.service.refresh_session().await;
        assert!(matches!(result, Err(SessionError::CredentialAbsent)));
        assert_eq!(h.renewer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn refresh_session_before_start_reads_store() {
        let h = harness(Some(credential_expiring_in(60)));
        h.renewer.queue(Ok(credential_expiring_in(600)));

        let remaining = h.service.refresh_session().await.unwrap();
        assert_eq!(remaining, Duration::from_secs(600));
    }

    #[tokio::test]
    async fn refresh_session_emits_renewed() {
        let h = harness(Some(credential_expiring_in(60)));
        h.service.tick().await;
        let mut events = h.service.events();
        h.renewer.queue(Ok(credential_expiring_in(600)));

        h.service.refresh_session().await.unwrap();

        assert!(matches!(
            events.try_recv().unwrap(),
            SessionEvent::Renewed { expires_at } if expires_at.timestamp() == start_time().timestamp() + 600
        ));
    }

    // ==================== Session Boundary Tests ====================

    #[tokio::test]
    async fn begin_session_switches_clock() {
        let h = harness(None);
        let remaining = h
            .service
            .begin_session(&credential_expiring_in(900))
            .await
            .unwrap();
        assert_eq!(remaining, Duration::from_secs(900));
        assert!(h.store.load().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn clear_session_resets_clock_and_store() {
        let h = harness(Some(credential_expiring_in(900)));
        h.service.tick().await;
        let (seen, _subscription) = recorder(&h.service);

        h.service.clear_session().await.unwrap();

        assert!(h.service.get_token().is_none());
        assert_eq!(h.service.remaining(), Duration::ZERO);
        assert!(h.store.load().await.unwrap().is_none());
        assert_eq!(seen.lock().unwrap().last(), Some(&Duration::ZERO));
    }

    #[tokio::test]
    async fn weak_handle_does_not_keep_service_alive() {
        let h = harness(Some(credential_expiring_in(60)));
        h.service.tick().await;
        let weak = h.service.downgrade();
        assert!(weak.get_token().is_some());

        drop(h.service);
        assert!(weak.upgrade().is_none());
        assert!(weak.get_token().is_none());
    }
}
