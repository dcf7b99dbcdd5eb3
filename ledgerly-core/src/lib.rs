//! ledgerly-core: session-expiry coordination for the ledgerly client
//!
//! This crate provides the stateful pieces behind the client's session UI:
//!
//! - **Session timer** - [`SessionTimerService`] owns the countdown of the
//!   remaining session time and fans it out to subscribers
//! - **Display observers** - [`CountdownBadge`] and [`ExpiryWarningPanel`]
//!   turn the countdown into a readout and a one-shot expiry warning
//! - **Credentials** - [`CredentialStore`] implementations and the
//!   [`SessionRenewer`] used to extend a session
//! - **Notifications** - [`NotificationWatcher`] detects new backend
//!   notifications with an explicit [`Watermark`]
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use ledgerly_core::{
//!     ApiClient, ApiConfig, AuthClient, CountdownBadge, FileCredentialStore,
//!     SessionTimerService, TimerConfig,
//! };
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(FileCredentialStore::default_location());
//!     let api = Arc::new(ApiClient::new(&ApiConfig::default(), store.clone())?);
//!     let timer = SessionTimerService::new(
//!         TimerConfig::default(),
//!         store,
//!         Arc::new(AuthClient::new(api)),
//!     );
//!
//!     let badge = CountdownBadge::new(timer.config().warning_threshold());
//!     let _attached = badge.attach(&timer, |text| {
//!         if let Some(text) = text {
//!             println!("{}", text.text);
//!         }
//!     });
//!
//!     timer.start_timer().await;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │               SessionTimerService                │
//! │  ┌──────────────┐  ┌───────────────────────────┐ │
//! │  │ ClockState   │  │ SubscriberRegistry        │ │
//! │  │ token/expiry │  │  badge, panel, host ...   │ │
//! │  └──────▲───────┘  └───────────────────────────┘ │
//! │         │ tick / refresh                         │
//! │  ┌──────┴──────────┐  ┌───────────────────────┐  │
//! │  │ CredentialStore │  │ SessionRenewer        │  │
//! │  └─────────────────┘  └───────────────────────┘  │
//! └──────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod auth;
pub mod clock;
pub mod display;
pub mod error;
pub mod notifications;
pub mod timer;

// Re-export key types for convenience
pub use api::{ApiClient, ApiConfig, ApiError};
pub use auth::{
    AuthClient, Credential, CredentialError, CredentialStore, FileCredentialStore, LoginRequest,
    MemoryCredentialStore, RenewalError, SessionRenewer,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use display::{
    BadgeText, CountdownBadge, ExpiryWarningPanel, FixedLayout, LayoutProbe, PanelState,
    PanelView, WarningPanelHandle,
};
pub use error::{LedgerlyError, NotificationError, SessionError};
pub use notifications::{
    AlertSink, Notification, NotificationApi, NotificationClient, NotificationConfig,
    NotificationKind, NotificationWatcher, PollOutcome, Watermark,
};
pub use timer::{SessionEvent, SessionTimerService, Subscription, TimerConfig, WeakSessionTimer};
