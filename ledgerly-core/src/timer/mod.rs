//! Session countdown shared by every observer of the session

mod config;
mod events;
mod service;
mod subscribers;

pub use config::TimerConfig;
pub use events::SessionEvent;
pub use service::{SessionTimerService, WeakSessionTimer};
pub use subscribers::{Subscription, SubscriptionId};
