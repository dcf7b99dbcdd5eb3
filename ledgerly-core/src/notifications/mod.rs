//! Backend notifications: listing API and new-item watcher

mod api;
mod config;
mod types;
pub mod watcher;

pub use api::{NotificationApi, NotificationClient};
pub use config::NotificationConfig;
pub use types::{Notification, NotificationKind, StatusResponse};
pub use watcher::{AlertSink, NotificationWatcher, PollOutcome, Watermark};
