//! Session lifecycle events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Events emitted by the session timer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The ticking loop started
    Started,
    /// A different credential (or none) is now current
    TokenChanged { has_token: bool },
    /// The session was renewed
    Renewed { expires_at: DateTime<Utc> },
    /// Remaining time reached zero for the current credential
    Expired,
}
