//! Observers of the session countdown: badge and expiry warning panel

pub mod badge;
pub mod layout;
pub mod warning;

pub use badge::{BadgeText, CountdownBadge, format_remaining};
pub use layout::{DEFAULT_BOTTOM_OFFSET, FixedLayout, LayoutProbe, OBSTRUCTION_GAP, bottom_offset};
pub use warning::{ExpiryWarningPanel, PanelState, PanelView, WarningPanelHandle};
