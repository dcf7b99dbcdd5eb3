//! Terminal rendering of alerts and countdowns

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dialoguer::console::style;
use ledgerly_core::{AlertSink, BadgeText, Notification, NotificationKind};
use tracing::debug;

const BELL: &str = "\x07";

/// Short label for a notification kind
pub fn kind_label(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::Info => "info",
        NotificationKind::Success => "success",
        NotificationKind::Warning => "warning",
        NotificationKind::Error => "error",
        NotificationKind::Unknown => "other",
    }
}

/// Writes a batch alert for new notifications
pub fn write_alert<W: Write>(w: &mut W, fresh: &[Notification]) -> io::Result<()> {
    let noun = if fresh.len() == 1 { "notification" } else { "notifications" };
    writeln!(w, "{} {} new {}", style("●").cyan().bold(), fresh.len(), noun)?;
    for notification in fresh {
        writeln!(
            w,
            "  [{}] {}: {}",
            kind_label(notification.kind),
            notification.title,
            notification.message
        )?;
    }
    Ok(())
}

/// [`AlertSink`] printing to stdout and ringing the terminal bell
#[derive(Debug, Default)]
pub struct TerminalAlerts;

impl AlertSink for TerminalAlerts {
    fn alert(&self, fresh: &[Notification]) {
        if let Err(e) = write_alert(&mut io::stdout().lock(), fresh) {
            debug!("Failed to print notification alert: {}", e);
        }
    }

    fn chime(&self) {
        if let Err(e) = ring(&mut io::stdout().lock()) {
            debug!("Failed to ring terminal bell: {}", e);
        }
    }
}

/// Write the terminal bell and flush
pub fn ring(out: &mut impl Write) -> io::Result<()> {
    write!(out, "{}", BELL)?;
    out.flush()
}

/// Single-line countdown readout that can be paused while prompting
#[derive(Debug, Clone, Default)]
pub struct BadgeLine {
    paused: Arc<AtomicBool>,
}

impl BadgeLine {
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    pub fn render(&self, badge: Option<BadgeText>) {
        if self.paused.load(Ordering::SeqCst) {
            return;
        }
        let mut err = io::stderr().lock();
        let _ = write_badge(&mut err, badge.as_ref());
        let _ = err.flush();
    }
}

fn write_badge<W: Write>(w: &mut W, badge: Option<&BadgeText>) -> io::Result<()> {
    match badge {
        Some(badge) if badge.urgent => {
            write!(w, "\r\x1b[2KSession {}", style(&badge.text).red().bold())
        }
        Some(badge) => write!(w, "\r\x1b[2KSession {}", badge.text),
        None => write!(w, "\r\x1b[2KNo active session"),
    }
}
