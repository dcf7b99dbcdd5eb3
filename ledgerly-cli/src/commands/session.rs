//! Session countdown commands

use anyhow::{Result, bail};
use chrono::Local;
use clap::{Args, Subcommand};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use dialoguer::Confirm;
use dialoguer::console::style;
use dialoguer::theme::ColorfulTheme;
use ledgerly_core::display::format_remaining;
use ledgerly_core::{
    CountdownBadge, FixedLayout, PanelState, SessionError, SessionEvent, SessionTimerService,
    WarningPanelHandle,
};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::client::LedgerlyClient;
use crate::terminal::BadgeLine;

/// Session command arguments
#[derive(Args, Debug)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommands,
}

/// Session subcommands
#[derive(Subcommand, Debug)]
pub enum SessionCommands {
    /// Show the current session and its remaining time
    Status,
    /// Follow the countdown and warn before the session expires
    Watch {
        /// Only print the warning instead of offering to extend
        #[arg(long)]
        no_prompt: bool,
    },
    /// Renew the session now
    Extend,
}

/// Run session command
pub async fn run(args: SessionArgs) -> Result<()> {
    match args.command {
        SessionCommands::Status => status().await,
        SessionCommands::Watch { no_prompt } => watch(!no_prompt).await,
        SessionCommands::Extend => extend().await,
    }
}

async fn status() -> Result<()> {
    let client = LedgerlyClient::open()?;
    let timer = &client.timer;
    let remaining = timer.tick().await;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Session").fg(Color::Cyan),
        Cell::new("").fg(Color::Cyan),
    ]);

    let logged_in = timer.get_token().is_some();
    table.add_row(vec![
        Cell::new("Logged in"),
        Cell::new(if logged_in { "yes" } else { "no" }),
    ]);

    let expires = timer
        .expires_at()
        .map(|at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());
    table.add_row(vec![Cell::new("Expires at"), Cell::new(expires)]);

    let threshold = timer.config().warning_threshold();
    let remaining_cell = match remaining {
        r if r.is_zero() => Cell::new("-"),
        r if r <= threshold => Cell::new(format_remaining(r)).fg(Color::Red),
        r => Cell::new(format_remaining(r)),
    };
    table.add_row(vec![Cell::new("Remaining"), remaining_cell]);
    table.add_row(vec![
        Cell::new("Warning at"),
        Cell::new(format_remaining(threshold)),
    ]);

    println!("{table}");
    Ok(())
}

async fn extend() -> Result<()> {
    let client = LedgerlyClient::open()?;

    match client.timer.refresh_session().await {
        Ok(remaining) => {
            println!("Session extended, expires in {}", format_remaining(remaining));
            Ok(())
        }
        Err(SessionError::CredentialAbsent) => bail!("Not logged in. Run `ledgerly login` first."),
        Err(SessionError::Superseded) => {
            bail!("The session changed while extending. Run `ledgerly session status` to check it.")
        }
        Err(e) => force_logout(&client.timer, e).await,
    }
}

/// A failed renewal ends the session
async fn force_logout(timer: &SessionTimerService, cause: SessionError) -> Result<()> {
    warn!("Renewal failed, logging out: {}", cause);
    timer.clear_session().await?;
    bail!("Could not extend the session ({}). You have been logged out.", cause)
}

async fn watch(prompt: bool) -> Result<()> {
    let client = LedgerlyClient::open()?;
    let timer = client.timer.clone();
    let threshold = timer.config().warning_threshold();
    let mut events = timer.events();

    let line = BadgeLine::default();
    let badge_line = line.clone();
    let _badge = CountdownBadge::new(threshold).attach(&timer, move |badge| badge_line.render(badge));

    let (state_tx, mut state_rx) = mpsc::unbounded_channel();
    let panel = WarningPanelHandle::attach(&timer, threshold, move |state| {
        let _ = state_tx.send(state);
    });

    timer.start_timer().await;
    info!("Watching session (Ctrl+C to stop)");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                eprintln!();
                break;
            }
            Some(state) = state_rx.recv() => {
                if state == PanelState::Shown {
                    warn_before_expiry(&panel, &timer, &line, prompt).await?;
                }
            }
            event = events.recv() => match event {
                Ok(SessionEvent::Expired) => {
                    line.pause();
                    eprintln!("\n{} Session expired, logging out", style("✗").red().bold());
                    timer.clear_session().await?;
                    break;
                }
                Ok(SessionEvent::TokenChanged { has_token: false }) => {
                    line.pause();
                    eprintln!("\nLogged out. Waiting for a new login...");
                    line.resume();
                }
                Ok(event) => debug!(?event, "Session event"),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Session watcher lagged by {} events", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    Ok(())
}

async fn warn_before_expiry(
    panel: &WarningPanelHandle,
    timer: &SessionTimerService,
    line: &BadgeLine,
    prompt: bool,
) -> Result<()> {
    let Some(view) = panel.view(&FixedLayout(None)) else {
        return Ok(());
    };

    line.pause();
    eprintln!(
        "\n{} Your session expires in {}:{:02}",
        style("!").yellow().bold(),
        view.minutes,
        view.seconds
    );

    if prompt {
        let extend = tokio::task::spawn_blocking(|| {
            Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt("Extend the session?")
                .default(true)
                .interact()
        })
        .await??;

        if extend {
            match panel.extend().await {
                Ok(remaining) => {
                    eprintln!("Session extended, expires in {}", format_remaining(remaining));
                }
                Err(SessionError::Superseded) => {
                    warn!("Session changed while extending, keeping the newer session");
                }
                Err(e) => return force_logout(timer, e).await,
            }
        } else {
            panel.dismiss();
        }
    }

    line.resume();
    Ok(())
}
