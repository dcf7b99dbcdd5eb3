//! Notification commands

use anyhow::Result;
use clap::{Args, Subcommand};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use dialoguer::Confirm;
use dialoguer::theme::ColorfulTheme;
use ledgerly_core::{Notification, NotificationApi, Watermark};

use crate::client::LedgerlyClient;
use crate::terminal::{TerminalAlerts, kind_label};

/// Notification command arguments
#[derive(Args, Debug)]
pub struct NotificationsArgs {
    #[command(subcommand)]
    pub command: NotificationsCommands,
}

/// Notification subcommands
#[derive(Subcommand, Debug)]
pub enum NotificationsCommands {
    /// List recent notifications
    List {
        /// Number of notifications to fetch
        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// Mark one notification as read
    Read {
        /// Notification ID
        id: u64,
    },
    /// Mark all notifications as read
    ReadAll,
    /// Delete all notifications
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Poll for new notifications and alert on arrival
    Watch,
}

/// Run notifications command
pub async fn run(args: NotificationsArgs) -> Result<()> {
    let client = LedgerlyClient::open()?;

    match args.command {
        NotificationsCommands::List { limit } => {
            let limit = limit.unwrap_or(client.config.notifications.limit);
            let notifications = client.notifications.list(limit).await?;
            print_notifications(&notifications);
        }
        NotificationsCommands::Read { id } => {
            client.notifications.mark_read(id).await?;
            println!("Notification {} marked as read", id);
        }
        NotificationsCommands::ReadAll => {
            client.notifications.mark_all_read().await?;
            println!("All notifications marked as read");
        }
        NotificationsCommands::Clear { yes } => {
            let confirmed = yes
                || Confirm::with_theme(&ColorfulTheme::default())
                    .with_prompt("Delete all notifications?")
                    .default(false)
                    .interact()?;
            if confirmed {
                client.notifications.clear_all().await?;
                println!("Notifications cleared");
            }
        }
        NotificationsCommands::Watch => watch(&client).await?,
    }

    Ok(())
}

async fn watch(client: &LedgerlyClient) -> Result<()> {
    let config = &client.config.notifications;
    if !config.enabled {
        println!("Notification polling is disabled in config.");
        return Ok(());
    }

    println!(
        "Watching for notifications every {}s (Ctrl+C to stop)",
        config.poll_interval().as_secs()
    );

    let watcher = client.watcher();
    let alerts = TerminalAlerts;
    tokio::select! {
        _ = watcher.run(config.poll_interval(), &alerts, Watermark::default()) => {}
        _ = tokio::signal::ctrl_c() => println!(),
    }
    Ok(())
}

fn print_notifications(notifications: &[Notification]) {
    if notifications.is_empty() {
        println!("No notifications.");
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("ID").fg(Color::Cyan),
        Cell::new("Type").fg(Color::Cyan),
        Cell::new("Title").fg(Color::Cyan),
        Cell::new("Message").fg(Color::Cyan),
        Cell::new("Created").fg(Color::Cyan),
    ]);

    for notification in notifications {
        let id = if notification.is_read {
            Cell::new(notification.id)
        } else {
            Cell::new(format!("{} *", notification.id)).fg(Color::Yellow)
        };
        table.add_row(vec![
            id,
            Cell::new(kind_label(notification.kind)),
            Cell::new(&notification.title),
            Cell::new(&notification.message),
            Cell::new(notification.created_at.format("%Y-%m-%d %H:%M")),
        ]);
    }

    println!("{table}");
    println!("* unread");
}
