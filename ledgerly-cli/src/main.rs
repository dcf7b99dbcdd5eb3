use anyhow::Result;
use clap::{Parser, Subcommand};

mod client;
mod commands;
mod config;
mod terminal;

#[derive(Parser)]
#[command(name = "ledgerly", about = "Session timer and notifications for ledgerly")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and start a session
    Login(commands::auth::LoginArgs),
    /// End the current session
    Logout,
    /// Inspect, watch or extend the session
    Session(commands::session::SessionArgs),
    /// List and manage backend notifications
    Notifications(commands::notifications::NotificationsArgs),
    /// Manage configuration
    Config(commands::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Login(args) => commands::auth::login(args).await,
        Commands::Logout => commands::auth::logout().await,
        Commands::Session(args) => commands::session::run(args).await,
        Commands::Notifications(args) => commands::notifications::run(args).await,
        Commands::Config(args) => commands::config::run(args),
    }
}
