//! Login and logout

use anyhow::{Result, bail};
use clap::Args;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Password};
use ledgerly_core::LoginRequest;
use ledgerly_core::display::format_remaining;

use crate::client::LedgerlyClient;

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Account email (prompted when omitted)
    #[arg(short, long)]
    pub email: Option<String>,

    /// Ask for a long-lived session
    #[arg(long)]
    pub remember: bool,
}

pub async fn login(args: LoginArgs) -> Result<()> {
    let client = LedgerlyClient::open()?;

    let email = match args.email {
        Some(email) => email,
        None => Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt("Email")
            .interact_text()?,
    };
    let password = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Password")
        .interact()?;

    if email.trim().is_empty() || password.is_empty() {
        bail!("Email and password are required");
    }

    let request = LoginRequest {
        email: email.trim().to_string(),
        password,
        remember: args.remember,
    };

    let credential = client.auth.login(&request).await?;
    let remaining = client.timer.begin_session(&credential).await?;

    println!("Logged in as {}", request.email);
    if remaining.is_zero() {
        println!("Warning: the issued session has no usable expiry");
    } else {
        println!("Session expires in {}", format_remaining(remaining));
    }
    Ok(())
}

pub async fn logout() -> Result<()> {
    let client = LedgerlyClient::open()?;

    if client.store.path().exists() {
        client.timer.clear_session().await?;
        println!("Logged out");
    } else {
        println!("Not logged in");
    }
    Ok(())
}
