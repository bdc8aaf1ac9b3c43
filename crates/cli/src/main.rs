//! Fitshop CLI - Database migrations and account management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! fitshop-cli migrate
//!
//! # Grant permissions to an account
//! fitshop-cli user grant -e admin@example.com -p ADMIN -p PERMISSIONUPDATE
//!
//! # Revoke a permission
//! fitshop-cli user revoke -e someone@example.com -p ITEMDELETE
//!
//! # List accounts and their permissions
//! fitshop-cli user list
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use fitshop_core::Permission;

mod commands;

#[derive(Parser)]
#[command(name = "fitshop-cli")]
#[command(author, version, about = "Fitshop CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Add permissions to an account
    Grant {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Permission to add (repeatable), e.g. ADMIN
        #[arg(short, long = "permission", required = true, value_parser = parse_permission)]
        permissions: Vec<Permission>,
    },
    /// Remove permissions from an account
    Revoke {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Permission to remove (repeatable)
        #[arg(short, long = "permission", required = true, value_parser = parse_permission)]
        permissions: Vec<Permission>,
    },
    /// List accounts and their permissions
    List,
}

fn parse_permission(value: &str) -> Result<Permission, String> {
    value.parse().map_err(|e: fitshop_core::UnknownPermission| e.to_string())
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Grant { email, permissions } => {
                commands::user::grant(&email, &permissions).await?;
            }
            UserAction::Revoke { email, permissions } => {
                commands::user::revoke(&email, &permissions).await?;
            }
            UserAction::List => commands::user::list().await?,
        },
    }
    Ok(())
}
