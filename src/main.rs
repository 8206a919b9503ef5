//! Bifrost client - local authentication helper
//!
//! Drives the browser login for the Bifrost desktop client, receives the
//! token through the `bifrost://auth/callback` URL scheme and keeps it in
//! `~/.bifrost/auth.json`.

mod auth;
mod config;
mod platform;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use auth::{
    AuthConfig, AuthService, CallbackEvent, CallbackRouter, FileStore, Service, SessionState,
};
use config::Config;
use platform::{StoragePolicy, SystemBrowser};

#[derive(Parser)]
#[command(name = "bifrost-client")]
#[command(about = "Authentication helper for the Bifrost desktop client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Override the API server base URL from config.toml
    #[arg(long, global = true)]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Make sure we are logged in, opening the browser if not
    Login,

    /// Log out and remove the stored token
    Logout,

    /// Show current authentication status
    Status,

    /// Print the stored token (for authenticated requests)
    Token,

    /// Print the login URL without opening it
    AuthUrl,

    /// Handle a relaunch by the OS (the callback URL is the first argument)
    Callback {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Handle a custom-scheme URL delivered to the running client
    OpenUrl {
        /// URL, e.g. bifrost://auth/callback?token=...
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let dir = Config::dir()?;
    let mut config = Config::load_from(&dir)?;
    if let Some(api_url) = cli.api_url {
        config.api_server_url = api_url;
    }

    let auth_config = AuthConfig::default();
    let store = FileStore::open(&dir, auth_config.token_file, StoragePolicy::current())
        .context("Failed to open token store")?;
    tracing::debug!("Token file: {}", store.path().display());
    let service = Arc::new(Service::new(config.api_server_url, store, SystemBrowser));

    match cli.command {
        Commands::Login => {
            tracing::info!("Checking authentication...");
            service.check_and_start_login()?;
            if matches!(service.is_authenticated(), Ok(true)) {
                println!("Already logged in.");
            } else {
                println!("Finish signing in in your browser.");
            }
        }
        Commands::Logout => {
            tracing::info!("Logging out...");
            if let Err(e) = service.logout() {
                if e.is_not_found() {
                    bail!("Not logged in: no stored token to remove");
                }
                return Err(e.into());
            }
            println!("Logged out.");
        }
        Commands::Status => match service.session_state()? {
            SessionState::Authenticated { expires_at } => {
                println!("Status:     logged in");
                if let Some(at) = expires_at {
                    println!("  expires_at: {}", at.to_rfc3339());
                }
            }
            SessionState::Expired => {
                println!("Status:     expired (stored token removed)");
                println!("\nRun 'bifrost-client login' to authenticate.");
            }
            SessionState::Unauthenticated => {
                println!("Status:     not logged in");
                println!("\nRun 'bifrost-client login' to authenticate.");
            }
        },
        Commands::Token => {
            println!("{}", service.auth_token()?);
        }
        Commands::AuthUrl => {
            println!("{}", service.auth_url()?);
        }
        Commands::Callback { args } => {
            let router = CallbackRouter::start(service.clone());
            router.dispatch(CallbackEvent::SecondInstance(args));
            router.close().await.context("Callback router task failed")?;
        }
        Commands::OpenUrl { url } => {
            let router = CallbackRouter::start(service.clone());
            router.dispatch(CallbackEvent::UrlOpen(url));
            router.close().await.context("Callback router task failed")?;
        }
    }

    Ok(())
}
