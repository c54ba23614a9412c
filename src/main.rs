// src/main.rs

//! # ADP Manager - Main Entry Point
//!
//! Command line tool that keeps an App Store Connect API credential valid
//! and uses it to discover the Alternative Distribution Package (ADP) id of
//! the developer's apps, then drives the AltStore endpoints that consume it.
//!
//! ## Architecture Overview
//! 1. **Wallet Layer**: signing identity and ES256 credential minting
//! 2. **Services Layer**: credential lifecycle, authenticated requests,
//!    App Store Connect resources, AltStore endpoints
//! 3. **Storage Layer**: the `configure.json` record
//!
//! ## Environment Variables
//! - `RUST_LOG`: (Optional) log filter (default: `info`)
//! - `ADP_<FIELD>`: (Optional) overrides a configuration field other than
//!   `security_token` and `adp_id`, e.g. `ADP_PRIVATE_KEY_PATH`
//!
//! A `.env` file in the working directory is loaded first.

use crate::services::altstore::{AltStoreClient, DEFAULT_ALTSTORE_BASE};
use crate::services::credential_manager::{is_fresh, CredentialManager};
use crate::services::discovery::discover;
use crate::services::operator::{ConsoleOperator, FixedOperator, Operator};
use crate::services::request_executor::{ApiClient, DEFAULT_API_BASE};
use crate::storage::config_store::{ConfigStore, JsonFileStore};
use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use log::{error, info};
use std::path::PathBuf;

// Module declarations (organized by functional domain)
mod error;         // Error taxonomy
mod models;        // Data structures
mod services;      // Credential lifecycle and API calls
mod storage;       // Configuration persistence
mod utils;         // Helper functions
mod wallet;        // Signing identity
#[cfg(test)]
mod testutil;

/// Manage the App Store Connect credential and alternative distribution packages.
#[derive(Parser, Debug)]
#[command(name = "adp-manager", version)]
struct Cli {
    /// Configuration record
    #[arg(long, default_value = "configure.json")]
    config: PathBuf,

    /// App Store Connect API base URL
    #[arg(long, default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// AltStore API base URL
    #[arg(long, default_value = DEFAULT_ALTSTORE_BASE)]
    altstore_base: String,

    /// Answer yes to every prompt
    #[arg(short, long)]
    yes: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Find the alternative distribution package id of your apps (default)
    Discover,
    /// Show whether the current credential is still valid
    Status,
    /// Register with AltStore and store the returned credential
    Register,
    /// Federate the configured source with AltStore
    Federate,
    /// Ask AltStore to process the cached package
    Process,
    /// Check processing status and the download URL of the cached package
    Download,
}

fn report_settings<S: ConfigStore>(credentials: &CredentialManager<S>, path: &std::path::Path) {
    let config = credentials.config();
    info!("Loaded configuration: {}", path.display());
    info!("  Developer ID (issuer): {}", config.developer_id);
    info!("  Email: {}", config.email);
    info!("  Source URL: {}", config.source_url);
    if let Some(key_id) = credentials.key_id() {
        info!("  Key ID: {}", key_id);
    }
    if let Some(key_path) = credentials.private_key_path() {
        info!("  Private key: {}", key_path.display());
    }
    if let Some(adp_id) = config.adp_id.get() {
        info!("  Cached ADP ID: {}", adp_id);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let store = JsonFileStore::new(&cli.config);
    let mut credentials = CredentialManager::load(store)?;
    report_settings(&credentials, &cli.config);
    credentials.check_key_material();

    let altstore = AltStoreClient::new(&cli.altstore_base);
    match cli.command.unwrap_or(Command::Discover) {
        Command::Discover => {
            let operator: Box<dyn Operator> = if cli.yes {
                Box::new(FixedOperator(true))
            } else {
                Box::new(ConsoleOperator)
            };
            let mut client = ApiClient::new(credentials, cli.api_base);
            discover(&mut client, operator.as_ref())
                .await
                .context("alternative distribution package discovery failed")?;
        }
        Command::Status => {
            is_fresh(credentials.credential(), Utc::now());
        }
        Command::Register => {
            altstore
                .register(&mut credentials)
                .await
                .context("registration failed")?;
        }
        Command::Federate => {
            altstore
                .federate(&credentials.config().source_url)
                .await
                .context("federation failed")?;
        }
        Command::Process => {
            altstore
                .trigger_processing(credentials.config().adp_id.get())
                .await
                .context("triggering ADP processing failed")?;
        }
        Command::Download => {
            altstore
                .package_status(credentials.config().adp_id.get())
                .await
                .context("fetching ADP status failed")?;
        }
    }
    Ok(())
}

/// Main application entry point
///
/// # Initialization Sequence
/// 1. Load `.env` and initialise logging
/// 2. Parse the command line
/// 3. Load the configuration record (a missing record is replaced by a
///    template and the process exits with status 1)
/// 4. Run the selected command
#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
