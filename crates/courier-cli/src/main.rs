//! courier - issue API calls through the shared, preconfigured client.
//!
//! The binary resolves the deployment environment, builds one `ApiClient`
//! and hands it to whichever command was asked for.

mod commands;

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::Verb;
use courier_core::{
    ApiClient, Config, ConnectivityFlag, Environment, FileStore, KeyValueStore, KeyringStore,
};

#[derive(Debug, Parser)]
#[command(name = "courier", version, about = "Call the API through the shared client")]
struct Cli {
    /// Deployment environment indicator (production, test, anything else = development)
    #[arg(long, global = true)]
    env: Option<String>,

    /// Override the base URL chosen by the environment
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Keep the token in the OS keychain instead of the data directory
    #[arg(long, global = true)]
    keyring: bool,

    /// Treat the host as offline: a request that gets no response resolves
    /// empty instead of failing (the host is otherwise assumed online)
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the resolved environment and base URL
    Env,
    /// GET a path and print the payload
    Get { path: String },
    /// DELETE a path and print the payload
    Delete { path: String },
    /// POST key=value pairs as a form body
    Post {
        path: String,
        #[arg(value_name = "KEY=VALUE")]
        fields: Vec<String>,
    },
    /// PUT key=value pairs as a form body
    Put {
        path: String,
        #[arg(value_name = "KEY=VALUE")]
        fields: Vec<String>,
    },
    /// PATCH key=value pairs as a form body
    Patch {
        path: String,
        #[arg(value_name = "KEY=VALUE")]
        fields: Vec<String>,
    },
    /// Store the authorization token (prompts when omitted)
    Login { token: Option<String> },
    /// Remove the stored authorization token
    Logout,
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn open_store(use_keyring: bool) -> Result<Arc<dyn KeyValueStore>> {
    if use_keyring {
        Ok(Arc::new(KeyringStore::new()))
    } else {
        let data_dir = Config::data_dir()?;
        Ok(Arc::new(FileStore::new(data_dir)))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let cli = Cli::parse();
    let config = Config::load().context("Failed to load configuration")?;

    let environment = match cli.env.as_deref() {
        Some(indicator) => Environment::from_indicator(indicator),
        None => config.resolve_environment(),
    };
    let mut client_config = config.client_config(environment);
    if let Some(base_url) = cli.base_url {
        client_config = client_config.with_base_url(base_url);
    }

    let store = open_store(cli.keyring)?;
    let connectivity = Arc::new(ConnectivityFlag::new(!cli.offline));
    let client = ApiClient::new(client_config, store, connectivity)
        .context("Failed to build API client")?;
    info!(environment = %environment, base_url = client.base_url(), "courier starting");

    match cli.command {
        Command::Env => {
            println!("environment: {}", environment);
            println!("base url:    {}", client.base_url());
            Ok(())
        }
        Command::Get { path } => commands::get(&client, &path).await,
        Command::Delete { path } => commands::delete(&client, &path).await,
        Command::Post { path, fields } => commands::send(&client, Verb::Post, &path, &fields).await,
        Command::Put { path, fields } => commands::send(&client, Verb::Put, &path, &fields).await,
        Command::Patch { path, fields } => {
            commands::send(&client, Verb::Patch, &path, &fields).await
        }
        Command::Login { token } => commands::login(&client, token),
        Command::Logout => commands::logout(&client),
    }
}
