//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use keyward_core::config;

mod commands;

#[derive(Parser)]
#[command(name = "keyward")]
#[command(version = "0.1")]
#[command(about = "Keyward token lifecycle CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Log in with an access token (and optional refresh token)
    Login {
        /// Access token (prompted on stdin when omitted)
        #[arg(long, value_name = "TOKEN")]
        access: Option<String>,

        /// Refresh token to store alongside the access token
        #[arg(long, value_name = "TOKEN")]
        refresh: Option<String>,
    },

    /// Log out (clear stored credentials)
    Logout,

    /// Show the current authentication state
    Status,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Set the token refresh endpoint
    SetRefreshUrl {
        /// Refresh endpoint URL
        #[arg(value_name = "URL")]
        url: String,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = config::Config::load().context("load config")?;

    match cli.command {
        Commands::Login { access, refresh } => commands::login::run(&config, access, refresh).await,
        Commands::Logout => commands::logout::run(&config).await,
        Commands::Status => commands::status::run(&config).await,
        Commands::Config { command } => match command {
            ConfigCommands::Path => commands::config::path(),
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::SetRefreshUrl { url } => commands::config::set_refresh_url(&url),
        },
    }
}
