//! nodepack - find and manage the node packages a graph is missing
//!
//! Main entry point: parses flags, sets up logging, loads the manager
//! configuration and dispatches to the package commands.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use nodepack_core::config::{DbMode, ManagerConfig};

mod package_cli;

/// Log levels
#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "nodepack",
    about = "Find and manage the node packages a graph is missing",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: package_cli::Command,

    /// Manager server URL (overrides the config file)
    #[clap(long, global = true)]
    server_url: Option<String>,

    /// Use the server's local package database instead of the remote one
    #[clap(long, global = true)]
    local: bool,

    /// Don't ask the server to check installed packages for updates
    #[clap(long, global = true)]
    skip_update_check: bool,

    /// Override configuration file path
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Set log level (RUST_LOG takes precedence when set)
    #[clap(long, default_value = "warn", global = true)]
    log_level: LogLevel,

    /// Emit logs as JSON
    #[clap(long, global = true)]
    log_json: bool,
}

impl Cli {
    /// Config file values with command line overrides applied
    fn manager_config(&self) -> Result<ManagerConfig> {
        let mut config = match &self.config {
            Some(path) => ManagerConfig::load_from_path(path)?,
            None => ManagerConfig::load()?,
        };

        if let Some(url) = &self.server_url {
            config.server_url = url.clone();
        }
        if self.local {
            config.mode = DbMode::Local;
        }
        if self.skip_update_check {
            config.skip_update_check = true;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Initialize tracing with CLI flags
///
/// Logs always go to stderr so command output on stdout stays parseable.
fn initialize_tracing(log_level: LogLevel, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_filter_directive()));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_tracing(cli.log_level, cli.log_json);

    let config = cli.manager_config()?;
    tracing::debug!(
        server_url = %config.server_url,
        mode = %config.mode,
        "Loaded manager configuration"
    );

    cli.command.execute(config).await
}
