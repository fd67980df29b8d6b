//! drillview - CLI entry point
//!
//! Runs the trajectory server, opens the terminal viewer, and sends one-shot
//! commands (update, get, status) to a running server.

mod commands;

use clap::{Parser, Subcommand};
use commands::*;
use drillview::config::schema::Config;
use drillview::geo::Position;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Live drilling trajectory viewer
#[derive(Parser)]
#[command(name = "drillview")]
#[command(version, about = "Live drilling trajectory viewer and trajectory server")]
struct Cli {
    /// Configuration file (defaults to the XDG location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands for the drillview CLI
#[derive(Subcommand)]
enum Commands {
    /// Run the trajectory server
    Daemon {
        /// Run as a background daemon (detached from terminal)
        #[arg(long)]
        daemonize: bool,
        /// Address to listen on, host:port (overrides config)
        #[arg(long)]
        listen: Option<String>,
        /// Log file (overrides config; default stderr)
        #[arg(long)]
        log_file: Option<PathBuf>,
    },

    /// Open the terminal viewer
    View {
        /// Server address, host:port (overrides config)
        #[arg(long)]
        server: Option<String>,
        /// Start disconnected; press c to connect
        #[arg(long)]
        no_connect: bool,
    },

    /// Push a partial drill state to the server
    Update {
        /// Bit position as lon,lat[,height]
        #[arg(long, value_parser = parse_position, allow_hyphen_values = true)]
        bit: Option<Position>,
        /// Measured depth in metres
        #[arg(long, allow_hyphen_values = true)]
        md: Option<f64>,
        /// Trajectory as a JSON array of [lon, lat, height?] arrays
        #[arg(long, conflicts_with = "path_file")]
        path: Option<String>,
        /// File holding the trajectory JSON
        #[arg(long)]
        path_file: Option<PathBuf>,
        /// Server address, host:port (overrides config)
        #[arg(long)]
        server: Option<String>,
    },

    /// Print the current drill state as JSON
    Get {
        /// Server address, host:port (overrides config)
        #[arg(long)]
        server: Option<String>,
    },

    /// Check server health status
    Status {
        /// Server address, host:port (overrides config)
        #[arg(long)]
        server: Option<String>,
    },

    /// Manage configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Actions for the `config` subcommand.
#[derive(Subcommand)]
enum ConfigAction {
    /// Create default configuration file
    Init {
        /// Overwrite existing configuration (creates backup)
        #[arg(long)]
        force: bool,
    },
    /// Show configuration file path
    Path,
    /// Validate configuration file
    Validate,
}

fn main() -> ExitCode {
    // Parse CLI arguments BEFORE any fork/runtime operations
    // so errors reach the terminal.
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Daemon {
            daemonize,
            listen,
            log_file,
        } => with_config(config_path, |config| {
            run_daemon_command(daemon_config(&config.daemon, listen, log_file, daemonize))
        }),
        Commands::View { server, no_connect } => with_config(config_path, |config| {
            run_view_command(config, server, no_connect)
        }),
        Commands::Update {
            bit,
            md,
            path,
            path_file,
            server,
        } => with_config(config_path, |config| {
            run_update_command(
                &server_or_default(config, server),
                bit,
                md,
                path,
                path_file.as_deref(),
            )
        }),
        Commands::Get { server } => with_config(config_path, |config| {
            run_get_command(&server_or_default(config, server))
        }),
        Commands::Status { server } => with_config(config_path, |config| {
            run_status_command(&server_or_default(config, server))
        }),
        Commands::Config { action } => match action {
            ConfigAction::Init { force } => run_config_init_command(config_path, force),
            ConfigAction::Path => run_config_path_command(config_path),
            ConfigAction::Validate => run_config_validate_command(config_path),
        },
    }
}

/// Loads the config, then runs `f`. A broken config file fails the command.
fn with_config(path: Option<&Path>, f: impl FnOnce(&Config) -> ExitCode) -> ExitCode {
    match load_config(path) {
        Ok(config) => f(&config),
        Err(code) => code,
    }
}

fn server_or_default(config: &Config, server: Option<String>) -> String {
    server.unwrap_or_else(|| config.viewer.server.clone())
}

#[cfg(test)]
mod cli_tests;
