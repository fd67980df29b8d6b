//! `daemon` subcommand: runs the trajectory server.

use drillview::config::schema::TomlDaemonConfig;
use drillview::config::xdg::expand_tilde;
use drillview::{daemon::run_daemon, DaemonConfig};
use std::path::PathBuf;
use std::process::ExitCode;

/// Merges CLI flags over the `[daemon]` config section.
pub(crate) fn daemon_config(
    toml: &TomlDaemonConfig,
    listen: Option<String>,
    log_file: Option<PathBuf>,
    daemonize: bool,
) -> DaemonConfig {
    let mut config = DaemonConfig::new(listen.unwrap_or_else(|| toml.listen.clone()), daemonize);
    config.log_level = toml.log_level;
    config.log_file = log_file.or_else(|| {
        (!toml.log_file.is_empty()).then(|| expand_tilde(&toml.log_file))
    });
    config
}

pub(crate) fn run_daemon_command(config: DaemonConfig) -> ExitCode {
    // run_daemon daemonizes (if asked) before starting the runtime, then
    // blocks until SIGINT/SIGTERM.
    if let Err(e) = run_daemon(config) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
